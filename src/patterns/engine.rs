use std::collections::HashSet;
use tracing::{debug, info};

use super::{MatchResult, PatternAutomaton, State, StateType, TransitionContext};
use crate::cancel::CancelToken;
use crate::error::AnalysisError;
use crate::graph::EgoGraph;

/// Executes pattern automata against an ego graph.
///
/// For each automaton the engine enumerates simple walks from the centre,
/// advancing the automaton state along each edge. Enumeration order is fixed
/// by adjacency insertion order and transition declaration order, so repeated
/// runs over the same graph yield identical results.
pub struct PatternEngine;

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run every automaton, returning one result per automaton in input
    /// order. The cancel token is observed between automata and between
    /// top-level walk branches, never inside a walk.
    pub fn match_all(
        &self,
        graph: &EgoGraph,
        patterns: &[PatternAutomaton],
        cancel: &CancelToken,
    ) -> Result<Vec<MatchResult>, AnalysisError> {
        info!(
            "Running {} patterns on ego graph for {}",
            patterns.len(),
            graph.center_id
        );

        let mut results = Vec::with_capacity(patterns.len());
        for automaton in patterns {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            let result = self.match_pattern(graph, automaton, cancel)?;
            if result.matched {
                info!(
                    "Pattern matched: {} (weight {}, share {:.2}%)",
                    result.pattern_name, result.weight, result.volume_share
                );
            }
            results.push(result);
        }
        Ok(results)
    }

    fn match_pattern(
        &self,
        graph: &EgoGraph,
        automaton: &PatternAutomaton,
        cancel: &CancelToken,
    ) -> Result<MatchResult, AnalysisError> {
        if !graph.entities.contains_key(&graph.center_id) {
            return Err(AnalysisError::InvariantViolation(format!(
                "centre {} missing from entity map",
                graph.center_id
            )));
        }
        let initial = automaton.state(&automaton.initial_state).ok_or_else(|| {
            AnalysisError::InvariantViolation(format!(
                "automaton {} has unresolved initial state",
                automaton.pattern_id
            ))
        })?;

        if !self.start_can_match(graph, initial) {
            debug!(
                "Pattern {} cannot start from centre neighbourhood, skipping",
                automaton.pattern_id
            );
            return Ok(MatchResult::no_match(automaton));
        }

        let mut search = WalkSearch {
            graph,
            automaton,
            cancel,
            accepted: Vec::new(),
        };
        let mut visited = HashSet::new();
        visited.insert(graph.center_id.clone());
        search.explore(&graph.center_id, initial, &mut Vec::new(), 0.0, &visited)?;

        let best = match best_walk(&search.accepted, graph) {
            Some(walk) => walk,
            None => return Ok(MatchResult::no_match(automaton)),
        };

        let center_volume = graph.total_volume(&graph.center_id);
        let volume_share = if center_volume > 0.0 {
            (best.volume / center_volume * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Ok(MatchResult {
            pattern_id: automaton.pattern_id.clone(),
            pattern_name: automaton.name.clone(),
            matched: true,
            weight: automaton.weight,
            severity: automaton.severity,
            volume_share,
            matched_path: best.edges.iter().map(|&i| graph.edge(i).clone()).collect(),
            explanation: format!(
                "{} detected: {} hops, {:.2}% of volume, total amount {:.2}",
                automaton.name,
                best.edges.len(),
                volume_share,
                best.volume
            ),
        })
    }

    /// Cheap pre-check: some start transition's first condition must match at
    /// least one edge in the centre's outgoing neighbourhood, otherwise the
    /// automaton cannot leave its start state.
    fn start_can_match(&self, graph: &EgoGraph, start: &State) -> bool {
        for &edge_idx in graph.outgoing(&graph.center_id) {
            let edge = graph.edge(edge_idx);
            let entity = match graph.entities.get(&edge.to_id) {
                Some(entity) => entity,
                None => continue,
            };
            let ctx = TransitionContext {
                entity,
                edge,
                elapsed_hours: 0,
                hop_count: 1,
                volume: edge.amount,
            };
            for transition in &start.transitions {
                match transition.conditions.first() {
                    Some(first) => {
                        if first.test(&ctx) {
                            return true;
                        }
                    }
                    None => return true,
                }
            }
        }
        false
    }
}

/// An accepted walk: edge indices into the graph's flat list plus its volume.
struct Walk {
    edges: Vec<usize>,
    volume: f64,
}

struct WalkSearch<'a> {
    graph: &'a EgoGraph,
    automaton: &'a PatternAutomaton,
    cancel: &'a CancelToken,
    accepted: Vec<Walk>,
}

impl<'a> WalkSearch<'a> {
    fn explore(
        &mut self,
        current: &str,
        state: &State,
        path: &mut Vec<usize>,
        path_volume: f64,
        visited: &HashSet<String>,
    ) -> Result<(), AnalysisError> {
        match state.state_type {
            StateType::Accept => {
                self.accepted.push(Walk {
                    edges: path.clone(),
                    volume: path_volume,
                });
                return Ok(());
            }
            StateType::Fail => return Ok(()),
            StateType::Start | StateType::Normal => {}
        }

        let start_ts = path.first().map(|&i| self.graph.edge(i).timestamp);

        for &edge_idx in self.graph.outgoing(current) {
            if path.is_empty() && self.cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let edge = self.graph.edge(edge_idx);
            if visited.contains(&edge.to_id) {
                continue;
            }
            let entity = match self.graph.entities.get(&edge.to_id) {
                Some(entity) => entity,
                None => {
                    return Err(AnalysisError::InvariantViolation(format!(
                        "edge {} targets unknown entity {}",
                        edge.tx_hash, edge.to_id
                    )))
                }
            };

            let elapsed_hours = match start_ts {
                Some(start) => (edge.timestamp - start).num_hours(),
                None => 0,
            };
            let ctx = TransitionContext {
                entity,
                edge,
                elapsed_hours,
                hop_count: path.len() + 1,
                volume: path_volume + edge.amount,
            };

            for transition in &state.transitions {
                if transition.context_pruned(&ctx) {
                    continue;
                }
                if !transition.matches(&ctx) {
                    continue;
                }
                let next = self.automaton.state(&transition.target).ok_or_else(|| {
                    AnalysisError::InvariantViolation(format!(
                        "automaton {} transition targets unresolved state {}",
                        self.automaton.pattern_id, transition.target
                    ))
                })?;

                path.push(edge_idx);
                let mut branch_visited = visited.clone();
                branch_visited.insert(edge.to_id.clone());
                self.explore(&edge.to_id, next, path, ctx.volume, &branch_visited)?;
                path.pop();
            }
        }

        Ok(())
    }
}

/// Maximum total volume wins; ties break to the shorter walk, then to the
/// lexicographically smaller tx-hash sequence.
fn best_walk<'a>(walks: &'a [Walk], graph: &EgoGraph) -> Option<&'a Walk> {
    let mut best: Option<&Walk> = None;
    for walk in walks {
        match best {
            None => best = Some(walk),
            Some(current) => {
                if beats(walk, current, graph) {
                    best = Some(walk);
                }
            }
        }
    }
    best
}

fn beats(a: &Walk, b: &Walk, graph: &EgoGraph) -> bool {
    use std::cmp::Ordering;
    match a.volume.partial_cmp(&b.volume).unwrap_or(Ordering::Equal) {
        Ordering::Greater => return true,
        Ordering::Less => return false,
        Ordering::Equal => {}
    }
    match a.edges.len().cmp(&b.edges.len()) {
        Ordering::Less => return true,
        Ordering::Greater => return false,
        Ordering::Equal => {}
    }
    let hashes = |walk: &Walk| -> Vec<&str> {
        walk.edges
            .iter()
            .map(|&i| graph.edge(i).tx_hash.as_str())
            .collect()
    };
    hashes(a) < hashes(b)
}
