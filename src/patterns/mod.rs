pub mod builder;
pub mod engine;
pub mod library;

pub use builder::AutomatonBuilder;
pub use engine::PatternEngine;

use serde::{Deserialize, Serialize};

use crate::graph::{Entity, EntityCategory, TxEdge};
use crate::score::Severity;

/// Finite state machine encoding a temporal laundering narrative, e.g.
/// "mixer, then bridge, then high-risk exchange within six hours".
///
/// Automata are data, not code: they are assembled through
/// [`AutomatonBuilder`] and executed by [`PatternEngine`], so new patterns
/// need no engine changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAutomaton {
    pub pattern_id: String,
    pub name: String,
    pub description: String,
    pub initial_state: String,
    pub states: Vec<State>,
    /// How bad a match is, 1-100.
    pub weight: u32,
    pub severity: Severity,
}

impl PatternAutomaton {
    pub fn builder(pattern_id: impl Into<String>, name: impl Into<String>) -> AutomatonBuilder {
        AutomatonBuilder::new(pattern_id, name)
    }

    pub fn state(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    pub state_type: StateType,
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateType {
    Start,
    Normal,
    Accept,
    Fail,
}

/// Transition to a target state, guarded by conditions combined with
/// logical AND (evaluated left-to-right, short-circuit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub target: String,
    pub conditions: Vec<Condition>,
}

impl Transition {
    /// True when a walk-context condition (time window, hop count) already
    /// rules this transition out, regardless of the destination entity.
    pub fn context_pruned(&self, ctx: &TransitionContext<'_>) -> bool {
        self.conditions.iter().any(|c| c.is_context_only() && !c.test(ctx))
    }

    pub fn matches(&self, ctx: &TransitionContext<'_>) -> bool {
        self.conditions.iter().all(|c| c.test(ctx))
    }
}

/// One guard on a transition. A tagged variant per condition kind; dispatch
/// is a plain match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Destination entity's category equals the given one.
    EntityCategory(EntityCategory),
    /// Destination entity carries the given tag.
    EntityTag(String),
    /// Hours elapsed from the walk's first edge are at most this many.
    TimeWindowHours(i64),
    /// Cumulative hop count is at most this many.
    HopCount(usize),
    /// Cumulative walk volume is at least this much.
    VolumeThreshold(f64),
    /// Current edge crosses a bridge.
    BridgeCrossing,
    /// Current edge touches a mixer.
    MixerHop,
}

impl Condition {
    pub fn test(&self, ctx: &TransitionContext<'_>) -> bool {
        match self {
            Condition::EntityCategory(category) => ctx.entity.category == *category,
            Condition::EntityTag(tag) => ctx.entity.has_tag(tag),
            Condition::TimeWindowHours(max_hours) => ctx.elapsed_hours <= *max_hours,
            Condition::HopCount(max_hops) => ctx.hop_count <= *max_hops,
            Condition::VolumeThreshold(min_volume) => ctx.volume >= *min_volume,
            Condition::BridgeCrossing => ctx.edge.is_cross_bridge,
            Condition::MixerHop => ctx.edge.is_mixer_hop,
        }
    }

    /// Conditions that read only the walk context, usable for early pruning.
    fn is_context_only(&self) -> bool {
        matches!(self, Condition::TimeWindowHours(_) | Condition::HopCount(_))
    }
}

/// Evaluation context for a candidate edge stepping into `entity`.
///
/// The candidate edge is included: `hop_count` counts it, `volume` adds its
/// amount, and `elapsed_hours` runs from the walk's first edge to it.
#[derive(Debug)]
pub struct TransitionContext<'a> {
    pub entity: &'a Entity,
    pub edge: &'a TxEdge,
    pub elapsed_hours: i64,
    pub hop_count: usize,
    pub volume: f64,
}

/// Outcome of running one automaton against an ego graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub pattern_id: String,
    pub pattern_name: String,
    pub matched: bool,
    pub weight: u32,
    pub severity: Severity,
    /// Percentage of the centre's incident volume captured by the matched
    /// walk, clamped to [0, 100].
    pub volume_share: f64,
    pub matched_path: Vec<TxEdge>,
    pub explanation: String,
}

impl MatchResult {
    pub fn no_match(automaton: &PatternAutomaton) -> Self {
        Self {
            pattern_id: automaton.pattern_id.clone(),
            pattern_name: automaton.name.clone(),
            matched: false,
            weight: automaton.weight,
            severity: automaton.severity,
            volume_share: 0.0,
            matched_path: Vec::new(),
            explanation: String::new(),
        }
    }
}
