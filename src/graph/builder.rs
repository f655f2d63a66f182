use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

use super::{Direction, EgoGraph, Entity, TxEdge};
use crate::cancel::CancelToken;
use crate::config::GraphConfig;
use crate::error::AnalysisError;
use crate::providers::{Classification, EntityClassifier, TransactionSource};

/// Builds a bounded ego graph around a target address via breadth-first
/// expansion over the transaction source.
///
/// Frontier ordering is insertion order and adjacency lists preserve
/// insertion order, so identical provider answers produce a structurally
/// equal graph.
pub struct EgoGraphBuilder<'a> {
    source: &'a dyn TransactionSource,
    classifier: &'a dyn EntityClassifier,
    config: &'a GraphConfig,
}

impl<'a> EgoGraphBuilder<'a> {
    pub fn new(
        source: &'a dyn TransactionSource,
        classifier: &'a dyn EntityClassifier,
        config: &'a GraphConfig,
    ) -> Self {
        Self {
            source,
            classifier,
            config,
        }
    }

    pub async fn build(
        &self,
        address: &str,
        asset: &str,
        chain: &str,
        cancel: &CancelToken,
    ) -> Result<EgoGraph, AnalysisError> {
        if address.is_empty() {
            return Err(AnalysisError::InvalidInput("empty address".to_string()));
        }

        let built_at = Utc::now();
        let cutoff = built_at - Duration::days(self.config.time_window_days);

        info!(
            "Building ego graph: address={address}, depth={}, window={} days",
            self.config.max_depth, self.config.time_window_days
        );

        let mut entities: HashMap<String, Entity> = HashMap::new();
        let mut transactions: Vec<TxEdge> = Vec::new();
        let mut out_edges: HashMap<String, Vec<usize>> = HashMap::new();
        let mut in_edges: HashMap<String, Vec<usize>> = HashMap::new();
        let mut seen_edges: HashSet<(String, String, String)> = HashSet::new();

        let center = self.classify_or_degrade(address, chain).await;
        entities.insert(
            address.to_string(),
            Entity::new(address, chain, center.entity_type, center.category, center.tags),
        );

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(address.to_string());

        let mut frontier: VecDeque<(String, usize)> = VecDeque::new();
        frontier.push_back((address.to_string(), 0));

        while let Some((current, depth)) = frontier.pop_front() {
            if depth >= self.config.max_depth {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let records = match self.source.fetch(&current, self.config.tx_fetch_limit).await {
                Ok(records) => records,
                Err(e) if current == address => {
                    // The target's own expansion failing leaves nothing to
                    // analyse.
                    return Err(AnalysisError::TransactionSourceUnavailable(e.to_string()));
                }
                Err(e) => {
                    warn!("Transaction fetch failed for {current}: {e}, skipping expansion");
                    Vec::new()
                }
            };

            for record in records {
                if record.timestamp < cutoff {
                    continue;
                }
                if record.from == record.to {
                    debug!("Skipping self-transfer {}", record.tx_hash);
                    continue;
                }
                if record.amount < 0.0 {
                    warn!("Skipping negative-amount record {}", record.tx_hash);
                    continue;
                }
                let key = (record.tx_hash.clone(), record.from.clone(), record.to.clone());
                if !seen_edges.insert(key) {
                    continue;
                }

                let direction = if record.from == current {
                    Direction::Outgoing
                } else if record.to == current {
                    Direction::Incoming
                } else {
                    Direction::Internal
                };

                for endpoint in [record.from.as_str(), record.to.as_str()] {
                    if !visited.contains(endpoint) {
                        let verdict = self.classify_or_degrade(endpoint, chain).await;
                        entities.insert(
                            endpoint.to_string(),
                            Entity::new(
                                endpoint,
                                chain,
                                verdict.entity_type,
                                verdict.category,
                                verdict.tags,
                            ),
                        );
                        visited.insert(endpoint.to_string());
                        frontier.push_back((endpoint.to_string(), depth + 1));
                    }
                }

                let is_mixer_hop = self.endpoint_category_is(
                    &entities,
                    &record.from,
                    &record.to,
                    super::EntityCategory::Mixer,
                );
                let is_cross_bridge = self.endpoint_category_is(
                    &entities,
                    &record.from,
                    &record.to,
                    super::EntityCategory::Bridge,
                );

                if transactions.len() >= self.config.edge_cap {
                    return Err(AnalysisError::ResourceLimitExceeded {
                        limit: self.config.edge_cap,
                    });
                }

                let idx = transactions.len();
                out_edges.entry(record.from.clone()).or_default().push(idx);
                in_edges.entry(record.to.clone()).or_default().push(idx);
                transactions.push(TxEdge {
                    tx_hash: record.tx_hash,
                    from_id: record.from,
                    to_id: record.to,
                    amount: record.amount,
                    asset: asset.to_string(),
                    timestamp: record.timestamp,
                    direction,
                    is_cross_bridge,
                    is_mixer_hop,
                });
            }
        }

        for entity in entities.values_mut() {
            entity.in_degree = in_edges.get(&entity.id).map(Vec::len).unwrap_or(0);
            entity.out_degree = out_edges.get(&entity.id).map(Vec::len).unwrap_or(0);
        }
        // Page-rank and clustering stay at their documented defaults; the
        // iterative computations are deferred.
        let uniform = 1.0 / entities.len() as f64;
        for entity in entities.values_mut() {
            entity.page_rank = uniform;
            entity.clustering_coefficient = 0.0;
        }

        info!(
            "Ego graph built: {} entities, {} transactions",
            entities.len(),
            transactions.len()
        );

        Ok(EgoGraph {
            center_id: address.to_string(),
            entities,
            transactions,
            out_edges,
            in_edges,
            max_depth: self.config.max_depth,
            time_window_days: self.config.time_window_days,
            built_at,
        })
    }

    async fn classify_or_degrade(&self, address: &str, chain: &str) -> Classification {
        match self.classifier.classify(address, chain).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Classifier unavailable for {address}: {e}, downgrading to unknown");
                Classification::unknown()
            }
        }
    }

    fn endpoint_category_is(
        &self,
        entities: &HashMap<String, Entity>,
        from: &str,
        to: &str,
        category: super::EntityCategory,
    ) -> bool {
        let matches = |id: &str| entities.get(id).map(|e| e.category == category).unwrap_or(false);
        matches(from) || matches(to)
    }
}
