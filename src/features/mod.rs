use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::AnalysisError;
use crate::graph::{EgoGraph, Entity, EntityCategory, EntityType, TxEdge};

/// Fixed-length numeric projection of an ego graph with a parallel name list.
///
/// The ordering is a stable external contract: new features append at the
/// end; reordering or deleting is a breaking change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub entity_id: String,
    pub values: Vec<f64>,
    pub names: Vec<String>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

/// Projects an ego graph centred on an entity into the feature vector.
/// Extraction is pure: the same graph always yields the same bytes.
pub struct FeatureExtractor;

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, graph: &EgoGraph) -> Result<FeatureVector, AnalysisError> {
        let center = graph.center().ok_or_else(|| {
            AnalysisError::InvariantViolation(format!(
                "centre {} missing from entity map",
                graph.center_id
            ))
        })?;

        let incident = incident_edges(graph);

        let mut values = Vec::with_capacity(feature_names().len());
        values.extend(topology(graph, center));
        values.extend(behavioral(center, &incident));
        values.extend(temporal(graph, &incident));
        values.extend(categorical(center));
        values.extend(cross_chain(graph, center));

        Ok(FeatureVector {
            entity_id: graph.center_id.clone(),
            values,
            names: feature_names(),
        })
    }
}

/// Centre-incident edges: outgoing first, then incoming, insertion order.
fn incident_edges<'a>(graph: &'a EgoGraph) -> Vec<&'a TxEdge> {
    graph
        .outgoing(&graph.center_id)
        .iter()
        .chain(graph.incoming(&graph.center_id).iter())
        .map(|&i| graph.edge(i))
        .collect()
}

fn topology(graph: &EgoGraph, center: &Entity) -> Vec<f64> {
    let degree_sum = center.in_degree + center.out_degree;
    let degree_ratio = if degree_sum > 0 {
        center.in_degree as f64 / degree_sum as f64
    } else {
        0.0
    };
    vec![
        center.in_degree as f64,
        center.out_degree as f64,
        degree_ratio,
        center.page_rank,
        center.clustering_coefficient,
        graph.entities.len() as f64,
        graph.transactions.len() as f64,
        graph.count_by_category(EntityCategory::Mixer) as f64,
        graph.count_by_category(EntityCategory::CexHighRisk) as f64,
        graph.count_by_category(EntityCategory::Sanctioned) as f64,
    ]
}

fn behavioral(center: &Entity, incident: &[&TxEdge]) -> Vec<f64> {
    let total_volume: f64 = incident.iter().map(|e| e.amount).sum();
    let tx_count = incident.len();
    let avg = if tx_count > 0 {
        total_volume / tx_count as f64
    } else {
        0.0
    };
    let fan_ratio = if center.out_degree > 0 {
        center.in_degree as f64 / center.out_degree as f64
    } else {
        0.0
    };
    let amounts: Vec<f64> = incident.iter().map(|e| e.amount).collect();
    vec![
        total_volume,
        total_volume.ln_1p(),
        tx_count as f64,
        (tx_count as f64).ln_1p(),
        avg,
        gini(&amounts),
        fan_ratio,
    ]
}

fn temporal(graph: &EgoGraph, incident: &[&TxEdge]) -> Vec<f64> {
    if incident.is_empty() {
        return vec![0.0; 6];
    }

    let velocity = if graph.time_window_days > 0 {
        incident.len() as f64 / graph.time_window_days as f64
    } else {
        0.0
    };

    let first = incident.iter().map(|e| e.timestamp).min().unwrap_or(graph.built_at);
    let last = incident.iter().map(|e| e.timestamp).max().unwrap_or(graph.built_at);

    // Acceleration: velocity over the later half of the incident span minus
    // velocity over the earlier half.
    let span_secs = (last - first).num_seconds();
    let acceleration = if span_secs > 0 {
        let midpoint = first + chrono::Duration::seconds(span_secs / 2);
        let early = incident.iter().filter(|e| e.timestamp <= midpoint).count();
        let late = incident.len() - early;
        let half_days = span_secs as f64 / 86_400.0 / 2.0;
        (late as f64 - early as f64) / half_days
    } else {
        0.0
    };

    let hours_since_first = (graph.built_at - first).num_hours() as f64;
    let hours_since_last = (graph.built_at - last).num_hours() as f64;

    let active_hours: HashSet<u32> = incident.iter().map(|e| e.timestamp.hour()).collect();

    let weekend = incident
        .iter()
        .filter(|e| {
            matches!(e.timestamp.weekday(), Weekday::Sat | Weekday::Sun)
        })
        .count();
    let weekend_ratio = weekend as f64 / incident.len() as f64;

    vec![
        velocity,
        acceleration,
        hours_since_first,
        hours_since_last,
        active_hours.len() as f64,
        weekend_ratio,
    ]
}

fn categorical(center: &Entity) -> Vec<f64> {
    let mut values = Vec::with_capacity(EntityType::ALL.len() + EntityCategory::ALL.len() + 4);
    for entity_type in EntityType::ALL {
        values.push(if center.entity_type == entity_type { 1.0 } else { 0.0 });
    }
    for category in EntityCategory::ALL {
        values.push(if center.category == category { 1.0 } else { 0.0 });
    }
    for tag in ["MIXER", "SANCTIONED", "SCAM", "DARKNET"] {
        values.push(if center.has_tag(tag) { 1.0 } else { 0.0 });
    }
    values
}

fn cross_chain(graph: &EgoGraph, center: &Entity) -> Vec<f64> {
    // Cluster data is not part of the core; a lone chain counts as one.
    let num_chains = 1.0;

    let outgoing: Vec<&TxEdge> = graph
        .outgoing(&center.id)
        .iter()
        .map(|&i| graph.edge(i))
        .collect();
    let bridge_count = outgoing.iter().filter(|e| e.is_cross_bridge).count();
    let outgoing_volume: f64 = outgoing.iter().map(|e| e.amount).sum();
    let bridge_volume: f64 = outgoing
        .iter()
        .filter(|e| e.is_cross_bridge)
        .map(|e| e.amount)
        .sum();
    let bridge_ratio = if outgoing_volume > 0.0 {
        bridge_volume / outgoing_volume
    } else {
        0.0
    };

    vec![num_chains, bridge_count as f64, bridge_ratio]
}

/// Gini coefficient of a sample, via the sorted formula. 0 for empty input
/// or an all-zero sample.
fn gini(amounts: &[f64]) -> f64 {
    let n = amounts.len();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = amounts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut sorted = amounts.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i + 1) as f64 * x)
        .sum();
    (2.0 * weighted) / (n as f64 * total) - (n as f64 + 1.0) / n as f64
}

/// Feature names, parallel to the extracted values. Append-only.
pub fn feature_names() -> Vec<String> {
    let mut names: Vec<String> = [
        // Topology
        "in_degree",
        "out_degree",
        "degree_ratio",
        "pagerank",
        "clustering_coef",
        "ego_graph_nodes",
        "ego_graph_edges",
        "mixer_count",
        "high_risk_cex_count",
        "sanctioned_count",
        // Behavioral
        "total_volume",
        "log_volume",
        "tx_count",
        "log_tx_count",
        "avg_tx_size",
        "gini_coefficient",
        "fan_in_out_ratio",
        // Temporal
        "tx_velocity",
        "tx_acceleration",
        "hours_since_first",
        "hours_since_last",
        "active_hours",
        "weekend_ratio",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    for entity_type in EntityType::ALL {
        names.push(format!("type_{}", entity_type.name()));
    }
    for category in EntityCategory::ALL {
        names.push(format!("category_{}", category.name()));
    }
    names.extend(
        ["has_mixer_tag", "has_sanctioned_tag", "has_scam_tag", "has_darknet_tag"]
            .into_iter()
            .map(String::from),
    );

    names.extend(
        ["num_chains", "bridge_tx_count", "bridge_volume_ratio"]
            .into_iter()
            .map(String::from),
    );

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Direction;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashMap;

    fn make_graph(edges: Vec<(&str, &str, &str, f64, i64)>) -> EgoGraph {
        let base = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap(); // a Monday
        let mut entities = HashMap::new();
        let mut transactions = Vec::new();
        let mut out_edges: HashMap<String, Vec<usize>> = HashMap::new();
        let mut in_edges: HashMap<String, Vec<usize>> = HashMap::new();

        for (hash, from, to, amount, hours) in edges {
            for id in [from, to] {
                entities.entry(id.to_string()).or_insert_with(|| {
                    Entity::new(id, "ETH", EntityType::Eoa, EntityCategory::Clean, vec![])
                });
            }
            let idx = transactions.len();
            out_edges.entry(from.to_string()).or_default().push(idx);
            in_edges.entry(to.to_string()).or_default().push(idx);
            transactions.push(TxEdge {
                tx_hash: hash.to_string(),
                from_id: from.to_string(),
                to_id: to.to_string(),
                amount,
                asset: "ETH".to_string(),
                timestamp: base + Duration::hours(hours),
                direction: Direction::Outgoing,
                is_cross_bridge: false,
                is_mixer_hop: false,
            });
        }
        entities.entry("center".to_string()).or_insert_with(|| {
            Entity::new("center", "ETH", EntityType::Eoa, EntityCategory::Clean, vec![])
        });

        for entity in entities.values_mut() {
            entity.in_degree = in_edges.get(&entity.id).map(Vec::len).unwrap_or(0);
            entity.out_degree = out_edges.get(&entity.id).map(Vec::len).unwrap_or(0);
        }

        EgoGraph {
            center_id: "center".to_string(),
            entities,
            transactions,
            out_edges,
            in_edges,
            max_depth: 3,
            time_window_days: 180,
            built_at: base + Duration::days(2),
        }
    }

    #[test]
    fn names_and_values_have_equal_length() {
        let graph = make_graph(vec![("t1", "center", "a", 10.0, 0)]);
        let features = FeatureExtractor::new().extract(&graph).unwrap();
        assert_eq!(features.values.len(), features.names.len());
    }

    #[test]
    fn extraction_is_deterministic() {
        let graph = make_graph(vec![
            ("t1", "center", "a", 10.0, 0),
            ("t2", "a", "center", 3.0, 5),
            ("t3", "center", "b", 7.0, 9),
        ]);
        let extractor = FeatureExtractor::new();
        let first = extractor.extract(&graph).unwrap();
        let second = extractor.extract(&graph).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn degree_features_reflect_graph() {
        let graph = make_graph(vec![
            ("t1", "center", "a", 10.0, 0),
            ("t2", "b", "center", 5.0, 1),
        ]);
        let features = FeatureExtractor::new().extract(&graph).unwrap();
        assert_eq!(features.get("in_degree"), Some(1.0));
        assert_eq!(features.get("out_degree"), Some(1.0));
        assert_eq!(features.get("degree_ratio"), Some(0.5));
        assert_eq!(features.get("ego_graph_nodes"), Some(3.0));
        assert_eq!(features.get("ego_graph_edges"), Some(2.0));
    }

    #[test]
    fn empty_neighbourhood_zeroes_ratios() {
        let graph = make_graph(vec![]);
        let features = FeatureExtractor::new().extract(&graph).unwrap();
        assert_eq!(features.get("degree_ratio"), Some(0.0));
        assert_eq!(features.get("avg_tx_size"), Some(0.0));
        assert_eq!(features.get("fan_in_out_ratio"), Some(0.0));
        assert_eq!(features.get("tx_velocity"), Some(0.0));
        assert_eq!(features.get("weekend_ratio"), Some(0.0));
    }

    #[test]
    fn volume_features_sum_incident_edges() {
        let graph = make_graph(vec![
            ("t1", "center", "a", 10.0, 0),
            ("t2", "b", "center", 5.0, 1),
            ("t3", "a", "b", 99.0, 2), // not incident to the centre
        ]);
        let features = FeatureExtractor::new().extract(&graph).unwrap();
        assert_eq!(features.get("total_volume"), Some(15.0));
        assert_eq!(features.get("tx_count"), Some(2.0));
        assert_eq!(features.get("avg_tx_size"), Some(7.5));
    }

    #[test]
    fn gini_of_equal_amounts_is_zero() {
        assert!(gini(&[5.0, 5.0, 5.0, 5.0]).abs() < 1e-9);
    }

    #[test]
    fn gini_of_concentrated_amounts() {
        let g = gini(&[0.0, 0.0, 0.0, 10.0]);
        assert!((g - 0.75).abs() < 1e-9, "expected 0.75, got {g}");
    }

    #[test]
    fn gini_of_empty_is_zero() {
        assert_eq!(gini(&[]), 0.0);
    }

    #[test]
    fn one_hot_marks_centre_category() {
        let mut graph = make_graph(vec![("t1", "center", "a", 1.0, 0)]);
        let center = graph.entities.get_mut("center").unwrap();
        center.category = EntityCategory::Mixer;
        center.tags.push("MIXER".to_string());
        let features = FeatureExtractor::new().extract(&graph).unwrap();
        assert_eq!(features.get("category_mixer"), Some(1.0));
        assert_eq!(features.get("category_clean"), Some(0.0));
        assert_eq!(features.get("has_mixer_tag"), Some(1.0));
        assert_eq!(features.get("has_scam_tag"), Some(0.0));
    }

    #[test]
    fn active_hours_counts_distinct_hours() {
        let graph = make_graph(vec![
            ("t1", "center", "a", 1.0, 0),
            ("t2", "center", "b", 1.0, 24), // same hour of day, next day
            ("t3", "center", "c", 1.0, 5),
        ]);
        let features = FeatureExtractor::new().extract(&graph).unwrap();
        assert_eq!(features.get("active_hours"), Some(2.0));
    }

    #[test]
    fn weekend_ratio_counts_saturday_and_sunday() {
        // Base is Monday 2024-06-03; +120h lands on Saturday.
        let graph = make_graph(vec![
            ("t1", "center", "a", 1.0, 0),
            ("t2", "center", "b", 1.0, 120),
        ]);
        let features = FeatureExtractor::new().extract(&graph).unwrap();
        assert_eq!(features.get("weekend_ratio"), Some(0.5));
    }

    #[test]
    fn bridge_volume_ratio_uses_outgoing_only() {
        let mut graph = make_graph(vec![
            ("t1", "center", "a", 30.0, 0),
            ("t2", "center", "b", 10.0, 1),
        ]);
        graph.transactions[1].is_cross_bridge = true;
        let features = FeatureExtractor::new().extract(&graph).unwrap();
        assert_eq!(features.get("bridge_tx_count"), Some(1.0));
        assert_eq!(features.get("bridge_volume_ratio"), Some(0.25));
        assert_eq!(features.get("num_chains"), Some(1.0));
    }
}
