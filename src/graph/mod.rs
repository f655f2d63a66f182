pub mod builder;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Node in the transaction graph: an address or cluster with classification
/// and derived graph metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub chain: String,
    pub entity_type: EntityType,
    pub category: EntityCategory,
    pub tags: Vec<String>,
    pub in_degree: usize,
    pub out_degree: usize,
    pub page_rank: f64,
    pub clustering_coefficient: f64,
}

impl Entity {
    /// Build an entity from a classification verdict, inserting the
    /// category-implied tag so category and tags stay consistent.
    pub fn new(
        id: impl Into<String>,
        chain: impl Into<String>,
        entity_type: EntityType,
        category: EntityCategory,
        mut tags: Vec<String>,
    ) -> Self {
        if let Some(implied) = category.implied_tag() {
            if !tags.iter().any(|t| t == implied) {
                tags.push(implied.to_string());
            }
        }
        Self {
            id: id.into(),
            chain: chain.into(),
            entity_type,
            category,
            tags,
            in_degree: 0,
            out_degree: 0,
            page_rank: 0.0,
            clustering_coefficient: 0.0,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Eoa,
    Contract,
    Cex,
    Dex,
    Mixer,
    Bridge,
    Scam,
    Darknet,
    Sanctioned,
    Unknown,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::Eoa,
        EntityType::Contract,
        EntityType::Cex,
        EntityType::Dex,
        EntityType::Mixer,
        EntityType::Bridge,
        EntityType::Scam,
        EntityType::Darknet,
        EntityType::Sanctioned,
        EntityType::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityType::Eoa => "eoa",
            EntityType::Contract => "contract",
            EntityType::Cex => "cex",
            EntityType::Dex => "dex",
            EntityType::Mixer => "mixer",
            EntityType::Bridge => "bridge",
            EntityType::Scam => "scam",
            EntityType::Darknet => "darknet",
            EntityType::Sanctioned => "sanctioned",
            EntityType::Unknown => "unknown",
        }
    }
}

/// Coarse classification consumed by pattern automata and the rule layer.
/// `Unknown` is the degraded verdict for unclassifiable counterparties; it
/// matches no category condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Clean,
    Mixer,
    Bridge,
    CexHighRisk,
    CexCompliant,
    Darknet,
    Scam,
    Sanctioned,
    Stolen,
    Ransomware,
    TerroristFinancing,
    Unknown,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 12] = [
        EntityCategory::Clean,
        EntityCategory::Mixer,
        EntityCategory::Bridge,
        EntityCategory::CexHighRisk,
        EntityCategory::CexCompliant,
        EntityCategory::Darknet,
        EntityCategory::Scam,
        EntityCategory::Sanctioned,
        EntityCategory::Stolen,
        EntityCategory::Ransomware,
        EntityCategory::TerroristFinancing,
        EntityCategory::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityCategory::Clean => "clean",
            EntityCategory::Mixer => "mixer",
            EntityCategory::Bridge => "bridge",
            EntityCategory::CexHighRisk => "cex_high_risk",
            EntityCategory::CexCompliant => "cex_compliant",
            EntityCategory::Darknet => "darknet",
            EntityCategory::Scam => "scam",
            EntityCategory::Sanctioned => "sanctioned",
            EntityCategory::Stolen => "stolen",
            EntityCategory::Ransomware => "ransomware",
            EntityCategory::TerroristFinancing => "terrorist_financing",
            EntityCategory::Unknown => "unknown",
        }
    }

    /// Tag implied by the category, if any.
    pub fn implied_tag(&self) -> Option<&'static str> {
        match self {
            EntityCategory::Mixer => Some("MIXER"),
            EntityCategory::Sanctioned => Some("SANCTIONED"),
            EntityCategory::Darknet => Some("DARKNET"),
            EntityCategory::Scam => Some("SCAM"),
            _ => None,
        }
    }
}

/// Directed edge in the ego graph: one transfer between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxEdge {
    pub tx_hash: String,
    pub from_id: String,
    pub to_id: String,
    pub amount: f64,
    pub asset: String,
    pub timestamp: DateTime<Utc>,
    /// Direction from the perspective of the node whose expansion produced
    /// the edge.
    pub direction: Direction,
    pub is_cross_bridge: bool,
    pub is_mixer_hop: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
    Internal,
}

/// Bounded neighbourhood of a centre entity: all entities and transfers
/// reachable within `max_depth` hops and `time_window_days`.
///
/// Edges live in a flat list; adjacency maps hold indices into it and
/// preserve insertion order, which keeps automaton traversal deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgoGraph {
    pub center_id: String,
    pub entities: HashMap<String, Entity>,
    pub transactions: Vec<TxEdge>,
    pub out_edges: HashMap<String, Vec<usize>>,
    pub in_edges: HashMap<String, Vec<usize>>,
    pub max_depth: usize,
    pub time_window_days: i64,
    /// Construction instant; the reference point for temporal features.
    pub built_at: DateTime<Utc>,
}

impl EgoGraph {
    pub fn center(&self) -> Option<&Entity> {
        self.entities.get(&self.center_id)
    }

    /// Indices of outgoing edges from `id`, in insertion order.
    pub fn outgoing(&self, id: &str) -> &[usize] {
        self.out_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices of incoming edges to `id`, in insertion order.
    pub fn incoming(&self, id: &str) -> &[usize] {
        self.in_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge(&self, idx: usize) -> &TxEdge {
        &self.transactions[idx]
    }

    /// Distinct 1-hop neighbour ids of `id`.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &idx in self.outgoing(id) {
            let to = self.transactions[idx].to_id.as_str();
            if seen.insert(to) {
                out.push(to);
            }
        }
        for &idx in self.incoming(id) {
            let from = self.transactions[idx].from_id.as_str();
            if seen.insert(from) {
                out.push(from);
            }
        }
        out
    }

    /// Total volume incident to `id` (outgoing plus incoming amounts).
    pub fn total_volume(&self, id: &str) -> f64 {
        let out: f64 = self.outgoing(id).iter().map(|&i| self.transactions[i].amount).sum();
        let inc: f64 = self.incoming(id).iter().map(|&i| self.transactions[i].amount).sum();
        out + inc
    }

    pub fn count_by_category(&self, category: EntityCategory) -> usize {
        self.entities.values().filter(|e| e.category == category).count()
    }
}
