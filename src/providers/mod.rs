pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::graph::{EntityCategory, EntityType};

/// A raw transfer record as supplied by a transaction source.
///
/// Sources must return records newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub kind: TxKind,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Received,
    Sent,
    Internal,
}

/// Classification verdict for an address: coarse type, automaton-facing
/// category, and free-form tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub entity_type: EntityType,
    pub category: EntityCategory,
    pub tags: Vec<String>,
}

impl Classification {
    /// The degraded verdict used when the classifier is unavailable.
    pub fn unknown() -> Self {
        Self {
            entity_type: EntityType::Unknown,
            category: EntityCategory::Unknown,
            tags: Vec::new(),
        }
    }
}

/// Supplies historical transactions for an address. May block on network I/O;
/// implementations manage their own concurrency and are shared read-only.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch up to `max` records for `address`, newest-first.
    async fn fetch(&self, address: &str, max: usize) -> Result<Vec<TxRecord>, ProviderError>;
}

/// Maps an address to an entity classification. May block on network I/O.
#[async_trait]
pub trait EntityClassifier: Send + Sync {
    async fn classify(&self, address: &str, chain: &str) -> Result<Classification, ProviderError>;
}
