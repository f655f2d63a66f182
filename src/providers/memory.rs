use async_trait::async_trait;
use std::collections::HashMap;

use super::{Classification, EntityClassifier, TransactionSource, TxRecord};
use crate::error::ProviderError;

/// In-memory transaction source backed by a per-address record map.
/// Used by tests and the demo binary; production sources wrap chain indexers.
#[derive(Debug, Default)]
pub struct MemoryTransactionSource {
    records: HashMap<String, Vec<TxRecord>>,
    fail_for: Vec<String>,
}

impl MemoryTransactionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register records for an address. Records should be newest-first to
    /// match the source contract.
    pub fn insert(&mut self, address: impl Into<String>, mut records: Vec<TxRecord>) {
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.records.insert(address.into(), records);
    }

    /// Make `fetch` fail for an address, to exercise degradation paths.
    pub fn fail_for(&mut self, address: impl Into<String>) {
        self.fail_for.push(address.into());
    }
}

#[async_trait]
impl TransactionSource for MemoryTransactionSource {
    async fn fetch(&self, address: &str, max: usize) -> Result<Vec<TxRecord>, ProviderError> {
        if self.fail_for.iter().any(|a| a == address) {
            return Err(ProviderError::Unavailable(format!(
                "no data for {address}"
            )));
        }
        let mut records = self.records.get(address).cloned().unwrap_or_default();
        records.truncate(max);
        Ok(records)
    }
}

/// In-memory classifier: an address map with a clean fallback.
#[derive(Debug, Default)]
pub struct MemoryClassifier {
    entries: HashMap<String, Classification>,
    fail_for: Vec<String>,
}

impl MemoryClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: impl Into<String>, classification: Classification) {
        self.entries.insert(address.into(), classification);
    }

    /// Make `classify` fail for an address, to exercise the unknown downgrade.
    pub fn fail_for(&mut self, address: impl Into<String>) {
        self.fail_for.push(address.into());
    }
}

#[async_trait]
impl EntityClassifier for MemoryClassifier {
    async fn classify(&self, address: &str, _chain: &str) -> Result<Classification, ProviderError> {
        if self.fail_for.iter().any(|a| a == address) {
            return Err(ProviderError::Unavailable(format!(
                "classifier offline for {address}"
            )));
        }
        Ok(self.entries.get(address).cloned().unwrap_or(Classification {
            entity_type: crate::graph::EntityType::Eoa,
            category: crate::graph::EntityCategory::Clean,
            tags: Vec::new(),
        }))
    }
}
