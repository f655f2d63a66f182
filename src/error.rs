use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
///
/// Classifier and per-node transaction-source failures are recovered locally
/// (downgrade to unknown / empty neighbourhood) and never reach callers; the
/// variants here are the ones that abort an analysis. No partial risk score
/// is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis cancelled")]
    Cancelled,

    #[error("entity classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("transaction source unavailable: {0}")]
    TransactionSourceUnavailable(String),

    #[error("resource limit exceeded: graph would materialise more than {limit} edges")]
    ResourceLimitExceeded { limit: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal invariant violation: {0}")]
    InvariantViolation(String),
}

/// Errors returned by external providers (entity classifier, transaction
/// source). The core maps these to local degradation or to the fatal
/// `AnalysisError` variants depending on where they occur.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}
