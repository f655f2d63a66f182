//! Hybrid AML risk scoring for cryptocurrency addresses.
//!
//! The pipeline fuses three independent signals into one bounded 0-100 score
//! with a complete, auditable breakdown:
//!
//! 1. an ego graph is materialised around the target address by bounded BFS
//!    over a [`providers::TransactionSource`], annotated through a
//!    [`providers::EntityClassifier`];
//! 2. a [`rules::RuleScorer`] turns per-address exposure statistics into an
//!    additive component score;
//! 3. a [`patterns::PatternEngine`] executes a library of finite automata
//!    over the graph to detect temporal laundering narratives;
//! 4. a [`features::FeatureExtractor`] projects the graph into a stable
//!    feature vector for an injected [`ml::RiskModel`];
//! 5. the [`hybrid::HybridScorer`] combines rule, pattern, and ML scores
//!    into the final [`score::RiskScore`].
//!
//! [`analyzer::AddressAnalyzer`] wires the stages together for one-call use.

pub mod analyzer;
pub mod cancel;
pub mod config;
pub mod error;
pub mod features;
pub mod graph;
pub mod hybrid;
pub mod ml;
pub mod patterns;
pub mod providers;
pub mod rules;
pub mod score;

pub use analyzer::{AddressAnalyzer, AnalysisRequest};
pub use cancel::CancelToken;
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, ProviderError};
pub use score::{RiskLevel, RiskScore, RiskTag, ScoreComponent, Severity};
