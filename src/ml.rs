use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::FeatureVector;

/// Risk prediction for one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability the address is illicit, in [0, 1].
    pub probability: f64,
    /// Model confidence in [0, 1].
    pub confidence: f64,
    /// Identifier of the model that produced the prediction.
    pub model_tag: String,
    /// Top-k feature importances for explainability, most important first.
    pub importances: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature_name: String,
    /// Importance in [0, 1].
    pub importance: f64,
}

/// Injected prediction function. Training, model formats, and inference
/// runtimes live outside the core; the pipeline only consumes this contract.
pub trait RiskModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Prediction;
}

/// Interim heuristic standing in for a trained model: mixer and sanctioned
/// neighbour counts plus log volume. Keeps the pipeline runnable end-to-end
/// without an inference runtime.
#[derive(Debug, Default)]
pub struct BaselineModel;

impl BaselineModel {
    pub fn new() -> Self {
        Self
    }
}

impl RiskModel for BaselineModel {
    fn predict(&self, features: &FeatureVector) -> Prediction {
        let feature = |name: &str| features.get(name).unwrap_or(0.0);

        let mut score = 0.0;
        score += feature("mixer_count") * 0.3;
        score += feature("sanctioned_count") * 0.5;
        score += (feature("log_volume") / 100.0).min(0.2);
        let probability = score.min(1.0);

        debug!(
            "Baseline prediction for {}: probability {probability:.3}",
            features.entity_id
        );

        Prediction {
            probability,
            confidence: 0.85,
            model_tag: "baseline_heuristic".to_string(),
            importances: vec![
                FeatureImportance {
                    feature_name: "sanctioned_count".to_string(),
                    importance: 0.35,
                },
                FeatureImportance {
                    feature_name: "mixer_count".to_string(),
                    importance: 0.25,
                },
                FeatureImportance {
                    feature_name: "pagerank".to_string(),
                    importance: 0.15,
                },
            ],
        }
    }
}
