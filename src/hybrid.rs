use tracing::info;

use crate::config::HybridConfig;
use crate::error::AnalysisError;
use crate::ml::Prediction;
use crate::patterns::MatchResult;
use crate::score::{RiskLevel, RiskScore, RiskTag, ScoreComponent};

/// Fuses the rule score, pattern matches, and ML prediction into the final
/// risk score:
///
/// `final = round(clamp(α·rule + β·pattern + γ·ml, 0, 100))`
///
/// A weighted sum, not a convex combination: the weights are configurable
/// and need not sum to 1, but their sum must be positive.
#[derive(Debug)]
pub struct HybridScorer {
    config: HybridConfig,
}

impl HybridScorer {
    pub fn new(config: HybridConfig) -> Result<Self, AnalysisError> {
        let sum = config.rule_weight + config.pattern_weight + config.ml_weight;
        if sum <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "hybrid weights must sum to a positive value, got {sum}"
            )));
        }
        Ok(Self { config })
    }

    pub fn combine(
        &self,
        rule_score: &RiskScore,
        matches: &[MatchResult],
        prediction: &Prediction,
    ) -> RiskScore {
        let pattern_score = pattern_score(matches);
        let ml_score = (prediction.probability * 100.0).round() as i32;

        let combined = self.config.rule_weight * rule_score.total as f64
            + self.config.pattern_weight * pattern_score
            + self.config.ml_weight * ml_score as f64;
        let total = combined.clamp(0.0, 100.0).round() as u8;

        info!(
            "Hybrid score: rule={}, pattern={pattern_score:.1}, ml={ml_score} -> {total}",
            rule_score.total
        );

        let breakdown = self.build_breakdown(rule_score, matches, prediction, ml_score, total);
        let tags = build_tags(rule_score, matches);

        RiskScore {
            total,
            level: RiskLevel::from_score(total),
            breakdown,
            illicit_volume_pct: rule_score.illicit_volume_pct,
            clean_volume_pct: rule_score.clean_volume_pct,
            tags,
        }
    }

    fn build_breakdown(
        &self,
        rule_score: &RiskScore,
        matches: &[MatchResult],
        prediction: &Prediction,
        ml_score: i32,
        total: u8,
    ) -> Vec<ScoreComponent> {
        let mut breakdown = rule_score.breakdown.clone();

        for result in matches.iter().filter(|m| m.matched) {
            let contribution = result.weight as f64 * (result.volume_share / 50.0).min(1.0);
            breakdown.push(ScoreComponent::new(
                format!("pattern_{}", result.pattern_id.to_lowercase()),
                contribution as i32,
                result.explanation.clone(),
            ));
        }

        breakdown.push(ScoreComponent::new(
            "ml_prediction",
            ml_score,
            format!(
                "ML model ({}) prediction: {:.1}% probability, {:.1}% confidence",
                prediction.model_tag,
                prediction.probability * 100.0,
                prediction.confidence * 100.0
            ),
        ));

        breakdown.push(ScoreComponent::new(
            "hybrid_final",
            total as i32,
            format!(
                "Hybrid score: {:.1}×rules + {:.1}×patterns + {:.1}×ML",
                self.config.rule_weight, self.config.pattern_weight, self.config.ml_weight
            ),
        ));

        for importance in &prediction.importances {
            let dimension = format!("ml_feature_{}", importance.feature_name);
            if breakdown.iter().any(|c| c.dimension == dimension) {
                continue;
            }
            breakdown.push(ScoreComponent::new(
                dimension,
                (importance.importance * 100.0).round() as i32,
                format!(
                    "ML top feature: {} ({:.1}% importance)",
                    importance.feature_name,
                    importance.importance * 100.0
                ),
            ));
        }

        breakdown
    }
}

/// `min(100, Σ weight · min(1, share/50))` over matched patterns.
fn pattern_score(matches: &[MatchResult]) -> f64 {
    let total: f64 = matches
        .iter()
        .filter(|m| m.matched)
        .map(|m| m.weight as f64 * (m.volume_share / 50.0).min(1.0))
        .sum();
    total.min(100.0)
}

/// Rule tags plus one PATTERN_<id> tag per match, deduplicated by code.
fn build_tags(rule_score: &RiskScore, matches: &[MatchResult]) -> Vec<RiskTag> {
    let mut tags = rule_score.tags.clone();
    for result in matches.iter().filter(|m| m.matched) {
        tags.push(RiskTag::new(
            format!("PATTERN_{}", result.pattern_id),
            result.severity,
            format!("{} detected", result.pattern_name),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| seen.insert(t.code.clone()));
    tags
}
