use tracing::debug;

use super::{ExposureProfile, IllicitCategory};
use crate::config::RuleConfig;
use crate::error::AnalysisError;
use crate::score::{RiskLevel, RiskScore, RiskTag, ScoreComponent, Severity};

/// Scoring parameters for one illicit category.
struct CategoryRule {
    category: IllicitCategory,
    dimension: &'static str,
    multiplier: f64,
    cap: i32,
    tag_code: &'static str,
    tag_description: &'static str,
    explanation: &'static str,
}

/// Table order fixes the breakdown order of category components.
const CATEGORY_RULES: [CategoryRule; 6] = [
    CategoryRule {
        category: IllicitCategory::MixersPrivacy,
        dimension: "mixers",
        multiplier: 0.6,
        cap: 20,
        tag_code: "MIXER_USAGE",
        tag_description: "Transactions through mixers or privacy protocols",
        explanation: "Mixer/privacy tool usage",
    },
    CategoryRule {
        category: IllicitCategory::StolenFunds,
        dimension: "stolen_funds",
        multiplier: 0.8,
        cap: 25,
        tag_code: "STOLEN_FUNDS",
        tag_description: "Linked to hacks, exploits, or stolen cryptocurrency",
        explanation: "Stolen/hacked funds exposure",
    },
    CategoryRule {
        category: IllicitCategory::DarknetMarkets,
        dimension: "darknet",
        multiplier: 0.7,
        cap: 20,
        tag_code: "DARKNET",
        tag_description: "Darknet marketplace transactions",
        explanation: "Darknet market activity",
    },
    CategoryRule {
        category: IllicitCategory::ScamsFraud,
        dimension: "scams",
        multiplier: 0.7,
        cap: 20,
        tag_code: "SCAM",
        tag_description: "Associated with scams or fraudulent schemes",
        explanation: "Scam/fraud exposure",
    },
    CategoryRule {
        category: IllicitCategory::Ransomware,
        dimension: "ransomware",
        multiplier: 0.9,
        cap: 30,
        tag_code: "RANSOMWARE",
        tag_description: "Ransomware payment or distribution",
        explanation: "Ransomware activity",
    },
    CategoryRule {
        category: IllicitCategory::TerroristFinancing,
        dimension: "terrorist_financing",
        multiplier: 1.0,
        cap: 70,
        tag_code: "TERRORIST_FINANCING",
        tag_description: "Terrorist financing activity",
        explanation: "Terrorist financing exposure",
    },
];

/// Additive rule-based scorer over a per-address exposure record.
///
/// The formula is the contract: sanctions takes the maximum single hit,
/// illicit categories add independently under per-category caps, temporal
/// and behavioural adjustments add on top, and the sum clamps to 0..=100.
pub struct RuleScorer {
    config: RuleConfig,
}

impl RuleScorer {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, exposure: &ExposureProfile) -> Result<RiskScore, AnalysisError> {
        validate(exposure)?;

        let mut components: Vec<ScoreComponent> = Vec::new();
        let mut tags: Vec<RiskTag> = Vec::new();
        let mut total: i64 = 0;

        total += self.sanctions_score(exposure, &mut components, &mut tags) as i64;
        total += self.category_score(exposure, &mut components, &mut tags) as i64;
        total += self.temporal_adjustment(exposure, &mut components) as i64;
        total += self.behavioral_score(exposure, &mut components, &mut tags) as i64;

        let total = total.clamp(0, 100) as u8;
        let illicit = exposure.total_illicit_volume_pct();

        debug!(
            "Rule score for {}: total={total}, {} components",
            exposure.address,
            components.len()
        );

        Ok(RiskScore {
            total,
            level: RiskLevel::from_score(total),
            breakdown: components,
            illicit_volume_pct: illicit,
            clean_volume_pct: (100.0 - illicit).max(0.0),
            tags,
        })
    }

    /// Sanctions dimension: the maximum single hit, not a sum.
    fn sanctions_score(
        &self,
        exposure: &ExposureProfile,
        components: &mut Vec<ScoreComponent>,
        tags: &mut Vec<RiskTag>,
    ) -> i32 {
        let (score, explanation, tag) = if exposure.direct_sanctions_hit
            || exposure.direct_sanctioned_volume_pct > 0.0
        {
            (
                60,
                format!(
                    "Direct sanctions exposure: {}%",
                    exposure.direct_sanctioned_volume_pct
                ),
                RiskTag::new(
                    "DIRECT_SANCTIONS",
                    Severity::Critical,
                    "Address directly on sanctions list (OFAC/EU/UN)",
                ),
            )
        } else if exposure.indirect_sanctioned_volume_pct_1hop > 10.0 {
            (
                40,
                format!(
                    "1-hop sanctions exposure: {}%",
                    exposure.indirect_sanctioned_volume_pct_1hop
                ),
                RiskTag::new(
                    "SANCTIONS_1HOP",
                    Severity::High,
                    "Direct counterparty on sanctions list",
                ),
            )
        } else if exposure.indirect_sanctioned_volume_pct_2to4hop > 20.0 {
            (
                25,
                format!(
                    "2-4 hop sanctions exposure: {}%",
                    exposure.indirect_sanctioned_volume_pct_2to4hop
                ),
                RiskTag::new(
                    "SANCTIONS_2_4HOP",
                    Severity::Medium,
                    "Indirect sanctions exposure (2-4 hops)",
                ),
            )
        } else {
            return 0;
        };

        components.push(ScoreComponent::new("sanctions", score, explanation));
        tags.push(tag);
        score
    }

    /// Illicit categories: each contributes independently under its cap.
    fn category_score(
        &self,
        exposure: &ExposureProfile,
        components: &mut Vec<ScoreComponent>,
        tags: &mut Vec<RiskTag>,
    ) -> i32 {
        let mut total = 0;

        for rule in &CATEGORY_RULES {
            let volume = exposure.category_volume(rule.category);
            if volume <= 0.0 {
                continue;
            }

            let (multiplier, cap) = match self.config.category_overrides.get(rule.category.name()) {
                Some(ov) => (ov.multiplier, ov.cap),
                None => (rule.multiplier, rule.cap),
            };
            let score = (volume * multiplier).min(cap as f64) as i32;
            total += score;

            components.push(ScoreComponent::new(
                rule.dimension,
                score,
                format!("{}: {volume}%", rule.explanation),
            ));

            let severity = if rule.category == IllicitCategory::MixersPrivacy {
                if volume > 50.0 {
                    Severity::High
                } else {
                    Severity::Medium
                }
            } else {
                match rule.category {
                    IllicitCategory::Ransomware | IllicitCategory::TerroristFinancing => {
                        Severity::Critical
                    }
                    IllicitCategory::ScamsFraud => Severity::Medium,
                    _ => Severity::High,
                }
            };
            tags.push(RiskTag::new(rule.tag_code, severity, rule.tag_description));
        }

        total
    }

    fn temporal_adjustment(
        &self,
        exposure: &ExposureProfile,
        components: &mut Vec<ScoreComponent>,
    ) -> i32 {
        let days_ago = match exposure.temporal.and_then(|t| t.last_illicit_tx_days_ago) {
            Some(days) => days,
            None => return 0,
        };

        let (adjustment, explanation) = if days_ago > 365 {
            (-10, "Last illicit activity over 1 year ago - time decay applied")
        } else if days_ago < 30 {
            (10, "Recent illicit activity within 30 days")
        } else {
            return 0;
        };

        components.push(ScoreComponent::new("time_adjustment", adjustment, explanation));
        adjustment
    }

    fn behavioral_score(
        &self,
        exposure: &ExposureProfile,
        components: &mut Vec<ScoreComponent>,
        tags: &mut Vec<RiskTag>,
    ) -> i32 {
        let metrics = match exposure.behavioral {
            Some(metrics) => metrics,
            None => return 0,
        };

        let mut score = 0;

        if metrics.has_peel_chain_pattern && metrics.peel_chain_length > 5 {
            score += 5;
            tags.push(RiskTag::new(
                "PEEL_CHAIN",
                Severity::Medium,
                "Peel chain pattern detected - potential obfuscation",
            ));
        }

        if metrics.fan_out_degree > 50 && metrics.fan_in_out_ratio < 0.2 {
            score += 3;
            tags.push(RiskTag::new(
                "DISTRIBUTION_PATTERN",
                Severity::Low,
                "Distribution pattern - funds splitting",
            ));
        }

        if score > 0 {
            components.push(ScoreComponent::new(
                "behavioral",
                score,
                "Behavioral red flags detected",
            ));
        }

        score
    }
}

fn validate(exposure: &ExposureProfile) -> Result<(), AnalysisError> {
    let pcts = [
        exposure.direct_sanctioned_volume_pct,
        exposure.indirect_sanctioned_volume_pct_1hop,
        exposure.indirect_sanctioned_volume_pct_2to4hop,
    ];
    if pcts.iter().any(|p| *p < 0.0)
        || exposure.illicit_category_volumes.values().any(|v| *v < 0.0)
    {
        return Err(AnalysisError::InvalidInput(
            "negative volume percentage".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{BehavioralMetrics, TemporalMetrics};

    fn scorer() -> RuleScorer {
        RuleScorer::new(RuleConfig::default())
    }

    fn exposure_with(category: IllicitCategory, volume: f64) -> ExposureProfile {
        let mut exposure = ExposureProfile::default();
        exposure.illicit_category_volumes.insert(category, volume);
        exposure
    }

    #[test]
    fn clean_address_scores_zero() {
        let score = scorer().score(&ExposureProfile::default()).unwrap();
        assert_eq!(score.total, 0);
        assert_eq!(score.level, RiskLevel::Low);
        assert!(score.breakdown.is_empty());
        assert!(score.tags.is_empty());
    }

    #[test]
    fn direct_sanctions_scores_sixty() {
        let mut exposure = ExposureProfile::default();
        exposure.direct_sanctioned_volume_pct = 5.0;
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 60);
        assert_eq!(score.level, RiskLevel::High);
        assert_eq!(score.tags[0].code, "DIRECT_SANCTIONS");
        assert_eq!(score.tags[0].severity, Severity::Critical);
    }

    #[test]
    fn direct_sanctions_bit_wins_even_at_zero_pct() {
        let mut exposure = ExposureProfile::default();
        exposure.direct_sanctions_hit = true;
        exposure.indirect_sanctioned_volume_pct_1hop = 50.0;
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 60);
        assert_eq!(score.tags[0].code, "DIRECT_SANCTIONS");
    }

    #[test]
    fn tiny_direct_pct_still_takes_direct_path() {
        let mut exposure = ExposureProfile::default();
        exposure.direct_sanctioned_volume_pct = 0.01;
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 60);
        assert_eq!(score.tags[0].code, "DIRECT_SANCTIONS");
    }

    #[test]
    fn one_hop_sanctions_needs_over_ten_pct() {
        let mut exposure = ExposureProfile::default();
        exposure.indirect_sanctioned_volume_pct_1hop = 10.0;
        assert_eq!(scorer().score(&exposure).unwrap().total, 0);

        exposure.indirect_sanctioned_volume_pct_1hop = 10.5;
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 40);
        assert_eq!(score.tags[0].code, "SANCTIONS_1HOP");
    }

    #[test]
    fn two_to_four_hop_sanctions() {
        let mut exposure = ExposureProfile::default();
        exposure.indirect_sanctioned_volume_pct_2to4hop = 25.0;
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 25);
        assert_eq!(score.tags[0].code, "SANCTIONS_2_4HOP");
        assert_eq!(score.tags[0].severity, Severity::Medium);
    }

    #[test]
    fn sanctions_takes_max_single_hit_not_sum() {
        let mut exposure = ExposureProfile::default();
        exposure.direct_sanctioned_volume_pct = 1.0;
        exposure.indirect_sanctioned_volume_pct_1hop = 90.0;
        exposure.indirect_sanctioned_volume_pct_2to4hop = 90.0;
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 60);
        assert_eq!(score.tags.len(), 1);
    }

    #[test]
    fn mixer_volume_scores_with_cap() {
        // 30% * 0.6 = 18, under the cap of 20.
        let score = scorer()
            .score(&exposure_with(IllicitCategory::MixersPrivacy, 30.0))
            .unwrap();
        assert_eq!(score.total, 18);
        assert_eq!(score.breakdown[0].dimension, "mixers");
        assert_eq!(score.tags[0].code, "MIXER_USAGE");
        assert_eq!(score.tags[0].severity, Severity::Medium);
    }

    #[test]
    fn mixer_cap_applies() {
        // 80% * 0.6 = 48, capped at 20; severity high above 50%.
        let score = scorer()
            .score(&exposure_with(IllicitCategory::MixersPrivacy, 80.0))
            .unwrap();
        assert_eq!(score.total, 20);
        assert_eq!(score.tags[0].severity, Severity::High);
    }

    #[test]
    fn zero_mixer_volume_contributes_nothing() {
        let score = scorer()
            .score(&exposure_with(IllicitCategory::MixersPrivacy, 0.0))
            .unwrap();
        assert!(score.breakdown.is_empty());
        assert!(!score.tags.iter().any(|t| t.code == "MIXER_USAGE"));
    }

    #[test]
    fn ransomware_over_hundred_pct_is_capped() {
        // Input error tolerated: 200% * 0.9 = 180, capped at 30.
        let score = scorer()
            .score(&exposure_with(IllicitCategory::Ransomware, 200.0))
            .unwrap();
        assert_eq!(score.total, 30);
        assert!(score.total <= 100);
        assert_eq!(score.illicit_volume_pct, 200.0);
        assert_eq!(score.clean_volume_pct, 0.0);
    }

    #[test]
    fn negative_volume_is_invalid_input() {
        let err = scorer()
            .score(&exposure_with(IllicitCategory::Ransomware, -1.0))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn categories_add_independently() {
        let mut exposure = ExposureProfile::default();
        exposure
            .illicit_category_volumes
            .insert(IllicitCategory::MixersPrivacy, 10.0); // 6
        exposure
            .illicit_category_volumes
            .insert(IllicitCategory::StolenFunds, 10.0); // 8
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 14);
        assert_eq!(score.breakdown.len(), 2);
        // Breakdown order follows the scoring table.
        assert_eq!(score.breakdown[0].dimension, "mixers");
        assert_eq!(score.breakdown[1].dimension, "stolen_funds");
    }

    #[test]
    fn gambling_counts_toward_illicit_total_only() {
        let score = scorer()
            .score(&exposure_with(IllicitCategory::Gambling, 40.0))
            .unwrap();
        assert_eq!(score.total, 0);
        assert!(score.breakdown.is_empty());
        assert_eq!(score.illicit_volume_pct, 40.0);
        assert_eq!(score.clean_volume_pct, 60.0);
    }

    #[test]
    fn category_monotonicity() {
        for category in [
            IllicitCategory::MixersPrivacy,
            IllicitCategory::StolenFunds,
            IllicitCategory::DarknetMarkets,
            IllicitCategory::ScamsFraud,
            IllicitCategory::Ransomware,
            IllicitCategory::TerroristFinancing,
        ] {
            let mut last = 0;
            for volume in [1.0, 5.0, 20.0, 50.0, 90.0, 100.0] {
                let score = scorer().score(&exposure_with(category, volume)).unwrap();
                let component = score.breakdown[0].value;
                assert!(
                    component >= last,
                    "{category:?} dropped from {last} to {component} at {volume}%"
                );
                last = component;
            }
        }
    }

    #[test]
    fn old_activity_applies_time_decay() {
        let mut exposure = exposure_with(IllicitCategory::MixersPrivacy, 30.0);
        exposure.temporal = Some(TemporalMetrics {
            last_illicit_tx_days_ago: Some(400),
        });
        let score = scorer().score(&exposure).unwrap();
        // 18 mixer - 10 decay = 8.
        assert_eq!(score.total, 8);
        assert_eq!(score.level, RiskLevel::Low);
        assert!(score.tags.iter().any(|t| t.code == "MIXER_USAGE"));
        let decay = score
            .breakdown
            .iter()
            .find(|c| c.dimension == "time_adjustment")
            .unwrap();
        assert_eq!(decay.value, -10);
    }

    #[test]
    fn recent_activity_adds_penalty() {
        let mut exposure = exposure_with(IllicitCategory::MixersPrivacy, 30.0);
        exposure.temporal = Some(TemporalMetrics {
            last_illicit_tx_days_ago: Some(10),
        });
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 28);
    }

    #[test]
    fn exactly_365_days_has_no_adjustment() {
        let mut exposure = exposure_with(IllicitCategory::MixersPrivacy, 30.0);
        exposure.temporal = Some(TemporalMetrics {
            last_illicit_tx_days_ago: Some(365),
        });
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 18);
        assert!(!score.breakdown.iter().any(|c| c.dimension == "time_adjustment"));
    }

    #[test]
    fn null_last_illicit_means_no_adjustment() {
        let mut exposure = exposure_with(IllicitCategory::MixersPrivacy, 30.0);
        exposure.temporal = Some(TemporalMetrics {
            last_illicit_tx_days_ago: None,
        });
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 18);
    }

    #[test]
    fn peel_chain_needs_length_over_five() {
        let mut exposure = ExposureProfile::default();
        exposure.behavioral = Some(BehavioralMetrics {
            has_peel_chain_pattern: true,
            peel_chain_length: 5,
            ..Default::default()
        });
        assert_eq!(scorer().score(&exposure).unwrap().total, 0);

        exposure.behavioral = Some(BehavioralMetrics {
            has_peel_chain_pattern: true,
            peel_chain_length: 6,
            ..Default::default()
        });
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 5);
        assert_eq!(score.tags[0].code, "PEEL_CHAIN");
    }

    #[test]
    fn distribution_pattern_fires_on_high_fan_out() {
        let mut exposure = ExposureProfile::default();
        exposure.behavioral = Some(BehavioralMetrics {
            fan_out_degree: 60,
            fan_in_out_ratio: 0.1,
            ..Default::default()
        });
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 3);
        assert_eq!(score.tags[0].code, "DISTRIBUTION_PATTERN");
        assert_eq!(score.tags[0].severity, Severity::Low);
    }

    #[test]
    fn total_clamps_at_one_hundred() {
        let mut exposure = ExposureProfile::default();
        exposure.direct_sanctioned_volume_pct = 100.0;
        for category in [
            IllicitCategory::MixersPrivacy,
            IllicitCategory::StolenFunds,
            IllicitCategory::DarknetMarkets,
            IllicitCategory::ScamsFraud,
            IllicitCategory::Ransomware,
            IllicitCategory::TerroristFinancing,
        ] {
            exposure.illicit_category_volumes.insert(category, 100.0);
        }
        let score = scorer().score(&exposure).unwrap();
        assert_eq!(score.total, 100);
        assert_eq!(score.level, RiskLevel::Critical);
    }

    #[test]
    fn config_override_changes_multiplier_and_cap() {
        let mut config = RuleConfig::default();
        config.category_overrides.insert(
            "mixers_privacy".to_string(),
            crate::config::CategoryOverride {
                multiplier: 1.0,
                cap: 50,
            },
        );
        let score = RuleScorer::new(config)
            .score(&exposure_with(IllicitCategory::MixersPrivacy, 40.0))
            .unwrap();
        assert_eq!(score.total, 40);
    }
}
