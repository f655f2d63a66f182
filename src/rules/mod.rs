pub mod scorer;

pub use scorer::RuleScorer;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-address exposure record consumed by the rule scorer.
///
/// Volumes are percentages of total address volume in [0, 100]; values above
/// 100 are tolerated (caps bound their effect) but negatives are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureProfile {
    pub address: String,
    pub asset: String,
    pub network: String,

    /// Explicit sanctions-list hit. Scores the direct-sanctions path even
    /// when the reported volume percentage is zero.
    pub direct_sanctions_hit: bool,
    pub direct_sanctioned_volume_pct: f64,
    pub indirect_sanctioned_volume_pct_1hop: f64,
    pub indirect_sanctioned_volume_pct_2to4hop: f64,

    pub illicit_category_volumes: HashMap<IllicitCategory, f64>,

    pub temporal: Option<TemporalMetrics>,
    pub behavioral: Option<BehavioralMetrics>,
}

impl ExposureProfile {
    pub fn category_volume(&self, category: IllicitCategory) -> f64 {
        self.illicit_category_volumes.get(&category).copied().unwrap_or(0.0)
    }

    /// Sum of all illicit-category volumes. Diagnostic: categories overlap,
    /// so the sum may exceed 100.
    pub fn total_illicit_volume_pct(&self) -> f64 {
        self.illicit_category_volumes.values().sum()
    }
}

/// FATF illicit-activity taxonomy. Six of these carry scoring formulas; the
/// rest only contribute to the diagnostic illicit-volume total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllicitCategory {
    DarknetMarkets,
    ScamsFraud,
    StolenFunds,
    MixersPrivacy,
    Gambling,
    HighRiskExchanges,
    Ransomware,
    TerroristFinancing,
    ChildAbuse,
}

impl IllicitCategory {
    pub fn name(&self) -> &'static str {
        match self {
            IllicitCategory::DarknetMarkets => "darknet_markets",
            IllicitCategory::ScamsFraud => "scams_fraud",
            IllicitCategory::StolenFunds => "stolen_funds",
            IllicitCategory::MixersPrivacy => "mixers_privacy",
            IllicitCategory::Gambling => "gambling",
            IllicitCategory::HighRiskExchanges => "high_risk_exchanges",
            IllicitCategory::Ransomware => "ransomware",
            IllicitCategory::TerroristFinancing => "terrorist_financing",
            IllicitCategory::ChildAbuse => "child_abuse",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalMetrics {
    /// Days since the last illicit transaction; `None` means no adjustment.
    pub last_illicit_tx_days_ago: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralMetrics {
    pub has_peel_chain_pattern: bool,
    pub peel_chain_length: u32,
    pub fan_out_degree: u32,
    pub fan_in_out_ratio: f64,
}
