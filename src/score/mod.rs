use serde::{Deserialize, Serialize};

/// Final risk assessment for an address: bounded total, derived level, and
/// a complete component-by-component breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub total: u8, // 0-100
    pub level: RiskLevel,
    pub breakdown: Vec<ScoreComponent>,
    /// Sum of illicit-category volume percentages. Diagnostic: may exceed 100
    /// since categories are counted independently.
    pub illicit_volume_pct: f64,
    pub clean_volume_pct: f64,
    pub tags: Vec<RiskTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,      // 0-20
    Medium,   // 21-49
    High,     // 50-74
    Critical, // 75-100
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=20 => RiskLevel::Low,
            21..=49 => RiskLevel::Medium,
            50..=74 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

/// One contribution to the total, signed (time decay is negative).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub dimension: String,
    pub value: i32,
    pub explanation: String,
}

impl ScoreComponent {
    pub fn new(dimension: impl Into<String>, value: i32, explanation: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            value,
            explanation: explanation.into(),
        }
    }
}

/// Symbolic risk marker attached to a score, e.g. DIRECT_SANCTIONS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTag {
    pub code: String,
    pub severity: Severity,
    pub description: String,
}

impl RiskTag {
    pub fn new(code: impl Into<String>, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity,
            description: description.into(),
        }
    }
}

/// Shared severity scale for tags and pattern automata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}
