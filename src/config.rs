use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub graph: GraphConfig,
    pub rules: RuleConfig,
    pub hybrid: HybridConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphConfig {
    /// BFS depth cap.
    pub max_depth: usize,
    /// Edge time-window cutoff in days.
    pub time_window_days: i64,
    /// Hard limit on materialised edges per analysis.
    pub edge_cap: usize,
    /// Per-node transaction fetch cap.
    pub tx_fetch_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RuleConfig {
    /// Per-category multiplier/cap overrides keyed by category name
    /// (e.g. "mixers_privacy"). Unlisted categories keep the defaults.
    pub category_overrides: HashMap<String, CategoryOverride>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CategoryOverride {
    pub multiplier: f64,
    pub cap: i32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct HybridConfig {
    pub rule_weight: f64,
    pub pattern_weight: f64,
    pub ml_weight: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            rules: RuleConfig::default(),
            hybrid: HybridConfig::default(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            time_window_days: 180,
            edge_cap: 100_000,
            tx_fetch_limit: 1000,
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            category_overrides: HashMap::new(),
        }
    }
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            rule_weight: 0.4,
            pattern_weight: 0.3,
            ml_weight: 0.3,
        }
    }
}

impl AnalyzerConfig {
    /// Load config from a TOML file. Falls back to defaults if file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.graph.max_depth, 3);
        assert_eq!(config.graph.time_window_days, 180);
        assert_eq!(config.graph.edge_cap, 100_000);
        assert_eq!(config.hybrid.rule_weight, 0.4);
        assert_eq!(config.hybrid.pattern_weight, 0.3);
        assert_eq!(config.hybrid.ml_weight, 0.3);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AnalyzerConfig::load("/nonexistent/chainrisk.toml");
        assert_eq!(config.graph.max_depth, 3);
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let config: AnalyzerConfig = toml::from_str(
            r#"
            [graph]
            max_depth = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.graph.max_depth, 5);
        assert_eq!(config.graph.time_window_days, 180);
        assert_eq!(config.hybrid.ml_weight, 0.3);
    }

    #[test]
    fn category_override_parses() {
        let config: AnalyzerConfig = toml::from_str(
            r#"
            [rules.category_overrides.mixers_privacy]
            multiplier = 0.9
            cap = 40
            "#,
        )
        .unwrap();
        let ov = config.rules.category_overrides.get("mixers_privacy").unwrap();
        assert_eq!(ov.multiplier, 0.9);
        assert_eq!(ov.cap, 40);
    }
}
