use std::sync::Arc;
use tracing::info;

use crate::cancel::CancelToken;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::features::FeatureExtractor;
use crate::graph::builder::EgoGraphBuilder;
use crate::hybrid::HybridScorer;
use crate::ml::RiskModel;
use crate::patterns::{library, PatternAutomaton, PatternEngine};
use crate::providers::{EntityClassifier, TransactionSource};
use crate::rules::{ExposureProfile, RuleScorer};
use crate::score::RiskScore;

/// One analysis request: which address to assess, on which asset/network.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub address: String,
    pub asset: String,
    pub network: String,
}

/// End-to-end address risk analyzer.
///
/// Owns the provider handles, the pattern library, and the scoring stages,
/// and runs the full pipeline per request: ego graph construction, rule
/// scoring, pattern matching, feature extraction, ML prediction, and the
/// hybrid combination. Each analysis is internally sequential and owns its
/// graph; providers are shared read-only, so analyzers can serve concurrent
/// analyses from independent tasks.
pub struct AddressAnalyzer {
    source: Arc<dyn TransactionSource>,
    classifier: Arc<dyn EntityClassifier>,
    model: Arc<dyn RiskModel>,
    patterns: Vec<PatternAutomaton>,
    rule_scorer: RuleScorer,
    hybrid: HybridScorer,
    engine: PatternEngine,
    extractor: FeatureExtractor,
    config: AnalyzerConfig,
}

impl AddressAnalyzer {
    pub fn new(
        source: Arc<dyn TransactionSource>,
        classifier: Arc<dyn EntityClassifier>,
        model: Arc<dyn RiskModel>,
        config: AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            rule_scorer: RuleScorer::new(config.rules.clone()),
            hybrid: HybridScorer::new(config.hybrid)?,
            patterns: library::standard_patterns(),
            engine: PatternEngine::new(),
            extractor: FeatureExtractor::new(),
            source,
            classifier,
            model,
            config,
        })
    }

    /// Replace the pattern library, e.g. to add bespoke automata.
    pub fn with_patterns(mut self, patterns: Vec<PatternAutomaton>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Run one complete analysis. Returns either a full risk score or an
    /// error; never a partial score.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        exposure: &ExposureProfile,
        cancel: &CancelToken,
    ) -> Result<RiskScore, AnalysisError> {
        if request.address.is_empty() {
            return Err(AnalysisError::InvalidInput("empty address".to_string()));
        }

        info!(
            "Analyzing {} on {}/{}",
            request.address, request.asset, request.network
        );

        let builder = EgoGraphBuilder::new(&*self.source, &*self.classifier, &self.config.graph);
        let graph = builder
            .build(&request.address, &request.asset, &request.network, cancel)
            .await?;

        let rule_score = self.rule_scorer.score(exposure)?;
        let matches = self.engine.match_all(&graph, &self.patterns, cancel)?;
        let features = self.extractor.extract(&graph)?;
        let prediction = self.model.predict(&features);

        let score = self.hybrid.combine(&rule_score, &matches, &prediction);
        info!(
            "Analysis completed for {}: total={}, level={:?}",
            request.address, score.total, score.level
        );
        Ok(score)
    }
}
