use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

use chainrisk::analyzer::{AddressAnalyzer, AnalysisRequest};
use chainrisk::cancel::CancelToken;
use chainrisk::config::AnalyzerConfig;
use chainrisk::graph::{EntityCategory, EntityType};
use chainrisk::ml::BaselineModel;
use chainrisk::providers::memory::{MemoryClassifier, MemoryTransactionSource};
use chainrisk::providers::{Classification, TxKind, TxRecord};
use chainrisk::rules::{ExposureProfile, IllicitCategory, TemporalMetrics};

/// Demo run: a synthetic mixer → bridge → high-risk-CEX neighbourhood,
/// analysed with the baseline model.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("chainrisk=info".parse().unwrap()),
        )
        .init();

    tracing::info!("ChainRisk demo starting...");

    let config = AnalyzerConfig::load("config.toml");

    let (source, classifier) = demo_providers();
    let analyzer = AddressAnalyzer::new(
        Arc::new(source),
        Arc::new(classifier),
        Arc::new(BaselineModel::new()),
        config,
    )
    .expect("analyzer config is valid");

    let request = AnalysisRequest {
        address: "0xdemo".to_string(),
        asset: "ETH".to_string(),
        network: "ethereum".to_string(),
    };

    let mut exposure = ExposureProfile {
        address: request.address.clone(),
        asset: request.asset.clone(),
        network: request.network.clone(),
        ..Default::default()
    };
    exposure
        .illicit_category_volumes
        .insert(IllicitCategory::MixersPrivacy, 30.0);
    exposure.temporal = Some(TemporalMetrics {
        last_illicit_tx_days_ago: Some(12),
    });

    let score = analyzer
        .analyze(&request, &exposure, &CancelToken::new())
        .await
        .expect("demo analysis succeeds");

    println!("address: {}", request.address);
    println!("risk:    {} ({:?})", score.total, score.level);
    println!("illicit: {:.1}%  clean: {:.1}%", score.illicit_volume_pct, score.clean_volume_pct);
    println!("breakdown:");
    for component in &score.breakdown {
        println!("  {:>4}  {}: {}", component.value, component.dimension, component.explanation);
    }
    println!("tags:");
    for tag in &score.tags {
        println!("  [{:?}] {}: {}", tag.severity, tag.code, tag.description);
    }

    if std::env::args().any(|arg| arg == "--json") {
        let json = serde_json::to_string_pretty(&score).expect("score serializes");
        println!("{json}");
    }
}

fn demo_providers() -> (MemoryTransactionSource, MemoryClassifier) {
    let now = Utc::now();
    let record = |hash: &str, from: &str, to: &str, amount: f64, hours_ago: i64| TxRecord {
        tx_hash: hash.to_string(),
        timestamp: now - Duration::hours(hours_ago),
        amount,
        from: from.to_string(),
        to: to.to_string(),
        kind: TxKind::Sent,
        tags: Vec::new(),
    };

    let mut source = MemoryTransactionSource::new();
    source.insert(
        "0xdemo",
        vec![
            record("0xaaa1", "0xdemo", "0xtornado", 50.0, 10),
            record("0xaaa2", "0xpayroll", "0xdemo", 120.0, 72),
        ],
    );
    source.insert("0xtornado", vec![record("0xbbb1", "0xtornado", "0xwormhole", 50.0, 8)]);
    source.insert("0xwormhole", vec![record("0xccc1", "0xwormhole", "0xshadycex", 50.0, 5)]);

    let mut classifier = MemoryClassifier::new();
    classifier.insert(
        "0xtornado",
        Classification {
            entity_type: EntityType::Mixer,
            category: EntityCategory::Mixer,
            tags: vec!["MIXER".to_string()],
        },
    );
    classifier.insert(
        "0xwormhole",
        Classification {
            entity_type: EntityType::Bridge,
            category: EntityCategory::Bridge,
            tags: Vec::new(),
        },
    );
    classifier.insert(
        "0xshadycex",
        Classification {
            entity_type: EntityType::Cex,
            category: EntityCategory::CexHighRisk,
            tags: Vec::new(),
        },
    );

    (source, classifier)
}
