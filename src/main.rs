//! Vector Sentinel - Network threat detection demo
//!
//! Generates synthetic network logs, pushes them through the pipeline against
//! the configured vector store and logs every flagged entry.

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use vector_sentinel::constants;
use vector_sentinel::logic::features::MinMaxVectorizer;
use vector_sentinel::logic::report;
use vector_sentinel::logic::store::{HttpStoreConfig, HttpVectorStore};
use vector_sentinel::{Pipeline, PipelineConfig, Record, RunControl, RunReport, RunStatus};

const FEATURE_NAMES: [&str; 8] = [
    "request_size",
    "response_time",
    "error_code",
    "ip_octet",
    "url_endpoint",
    "http_method",
    "user_agent",
    "failed_logins",
];

/// Synthetic access logs; every `count / threats`-th entry is a brute-force bot
fn generate_network_logs(count: usize, threats: usize, seed: u64) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(seed);
    let stride = if threats == 0 { usize::MAX } else { (count / threats).max(1) };

    (0..count)
        .map(|i| {
            let is_threat = i % stride == stride - 1;
            let fields = if is_threat {
                vec![
                    rng.gen_range(40_000.0..60_000.0),
                    rng.gen_range(15.0..30.0),
                    1.0,
                    f64::from(rng.gen_range(0..=255u8)),
                    0.0, // /login
                    1.0, // POST
                    2.0, // bot
                    f64::from(rng.gen_range(20..=40u8)),
                ]
            } else {
                vec![
                    rng.gen_range(100.0..10_000.0),
                    rng.gen_range(0.0..5.0),
                    f64::from(rng.gen_range(0..=1u8)),
                    f64::from(rng.gen_range(0..=255u8)),
                    f64::from(rng.gen_range(0..4u8)),
                    f64::from(rng.gen_range(0..4u8)),
                    f64::from(rng.gen_range(0..3u8)),
                    f64::from(rng.gen_range(0..=5u8)),
                ]
            };
            Record::numeric(i.to_string(), fields)
        })
        .collect()
}

fn log_report(report: &RunReport) {
    log::info!(
        "Run {:?}: {} records, {}/{} batches written, {} retrieved, {} missing, {} failed reads",
        report.status,
        report.records,
        report.upsert.written_batches,
        report.upsert.total_batches,
        report.retrieved_keys.len(),
        report.missing_keys.len(),
        report.failed_reads.len()
    );

    for entry in &report.entries {
        let neighbours: Vec<String> = entry
            .neighbors
            .iter()
            .map(|n| format!("{} ({:.3})", n.candidate_key, n.similarity_score))
            .collect();
        log::warn!(
            "Threat {} (score {:.3}): {}",
            entry.key,
            entry.detection.score,
            entry.explanation()
        );
        if entry.no_similar_found {
            log::info!("  no similar log found");
        } else {
            log::info!("  similar logs: {}", neighbours.join(", "));
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);

    let mut config = PipelineConfig::from_env().context("invalid environment")?;
    if config.report.feature_names.is_empty() {
        config.report.feature_names = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    }
    config.validate().context("invalid configuration")?;

    let store = HttpVectorStore::new(HttpStoreConfig::from(&config.store)).context("vector store client")?;

    let count = constants::env_parse("VECTOR_DEMO_RECORDS", 200usize).map_err(anyhow::Error::msg)?;
    let threats = constants::env_parse("VECTOR_DEMO_THREATS", 10usize).map_err(anyhow::Error::msg)?;
    let records = generate_network_logs(count, threats, config.detector.seed);

    let control = RunControl::new();
    let ctrl_c = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping further dispatch");
            ctrl_c.cancel();
        }
    });

    let pipeline = Pipeline::new(Arc::new(store), config);
    let run = pipeline
        .run(&records, &MinMaxVectorizer, control)
        .await
        .context("pipeline run failed")?;

    log_report(&run);

    if let Ok(path) = std::env::var("VECTOR_REPORT_PATH") {
        report::to_jsonl(&run.entries, &path).context("report export failed")?;
    }

    if run.status == RunStatus::InsufficientData {
        log::warn!("{}", run.message.as_deref().unwrap_or("not enough vectors to fit a model"));
    }

    Ok(())
}
