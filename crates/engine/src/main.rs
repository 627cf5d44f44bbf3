// crates/engine/src/main.rs
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use common::{Error, Result};
use engine::BatchRunner;
use scoring::ScoringConfig;
use sinks::{JsonFileStore, LeadDataSource, LogNotifier};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!("Lead requalification job starting...");

    let config = load_config()?;
    // Weights/thresholds live in their own file; loading validates them
    let scoring = match &config.scoring_config {
        Some(path) => ScoringConfig::from_toml_path(path)?,
        None => ScoringConfig::default(),
    };

    let store = Arc::new(JsonFileStore::new(
        &config.data.leads_path,
        config.data.communications_path.clone().map(PathBuf::from),
        &config.data.output_path,
    ));

    let leads = store.fetch_leads().await?;
    let communications = store.fetch_communications().await?;
    tracing::info!(
        "Loaded {} leads and {} communications",
        leads.len(),
        communications.len()
    );

    let runner = BatchRunner::new(&scoring, store.clone(), Some(Arc::new(LogNotifier)));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = runner.run(&leads, &communications, Utc::now(), shutdown_rx);
    tokio::pin!(run);

    let summary = tokio::select! {
        summary = &mut run => summary,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, finishing in-flight lead...");
            let _ = shutdown_tx.send(true);
            run.await
        }
    };

    // Scores already applied are flushed even on a cancelled run
    store.flush(&leads).await?;

    tracing::info!(
        "Requalification complete: {} hot, {} warm, {} cold, {} unqualified, {} notified, {} errors",
        summary.hot,
        summary.warm,
        summary.cold,
        summary.unqualified,
        summary.notified,
        summary.errors
    );

    Ok(())
}

#[derive(serde::Deserialize)]
struct Config {
    #[serde(default)]
    scoring_config: Option<String>,
    data: DataSection,
}

#[derive(serde::Deserialize)]
struct DataSection {
    leads_path: String,
    communications_path: Option<String>,
    output_path: String,
}

fn load_config() -> Result<Config> {
    let path = std::env::var("REQUALIFY_CONFIG")
        .unwrap_or_else(|_| "config/engine.toml".to_string());

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path, e)))?;

    toml::from_str(&raw).map_err(|e| Error::Config(format!("Failed to parse {}: {}", path, e)))
}
