mod config;
mod corpus;
mod errors;
mod extraction;
mod llm_client;
mod pipeline;
mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::corpus::load_corpus;
use crate::extraction::orchestrator::Extractor;
use crate::llm_client::OpenAiClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (exits on missing required arguments)
    let config = Config::load()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV extractor v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Cannot create output directory '{}'",
            config.output_dir.display()
        )
    })?;

    let corpus = load_corpus(&config.corpus_dir)?;
    info!(
        "Loaded {} CVs from {}",
        corpus.len(),
        config.corpus_dir.display()
    );

    let client = OpenAiClient::new(
        &config.api_key,
        &config.api_base_url,
        config.models.clone(),
        config.request_timeout,
    )?;
    info!(
        "LLM client initialized (model: {}, escalation: {})",
        client.models().standard,
        client.models().extended
    );

    let extractor = Extractor::new(
        Arc::new(client),
        config.instruction.clone(),
        config.temperature,
        config.pacing,
    );

    let paths = config.export_paths();
    let report = pipeline::run(&extractor, &corpus, &paths).await?;

    info!(
        "Done: {} of {} CVs extracted, {} skipped",
        report.completed, report.total, report.skipped
    );
    info!("CSV store: {}", paths.store.display());
    info!("JSON dump: {}", paths.dump.display());
    info!(
        "Spreadsheet: {} ({} rows)",
        paths.spreadsheet.display(),
        report.rows.len()
    );

    Ok(())
}
