use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;

use crate::llm_client::{ModelLineup, DEFAULT_API_BASE, DEFAULT_ESCALATION_MODEL, DEFAULT_MODEL};
use crate::storage::export::ExportPaths;

/// Command-line surface. Every flag falls back to an environment variable,
/// and `.env` is loaded before parsing.
#[derive(Parser, Debug)]
#[command(
    name = "cv-extractor",
    version,
    about = "Extract technical skills and proficiency levels from CVs with an LLM"
)]
struct Cli {
    /// Directory containing the CV files (.txt, .md, .pdf)
    #[arg(env = "CV_CORPUS_DIR")]
    corpus_dir: PathBuf,

    /// API key for the chat completions endpoint
    #[arg(env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base_url: String,

    /// Model tried first for every CV
    #[arg(long, env = "CV_EXTRACTOR_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Larger-context model used when a CV does not fit the first model
    #[arg(long, env = "CV_EXTRACTOR_ESCALATION_MODEL", default_value = DEFAULT_ESCALATION_MODEL)]
    escalation_model: String,

    /// Sampling temperature sent with every request
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Minimum seconds to wait before each model call
    #[arg(long, env = "CV_EXTRACTOR_PACING_SECS", default_value_t = 5)]
    pacing_secs: u64,

    /// Max seconds to wait for a single model call
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// File holding the extraction instruction sent as the system message
    #[arg(
        long,
        env = "CV_EXTRACTOR_PROMPT",
        default_value = "./Engineered_Prompt/Prompt.txt"
    )]
    prompt: PathBuf,

    /// Directory receiving the CSV store, the JSON dump and the spreadsheet
    #[arg(long, env = "CV_EXTRACTOR_OUTPUT_DIR", default_value = "./Output")]
    output_dir: PathBuf,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub corpus_dir: PathBuf,
    pub api_key: String,
    pub api_base_url: String,
    pub models: ModelLineup,
    pub temperature: f32,
    pub pacing: Duration,
    pub request_timeout: Duration,
    pub instruction: String,
    pub output_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Result<Self> {
        ensure!(!cli.api_key.trim().is_empty(), "API key must not be empty");
        ensure!(
            (0.0..=2.0).contains(&cli.temperature),
            "temperature must be between 0 and 2, got {}",
            cli.temperature
        );

        Ok(Config {
            instruction: read_instruction(&cli.prompt)?,
            corpus_dir: cli.corpus_dir,
            api_key: cli.api_key,
            api_base_url: cli.api_base_url,
            models: ModelLineup {
                standard: cli.model,
                extended: cli.escalation_model,
            },
            temperature: cli.temperature,
            pacing: Duration::from_secs(cli.pacing_secs),
            request_timeout: Duration::from_secs(cli.timeout_secs),
            output_dir: cli.output_dir,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn export_paths(&self) -> ExportPaths {
        ExportPaths::in_dir(&self.output_dir)
    }
}

/// Loads the instruction prompt. Its content is opaque here; it only has to exist.
fn read_instruction(path: &Path) -> Result<String> {
    let instruction = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read instruction prompt '{}'", path.display()))?;
    ensure!(
        !instruction.trim().is_empty(),
        "Instruction prompt '{}' is empty",
        path.display()
    );
    Ok(instruction)
}
