//! postlab
//!
//! Pipeline for social-media posts: collect, normalize, combine and label.
//!
//! # Usage
//!
//! ```bash
//! postlab collect --query PROFILE --output raw/profile.json
//! postlab combine --output raw/combined.json raw/a.json raw/b.json
//! postlab preprocess --input raw/combined.json --output processed/docs.json --drop-empty
//! postlab label --input topics/items.json --output topics/labels.json
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/postlab/config.toml)
//! 3. `--config` file
//! 4. Environment variables (POSTLAB_*, plus LLAMA_BASE_URL, LLM_MODEL, API_KEY, ...)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use postlab_cli::{
    clean, collect, combine, init_tracing, label, load_settings, preprocess, show_config, Cli,
    Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    init_tracing(&settings.log_level)?;

    match cli.command {
        Commands::Preprocess {
            input,
            output,
            annotated,
            drop_empty,
        } => {
            preprocess(&settings, &input, &output, annotated.as_deref(), drop_empty)?;
        }
        Commands::Combine { output, inputs } => {
            combine(&inputs, &output)?;
        }
        Commands::Clean { input, output } => {
            clean(&input, &output)?;
        }
        Commands::Label {
            input,
            output,
            max_attempts,
            concurrency,
        } => {
            label(&settings, &input, &output, max_attempts, concurrency).await?;
        }
        Commands::Collect { query, output, url } => {
            collect(&settings, &query, &output, url.as_deref()).await?;
        }
        Commands::Config => {
            show_config(&settings)?;
        }
    }

    Ok(())
}
