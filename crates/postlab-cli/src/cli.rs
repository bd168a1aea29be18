//! CLI argument parsing for the `postlab` binary.
//!
//! Flags given here override every other configuration source.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Social-media post pipeline
///
/// Collects posts, normalizes their text into canonical token strings and
/// labels keyword groups with topics using a language model.
#[derive(Parser, Debug)]
#[command(name = "postlab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/postlab/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a corpus of posts into combined documents
    Preprocess {
        /// Corpus of post records (JSON array)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the combined documents (JSON array of strings)
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the records annotated with their processed fields
        #[arg(long)]
        annotated: Option<PathBuf>,

        /// Drop documents that normalize to nothing
        #[arg(long)]
        drop_empty: bool,
    },

    /// Merge several collector outputs into one corpus
    Combine {
        /// Merged corpus path
        #[arg(short, long)]
        output: PathBuf,

        /// Input files; invalid or non-array files are skipped
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Remove empty documents from a list of combined documents
    Clean {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Label topic items with the language model
    Label {
        /// Topic items (JSON array of {"palavras-chave", "texto"})
        #[arg(short, long)]
        input: PathBuf,

        /// Result path (JSON object index -> label)
        #[arg(short, long)]
        output: PathBuf,

        /// Override attempts per item
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Override items labeled at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Download a profile's posts from the source API
    Collect {
        /// Profile to collect
        #[arg(short, long)]
        query: String,

        /// Where to write the raw response
        #[arg(short, long)]
        output: PathBuf,

        /// Override the API endpoint
        #[arg(long)]
        url: Option<String>,
    },

    /// Print the effective configuration
    Config,
}
