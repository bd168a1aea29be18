//! Library surface of the `postlab` binary: argument parsing, command
//! handlers and the source collector.

pub mod cli;
pub mod collector;
pub mod commands;

pub use cli::{Cli, Commands};
pub use collector::SourceCollector;
pub use commands::{
    clean, collect, combine, init_tracing, label, load_settings, preprocess, show_config,
};
