//! CLI surface: argument parsing, run handler, progress bar and export writers

pub mod arg_parser;
pub mod cli;
pub mod export;
pub mod progress;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::{clamp_limits, handle_run};
pub use export::{export, export_csv, export_json, export_urls, generate_filename};
