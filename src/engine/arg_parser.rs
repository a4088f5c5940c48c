use clap::Parser;
use std::path::PathBuf;

use crate::ExportFormat;
use crate::utils::config::PackagePaths;

/// Concurrent paginated search client: fetch, aggregate and export results.
#[derive(Clone, Parser)]
#[command(name = "quakeq")]
#[command(about = "Run a search query across many pages in parallel and export the results.")]
pub struct Cli {
    /// Search query, e.g. `domain: example.com`.
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Total number of results to fetch. Split into pages of at most 100.
    #[arg(long, short = 'n')]
    pub size: Option<usize>,

    /// Maximum pages fetched concurrently (1-10).
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Export format.
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<ExportFormat>,

    /// Export path. Default: `quake_results_<timestamp>.<ext>` in the current directory.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Settings file. Default: `quakeq.toml` in the current directory.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Auth cookie string (`name=value; ...`). Prefer QUAKEQ_COOKIE or .env over this flag.
    #[arg(long)]
    pub cookie: Option<String>,

    /// Delay in milliseconds before dispatching each page after the first.
    #[arg(long)]
    pub pacing_ms: Option<u64>,

    /// Per-request timeout in seconds.
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,

    /// Give up on the whole run after this many seconds and keep partial results.
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Verbose output (debug logs and progress bar).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

impl Cli {
    /// Settings file path, defaulting to the package settings file in the working directory.
    pub fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(PackagePaths::get().settings_filename()))
    }
}
