//! CLI command handler: load settings, run the paged query, export what came back.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::arg_parser::Cli;
use crate::engine::export::{export, generate_filename};
use crate::engine::progress::setup_progress;
use crate::pipeline::CancellationToken;
use crate::query::{Query, pages_for};
use crate::transport::{HttpTransport, parse_cookie_string};
use crate::utils::config::EngineDefaults;
use crate::utils::settings::{apply_file_to_opts, load_settings_toml};
use crate::utils::{Colors, get_cookie, setup_logging};
use crate::{AggregateResult, CancelReason, Opts, RunOutcome, RunParams};

fn setup_opts(cli: &Cli) -> Opts {
    let verbose = cli.verbose.unwrap_or(false);
    setup_logging(verbose);

    let mut opts = Opts::default();
    let settings_path = cli.settings_path();
    if let Some(file) = load_settings_toml(&settings_path) {
        debug!("Loaded settings from {}", settings_path.display());
        apply_file_to_opts(&file, &mut opts);
    }

    opts.query = cli.query.clone();
    opts.verbose = verbose;
    if let Some(size) = cli.size {
        opts.size = size;
    }
    if let Some(workers) = cli.workers {
        opts.max_workers = workers;
    }
    if let Some(format) = cli.format {
        opts.format = format;
    }
    if cli.output.is_some() {
        opts.output = cli.output.clone();
    }
    if let Some(ms) = cli.pacing_ms {
        opts.engine.pacing = Duration::from_millis(ms);
    }
    if let Some(secs) = cli.timeout {
        opts.engine.request_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.deadline {
        opts.engine.deadline = (secs > 0).then(|| Duration::from_secs(secs));
    }
    clamp_limits(opts)
}

/// Cap size at `max_size` and keep workers within `1..=MAX_WORKERS`.
pub fn clamp_limits(mut opts: Opts) -> Opts {
    if opts.size > opts.max_size {
        warn!(
            "Requested size {} exceeds maximum {}; capping",
            opts.size, opts.max_size
        );
        opts.size = opts.max_size;
    }
    let workers = opts.max_workers.clamp(1, EngineDefaults::MAX_WORKERS);
    if workers != opts.max_workers {
        warn!(
            "Worker count {} out of range; using {}",
            opts.max_workers, workers
        );
        opts.max_workers = workers;
    }
    opts
}

/// Run the query described by `cli`, export the results, and print a summary.
/// A cancelled run still exports its partial results, then returns an error.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    let config = format!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts.engine
    );
    debug!("{}", config);

    let query = Query::new(opts.query.as_str())?;
    debug!("Formatted query: {}", query.cleaned());

    let raw_cookie = get_cookie(cli.cookie.as_deref(), opts.cookie.as_deref(), Path::new("."))?;
    let cookies = parse_cookie_string(&raw_cookie).context("cookie format")?;

    let cancel = CancellationToken::new();
    let cancel_handler = cancel.clone();
    ctrlc::set_handler(move || cancel_handler.cancel()).context("set Ctrl+C handler")?;

    let transport = HttpTransport::new(opts.engine.request_timeout)?;
    let show_bar = opts.verbose || std::io::stderr().is_terminal();
    let (bar_handle, sink) = setup_progress(show_bar, pages_for(opts.size));
    let outcome = crate::run_query_with_transport(
        Arc::new(transport),
        &opts.engine,
        cookies,
        RunParams {
            query: &query,
            total_size: opts.size,
            max_workers: opts.max_workers,
            cancel: &cancel,
            progress: sink.as_ref(),
        },
    );
    drop(sink);
    if let Some(h) = bar_handle {
        let _ = h.join();
    }
    let outcome = outcome?;

    let path = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(generate_filename(opts.format)));
    if export(outcome.aggregate(), opts.format, &opts.export_fields, &path)? {
        info!("Results exported to {}", path.display());
    }
    print_summary(&outcome);

    match outcome {
        RunOutcome::Completed(_) => Ok(()),
        RunOutcome::Cancelled { reason, .. } => Err(match reason {
            CancelReason::Requested => anyhow!("Query cancelled by user; partial results were exported"),
            CancelReason::DeadlineExceeded => {
                anyhow!("Query deadline exceeded; partial results were exported")
            }
        }),
    }
}

fn print_summary(outcome: &RunOutcome) {
    let agg: &AggregateResult = outcome.aggregate();
    let (color, status) = match outcome {
        RunOutcome::Completed(_) if agg.failures.is_empty() => (Colors::OK, "Completed"),
        RunOutcome::Completed(_) => (Colors::CANCELLED, "Partial"),
        RunOutcome::Cancelled { .. } => (Colors::CANCELLED, "Cancelled"),
    };
    info!(
        "{} | {} | {}",
        Colors::colorize(color, status),
        Colors::colorize(Colors::OK, &format!("Results: {}", agg.items.len())),
        Colors::colorize(
            Colors::FAILED,
            &format!("Failed pages: {}/{}", agg.failures.len(), agg.pages_total)
        )
    );
}
