//! quakeq CLI: run a paged search query and export the results.

use anyhow::Result;
use clap::Parser;
use quakeq::engine::arg_parser::Cli;
use quakeq::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
