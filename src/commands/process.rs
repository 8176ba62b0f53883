//! Process command implementation.
//!
//! The process command:
//! 1. Reads the artifacts document
//! 2. Tracks requests from the raw network events
//! 3. Assembles the trace
//! 4. Writes the trace document

use super::models::ProcessArgs;
use crate::output::{read_json, write_trace};
use crate::trace::{build_trace, Trace};
use crate::utils::config::{TraceConfig, TrackerConfig};
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::time::Instant;

/// Execute the process command
///
/// **Public** - main entry point called from main.rs
pub fn execute_process(args: ProcessArgs) -> Result<()> {
    let start_time = Instant::now();

    let trace = load_and_build_trace(&args.input, args.lenient, args.categories)?;

    info!("Writing trace document...");
    write_trace(&trace, &args.output).context("Failed to write trace document")?;
    info!("✓ Trace written to: {}", args.output.display());

    info!(
        "Process completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Read an artifacts file and turn it into a trace
///
/// **Public** - shared with the analyze command
pub fn load_and_build_trace(
    input: &Path,
    lenient: bool,
    categories: Vec<String>,
) -> Result<Trace> {
    info!("Reading artifacts: {}", input.display());
    let raw: serde_json::Value = read_json(input)
        .with_context(|| format!("Failed to read artifacts {}", input.display()))?;

    let tracker_config = TrackerConfig { strict: !lenient };
    let trace_config = TraceConfig::with_categories(categories);

    let trace = build_trace(&raw, &tracker_config, &trace_config)
        .context("Failed to build trace from artifacts")?;

    let summary = &trace.request_track.metadata;
    if summary.rejected_count > 0 {
        warn!("{} events rejected in lenient mode", summary.rejected_count);
    }
    if summary.pending_count > 0 {
        info!(
            "{} requests still pending at end of log",
            summary.pending_count
        );
    }

    Ok(trace)
}
