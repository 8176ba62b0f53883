//! Graph and analyze command implementations.
//!
//! The graph command:
//! 1. Reads a trace document
//! 2. Builds the lenses from the injected configuration
//! 3. Resolves dependencies
//! 4. Exports and writes the graph document

use super::models::{AnalyzeArgs, GraphArgs};
use super::process::load_and_build_trace;
use crate::graph::{default_lenses, resolve};
use crate::output::{export_graph, read_trace, write_graph, write_trace, GraphDocument};
use crate::trace::Trace;
use crate::utils::config::LensConfig;
use anyhow::{Context, Result};
use log::{info, warn};
use std::time::Instant;

/// Execute the graph command
///
/// **Public** - main entry point called from main.rs
pub fn execute_graph(args: GraphArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/3: Reading trace...");
    let trace = read_trace(&args.input)
        .with_context(|| format!("Failed to read trace {}", args.input.display()))?;

    info!("Step 2/3: Resolving dependencies...");
    let document = build_graph_document(
        &trace,
        &LensConfig {
            rules_dir: args.rules_dir,
        },
    )?;

    info!("Step 3/3: Writing graph...");
    write_graph(&document, &args.output).context("Failed to write dependency graph")?;
    info!("✓ Dependency graph written to: {}", args.output.display());

    if args.print_summary {
        print_summary(&trace, &document);
    }

    info!(
        "Graph completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Execute the analyze command: artifacts straight to a graph
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/3: Building trace...");
    let trace = load_and_build_trace(&args.input, args.lenient, args.categories)?;
    if let Some(path) = &args.trace_output {
        write_trace(&trace, path).context("Failed to write trace document")?;
        info!("✓ Trace written to: {}", path.display());
    }

    info!("Step 2/3: Resolving dependencies...");
    let document = build_graph_document(
        &trace,
        &LensConfig {
            rules_dir: args.rules_dir,
        },
    )?;

    info!("Step 3/3: Writing graph...");
    write_graph(&document, &args.output).context("Failed to write dependency graph")?;
    info!("✓ Dependency graph written to: {}", args.output.display());

    if args.print_summary {
        print_summary(&trace, &document);
    }

    info!(
        "Analyze completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Resolve and export the dependency graph of a trace
///
/// **Public** - library entry point used by both commands
pub fn build_graph_document(trace: &Trace, lens_config: &LensConfig) -> Result<GraphDocument> {
    let lenses = default_lenses(trace, lens_config).context("Failed to build lenses")?;
    let graph = resolve(trace, &lenses);

    if let Some(id) = graph.find_cycle() {
        warn!("Dependency graph has a cycle through request {}", id);
    }

    Ok(export_graph(&graph))
}

fn print_summary(trace: &Trace, document: &GraphDocument) {
    println!("\n{}", "=".repeat(80));
    println!("DEPENDENCY GRAPH SUMMARY");
    println!("{}", "=".repeat(80));
    println!("URL:       {}", trace.url);
    println!("Requests:  {}", document.nodes.len());
    println!("Edges:     {}", document.edges.len());
    for (reason, count) in document.edges_by_reason() {
        println!("  {:<20} {}", reason, count);
    }
    let pending = trace.request_track.metadata.pending_count;
    if pending > 0 {
        println!("Pending:   {}", pending);
    }
    println!("{}", "=".repeat(80));
}
