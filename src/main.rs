//! Netdep Graph CLI
//!
//! Processes captured page-load logs into traces and network dependency graphs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use netdep_graph::commands::{
    display_version, execute_analyze, execute_graph, execute_process, inspect_graph_file,
    AnalyzeArgs, GraphArgs, ProcessArgs,
};

/// Netdep Graph - network dependency graphs for captured page loads
#[derive(Parser, Debug)]
#[command(name = "netdep")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a trace document from captured artifacts
    Process {
        /// Artifacts JSON with url, traceContents, frameLoadEvents, rawNetworkEvents
        #[arg(short, long, default_value = "artifacts.json")]
        input: PathBuf,

        /// Output path for the trace document
        #[arg(short, long, default_value = "trace.json")]
        output: PathBuf,

        /// Drop events that break request tracking instead of failing
        #[arg(long)]
        lenient: bool,

        /// Tracing category to keep (repeatable, replaces the defaults)
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Resolve the dependency graph of a trace document
    Graph {
        /// Trace document written by `process`
        #[arg(short, long, default_value = "trace.json")]
        input: PathBuf,

        /// Output path for the dependency graph
        #[arg(short, long, default_value = "dependency-graph.json")]
        output: PathBuf,

        /// Directory with ad.rules / tracking.rules
        #[arg(long, env = "NETDEP_RULES_DIR")]
        rules_dir: Option<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Process artifacts and resolve the graph in one step
    Analyze {
        #[arg(short, long, default_value = "artifacts.json")]
        input: PathBuf,

        #[arg(short, long, default_value = "dependency-graph.json")]
        output: PathBuf,

        /// Also write the intermediate trace document
        #[arg(long)]
        trace_output: Option<PathBuf>,

        #[arg(long)]
        lenient: bool,

        #[arg(long = "category")]
        categories: Vec<String>,

        #[arg(long, env = "NETDEP_RULES_DIR")]
        rules_dir: Option<PathBuf>,

        #[arg(long)]
        summary: bool,
    },

    /// Validate and summarize a dependency graph file
    Inspect {
        /// Path to dependency graph JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Process {
            input,
            output,
            lenient,
            categories,
        } => {
            execute_process(ProcessArgs {
                input,
                output,
                lenient,
                categories,
            })?;
        }

        Commands::Graph {
            input,
            output,
            rules_dir,
            summary,
        } => {
            execute_graph(GraphArgs {
                input,
                output,
                rules_dir,
                print_summary: summary,
            })?;
        }

        Commands::Analyze {
            input,
            output,
            trace_output,
            lenient,
            categories,
            rules_dir,
            summary,
        } => {
            execute_analyze(AnalyzeArgs {
                input,
                output,
                trace_output,
                lenient,
                categories,
                rules_dir,
                print_summary: summary,
            })?;
        }

        Commands::Inspect { file } => {
            inspect_graph_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
