use crate::output::read_graph;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use std::path::PathBuf;

/// Validate and summarize a dependency graph file
pub fn inspect_graph_file(file_path: PathBuf) -> Result<()> {
    println!("Inspecting graph: {}", file_path.display());

    let document = read_graph(&file_path)?;
    let problems = document.validate();

    if problems.is_empty() {
        println!("✓ Valid dependency graph JSON");
    } else {
        println!("✗ {} structural problems", problems.len());
        for problem in &problems {
            println!("  - {}", problem);
        }
    }
    println!("  Nodes: {}", document.nodes.len());
    println!("  Edges: {}", document.edges.len());
    for (reason, count) in document.edges_by_reason() {
        println!("    {}: {}", reason, count);
    }

    if !problems.is_empty() {
        anyhow::bail!("Graph file {} is inconsistent", file_path.display());
    }
    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Netdep Graph v{}", env!("CARGO_PKG_VERSION"));
    println!("Document Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Request tracking and network dependency graphs for captured page loads.");
}
