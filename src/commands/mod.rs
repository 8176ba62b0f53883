//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod graph;
pub mod models;
pub mod process;
pub mod utils;

// Re-export main command functions
pub use graph::{build_graph_document, execute_analyze, execute_graph};
pub use models::{AnalyzeArgs, GraphArgs, ProcessArgs};
pub use process::{execute_process, load_and_build_trace};
pub use utils::{display_version, inspect_graph_file};
