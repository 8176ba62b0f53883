//! Output writers for trace and graph documents.
//!
//! This module handles:
//! - Mapping a resolved graph to its interchange document
//! - Reading and writing JSON documents on disk

pub mod graph_export;
pub mod json;

// Re-export main functions
pub use graph_export::{export_graph, EdgeDescriptor, GraphDocument, NodeDescriptor};
pub use json::{read_graph, read_json, read_trace, write_graph, write_json, write_trace};
