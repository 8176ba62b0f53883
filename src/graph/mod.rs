//! Dependency graph inference.
//!
//! This module transforms an assembled trace into:
//! - A directed graph of request-to-request dependencies
//! - Node attributes contributed by lenses (frame, content, activity)

pub mod lens;
pub mod model;
pub mod resolver;

// Re-export main types and functions
pub use lens::{
    default_lenses, ActivityLens, ContentClassificationLens, FrameOwnershipLens, NodeLens,
};
pub use model::{DependencyGraph, Edge, EdgeReason, GraphNode};
pub use resolver::resolve;
