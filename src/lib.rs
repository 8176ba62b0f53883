//! Netdep Graph
//!
//! Turns a captured browser page-load log into a normalized trace and a
//! network dependency graph for offline performance analysis.
//!
//! This crate provides the core implementation for the `netdep` CLI tool.
//!
//! ## Pipeline
//!
//! ```text
//! artifacts.json -> RequestTracker -> assemble -> Trace -> resolve -> export_graph
//! ```
//!
//! ```ignore
//! let trace = build_trace(&raw, &TrackerConfig::default(), &TraceConfig::default())?;
//! let lenses = default_lenses(&trace, &LensConfig::default())?;
//! let document = export_graph(&resolve(&trace, &lenses));
//! ```

pub mod commands;
pub mod graph;
pub mod output;
pub mod parser;
pub mod trace;
pub mod tracker;
pub mod utils;
