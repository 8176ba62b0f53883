//! Input parsing and schema definitions.
//!
//! This module handles:
//! - Validating the artifacts document
//! - Decoding raw network events into typed variants
//! - Defining the input schema

pub mod artifacts;
pub mod events;
pub mod schema;

// Re-export main types
pub use artifacts::parse_artifacts;
pub use events::{decode_event, EventPhase, NetworkEvent};
pub use schema::{Artifacts, FrameLoadEvent, RawEvent};
