//! Trace assembly and the intermediate trace document.

pub mod assembler;
pub mod schema;

// Re-export main types and functions
pub use assembler::{assemble, build_trace, filter_tracing_events, project_page_events};
pub use schema::{PageEvent, PageTrack, RequestTrack, Trace, TraceMetadata, TracingTrack};
