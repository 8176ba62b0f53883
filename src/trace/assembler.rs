//! Trace assembly.
//!
//! Combines the request track with the filtered tracing events and the
//! projected page events into one [`Trace`].

use super::schema::{PageEvent, PageTrack, RequestTrack, Trace, TraceMetadata, TracingTrack};
use crate::parser::artifacts::parse_artifacts;
use crate::parser::schema::FrameLoadEvent;
use crate::tracker::{track_requests, RequestTracker};
use crate::utils::config::{TraceConfig, TrackerConfig, METADATA_CATEGORY};
use crate::utils::error::IngestError;
use log::{debug, info};

/// Keep tracing events whose category is allow-listed or structural metadata
///
/// **Public** - used by assemble and by tests
pub fn filter_tracing_events(
    events: &[serde_json::Value],
    config: &TraceConfig,
) -> Vec<serde_json::Value> {
    events
        .iter()
        .filter(|event| {
            event
                .get("cat")
                .and_then(|cat| cat.as_str())
                .is_some_and(|cat| {
                    cat == METADATA_CATEGORY || config.categories.iter().any(|c| c == cat)
                })
        })
        .cloned()
        .collect()
}

/// Project frame lifecycle events to `(frame_id, method)` pairs
pub fn project_page_events(events: &[FrameLoadEvent]) -> Vec<PageEvent> {
    events
        .iter()
        .map(|e| PageEvent {
            frame_id: e.frame_id.clone(),
            method: e.method.clone(),
        })
        .collect()
}

impl RequestTrack {
    /// Snapshot a tracker into its exported form
    pub fn from_tracker(tracker: &RequestTracker) -> Self {
        Self {
            events: tracker.export(),
            metadata: tracker.summary(),
        }
    }
}

/// Assemble a trace from its parts
///
/// **Public** - pure; identical inputs give identical traces
pub fn assemble(
    url: &str,
    tracing_events: &[serde_json::Value],
    page_events: &[FrameLoadEvent],
    request_track: RequestTrack,
    config: &TraceConfig,
) -> Trace {
    Trace {
        url: url.to_string(),
        tracing_track: TracingTrack {
            events: filter_tracing_events(tracing_events, config),
        },
        page_track: PageTrack {
            events: project_page_events(page_events),
        },
        request_track,
        metadata: TraceMetadata::default(),
    }
}

/// Run ingestion and assembly over a raw artifacts document
///
/// **Public** - main entry point from raw log to trace
///
/// # Errors
/// * `IngestError::Parse` - the document or one of its events is malformed
/// * `IngestError::Track` - a tracking error in strict mode
pub fn build_trace(
    raw: &serde_json::Value,
    tracker_config: &TrackerConfig,
    trace_config: &TraceConfig,
) -> Result<Trace, IngestError> {
    let artifacts = parse_artifacts(raw)?;
    let tracker = track_requests(&artifacts.raw_network_events, tracker_config)?;

    let trace = assemble(
        &artifacts.url,
        &artifacts.trace_contents,
        &artifacts.frame_load_events,
        RequestTrack::from_tracker(&tracker),
        trace_config,
    );

    debug!(
        "Kept {} of {} tracing events",
        trace.tracing_track.events.len(),
        artifacts.trace_contents.len()
    );
    info!(
        "Assembled trace for {}: {} requests, {} page events",
        trace.url,
        trace.request_track.events.len(),
        trace.page_track.events.len()
    );

    Ok(trace)
}
