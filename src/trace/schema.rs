//! Intermediate trace document.
//!
//! This is the normalized record of one page load that every downstream
//! stage reads. It is written to disk between the `process` and `graph`
//! commands, so the layout is part of the tool's file format.

use crate::tracker::{RequestRecord, TrackSummary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// URL under test
    pub url: String,

    pub tracing_track: TracingTrack,

    pub page_track: PageTrack,

    pub request_track: RequestTrack,

    /// Session metadata, not captured yet
    #[serde(default)]
    pub metadata: TraceMetadata,
}

/// Generic tracing events kept after category filtering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TracingTrack {
    pub events: Vec<serde_json::Value>,
}

/// Frame lifecycle events, arrival order preserved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTrack {
    pub events: Vec<PageEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEvent {
    pub frame_id: String,
    pub method: String,
}

/// Request tracker export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestTrack {
    /// Records in id order
    pub events: Vec<RequestRecord>,

    #[serde(default)]
    pub metadata: TrackSummary,
}

/// Placeholder for session metadata (browser version, device, network profile)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMetadata {}

impl Trace {
    pub fn requests(&self) -> &[RequestRecord] {
        &self.request_track.events
    }

    /// First frame seen in the page track
    pub fn main_frame_id(&self) -> Option<&str> {
        self.page_track.events.first().map(|e| e.frame_id.as_str())
    }
}
