//! Input schema definitions.
//!
//! This module defines the structure of the artifacts document we read and
//! the payloads of the DevTools `Network.*` events it carries. Field names
//! follow the protocol (camelCase); everything not needed downstream is
//! left out and silently skipped by serde.

use crate::tracker::record::{InitiatorKind, RequestId};
use serde::{Deserialize, Serialize};

/// Top-level artifacts document captured during a page load
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifacts {
    /// URL under test
    pub url: String,

    /// Generic tracing events, unfiltered
    pub trace_contents: Vec<serde_json::Value>,

    /// Frame lifecycle events, in arrival order
    pub frame_load_events: Vec<FrameLoadEvent>,

    /// DevTools network events, in arrival order
    pub raw_network_events: Vec<RawEvent>,
}

/// One frame lifecycle event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameLoadEvent {
    pub frame_id: String,
    pub method: String,
}

/// One entry of the raw network log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event kind, e.g. `Network.requestWillBeSent`
    pub method: String,

    /// Only meaningful for generic tracing events
    #[serde(default, alias = "cat", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Event-specific fields
    #[serde(default, alias = "payload")]
    pub params: serde_json::Value,
}

/// `Network.requestWillBeSent`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSent {
    pub request_id: RequestId,
    #[serde(default)]
    pub frame_id: Option<String>,
    #[serde(default)]
    pub loader_id: Option<String>,
    #[serde(default, rename = "documentURL")]
    pub document_url: Option<String>,
    pub request: RequestPayload,
    pub timestamp: f64,
    #[serde(default)]
    pub initiator: Option<RawInitiator>,
    /// Present when this start continues a redirect of the same id
    #[serde(default)]
    pub redirect_response: Option<ResponsePayload>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub initial_priority: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub from_disk_cache: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInitiator {
    #[serde(default, rename = "type")]
    pub kind: InitiatorKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub stack: Option<RawStackTrace>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStackTrace {
    #[serde(default)]
    pub call_frames: Vec<RawCallFrame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCallFrame {
    #[serde(default)]
    pub url: String,
}

/// `Network.requestServedFromCache`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestServedFromCache {
    pub request_id: RequestId,
}

/// `Network.responseReceived`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceived {
    pub request_id: RequestId,
    pub timestamp: f64,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    pub response: ResponsePayload,
}

/// `Network.dataReceived`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataReceived {
    pub request_id: RequestId,
    pub timestamp: f64,
    #[serde(default)]
    pub data_length: u64,
    #[serde(default)]
    pub encoded_data_length: u64,
}

/// `Network.resourceChangedPriority`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChangedPriority {
    pub request_id: RequestId,
    pub new_priority: String,
}

/// `Network.loadingFinished`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFinished {
    pub request_id: RequestId,
    pub timestamp: f64,
    #[serde(default)]
    pub encoded_data_length: Option<f64>,
}

/// `Network.loadingFailed`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailed {
    pub request_id: RequestId,
    pub timestamp: f64,
    #[serde(default)]
    pub error_text: Option<String>,
    #[serde(default)]
    pub canceled: bool,
}
