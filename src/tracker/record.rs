//! Per-request state accumulated by the tracker.
//!
//! A record is created by the start event of its request, mutated by the
//! progress events that follow and frozen once its outcome leaves `pending`.

use crate::parser::schema::{RawInitiator, RequestWillBeSent, ResponsePayload};
use crate::utils::config::REDIRECT_ID_INFIX;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Opaque request identity assigned by the browser
///
/// Ordering is segment-wise over `.`-separated parts, numeric where both
/// parts are numbers, so `"2"` sorts before `"10"` and `"7.redirect.0"`
/// sorts right after `"7"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawRequestId")]
pub struct RequestId(String);

/// Request ids show up as strings in real logs and as numbers in hand-written ones
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRequestId {
    Text(String),
    Number(u64),
}

impl From<RawRequestId> for RequestId {
    fn from(raw: RawRequestId) -> Self {
        match raw {
            RawRequestId::Text(s) => Self(s),
            RawRequestId::Number(n) => Self(n.to_string()),
        }
    }
}

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id given to the `n`th closed redirect hop of this request
    pub fn redirect_hop(&self, n: usize) -> Self {
        Self(format!("{}.{}.{}", self.0, REDIRECT_ID_INFIX, n))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Ord for RequestId {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut lhs = self.0.split('.');
        let mut rhs = other.0.split('.');
        loop {
            let (a, b) = match (lhs.next(), rhs.next()) {
                (None, None) => return self.0.cmp(&other.0),
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => (a, b),
            };
            let ord = match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(m), Ok(n)) => m.cmp(&n),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
    }
}

impl PartialOrd for RequestId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Final state of a request. Only ever moves away from `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named timestamps of a request, in seconds on the browser's monotonic clock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,

    /// Response headers received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_byte: Option<f64>,

    /// Finished or failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

/// Set a timing mark unless it is already set. Returns whether it was written.
pub(crate) fn set_once(slot: &mut Option<f64>, value: f64) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

/// What kind of thing triggered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitiatorKind {
    Parser,
    Script,
    Preload,
    #[default]
    #[serde(other)]
    Other,
}

/// Descriptor of what triggered a request. Fixed at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Initiator {
    #[serde(default)]
    pub kind: InitiatorKind,

    /// Explicit parent request, when the log names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,

    /// Document or script that issued the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&RawInitiator> for Initiator {
    fn from(raw: &RawInitiator) -> Self {
        // Script initiators usually carry their origin in the stack only
        let stack_url = raw.stack.as_ref().and_then(|stack| {
            stack
                .call_frames
                .iter()
                .map(|frame| frame.url.as_str())
                .find(|url| !url.is_empty())
        });

        Self {
            kind: raw.kind,
            request_id: raw.request_id.clone(),
            url: raw
                .url
                .as_deref()
                .filter(|url| !url.is_empty())
                .or(stack_url)
                .map(str::to_string),
        }
    }
}

/// Accumulated state for one request id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RequestId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default)]
    pub served_from_cache: bool,

    #[serde(default)]
    pub from_disk_cache: bool,

    /// Decoded bytes seen in data chunks
    #[serde(default)]
    pub data_length: u64,

    /// Bytes on the wire
    #[serde(default)]
    pub encoded_data_length: u64,

    #[serde(default)]
    pub timing: Timing,

    #[serde(default)]
    pub initiator: Initiator,

    #[serde(default)]
    pub outcome: Outcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,

    #[serde(default)]
    pub canceled: bool,

    /// Closed redirect hop this request continues from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirected_from: Option<RequestId>,

    /// Set on a closed redirect hop: the request that continues it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirected_to: Option<RequestId>,

    /// Set on a closed redirect hop: the url the redirect pointed at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl RequestRecord {
    /// Build a fresh record from its start event
    pub fn from_start(event: &RequestWillBeSent) -> Self {
        Self {
            id: event.request_id.clone(),
            url: Some(event.request.url.clone()),
            method: event.request.method.clone(),
            frame_id: event.frame_id.clone(),
            loader_id: event.loader_id.clone(),
            document_url: event.document_url.clone(),
            resource_type: event.resource_type.clone(),
            priority: event.request.initial_priority.clone(),
            timing: Timing {
                start: Some(event.timestamp),
                ..Timing::default()
            },
            initiator: event
                .initiator
                .as_ref()
                .map(Initiator::from)
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Copy response fields and mark the headers time
    pub(crate) fn apply_response(&mut self, response: &ResponsePayload, timestamp: f64) {
        self.status = response.status.or(self.status);
        if response.status_text.is_some() {
            self.status_text = response.status_text.clone();
        }
        if response.mime_type.is_some() {
            self.mime_type = response.mime_type.clone();
        }
        if response.protocol.is_some() {
            self.protocol = response.protocol.clone();
        }
        self.from_disk_cache |= response.from_disk_cache;
        if !set_once(&mut self.timing.headers, timestamp) {
            debug!("Request {}: headers time already set, keeping first", self.id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome == Outcome::Pending
    }

    pub fn is_finalized(&self) -> bool {
        !self.is_pending()
    }

    /// Moment the response started to be usable: headers, else the end mark
    pub fn ready_time(&self) -> Option<f64> {
        self.timing.headers.or(self.timing.end)
    }

    /// Start to end, in milliseconds
    pub fn duration_ms(&self) -> Option<f64> {
        match (self.timing.start, self.timing.end) {
            (Some(start), Some(end)) => Some((end - start) * 1000.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_natural_order() {
        let mut ids: Vec<RequestId> = ["10", "2", "1.redirect.0", "1", "abc", "1000.3", "1000.12"]
            .into_iter()
            .map(RequestId::from)
            .collect();
        ids.sort();

        let sorted: Vec<&str> = ids.iter().map(RequestId::as_str).collect();
        assert_eq!(
            sorted,
            vec!["1", "1.redirect.0", "2", "10", "1000.3", "1000.12", "abc"]
        );
    }

    #[test]
    fn test_request_id_accepts_numbers() {
        let id: RequestId = serde_json::from_value(serde_json::json!(42)).unwrap();
        assert_eq!(id.as_str(), "42");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("42"));
    }

    #[test]
    fn test_redirect_hop_id() {
        assert_eq!(RequestId::from("7").redirect_hop(1).as_str(), "7.redirect.1");
    }

    #[test]
    fn test_set_once() {
        let mut slot = None;
        assert!(set_once(&mut slot, 1.0));
        assert!(!set_once(&mut slot, 2.0));
        assert_eq!(slot, Some(1.0));
    }

    #[test]
    fn test_initiator_url_from_stack() {
        let raw: RawInitiator = serde_json::from_value(serde_json::json!({
            "type": "script",
            "stack": {"callFrames": [{"url": ""}, {"url": "https://a.test/app.js"}]}
        }))
        .unwrap();

        let initiator = Initiator::from(&raw);
        assert_eq!(initiator.kind, InitiatorKind::Script);
        assert_eq!(initiator.url.as_deref(), Some("https://a.test/app.js"));
        assert!(initiator.request_id.is_none());
    }

    #[test]
    fn test_unknown_initiator_kind_is_other() {
        let raw: RawInitiator =
            serde_json::from_value(serde_json::json!({"type": "SignedExchange"})).unwrap();
        assert_eq!(raw.kind, InitiatorKind::Other);
    }

    #[test]
    fn test_duration_ms() {
        let record = RequestRecord {
            timing: Timing {
                start: Some(1.0),
                end: Some(1.25),
                ..Timing::default()
            },
            ..RequestRecord::default()
        };
        assert_eq!(record.duration_ms(), Some(250.0));
    }
}
