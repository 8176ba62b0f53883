//! Typed decoding of raw network events.
//!
//! Every method the tracker understands maps to one variant of
//! [`NetworkEvent`]. Anything else becomes `Unrecognized` and is carried
//! through so the tracker can skip it explicitly.

use super::schema::{
    DataReceived, LoadingFailed, LoadingFinished, RawEvent, RequestServedFromCache,
    RequestWillBeSent, ResourceChangedPriority, ResponseReceived,
};
use crate::tracker::record::RequestId;
use crate::utils::error::ParseError;
use serde::Deserialize;

pub const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";
pub const REQUEST_SERVED_FROM_CACHE: &str = "Network.requestServedFromCache";
pub const RESPONSE_RECEIVED: &str = "Network.responseReceived";
pub const DATA_RECEIVED: &str = "Network.dataReceived";
pub const RESOURCE_CHANGED_PRIORITY: &str = "Network.resourceChangedPriority";
pub const LOADING_FINISHED: &str = "Network.loadingFinished";
pub const LOADING_FAILED: &str = "Network.loadingFailed";

/// Where an event sits in a request's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Start,
    Progress,
    Terminal,
    Ignored,
}

/// Closed set of network events the tracker acts on
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    RequestWillBeSent(RequestWillBeSent),
    RequestServedFromCache(RequestServedFromCache),
    ResponseReceived(ResponseReceived),
    DataReceived(DataReceived),
    ResourceChangedPriority(ResourceChangedPriority),
    LoadingFinished(LoadingFinished),
    LoadingFailed(LoadingFailed),
    /// Method this version does not know about
    Unrecognized(String),
}

impl NetworkEvent {
    /// Decode a raw event into its typed form
    ///
    /// # Errors
    /// * `serde_json::Error` - params of a known method do not match its shape
    pub fn decode(raw: &RawEvent) -> Result<Self, serde_json::Error> {
        let params = &raw.params;
        let event = match raw.method.as_str() {
            REQUEST_WILL_BE_SENT => Self::RequestWillBeSent(Deserialize::deserialize(params)?),
            REQUEST_SERVED_FROM_CACHE => {
                Self::RequestServedFromCache(Deserialize::deserialize(params)?)
            }
            RESPONSE_RECEIVED => Self::ResponseReceived(Deserialize::deserialize(params)?),
            DATA_RECEIVED => Self::DataReceived(Deserialize::deserialize(params)?),
            RESOURCE_CHANGED_PRIORITY => {
                Self::ResourceChangedPriority(Deserialize::deserialize(params)?)
            }
            LOADING_FINISHED => Self::LoadingFinished(Deserialize::deserialize(params)?),
            LOADING_FAILED => Self::LoadingFailed(Deserialize::deserialize(params)?),
            other => Self::Unrecognized(other.to_string()),
        };
        Ok(event)
    }

    /// Protocol method name
    pub fn method(&self) -> &str {
        match self {
            Self::RequestWillBeSent(_) => REQUEST_WILL_BE_SENT,
            Self::RequestServedFromCache(_) => REQUEST_SERVED_FROM_CACHE,
            Self::ResponseReceived(_) => RESPONSE_RECEIVED,
            Self::DataReceived(_) => DATA_RECEIVED,
            Self::ResourceChangedPriority(_) => RESOURCE_CHANGED_PRIORITY,
            Self::LoadingFinished(_) => LOADING_FINISHED,
            Self::LoadingFailed(_) => LOADING_FAILED,
            Self::Unrecognized(method) => method,
        }
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::RequestWillBeSent(e) => Some(&e.request_id),
            Self::RequestServedFromCache(e) => Some(&e.request_id),
            Self::ResponseReceived(e) => Some(&e.request_id),
            Self::DataReceived(e) => Some(&e.request_id),
            Self::ResourceChangedPriority(e) => Some(&e.request_id),
            Self::LoadingFinished(e) => Some(&e.request_id),
            Self::LoadingFailed(e) => Some(&e.request_id),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn phase(&self) -> EventPhase {
        match self {
            Self::RequestWillBeSent(_) => EventPhase::Start,
            Self::RequestServedFromCache(_)
            | Self::ResponseReceived(_)
            | Self::DataReceived(_)
            | Self::ResourceChangedPriority(_) => EventPhase::Progress,
            Self::LoadingFinished(_) | Self::LoadingFailed(_) => EventPhase::Terminal,
            Self::Unrecognized(_) => EventPhase::Ignored,
        }
    }
}

/// Decode the event at `index` of the raw log, attaching position context on failure
pub fn decode_event(index: usize, raw: &RawEvent) -> Result<NetworkEvent, ParseError> {
    NetworkEvent::decode(raw).map_err(|e| ParseError::InvalidEvent {
        index,
        method: raw.method.clone(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(method: &str, params: serde_json::Value) -> RawEvent {
        RawEvent {
            method: method.to_string(),
            category: None,
            params,
        }
    }

    #[test]
    fn test_decode_request_will_be_sent() {
        let event = NetworkEvent::decode(&raw(
            REQUEST_WILL_BE_SENT,
            json!({
                "requestId": "1000.1",
                "frameId": "F1",
                "documentURL": "https://a.test/",
                "request": {"url": "https://a.test/", "method": "GET"},
                "timestamp": 10.5,
                "initiator": {"type": "other"},
                "type": "Document"
            }),
        ))
        .unwrap();

        assert_eq!(event.phase(), EventPhase::Start);
        assert_eq!(event.request_id().unwrap().as_str(), "1000.1");
        match event {
            NetworkEvent::RequestWillBeSent(e) => {
                assert_eq!(e.request.url, "https://a.test/");
                assert_eq!(e.frame_id.as_deref(), Some("F1"));
                assert_eq!(e.resource_type.as_deref(), Some("Document"));
                assert!(e.redirect_response.is_none());
            }
            other => panic!("unexpected variant {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_method() {
        let event = NetworkEvent::decode(&raw("Network.webSocketCreated", json!({}))).unwrap();
        assert_eq!(event.phase(), EventPhase::Ignored);
        assert_eq!(event.method(), "Network.webSocketCreated");
        assert!(event.request_id().is_none());
    }

    #[test]
    fn test_decode_terminal_phases() {
        let finished = NetworkEvent::decode(&raw(
            LOADING_FINISHED,
            json!({"requestId": "1", "timestamp": 2.0}),
        ))
        .unwrap();
        let failed = NetworkEvent::decode(&raw(
            LOADING_FAILED,
            json!({"requestId": "1", "timestamp": 2.0, "errorText": "net::ERR_ABORTED"}),
        ))
        .unwrap();

        assert_eq!(finished.phase(), EventPhase::Terminal);
        assert_eq!(failed.phase(), EventPhase::Terminal);
    }

    #[test]
    fn test_payload_alias() {
        let event: RawEvent = serde_json::from_value(json!({
            "method": DATA_RECEIVED,
            "payload": {"requestId": 3, "timestamp": 1.0, "dataLength": 10}
        }))
        .unwrap();

        let decoded = NetworkEvent::decode(&event).unwrap();
        assert_eq!(decoded.request_id().unwrap().as_str(), "3");
    }

    #[test]
    fn test_malformed_params_report_position() {
        let err = decode_event(4, &raw(RESPONSE_RECEIVED, json!({"requestId": "1"}))).unwrap_err();
        match err {
            ParseError::InvalidEvent { index, method, .. } => {
                assert_eq!(index, 4);
                assert_eq!(method, RESPONSE_RECEIVED);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
