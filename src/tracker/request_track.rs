//! Request tracking state machine.
//!
//! Folds the network event stream into one [`RequestRecord`] per request id.
//! Records live in an arena addressed by slot; every mutation of a live
//! record goes through [`RequestTracker::pending_mut`], which is where the
//! "no writes after finalization" rule is enforced.

use super::record::{set_once, Outcome, RequestId, RequestRecord};
use crate::parser::events::{decode_event, NetworkEvent, REQUEST_WILL_BE_SENT};
use crate::parser::schema::{RawEvent, RequestWillBeSent, ResponsePayload};
use crate::utils::config::TrackerConfig;
use crate::utils::error::{IngestError, TrackError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Folds network events into request records
#[derive(Debug, Default)]
pub struct RequestTracker {
    config: TrackerConfig,
    records: Vec<RequestRecord>,
    index: HashMap<RequestId, usize>,
    /// Redirect hops closed so far, per live id
    redirects: HashMap<RequestId, usize>,
    rejected: Vec<TrackError>,
    ignored: usize,
}

/// Counters describing a finished fold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub request_count: usize,
    pub pending_count: usize,
    pub failed_count: usize,
    pub redirect_count: usize,
    pub rejected_count: usize,
    pub ignored_count: usize,
}

impl RequestTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Apply one typed event
    ///
    /// # Errors
    /// * `TrackError::DuplicateStart` - start for an id that already exists
    /// * `TrackError::UnknownRequest` - progress or terminal event before any start
    /// * `TrackError::AlreadyFinalized` - progress event after the outcome was set
    /// * `TrackError::ConflictingOutcome` - second terminal event of a different kind
    pub fn handle(&mut self, event: &NetworkEvent) -> Result<(), TrackError> {
        let method = event.method();
        if let Some(id) = event.request_id() {
            debug!("{} ({:?}) for request {}", method, event.phase(), id);
        }
        match event {
            NetworkEvent::RequestWillBeSent(e) => self.on_request_will_be_sent(e),
            NetworkEvent::RequestServedFromCache(e) => {
                let record = self.pending_mut(&e.request_id, method)?;
                record.served_from_cache = true;
                Ok(())
            }
            NetworkEvent::ResponseReceived(e) => {
                let record = self.pending_mut(&e.request_id, method)?;
                record.apply_response(&e.response, e.timestamp);
                if e.resource_type.is_some() {
                    record.resource_type = e.resource_type.clone();
                }
                Ok(())
            }
            NetworkEvent::DataReceived(e) => {
                let record = self.pending_mut(&e.request_id, method)?;
                set_once(&mut record.timing.first_byte, e.timestamp);
                record.data_length = record.data_length.saturating_add(e.data_length);
                record.encoded_data_length = record
                    .encoded_data_length
                    .saturating_add(e.encoded_data_length);
                Ok(())
            }
            NetworkEvent::ResourceChangedPriority(e) => {
                let record = self.pending_mut(&e.request_id, method)?;
                record.priority = Some(e.new_priority.clone());
                Ok(())
            }
            NetworkEvent::LoadingFinished(e) => {
                let record =
                    self.finalize(&e.request_id, method, Outcome::Succeeded, e.timestamp)?;
                if let Some(record) = record {
                    if let Some(total) = e.encoded_data_length {
                        record.encoded_data_length = total.max(0.0) as u64;
                    }
                }
                Ok(())
            }
            NetworkEvent::LoadingFailed(e) => {
                let record = self.finalize(&e.request_id, method, Outcome::Failed, e.timestamp)?;
                if let Some(record) = record {
                    record.error_text = e.error_text.clone();
                    record.canceled = e.canceled;
                }
                Ok(())
            }
            NetworkEvent::Unrecognized(method) => {
                debug!("Ignoring unrecognized event method {}", method);
                self.ignored += 1;
                Ok(())
            }
        }
    }

    /// Decode and apply the raw event at `index`, honoring the strictness setting
    ///
    /// Malformed payloads always fail. Tracking errors fail in strict mode; in
    /// lenient mode the event is dropped and remembered in [`Self::rejected`].
    pub fn ingest(&mut self, index: usize, raw: &RawEvent) -> Result<(), IngestError> {
        let event = decode_event(index, raw)?;
        match self.handle(&event) {
            Ok(()) => Ok(()),
            Err(source) if self.config.strict => Err(IngestError::Track { index, source }),
            Err(source) => {
                warn!("Dropping event #{}: {}", index, source);
                self.rejected.push(source);
                Ok(())
            }
        }
    }

    /// Records in id order, pending ones included as they are
    pub fn export(&self) -> Vec<RequestRecord> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub fn get(&self, id: &RequestId) -> Option<&RequestRecord> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Errors tolerated in lenient mode, in arrival order
    pub fn rejected(&self) -> &[TrackError] {
        &self.rejected
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            request_count: self.records.len(),
            pending_count: self.records.iter().filter(|r| r.is_pending()).count(),
            failed_count: self
                .records
                .iter()
                .filter(|r| r.outcome == Outcome::Failed)
                .count(),
            redirect_count: self.redirects.values().sum(),
            rejected_count: self.rejected.len(),
            ignored_count: self.ignored,
        }
    }

    fn on_request_will_be_sent(&mut self, event: &RequestWillBeSent) -> Result<(), TrackError> {
        let id = &event.request_id;
        let existing = self.index.get(id).copied();
        let Some(slot) = existing else {
            if event.redirect_response.is_some() {
                debug!("Redirect start for unseen request {}, treating as plain start", id);
            }
            self.insert(RequestRecord::from_start(event));
            return Ok(());
        };

        match &event.redirect_response {
            Some(response) if self.records[slot].is_pending() => {
                let hop_id = self.close_redirect_hop(slot, event, response)?;
                let mut next = RequestRecord::from_start(event);
                next.redirected_from = Some(hop_id);
                self.insert(next);
                Ok(())
            }
            _ => Err(TrackError::DuplicateStart {
                request_id: id.clone(),
                method: REQUEST_WILL_BE_SENT.to_string(),
            }),
        }
    }

    /// Finalize the live record at `slot` as a redirect hop and re-key it
    fn close_redirect_hop(
        &mut self,
        slot: usize,
        event: &RequestWillBeSent,
        response: &ResponsePayload,
    ) -> Result<RequestId, TrackError> {
        let id = &event.request_id;
        let n = self.redirects.get(id).copied().unwrap_or(0);
        let hop_id = id.redirect_hop(n);
        if self.index.contains_key(&hop_id) {
            return Err(TrackError::DuplicateStart {
                request_id: hop_id,
                method: REQUEST_WILL_BE_SENT.to_string(),
            });
        }
        self.redirects.insert(id.clone(), n + 1);

        let record = &mut self.records[slot];
        record.apply_response(response, event.timestamp);
        set_once(&mut record.timing.end, event.timestamp);
        record.outcome = Outcome::Succeeded;
        record.redirect_url = Some(event.request.url.clone());
        record.redirected_to = Some(id.clone());
        record.id = hop_id.clone();
        let previous = record.redirected_from.clone();

        debug!("Request {} redirected, closed hop {}", id, hop_id);

        self.index.remove(id);
        self.index.insert(hop_id.clone(), slot);

        // the previous hop now continues into this one rather than the live id
        if let Some(prev_slot) = previous.and_then(|prev| self.index.get(&prev).copied()) {
            self.records[prev_slot].redirected_to = Some(hop_id.clone());
        }
        Ok(hop_id)
    }

    fn insert(&mut self, record: RequestRecord) {
        let slot = self.records.len();
        self.index.insert(record.id.clone(), slot);
        self.records.push(record);
    }

    /// The single write path for live records
    fn pending_mut(
        &mut self,
        id: &RequestId,
        method: &str,
    ) -> Result<&mut RequestRecord, TrackError> {
        let slot = self.slot(id, method)?;
        let record = &mut self.records[slot];
        if record.is_finalized() {
            return Err(TrackError::AlreadyFinalized {
                request_id: id.clone(),
                method: method.to_string(),
            });
        }
        Ok(record)
    }

    /// Apply a terminal outcome. Returns the record only when this call set it;
    /// a replay of the same outcome is a no-op and returns `None`.
    fn finalize(
        &mut self,
        id: &RequestId,
        method: &str,
        outcome: Outcome,
        timestamp: f64,
    ) -> Result<Option<&mut RequestRecord>, TrackError> {
        let slot = self.slot(id, method)?;
        let record = &mut self.records[slot];
        match record.outcome {
            Outcome::Pending => {
                record.outcome = outcome;
                set_once(&mut record.timing.end, timestamp);
                Ok(Some(record))
            }
            current if current == outcome => {
                debug!("Duplicate {} for request {}, ignoring", method, id);
                Ok(None)
            }
            _ => Err(TrackError::ConflictingOutcome {
                request_id: id.clone(),
                method: method.to_string(),
            }),
        }
    }

    fn slot(&self, id: &RequestId, method: &str) -> Result<usize, TrackError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TrackError::UnknownRequest {
                request_id: id.clone(),
                method: method.to_string(),
            })
    }
}

/// Fold a whole raw network log
///
/// **Public** - main entry point for request tracking
///
/// # Errors
/// * `IngestError::Parse` - an event payload is malformed
/// * `IngestError::Track` - a tracking error in strict mode
pub fn track_requests(
    events: &[RawEvent],
    config: &TrackerConfig,
) -> Result<RequestTracker, IngestError> {
    debug!("Tracking {} network events", events.len());

    let mut tracker = RequestTracker::new(config.clone());
    for (index, raw) in events.iter().enumerate() {
        tracker.ingest(index, raw)?;
    }

    debug!("Tracked {} requests", tracker.len());
    Ok(tracker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::events::NetworkEvent;
    use serde_json::json;

    fn event(method: &str, params: serde_json::Value) -> NetworkEvent {
        NetworkEvent::decode(&RawEvent {
            method: method.to_string(),
            category: None,
            params,
        })
        .unwrap()
    }

    fn start(id: &str, url: &str, ts: f64) -> NetworkEvent {
        event(
            "Network.requestWillBeSent",
            json!({"requestId": id, "request": {"url": url}, "timestamp": ts}),
        )
    }

    fn redirect(id: &str, url: &str, ts: f64) -> NetworkEvent {
        event(
            "Network.requestWillBeSent",
            json!({
                "requestId": id,
                "request": {"url": url},
                "timestamp": ts,
                "redirectResponse": {"status": 302, "statusText": "Found"}
            }),
        )
    }

    #[test]
    fn test_redirect_closes_hop() {
        let mut tracker = RequestTracker::default();
        tracker.handle(&start("5", "http://a.test/", 1.0)).unwrap();
        tracker.handle(&redirect("5", "https://a.test/", 1.2)).unwrap();

        let hop = tracker.get(&RequestId::from("5.redirect.0")).unwrap();
        assert_eq!(hop.outcome, Outcome::Succeeded);
        assert_eq!(hop.status, Some(302));
        assert_eq!(hop.redirect_url.as_deref(), Some("https://a.test/"));
        assert_eq!(hop.redirected_to, Some(RequestId::from("5")));
        assert_eq!(hop.timing.end, Some(1.2));

        let live = tracker.get(&RequestId::from("5")).unwrap();
        assert!(live.is_pending());
        assert_eq!(live.url.as_deref(), Some("https://a.test/"));
        assert_eq!(live.redirected_from, Some(RequestId::from("5.redirect.0")));
        assert_eq!(tracker.summary().redirect_count, 1);
    }

    #[test]
    fn test_redirect_chain_numbers_hops() {
        let mut tracker = RequestTracker::default();
        tracker.handle(&start("5", "http://a.test/", 1.0)).unwrap();
        tracker.handle(&redirect("5", "https://a.test/", 1.1)).unwrap();
        tracker.handle(&redirect("5", "https://www.a.test/", 1.2)).unwrap();

        let first = tracker.get(&RequestId::from("5.redirect.0")).unwrap();
        assert_eq!(first.redirected_to, Some(RequestId::from("5.redirect.1")));
        let second = tracker.get(&RequestId::from("5.redirect.1")).unwrap();
        assert_eq!(second.redirected_from, Some(RequestId::from("5.redirect.0")));
        assert_eq!(second.redirected_to, Some(RequestId::from("5")));
        let live = tracker.get(&RequestId::from("5")).unwrap();
        assert_eq!(live.redirected_from, Some(RequestId::from("5.redirect.1")));
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_redirect_for_unseen_id_is_plain_start() {
        let mut tracker = RequestTracker::default();
        tracker.handle(&redirect("5", "https://a.test/", 1.0)).unwrap();

        let records = tracker.export();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_str(), "5");
        assert_eq!(records[0].outcome, Outcome::Pending);
        assert!(records[0].redirected_from.is_none());
        assert_eq!(tracker.summary().redirect_count, 0);
    }

    #[test]
    fn test_data_lengths_saturate() {
        let mut tracker = RequestTracker::default();
        tracker.handle(&start("1", "https://a.test/", 1.0)).unwrap();
        for ts in [1.5, 1.7] {
            tracker
                .handle(&event(
                    "Network.dataReceived",
                    json!({"requestId": "1", "timestamp": ts, "dataLength": u64::MAX, "encodedDataLength": u64::MAX}),
                ))
                .unwrap();
        }

        let record = tracker.get(&RequestId::from("1")).unwrap();
        assert_eq!(record.data_length, u64::MAX);
        assert_eq!(record.encoded_data_length, u64::MAX);
    }

    #[test]
    fn test_redirect_after_finish_is_duplicate_start() {
        let mut tracker = RequestTracker::default();
        tracker.handle(&start("5", "http://a.test/", 1.0)).unwrap();
        tracker
            .handle(&event(
                "Network.loadingFinished",
                json!({"requestId": "5", "timestamp": 2.0}),
            ))
            .unwrap();

        let err = tracker.handle(&redirect("5", "https://a.test/", 3.0)).unwrap_err();
        assert!(matches!(err, TrackError::DuplicateStart { .. }));
    }

    #[test]
    fn test_data_received_accumulates() {
        let mut tracker = RequestTracker::default();
        tracker.handle(&start("1", "https://a.test/", 1.0)).unwrap();
        for ts in [1.5, 1.7] {
            tracker
                .handle(&event(
                    "Network.dataReceived",
                    json!({"requestId": "1", "timestamp": ts, "dataLength": 100, "encodedDataLength": 40}),
                ))
                .unwrap();
        }

        let record = tracker.get(&RequestId::from("1")).unwrap();
        assert_eq!(record.timing.first_byte, Some(1.5));
        assert_eq!(record.data_length, 200);
        assert_eq!(record.encoded_data_length, 80);
    }

    #[test]
    fn test_lenient_mode_collects_rejections() {
        let mut tracker = RequestTracker::new(TrackerConfig { strict: false });
        let orphan = RawEvent {
            method: "Network.dataReceived".to_string(),
            category: None,
            params: json!({"requestId": "9", "timestamp": 1.0}),
        };

        tracker.ingest(0, &orphan).unwrap();
        assert_eq!(tracker.rejected().len(), 1);
        assert_eq!(tracker.rejected()[0].request_id().as_str(), "9");
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_strict_mode_reports_index() {
        let mut tracker = RequestTracker::default();
        let orphan = RawEvent {
            method: "Network.loadingFinished".to_string(),
            category: None,
            params: json!({"requestId": "9", "timestamp": 1.0}),
        };

        let err = tracker.ingest(7, &orphan).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Track { index: 7, source: TrackError::UnknownRequest { .. } }
        ));
    }

    #[test]
    fn test_unrecognized_counted() {
        let mut tracker = RequestTracker::default();
        tracker
            .handle(&event("Network.webSocketCreated", json!({"requestId": "1"})))
            .unwrap();
        assert_eq!(tracker.summary().ignored_count, 1);
        assert!(tracker.is_empty());
    }
}
