//! Request tracking.
//!
//! Turns an interleaved stream of network events into one structured record
//! per request:
//! - Start, progress and terminal transitions per request id
//! - Redirect hops split into their own records
//! - Integrity errors for out-of-protocol event sequences

pub mod record;
pub mod request_track;

// Re-export main types and functions
pub use record::{Initiator, InitiatorKind, Outcome, RequestId, RequestRecord, Timing};
pub use request_track::{track_requests, RequestTracker, TrackSummary};
