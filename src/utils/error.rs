//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::tracker::RequestId;
use thiserror::Error;

/// Errors that can occur while parsing the input documents
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Malformed event #{index} ({method}): {message}")]
    InvalidEvent {
        index: usize,
        method: String,
        message: String,
    },
}

/// Integrity errors raised by the request tracker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("{method} references unknown request {request_id}")]
    UnknownRequest { request_id: RequestId, method: String },

    #[error("{method} starts request {request_id} which already exists")]
    DuplicateStart { request_id: RequestId, method: String },

    #[error("{method} received for request {request_id} after it was finalized")]
    AlreadyFinalized { request_id: RequestId, method: String },

    #[error("{method} conflicts with the recorded outcome of request {request_id}")]
    ConflictingOutcome { request_id: RequestId, method: String },
}

impl TrackError {
    /// Request id the error refers to
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::UnknownRequest { request_id, .. }
            | Self::DuplicateStart { request_id, .. }
            | Self::AlreadyFinalized { request_id, .. }
            | Self::ConflictingOutcome { request_id, .. } => request_id,
        }
    }
}

/// Errors that abort ingestion of the raw network log
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Event #{index} rejected: {source}")]
    Track {
        index: usize,
        #[source]
        source: TrackError,
    },
}

/// Errors that can occur while building lenses
#[derive(Error, Debug)]
pub enum LensError {
    #[error("Failed to read rules file {path}: {source}")]
    RulesUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
