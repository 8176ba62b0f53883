//! Artifacts document loading.
//!
//! Validates the top-level shape before anything is tracked, so a document
//! with a missing section fails before a partial trace can exist.

use super::schema::Artifacts;
use crate::utils::config::REQUIRED_ARTIFACT_KEYS;
use crate::utils::error::ParseError;
use log::debug;
use serde::Deserialize;

/// Parse a raw artifacts document
///
/// **Public** - main entry point for reading captured logs
///
/// # Errors
/// * `ParseError::InvalidFormat` - document is not a JSON object
/// * `ParseError::MissingField` - a required top-level key is absent
/// * `ParseError::JsonError` - a section has the wrong shape
pub fn parse_artifacts(raw: &serde_json::Value) -> Result<Artifacts, ParseError> {
    let obj = raw.as_object().ok_or_else(|| {
        ParseError::InvalidFormat("Artifacts must be a JSON object".to_string())
    })?;

    if let Some(missing) = REQUIRED_ARTIFACT_KEYS
        .iter()
        .find(|key| !obj.contains_key(**key))
    {
        return Err(ParseError::MissingField(missing.to_string()));
    }

    let artifacts = Artifacts::deserialize(raw)?;

    debug!(
        "Artifacts for {}: {} tracing events, {} frame events, {} network events",
        artifacts.url,
        artifacts.trace_contents.len(),
        artifacts.frame_load_events.len(),
        artifacts.raw_network_events.len()
    );

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_artifacts() {
        let artifacts = parse_artifacts(&json!({
            "url": "https://a.test/",
            "traceContents": [],
            "frameLoadEvents": [{"frameId": "F1", "method": "Page.frameNavigated"}],
            "rawNetworkEvents": []
        }))
        .unwrap();

        assert_eq!(artifacts.url, "https://a.test/");
        assert_eq!(artifacts.frame_load_events[0].frame_id, "F1");
    }

    #[test]
    fn test_missing_network_events() {
        let err = parse_artifacts(&json!({
            "url": "https://a.test/",
            "traceContents": [],
            "frameLoadEvents": []
        }))
        .unwrap_err();

        assert!(matches!(err, ParseError::MissingField(ref key) if key == "rawNetworkEvents"));
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            parse_artifacts(&json!([1, 2])),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_wrong_section_shape() {
        let err = parse_artifacts(&json!({
            "url": "https://a.test/",
            "traceContents": {},
            "frameLoadEvents": [],
            "rawNetworkEvents": []
        }))
        .unwrap_err();

        assert!(matches!(err, ParseError::JsonError(_)));
    }
}
