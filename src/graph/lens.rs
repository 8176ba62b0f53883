//! Read-only views over a trace that annotate graph nodes.
//!
//! A lens never changes tracker state or edges; it only contributes
//! key/value attributes for the nodes it knows something about.

use crate::trace::Trace;
use crate::tracker::RequestRecord;
use crate::utils::config::{LensConfig, ACTIVITY_CATEGORY, AD_RULES_FILE, TRACKING_RULES_FILE};
use crate::utils::error::LensError;
use log::debug;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

/// An analytical view that annotates request nodes
pub trait NodeLens {
    /// Namespace for this lens's attributes
    fn name(&self) -> &str;

    /// Attributes for one request, unprefixed
    fn annotate(&self, record: &RequestRecord) -> Vec<(String, Value)>;
}

/// Frame ownership: which frame issued a request and whether it is the main one
#[derive(Debug, Clone, Default)]
pub struct FrameOwnershipLens {
    main_frame: Option<String>,
    lifecycle_events: HashMap<String, usize>,
}

impl FrameOwnershipLens {
    pub fn new(trace: &Trace) -> Self {
        let mut lifecycle_events = HashMap::new();
        for event in &trace.page_track.events {
            *lifecycle_events.entry(event.frame_id.clone()).or_insert(0) += 1;
        }
        Self {
            main_frame: trace.main_frame_id().map(str::to_string),
            lifecycle_events,
        }
    }
}

impl NodeLens for FrameOwnershipLens {
    fn name(&self) -> &str {
        "frame"
    }

    fn annotate(&self, record: &RequestRecord) -> Vec<(String, Value)> {
        let Some(frame_id) = record.frame_id.as_deref() else {
            return Vec::new();
        };
        vec![
            ("id".to_string(), json!(frame_id)),
            (
                "is_main_frame".to_string(),
                json!(self.main_frame.as_deref() == Some(frame_id)),
            ),
            (
                "lifecycle_events".to_string(),
                json!(self.lifecycle_events.get(frame_id).copied().unwrap_or(0)),
            ),
        ]
    }
}

/// URL substring rules flagging ad and tracking requests
#[derive(Debug, Clone, Default)]
pub struct ContentClassificationLens {
    ad_rules: Vec<String>,
    tracking_rules: Vec<String>,
}

impl ContentClassificationLens {
    pub fn new(ad_rules: Vec<String>, tracking_rules: Vec<String>) -> Self {
        Self {
            ad_rules,
            tracking_rules,
        }
    }

    /// Load rule files from the configured directory; no directory means no rules
    ///
    /// # Errors
    /// * `LensError::RulesUnreadable` - a rule file exists but cannot be read
    pub fn from_config(config: &LensConfig) -> Result<Self, LensError> {
        let Some(dir) = config.rules_dir.as_deref() else {
            return Ok(Self::default());
        };
        Ok(Self::new(
            load_rules(&dir.join(AD_RULES_FILE))?,
            load_rules(&dir.join(TRACKING_RULES_FILE))?,
        ))
    }

    pub fn is_ad(&self, url: &str) -> bool {
        self.ad_rules.iter().any(|rule| url.contains(rule.as_str()))
    }

    pub fn is_tracking(&self, url: &str) -> bool {
        self.tracking_rules.iter().any(|rule| url.contains(rule.as_str()))
    }
}

impl NodeLens for ContentClassificationLens {
    fn name(&self) -> &str {
        "content"
    }

    fn annotate(&self, record: &RequestRecord) -> Vec<(String, Value)> {
        let Some(url) = record.url.as_deref() else {
            return Vec::new();
        };
        vec![
            ("is_ad".to_string(), json!(self.is_ad(url))),
            ("is_tracking".to_string(), json!(self.is_tracking(url))),
        ]
    }
}

/// One pattern per line; blank lines and `#` comments skipped
pub fn parse_rules(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn load_rules(path: &Path) -> Result<Vec<String>, LensError> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let rules = parse_rules(&text);
            debug!("Loaded {} rules from {}", rules.len(), path.display());
            Ok(rules)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No rules file at {}", path.display());
            Ok(Vec::new())
        }
        Err(source) => Err(LensError::RulesUnreadable {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Main-loop busy time overlapping each request
///
/// Tracing timestamps are microseconds and network timestamps are seconds
/// on the same monotonic clock.
#[derive(Debug, Clone, Default)]
pub struct ActivityLens {
    /// (start, end) of complete task slices, microseconds
    slices: Vec<(f64, f64)>,
}

impl ActivityLens {
    pub fn new(trace: &Trace) -> Self {
        let slices = trace
            .tracing_track
            .events
            .iter()
            .filter(|e| e.get("cat").and_then(Value::as_str) == Some(ACTIVITY_CATEGORY))
            .filter(|e| e.get("ph").and_then(Value::as_str) == Some("X"))
            .filter_map(|e| {
                let ts = e.get("ts")?.as_f64()?;
                let dur = e.get("dur")?.as_f64()?;
                Some((ts, ts + dur))
            })
            .collect();
        Self { slices }
    }

    /// Busy milliseconds inside `[start, end]`, both in seconds
    pub fn busy_ms(&self, start: f64, end: f64) -> f64 {
        let (lo, hi) = (start * 1e6, end * 1e6);
        let busy_us: f64 = self
            .slices
            .iter()
            .map(|&(s, e)| (e.min(hi) - s.max(lo)).max(0.0))
            .sum();
        busy_us / 1000.0
    }
}

impl NodeLens for ActivityLens {
    fn name(&self) -> &str {
        "activity"
    }

    fn annotate(&self, record: &RequestRecord) -> Vec<(String, Value)> {
        match (record.timing.start, record.timing.end) {
            (Some(start), Some(end)) => {
                vec![("busy_ms".to_string(), json!(self.busy_ms(start, end)))]
            }
            _ => Vec::new(),
        }
    }
}

/// The built-in lenses over a trace
///
/// # Errors
/// * `LensError::RulesUnreadable` - classification rules could not be read
pub fn default_lenses(
    trace: &Trace,
    config: &LensConfig,
) -> Result<Vec<Box<dyn NodeLens>>, LensError> {
    Ok(vec![
        Box::new(ContentClassificationLens::from_config(config)?),
        Box::new(FrameOwnershipLens::new(trace)),
        Box::new(ActivityLens::new(trace)),
    ])
}
