//! Configuration and constants for the pipeline.
//!
//! Everything a stage needs from its environment is passed in through one of
//! the config structs below. Nothing in the library reads the environment.

use std::path::PathBuf;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Category marking structural tracing metadata (process/thread names)
pub const METADATA_CATEGORY: &str = "__metadata";

/// Tracing categories kept in the tracing track
pub const DEFAULT_TRACE_CATEGORIES: &[&str] = &[
    "toplevel",
    "blink",
    "blink.net",
    "blink.user_timing",
    "devtools.timeline",
    "disabled-by-default-devtools.timeline",
    "loading",
    "navigation",
    "netlog",
    "v8",
];

// Top-level keys every artifacts document must carry
pub const REQUIRED_ARTIFACT_KEYS: &[&str] =
    &["url", "traceContents", "frameLoadEvents", "rawNetworkEvents"];

/// Infix used when re-keying a closed redirect hop: `<id>.redirect.<n>`
pub const REDIRECT_ID_INFIX: &str = "redirect";

/// Tracing category holding the main-loop tasks the activity lens measures
pub const ACTIVITY_CATEGORY: &str = "toplevel";

/// Rule file names looked up inside the configured rules directory
pub const AD_RULES_FILE: &str = "ad.rules";
pub const TRACKING_RULES_FILE: &str = "tracking.rules";

/// Request tracker behaviour
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Abort the whole batch on the first tracking error
    pub strict: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Trace assembly settings
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Allow-list of tracing categories
    pub categories: Vec<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_TRACE_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl TraceConfig {
    /// Use a custom allow-list, falling back to the defaults when empty
    pub fn with_categories(categories: Vec<String>) -> Self {
        if categories.is_empty() {
            Self::default()
        } else {
            Self { categories }
        }
    }
}

/// Lens settings, injected at startup
#[derive(Debug, Clone, Default)]
pub struct LensConfig {
    /// Directory holding content classification rule files
    pub rules_dir: Option<PathBuf>,
}
