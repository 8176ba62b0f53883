use std::path::PathBuf;

/// Arguments for the process command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ProcessArgs {
    /// Artifacts JSON captured during the page load
    pub input: PathBuf,

    /// Output path for the trace document
    pub output: PathBuf,

    /// Drop offending events instead of failing the batch
    pub lenient: bool,

    /// Tracing categories to keep (empty = defaults)
    pub categories: Vec<String>,
}

impl Default for ProcessArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("artifacts.json"),
            output: PathBuf::from("trace.json"),
            lenient: false,
            categories: Vec::new(),
        }
    }
}

/// Arguments for the graph command
#[derive(Debug, Clone)]
pub struct GraphArgs {
    /// Trace document written by `process`
    pub input: PathBuf,

    /// Output path for the dependency graph
    pub output: PathBuf,

    /// Directory holding content classification rules
    pub rules_dir: Option<PathBuf>,

    /// Print a text summary to stdout
    pub print_summary: bool,
}

impl Default for GraphArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("trace.json"),
            output: PathBuf::from("dependency-graph.json"),
            rules_dir: None,
            print_summary: false,
        }
    }
}

/// Arguments for the analyze command (process + graph in one go)
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub input: PathBuf,

    pub output: PathBuf,

    /// Also keep the intermediate trace document
    pub trace_output: Option<PathBuf>,

    pub lenient: bool,

    pub categories: Vec<String>,

    pub rules_dir: Option<PathBuf>,

    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("artifacts.json"),
            output: PathBuf::from("dependency-graph.json"),
            trace_output: None,
            lenient: false,
            categories: Vec::new(),
            rules_dir: None,
            print_summary: false,
        }
    }
}
