use serde::{Deserialize, Serialize};

/// Configuration for extractor behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum file size to parse (in bytes)
    /// Files larger than this fail with `FileTooLarge`
    pub max_file_size: usize,

    /// Enable parallel traversal and resolution (for `extract_units`)
    pub parallel: bool,

    /// Number of parallel workers (None = one per CPU)
    pub parallel_workers: Option<usize>,

    /// Run the deferred resolution pass after all units are traversed
    pub resolve_deferred: bool,

    /// Link deferred invocations whose best resolution is unique
    pub link_resolved_invocations: bool,

    /// Also link ambiguous deferred invocations to their first candidate
    pub link_ambiguous_to_first: bool,

    /// Render the source text of each association's originating fragment
    pub record_statements: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MB
            parallel: false,
            parallel_workers: None,
            resolve_deferred: true,
            link_resolved_invocations: true,
            link_ambiguous_to_first: false,
            record_statements: true,
        }
    }
}

impl ExtractorConfig {
    /// Create config for fast extraction (no statements, no deferred pass)
    pub fn fast() -> Self {
        Self {
            resolve_deferred: false,
            link_resolved_invocations: false,
            record_statements: false,
            ..Default::default()
        }
    }

    /// Create config that links every invocation it can find a candidate for
    pub fn comprehensive() -> Self {
        Self {
            resolve_deferred: true,
            link_resolved_invocations: true,
            link_ambiguous_to_first: true,
            record_statements: true,
            ..Default::default()
        }
    }

    /// Enable parallel extraction
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the number of parallel workers
    pub fn with_parallel_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = Some(workers);
        self
    }

    /// Set maximum file size
    pub fn with_max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = size;
        self
    }

    /// Enable or disable the deferred resolution pass
    pub fn with_resolve_deferred(mut self, resolve: bool) -> Self {
        self.resolve_deferred = resolve;
        self
    }

    /// Link ambiguous deferred invocations to their first candidate
    pub fn with_link_ambiguous_to_first(mut self, link: bool) -> Self {
        self.link_ambiguous_to_first = link;
        self
    }

    /// Enable or disable statement rendering
    pub fn with_record_statements(mut self, record: bool) -> Self {
        self.record_statements = record;
        self
    }
}
