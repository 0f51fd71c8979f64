use factgraph::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Failed to read file
    #[error("IO error reading {0}: {1}")]
    IoError(PathBuf, #[source] std::io::Error),

    /// Syntax error in source code
    #[error("Syntax error in {0}:{1}:{2}: {3}")]
    SyntaxError(PathBuf, usize, usize, String),

    /// File too large
    #[error("File {0} exceeds maximum size ({1} bytes)")]
    FileTooLarge(PathBuf, usize),

    /// The front end could not produce a syntax tree
    #[error("Parse error in {0}: {1}")]
    ParseError(PathBuf, String),

    /// Traversal state became inconsistent; the unit was aborted
    #[error("Invariant violated while extracting {0}: {1}")]
    Invariant(PathBuf, String),

    /// The run was cancelled between units
    #[error("Extraction cancelled")]
    Cancelled,

    /// The worker pool for parallel extraction could not be built
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(String),

    /// The fact model rejected an operation
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl ExtractError {
    /// Whether the error aborted a unit because the model or scope state
    /// would otherwise have been corrupted.
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            ExtractError::Invariant(..) => true,
            ExtractError::Model(e) => e.is_invariant_violation(),
            _ => false,
        }
    }
}

/// Result type for extractor operations
pub type ExtractResult<T> = Result<T, ExtractError>;
