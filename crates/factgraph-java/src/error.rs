//! Errors raised by node handlers.

use crate::scope::ScopeError;
use factgraph::ModelError;
use thiserror::Error;

/// Result type for node handlers.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Why a node handler stopped.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The node lacks something its handler needs; its subtree is skipped
    #[error("{0}")]
    NodeFault(String),

    /// Scope enter/leave pairs no longer match; the unit is aborted
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// The model rejected an update
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl HandlerError {
    /// A recoverable fault in a single node.
    pub fn fault(message: impl Into<String>) -> Self {
        HandlerError::NodeFault(message.into())
    }

    /// Whether the error must abort the whole unit.
    ///
    /// Lookups of unknown ids are node faults; conflicting declarations and
    /// unbalanced scopes are not.
    pub fn is_fatal(&self) -> bool {
        match self {
            HandlerError::NodeFault(_) => false,
            HandlerError::Scope(_) => true,
            HandlerError::Model(e) => e.is_invariant_violation(),
        }
    }
}
