//! Error types for fact model operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.

use thiserror::Error;

/// Result type alias for fact model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Error type for all fact model operations.
///
/// Lookups of unknown ids are recoverable; a conflicting declaration is an
/// invariant violation that callers are expected to treat as fatal.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Entity id not present in the model
    #[error("Entity not found: {entity_id}")]
    EntityNotFound {
        /// ID of the missing entity
        entity_id: String,
    },

    /// Association id not present in the model
    #[error("Association not found: {association_id}")]
    AssociationNotFound {
        /// ID of the missing association
        association_id: String,
    },

    /// The same identity was declared twice at different source locations
    #[error("Duplicate declaration of {kind} '{unique_name}': already declared at {existing}, redeclared at {duplicate}")]
    DuplicateDeclaration {
        /// Entity kind of the conflicting identity
        kind: String,
        /// Unique name of the conflicting identity
        unique_name: String,
        /// Anchor of the first declaration
        existing: String,
        /// Anchor of the second declaration
        duplicate: String,
    },

    /// Invalid operation (e.g., making an entity its own parent)
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },

    /// Serialization error during export
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ModelError {
    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Whether this error signals a broken model invariant rather than a bad lookup.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            ModelError::DuplicateDeclaration { .. } | ModelError::InvalidOperation { .. }
        )
    }
}
