//! # factgraph
//!
//! A cross-referenced, de-duplicated fact model of object-oriented source code:
//! packages, classes, methods, attributes and variables, plus the associations
//! between them (inheritance, subtyping, invocation, access, casts and
//! instance-of checks).
//!
//! ## Core Principles
//!
//! - **Identity by unique name**: an entity is its `(kind, unique name)` pair,
//!   and the store never holds two entities with the same pair
//! - **Get-or-create**: adding an entity twice returns the canonical instance
//! - **Fast neighbourhood lookups**: associations are indexed by both endpoints
//! - **Zero Magic**: the store never scans or parses anything by itself
//!
//! ## Architecture
//!
//! ```text
//! Language extractors (factgraph-java)
//!     ↓
//! Fact Model (entities, associations, hierarchy queries)
//!     ↓
//! Export (JSON for viewers and metrics engines)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use factgraph::{AssociationKind, EntityKind, FactModel};
//!
//! # fn main() -> factgraph::Result<()> {
//! let mut model = FactModel::new();
//! let base = model.get_or_create(EntityKind::Class, "shapes.Base");
//! let sum = model.get_or_create(EntityKind::Class, "shapes.Sum");
//! model.add_association(AssociationKind::Inheritance, sum, base, None, "Sum extends Base")?;
//!
//! // Adding the same identity again yields the canonical instance.
//! assert_eq!(model.get_or_create(EntityKind::Class, "shapes.Sum"), sum);
//! assert_eq!(model.supertypes_of(sum), vec![base]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod export;
pub mod model;

// Re-export main types
pub use error::{ModelError, Result};
pub use model::{
    Association, AssociationId, AssociationKind, Entity, EntityId, EntityKind, FactModel,
    Modifiers, SourceAnchor,
};
