//! Core model types and operations.
//!
//! This module defines the fundamental building blocks:
//! - [`Entity`]: packages, classes, methods and variables, identified by unique name
//! - [`Association`]: directed facts between two entities
//! - [`FactModel`]: the store holding both, with get-or-create identity semantics

mod hierarchy;
mod modifiers;
mod store;
mod types;

pub use modifiers::Modifiers;
pub use store::FactModel;
pub use types::{
    Association, AssociationId, AssociationKind, Entity, EntityId, EntityKind, SourceAnchor,
};
