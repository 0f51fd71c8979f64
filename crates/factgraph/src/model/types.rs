//! Core model types: entities, associations, ids and kinds.

use super::modifiers::Modifiers;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Unique identifier for an entity (monotonic counter, dense).
pub type EntityId = u64;

/// Unique identifier for an association (monotonic counter, dense).
pub type AssociationId = u64;

/// Variant of a model entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Java package
    Package,
    /// Class, interface or enum
    Class,
    /// Method, constructor or synthetic initializer
    Method,
    /// Field
    Attribute,
    /// Formal parameter of a method
    Parameter,
    /// Local variable declared in a method body
    LocalVariable,
}

impl EntityKind {
    /// Variables can be the target of an access association.
    pub fn is_variable(self) -> bool {
        matches!(
            self,
            EntityKind::Attribute | EntityKind::Parameter | EntityKind::LocalVariable
        )
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Package => write!(f, "Package"),
            EntityKind::Class => write!(f, "Class"),
            EntityKind::Method => write!(f, "Method"),
            EntityKind::Attribute => write!(f, "Attribute"),
            EntityKind::Parameter => write!(f, "Parameter"),
            EntityKind::LocalVariable => write!(f, "LocalVariable"),
        }
    }
}

/// Variant of an association between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    /// Class extends class
    Inheritance,
    /// Class implements interface, or interface extends interface
    Subtyping,
    /// Method invokes method or constructor
    Invocation,
    /// Method reads or writes a variable
    Access,
    /// Method casts an expression to a class
    CastTo,
    /// Method checks an expression with `instanceof`
    CheckInstanceOf,
}

impl AssociationKind {
    /// Associations that make up the type hierarchy.
    pub fn is_hierarchy(self) -> bool {
        matches!(self, AssociationKind::Inheritance | AssociationKind::Subtyping)
    }
}

impl std::fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationKind::Inheritance => write!(f, "Inheritance"),
            AssociationKind::Subtyping => write!(f, "Subtyping"),
            AssociationKind::Invocation => write!(f, "Invocation"),
            AssociationKind::Access => write!(f, "Access"),
            AssociationKind::CastTo => write!(f, "CastTo"),
            AssociationKind::CheckInstanceOf => write!(f, "CheckInstanceOf"),
        }
    }
}

/// A half-open `[start, end)` character range inside a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceAnchor {
    /// Logical path of the file
    pub file: String,
    /// First character offset (inclusive)
    pub start: usize,
    /// Last character offset (exclusive)
    pub end: usize,
}

impl SourceAnchor {
    /// Create an anchor from a start offset and a length.
    pub fn new(file: impl Into<String>, start: usize, length: usize) -> Self {
        Self {
            file: file.into(),
            start,
            end: start + length,
        }
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for an empty range.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies completely inside this anchor (same file).
    pub fn contains(&self, other: &SourceAnchor) -> bool {
        self.file == other.file && self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for SourceAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}..{})", self.file, self.start, self.end)
    }
}

/// An entity of the fact model.
///
/// Equality and hashing only look at the kind and the unique name, which is
/// the identity the [`FactModel`](super::FactModel) de-duplicates on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier (assigned by the model)
    pub id: EntityId,
    /// Entity variant
    pub kind: EntityKind,
    /// Canonical name, unique per kind across the whole model
    pub unique_name: String,
    /// Modifier bitmask
    pub modifiers: Modifiers,
    /// Declaration site, when the entity was declared in analysed source
    pub anchor: Option<SourceAnchor>,
    /// Class of a variable's type or of a method's return type
    pub declared_type: Option<EntityId>,
    /// Variable type in method-signature form (`int[]` instead of the array marker)
    pub signature_type: Option<String>,
    /// Method parameter types in signature form, in declaration order
    pub parameter_types: Vec<String>,
    /// 0-based index of a formal parameter
    pub position: Option<usize>,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, kind: EntityKind, unique_name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            unique_name: unique_name.into(),
            modifiers: Modifiers::empty(),
            anchor: None,
            declared_type: None,
            signature_type: None,
            parameter_types: Vec::new(),
            position: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Owning entity (package, class or method).
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Owned entities. For a class: inner classes, methods and attributes.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether the entity was declared in analysed source.
    pub fn is_declared(&self) -> bool {
        self.anchor.is_some()
    }

    /// The last segment of the unique name.
    ///
    /// Method signatures and type parameter lists are stripped first, so
    /// `a.B.run(int)` yields `run`, `java.util.Vector<E>` yields `Vector` and
    /// the local `a.B.run(int).i#1` yields `i`.
    pub fn simple_name(&self) -> &str {
        let name = self.unique_name.as_str();
        let name = match self.kind {
            EntityKind::Method => name.split('(').next().unwrap_or(name),
            EntityKind::Class => name.split('<').next().unwrap_or(name),
            _ => name,
        };
        let cut = match self.kind {
            EntityKind::Class => name.rfind(['.', '$']),
            _ => name.rfind('.'),
        };
        let simple = match cut {
            Some(index) => &name[index + 1..],
            None => name,
        };
        // Locals redeclared in sibling blocks carry a `#n` suffix
        match self.kind {
            EntityKind::LocalVariable => simple.split('#').next().unwrap_or(simple),
            _ => simple,
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.unique_name == other.unique_name
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.unique_name.hash(state);
    }
}

/// A directed fact between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    /// Identifier (assigned by the model)
    pub id: AssociationId,
    /// Association variant
    pub kind: AssociationKind,
    /// Source entity
    pub from: EntityId,
    /// Target entity
    pub to: EntityId,
    /// Location of the originating source fragment
    pub anchor: Option<SourceAnchor>,
    /// Rendering of the originating source fragment
    pub statement: String,
}
