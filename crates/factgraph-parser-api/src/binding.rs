//! Compiler bindings and syntactic type nodes.
//!
//! A binding is the semantic information a compiler attaches to a syntax node
//! once it has resolved it. Every binding in the AST is optional: front ends
//! leave it out whenever resolution failed or was never attempted.

use factgraph::Modifiers;
use serde::{Deserialize, Serialize};

use crate::ast::Span;

/// What a [`TypeBinding`] denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeBindingKind {
    /// Class type
    Class,
    /// Interface type
    Interface,
    /// Enum type
    Enum,
    /// Primitive type, including `void`
    Primitive,
    /// Array type
    Array,
    /// Type variable such as `E` in `Vector<E>`
    TypeVariable,
    /// The type of the `null` literal
    Null,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeBinding {
    /// What kind of type this is
    pub kind: TypeBindingKind,
    /// Fully qualified binary name (`a.Outer$Inner`), primitive keyword or
    /// type variable name; empty when the compiler could not name the type
    pub binary_name: String,
    /// Type parameters declared by the generic type, in order
    pub type_parameters: Vec<String>,
    /// Whether this is an anonymous class
    pub is_anonymous: bool,
    /// Element type of an array
    pub element: Option<Box<TypeBinding>>,
    /// Number of array dimensions (0 for non-arrays)
    pub dimensions: usize,
    /// First bound of a type variable (`Number` in `T extends Number`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<Box<TypeBinding>>,
}

impl TypeBinding {
    fn named(kind: TypeBindingKind, binary_name: impl Into<String>) -> Self {
        Self {
            kind,
            binary_name: binary_name.into(),
            type_parameters: Vec::new(),
            is_anonymous: false,
            element: None,
            dimensions: 0,
            bound: None,
        }
    }

    /// A class type.
    pub fn class(binary_name: impl Into<String>) -> Self {
        Self::named(TypeBindingKind::Class, binary_name)
    }

    /// An interface type.
    pub fn interface(binary_name: impl Into<String>) -> Self {
        Self::named(TypeBindingKind::Interface, binary_name)
    }

    /// An enum type.
    pub fn enumeration(binary_name: impl Into<String>) -> Self {
        Self::named(TypeBindingKind::Enum, binary_name)
    }

    /// A primitive type (`int`, `boolean`, `void`, ...).
    pub fn primitive(keyword: impl Into<String>) -> Self {
        Self::named(TypeBindingKind::Primitive, keyword)
    }

    /// A type variable.
    pub fn type_variable(name: impl Into<String>) -> Self {
        Self::named(TypeBindingKind::TypeVariable, name)
    }

    /// The null type.
    pub fn null() -> Self {
        Self::named(TypeBindingKind::Null, "null")
    }

    /// An anonymous class; the compiler may or may not provide a binary name.
    pub fn anonymous(binary_name: impl Into<String>) -> Self {
        Self {
            is_anonymous: true,
            ..Self::named(TypeBindingKind::Class, binary_name)
        }
    }

    /// An array of `element` with the given number of dimensions.
    ///
    /// Nested arrays are flattened so that `element` is never itself an array.
    pub fn array(element: TypeBinding, dimensions: usize) -> Self {
        let (element, dimensions) = if element.kind == TypeBindingKind::Array {
            let inner_dims = element.dimensions;
            match element.element {
                Some(inner) => (*inner, dimensions + inner_dims),
                None => (TypeBinding::null(), dimensions + inner_dims),
            }
        } else {
            (element, dimensions)
        };
        Self {
            kind: TypeBindingKind::Array,
            binary_name: String::new(),
            type_parameters: Vec::new(),
            is_anonymous: false,
            element: Some(Box::new(element)),
            dimensions,
            bound: None,
        }
    }

    /// Builder: first bound of a type variable.
    pub fn with_bound(mut self, bound: Option<TypeBinding>) -> Self {
        self.bound = bound.map(Box::new);
        self
    }

    /// Builder: declared type parameters of a generic type.
    pub fn with_type_parameters(mut self, params: Vec<String>) -> Self {
        self.type_parameters = params;
        self
    }

    /// Whether this is an array type.
    pub fn is_array(&self) -> bool {
        self.kind == TypeBindingKind::Array
    }

    /// Whether this is a primitive type.
    pub fn is_primitive(&self) -> bool {
        self.kind == TypeBindingKind::Primitive
    }

    /// Whether this is an interface type.
    pub fn is_interface(&self) -> bool {
        self.kind == TypeBindingKind::Interface
    }

    /// Whether the type is generic or parameterized.
    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }
}

/// A resolved method or constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBinding {
    /// Class declaring the method
    pub declaring_class: TypeBinding,
    /// Simple name; ignored for constructors
    pub name: String,
    /// Whether this is a constructor
    pub is_constructor: bool,
    /// Declared (not invoked) parameter types, in order
    pub parameter_types: Vec<TypeBinding>,
    /// Declared return type; `None` for constructors
    pub return_type: Option<TypeBinding>,
    /// Declared modifiers
    pub modifiers: Modifiers,
}

impl MethodBinding {
    /// A method binding.
    pub fn method(
        declaring_class: TypeBinding,
        name: impl Into<String>,
        parameter_types: Vec<TypeBinding>,
        return_type: TypeBinding,
    ) -> Self {
        Self {
            declaring_class,
            name: name.into(),
            is_constructor: false,
            parameter_types,
            return_type: Some(return_type),
            modifiers: Modifiers::empty(),
        }
    }

    /// A constructor binding.
    pub fn constructor(declaring_class: TypeBinding, parameter_types: Vec<TypeBinding>) -> Self {
        Self {
            name: declaring_class
                .binary_name
                .rsplit(['.', '$'])
                .next()
                .unwrap_or_default()
                .to_string(),
            declaring_class,
            is_constructor: true,
            parameter_types,
            return_type: None,
            modifiers: Modifiers::empty(),
        }
    }
}

/// A resolved variable: field, parameter or local variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableBinding {
    /// Simple name
    pub name: String,
    /// Whether the variable is a field
    pub is_field: bool,
    /// Class declaring the field; `None` for locals and parameters
    pub declaring_class: Option<TypeBinding>,
    /// Declared type
    pub type_binding: Option<TypeBinding>,
    /// Declared modifiers
    pub modifiers: Modifiers,
}

impl VariableBinding {
    /// A field declared in `declaring_class`.
    pub fn field(
        declaring_class: TypeBinding,
        name: impl Into<String>,
        type_binding: TypeBinding,
    ) -> Self {
        Self {
            name: name.into(),
            is_field: true,
            declaring_class: Some(declaring_class),
            type_binding: Some(type_binding),
            modifiers: Modifiers::empty(),
        }
    }

    /// A local variable or parameter.
    pub fn local(name: impl Into<String>, type_binding: TypeBinding) -> Self {
        Self {
            name: name.into(),
            is_field: false,
            declaring_class: None,
            type_binding: Some(type_binding),
            modifiers: Modifiers::empty(),
        }
    }
}

/// What a simple or qualified name resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameBinding {
    /// A variable
    Variable(VariableBinding),
    /// A type name, e.g. the receiver in `Math.abs(x)`
    Type(TypeBinding),
    /// A package name
    Package(String),
}

/// The syntactic form of a type, used when no binding is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeNode {
    /// Primitive keyword (`int`, `void`, ...)
    Primitive(String),
    /// Unqualified name (`Vector`)
    Simple(String),
    /// Qualified name (`java.util.Vector`)
    Qualified(String),
    /// Array of an element type
    Array {
        /// Element type
        element: Box<TypeNode>,
        /// Number of dimensions
        dimensions: usize,
    },
    /// Parameterized type (`Vector<String>`)
    Parameterized {
        /// Generic type being instantiated
        base: Box<TypeNode>,
        /// Type arguments
        arguments: Vec<TypeNode>,
    },
    /// Wildcard type argument (`?`, `? extends T`)
    Wildcard,
}

impl TypeNode {
    /// Wrap a type in `dimensions` array levels, merging with existing ones.
    pub fn with_dimensions(self, dimensions: usize) -> Self {
        if dimensions == 0 {
            return self;
        }
        match self {
            TypeNode::Array {
                element,
                dimensions: inner,
            } => TypeNode::Array {
                element,
                dimensions: inner + dimensions,
            },
            other => TypeNode::Array {
                element: Box::new(other),
                dimensions,
            },
        }
    }

    /// Source-like rendering (`java.util.Map<K,V>[]`).
    pub fn render(&self) -> String {
        match self {
            TypeNode::Primitive(name) | TypeNode::Simple(name) | TypeNode::Qualified(name) => {
                name.clone()
            }
            TypeNode::Array {
                element,
                dimensions,
            } => format!("{}{}", element.render(), "[]".repeat(*dimensions)),
            TypeNode::Parameterized { base, arguments } => format!(
                "{}<{}>",
                base.render(),
                arguments
                    .iter()
                    .map(TypeNode::render)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            TypeNode::Wildcard => "?".to_string(),
        }
    }
}

/// A type as written in source, with its binding if one was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Location of the type in source
    pub span: Span,
    /// Syntactic form
    pub node: TypeNode,
    /// Resolved type, if any
    pub binding: Option<TypeBinding>,
}

impl TypeRef {
    /// A type reference without a binding.
    pub fn unbound(span: Span, node: TypeNode) -> Self {
        Self {
            span,
            node,
            binding: None,
        }
    }

    /// A type reference with a binding.
    pub fn bound(span: Span, node: TypeNode, binding: TypeBinding) -> Self {
        Self {
            span,
            node,
            binding: Some(binding),
        }
    }
}
