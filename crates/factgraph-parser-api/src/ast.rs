//! The Java syntax tree consumed by extractors.
//!
//! The tree is a closed sum type over the node kinds extractors handle. Any
//! other statement or expression is folded into [`NodeKind::Expression`],
//! which keeps its children and, when known, its type.

use factgraph::{Modifiers, SourceAnchor};
use serde::{Deserialize, Serialize};

use crate::binding::{MethodBinding, NameBinding, TypeBinding, TypeRef, VariableBinding};

/// A source range: character offset into the unit's source plus length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start offset
    pub start: usize,
    /// Length of the range
    pub length: usize,
}

impl Span {
    /// Create a span.
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create a span from a half-open `[start, end)` range.
    pub fn from_range(start: usize, end: usize) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Whether `other` lies within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// Anchor this span in a file.
    pub fn anchor(&self, file: &str) -> SourceAnchor {
        SourceAnchor::new(file, self.start, self.length)
    }

}

/// Character positions of a source text.
///
/// Spans count characters while parsers and `str` slicing count bytes; the
/// index converts between the two. ASCII sources need no table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharIndex {
    /// Byte offset of every character, followed by the source length
    starts: Vec<usize>,
}

impl CharIndex {
    /// Index the characters of `source`.
    pub fn new(source: &str) -> Self {
        if source.is_ascii() {
            return Self::default();
        }
        let mut starts: Vec<usize> = source.char_indices().map(|(i, _)| i).collect();
        starts.push(source.len());
        Self { starts }
    }

    /// Character offset of a byte offset.
    ///
    /// A byte inside a multi-byte character maps to the character after it.
    pub fn char_offset(&self, byte: usize) -> usize {
        if self.starts.is_empty() {
            return byte;
        }
        self.starts.partition_point(|&start| start < byte)
    }

    /// Byte offset of a character offset, if it lies within the source.
    pub fn byte_offset(&self, char_offset: usize) -> Option<usize> {
        if self.starts.is_empty() {
            return Some(char_offset);
        }
        self.starts.get(char_offset).copied()
    }

    /// Character span of a half-open byte range.
    pub fn span(&self, start_byte: usize, end_byte: usize) -> Span {
        Span::from_range(self.char_offset(start_byte), self.char_offset(end_byte))
    }

    /// Source text covered by a character span, if it lies within `source`.
    pub fn text<'a>(&self, source: &'a str, span: Span) -> Option<&'a str> {
        let start = self.byte_offset(span.start)?;
        let end = self.byte_offset(span.end())?;
        source.get(start..end)
    }
}

/// One parsed Java source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Logical path of the file
    pub path: String,
    /// Raw source text
    pub source: String,
    /// Declared package, `None` for the default package
    pub package: Option<String>,
    /// Imported names as written (`java.util.List`, `java.util.*`)
    pub imports: Vec<String>,
    /// Top-level type declarations ([`NodeKind::TypeDeclaration`] nodes)
    pub types: Vec<Node>,
}

impl CompilationUnit {
    /// An empty unit with the given path and source.
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Package name used for entity naming; the default package is `""`.
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }
}

/// A syntax node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Location in source
    pub span: Span,
    /// What the node is
    pub kind: NodeKind,
}

/// Every node kind an extractor distinguishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Class, interface or enum declaration
    TypeDeclaration(TypeDeclaration),
    /// Method or constructor declaration
    MethodDeclaration(MethodDeclaration),
    /// Field declaration, possibly with several fragments
    FieldDeclaration(FieldDeclaration),
    /// Instance or static initializer block
    Initializer(Initializer),
    /// Statement block
    Block(Block),
    /// Local variable declaration statement
    LocalVariableDeclaration(VariableDeclaration),
    /// `recv.name(args)` or `name(args)`
    MethodInvocation(MethodInvocation),
    /// `super.name(args)`
    SuperMethodInvocation(SuperMethodInvocation),
    /// `this(args)`
    ConstructorInvocation(ConstructorInvocation),
    /// `super(args)`
    SuperConstructorInvocation(SuperConstructorInvocation),
    /// `new T(args)`, optionally with an anonymous body
    ClassInstanceCreation(ClassInstanceCreation),
    /// `expr.name`
    FieldAccess(FieldAccess),
    /// `super.name`
    SuperFieldAccess(SuperFieldAccess),
    /// `a.b` where the qualifier is a name
    QualifiedName(QualifiedName),
    /// `name`
    SimpleName(SimpleName),
    /// `this` or `Outer.this`
    This(ThisExpression),
    /// `(T) expr`
    Cast(CastExpression),
    /// `expr instanceof T`
    InstanceOf(InstanceOfExpression),
    /// Any other expression or statement
    Expression(Expression),
}

/// Flavour of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDeclarationKind {
    /// `class`
    Class,
    /// `interface`
    Interface,
    /// `enum`
    Enum,
}

/// Class, interface or enum declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Flavour of declaration
    pub kind: TypeDeclarationKind,
    /// Simple name
    pub name: String,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Compiler binding of the declared type
    pub binding: Option<TypeBinding>,
    /// Declared type parameters
    pub type_parameters: Vec<String>,
    /// `extends` clause of a class
    pub superclass: Option<TypeRef>,
    /// `implements` clause, or `extends` clause of an interface
    pub interfaces: Vec<TypeRef>,
    /// Members and enum constants, in source order
    pub body: Vec<Node>,
}

/// Formal parameter of a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormalParameter {
    /// Location of the parameter
    pub span: Span,
    /// Parameter name
    pub name: String,
    /// Declared type, including extra dimensions and varargs
    pub type_ref: TypeRef,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Compiler binding of the parameter
    pub binding: Option<VariableBinding>,
}

/// Method or constructor declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    /// Simple name
    pub name: String,
    /// Whether this declares a constructor
    pub is_constructor: bool,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Compiler binding of the declared method
    pub binding: Option<MethodBinding>,
    /// Formal parameters in declaration order
    pub parameters: Vec<FormalParameter>,
    /// Declared return type; `None` for constructors
    pub return_type: Option<TypeRef>,
    /// Body block; `None` for abstract and native methods
    pub body: Option<Box<Node>>,
}

/// One declarator in a field or local variable declaration (`a = 1` in `int a = 1, b;`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableFragment {
    /// Location of the declarator
    pub span: Span,
    /// Variable name
    pub name: String,
    /// Extra array dimensions written after the name (`int a[]`)
    pub extra_dimensions: usize,
    /// Compiler binding of the variable
    pub binding: Option<VariableBinding>,
    /// Initializer expression
    pub initializer: Option<Box<Node>>,
}

/// Field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Declared type
    pub type_ref: TypeRef,
    /// Declarators, in source order
    pub fragments: Vec<VariableFragment>,
}

/// Local variable declaration statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Declared type
    pub type_ref: TypeRef,
    /// Declarators, in source order
    pub fragments: Vec<VariableFragment>,
}

/// Instance (`{ .. }`) or static (`static { .. }`) initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initializer {
    /// Whether this is a static initializer
    pub is_static: bool,
    /// Body block
    pub body: Box<Node>,
}

/// Statement block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Statements in source order
    pub statements: Vec<Node>,
}

/// `recv.name(args)` or `name(args)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInvocation {
    /// Invoked method name
    pub name: String,
    /// Explicit receiver expression
    pub receiver: Option<Box<Node>>,
    /// Argument expressions
    pub arguments: Vec<Node>,
    /// Compiler binding of the invoked method
    pub binding: Option<MethodBinding>,
    /// Type of the invocation expression
    pub type_binding: Option<TypeBinding>,
}

/// `super.name(args)` or `Outer.super.name(args)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperMethodInvocation {
    /// Invoked method name
    pub name: String,
    /// Type qualifier before `super`
    pub qualifier: Option<String>,
    /// Argument expressions
    pub arguments: Vec<Node>,
    /// Compiler binding of the invoked method
    pub binding: Option<MethodBinding>,
    /// Type of the invocation expression
    pub type_binding: Option<TypeBinding>,
}

/// `this(args)` inside a constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorInvocation {
    /// Argument expressions
    pub arguments: Vec<Node>,
    /// Compiler binding of the invoked constructor
    pub binding: Option<MethodBinding>,
}

/// `super(args)` or `outer.super(args)` inside a constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperConstructorInvocation {
    /// Outer instance expression
    pub receiver: Option<Box<Node>>,
    /// Argument expressions
    pub arguments: Vec<Node>,
    /// Compiler binding of the invoked constructor
    pub binding: Option<MethodBinding>,
}

/// Body of an anonymous class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymousClassDeclaration {
    /// Location of the body
    pub span: Span,
    /// Compiler binding of the anonymous class
    pub binding: Option<TypeBinding>,
    /// Members in source order
    pub body: Vec<Node>,
}

/// `new T(args)`, `outer.new T(args)` or `new T(args) { .. }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInstanceCreation {
    /// Instantiated type
    pub type_ref: TypeRef,
    /// Outer instance expression
    pub receiver: Option<Box<Node>>,
    /// Argument expressions
    pub arguments: Vec<Node>,
    /// Compiler binding of the invoked constructor
    pub binding: Option<MethodBinding>,
    /// Anonymous class body
    pub anonymous: Option<AnonymousClassDeclaration>,
}

/// `expr.name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAccess {
    /// Receiver expression
    pub receiver: Box<Node>,
    /// Field name
    pub name: String,
    /// Compiler binding of the field
    pub binding: Option<VariableBinding>,
}

/// `super.name` or `Outer.super.name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperFieldAccess {
    /// Type qualifier before `super`
    pub qualifier: Option<String>,
    /// Field name
    pub name: String,
    /// Compiler binding of the field
    pub binding: Option<VariableBinding>,
}

/// `a.b` where `a` is itself a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Qualifier ([`NodeKind::SimpleName`] or [`NodeKind::QualifiedName`])
    pub qualifier: Box<Node>,
    /// Last segment
    pub name: String,
    /// What the whole name resolves to
    pub binding: Option<NameBinding>,
}

impl QualifiedName {
    /// Dotted rendering of the whole name.
    pub fn full_name(&self) -> String {
        match self.qualifier.name() {
            Some(prefix) => format!("{prefix}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A simple name used as an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleName {
    /// The identifier
    pub identifier: String,
    /// What the name resolves to
    pub binding: Option<NameBinding>,
}

/// `this` or `Outer.this`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThisExpression {
    /// Type qualifier before `this`
    pub qualifier: Option<String>,
    /// Type of the expression
    pub binding: Option<TypeBinding>,
}

/// `(T) expr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastExpression {
    /// Target type
    pub type_ref: TypeRef,
    /// Operand
    pub expression: Box<Node>,
}

/// `expr instanceof T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceOfExpression {
    /// Operand
    pub expression: Box<Node>,
    /// Tested type
    pub type_ref: TypeRef,
    /// Type of the expression (`boolean`)
    pub type_binding: Option<TypeBinding>,
}

/// Any expression or statement without a dedicated node kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// Type of the expression, for literals and operators the front end could type
    pub type_binding: Option<TypeBinding>,
    /// Name of the variable this node declares, for catch and enhanced-for
    /// parameters that act as locals
    pub declares: Option<(String, TypeRef)>,
    /// Nested nodes in source order
    pub children: Vec<Node>,
}

impl Node {
    /// Create a node.
    pub fn new(span: Span, kind: NodeKind) -> Self {
        Self { span, kind }
    }

    /// A block node.
    pub fn block(span: Span, statements: Vec<Node>) -> Self {
        Self::new(span, NodeKind::Block(Block { statements }))
    }

    /// A simple name expression.
    pub fn simple_name(span: Span, identifier: impl Into<String>) -> Self {
        Self::new(
            span,
            NodeKind::SimpleName(SimpleName {
                identifier: identifier.into(),
                binding: None,
            }),
        )
    }

    /// An opaque expression with a known type and no children.
    pub fn typed_expression(span: Span, type_binding: TypeBinding) -> Self {
        Self::new(
            span,
            NodeKind::Expression(Expression {
                type_binding: Some(type_binding),
                ..Default::default()
            }),
        )
    }

    /// Short name of the node kind, for log messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::TypeDeclaration(_) => "TypeDeclaration",
            NodeKind::MethodDeclaration(_) => "MethodDeclaration",
            NodeKind::FieldDeclaration(_) => "FieldDeclaration",
            NodeKind::Initializer(_) => "Initializer",
            NodeKind::Block(_) => "Block",
            NodeKind::LocalVariableDeclaration(_) => "LocalVariableDeclaration",
            NodeKind::MethodInvocation(_) => "MethodInvocation",
            NodeKind::SuperMethodInvocation(_) => "SuperMethodInvocation",
            NodeKind::ConstructorInvocation(_) => "ConstructorInvocation",
            NodeKind::SuperConstructorInvocation(_) => "SuperConstructorInvocation",
            NodeKind::ClassInstanceCreation(_) => "ClassInstanceCreation",
            NodeKind::FieldAccess(_) => "FieldAccess",
            NodeKind::SuperFieldAccess(_) => "SuperFieldAccess",
            NodeKind::QualifiedName(_) => "QualifiedName",
            NodeKind::SimpleName(_) => "SimpleName",
            NodeKind::This(_) => "This",
            NodeKind::Cast(_) => "Cast",
            NodeKind::InstanceOf(_) => "InstanceOf",
            NodeKind::Expression(_) => "Expression",
        }
    }

    /// The static type of an expression node, when a binding provides it.
    pub fn type_binding(&self) -> Option<&TypeBinding> {
        match &self.kind {
            NodeKind::MethodInvocation(n) => n.type_binding.as_ref(),
            NodeKind::SuperMethodInvocation(n) => n.type_binding.as_ref(),
            NodeKind::ClassInstanceCreation(n) => n
                .anonymous
                .as_ref()
                .and_then(|a| a.binding.as_ref())
                .or(n.type_ref.binding.as_ref()),
            NodeKind::FieldAccess(n) => n.binding.as_ref().and_then(|b| b.type_binding.as_ref()),
            NodeKind::SuperFieldAccess(n) => {
                n.binding.as_ref().and_then(|b| b.type_binding.as_ref())
            }
            NodeKind::QualifiedName(n) => name_type(n.binding.as_ref()),
            NodeKind::SimpleName(n) => name_type(n.binding.as_ref()),
            NodeKind::This(n) => n.binding.as_ref(),
            NodeKind::Cast(n) => n.type_ref.binding.as_ref(),
            NodeKind::InstanceOf(n) => n.type_binding.as_ref(),
            NodeKind::Expression(n) => n.type_binding.as_ref(),
            _ => None,
        }
    }

    /// Dotted name for simple and qualified name nodes.
    pub fn name(&self) -> Option<String> {
        match &self.kind {
            NodeKind::SimpleName(n) => Some(n.identifier.clone()),
            NodeKind::QualifiedName(n) => Some(n.full_name()),
            _ => None,
        }
    }

    /// Direct children in source order.
    ///
    /// Anonymous class bodies and method bodies are included so that a
    /// generic walk reaches every nested node.
    pub fn children(&self) -> Vec<&Node> {
        let mut out: Vec<&Node> = Vec::new();
        match &self.kind {
            NodeKind::TypeDeclaration(n) => out.extend(&n.body),
            NodeKind::MethodDeclaration(n) => out.extend(n.body.as_deref()),
            NodeKind::FieldDeclaration(n) => {
                out.extend(n.fragments.iter().filter_map(|f| f.initializer.as_deref()))
            }
            NodeKind::LocalVariableDeclaration(n) => {
                out.extend(n.fragments.iter().filter_map(|f| f.initializer.as_deref()))
            }
            NodeKind::Initializer(n) => out.push(&n.body),
            NodeKind::Block(n) => out.extend(&n.statements),
            NodeKind::MethodInvocation(n) => {
                out.extend(n.receiver.as_deref());
                out.extend(&n.arguments);
            }
            NodeKind::SuperMethodInvocation(n) => out.extend(&n.arguments),
            NodeKind::ConstructorInvocation(n) => out.extend(&n.arguments),
            NodeKind::SuperConstructorInvocation(n) => {
                out.extend(n.receiver.as_deref());
                out.extend(&n.arguments);
            }
            NodeKind::ClassInstanceCreation(n) => {
                out.extend(n.receiver.as_deref());
                out.extend(&n.arguments);
                if let Some(anonymous) = &n.anonymous {
                    out.extend(&anonymous.body);
                }
            }
            NodeKind::FieldAccess(n) => out.push(&n.receiver),
            NodeKind::QualifiedName(n) => out.push(&n.qualifier),
            NodeKind::Cast(n) => out.push(&n.expression),
            NodeKind::InstanceOf(n) => out.push(&n.expression),
            NodeKind::Expression(n) => out.extend(&n.children),
            NodeKind::SuperFieldAccess(_) | NodeKind::SimpleName(_) | NodeKind::This(_) => {}
        }
        out
    }

    /// Number of nodes in this subtree, including the node itself.
    pub fn subtree_size(&self) -> usize {
        1 + self.children().iter().map(|c| c.subtree_size()).sum::<usize>()
    }
}

fn name_type(binding: Option<&NameBinding>) -> Option<&TypeBinding> {
    match binding? {
        NameBinding::Variable(v) => v.type_binding.as_ref(),
        NameBinding::Type(t) => Some(t),
        NameBinding::Package(_) => None,
    }
}
