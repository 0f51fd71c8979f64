//! factgraph Parser API
//!
//! Shared contracts for building factgraph fact extractors.
//!
//! This crate sits between a language front end and the fact model. It defines:
//!
//! - **AST**: a closed sum type over the syntax node kinds extractors handle
//! - **Bindings**: optional compiler-resolved type, method and variable facts
//! - **FactExtractor trait**: the interface every language extractor implements
//! - **Progress**: a cancellation signal consulted between compilation units
//! - **Configuration**: customizable extractor behavior
//! - **Metrics**: performance and resolution tracking
//! - **Error handling**: extraction error types
//!
//! # Example
//!
//! ```rust,ignore
//! use factgraph::FactModel;
//! use factgraph_parser_api::{FactExtractor, NoProgress};
//!
//! let extractor = MyExtractor::default();
//! let mut model = FactModel::new();
//! let project = extractor.extract_units(&units, &mut model, &NoProgress)?;
//! println!("{} deferred invocations", project.deferred.len());
//! ```

#![warn(missing_docs)]

pub mod ast;
pub mod binding;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod traits;


// Re-export commonly used types
pub use ast::{
    AnonymousClassDeclaration, Block, CastExpression, CharIndex, ClassInstanceCreation,
    CompilationUnit, ConstructorInvocation, Expression, FieldAccess, FieldDeclaration,
    FormalParameter, Initializer, InstanceOfExpression, MethodDeclaration, MethodInvocation, Node,
    NodeKind, QualifiedName, SimpleName, Span, SuperConstructorInvocation, SuperFieldAccess,
    SuperMethodInvocation, ThisExpression, TypeDeclaration, TypeDeclarationKind,
    VariableDeclaration, VariableFragment,
};
pub use binding::{
    MethodBinding, NameBinding, TypeBinding, TypeBindingKind, TypeNode, TypeRef, VariableBinding,
};
pub use config::ExtractorConfig;
pub use errors::{ExtractError, ExtractResult};
pub use metrics::ExtractorMetrics;
pub use traits::{
    extract_units_sequential, CancellationFlag, FactExtractor, NoProgress, ProgressMonitor,
    ProjectInfo, ResolutionSummary, UnitInfo,
};
