//! # factgraph-java
//!
//! Java fact extractor for factgraph - turns Java compilation units into a
//! cross-referenced fact model and resolves invocations the front end could
//! not bind.
//!
//! ## Features
//!
//! - Lower Java source with tree-sitter into a bound syntax tree
//! - Extract packages, classes, methods, attributes, parameters and locals
//! - Record inheritance, subtyping, invocation, access, cast and instance-of
//!   associations
//! - Resolve unbound invocations after all units are traversed, narrowing
//!   candidates by name, receiver type and argument signature
//! - Full integration with factgraph-parser-api
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use factgraph::FactModel;
//! use factgraph_java::JavaFactExtractor;
//! use factgraph_parser_api::{FactExtractor, NoProgress};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = FactModel::new();
//! let extractor = JavaFactExtractor::new();
//!
//! let paths = vec![PathBuf::from("src/Main.java"), PathBuf::from("src/Util.java")];
//! let project = extractor.parse_files(&paths, &mut model, &NoProgress)?;
//! println!(
//!     "Extracted {} classes, resolved {} of {} deferred calls",
//!     project.total_classes(),
//!     project.resolution.unique,
//!     project.resolution.attempted
//! );
//! # Ok(())
//! # }
//! ```

mod context;
pub mod deferred;
mod error;
mod extractor;
mod handlers;
pub mod naming;
mod parser_impl;
pub mod scope;
mod syntax;

// Re-export parser-api types for convenience
pub use factgraph_parser_api::{
    CancellationFlag, CompilationUnit, ExtractError, ExtractorConfig, ExtractorMetrics,
    FactExtractor, NoProgress, ProgressMonitor, ProjectInfo, ResolutionSummary, UnitInfo,
};

pub use deferred::{
    ExpressionSummary, InvocationKind, Receiver, Resolution, ResolutionState,
    UnresolvedMethodInvocation,
};
pub use error::HandlerError;
pub use extractor::extract;
pub use parser_impl::JavaFactExtractor;
pub use syntax::lower;
