//! Deferred resolution of invocations whose callee was unknown during traversal.
//!
//! Records are captured by the invocation handlers together with a snapshot
//! of the variables in scope. Once every unit is in the model, each record
//! narrows the set of all known methods through the stages in [`cascade`].

pub mod cascade;
mod record;
mod resolver;
mod snapshot;

pub use cascade::MethodIndex;
pub use record::{
    ExpressionSummary, InvocationKind, Receiver, Resolution, ResolutionState,
    UnresolvedMethodInvocation,
};
pub use resolver::{resolve_all, resolve_and_link};
pub use snapshot::ScopeSnapshot;
