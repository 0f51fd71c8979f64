//! One handler per syntax node kind.
//!
//! A handler does its entry work, visits the children it wants visited, and
//! leaves any scope it entered when its guard goes out of scope. Returning an
//! error before visiting children skips the subtree.

mod access;
mod checks;
mod invocations;
mod members;
mod types;

use crate::context::TraversalContext;
use crate::error::HandlerResult;
use factgraph_parser_api::{Node, NodeKind};

pub(crate) fn dispatch(cx: &mut TraversalContext<'_>, node: &Node) -> HandlerResult<()> {
    match &node.kind {
        NodeKind::TypeDeclaration(decl) => types::type_declaration(cx, node, decl),
        NodeKind::MethodDeclaration(decl) => members::method_declaration(cx, node, decl),
        NodeKind::FieldDeclaration(decl) => members::field_declaration(cx, decl),
        NodeKind::Initializer(init) => members::initializer(cx, init),
        NodeKind::Block(block) => members::block(cx, node, block),
        NodeKind::LocalVariableDeclaration(decl) => members::local_variables(cx, decl),
        NodeKind::MethodInvocation(call) => invocations::method_invocation(cx, node, call),
        NodeKind::SuperMethodInvocation(call) => {
            invocations::super_method_invocation(cx, node, call)
        }
        NodeKind::ConstructorInvocation(call) => {
            invocations::constructor_invocation(cx, node, call)
        }
        NodeKind::SuperConstructorInvocation(call) => {
            invocations::super_constructor_invocation(cx, node, call)
        }
        NodeKind::ClassInstanceCreation(call) => {
            invocations::class_instance_creation(cx, node, call)
        }
        NodeKind::FieldAccess(access) => access::field_access(cx, node, access),
        NodeKind::SuperFieldAccess(access) => access::super_field_access(cx, node, access),
        NodeKind::QualifiedName(name) => access::qualified_name(cx, node, name),
        NodeKind::SimpleName(name) => access::simple_name(cx, node, name),
        NodeKind::Cast(cast) => checks::cast(cx, node, cast),
        NodeKind::InstanceOf(check) => checks::instance_of(cx, node, check),
        NodeKind::Expression(expr) => members::expression(cx, node, expr),
        // `this` has nothing to record
        NodeKind::This(_) => Ok(()),
    }
}
