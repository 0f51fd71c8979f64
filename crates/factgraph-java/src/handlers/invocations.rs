//! The five invocation kinds.
//!
//! A call whose method binding and argument types are all known is linked on
//! the spot. Anything else becomes an [`UnresolvedMethodInvocation`] that
//! carries the variables in scope at the call site.

use super::types;
use crate::context::TraversalContext;
use crate::deferred::{
    ExpressionSummary, InvocationKind, Receiver, ScopeSnapshot, UnresolvedMethodInvocation,
};
use crate::error::HandlerResult;
use crate::naming::{self, CONSTRUCTOR_MARKER, UNDEFINED};
use factgraph::{AssociationKind, Modifiers};
use factgraph_parser_api::{
    ClassInstanceCreation, ConstructorInvocation, MethodBinding, MethodInvocation, Node,
    NodeKind, SuperConstructorInvocation, SuperMethodInvocation, TypeBinding, TypeBindingKind,
};
use log::{debug, trace};

pub(super) fn method_invocation(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    call: &MethodInvocation,
) -> HandlerResult<()> {
    if !link_bound(cx, node, call.binding.as_ref(), &call.arguments)? {
        let receiver = match call.receiver.as_deref() {
            None => Receiver::Implicit,
            Some(Node {
                kind: NodeKind::This(this),
                ..
            }) if this.qualifier.is_none() => Receiver::Implicit,
            Some(expr) => Receiver::Expression(summarize(cx, expr)),
        };
        defer(
            cx,
            node,
            InvocationKind::Method,
            &call.name,
            receiver,
            &call.arguments,
        )?;
    }
    cx.visit_children(node)
}

pub(super) fn super_method_invocation(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    call: &SuperMethodInvocation,
) -> HandlerResult<()> {
    if !link_bound(cx, node, call.binding.as_ref(), &call.arguments)? {
        defer(
            cx,
            node,
            InvocationKind::SuperMethod,
            &call.name,
            Receiver::Super,
            &call.arguments,
        )?;
    }
    cx.visit_children(node)
}

pub(super) fn constructor_invocation(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    call: &ConstructorInvocation,
) -> HandlerResult<()> {
    if !link_bound(cx, node, call.binding.as_ref(), &call.arguments)? {
        let class = cx.current_type()?;
        defer(
            cx,
            node,
            InvocationKind::Constructor,
            CONSTRUCTOR_MARKER,
            Receiver::Type(class.name),
            &call.arguments,
        )?;
    }
    cx.visit_children(node)
}

pub(super) fn super_constructor_invocation(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    call: &SuperConstructorInvocation,
) -> HandlerResult<()> {
    if !link_bound(cx, node, call.binding.as_ref(), &call.arguments)? {
        defer(
            cx,
            node,
            InvocationKind::SuperConstructor,
            CONSTRUCTOR_MARKER,
            Receiver::Super,
            &call.arguments,
        )?;
    }
    cx.visit_children(node)
}

/// `new T(..)`, optionally with an anonymous class body.
///
/// An anonymous class gets the next ordinal of the enclosing type whether or
/// not its binding names it, and its creation always invokes the class's own
/// constructor with the argument types of the call.
pub(super) fn class_instance_creation(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    call: &ClassInstanceCreation,
) -> HandlerResult<()> {
    let Some(anon) = &call.anonymous else {
        if !link_bound(cx, node, call.binding.as_ref(), &call.arguments)? {
            let type_ref = &call.type_ref;
            let class = naming::convert(type_ref.binding.as_ref(), Some(&type_ref.node));
            defer(
                cx,
                node,
                InvocationKind::ClassInstanceCreation,
                CONSTRUCTOR_MARKER,
                Receiver::Type(class),
                &call.arguments,
            )?;
        }
        return cx.visit_children(node);
    };

    let enclosing = cx.current_type()?;
    let ordinal = cx.scope.next_anonymous_ordinal(&enclosing.name);
    let name = anon
        .binding
        .as_ref()
        .and_then(naming::convert_binding)
        .unwrap_or_else(|| naming::anonymous_name(&enclosing.name, ordinal));

    let class = types::anonymous_class(cx, anon, &name, &call.type_ref)?;

    let (caller, _) = cx.current_method()?;
    let argument_types: Vec<String> = call
        .arguments
        .iter()
        .map(|arg| {
            summarize(cx, arg)
                .signature_type
                .unwrap_or_else(|| UNDEFINED.to_string())
        })
        .collect();
    let constructor_name = naming::method_name(&name, "", true, &argument_types);
    let constructor = cx.ensure_method(&name, &constructor_name, argument_types)?;
    cx.model.entity_mut(constructor)?.modifiers |= Modifiers::SYNTHETIC;
    cx.methods.push(constructor);
    cx.link(AssociationKind::Invocation, caller, constructor, node.span)?;

    if let Some(receiver) = &call.receiver {
        cx.visit(receiver)?;
    }
    cx.visit_all(&call.arguments)?;
    types::type_body(cx, class, &name, false, &anon.body)
}

/// Link a call whose callee is fully known; returns false when it is not.
fn link_bound(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    binding: Option<&MethodBinding>,
    arguments: &[Node],
) -> HandlerResult<bool> {
    let Some(binding) = binding else {
        return Ok(false);
    };
    if !arguments.iter().all(|arg| is_resolved(arg.type_binding())) {
        return Ok(false);
    }
    let Some((class, unique)) = naming::convert_method_binding(binding) else {
        return Ok(false);
    };

    let (caller, _) = cx.current_method()?;
    let callee = cx.ensure_method(&class, &unique, naming::binding_parameter_types(binding))?;
    if let Some(return_type) = &binding.return_type {
        if cx.model.entity(callee)?.declared_type.is_none() {
            let type_class = cx.ensure_class(&naming::convert(Some(return_type), None))?;
            cx.model.entity_mut(callee)?.declared_type = Some(type_class);
        }
    }
    cx.link(AssociationKind::Invocation, caller, callee, node.span)?;
    trace!("Linked bound invocation of {unique}");
    Ok(true)
}

/// Capture an unresolved call together with the variables in scope.
fn defer(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    kind: InvocationKind,
    method_name: &str,
    receiver: Receiver,
    arguments: &[Node],
) -> HandlerResult<()> {
    let (caller, caller_class) = cx.current_method()?;
    let scope = ScopeSnapshot::capture(&*cx.model, &cx.scope, caller, cx.current_block());
    let arguments = arguments.iter().map(|arg| summarize(cx, arg)).collect();
    let record = UnresolvedMethodInvocation::new(
        kind,
        caller,
        caller_class,
        method_name,
        cx.anchor(node.span),
    )
    .with_receiver(receiver)
    .with_arguments(arguments)
    .with_scope(scope)
    .with_statement(cx.statement(node.span));

    debug!(
        "Deferred {method_name} in {} ({} variables in scope)",
        cx.model.name_of(caller),
        record.scope.len()
    );
    cx.deferred.push(record);
    Ok(())
}

/// What is known about an argument or receiver expression.
fn summarize(cx: &TraversalContext<'_>, expr: &Node) -> ExpressionSummary {
    // `null` is resolved but has no type a parameter could declare
    let binding = expr
        .type_binding()
        .filter(|b| b.kind != TypeBindingKind::Null && is_resolved(Some(b)));
    ExpressionSummary {
        text: cx.statement(expr.span),
        type_name: binding.and_then(naming::convert_binding),
        signature_type: binding.map(|b| naming::convert_for_signature(Some(b), None)),
        name: expr.name(),
    }
}

/// Whether the compiler resolved an expression's type.
fn is_resolved(binding: Option<&TypeBinding>) -> bool {
    match binding {
        None => false,
        Some(b) if b.kind == TypeBindingKind::Null => true,
        Some(b) if b.is_array() => b
            .element
            .as_deref()
            .is_some_and(|e| naming::convert_binding(e).is_some()),
        Some(b) => naming::convert_binding(b).is_some(),
    }
}
