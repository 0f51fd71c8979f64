//! Casts and `instanceof` checks.

use crate::context::TraversalContext;
use crate::error::HandlerResult;
use crate::naming;
use factgraph::AssociationKind;
use factgraph_parser_api::{CastExpression, InstanceOfExpression, Node, TypeRef};

pub(super) fn cast(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    cast: &CastExpression,
) -> HandlerResult<()> {
    record_check(cx, node, &cast.type_ref, AssociationKind::CastTo)?;
    cx.visit(&cast.expression)
}

pub(super) fn instance_of(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    check: &InstanceOfExpression,
) -> HandlerResult<()> {
    record_check(cx, node, &check.type_ref, AssociationKind::CheckInstanceOf)?;
    cx.visit(&check.expression)
}

fn record_check(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    type_ref: &TypeRef,
    kind: AssociationKind,
) -> HandlerResult<()> {
    let (method, _) = cx.current_method()?;
    let name = naming::convert(type_ref.binding.as_ref(), Some(&type_ref.node));
    let class = cx.ensure_class(&name)?;
    cx.link(kind, method, class, node.span)
}
