//! Field accesses.
//!
//! Every handler works out the declaring class of the field its own way and
//! then records the same Access association from the current method.

use crate::context::TraversalContext;
use crate::error::HandlerResult;
use crate::naming;
use factgraph::AssociationKind;
use factgraph_parser_api::{
    FieldAccess, NameBinding, Node, NodeKind, QualifiedName, SimpleName, SuperFieldAccess,
    VariableBinding,
};
use log::trace;

/// `expr.field`; `this.field` falls back to the current type when unbound.
pub(super) fn field_access(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    access: &FieldAccess,
) -> HandlerResult<()> {
    let declaring = match access.binding.as_ref() {
        Some(binding) => field_class(binding),
        None => match &access.receiver.kind {
            NodeKind::This(this) if this.qualifier.is_none() => {
                Some(cx.current_type()?.name)
            }
            _ => None,
        },
    };
    if let Some(class) = declaring {
        record_access(cx, node, &class, &access.name)?;
    }
    cx.visit(&access.receiver)
}

/// `super.field`; unbound, the field is looked up on the superclass.
pub(super) fn super_field_access(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    access: &SuperFieldAccess,
) -> HandlerResult<()> {
    let declaring = match access.binding.as_ref() {
        Some(binding) => field_class(binding),
        None => {
            let current = cx.current_type()?;
            cx.model
                .superclass_of(current.entity)
                .map(|s| cx.model.name_of(s).to_string())
        }
    };
    match declaring {
        Some(class) => record_access(cx, node, &class, &access.name),
        None => Ok(()),
    }
}

/// `a.b` where `b` may be a field of whatever `a` is.
pub(super) fn qualified_name(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    name: &QualifiedName,
) -> HandlerResult<()> {
    if let Some(NameBinding::Variable(binding)) = &name.binding {
        if let Some(class) = field_class(binding) {
            record_access(cx, node, &class, &name.name)?;
        }
    }
    cx.visit(&name.qualifier)
}

/// A bare identifier bound to a field.
pub(super) fn simple_name(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    name: &SimpleName,
) -> HandlerResult<()> {
    if let Some(NameBinding::Variable(binding)) = &name.binding {
        if let Some(class) = field_class(binding) {
            record_access(cx, node, &class, &name.identifier)?;
        }
    }
    Ok(())
}

/// Declaring class of a bound field; locals and parameters have none.
fn field_class(binding: &VariableBinding) -> Option<String> {
    if !binding.is_field {
        return None;
    }
    binding
        .declaring_class
        .as_ref()
        .and_then(naming::convert_binding)
}

fn record_access(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    class: &str,
    field: &str,
) -> HandlerResult<()> {
    let (method, _) = cx.current_method()?;
    let attribute = cx.ensure_attribute(class, field)?;
    trace!("Access to {class}.{field}");
    cx.link(AssociationKind::Access, method, attribute, node.span)
}
