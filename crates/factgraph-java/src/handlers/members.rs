//! Methods, fields, initializers, blocks and variable declarations.

use crate::context::TraversalContext;
use crate::error::{HandlerError, HandlerResult};
use crate::naming::{self, CLASS_INITIALIZER, OBJECT_INITIALIZER};
use crate::scope::MethodFrame;
use factgraph::{EntityId, EntityKind, Modifiers};
use factgraph_parser_api::{
    Block, Expression, FieldDeclaration, Initializer, MethodDeclaration, Node, Span, TypeBinding,
    TypeRef, VariableDeclaration, VariableFragment,
};
use log::trace;

pub(super) fn method_declaration(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    decl: &MethodDeclaration,
) -> HandlerResult<()> {
    let class = cx.current_type()?;
    let parameter_types: Vec<String> = decl
        .parameters
        .iter()
        .map(|p| {
            let binding = p
                .type_ref
                .binding
                .as_ref()
                .or_else(|| p.binding.as_ref().and_then(|b| b.type_binding.as_ref()));
            naming::convert_for_signature(binding, Some(&p.type_ref.node))
        })
        .collect();
    let name = naming::method_name(
        &class.name,
        &decl.name,
        decl.is_constructor,
        &parameter_types,
    );

    // A placeholder created by an earlier invocation has the same identity
    // and is completed here rather than duplicated
    let method = cx.model.get_or_create(EntityKind::Method, &name);
    let anchor = cx.anchor(node.span);
    cx.model.declare(method, anchor)?;
    cx.model.set_parent(method, class.entity)?;
    let return_type = match (&decl.return_type, decl.is_constructor) {
        (Some(ret), false) => Some(declared_type(cx, ret)?),
        _ => None,
    };
    let entity = cx.model.entity_mut(method)?;
    entity.modifiers |= decl.modifiers;
    entity.parameter_types = parameter_types.clone();
    if return_type.is_some() {
        entity.declared_type = return_type;
    }
    cx.methods.push(method);
    trace!("Declared method {name}");

    let mut scope = cx.method_scope(MethodFrame::new(method, name.as_str(), class.entity));
    let parameters = decl.parameters.iter().zip(parameter_types);
    for (position, (param, signature)) in parameters.enumerate() {
        let unique = format!("{name}.{}", param.name);
        let parameter = scope.model.get_or_create(EntityKind::Parameter, &unique);
        let anchor = scope.anchor(param.span);
        scope.model.declare(parameter, anchor)?;
        scope.model.set_parent(parameter, method)?;
        let type_class = declared_type(&mut scope, &param.type_ref)?;
        let entity = scope.model.entity_mut(parameter)?;
        entity.position = Some(position);
        entity.modifiers |= param.modifiers;
        entity.declared_type = Some(type_class);
        entity.signature_type = Some(signature);
    }

    if let Some(body) = &decl.body {
        scope.visit(body)?;
    }
    Ok(())
}

pub(super) fn field_declaration(
    cx: &mut TraversalContext<'_>,
    decl: &FieldDeclaration,
) -> HandlerResult<()> {
    let class = cx.current_type()?;
    let in_interface = cx
        .model
        .entity(class.entity)?
        .modifiers
        .contains(Modifiers::INTERFACE);
    let is_static = in_interface || decl.modifiers.contains(Modifiers::STATIC);

    for fragment in &decl.fragments {
        let unique = naming::attribute_name(&class.name, &fragment.name);
        let attribute = cx.model.get_or_create(EntityKind::Attribute, &unique);
        let anchor = cx.anchor(fragment.span);
        cx.model.declare(attribute, anchor)?;
        cx.model.set_parent(attribute, class.entity)?;
        cx.model.entity_mut(attribute)?.modifiers |= decl.modifiers;
        variable_type(cx, attribute, &decl.type_ref, fragment)?;

        // Initializer side effects belong to the synthetic initializer method
        if let Some(initializer) = &fragment.initializer {
            let marker = if is_static {
                CLASS_INITIALIZER
            } else {
                OBJECT_INITIALIZER
            };
            let host = cx.ensure_initializer(class.entity, &class.name, marker)?;
            let host_name = naming::initializer_name(&class.name, marker);
            let mut scope = cx.method_scope(MethodFrame::new(host, host_name, class.entity));
            scope.visit(initializer)?;
        }
    }
    Ok(())
}

pub(super) fn initializer(
    cx: &mut TraversalContext<'_>,
    init: &Initializer,
) -> HandlerResult<()> {
    let class = cx.current_type()?;
    let marker = if init.is_static {
        CLASS_INITIALIZER
    } else {
        OBJECT_INITIALIZER
    };
    let host = cx.ensure_initializer(class.entity, &class.name, marker)?;
    let host_name = naming::initializer_name(&class.name, marker);
    let mut scope = cx.method_scope(MethodFrame::new(host, host_name, class.entity));
    scope.visit(&init.body)
}

pub(super) fn block(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    block: &Block,
) -> HandlerResult<()> {
    let mut scope = cx.block_scope(node.span);
    scope.visit_all(&block.statements)
}

pub(super) fn local_variables(
    cx: &mut TraversalContext<'_>,
    decl: &VariableDeclaration,
) -> HandlerResult<()> {
    for fragment in &decl.fragments {
        let local = declare_local(cx, &fragment.name, fragment.span)?;
        cx.model.entity_mut(local)?.modifiers |= decl.modifiers;
        variable_type(cx, local, &decl.type_ref, fragment)?;
        if let Some(initializer) = &fragment.initializer {
            cx.visit(initializer)?;
        }
    }
    Ok(())
}

/// Any other statement or expression: declare what it declares, then recurse.
pub(super) fn expression(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    expr: &Expression,
) -> HandlerResult<()> {
    if let Some((name, type_ref)) = &expr.declares {
        let local = declare_local(cx, name, node.span)?;
        let type_class = declared_type(cx, type_ref)?;
        let signature =
            naming::convert_for_signature(type_ref.binding.as_ref(), Some(&type_ref.node));
        let entity = cx.model.entity_mut(local)?;
        entity.declared_type = Some(type_class);
        entity.signature_type = Some(signature);
    }
    cx.visit_all(&expr.children)
}

/// Create a local variable of the current method, scoped to the current block.
fn declare_local(cx: &mut TraversalContext<'_>, name: &str, span: Span) -> HandlerResult<EntityId> {
    let frame = cx
        .scope
        .current_method()
        .cloned()
        .ok_or_else(|| HandlerError::fault(format!("local '{name}' outside of a method")))?;
    let unique = cx.scope.local_variable_name(frame.entity, &frame.name, name);
    let local = cx.model.get_or_create(EntityKind::LocalVariable, &unique);
    let anchor = cx.anchor(span);
    cx.model.declare(local, anchor)?;
    cx.model.set_parent(local, frame.entity)?;
    if let Some(block) = cx.current_block() {
        cx.scope.declare_local(local, block);
    }
    trace!("Declared local {unique}");
    Ok(local)
}

/// Record the declared and signature types of a variable fragment.
///
/// `int a[]` declares an array even though the type node is `int`.
fn variable_type(
    cx: &mut TraversalContext<'_>,
    variable: EntityId,
    type_ref: &TypeRef,
    fragment: &VariableFragment,
) -> HandlerResult<()> {
    let extra = fragment.extra_dimensions;
    let binding = match fragment.binding.as_ref().and_then(|b| b.type_binding.clone()) {
        Some(binding) => Some(binding),
        None => type_ref.binding.clone().map(|b| match extra {
            0 => b,
            _ => TypeBinding::array(b, extra),
        }),
    };
    let node = type_ref.node.clone().with_dimensions(extra);

    let type_class = cx.ensure_class(&naming::convert(binding.as_ref(), Some(&node)))?;
    let signature = naming::convert_for_signature(binding.as_ref(), Some(&node));
    let entity = cx.model.entity_mut(variable)?;
    entity.declared_type = Some(type_class);
    entity.signature_type = Some(signature);
    Ok(())
}

/// Class entity of a declared type.
fn declared_type(cx: &mut TraversalContext<'_>, type_ref: &TypeRef) -> HandlerResult<EntityId> {
    let name = naming::convert(type_ref.binding.as_ref(), Some(&type_ref.node));
    cx.ensure_class(&name)
}
