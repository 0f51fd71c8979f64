//! Type declarations and anonymous class bodies.

use crate::context::TraversalContext;
use crate::error::HandlerResult;
use crate::naming::{self, OBJECT_INITIALIZER};
use crate::scope::TypeFrame;
use factgraph::{AssociationKind, EntityId, EntityKind, Modifiers, SourceAnchor};
use factgraph_parser_api::{
    AnonymousClassDeclaration, Node, TypeDeclaration, TypeDeclarationKind, TypeRef,
};
use log::{debug, trace};

pub(super) fn type_declaration(
    cx: &mut TraversalContext<'_>,
    node: &Node,
    decl: &TypeDeclaration,
) -> HandlerResult<()> {
    let enclosing = cx.scope.current_type().cloned();
    let anchor = cx.anchor(node.span);
    let name = type_name(cx, decl, enclosing.as_ref(), &anchor);

    // Local classes belong to the method declaring them
    let parent = match &enclosing {
        Some(_) if cx.scope.in_method_of_current_type() => cx.current_method()?.0,
        Some(outer) => outer.entity,
        None => cx.package,
    };

    let class = cx.model.get_or_create(EntityKind::Class, &name);
    cx.model.declare(class, anchor)?;
    cx.model.set_parent(class, parent)?;
    let kind_modifier = match decl.kind {
        TypeDeclarationKind::Class => Modifiers::empty(),
        TypeDeclarationKind::Interface => Modifiers::INTERFACE,
        TypeDeclarationKind::Enum => Modifiers::ENUM,
    };
    cx.model.entity_mut(class)?.modifiers |= decl.modifiers | kind_modifier;
    cx.classes.push(class);
    debug!("Declared type {name}");

    if let Some(superclass) = &decl.superclass {
        link_supertype(cx, class, superclass, AssociationKind::Inheritance)?;
    }
    for interface in &decl.interfaces {
        link_supertype(cx, class, interface, AssociationKind::Subtyping)?;
    }

    type_body(
        cx,
        class,
        &name,
        decl.kind == TypeDeclarationKind::Interface,
        &decl.body,
    )
}

/// Create the class of an anonymous class declaration.
///
/// The class is owned by the innermost method, or by the innermost type when
/// the declaration sits directly in a type body.
pub(super) fn anonymous_class(
    cx: &mut TraversalContext<'_>,
    anon: &AnonymousClassDeclaration,
    name: &str,
    supertype: &TypeRef,
) -> HandlerResult<EntityId> {
    let parent = match cx.scope.current_method() {
        Some(method) => method.entity,
        None => cx.current_type()?.entity,
    };

    let class = cx.model.get_or_create(EntityKind::Class, name);
    let anchor = cx.anchor(anon.span);
    cx.model.declare(class, anchor)?;
    cx.model.set_parent(class, parent)?;
    cx.model.entity_mut(class)?.modifiers |= Modifiers::ANONYMOUS;
    cx.classes.push(class);

    let kind = if supertype.binding.as_ref().is_some_and(|b| b.is_interface()) {
        AssociationKind::Subtyping
    } else {
        AssociationKind::Inheritance
    };
    link_supertype(cx, class, supertype, kind)?;
    debug!("Declared anonymous type {name}");
    Ok(class)
}

/// Visit the members of a type with the type as the current one.
///
/// Classes get an object initializer on entry and, when no constructor was
/// declared, a default constructor on exit.
pub(super) fn type_body(
    cx: &mut TraversalContext<'_>,
    class: EntityId,
    name: &str,
    is_interface: bool,
    body: &[Node],
) -> HandlerResult<()> {
    cx.scope.seed_anonymous_counter(name);
    let mut scope = cx.type_scope(TypeFrame {
        entity: class,
        name: name.to_string(),
    });
    if !is_interface {
        scope.ensure_initializer(class, name, OBJECT_INITIALIZER)?;
    }

    scope.visit_all(body)?;

    if !is_interface {
        default_constructor(&mut scope, class, name)?;
    }
    Ok(())
}

fn default_constructor(
    cx: &mut TraversalContext<'_>,
    class: EntityId,
    name: &str,
) -> HandlerResult<()> {
    let prefix = naming::constructor_prefix(name);
    let declared = cx
        .model
        .children_of_kind(class, EntityKind::Method)
        .any(|m| m.unique_name.starts_with(&prefix));
    if declared {
        return Ok(());
    }

    let unique = naming::method_name(name, "", true, &[]);
    let constructor = cx.model.get_or_create(EntityKind::Method, &unique);
    cx.model.set_parent(constructor, class)?;
    cx.model.entity_mut(constructor)?.modifiers |= Modifiers::SYNTHETIC;
    cx.methods.push(constructor);
    trace!("Synthesized default constructor {unique}");
    Ok(())
}

fn link_supertype(
    cx: &mut TraversalContext<'_>,
    class: EntityId,
    supertype: &TypeRef,
    kind: AssociationKind,
) -> HandlerResult<()> {
    let name = naming::convert(supertype.binding.as_ref(), Some(&supertype.node));
    let target = cx.ensure_class(&name)?;
    if cx.model.has_association(kind, class, target) {
        return Ok(());
    }
    cx.link(kind, class, target, supertype.span)
}

/// Name of a declared type without a usable binding.
///
/// Member types are `Outer$Inner`. Local classes are numbered like the
/// compiler does (`Outer$1Local`) so that equally named local classes of
/// different methods stay distinct.
fn type_name(
    cx: &TraversalContext<'_>,
    decl: &TypeDeclaration,
    enclosing: Option<&TypeFrame>,
    anchor: &SourceAnchor,
) -> String {
    if let Some(name) = decl.binding.as_ref().and_then(naming::convert_binding) {
        return name;
    }
    let parameters = if decl.type_parameters.is_empty() {
        String::new()
    } else {
        format!("<{}>", decl.type_parameters.join(","))
    };
    let Some(outer) = enclosing else {
        return match cx.unit.package.as_deref() {
            Some(package) if !package.is_empty() => {
                format!("{package}.{}{parameters}", decl.name)
            }
            _ => format!("{}{parameters}", decl.name),
        };
    };
    let outer = naming::strip_generics(&outer.name);
    if !cx.scope.in_method_of_current_type() {
        return format!("{outer}${}{parameters}", decl.name);
    }

    let taken = |candidate: &str| {
        cx.model
            .lookup(EntityKind::Class, candidate)
            .and_then(|id| cx.model.entity(id).ok())
            .and_then(|class| class.anchor.as_ref())
            .is_some_and(|existing| existing != anchor)
    };
    let mut ordinal = 1;
    loop {
        let candidate = format!("{outer}${ordinal}{}{parameters}", decl.name);
        if !taken(&candidate) {
            return candidate;
        }
        ordinal += 1;
    }
}
