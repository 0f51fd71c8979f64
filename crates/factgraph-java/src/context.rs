//! Traversal state shared by the node handlers of one compilation unit.

use crate::deferred::UnresolvedMethodInvocation;
use crate::error::{HandlerError, HandlerResult};
use crate::handlers;
use crate::naming::{self, PRIMITIVE_PACKAGE};
use crate::scope::{BlockId, MethodFrame, ScopeTracker, TypeFrame};
use factgraph::{AssociationKind, EntityId, EntityKind, FactModel, Modifiers, SourceAnchor};
use factgraph_parser_api::{CharIndex, CompilationUnit, ExtractorConfig, Node, Span};
use log::warn;
use std::ops::{Deref, DerefMut};

/// Everything a handler may read or write while a unit is traversed.
pub struct TraversalContext<'a> {
    pub model: &'a mut FactModel,
    pub unit: &'a CompilationUnit,
    pub config: &'a ExtractorConfig,
    pub scope: ScopeTracker,
    /// Package entity of the unit
    pub package: EntityId,
    pub deferred: Vec<UnresolvedMethodInvocation>,
    /// Classes declared in the unit, in visit order
    pub classes: Vec<EntityId>,
    /// Methods declared or synthesized in the unit, in visit order
    pub methods: Vec<EntityId>,
    /// Nodes skipped because their handler faulted
    pub faults: usize,
    chars: CharIndex,
}

impl<'a> TraversalContext<'a> {
    pub fn new(
        model: &'a mut FactModel,
        unit: &'a CompilationUnit,
        config: &'a ExtractorConfig,
    ) -> Self {
        let package_name = unit.package.as_deref().unwrap_or(naming::DEFAULT_PACKAGE);
        let package = model.get_or_create(EntityKind::Package, package_name);
        Self {
            model,
            unit,
            config,
            scope: ScopeTracker::new(),
            package,
            deferred: Vec::new(),
            classes: Vec::new(),
            methods: Vec::new(),
            faults: 0,
            chars: CharIndex::new(&unit.source),
        }
    }

    /// Visit one node and, through its handler, its subtree.
    ///
    /// A recoverable fault skips the rest of the subtree and is logged with
    /// the enclosing method and class; only fatal errors are returned.
    pub fn visit(&mut self, node: &Node) -> HandlerResult<()> {
        self.check_scope()?;
        let result = handlers::dispatch(self, node);
        self.check_scope()?;
        match result {
            Err(e) if !e.is_fatal() => {
                warn!(
                    "Skipping {} at {} in method '{}' of class '{}': {e}",
                    node.kind_name(),
                    self.anchor(node.span),
                    self.scope
                        .current_method()
                        .map(|m| m.name.as_str())
                        .unwrap_or("-"),
                    self.scope
                        .current_type()
                        .map(|t| t.name.as_str())
                        .unwrap_or("-"),
                );
                self.faults += 1;
                Ok(())
            }
            other => other,
        }
    }

    /// Fail once a scope guard has recorded an unbalanced leave.
    fn check_scope(&mut self) -> HandlerResult<()> {
        match self.scope.take_violation() {
            Some(violation) => Err(violation.into()),
            None => Ok(()),
        }
    }

    /// Visit every child of `node` in source order.
    pub fn visit_children(&mut self, node: &Node) -> HandlerResult<()> {
        for child in node.children() {
            self.visit(child)?;
        }
        Ok(())
    }

    /// Visit a list of sibling nodes.
    pub fn visit_all<'n>(
        &mut self,
        nodes: impl IntoIterator<Item = &'n Node>,
    ) -> HandlerResult<()> {
        for node in nodes {
            self.visit(node)?;
        }
        Ok(())
    }

    /// Enter a nested type until the returned guard is dropped.
    pub fn type_scope<'c>(&'c mut self, frame: TypeFrame) -> TypeScope<'c, 'a> {
        let depth = self.scope.enter_nested_type(frame);
        TypeScope { cx: self, depth }
    }

    /// Enter a nested method until the returned guard is dropped.
    pub fn method_scope<'c>(&'c mut self, frame: MethodFrame) -> MethodScope<'c, 'a> {
        let depth = self.scope.enter_nested_method(frame);
        MethodScope { cx: self, depth }
    }

    /// Enter a statement block until the returned guard is dropped.
    pub fn block_scope<'c>(&'c mut self, span: Span) -> BlockScope<'c, 'a> {
        let block = self.scope.enter_block(span);
        BlockScope { cx: self, block }
    }

    /// The innermost type, or a fault when the traversal is outside any type.
    pub fn current_type(&self) -> HandlerResult<TypeFrame> {
        self.scope
            .current_type()
            .cloned()
            .ok_or_else(|| HandlerError::fault("no enclosing type"))
    }

    /// The innermost method entity and its class.
    pub fn current_method(&self) -> HandlerResult<(EntityId, EntityId)> {
        self.scope
            .current_method()
            .map(|m| (m.entity, m.class))
            .ok_or_else(|| HandlerError::fault("no enclosing method"))
    }

    /// Source anchor of a span in this unit.
    pub fn anchor(&self, span: Span) -> SourceAnchor {
        span.anchor(&self.unit.path)
    }

    /// Statement text of a span, empty when statements are not recorded.
    pub fn statement(&self, span: Span) -> String {
        if !self.config.record_statements {
            return String::new();
        }
        self.chars
            .text(&self.unit.source, span)
            .unwrap_or_default()
            .to_string()
    }

    /// Create an association anchored at `span`.
    pub fn link(
        &mut self,
        kind: AssociationKind,
        from: EntityId,
        to: EntityId,
        span: Span,
    ) -> HandlerResult<()> {
        let anchor = self.anchor(span);
        let statement = self.statement(span);
        self.model
            .add_association(kind, from, to, Some(anchor), statement)?;
        Ok(())
    }

    pub fn ensure_package(&mut self, name: &str) -> EntityId {
        self.model.get_or_create(EntityKind::Package, name)
    }

    /// The class named `name`, created with its package as parent if unknown.
    pub fn ensure_class(&mut self, name: &str) -> HandlerResult<EntityId> {
        let class = self.model.get_or_create(EntityKind::Class, name);
        if self.model.entity(class)?.parent().is_none() {
            let package_name = naming::package_of(name);
            let package = self.ensure_package(package_name);
            self.model.set_parent(class, package)?;
            if package_name == PRIMITIVE_PACKAGE {
                self.model.entity_mut(class)?.modifiers |= Modifiers::SYNTHETIC;
            }
        }
        Ok(class)
    }

    /// The method `unique_name` of `class_name`, created as a placeholder if unknown.
    pub fn ensure_method(
        &mut self,
        class_name: &str,
        unique_name: &str,
        parameter_types: Vec<String>,
    ) -> HandlerResult<EntityId> {
        let method = self.model.get_or_create(EntityKind::Method, unique_name);
        if self.model.entity(method)?.parent().is_none() {
            let class = self.ensure_class(class_name)?;
            self.model.set_parent(method, class)?;
            self.model.entity_mut(method)?.parameter_types = parameter_types;
        }
        Ok(method)
    }

    /// A synthetic initializer method (`<oinit>` or `<clinit>`) of `class`.
    pub fn ensure_initializer(
        &mut self,
        class: EntityId,
        class_name: &str,
        marker: &str,
    ) -> HandlerResult<EntityId> {
        let name = naming::initializer_name(class_name, marker);
        let existed = self.model.lookup(EntityKind::Method, &name).is_some();
        let method = self.model.get_or_create(EntityKind::Method, &name);
        self.model.set_parent(method, class)?;
        let entity = self.model.entity_mut(method)?;
        entity.modifiers |= Modifiers::SYNTHETIC;
        if marker == naming::CLASS_INITIALIZER {
            entity.modifiers |= Modifiers::STATIC;
        }
        if !existed {
            self.methods.push(method);
        }
        Ok(method)
    }

    /// The attribute `field` of `class_name`, created as a placeholder if unknown.
    pub fn ensure_attribute(&mut self, class_name: &str, field: &str) -> HandlerResult<EntityId> {
        let unique = naming::attribute_name(class_name, field);
        let attribute = self.model.get_or_create(EntityKind::Attribute, &unique);
        if self.model.entity(attribute)?.parent().is_none() {
            let class = self.ensure_class(class_name)?;
            self.model.set_parent(attribute, class)?;
        }
        Ok(attribute)
    }

    /// Block currently open in the innermost method.
    pub fn current_block(&self) -> Option<BlockId> {
        self.scope.current_block()
    }
}

/// Keeps a nested type on the scope stack; pops it on drop.
pub struct TypeScope<'c, 'a> {
    cx: &'c mut TraversalContext<'a>,
    depth: usize,
}

/// Keeps a nested method on the scope stack; pops it on drop.
pub struct MethodScope<'c, 'a> {
    cx: &'c mut TraversalContext<'a>,
    depth: usize,
}

/// Keeps a statement block open; closes it on drop.
pub struct BlockScope<'c, 'a> {
    cx: &'c mut TraversalContext<'a>,
    block: BlockId,
}

impl BlockScope<'_, '_> {
    pub fn id(&self) -> BlockId {
        self.block
    }
}

macro_rules! deref_to_context {
    ($guard:ident) => {
        impl<'a> Deref for $guard<'_, 'a> {
            type Target = TraversalContext<'a>;

            fn deref(&self) -> &Self::Target {
                &*self.cx
            }
        }

        impl<'a> DerefMut for $guard<'_, 'a> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut *self.cx
            }
        }
    };
}

deref_to_context!(TypeScope);
deref_to_context!(MethodScope);
deref_to_context!(BlockScope);

// Drop cannot fail; an unbalanced leave is recorded and checked on the next visit.

impl Drop for TypeScope<'_, '_> {
    fn drop(&mut self) {
        if let Err(e) = self.cx.scope.leave_nested_type(self.depth) {
            self.cx.scope.record_violation(e);
        }
    }
}

impl Drop for MethodScope<'_, '_> {
    fn drop(&mut self) {
        if let Err(e) = self.cx.scope.leave_nested_method(self.depth) {
            self.cx.scope.record_violation(e);
        }
    }
}

impl Drop for BlockScope<'_, '_> {
    fn drop(&mut self) {
        if let Err(e) = self.cx.scope.leave_block(self.block) {
            self.cx.scope.record_violation(e);
        }
    }
}
