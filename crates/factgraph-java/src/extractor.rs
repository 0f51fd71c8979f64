//! Traversal of one compilation unit into the fact model

use crate::context::TraversalContext;
use crate::deferred::UnresolvedMethodInvocation;
use factgraph::FactModel;
use factgraph_parser_api::{CompilationUnit, ExtractError, ExtractorConfig, UnitInfo};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Traverse `unit` into `model`, returning its deferred invocations unresolved.
///
/// Node faults are logged and skipped. Unbalanced scopes and conflicting
/// declarations abort the unit; whatever was added before stays in the model.
pub fn extract(
    unit: &CompilationUnit,
    model: &mut FactModel,
    config: &ExtractorConfig,
) -> Result<UnitInfo<UnresolvedMethodInvocation>, ExtractError> {
    let start = Instant::now();
    let path = PathBuf::from(&unit.path);
    let entities_before = model.entity_count();
    let associations_before = model.association_count();

    let mut cx = TraversalContext::new(model, unit, config);
    for node in &unit.types {
        cx.visit(node)
            .map_err(|e| ExtractError::Invariant(path.clone(), e.to_string()))?;
    }
    if !cx.scope.is_balanced() {
        return Err(ExtractError::Invariant(
            path,
            "scope stacks not empty after traversal".to_string(),
        ));
    }

    let TraversalContext {
        deferred,
        classes,
        methods,
        faults,
        ..
    } = cx;
    if faults > 0 {
        info!("{}: skipped {faults} faulty nodes", unit.path);
    }

    let mut info = UnitInfo::new(path);
    info.classes = classes;
    info.methods = methods;
    info.entities_created = model.entity_count() - entities_before;
    info.associations_created = model.association_count() - associations_before;
    info.deferred_count = deferred.len();
    info.deferred = deferred;
    info.time = start.elapsed();
    info.line_count = unit.source.lines().count();
    info.byte_count = unit.source.len();

    debug!(
        "Extracted {}: {} classes, {} methods, {} deferred invocations",
        unit.path,
        info.classes.len(),
        info.methods.len(),
        info.deferred_count
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgraph::{AssociationKind, EntityKind, Modifiers};
    use factgraph_parser_api::{
        Expression, FieldDeclaration, MethodDeclaration, MethodInvocation, Node, NodeKind, Span,
        TypeDeclaration, TypeDeclarationKind, TypeNode, TypeRef, VariableFragment,
    };

    fn class(name: &str, span: Span, body: Vec<Node>) -> Node {
        Node::new(
            span,
            NodeKind::TypeDeclaration(TypeDeclaration {
                kind: TypeDeclarationKind::Class,
                name: name.into(),
                modifiers: Modifiers::empty(),
                binding: None,
                type_parameters: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                body,
            }),
        )
    }

    fn call(name: &str, span: Span) -> Node {
        Node::new(
            span,
            NodeKind::MethodInvocation(MethodInvocation {
                name: name.into(),
                receiver: None,
                arguments: Vec::new(),
                binding: None,
                type_binding: None,
            }),
        )
    }

    fn method(name: &str, span: Span, statements: Vec<Node>) -> Node {
        Node::new(
            span,
            NodeKind::MethodDeclaration(MethodDeclaration {
                name: name.into(),
                is_constructor: false,
                modifiers: Modifiers::empty(),
                binding: None,
                parameters: Vec::new(),
                return_type: Some(TypeRef::unbound(span, TypeNode::Primitive("void".into()))),
                body: Some(Box::new(Node::block(span, statements))),
            }),
        )
    }

    #[test]
    fn test_default_constructor_synthesized() {
        let mut unit = CompilationUnit::new("A.java", "class A {}");
        unit.package = Some("p".into());
        unit.types.push(class("A", Span::new(0, 10), Vec::new()));

        let mut model = FactModel::new();
        let info = extract(&unit, &mut model, &ExtractorConfig::default()).unwrap();

        let class = model.lookup(EntityKind::Class, "p.A").unwrap();
        let ctor = model.lookup(EntityKind::Method, "p.A.<init>()").unwrap();
        assert_eq!(model.entity(ctor).unwrap().parent(), Some(class));
        assert!(model.entity(ctor).unwrap().modifiers.contains(Modifiers::SYNTHETIC));
        assert!(info.methods.contains(&ctor));
        assert_eq!(info.classes, vec![class]);
        let package = model.lookup(EntityKind::Package, "p").unwrap();
        assert_eq!(model.entity(class).unwrap().parent(), Some(package));
    }

    #[test]
    fn test_static_initializer_hosts_field_initializer_calls() {
        let source = "class A { static int x = init(); void run() { go(); } }";
        let field = Node::new(
            Span::new(10, 22),
            NodeKind::FieldDeclaration(FieldDeclaration {
                modifiers: Modifiers::STATIC,
                type_ref: TypeRef::unbound(Span::new(17, 3), TypeNode::Primitive("int".into())),
                fragments: vec![VariableFragment {
                    span: Span::new(21, 10),
                    name: "x".into(),
                    extra_dimensions: 0,
                    binding: None,
                    initializer: Some(Box::new(call("init", Span::new(25, 6)))),
                }],
            }),
        );
        let run = method("run", Span::new(33, 20), vec![call("go", Span::new(46, 4))]);
        let mut unit = CompilationUnit::new("A.java", source);
        unit.types.push(class("A", Span::new(0, source.len()), vec![field, run]));

        let mut model = FactModel::new();
        let info = extract(&unit, &mut model, &ExtractorConfig::default()).unwrap();

        let clinit = model.lookup(EntityKind::Method, "A.<clinit>()").unwrap();
        let run = model.lookup(EntityKind::Method, "A.run()").unwrap();
        let callers: Vec<_> = info
            .deferred
            .iter()
            .map(|d| (d.method_name.as_str(), d.caller))
            .collect();
        assert_eq!(callers, vec![("init", clinit), ("go", run)]);

        let attribute = model.lookup(EntityKind::Attribute, "A.x").unwrap();
        let int = model.lookup(EntityKind::Class, "int").unwrap();
        assert_eq!(model.entity(attribute).unwrap().declared_type, Some(int));
        assert!(model.lookup(EntityKind::Method, "A.<oinit>()").is_some());
    }

    #[test]
    fn test_faulty_node_is_skipped() {
        // A local declaration directly in a type body has no enclosing method
        let stray = Node::new(
            Span::new(10, 5),
            NodeKind::Expression(Expression {
                declares: Some((
                    "tmp".into(),
                    TypeRef::unbound(Span::new(10, 3), TypeNode::Primitive("int".into())),
                )),
                ..Default::default()
            }),
        );
        let mut unit = CompilationUnit::new("A.java", "class A { int tmp; }");
        unit.types.push(class("A", Span::new(0, 20), vec![stray]));

        let mut model = FactModel::new();
        let info = extract(&unit, &mut model, &ExtractorConfig::default()).unwrap();
        assert_eq!(info.classes.len(), 1);
        assert_eq!(model.entities_of_kind(EntityKind::LocalVariable).count(), 0);
    }

    #[test]
    fn test_conflicting_declaration_aborts_unit() {
        let mut unit = CompilationUnit::new("A.java", "class A {} class A {}");
        unit.types.push(class("A", Span::new(0, 10), Vec::new()));
        unit.types.push(class("A", Span::new(11, 10), Vec::new()));

        let mut model = FactModel::new();
        let err = extract(&unit, &mut model, &ExtractorConfig::default()).unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(model.lookup(EntityKind::Class, "A").is_some());
    }

    #[test]
    fn test_bound_invocations_are_not_deferred() {
        use factgraph_parser_api::{MethodBinding, TypeBinding};

        let mut bound = call("helper", Span::new(30, 8));
        if let NodeKind::MethodInvocation(inv) = &mut bound.kind {
            inv.binding = Some(MethodBinding::method(
                TypeBinding::class("A"),
                "helper",
                Vec::new(),
                TypeBinding::primitive("void"),
            ));
        }
        let mut unit = CompilationUnit::new("A.java", "class A { void run() { helper(); } }");
        unit.types.push(class(
            "A",
            Span::new(0, 37),
            vec![method("run", Span::new(10, 25), vec![bound])],
        ));

        let mut model = FactModel::new();
        let info = extract(&unit, &mut model, &ExtractorConfig::default()).unwrap();
        assert!(info.deferred.is_empty());

        let run = model.lookup(EntityKind::Method, "A.run()").unwrap();
        let helper = model.lookup(EntityKind::Method, "A.helper()").unwrap();
        assert!(model.has_association(AssociationKind::Invocation, run, helper));
        assert!(!model.entity(helper).unwrap().is_declared());
    }
}
