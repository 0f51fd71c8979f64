//! Identity and ownership invariants of the fact model.

use factgraph::{AssociationKind, EntityKind, FactModel, SourceAnchor};

#[test]
fn test_get_or_create_twice_returns_same_instance() {
    let mut model = FactModel::new();
    let kinds = [
        EntityKind::Package,
        EntityKind::Class,
        EntityKind::Method,
        EntityKind::Attribute,
        EntityKind::Parameter,
        EntityKind::LocalVariable,
    ];

    for kind in kinds {
        let first = model.get_or_create(kind, "shapes.Sum");
        let second = model.get_or_create(kind, "shapes.Sum");
        assert_eq!(first, second, "{kind} identity must be stable");
    }

    // One entry per kind, never two for the same pair.
    assert_eq!(model.entity_count(), kinds.len());
}

#[test]
fn test_placeholder_is_completed_in_place() {
    let mut model = FactModel::new();

    // A call site creates the callee before its declaration is seen.
    let placeholder = model.get_or_create(EntityKind::Method, "shapes.Sum.compute()");
    assert!(!model.entity(placeholder).unwrap().is_declared());

    // The declaration reuses and completes the same entity.
    let class = model.get_or_create(EntityKind::Class, "shapes.Sum");
    let declared = model.get_or_create(EntityKind::Method, "shapes.Sum.compute()");
    model.set_parent(declared, class).unwrap();
    model
        .declare(declared, SourceAnchor::new("Sum.java", 40, 22))
        .unwrap();

    assert_eq!(placeholder, declared);
    assert_eq!(
        model
            .entities_of_kind(EntityKind::Method)
            .filter(|m| m.unique_name == "shapes.Sum.compute()")
            .count(),
        1
    );
    assert_eq!(model.entity(class).unwrap().children(), &[declared]);
}

#[test]
fn test_class_children_enumerate_members() {
    let mut model = FactModel::new();
    let class = model.get_or_create(EntityKind::Class, "a.Outer");
    let inner = model.get_or_create(EntityKind::Class, "a.Outer$Inner");
    let method = model.get_or_create(EntityKind::Method, "a.Outer.run()");
    let field = model.get_or_create(EntityKind::Attribute, "a.Outer.count");

    for child in [inner, method, field] {
        model.set_parent(child, class).unwrap();
    }

    assert_eq!(model.entity(class).unwrap().children().len(), 3);
    assert_eq!(model.children_of_kind(class, EntityKind::Method).count(), 1);
}

#[test]
fn test_touching_lookup_covers_both_directions() {
    let mut model = FactModel::new();
    let a = model.get_or_create(EntityKind::Method, "A.a()");
    let b = model.get_or_create(EntityKind::Method, "B.b()");
    let c = model.get_or_create(EntityKind::Method, "C.c()");

    model
        .add_association(AssociationKind::Invocation, a, b, None, "b()")
        .unwrap();
    model
        .add_association(AssociationKind::Invocation, b, c, None, "c()")
        .unwrap();

    assert_eq!(model.associations_touching(b).len(), 2);
    assert_eq!(model.associations_touching(a).len(), 1);
    assert_eq!(model.associations_of_kind(AssociationKind::Invocation).count(), 2);
}
