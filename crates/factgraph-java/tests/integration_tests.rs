//! Integration tests for the Java fact extractor

use factgraph::export::export_json;
use factgraph::{AssociationKind, EntityId, EntityKind, FactModel, Modifiers};
use factgraph_java::{
    CancellationFlag, CompilationUnit, ExtractorConfig, FactExtractor, JavaFactExtractor,
    NoProgress, Resolution, UnresolvedMethodInvocation,
};
use std::path::{Path, PathBuf};

const SHAPES: &str = include_str!("fixtures/Shapes.java");
const PRINTER: &str = include_str!("fixtures/Printer.java");
const LISTENERS: &str = include_str!("fixtures/Listeners.java");
const SHADOW: &str = include_str!("fixtures/Shadow.java");
const GREETER: &str = include_str!("fixtures/Greeter.java");

fn lower(extractor: &JavaFactExtractor, source: &str, path: &str) -> CompilationUnit {
    extractor.lower(source, Path::new(path)).unwrap()
}

fn id(model: &FactModel, kind: EntityKind, name: &str) -> EntityId {
    model
        .lookup(kind, name)
        .unwrap_or_else(|| panic!("missing {kind:?} {name}"))
}

/// Character range of the first occurrence of `fragment` in `source`.
fn char_range(source: &str, fragment: &str) -> (usize, usize) {
    let byte = source
        .find(fragment)
        .unwrap_or_else(|| panic!("fragment not in source: {fragment}"));
    let start = source[..byte].chars().count();
    (start, start + fragment.chars().count())
}

fn invokes(model: &FactModel, caller: &str, callee: &str) -> bool {
    model.has_association(
        AssociationKind::Invocation,
        id(model, EntityKind::Method, caller),
        id(model, EntityKind::Method, callee),
    )
}

fn accesses(model: &FactModel, method: &str, attribute: &str) -> bool {
    model.has_association(
        AssociationKind::Access,
        id(model, EntityKind::Method, method),
        id(model, EntityKind::Attribute, attribute),
    )
}

#[test]
fn test_shapes_hierarchy_and_members() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let unit = lower(&extractor, SHAPES, "Shapes.java");
    let project = extractor
        .extract_units(&[unit], &mut model, &NoProgress)
        .unwrap();

    assert_eq!(project.units.len(), 1);
    assert_eq!(project.total_classes(), 2);

    let base = id(&model, EntityKind::Class, "shapes.Base");
    let sum = id(&model, EntityKind::Class, "shapes.Sum");
    assert_eq!(model.superclass_of(sum), Some(base));
    assert_eq!(
        model.entity(sum).unwrap().parent(),
        model.lookup(EntityKind::Package, "shapes")
    );

    // Base declares no constructor, so one is synthesized
    let default_ctor = id(&model, EntityKind::Method, "shapes.Base.<init>()");
    let entity = model.entity(default_ctor).unwrap();
    assert!(entity.modifiers.contains(Modifiers::SYNTHETIC));
    assert!(!entity.is_declared());
    assert!(model
        .lookup(EntityKind::Method, "shapes.Sum.<init>()")
        .is_none());

    let parameter = id(&model, EntityKind::Parameter, "shapes.Sum.<init>(int[]).values");
    let parameter = model.entity(parameter).unwrap();
    assert_eq!(parameter.signature_type.as_deref(), Some("int[]"));
    assert_eq!(parameter.position, Some(0));

    assert!(accesses(&model, "shapes.Base.compute()", "shapes.Base.total"));
    assert!(accesses(&model, "shapes.Sum.<init>(int[])", "shapes.Sum.values"));
    assert!(accesses(&model, "shapes.Sum.compute()", "shapes.Sum.values"));

    let local = id(&model, EntityKind::LocalVariable, "shapes.Sum.compute().v");
    assert_eq!(
        model.entity(local).unwrap().signature_type.as_deref(),
        Some("int")
    );
}

#[test]
fn test_super_calls_resolve_through_superclass() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let unit = lower(&extractor, SHAPES, "Shapes.java");
    let project = extractor
        .extract_units(&[unit], &mut model, &NoProgress)
        .unwrap();

    assert_eq!(project.resolution.attempted, 3);
    assert_eq!(project.resolution.unique, 2);
    assert_eq!(project.resolution.ambiguous, 1);
    assert_eq!(project.resolution.linked, 2);

    assert!(invokes(&model, "shapes.Sum.<init>(int[])", "shapes.Base.<init>()"));
    assert!(invokes(&model, "shapes.Sum.compute()", "shapes.Base.compute()"));

    // `sum.compute()` may run either override and is left unlinked
    assert!(!invokes(
        &model,
        "shapes.Sum.twice(shapes.Sum)",
        "shapes.Sum.compute()"
    ));
    assert!(!invokes(
        &model,
        "shapes.Sum.twice(shapes.Sum)",
        "shapes.Base.compute()"
    ));
    let twice = project
        .deferred
        .iter()
        .find(|r| r.method_name == "compute" && r.statement.starts_with("sum."))
        .unwrap();
    assert_eq!(twice.receiver_type.as_deref(), Some("shapes.Sum"));
    assert!(matches!(twice.best_match(), Resolution::Ambiguous(c) if c.len() == 2));
}

#[test]
fn test_ambiguous_calls_link_to_first_when_configured() {
    let extractor = JavaFactExtractor::with_config(
        ExtractorConfig::default().with_link_ambiguous_to_first(true),
    );
    let mut model = FactModel::new();
    let unit = lower(&extractor, SHAPES, "Shapes.java");
    let project = extractor
        .extract_units(&[unit], &mut model, &NoProgress)
        .unwrap();

    assert_eq!(project.resolution.linked, 3);
    let caller = id(&model, EntityKind::Method, "shapes.Sum.twice(shapes.Sum)");
    assert_eq!(
        model
            .associations_from(caller)
            .filter(|a| a.kind == AssociationKind::Invocation)
            .count(),
        1
    );
}

#[test]
fn test_overloads_resolve_by_signature() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let unit = lower(&extractor, PRINTER, "Printer.java");
    let project = extractor
        .extract_units(&[unit], &mut model, &NoProgress)
        .unwrap();

    let caller = "util.Printer.run(int[],int[][])";
    assert!(invokes(&model, caller, "util.Printer.print(int)"));
    assert!(invokes(&model, caller, "util.Printer.print(int[])"));
    assert!(invokes(&model, caller, "util.Printer.print(int[][])"));
    assert!(invokes(&model, caller, "util.Printer.print(java.lang.String)"));

    // `print(null)` has no argument type to choose an overload by
    assert_eq!(project.resolution.attempted, 5);
    assert_eq!(project.resolution.unique, 4);
    assert_eq!(project.resolution.unresolved, 1);
}

#[test]
fn test_cascade_stages_only_narrow() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let units = vec![
        lower(&extractor, SHAPES, "Shapes.java"),
        lower(&extractor, PRINTER, "Printer.java"),
        lower(&extractor, LISTENERS, "Listeners.java"),
    ];
    let project = extractor
        .extract_units(&units, &mut model, &NoProgress)
        .unwrap();

    let subset = |inner: &[EntityId], outer: &[EntityId]| inner.iter().all(|x| outer.contains(x));
    assert!(!project.deferred.is_empty());
    for record in &project.deferred {
        assert!(record.is_resolved());
        assert!(subset(&record.matches_by_nr_of_parameters, &record.matches_by_name));
        assert!(subset(
            &record.matches_by_call_receiver_type_subtyping,
            &record.matches_by_nr_of_parameters
        ));
        assert!(subset(
            &record.matches_by_all_parameters_type,
            &record.matches_by_call_receiver_type_subtyping
        ));
        assert!(subset(
            &record.matches_by_all_parameters_type_soft,
            &record.matches_by_call_receiver_type_subtyping
        ));
    }
}

#[test]
fn test_anonymous_classes_are_numbered_per_type() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let unit = lower(&extractor, LISTENERS, "Listeners.java");
    extractor.extract_unit(&unit, &mut model).unwrap();

    let runnable = id(&model, EntityKind::Class, "java.lang.Runnable");

    let field_anon = id(&model, EntityKind::Class, "events.Listeners$0!");
    let entity = model.entity(field_anon).unwrap();
    assert!(entity.modifiers.contains(Modifiers::ANONYMOUS));
    assert_eq!(
        entity.parent(),
        model.lookup(EntityKind::Method, "events.Listeners.<oinit>()")
    );
    assert!(model.has_association(AssociationKind::Subtyping, field_anon, runnable));

    let local_anon = id(&model, EntityKind::Class, "events.Listeners$1!");
    assert_eq!(
        model.entity(local_anon).unwrap().parent(),
        model.lookup(EntityKind::Method, "events.Listeners.register()")
    );
    assert!(model
        .lookup(EntityKind::Class, "events.Listeners$2!")
        .is_none());

    assert!(invokes(
        &model,
        "events.Listeners.<oinit>()",
        "events.Listeners$0!.<init>()"
    ));
    assert!(invokes(
        &model,
        "events.Listeners.register()",
        "events.Listeners$1!.<init>()"
    ));
    assert!(model
        .lookup(EntityKind::Method, "events.Listeners$1!.run()")
        .is_some());
}

#[test]
fn test_locals_shadow_fields() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let unit = lower(&extractor, SHADOW, "Shadow.java");
    extractor
        .extract_units(&[unit], &mut model, &NoProgress)
        .unwrap();

    // Sibling blocks declare distinct locals of the same name
    let first = id(&model, EntityKind::LocalVariable, "scope.Shadow.first().count");
    let second = id(&model, EntityKind::LocalVariable, "scope.Shadow.first().count#1");
    assert_ne!(first, second);
    assert_eq!(model.entity(second).unwrap().simple_name(), "count");

    assert!(!accesses(&model, "scope.Shadow.first()", "scope.Shadow.name"));
    assert!(accesses(&model, "scope.Shadow.second()", "scope.Shadow.name"));

    let target = "scope.Shadow.use(java.lang.String)";
    assert!(invokes(&model, "scope.Shadow.first()", target));
    assert!(invokes(&model, "scope.Shadow.second()", target));
}

#[test]
fn test_extracting_twice_keeps_identities() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let unit = lower(&extractor, SHADOW, "Shadow.java");

    extractor.extract_unit(&unit, &mut model).unwrap();
    let entities = model.entity_count();
    let class = id(&model, EntityKind::Class, "scope.Shadow");

    extractor.extract_unit(&unit, &mut model).unwrap();
    assert_eq!(model.entity_count(), entities);
    assert_eq!(id(&model, EntityKind::Class, "scope.Shadow"), class);
}

#[test]
fn test_parse_files_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths: Vec<PathBuf> = Vec::new();
    for (name, source) in [
        ("Shapes.java", SHAPES),
        ("Printer.java", PRINTER),
        ("Broken.java", "class Broken {"),
    ] {
        let path = dir.path().join(name);
        std::fs::write(&path, source).unwrap();
        paths.push(path);
    }

    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let project = extractor
        .parse_files(&paths, &mut model, &NoProgress)
        .unwrap();

    assert_eq!(project.units.len(), 2);
    assert_eq!(project.failed_units.len(), 1);
    assert!(project.failed_units[0].0.ends_with("Broken.java"));
    assert_eq!(project.resolution.attempted, 8);
    assert!(invokes(
        &model,
        "util.Printer.run(int[],int[][])",
        "util.Printer.print(int)"
    ));
}

#[test]
fn test_oversized_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Printer.java");
    std::fs::write(&path, PRINTER).unwrap();

    let extractor = JavaFactExtractor::with_config(ExtractorConfig::default().with_max_file_size(16));
    let mut model = FactModel::new();
    let result = extractor.parse_file(&path, &mut model);
    assert!(result.is_err());
    assert_eq!(model.entity_count(), 0);
}

#[test]
fn test_cancelled_run_skips_resolution() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let units = vec![
        lower(&extractor, SHAPES, "Shapes.java"),
        lower(&extractor, PRINTER, "Printer.java"),
    ];

    let flag = CancellationFlag::new();
    flag.cancel();
    let project = extractor.extract_units(&units, &mut model, &flag).unwrap();

    assert!(project.cancelled);
    assert!(project.units.is_empty());
    assert_eq!(project.resolution.attempted, 0);
}

#[test]
fn test_deferred_pass_can_run_separately() {
    let extractor =
        JavaFactExtractor::with_config(ExtractorConfig::default().with_resolve_deferred(false));
    let mut model = FactModel::new();
    let unit = lower(&extractor, PRINTER, "Printer.java");
    let mut project = extractor
        .extract_units(&[unit], &mut model, &NoProgress)
        .unwrap();

    assert_eq!(project.deferred.len(), 5);
    assert!(project.deferred.iter().all(|r| !r.is_resolved()));

    let summary = extractor
        .resolve_deferred(&mut model, &mut project.deferred)
        .unwrap();
    assert_eq!(summary.unique, 4);

    // Records resolved once are not linked again
    let again = extractor
        .resolve_deferred(&mut model, &mut project.deferred)
        .unwrap();
    assert_eq!(again.attempted, 0);
    assert!(project
        .deferred
        .iter()
        .all(UnresolvedMethodInvocation::is_resolved));
}

#[test]
fn test_json_export_of_extracted_model() {
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let unit = lower(&extractor, SHAPES, "Shapes.java");
    extractor
        .extract_units(&[unit], &mut model, &NoProgress)
        .unwrap();

    let doc: serde_json::Value = serde_json::from_str(&export_json(&model).unwrap()).unwrap();
    let entities = doc["entities"].as_array().unwrap();
    let sum = entities
        .iter()
        .find(|e| e["name"] == "shapes.Sum")
        .unwrap();
    assert_eq!(sum["parent"], "shapes");
    assert!(!doc["associations"].as_array().unwrap().is_empty());
}

#[test]
fn test_anchors_count_characters() {
    assert!(!GREETER.is_ascii());
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    let unit = lower(&extractor, GREETER, "Greeter.java");
    let project = extractor
        .extract_units(&[unit], &mut model, &NoProgress)
        .unwrap();
    assert_eq!(project.resolution.unique, 1);

    let span_of = |kind: EntityKind, name: &str| {
        let anchor = model
            .entity(id(&model, kind, name))
            .unwrap()
            .anchor
            .clone()
            .unwrap();
        (anchor.start, anchor.end)
    };

    let class_start = char_range(GREETER, "public class Greeter").0;
    let class_end = GREETER.trim_end().chars().count();
    assert_eq!(
        span_of(EntityKind::Class, "intl.Greeter"),
        (class_start, class_end)
    );
    assert_eq!(
        span_of(EntityKind::Attribute, "intl.Greeter.greeting"),
        char_range(GREETER, "greeting = \"héllo wörld ✓\"")
    );
    assert_eq!(
        span_of(EntityKind::Method, "intl.Greeter.greet()"),
        char_range(GREETER, "void greet() {\n        say(greeting);\n    }")
    );

    let greet = id(&model, EntityKind::Method, "intl.Greeter.greet()");
    let call = model
        .associations_from(greet)
        .find(|a| a.kind == AssociationKind::Invocation)
        .expect("greet() links to say(String)");
    let anchor = call.anchor.as_ref().unwrap();
    assert_eq!((anchor.start, anchor.end), char_range(GREETER, "say(greeting)"));
    assert_eq!(call.statement, "say(greeting)");

    let access = model
        .associations_from(greet)
        .find(|a| a.kind == AssociationKind::Access)
        .expect("greet() reads greeting");
    assert_eq!(access.statement, "greeting");
    let (call_start, _) = char_range(GREETER, "say(greeting)");
    assert_eq!(
        access.anchor.as_ref().map(|a| a.start),
        Some(call_start + "say(".len())
    );
}

#[test]
fn test_type_variables_use_their_erasure() {
    let source = "package generic;\n\
                  class Holder<T extends Number> {\n\
                  T value;\n\
                  <U> void put(U u, T t) {}\n\
                  }\n";
    let extractor = JavaFactExtractor::new();
    let mut model = FactModel::new();
    extractor
        .parse_source(source, Path::new("Holder.java"), &mut model)
        .unwrap();

    let put = model
        .entities_of_kind(EntityKind::Method)
        .find(|m| m.simple_name() == "put")
        .unwrap();
    assert_eq!(
        put.parameter_types,
        vec!["java.lang.Object".to_string(), "java.lang.Number".to_string()]
    );

    let value = model
        .entities_of_kind(EntityKind::Attribute)
        .find(|a| a.simple_name() == "value")
        .unwrap();
    assert_eq!(value.signature_type.as_deref(), Some("java.lang.Number"));

    // No class stands in for the type parameters themselves
    for name in ["T", "U", "<undef>.T", "<default>.T"] {
        assert!(model.lookup(EntityKind::Class, name).is_none(), "{name}");
    }
}
