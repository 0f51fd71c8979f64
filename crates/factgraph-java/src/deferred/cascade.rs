//! Candidate narrowing stages.
//!
//! Each stage takes the previous stage's candidates and returns the subset
//! that passes its predicate, preserving order. Stages never add candidates.

use crate::naming::is_undefined;
use factgraph::{EntityId, EntityKind, FactModel};
use std::collections::{HashMap, HashSet};

/// Method entities grouped by simple name, in model order.
///
/// Built once per resolution pass; looking a name up is the same as filtering
/// every method in the model by simple name.
#[derive(Debug, Default, Clone)]
pub struct MethodIndex {
    by_name: HashMap<String, Vec<EntityId>>,
}

impl MethodIndex {
    /// Index every method currently in the model.
    pub fn build(model: &FactModel) -> Self {
        let mut by_name: HashMap<String, Vec<EntityId>> = HashMap::new();
        for method in model.entities_of_kind(EntityKind::Method) {
            by_name
                .entry(method.simple_name().to_string())
                .or_default()
                .push(method.id);
        }
        Self { by_name }
    }

    /// Methods with the given simple name.
    pub fn named(&self, name: &str) -> &[EntityId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct method names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the model had no methods.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Parameter type comparison used by the last stage.
pub type TypeMatcher = fn(&str, &str) -> bool;

/// Stage 1: methods with the invoked simple name.
pub fn by_name(index: &MethodIndex, name: &str) -> Vec<EntityId> {
    index.named(name).to_vec()
}

/// Stage 2: methods declaring exactly `count` parameters.
pub fn by_parameter_count(
    model: &FactModel,
    previous: &[EntityId],
    count: usize,
) -> Vec<EntityId> {
    previous
        .iter()
        .copied()
        .filter(|id| {
            model
                .entity(*id)
                .map(|m| m.parameter_types.len() == count)
                .unwrap_or(false)
        })
        .collect()
}

/// Stage 3: methods declared by the receiver type or one of its supertypes.
///
/// `receiver_closure` is the receiver's name plus all of its supertype names.
pub fn by_receiver_type(
    model: &FactModel,
    previous: &[EntityId],
    receiver_closure: &HashSet<String>,
) -> Vec<EntityId> {
    previous
        .iter()
        .copied()
        .filter(|id| {
            model
                .entity(*id)
                .ok()
                .and_then(|m| m.parent())
                .map(|class| receiver_closure.contains(model.name_of(class)))
                .unwrap_or(false)
        })
        .collect()
}

/// Stage 4: methods whose parameter types match the argument types position
/// by position under `matcher`.
pub fn by_parameter_types(
    model: &FactModel,
    previous: &[EntityId],
    argument_types: &[String],
    matcher: TypeMatcher,
) -> Vec<EntityId> {
    previous
        .iter()
        .copied()
        .filter(|id| {
            model
                .entity(*id)
                .map(|m| {
                    m.parameter_types.len() == argument_types.len()
                        && m.parameter_types
                            .iter()
                            .zip(argument_types)
                            .all(|(param, arg)| matcher(param, arg))
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Exact string equality of converted type names.
pub fn exact_match(parameter: &str, argument: &str) -> bool {
    parameter == argument
}

/// Exact equality, or both sides undefined.
///
/// Several overloads with undefined parameters all pass this test; nothing
/// further disambiguates them.
pub fn soft_match(parameter: &str, argument: &str) -> bool {
    parameter == argument || (is_undefined(parameter) && is_undefined(argument))
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgraph::AssociationKind;

    fn method(model: &mut FactModel, class: &str, name: &str, params: &[&str]) -> EntityId {
        let class_id = model.get_or_create(EntityKind::Class, class);
        let unique = format!("{class}.{name}({})", params.join(","));
        let id = model.get_or_create(EntityKind::Method, &unique);
        model.set_parent(id, class_id).unwrap();
        model.entity_mut(id).unwrap().parameter_types =
            params.iter().map(|p| p.to_string()).collect();
        id
    }

    #[test]
    fn test_stages_narrow_in_order() {
        let mut model = FactModel::new();
        let base_run = method(&mut model, "a.Base", "run", &["int"]);
        let sum_run = method(&mut model, "a.Sum", "run", &["int"]);
        let other_run = method(&mut model, "a.Other", "run", &["int"]);
        let sum_run2 = method(&mut model, "a.Sum", "run", &["int", "int"]);
        let _stop = method(&mut model, "a.Sum", "stop", &[]);
        let base = model.lookup(EntityKind::Class, "a.Base").unwrap();
        let sum = model.lookup(EntityKind::Class, "a.Sum").unwrap();
        model
            .add_association(AssociationKind::Inheritance, sum, base, None, "")
            .unwrap();

        let index = MethodIndex::build(&model);
        let named = by_name(&index, "run");
        assert_eq!(named, vec![base_run, sum_run, other_run, sum_run2]);

        let counted = by_parameter_count(&model, &named, 1);
        assert_eq!(counted, vec![base_run, sum_run, other_run]);

        let receiver = by_receiver_type(&model, &counted, &model.type_closure("a.Sum"));
        assert_eq!(receiver, vec![base_run, sum_run]);

        let exact = by_parameter_types(&model, &receiver, &["int".to_string()], exact_match);
        assert_eq!(exact, receiver);
        let none = by_parameter_types(&model, &receiver, &["long".to_string()], exact_match);
        assert!(none.is_empty());
    }

    #[test]
    fn test_soft_match_only_equates_undefined() {
        assert!(soft_match("<undef>", "<undef>.Foo"));
        assert!(soft_match("<undef>.Bar", "<undef>"));
        assert!(soft_match("int", "int"));
        assert!(!soft_match("java.lang.String", "<undef>"));
        assert!(!exact_match("<undef>", "<undef>.Foo"));
    }

    #[test]
    fn test_soft_stage_admits_all_undefined_overloads() {
        let mut model = FactModel::new();
        let first = method(&mut model, "a.A", "put", &["<undef>.Key"]);
        let second = method(&mut model, "a.A", "put", &["<undef>.Other"]);
        let typed = method(&mut model, "a.A", "put", &["int"]);

        let all = vec![first, second, typed];
        let soft = by_parameter_types(&model, &all, &["<undef>".to_string()], soft_match);
        assert_eq!(soft, vec![first, second]);
    }
}
