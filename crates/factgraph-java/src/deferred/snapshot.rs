//! Variables visible at a call site.

use crate::scope::{BlockId, ScopeTracker};
use factgraph::{EntityId, EntityKind, FactModel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Variable names in lexical scope at a call site, each mapped to the
/// entities that declare it.
///
/// Levels are added narrowest first. A name contributed by a narrower level
/// hides the same name in every wider level, so a local variable beats a
/// parameter, which beats a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    variables: BTreeMap<String, Vec<EntityId>>,
}

impl ScopeSnapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture locals and parameters visible from `block` inside `method`.
    ///
    /// A local is visible when it was declared in `block` or one of its
    /// enclosing blocks and its declaration ends before `block` does.
    pub fn capture(
        model: &FactModel,
        scope: &ScopeTracker,
        method: EntityId,
        block: Option<BlockId>,
    ) -> Self {
        let mut snapshot = Self::new();

        let call_site = block.and_then(|b| scope.block(b).map(|s| (b, s.span)));
        if let Some((call_block, call_span)) = call_site {
            let mut cursor = Some(call_block);
            while let Some(level) = cursor {
                snapshot.add_level(
                    model
                        .children_of_kind(method, EntityKind::LocalVariable)
                        .filter(|local| scope.scope_of_local(local.id) == Some(level))
                        .filter(|local| {
                            local
                                .anchor
                                .as_ref()
                                .map(|a| a.end <= call_span.end())
                                .unwrap_or(false)
                        })
                        .map(|local| (local.simple_name().to_string(), local.id)),
                );
                cursor = scope.block(level).and_then(|b| b.parent);
            }
        }

        snapshot.add_level(
            model
                .children_of_kind(method, EntityKind::Parameter)
                .map(|p| (p.simple_name().to_string(), p.id)),
        );
        snapshot
    }

    /// Add one scope level, wider than every level added before.
    pub fn add_level(&mut self, level: impl IntoIterator<Item = (String, EntityId)>) {
        let mut added: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        for (name, id) in level {
            if !self.variables.contains_key(&name) {
                added.entry(name).or_default().push(id);
            }
        }
        self.variables.extend(added);
    }

    /// Add the fields of `class` and of every class enclosing it, innermost first.
    ///
    /// Local and anonymous classes reach their enclosing class through the
    /// method that owns them.
    pub fn add_enclosing_fields(&mut self, model: &FactModel, class: EntityId) {
        let mut visited = BTreeSet::new();
        let mut cursor = Some(class);
        while let Some(id) = cursor {
            if !visited.insert(id) {
                break;
            }
            let Ok(entity) = model.entity(id) else {
                break;
            };
            match entity.kind {
                EntityKind::Class => {
                    self.add_level(
                        model
                            .children_of_kind(id, EntityKind::Attribute)
                            .map(|a| (a.simple_name().to_string(), a.id)),
                    );
                    cursor = entity.parent();
                }
                EntityKind::Method => cursor = entity.parent(),
                _ => break,
            }
        }
    }

    /// Entities declaring `name`, narrowest scope only.
    pub fn lookup(&self, name: &str) -> &[EntityId] {
        self.variables
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The entity declaring `name`, if exactly one is in scope.
    pub fn unique(&self, name: &str) -> Option<EntityId> {
        match self.lookup(name) {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Visible variable names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables.keys().map(String::as_str)
    }

    /// Number of visible names.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgraph::SourceAnchor;
    use factgraph_parser_api::Span;

    #[test]
    fn test_narrower_level_hides_wider() {
        let mut snapshot = ScopeSnapshot::new();
        snapshot.add_level(vec![("x".to_string(), 10)]);
        snapshot.add_level(vec![("x".to_string(), 20), ("y".to_string(), 21)]);
        snapshot.add_level(vec![("y".to_string(), 30), ("z".to_string(), 31)]);

        assert_eq!(snapshot.lookup("x"), &[10]);
        assert_eq!(snapshot.lookup("y"), &[21]);
        assert_eq!(snapshot.lookup("z"), &[31]);
        assert!(snapshot.lookup("w").is_empty());
    }

    #[test]
    fn test_same_level_duplicates_are_ambiguous() {
        let mut snapshot = ScopeSnapshot::new();
        snapshot.add_level(vec![("x".to_string(), 1), ("x".to_string(), 2)]);
        assert_eq!(snapshot.lookup("x").len(), 2);
        assert_eq!(snapshot.unique("x"), None);
    }

    #[test]
    fn test_capture_prefers_local_over_parameter() {
        let mut model = FactModel::new();
        let mut scope = ScopeTracker::new();
        let class = model.get_or_create(EntityKind::Class, "A");
        let method = model.get_or_create(EntityKind::Method, "A.m(B)");
        model.set_parent(method, class).unwrap();

        let param = model.get_or_create(EntityKind::Parameter, "A.m(B).x");
        model.set_parent(param, method).unwrap();
        let field = model.get_or_create(EntityKind::Attribute, "A.x");
        model.set_parent(field, class).unwrap();
        let other = model.get_or_create(EntityKind::Attribute, "A.y");
        model.set_parent(other, class).unwrap();

        let body = scope.enter_block(Span::from_range(10, 100));
        let nested = scope.enter_block(Span::from_range(20, 80));
        let local = model.get_or_create(EntityKind::LocalVariable, "A.m(B).x");
        model.set_parent(local, method).unwrap();
        model
            .declare(local, SourceAnchor::new("A.java", 25, 5))
            .unwrap();
        scope.declare_local(local, nested);

        let mut at_nested = ScopeSnapshot::capture(&model, &scope, method, Some(nested));
        at_nested.add_enclosing_fields(&model, class);
        assert_eq!(at_nested.unique("x"), Some(local));
        assert_eq!(at_nested.unique("y"), Some(other));

        let mut at_body = ScopeSnapshot::capture(&model, &scope, method, Some(body));
        at_body.add_enclosing_fields(&model, class);
        assert_eq!(at_body.unique("x"), Some(param));

        let mut no_block = ScopeSnapshot::capture(&model, &scope, method, None);
        no_block.add_enclosing_fields(&model, class);
        assert_eq!(no_block.unique("x"), Some(param));
    }
}
