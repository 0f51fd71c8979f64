//! Type hierarchy queries over inheritance and subtyping associations.

use super::store::FactModel;
use super::types::{AssociationKind, EntityId, EntityKind};
use std::collections::{HashSet, VecDeque};

impl FactModel {
    /// Direct supertypes of a class: extended classes first, then implemented
    /// or extended interfaces, each in creation order.
    pub fn direct_supertypes(&self, class: EntityId) -> Vec<EntityId> {
        let mut supertypes: Vec<(u8, EntityId)> = self
            .associations_from(class)
            .filter(|a| a.kind.is_hierarchy())
            .map(|a| (u8::from(a.kind != AssociationKind::Inheritance), a.to))
            .collect();
        supertypes.sort_by_key(|(rank, _)| *rank);
        supertypes.into_iter().map(|(_, id)| id).collect()
    }

    /// The superclass of a class, if an inheritance association records one.
    pub fn superclass_of(&self, class: EntityId) -> Option<EntityId> {
        self.associations_from(class)
            .find(|a| a.kind == AssociationKind::Inheritance)
            .map(|a| a.to)
    }

    /// All supertypes reachable through inheritance and subtyping.
    ///
    /// Breadth-first, nearest supertypes first; the class itself is excluded
    /// and cycles in malformed hierarchies are tolerated.
    pub fn supertypes_of(&self, class: EntityId) -> Vec<EntityId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut result = Vec::new();

        visited.insert(class);
        queue.push_back(class);

        while let Some(current) = queue.pop_front() {
            for supertype in self.direct_supertypes(current) {
                if visited.insert(supertype) {
                    result.push(supertype);
                    queue.push_back(supertype);
                }
            }
        }

        result
    }

    /// Unique names of a class and all of its supertypes.
    ///
    /// Unknown class names yield just the name itself, which keeps receiver
    /// matching usable for types that were never declared in analysed source.
    pub fn type_closure(&self, class_name: &str) -> HashSet<String> {
        let mut names = HashSet::new();
        names.insert(class_name.to_string());
        if let Some(id) = self.lookup(EntityKind::Class, class_name) {
            names.extend(
                self.supertypes_of(id)
                    .into_iter()
                    .map(|s| self.name_of(s).to_string()),
            );
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitive_supertypes() {
        let mut model = FactModel::new();
        let object = model.get_or_create(EntityKind::Class, "java.lang.Object");
        let base = model.get_or_create(EntityKind::Class, "Base");
        let sum = model.get_or_create(EntityKind::Class, "Sum");
        let shape = model.get_or_create(EntityKind::Class, "Shape");

        model
            .add_association(AssociationKind::Subtyping, sum, shape, None, "")
            .unwrap();
        model
            .add_association(AssociationKind::Inheritance, sum, base, None, "")
            .unwrap();
        model
            .add_association(AssociationKind::Inheritance, base, object, None, "")
            .unwrap();

        assert_eq!(model.direct_supertypes(sum), vec![base, shape]);
        assert_eq!(model.supertypes_of(sum), vec![base, shape, object]);
        assert_eq!(model.superclass_of(sum), Some(base));
    }

    #[test]
    fn test_cycle_tolerated() {
        let mut model = FactModel::new();
        let a = model.get_or_create(EntityKind::Class, "A");
        let b = model.get_or_create(EntityKind::Class, "B");
        model
            .add_association(AssociationKind::Inheritance, a, b, None, "")
            .unwrap();
        model
            .add_association(AssociationKind::Inheritance, b, a, None, "")
            .unwrap();

        assert_eq!(model.supertypes_of(a), vec![b]);
    }

    #[test]
    fn test_type_closure_of_unknown_type() {
        let model = FactModel::new();
        let closure = model.type_closure("x.Unknown");
        assert_eq!(closure.len(), 1);
        assert!(closure.contains("x.Unknown"));
    }
}
