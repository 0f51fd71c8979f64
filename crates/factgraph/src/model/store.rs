//! The fact model store.

use super::types::{
    Association, AssociationId, AssociationKind, Entity, EntityId, EntityKind, SourceAnchor,
};
use crate::error::{ModelError, Result};
use log::{debug, trace};
use std::collections::HashMap;

/// Holds every entity and association extracted from a project.
///
/// Entities are de-duplicated on `(kind, unique name)`: [`FactModel::get_or_create`]
/// is idempotent and always hands back the canonical instance. Associations
/// are indexed by both endpoints so that "everything touching X" is a map lookup.
#[derive(Debug, Default, Clone)]
pub struct FactModel {
    entities: Vec<Entity>,
    index: HashMap<EntityKind, HashMap<String, EntityId>>,
    associations: Vec<Association>,
    // Adjacency indexes for O(1) endpoint lookups
    outgoing: HashMap<EntityId, Vec<AssociationId>>,
    incoming: HashMap<EntityId, Vec<AssociationId>>,
}

impl FactModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entity with this identity, creating it if needed.
    ///
    /// Calling this twice with the same arguments returns the same id, and
    /// never creates a second entry.
    pub fn get_or_create(&mut self, kind: EntityKind, unique_name: &str) -> EntityId {
        if let Some(id) = self.lookup(kind, unique_name) {
            return id;
        }

        let id = self.entities.len() as EntityId;
        debug!("Adding entity: id={id}, kind={kind}, name={unique_name}");
        self.entities.push(Entity::new(id, kind, unique_name));
        self.index
            .entry(kind)
            .or_default()
            .insert(unique_name.to_string(), id);
        id
    }

    /// Find an entity by identity without creating it.
    pub fn lookup(&self, kind: EntityKind, unique_name: &str) -> Option<EntityId> {
        self.index
            .get(&kind)
            .and_then(|names| names.get(unique_name))
            .copied()
    }

    /// Get an entity by id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EntityNotFound`] if the id is unknown.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities
            .get(id as usize)
            .ok_or_else(|| ModelError::EntityNotFound {
                entity_id: id.to_string(),
            })
    }

    /// Get a mutable reference to an entity by id.
    ///
    /// Identity fields are not meant to be edited through this reference; use
    /// [`FactModel::set_parent`] and [`FactModel::declare`] for ownership and
    /// declaration sites.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EntityNotFound`] if the id is unknown.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(id as usize)
            .ok_or_else(|| ModelError::EntityNotFound {
                entity_id: id.to_string(),
            })
    }

    /// Unique name of an entity, or an empty string for unknown ids.
    pub fn name_of(&self, id: EntityId) -> &str {
        self.entities
            .get(id as usize)
            .map(|e| e.unique_name.as_str())
            .unwrap_or("")
    }

    /// Make `parent` the owner of `child`.
    ///
    /// Re-parenting detaches the child from its previous owner so that the
    /// children collections stay consistent.
    ///
    /// # Errors
    ///
    /// Returns an error if either id is unknown or the child would own itself.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> Result<()> {
        if child == parent {
            return Err(ModelError::InvalidOperation {
                message: format!("entity {} cannot own itself", self.name_of(child)),
            });
        }
        self.entity(parent)?;
        let previous = self.entity(child)?.parent;
        if previous == Some(parent) {
            return Ok(());
        }

        if let Some(old) = previous {
            trace!("Re-parenting {} away from {}", self.name_of(child), self.name_of(old));
            self.entity_mut(old)?.children.retain(|c| *c != child);
        }
        self.entity_mut(child)?.parent = Some(parent);
        self.entity_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Record where an entity is declared.
    ///
    /// Declaring the same entity again at the same place is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateDeclaration`] when the entity already has
    /// a different declaration site.
    pub fn declare(&mut self, id: EntityId, anchor: SourceAnchor) -> Result<()> {
        let entity = self.entity_mut(id)?;
        if let Some(existing) = &entity.anchor {
            if *existing != anchor {
                return Err(ModelError::DuplicateDeclaration {
                    kind: entity.kind.to_string(),
                    unique_name: entity.unique_name.clone(),
                    existing: existing.to_string(),
                    duplicate: anchor.to_string(),
                });
            }
            return Ok(());
        }
        entity.anchor = Some(anchor);
        Ok(())
    }

    /// Add an association between two existing entities.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EntityNotFound`] if either endpoint is unknown.
    pub fn add_association(
        &mut self,
        kind: AssociationKind,
        from: EntityId,
        to: EntityId,
        anchor: Option<SourceAnchor>,
        statement: impl Into<String>,
    ) -> Result<AssociationId> {
        self.entity(from)?;
        self.entity(to)?;

        let id = self.associations.len() as AssociationId;
        debug!(
            "Adding association: id={id}, kind={kind}, {} -> {}",
            self.name_of(from),
            self.name_of(to)
        );
        self.associations.push(Association {
            id,
            kind,
            from,
            to,
            anchor,
            statement: statement.into(),
        });
        self.outgoing.entry(from).or_default().push(id);
        self.incoming.entry(to).or_default().push(id);
        Ok(id)
    }

    /// Get an association by id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AssociationNotFound`] if the id is unknown.
    pub fn association(&self, id: AssociationId) -> Result<&Association> {
        self.associations
            .get(id as usize)
            .ok_or_else(|| ModelError::AssociationNotFound {
                association_id: id.to_string(),
            })
    }

    /// Whether an association of this kind already links the two entities.
    pub fn has_association(&self, kind: AssociationKind, from: EntityId, to: EntityId) -> bool {
        self.associations_from(from)
            .any(|a| a.kind == kind && a.to == to)
    }

    /// Associations leaving an entity, in creation order.
    pub fn associations_from(&self, id: EntityId) -> impl Iterator<Item = &Association> + '_ {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |aid| self.associations.get(*aid as usize))
    }

    /// Associations arriving at an entity, in creation order.
    pub fn associations_to(&self, id: EntityId) -> impl Iterator<Item = &Association> + '_ {
        self.incoming
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |aid| self.associations.get(*aid as usize))
    }

    /// Every association with the entity at either end.
    ///
    /// Self-loops are reported once.
    pub fn associations_touching(&self, id: EntityId) -> Vec<&Association> {
        let mut touching: Vec<&Association> = self.associations_from(id).collect();
        touching.extend(self.associations_to(id).filter(|a| a.from != id));
        touching.sort_by_key(|a| a.id);
        touching
    }

    /// All entities, in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter()
    }

    /// All entities of one kind, in creation order.
    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// All associations, in creation order.
    pub fn associations(&self) -> impl Iterator<Item = &Association> + '_ {
        self.associations.iter()
    }

    /// All associations of one kind, in creation order.
    pub fn associations_of_kind(
        &self,
        kind: AssociationKind,
    ) -> impl Iterator<Item = &Association> + '_ {
        self.associations.iter().filter(move |a| a.kind == kind)
    }

    /// Children of an entity with the given kind.
    pub fn children_of_kind(
        &self,
        parent: EntityId,
        kind: EntityKind,
    ) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .get(parent as usize)
            .map(|p| p.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |c| self.entities.get(*c as usize))
            .filter(move |c| c.kind == kind)
    }

    /// Get the total number of entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Get the total number of associations.
    pub fn association_count(&self) -> usize {
        self.associations.len()
    }

    /// Remove everything from the model.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.index.clear();
        self.associations.clear();
        self.outgoing.clear();
        self.incoming.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut model = FactModel::new();
        let a = model.get_or_create(EntityKind::Class, "p.A");
        let b = model.get_or_create(EntityKind::Class, "p.A");
        assert_eq!(a, b);
        assert_eq!(model.entity_count(), 1);
    }

    #[test]
    fn test_same_name_different_kind() {
        let mut model = FactModel::new();
        let class = model.get_or_create(EntityKind::Class, "p.x");
        let attr = model.get_or_create(EntityKind::Attribute, "p.x");
        assert_ne!(class, attr);
        assert_eq!(model.lookup(EntityKind::Attribute, "p.x"), Some(attr));
        assert_eq!(model.lookup(EntityKind::Method, "p.x"), None);
    }

    #[test]
    fn test_reparenting_keeps_children_consistent() {
        let mut model = FactModel::new();
        let pkg = model.get_or_create(EntityKind::Package, "p");
        let outer = model.get_or_create(EntityKind::Class, "p.Outer");
        let inner = model.get_or_create(EntityKind::Class, "p.Outer$Inner");

        model.set_parent(inner, pkg).unwrap();
        model.set_parent(inner, outer).unwrap();

        assert!(model.entity(pkg).unwrap().children().is_empty());
        assert_eq!(model.entity(outer).unwrap().children(), &[inner]);
        assert_eq!(model.entity(inner).unwrap().parent(), Some(outer));
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut model = FactModel::new();
        let a = model.get_or_create(EntityKind::Class, "A");
        assert!(model.set_parent(a, a).is_err());
    }

    #[test]
    fn test_declare_twice() {
        let mut model = FactModel::new();
        let a = model.get_or_create(EntityKind::Class, "A");
        model.declare(a, SourceAnchor::new("A.java", 0, 10)).unwrap();
        model.declare(a, SourceAnchor::new("A.java", 0, 10)).unwrap();
        let err = model
            .declare(a, SourceAnchor::new("B.java", 0, 10))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateDeclaration { .. }));
    }

    #[test]
    fn test_association_indexes() {
        let mut model = FactModel::new();
        let m = model.get_or_create(EntityKind::Method, "A.run()");
        let f = model.get_or_create(EntityKind::Attribute, "A.count");
        let n = model.get_or_create(EntityKind::Method, "A.next()");

        let access = model
            .add_association(AssociationKind::Access, m, f, None, "count")
            .unwrap();
        let call = model
            .add_association(AssociationKind::Invocation, m, n, None, "next()")
            .unwrap();

        let touching: Vec<_> = model.associations_touching(m).iter().map(|a| a.id).collect();
        assert_eq!(touching, vec![access, call]);
        assert_eq!(model.associations_to(f).count(), 1);
        assert!(model.has_association(AssociationKind::Invocation, m, n));
        assert!(!model.has_association(AssociationKind::Invocation, n, m));
    }

    #[test]
    fn test_association_requires_endpoints() {
        let mut model = FactModel::new();
        let m = model.get_or_create(EntityKind::Method, "A.run()");
        let result = model.add_association(AssociationKind::Access, m, 99, None, "");
        assert!(matches!(result, Err(ModelError::EntityNotFound { .. })));
    }

    #[test]
    fn test_clear() {
        let mut model = FactModel::new();
        model.get_or_create(EntityKind::Class, "A");
        model.clear();
        assert_eq!(model.entity_count(), 0);
        assert_eq!(model.lookup(EntityKind::Class, "A"), None);
    }
}
