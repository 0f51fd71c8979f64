//! JSON export of the fact model.
//!
//! Generates a document with `entities` and `associations` arrays. Parents and
//! association endpoints are rendered as unique names so the output can be read
//! without the numeric ids.

use crate::{Association, Entity, FactModel, ModelError, Result};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::Path;

/// Export the whole model to pretty-printed JSON.
pub fn export_json(model: &FactModel) -> Result<String> {
    export_json_filtered(model, |_| true, true)
}

/// Export a filtered subset of the model.
///
/// Associations are only included when both endpoints pass the filter.
pub fn export_json_filtered(
    model: &FactModel,
    entity_filter: impl Fn(&Entity) -> bool,
    include_associations: bool,
) -> Result<String> {
    let mut entities = Vec::new();
    let mut kept = HashSet::new();

    for entity in model.entities() {
        if entity_filter(entity) {
            entities.push(entity_to_json(model, entity));
            kept.insert(entity.id);
        }
    }

    let mut associations = Vec::new();
    if include_associations {
        for association in model.associations() {
            if kept.contains(&association.from) && kept.contains(&association.to) {
                associations.push(association_to_json(model, association));
            }
        }
    }

    let result = json!({
        "entities": entities,
        "associations": associations,
    });

    serde_json::to_string_pretty(&result)
        .map_err(|e| ModelError::serialization("Failed to serialize model", Some(e)))
}

/// Export the whole model to a JSON file.
pub fn write_json(model: &FactModel, path: &Path) -> Result<()> {
    let document = export_json(model)?;
    std::fs::write(path, document).map_err(|e| {
        ModelError::serialization(format!("Failed to write {}", path.display()), Some(e))
    })
}

fn entity_to_json(model: &FactModel, entity: &Entity) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("id".to_string(), json!(entity.id));
    obj.insert("kind".to_string(), json!(entity.kind.to_string()));
    obj.insert("name".to_string(), json!(entity.unique_name));
    obj.insert("modifiers".to_string(), json!(entity.modifiers.bits()));
    if let Some(parent) = entity.parent() {
        obj.insert("parent".to_string(), json!(model.name_of(parent)));
    }
    if let Some(anchor) = &entity.anchor {
        obj.insert(
            "anchor".to_string(),
            json!({ "file": anchor.file, "start": anchor.start, "end": anchor.end }),
        );
    }
    if let Some(declared_type) = entity.declared_type {
        obj.insert("type".to_string(), json!(model.name_of(declared_type)));
    }
    if let Some(position) = entity.position {
        obj.insert("position".to_string(), json!(position));
    }
    Value::Object(obj)
}

fn association_to_json(model: &FactModel, association: &Association) -> Value {
    json!({
        "id": association.id,
        "kind": association.kind.to_string(),
        "from": model.name_of(association.from),
        "to": model.name_of(association.to),
        "statement": association.statement,
    })
}
