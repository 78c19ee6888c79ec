use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::EntitySet;

/// Validate internal consistency of an entity set.
///
/// This checks:
/// - entity names are present and match the key they are stored under
/// - duplicate or unnamed fields
/// - unique-constraint fields exist
/// - foreign-key source fields, target entities and referenced fields exist
pub fn validate_entity_set(set: &EntitySet) -> Result<()> {
    let issues = validation_issues(set);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidSchema(issues.join("; ")))
    }
}

/// Collect every structural issue instead of stopping at the first.
pub fn validation_issues(set: &EntitySet) -> Vec<String> {
    let mut issues = Vec::new();

    for (key, entity) in set.entries() {
        if entity.name.trim().is_empty() {
            issues.push(format!("entity stored as '{key}' has an empty name"));
        } else if entity.name != key {
            issues.push(format!(
                "entity '{}' stored under mismatched key '{key}'",
                entity.name
            ));
        }

        let mut fields = BTreeSet::new();
        for field in &entity.fields {
            if field.name.trim().is_empty() {
                issues.push(format!("unnamed field in entity: {}", entity.name));
                continue;
            }
            if field.field_type.trim().is_empty() {
                issues.push(format!("field without type: {}.{}", entity.name, field.name));
            }
            if !fields.insert(field.name.as_str()) {
                issues.push(format!(
                    "duplicate field name: {}.{}",
                    entity.name, field.name
                ));
            }
        }

        for unique in &entity.unique_constraints {
            if unique.fields.is_empty() {
                issues.push(format!("empty unique constraint in entity: {}", entity.name));
            }
            for name in &unique.fields {
                if !fields.contains(name.as_str()) {
                    issues.push(format!(
                        "unique field not found: {}.{}",
                        entity.name, name
                    ));
                }
            }
        }

        for field in &entity.fields {
            let Some(link) = &field.foreign_key else {
                continue;
            };

            for name in &link.fields {
                if !fields.contains(name.as_str()) {
                    issues.push(format!(
                        "foreign key field not found: {}.{}",
                        entity.name, name
                    ));
                }
            }

            let Some(target) = &link.target_entity else {
                continue;
            };
            match set.resolve_name(target).and_then(|name| set.get(name)) {
                Some(target_entity) => {
                    for reference in &link.references {
                        if target_entity.field(reference).is_none() {
                            issues.push(format!(
                                "referenced field not found: {}.{}",
                                target_entity.name, reference
                            ));
                        }
                    }
                }
                None => issues.push(format!(
                    "referenced entity not found: {} (from {}.{})",
                    target, entity.name, field.name
                )),
            }
        }
    }

    issues
}
