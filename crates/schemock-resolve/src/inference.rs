//! Relation inference between entities.
//!
//! Every field runs through the same ordered battery; each strategy proposes
//! at most one target. The highest confidence wins and ties keep battery
//! order:
//!
//! | strategy            | confidence |
//! |---------------------|------------|
//! | direct type         | 1.0        |
//! | annotation          | 0.9        |
//! | foreign-key name    | 0.6 - 0.9  |
//! | collection naming   | 0.6 - 0.8  |
//! | shape guess         | 0.5        |

use std::collections::BTreeSet;

use tracing::debug;

use schemock_core::{Entity, EntitySet, Field, InferredRelation, RelationKind};

use crate::options::InferenceOptions;

const FK_SUFFIXES: &[(&str, bool)] = &[
    ("_id", false),
    ("_ref", true),
    ("_fk", true),
    ("Id", false),
    ("ID", false),
    ("Ref", true),
    ("Fk", true),
];

const COLLECTION_SUFFIXES: &[&str] = &["List", "Collection", "Set", "_list", "_collection", "_set"];

const OPAQUE_TYPES: &[&str] = &["object", "json", "jsonb", "map", "record", "any", "mixed"];

struct Proposal {
    target: String,
    kind: RelationKind,
    confidence: f64,
}

impl Proposal {
    fn new(target: &str, kind: RelationKind, confidence: f64) -> Self {
        Self {
            target: target.to_string(),
            kind,
            confidence,
        }
    }
}

/// Propose relations for every field of every entity, in name then field order.
///
/// Relations scoring below the threshold are returned with `informational`
/// set. The entity set is never modified.
pub fn infer_relations(entities: &EntitySet, options: &InferenceOptions) -> Vec<InferredRelation> {
    let mut relations = Vec::new();

    for entity in entities.iter() {
        let covered = covered_fields(entities, entity);

        for field in &entity.fields {
            let Some(proposal) = propose(entities, field, covered.contains(field.name.as_str()))
            else {
                continue;
            };

            let informational = proposal.confidence < options.confidence_threshold;
            debug!(
                from = %entity.name,
                to = %proposal.target,
                field = %field.name,
                kind = %proposal.kind,
                confidence = proposal.confidence,
                informational,
                "relation inferred"
            );

            relations.push(InferredRelation {
                from_entity: entity.name.clone(),
                to_entity: proposal.target,
                via_field: field.name.clone(),
                kind: proposal.kind,
                confidence: proposal.confidence,
                optional: field.is_optional,
                informational,
            });
        }
    }

    relations
}

fn propose(entities: &EntitySet, field: &Field, covered: bool) -> Option<Proposal> {
    let battery = [
        direct(entities, field),
        annotation(entities, field),
        fk_pattern(entities, field, covered),
        naming_convention(entities, field),
    ];

    let mut best: Option<Proposal> = None;
    for proposal in battery.into_iter().flatten() {
        match &best {
            Some(current) if proposal.confidence <= current.confidence => {}
            _ => best = Some(proposal),
        }
    }

    best.or_else(|| shape_guess(entities, field))
}

/// Scalar fields another field's foreign key already speaks for.
fn covered_fields<'a>(entities: &EntitySet, entity: &'a Entity) -> BTreeSet<&'a str> {
    let mut covered = BTreeSet::new();
    for field in &entity.fields {
        let Some(link) = &field.foreign_key else {
            continue;
        };
        let resolves = link
            .target_entity
            .as_deref()
            .and_then(|target| entities.resolve_name(target))
            .or_else(|| entities.resolve_name(&field.field_type))
            .is_some();
        if !resolves {
            continue;
        }
        for name in &link.fields {
            if let Some(source) = entity.fields.iter().find(|candidate| {
                candidate.name == *name && candidate.name != field.name && candidate.is_scalar()
            }) {
                covered.insert(source.name.as_str());
            }
        }
    }
    covered
}

fn direct(entities: &EntitySet, field: &Field) -> Option<Proposal> {
    entities
        .resolve_name(&field.field_type)
        .map(|target| Proposal::new(target, RelationKind::Direct, 1.0))
}

fn annotation(entities: &EntitySet, field: &Field) -> Option<Proposal> {
    field
        .foreign_key
        .as_ref()
        .and_then(|link| link.target_entity.as_deref())
        .and_then(|target| entities.resolve_name(target))
        .map(|target| Proposal::new(target, RelationKind::Annotation, 0.9))
}

fn fk_pattern(entities: &EntitySet, field: &Field, covered: bool) -> Option<Proposal> {
    if field.is_identifier || covered {
        return None;
    }

    let (stem, reference_like) = FK_SUFFIXES.iter().find_map(|(suffix, reference_like)| {
        field
            .name
            .strip_suffix(suffix)
            .filter(|stem| !stem.is_empty() && !stem.ends_with('_'))
            .map(|stem| (stem, *reference_like))
    })?;

    let stem_key = normalize(stem);
    let trailing = normalize(last_word(stem));

    best_match(entities, |entity| {
        let entity_key = normalize(entity);
        if stem.eq_ignore_ascii_case(entity) {
            Some(if reference_like { 0.8 } else { 0.9 })
        } else if stem_key == entity_key {
            Some(0.8)
        } else if singular(&entity_key) == singular(&stem_key) {
            Some(0.7)
        } else if trailing != stem_key && singular(&trailing) == singular(&entity_key) {
            Some(0.6)
        } else {
            None
        }
    })
    .map(|(target, confidence)| Proposal::new(target, RelationKind::FkPattern, confidence))
}

fn naming_convention(entities: &EntitySet, field: &Field) -> Option<Proposal> {
    if field.is_identifier {
        return None;
    }

    let name_key = normalize(&field.name);
    let collection_stem = COLLECTION_SUFFIXES.iter().find_map(|suffix| {
        field
            .name
            .strip_suffix(suffix)
            .filter(|stem| !stem.is_empty())
            .map(normalize)
    });

    best_match(entities, |entity| {
        let entity_key = normalize(entity);
        let plural_key = plural(&entity_key);
        if field.is_array && name_key == plural_key {
            Some(0.8)
        } else if collection_stem
            .as_ref()
            .is_some_and(|stem| *stem == entity_key || *stem == plural_key)
        {
            Some(0.75)
        } else if !field.is_array && name_key == plural_key {
            Some(0.7)
        } else if !field.is_relation() && name_key == entity_key {
            Some(0.6)
        } else {
            None
        }
    })
    .map(|(target, confidence)| Proposal::new(target, RelationKind::NamingConvention, confidence))
}

fn shape_guess(entities: &EntitySet, field: &Field) -> Option<Proposal> {
    let opaque = OPAQUE_TYPES
        .iter()
        .any(|opaque| field.field_type.eq_ignore_ascii_case(opaque));
    if !field.is_relation() && !opaque {
        return None;
    }

    let name_key = normalize(&field.name);
    let mut best: Option<&str> = None;
    for entity in entities.names() {
        if !name_key.contains(&normalize(entity)) {
            continue;
        }
        if best.is_none_or(|current| entity.len() > current.len()) {
            best = Some(entity);
        }
    }
    best.map(|target| Proposal::new(target, RelationKind::Inferred, 0.5))
}

/// Highest-scoring entity for `score`; ties keep name order.
fn best_match<'a>(
    entities: &'a EntitySet,
    score: impl Fn(&str) -> Option<f64>,
) -> Option<(&'a str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for entity in entities.names() {
        let Some(confidence) = score(entity) else {
            continue;
        };
        if best.is_none_or(|(_, current)| confidence > current) {
            best = Some((entity, confidence));
        }
    }
    best
}

/// Lower-case with `_`, `-` and spaces removed.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|ch| !matches!(ch, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Last word of a snake_case or camelCase identifier.
fn last_word(name: &str) -> &str {
    let name = name.trim_end_matches('_');
    if let Some((_, tail)) = name.rsplit_once('_') {
        return tail;
    }
    match name
        .char_indices()
        .skip(1)
        .filter(|(_, ch)| ch.is_uppercase())
        .last()
    {
        Some((index, _)) => &name[index..],
        None => name,
    }
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if word.ends_with("sses")
        || word.ends_with("xes")
        || word.ends_with("ches")
        || word.ends_with("shes")
    {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

fn plural(word: &str) -> String {
    let consonant_y = word.ends_with('y')
        && !word
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|ch| matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u'));
    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemock_core::ForeignKeyLink;

    fn infer(entities: &[Entity]) -> Vec<InferredRelation> {
        let set = EntitySet::from_entities(entities.iter().cloned()).unwrap();
        infer_relations(&set, &InferenceOptions::default())
    }

    fn only<'a>(relations: &'a [InferredRelation], field: &str) -> &'a InferredRelation {
        let matching: Vec<_> = relations.iter().filter(|r| r.via_field == field).collect();
        assert_eq!(matching.len(), 1, "expected one relation via {field}");
        matching[0]
    }

    fn user() -> Entity {
        Entity::new("User").with_field(Field::scalar("id", "Int").identifier())
    }

    #[test]
    fn direct_type_reference_is_certain() {
        let post = Entity::new("Post").with_field(Field::relation("author", "user"));
        let relations = infer(&[user(), post]);
        let author = only(&relations, "author");
        assert_eq!(author.to_entity, "User");
        assert_eq!(author.kind, RelationKind::Direct);
        assert_eq!(author.confidence, 1.0);
        assert!(!author.informational);
    }

    #[test]
    fn annotation_names_the_target() {
        let post = Entity::new("Post").with_field(
            Field::scalar("writer", "Int").with_foreign_key(ForeignKeyLink::to_entity("User")),
        );
        let relations = infer(&[user(), post]);
        let writer = only(&relations, "writer");
        assert_eq!(writer.kind, RelationKind::Annotation);
        assert_eq!(writer.confidence, 0.9);
    }

    #[test]
    fn foreign_key_names_scale_with_exactness() {
        let category = Entity::new("Category").with_field(Field::scalar("id", "Int").identifier());
        let line = Entity::new("OrderLine").with_field(Field::scalar("id", "Int").identifier());
        let users = Entity::new("users").with_field(Field::scalar("id", "Int").identifier());
        let row = Entity::new("Row")
            .with_field(Field::scalar("categoryId", "Int"))
            .with_field(Field::scalar("categoryRef", "Int"))
            .with_field(Field::scalar("order_line_id", "Int"))
            .with_field(Field::scalar("user_id", "Int"))
            .with_field(Field::scalar("parentCategoryId", "Int"));
        let relations = infer(&[category, line, users, row]);

        let confidence = |field| only(&relations, field).confidence;
        assert_eq!(confidence("categoryId"), 0.9);
        assert_eq!(confidence("categoryRef"), 0.8);
        assert_eq!(confidence("order_line_id"), 0.8);
        assert_eq!(confidence("user_id"), 0.7);
        assert_eq!(confidence("parentCategoryId"), 0.6);
        assert!(only(&relations, "parentCategoryId").informational);
        assert_eq!(only(&relations, "user_id").to_entity, "users");
    }

    #[test]
    fn user_id_scores_within_the_foreign_key_band() {
        let post = Entity::new("Post").with_field(Field::scalar("userId", "Int"));
        let relations = infer(&[user(), post]);
        let user_id = only(&relations, "userId");
        assert_eq!(user_id.kind, RelationKind::FkPattern);
        assert!((0.6..=0.9).contains(&user_id.confidence));
    }

    #[test]
    fn collection_names_follow_naming_convention() {
        let post = Entity::new("Post").with_field(Field::scalar("id", "Int").identifier());
        let category = Entity::new("Category");
        let owner = Entity::new("Owner")
            .with_field(Field::scalar("posts", "json").array())
            .with_field(Field::scalar("categoryList", "json"))
            .with_field(Field::scalar("categories", "json"))
            .with_field(Field::scalar("post", "String"));
        let relations = infer(&[post, category, owner]);

        let posts = only(&relations, "posts");
        assert_eq!(posts.kind, RelationKind::NamingConvention);
        assert!((0.6..=0.8).contains(&posts.confidence));
        assert_eq!(posts.confidence, 0.8);
        assert_eq!(only(&relations, "categoryList").confidence, 0.75);
        assert_eq!(only(&relations, "categories").confidence, 0.7);
        assert_eq!(only(&relations, "post").confidence, 0.6);
    }

    #[test]
    fn shape_guess_only_fires_alone() {
        let profile = Entity::new("Profile");
        let account = Entity::new("Account")
            .with_field(Field::scalar("mainProfileData", "json"))
            .with_field(Field::scalar("profileNote", "String"));
        let relations = infer(&[profile, account]);

        let guessed = only(&relations, "mainProfileData");
        assert_eq!(guessed.kind, RelationKind::Inferred);
        assert_eq!(guessed.confidence, 0.5);
        assert!(guessed.informational);
        assert!(relations.iter().all(|r| r.via_field != "profileNote"));
    }

    #[test]
    fn covered_foreign_key_columns_are_not_doubled() {
        let post = Entity::new("Post")
            .with_field(Field::scalar("userId", "Int"))
            .with_field(Field::relation("author", "User").with_foreign_key(ForeignKeyLink {
                target_entity: Some("User".to_string()),
                fields: vec!["userId".to_string()],
                references: vec!["id".to_string()],
                relation_name: None,
            }));
        let relations = infer(&[user(), post]);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].via_field, "author");
    }

    #[test]
    fn identifiers_and_plain_scalars_infer_nothing() {
        let relations = infer(&[
            user(),
            Entity::new("Log")
                .with_field(Field::scalar("userId", "Int").identifier())
                .with_field(Field::scalar("message", "String")),
        ]);
        assert!(relations.is_empty());
    }

    #[test]
    fn optionality_mirrors_the_field() {
        let post = Entity::new("Post").with_field(Field::relation("editor", "User").optional());
        let relations = infer(&[user(), post]);
        assert!(only(&relations, "editor").optional);
    }

    #[test]
    fn inflection_helpers() {
        assert_eq!(plural("category"), "categories");
        assert_eq!(plural("day"), "days");
        assert_eq!(plural("address"), "addresses");
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("boxes"), "box");
        assert_eq!(singular("class"), "class");
        assert_eq!(last_word("parentCategory"), "Category");
        assert_eq!(last_word("parent_category"), "category");
        assert_eq!(last_word("user"), "user");
    }
}
