//! GraphQL SDL parsing.
//!
//! Object and interface types become entities; root operation types are
//! skipped. `extend type` blocks merge into the type they extend.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use schemock_core::{Entity, EntitySet, Error, Field, ForeignKeyLink, Result};

use crate::format::FormatId;
use crate::parser::SchemaParser;

const ROOT_TYPES: &[&str] = &["Query", "Mutation", "Subscription"];

static BLOCK_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?s)""".*?""""#).unwrap());
static LINE_DESCRIPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*"[^"\n]*"\s*$"#).unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)#[^\n]*$").unwrap());

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(extend\s+)?\b(type|interface|input|enum)\s+(\w+)[^{}]*\{([^{}]*)\}").unwrap()
});

/// Field arguments, removed before field lines are read: `posts(first: Int): [Post]`
static FIELD_ARGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\s*\([^)]*\)\s*:").unwrap());

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\w+)\s*:\s*(\[\s*(\w+)\s*(!?)\s*\]|(\w+))\s*(!?)\s*(.*)$").unwrap()
});

static RELATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@relation\s*\(([^)]*)\)").unwrap());
static NAME_ARG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name\s*:\s*"([^"]*)""#).unwrap());
static LIST_ARG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*\[([^\]]*)\]").unwrap());

/// Parser for GraphQL schema definition files.
#[derive(Debug, Default)]
pub struct GraphQlParser;

impl SchemaParser for GraphQlParser {
    fn format(&self) -> FormatId {
        FormatId::GraphQl
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["graphql", "gql"]
    }

    fn parse_source(&self, source: &str) -> Result<EntitySet> {
        let source = clean_source(source);

        let object_types: BTreeSet<String> = BLOCK_RE
            .captures_iter(&source)
            .filter(|caps| matches!(&caps[2], "type" | "interface"))
            .map(|caps| caps[3].to_string())
            .filter(|name| !ROOT_TYPES.contains(&name.as_str()))
            .collect();
        if object_types.is_empty() {
            return Err(Error::InvalidSchema("no object types found".to_string()));
        }

        let mut entities: BTreeMap<String, Entity> = BTreeMap::new();
        for caps in BLOCK_RE.captures_iter(&source) {
            let name = &caps[3];
            if !object_types.contains(name) {
                continue;
            }

            let entity = entities
                .entry(name.to_string())
                .or_insert_with(|| Entity::new(name));
            for field in parse_fields(name, &caps[4], &object_types)? {
                if entity.field(&field.name).is_none() {
                    entity.fields.push(field);
                }
            }
        }

        EntitySet::from_entities(entities.into_values())
    }
}

fn clean_source(source: &str) -> String {
    let source = BLOCK_STRING_RE.replace_all(source, "");
    let source = LINE_DESCRIPTION_RE.replace_all(&source, "");
    COMMENT_RE.replace_all(&source, "").into_owned()
}

fn parse_fields(entity: &str, body: &str, object_types: &BTreeSet<String>) -> Result<Vec<Field>> {
    let body = FIELD_ARGS_RE.replace_all(body, "$1:");
    let mut fields = Vec::new();

    for line in body.lines().map(|line| line.trim().trim_end_matches(',')) {
        if line.is_empty() {
            continue;
        }
        let caps = FIELD_RE.captures(line).ok_or_else(|| {
            Error::InvalidSchema(format!("cannot parse field in type {entity}: `{line}`"))
        })?;

        let is_array = caps.get(3).is_some();
        let base_type = caps
            .get(3)
            .or_else(|| caps.get(5))
            .map_or("", |m| m.as_str());
        let required = &caps[6] == "!";
        let directives = &caps[7];

        let mut field = if object_types.contains(base_type) {
            Field::relation(&caps[1], base_type)
        } else {
            Field::scalar(&caps[1], base_type)
        };
        field = field.raw(format!("{}{}", &caps[2], &caps[6]));
        field.is_array = is_array;
        field.is_optional = !required;
        field.is_identifier = base_type == "ID" || directives.contains("@id");
        field.is_unique = field.is_identifier || directives.contains("@unique");
        field.has_default = directives.contains("@default");

        if let Some(relation) = RELATION_RE.captures(directives) {
            let args = &relation[1];
            let mut link = ForeignKeyLink::to_entity(base_type);
            link.relation_name = NAME_ARG_RE.captures(args).map(|name| name[1].to_string());
            for list in LIST_ARG_RE.captures_iter(args) {
                let items = list[2]
                    .split(',')
                    .map(|item| item.trim().trim_matches('"').to_string())
                    .filter(|item| !item.is_empty())
                    .collect();
                match &list[1] {
                    "fields" => link.fields = items,
                    "references" => link.references = items,
                    _ => {}
                }
            }
            field.foreign_key = Some(link);
        }

        fields.push(field);
    }

    Ok(fields)
}
