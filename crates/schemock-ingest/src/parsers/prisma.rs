//! Prisma schema parsing.
//!
//! Extracts `model` (and `view`/`type`) blocks as entities, with:
//! - optional (`?`) and list (`[]`) modifiers
//! - `@id`, `@unique`, `@default(..)`, `@relation(..)` field attributes
//! - `@@id([..])` and `@@unique([..])` block attributes

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use schemock_core::{Entity, EntitySet, Error, Field, ForeignKeyLink, Result, UniqueConstraint};

use crate::format::FormatId;
use crate::parser::SchemaParser;

const PRISMA_SCALARS: &[&str] = &[
    "String", "Int", "BigInt", "Float", "Decimal", "Boolean", "DateTime", "Json", "Bytes",
    "Unsupported",
];

/// Regex for a top-level block: `model User {` ... `}`
static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^\s*(model|view|type|enum)\s+(\w+)\s*\{(.*?)^\s*\}").unwrap()
});

/// Regex for a field line: name, type, list marker, optional marker, attributes
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\w+)\s+(\w+(?:\("[^"]*"\))?)(\[\])?(\?)?\s*(.*)$"#).unwrap()
});

/// Regex for `@relation(...)` arguments
static RELATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@relation\(([^)]*)\)").unwrap());

/// Regex for a bracketed list argument such as `fields: [a, b]`
static LIST_ARG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*\[([^\]]*)\]").unwrap());

/// Regex for the relation name, positional or `name:`
static RELATION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?:name\s*:\s*)?"([^"]*)""#).unwrap());

/// Regex for `@@id([...])` / `@@unique([...])`
static BLOCK_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@(id|unique)\(\s*(?:fields\s*:\s*)?\[([^\]]*)\]").unwrap());

static UNIQUE_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@unique\b").unwrap());
static ID_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@id\b").unwrap());

/// Parser for Prisma schema files.
#[derive(Debug, Default)]
pub struct PrismaParser;

impl SchemaParser for PrismaParser {
    fn format(&self) -> FormatId {
        FormatId::Prisma
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["prisma"]
    }

    fn parse_source(&self, source: &str) -> Result<EntitySet> {
        let source = strip_comments(source);

        let mut models = BTreeSet::new();
        for caps in BLOCK_RE.captures_iter(&source) {
            if &caps[1] != "enum" {
                models.insert(caps[2].to_string());
            }
        }
        if models.is_empty() {
            return Err(Error::InvalidSchema("no model blocks found".to_string()));
        }

        let mut set = EntitySet::new();
        for caps in BLOCK_RE.captures_iter(&source) {
            if &caps[1] == "enum" {
                continue;
            }
            set.insert(parse_model(&caps[2], &caps[3], &models)?)?;
        }
        Ok(set)
    }
}

fn strip_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| match line.find("//") {
            Some(index) => &line[..index],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_model(name: &str, body: &str, models: &BTreeSet<String>) -> Result<Entity> {
    let mut entity = Entity::new(name);
    let mut composite_ids: Vec<Vec<String>> = Vec::new();

    for line in body.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with("@@") {
            if let Some(caps) = BLOCK_ATTR_RE.captures(line) {
                let fields = split_list(&caps[2]);
                match &caps[1] {
                    "id" => composite_ids.push(fields),
                    _ => entity.unique_constraints.push(UniqueConstraint::new(fields)),
                }
            }
            continue;
        }

        let caps = FIELD_RE.captures(line).ok_or_else(|| {
            Error::InvalidSchema(format!("cannot parse field in model {name}: `{line}`"))
        })?;
        let field = parse_field(
            &caps[1],
            &caps[2],
            caps.get(3).is_some(),
            caps.get(4).is_some(),
            &caps[5],
            models,
        );
        entity.fields.push(field);
    }

    for fields in composite_ids {
        for field in entity.fields.iter_mut() {
            if fields.contains(&field.name) {
                field.is_identifier = true;
            }
        }
        entity.unique_constraints.push(UniqueConstraint::new(fields));
    }

    Ok(entity)
}

fn parse_field(
    name: &str,
    field_type: &str,
    is_array: bool,
    is_optional: bool,
    attributes: &str,
    models: &BTreeSet<String>,
) -> Field {
    let mut raw_type = field_type.to_string();
    if is_array {
        raw_type.push_str("[]");
    }
    if is_optional {
        raw_type.push('?');
    }

    let base_type = field_type.split('(').next().unwrap_or(field_type);
    let mut field = if models.contains(base_type) && !PRISMA_SCALARS.contains(&base_type) {
        Field::relation(name, base_type)
    } else {
        Field::scalar(name, base_type)
    };
    field = field.raw(raw_type);
    field.is_array = is_array;
    field.is_optional = is_optional;
    field.is_identifier = ID_ATTR_RE.is_match(attributes);
    field.is_unique = field.is_identifier || UNIQUE_ATTR_RE.is_match(attributes);
    field.has_default = attributes.contains("@default(") || attributes.contains("@updatedAt");

    if let Some(caps) = RELATION_RE.captures(attributes) {
        let args = &caps[1];
        let mut link = ForeignKeyLink::to_entity(base_type);
        link.relation_name = RELATION_NAME_RE
            .captures(args)
            .map(|name| name[1].to_string());
        for list in LIST_ARG_RE.captures_iter(args) {
            match &list[1] {
                "fields" => link.fields = split_list(&list[2]),
                "references" => link.references = split_list(&list[2]),
                _ => {}
            }
        }
        field.foreign_key = Some(link);
    }

    field
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|item| item.trim().split('(').next().unwrap_or("").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
