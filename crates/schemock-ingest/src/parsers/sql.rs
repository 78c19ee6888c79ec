//! SQL DDL parsing for schema extraction.
//!
//! Parses CREATE TABLE and ALTER TABLE statements to extract:
//! - Column definitions with types and nullability
//! - Primary key and unique constraints
//! - Foreign key constraints, attached to the referencing column

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use schemock_core::{Entity, EntitySet, Error, Field, ForeignKeyLink, Result, UniqueConstraint};

use crate::format::FormatId;
use crate::parser::SchemaParser;

/// Regex to extract table name from CREATE TABLE, with optional schema prefix and quoting
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+(?:TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#)
        .unwrap()
});

/// Regex to extract table name from ALTER TABLE
static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*ALTER\s+TABLE\s+(?:ONLY\s+)?(?:IF\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s]+)[\]`"]?"#)
        .unwrap()
});

/// Regex for column definition: name and type with optional precision
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?\s+(\w+(?:\s+varying)?(?:\s*\([^)]*\))?(?:\s+unsigned)?(?:\s*\[\])?)"#)
        .unwrap()
});

static PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)PRIMARY\s+KEY\s*\(([^)]+)\)").unwrap());

static UNIQUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(?:CONSTRAINT\s+[\[`"]?(\w+)[\]`"]?\s+)?UNIQUE(?:\s+(?:KEY|INDEX))?(?:\s+[\[`"]?\w+[\]`"]?)?\s*\(([^)]+)\)"#)
        .unwrap()
});

/// Regex for FOREIGN KEY constraint with optional constraint name
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*(?:\(([^)]+)\))?"#,
    )
    .unwrap()
});

/// Regex for inline column REFERENCES
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bREFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*(?:\(([^)]+)\))?"#)
        .unwrap()
});

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());
static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());
static INLINE_UNIQUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());
static DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(DEFAULT|AUTO_INCREMENT|AUTOINCREMENT|IDENTITY)\b|\bSERIAL\b").unwrap());
static SERIAL_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(small|big)?serial\d?$").unwrap());

static LINE_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"--[^\n]*").unwrap());
static BLOCK_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

const TABLE_CONSTRAINT_PREFIXES: &[&str] = &[
    "PRIMARY KEY",
    "CONSTRAINT ",
    "FOREIGN KEY",
    "UNIQUE ",
    "UNIQUE(",
    "KEY ",
    "INDEX ",
    "FULLTEXT ",
    "SPATIAL ",
    "CHECK ",
    "CHECK(",
    "EXCLUDE ",
];

/// Parser for SQL DDL files.
#[derive(Debug, Default)]
pub struct SqlParser;

impl SchemaParser for SqlParser {
    fn format(&self) -> FormatId {
        FormatId::Sql
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["sql"]
    }

    fn parse_source(&self, source: &str) -> Result<EntitySet> {
        let source = BLOCK_COMMENT_RE.replace_all(source, "");
        let source = LINE_COMMENT_RE.replace_all(&source, "");

        let mut set = EntitySet::new();
        let mut alters = Vec::new();

        for stmt in split_statements(&source) {
            if CREATE_TABLE_NAME_RE.is_match(&stmt) {
                set.insert(parse_create_table(&stmt)?)?;
            } else if ALTER_TABLE_NAME_RE.is_match(&stmt) {
                alters.push(stmt);
            }
        }

        if set.is_empty() {
            return Err(Error::InvalidSchema("no CREATE TABLE statements found".to_string()));
        }

        let mut entities: Vec<Entity> = set.into_entities().collect();
        for stmt in alters {
            apply_alter_table(&stmt, &mut entities);
        }
        EntitySet::from_entities(entities)
    }
}

/// Split source into statements on `;`, ignoring semicolons inside quotes
fn split_statements(source: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in source.chars() {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                }
                current.push(ch);
            }
            None if ch == '\'' || ch == '"' || ch == '`' => {
                quote = Some(ch);
                current.push(ch);
            }
            None if ch == ';' => {
                if !current.trim().is_empty() {
                    statements.push(current.trim().to_string());
                }
                current.clear();
            }
            None => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements
}

fn parse_create_table(stmt: &str) -> Result<Entity> {
    let name = CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidSchema("CREATE TABLE without a table name".to_string()))?;
    let body = extract_table_body(stmt)
        .ok_or_else(|| Error::InvalidSchema(format!("table {name} has no column list")))?;

    let mut entity = Entity::new(&name);
    let mut constraints = Vec::new();

    for part in split_table_body(body) {
        let upper = part.to_uppercase();
        if TABLE_CONSTRAINT_PREFIXES
            .iter()
            .any(|prefix| upper.starts_with(prefix))
        {
            constraints.push(part);
            continue;
        }
        match parse_column_def(&part) {
            Some(field) => entity.fields.push(field),
            None => debug!(table = %name, definition = %part, "skipping unrecognized column definition"),
        }
    }

    for constraint in constraints {
        apply_table_constraint(&constraint, &mut entity);
    }

    // Primary key columns are never optional.
    for field in entity.fields.iter_mut().filter(|field| field.is_identifier) {
        field.is_optional = false;
    }

    Ok(entity)
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching ))
fn extract_table_body(stmt: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;

    for (index, ch) in stmt.char_indices() {
        if ch == '\'' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }

        match ch {
            '(' => {
                if depth == 0 {
                    start = Some(index + 1);
                }
                depth += 1;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return start.map(|begin| &stmt[begin..index]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Split table body by commas, respecting nested parentheses and quotes
fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;

    for ch in body.chars() {
        if ch == '\'' {
            in_string = !in_string;
        }
        if !in_string {
            match ch {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    if !current.trim().is_empty() {
                        parts.push(current.trim().to_string());
                    }
                    current.clear();
                    continue;
                }
                _ => {}
            }
        }
        current.push(ch);
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn parse_column_def(def: &str) -> Option<Field> {
    let caps = COLUMN_DEF_RE.captures(def)?;
    let name = caps.get(1)?.as_str();
    let raw_type = caps.get(2)?.as_str();
    let base_type = raw_type
        .split(|ch: char| ch == '(' || ch == '[')
        .next()
        .unwrap_or(raw_type)
        .trim()
        .to_ascii_lowercase();

    let mut field = Field::scalar(name, base_type.clone()).raw(raw_type);
    let rest = &def[caps.get(0)?.end()..];

    field.is_array = raw_type.ends_with("[]");
    field.is_identifier = INLINE_PRIMARY_KEY_RE.is_match(rest);
    field.is_unique = field.is_identifier || INLINE_UNIQUE_RE.is_match(rest);
    field.is_optional = !field.is_identifier && !NOT_NULL_RE.is_match(rest);
    field.has_default = DEFAULT_RE.is_match(rest) || SERIAL_TYPE_RE.is_match(&base_type);

    if let Some(length) = raw_type
        .split_once('(')
        .and_then(|(_, args)| args.strip_suffix(')'))
    {
        field.constraints.insert("length".to_string(), length.trim().to_string());
    }

    if let Some(reference) = INLINE_REFERENCES_RE.captures(rest) {
        field.foreign_key = Some(ForeignKeyLink {
            target_entity: Some(reference[1].to_string()),
            fields: vec![name.to_string()],
            references: reference
                .get(2)
                .map(|cols| parse_column_list(cols.as_str()))
                .unwrap_or_default(),
            relation_name: None,
        });
    }

    Some(field)
}

fn apply_table_constraint(constraint: &str, entity: &mut Entity) {
    if let Some(caps) = FOREIGN_KEY_RE.captures(constraint) {
        attach_foreign_key(&caps, entity);
        return;
    }

    if let Some(caps) = PRIMARY_KEY_RE.captures(constraint) {
        let columns = parse_column_list(&caps[1]);
        for field in entity.fields.iter_mut() {
            if columns.iter().any(|col| col.eq_ignore_ascii_case(&field.name)) {
                field.is_identifier = true;
                if columns.len() == 1 {
                    field.is_unique = true;
                }
            }
        }
        if columns.len() > 1 {
            entity.unique_constraints.push(UniqueConstraint::new(columns));
        }
        return;
    }

    if let Some(caps) = UNIQUE_RE.captures(constraint) {
        let columns = parse_column_list(&caps[2]);
        if let [only] = columns.as_slice() {
            if let Some(field) = entity.fields.iter_mut().find(|field| &field.name == only) {
                field.is_unique = true;
            }
        }
        entity.unique_constraints.push(UniqueConstraint {
            name: caps.get(1).map(|m| m.as_str().to_string()),
            fields: columns,
        });
    }
}

fn apply_alter_table(stmt: &str, entities: &mut [Entity]) {
    let Some(table) = ALTER_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        return;
    };
    let Some(entity) = entities
        .iter_mut()
        .find(|entity| entity.name.eq_ignore_ascii_case(table))
    else {
        debug!(table, "ALTER TABLE for unknown table ignored");
        return;
    };

    for caps in FOREIGN_KEY_RE.captures_iter(stmt) {
        attach_foreign_key(&caps, entity);
    }
}

fn attach_foreign_key(caps: &regex::Captures<'_>, entity: &mut Entity) {
    let local = caps
        .get(2)
        .map(|m| parse_column_list(m.as_str()))
        .unwrap_or_default();
    let Some(first) = local.first() else {
        return;
    };
    let link = ForeignKeyLink {
        target_entity: caps.get(3).map(|m| m.as_str().to_string()),
        fields: local.clone(),
        references: caps
            .get(4)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default(),
        relation_name: caps.get(1).map(|m| m.as_str().to_string()),
    };

    match entity
        .fields
        .iter_mut()
        .find(|field| field.name.eq_ignore_ascii_case(first))
    {
        Some(field) => field.foreign_key = Some(link),
        None => debug!(table = %entity.name, column = %first, "foreign key on unknown column"),
    }
}

/// Parse column list from "col1, `col2`, \"col3\""
fn parse_column_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|col| {
            col.trim()
                .trim_matches(|ch| ch == '`' || ch == '"' || ch == '[' || ch == ']')
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_string()
        })
        .filter(|col| !col.is_empty())
        .collect()
}
