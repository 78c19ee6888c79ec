//! Schema format detection from file extension and content signatures.
//!
//! Detection order:
//! 1. extension table lookup (unique extensions decide immediately)
//! 2. shared extensions re-check their candidates' content signatures,
//!    then fall back to the extension's default
//! 3. unknown extensions scan the ordered signature list; first full match wins

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::format::FormatId;

/// Directories never descended into during scans.
pub const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    "vendor",
    "target",
    "dist",
    "build",
    "venv",
    "__pycache__",
];

struct ExtensionRule {
    extension: &'static str,
    candidates: &'static [FormatId],
    default: Option<FormatId>,
}

const EXTENSIONS: &[ExtensionRule] = &[
    ExtensionRule { extension: "prisma", candidates: &[FormatId::Prisma], default: None },
    ExtensionRule { extension: "graphql", candidates: &[FormatId::GraphQl], default: None },
    ExtensionRule { extension: "gql", candidates: &[FormatId::GraphQl], default: None },
    ExtensionRule { extension: "sql", candidates: &[FormatId::Sql], default: None },
    ExtensionRule { extension: "dbml", candidates: &[FormatId::Dbml], default: None },
    ExtensionRule { extension: "proto", candidates: &[FormatId::Protobuf], default: None },
    ExtensionRule { extension: "thrift", candidates: &[FormatId::Thrift], default: None },
    ExtensionRule { extension: "avsc", candidates: &[FormatId::Avro], default: None },
    ExtensionRule {
        extension: "json",
        candidates: &[FormatId::Canonical, FormatId::OpenApi, FormatId::JsonSchema, FormatId::Avro],
        default: Some(FormatId::JsonSchema),
    },
    ExtensionRule {
        extension: "yaml",
        candidates: &[FormatId::OpenApi],
        default: Some(FormatId::OpenApi),
    },
    ExtensionRule {
        extension: "yml",
        candidates: &[FormatId::OpenApi],
        default: Some(FormatId::OpenApi),
    },
    ExtensionRule {
        extension: "ts",
        candidates: &[FormatId::Zod, FormatId::TypeOrm, FormatId::TypeScript],
        default: Some(FormatId::TypeScript),
    },
    ExtensionRule {
        extension: "js",
        candidates: &[FormatId::Mongoose, FormatId::Sequelize, FormatId::Joi, FormatId::Zod],
        default: None,
    },
];

/// Ordered content signatures. A format matches when all of its patterns match.
const SIGNATURES: &[(FormatId, &[&str])] = &[
    (FormatId::Canonical, &[r#""version"\s*:"#, r#""entities"\s*:\s*\["#]),
    (FormatId::OpenApi, &[r#"(?m)^\s*"?(openapi|swagger)"?\s*:"#]),
    (FormatId::JsonSchema, &[r#""\$schema"\s*:\s*"[^"]*json-schema"#]),
    (FormatId::Avro, &[r#""type"\s*:\s*"record""#, r#""fields"\s*:\s*\["#]),
    (FormatId::Prisma, &[r"(?m)^\s*model\s+\w+\s*\{"]),
    (FormatId::Protobuf, &[r"(?m)^\s*message\s+\w+\s*\{", r"=\s*\d+\s*;"]),
    (FormatId::Thrift, &[r"(?m)^\s*struct\s+\w+\s*\{", r"(?m)^\s*\d+\s*:"]),
    (FormatId::Dbml, &[r"(?m)^\s*Table\s+\w+\s*(\[[^\]]*\]\s*)?\{"]),
    (FormatId::Sql, &[r"(?i)\bCREATE\s+TABLE\b"]),
    (
        FormatId::GraphQl,
        &[r"(?m)^\s*(type|interface)\s+\w+(\s+implements\s+[\w&,\s]+?)?\s*(@\w+(\([^)]*\))?\s*)*\{"],
    ),
    (FormatId::Zod, &[r"\bz\.object\s*\("]),
    (FormatId::Joi, &[r"\bJoi\.object\s*\("]),
    (FormatId::TypeOrm, &[r"@Entity\s*\(", r"@(Column|PrimaryGeneratedColumn|PrimaryColumn)\s*\("]),
    (FormatId::Mongoose, &[r"new\s+(mongoose\.)?Schema\s*\("]),
    (FormatId::Sequelize, &[r"\.define\s*\(", r"DataTypes\."]),
    (FormatId::TypeScript, &[r"(?m)^\s*(export\s+)?interface\s+\w+"]),
];

static COMPILED_SIGNATURES: Lazy<Vec<(FormatId, Vec<Regex>)>> = Lazy::new(|| {
    SIGNATURES
        .iter()
        .map(|(format, patterns)| {
            let compiled = patterns
                .iter()
                .map(|pattern| Regex::new(pattern).expect("signature pattern is valid"))
                .collect();
            (*format, compiled)
        })
        .collect()
});

/// Detect the format of a schema source.
///
/// `content` is used when the extension is shared or unknown; when absent
/// the file is read, and an unreadable file counts as empty content.
pub fn detect_format(path: &Path, content: Option<&str>) -> Option<FormatId> {
    detect(path, content, true)
}

/// Like [`detect_format`], but shared extensions must match a signature.
///
/// Used by directory scans so `package.json` and friends are not mistaken
/// for schemas.
pub fn detect_format_strict(path: &Path, content: Option<&str>) -> Option<FormatId> {
    detect(path, content, false)
}

fn detect(path: &Path, content: Option<&str>, allow_default: bool) -> Option<FormatId> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    if let Some(rule) = extension
        .as_deref()
        .and_then(|ext| EXTENSIONS.iter().find(|rule| rule.extension == ext))
    {
        if let [only] = rule.candidates {
            return Some(*only);
        }

        let text = load_content(path, content);
        if let Some(format) = rule
            .candidates
            .iter()
            .copied()
            .find(|format| signature_matches(*format, &text))
        {
            return Some(format);
        }
        if allow_default {
            if let Some(format) = rule.default {
                debug!(path = %path.display(), format = %format, "using extension default");
                return Some(format);
            }
        }
        return if allow_default { scan_signatures(&text) } else { None };
    }

    if !allow_default {
        return None;
    }
    let text = load_content(path, content);
    scan_signatures(&text)
}

/// First format whose signature fully matches the content.
pub fn scan_signatures(content: &str) -> Option<FormatId> {
    COMPILED_SIGNATURES
        .iter()
        .find(|(_, patterns)| patterns.iter().all(|pattern| pattern.is_match(content)))
        .map(|(format, _)| *format)
}

fn signature_matches(format: FormatId, content: &str) -> bool {
    COMPILED_SIGNATURES
        .iter()
        .find(|(candidate, _)| *candidate == format)
        .is_some_and(|(_, patterns)| patterns.iter().all(|pattern| pattern.is_match(content)))
}

fn load_content<'a>(path: &Path, content: Option<&'a str>) -> Cow<'a, str> {
    match content {
        Some(text) => Cow::Borrowed(text),
        None => Cow::Owned(std::fs::read_to_string(path).unwrap_or_default()),
    }
}

/// Recursively collect schema files under `root`, sorted by path.
///
/// Hidden entries and dependency-manager directories are skipped, as are
/// any `extra_skips`.
pub fn find_candidate_files(root: &Path, extra_skips: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root, extra_skips, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, extra_skips: &[String], found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if SKIPPED_DIRS.contains(&&*name) || extra_skips.iter().any(|skip| skip.as_str() == &*name) {
                continue;
            }
            walk(&path, extra_skips, found)?;
        } else if file_type.is_file() && detect_format_strict(&path, None).is_some() {
            found.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_extensions_decide_without_content() {
        assert_eq!(detect_format(Path::new("schema.prisma"), Some("")), Some(FormatId::Prisma));
        assert_eq!(detect_format(Path::new("api.GQL"), Some("")), Some(FormatId::GraphQl));
        assert_eq!(detect_format(Path::new("dump.sql"), Some("")), Some(FormatId::Sql));
    }

    #[test]
    fn shared_json_extension_checks_signatures() {
        let openapi = r#"{"openapi": "3.0.0", "components": {}}"#;
        assert_eq!(detect_format(Path::new("api.json"), Some(openapi)), Some(FormatId::OpenApi));

        let canonical = r#"{"version": "0.1", "entities": []}"#;
        assert_eq!(
            detect_format(Path::new("model.json"), Some(canonical)),
            Some(FormatId::Canonical)
        );

        let avro = r#"{"type": "record", "name": "User", "fields": []}"#;
        assert_eq!(detect_format(Path::new("user.json"), Some(avro)), Some(FormatId::Avro));

        assert_eq!(
            detect_format(Path::new("anything.json"), Some("{}")),
            Some(FormatId::JsonSchema)
        );
        assert_eq!(detect_format_strict(Path::new("package.json"), Some("{}")), None);
    }

    #[test]
    fn typescript_variants_are_discriminated() {
        let zod = "export const User = z.object({ id: z.string() });";
        assert_eq!(detect_format(Path::new("user.ts"), Some(zod)), Some(FormatId::Zod));

        let typeorm = "@Entity()\nexport class User {\n  @PrimaryGeneratedColumn()\n  id: number;\n}";
        assert_eq!(detect_format(Path::new("user.ts"), Some(typeorm)), Some(FormatId::TypeOrm));

        let plain = "export interface User { id: string }";
        assert_eq!(detect_format(Path::new("user.ts"), Some(plain)), Some(FormatId::TypeScript));
    }

    #[test]
    fn unknown_extension_scans_signatures_in_order() {
        let prisma = "model User {\n  id Int @id\n}\n";
        assert_eq!(detect_format(Path::new("schema.txt"), Some(prisma)), Some(FormatId::Prisma));

        let graphql = "type Query {\n  users: [User!]!\n}\n";
        assert_eq!(detect_format(Path::new("schema"), Some(graphql)), Some(FormatId::GraphQl));

        let sql = "create table users (id int primary key);";
        assert_eq!(detect_format(Path::new("schema.ddl"), Some(sql)), Some(FormatId::Sql));

        assert_eq!(detect_format(Path::new("notes.txt"), Some("just prose")), None);
    }

    #[test]
    fn js_without_signature_is_not_defaulted() {
        assert_eq!(detect_format(Path::new("index.js"), Some("console.log(1)")), None);
        let mongoose = "const userSchema = new mongoose.Schema({ name: String });";
        assert_eq!(detect_format(Path::new("user.js"), Some(mongoose)), Some(FormatId::Mongoose));
    }
}
