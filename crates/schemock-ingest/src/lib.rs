//! Schema ingestion: format detection, parser dispatch and caching.

pub mod cache;
pub mod detect;
pub mod error;
pub mod format;
pub mod options;
pub mod parser;
pub mod parsers;
pub mod registry;

pub use cache::{ContentHashCache, SchemaCache, content_hash};
pub use detect::{SKIPPED_DIRS, detect_format, detect_format_strict, find_candidate_files};
pub use error::{IngestError, Result};
pub use format::FormatId;
pub use options::IngestOptions;
pub use parser::{SchemaParser, SchemaValidation};
pub use parsers::{
    CanonicalDocument, CanonicalParser, GraphQlParser, JsonSchemaParser, OpenApiParser,
    PrismaParser, SqlParser, builtin_parsers,
};
pub use registry::ParserRegistry;
