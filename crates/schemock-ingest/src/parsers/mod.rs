//! Built-in schema dialect parsers.

mod canonical;
mod graphql;
mod json_schema;
mod openapi;
mod prisma;
mod shapes;
mod sql;

pub use canonical::{CanonicalDocument, CanonicalParser};
pub use graphql::GraphQlParser;
pub use json_schema::JsonSchemaParser;
pub use openapi::OpenApiParser;
pub use prisma::PrismaParser;
pub use sql::SqlParser;

use crate::parser::SchemaParser;

/// One instance of every built-in parser.
pub fn builtin_parsers() -> Vec<Box<dyn SchemaParser>> {
    vec![
        Box::new(PrismaParser),
        Box::new(GraphQlParser),
        Box::new(SqlParser),
        Box::new(OpenApiParser),
        Box::new(JsonSchemaParser),
        Box::new(CanonicalParser),
    ]
}
