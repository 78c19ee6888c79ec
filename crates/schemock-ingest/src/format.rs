use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Schema dialects the detector recognises.
///
/// Recognising a dialect does not imply a parser for it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatId {
    #[serde(rename = "prisma")]
    Prisma,
    #[serde(rename = "graphql")]
    GraphQl,
    #[serde(rename = "sql")]
    Sql,
    #[serde(rename = "dbml")]
    Dbml,
    #[serde(rename = "openapi")]
    OpenApi,
    #[serde(rename = "json-schema")]
    JsonSchema,
    #[serde(rename = "canonical")]
    Canonical,
    #[serde(rename = "protobuf")]
    Protobuf,
    #[serde(rename = "thrift")]
    Thrift,
    #[serde(rename = "avro")]
    Avro,
    #[serde(rename = "typescript")]
    TypeScript,
    #[serde(rename = "zod")]
    Zod,
    #[serde(rename = "joi")]
    Joi,
    #[serde(rename = "typeorm")]
    TypeOrm,
    #[serde(rename = "mongoose")]
    Mongoose,
    #[serde(rename = "sequelize")]
    Sequelize,
}

impl FormatId {
    pub const ALL: [FormatId; 16] = [
        FormatId::Prisma,
        FormatId::GraphQl,
        FormatId::Sql,
        FormatId::Dbml,
        FormatId::OpenApi,
        FormatId::JsonSchema,
        FormatId::Canonical,
        FormatId::Protobuf,
        FormatId::Thrift,
        FormatId::Avro,
        FormatId::TypeScript,
        FormatId::Zod,
        FormatId::Joi,
        FormatId::TypeOrm,
        FormatId::Mongoose,
        FormatId::Sequelize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatId::Prisma => "prisma",
            FormatId::GraphQl => "graphql",
            FormatId::Sql => "sql",
            FormatId::Dbml => "dbml",
            FormatId::OpenApi => "openapi",
            FormatId::JsonSchema => "json-schema",
            FormatId::Canonical => "canonical",
            FormatId::Protobuf => "protobuf",
            FormatId::Thrift => "thrift",
            FormatId::Avro => "avro",
            FormatId::TypeScript => "typescript",
            FormatId::Zod => "zod",
            FormatId::Joi => "joi",
            FormatId::TypeOrm => "typeorm",
            FormatId::Mongoose => "mongoose",
            FormatId::Sequelize => "sequelize",
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = IngestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        FormatId::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .ok_or_else(|| IngestError::UnsupportedFormat(value.to_string()))
    }
}
