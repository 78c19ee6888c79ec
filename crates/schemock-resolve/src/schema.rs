use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::plan::ResolutionOutput;

/// Emit the JSON Schema for serialized resolution output.
pub fn resolution_output_json_schema() -> RootSchema {
    schema_for!(ResolutionOutput)
}
