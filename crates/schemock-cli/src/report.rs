use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schemock_ingest::FormatId;
use schemock_resolve::ResolutionOutput;

use crate::CliResult;

/// One resolved schema source, as written by `schemock resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub path: PathBuf,
    pub format: FormatId,
    pub output: ResolutionOutput,
}

impl ResolveReport {
    pub fn new(path: &Path, format: FormatId, output: ResolutionOutput) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            path: path.to_path_buf(),
            format,
            output,
        }
    }
}

/// Write `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
