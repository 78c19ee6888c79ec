use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use schemock_ingest::IngestOptions;
use schemock_resolve::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_PASSES, DEFAULT_STRATEGY, InferenceOptions,
    ResolveOptions,
};

use crate::{CliError, CliResult};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "schemock.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveSettings {
    pub strategy: String,
    pub confidence_threshold: f64,
    pub max_passes: usize,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            strategy: DEFAULT_STRATEGY.to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub cache: bool,
    pub cache_ttl_secs: u64,
    pub skip_dirs: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            cache: true,
            cache_ttl_secs: 300,
            skip_dirs: Vec::new(),
        }
    }
}

/// Contents of `schemock.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub resolve: ResolveSettings,
    pub ingest: IngestSettings,
}

impl Settings {
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            inference: InferenceOptions {
                confidence_threshold: self.resolve.confidence_threshold,
            },
            strategy: self.resolve.strategy.clone(),
            max_passes: self.resolve.max_passes,
        }
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            cache: self.ingest.cache,
            cache_ttl: Duration::from_secs(self.ingest.cache_ttl_secs),
            skip_dirs: self.ingest.skip_dirs.clone(),
        }
    }

    fn check(self, path: &Path) -> CliResult<Self> {
        let threshold = self.resolve.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CliError::InvalidConfig(format!(
                "{}: confidence_threshold must be within [0, 1], got {threshold}",
                path.display()
            )));
        }
        if self.resolve.max_passes == 0 {
            return Err(CliError::InvalidConfig(format!(
                "{}: max_passes must be at least 1",
                path.display()
            )));
        }
        Ok(self)
    }
}

/// Load settings from `explicit`, else from `schemock.toml` in `cwd` if it
/// exists, else defaults. An explicit path that does not exist is an error.
pub fn load_settings(explicit: Option<&Path>, cwd: &Path) -> CliResult<(Settings, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = cwd.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                return Ok((Settings::default(), None));
            }
            candidate
        }
    };

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = toml::from_str(&content)?;
    let settings = settings.check(&path)?;
    Ok((settings, Some(path)))
}
