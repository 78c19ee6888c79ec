use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use schemock_core::EntitySet;

use crate::cache::{ContentHashCache, SchemaCache};
use crate::detect::{detect_format, find_candidate_files};
use crate::error::{IngestError, Result};
use crate::format::FormatId;
use crate::options::IngestOptions;
use crate::parser::{SchemaParser, SchemaValidation};
use crate::parsers::builtin_parsers;

/// Dispatches schema sources to the parser registered for their format.
pub struct ParserRegistry {
    parsers: BTreeMap<FormatId, Box<dyn SchemaParser>>,
    cache: Option<Box<dyn SchemaCache>>,
    options: IngestOptions,
}

impl ParserRegistry {
    /// Registry without parsers or cache.
    pub fn new() -> Self {
        Self {
            parsers: BTreeMap::new(),
            cache: None,
            options: IngestOptions::default(),
        }
    }

    /// Registry with every built-in parser and a content-hash cache.
    pub fn with_builtin_parsers() -> Self {
        Self::with_options(IngestOptions::default())
    }

    /// Registry with every built-in parser, configured by `options`.
    pub fn with_options(options: IngestOptions) -> Self {
        let cache: Option<Box<dyn SchemaCache>> = options
            .cache
            .then(|| Box::new(ContentHashCache::new(options.cache_ttl)) as Box<dyn SchemaCache>);
        let mut registry = Self {
            parsers: BTreeMap::new(),
            cache,
            options,
        };
        for parser in builtin_parsers() {
            registry.register(parser);
        }
        registry
    }

    /// Register a parser, replacing any parser for the same format.
    pub fn register(&mut self, parser: Box<dyn SchemaParser>) {
        let format = parser.format();
        if self.parsers.insert(format, parser).is_some() {
            debug!(format = %format, "replaced registered parser");
        }
    }

    /// Replace the cache collaborator.
    pub fn with_cache(mut self, cache: Box<dyn SchemaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Formats with a registered parser, in format order.
    pub fn supported_formats(&self) -> Vec<FormatId> {
        self.parsers.keys().copied().collect()
    }

    pub fn get_parser(&self, format: FormatId) -> Result<&dyn SchemaParser> {
        self.parsers
            .get(&format)
            .map(|parser| parser.as_ref())
            .ok_or_else(|| IngestError::UnsupportedFormat(format.to_string()))
    }

    /// Detect the format of a source; see [`detect_format`].
    pub fn detect_schema_type(&self, path: &Path, content: Option<&str>) -> Option<FormatId> {
        detect_format(path, content)
    }

    /// Schema files under `root`, honouring the configured skip list.
    pub fn find_schema_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let files = find_candidate_files(root, &self.options.skip_dirs)?;
        info!(root = %root.display(), files = files.len(), "schema scan finished");
        Ok(files)
    }

    /// Parse a schema source into the canonical entity model.
    ///
    /// An explicit `format` bypasses detection.
    pub fn parse(&self, path: &Path, format: Option<FormatId>) -> Result<EntitySet> {
        let format = self.resolve_format(path, format)?;
        let parser = self.get_parser(format)?;

        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get_cached(path, format)) {
            debug!(path = %path.display(), format = %format, "schema cache hit");
            return Ok(cached);
        }

        let entities = parser.parse_schema(path)?;
        if let Some(cache) = &self.cache {
            cache.set_cached(path, format, &entities);
        }

        info!(
            path = %path.display(),
            format = %format,
            entities = entities.len(),
            "schema parsed"
        );
        Ok(entities)
    }

    /// Parse and structurally validate a schema source.
    pub fn validate(&self, path: &Path, format: Option<FormatId>) -> Result<SchemaValidation> {
        let format = self.resolve_format(path, format)?;
        let validation = self.get_parser(format)?.validate_schema(path);
        info!(
            path = %path.display(),
            format = %format,
            valid = validation.valid,
            errors = validation.errors.len(),
            "schema validated"
        );
        Ok(validation)
    }

    fn resolve_format(&self, path: &Path, format: Option<FormatId>) -> Result<FormatId> {
        if let Some(format) = format {
            return Ok(format);
        }
        if !path.exists() {
            return Err(IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        self.detect_schema_type(path, None)
            .ok_or_else(|| IngestError::FormatDetectionFailed {
                path: path.to_path_buf(),
            })
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtin_parsers()
    }
}
