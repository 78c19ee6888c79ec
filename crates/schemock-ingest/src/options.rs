use std::time::Duration;

/// Options that control how schema sources are discovered and cached.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Cache parsed entity sets keyed by content hash.
    pub cache: bool,
    pub cache_ttl: Duration,
    /// Directory names skipped during scans, on top of the built-in list.
    pub skip_dirs: Vec<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            cache: true,
            cache_ttl: Duration::from_secs(300),
            skip_dirs: Vec::new(),
        }
    }
}
