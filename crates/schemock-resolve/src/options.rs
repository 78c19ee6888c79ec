/// Confidence at or above which an inferred relation enters the graph.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Name of the strategy used when none is configured.
pub const DEFAULT_STRATEGY: &str = "smart-break";

/// Upper bound on resolve/re-detect passes for one schema.
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Options for relation inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceOptions {
    pub confidence_threshold: f64,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Options for a full dependency resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveOptions {
    pub inference: InferenceOptions,
    /// Strategy to run; must be registered with the resolver.
    pub strategy: String,
    pub max_passes: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            inference: InferenceOptions::default(),
            strategy: DEFAULT_STRATEGY.to_string(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}
