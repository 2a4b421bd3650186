//! Search and tool configuration
//!
//! Match count and similarity cutoff are tunable with defaults rather than
//! fixed. Validation happens here so a bad value is rejected before any
//! directory is listed.

use std::path::PathBuf;
use std::thread;

use crate::error::{Error, Result};
use crate::types::{DEFAULT_CUTOFF, DEFAULT_LIMIT, DEFAULT_QUEUE_SIZE, MAX_DEFAULT_WORKERS};

/// Tunables for one search call
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of matches returned (`k`)
    pub limit:        usize,
    /// Minimum similarity for a match
    pub cutoff:       f64,
    /// Scorer threads; `0` or `1` scores on the calling thread
    pub workers:      usize,
    /// Capacity of the candidate and result queues
    pub queue_size:   usize,
    /// Deepest directory level entered, root is `0`
    pub max_depth:    Option<usize>,
    /// Descend into symlinked directories
    pub follow_links: bool,
    /// Glob patterns for file and directory names to skip
    pub exclude:      Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map_or(1, std::num::NonZeroUsize::get)
            .min(MAX_DEFAULT_WORKERS);
        Self {
            limit: DEFAULT_LIMIT,
            cutoff: DEFAULT_CUTOFF,
            workers,
            queue_size: DEFAULT_QUEUE_SIZE,
            max_depth: None,
            follow_links: true,
            exclude: Vec::new(),
        }
    }
}

impl SearchConfig {
    /// Set the result limit
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the similarity cutoff
    #[must_use]
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Set the number of scorer threads
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check ranking parameters
    ///
    /// # Errors
    /// Returns `InvalidK` for a zero limit and `InvalidCutoff` for a cutoff
    /// outside `[0, 1]` (including NaN).
    pub fn validate(&self) -> Result<()> {
        validate_rank_params(self.limit, self.cutoff)
    }
}

/// Check `k` and `cutoff` for a ranking call
///
/// # Errors
/// Returns `InvalidK` when `k == 0` and `InvalidCutoff` when `cutoff` is not
/// within `[0, 1]`.
pub fn validate_rank_params(k: usize, cutoff: f64) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidK);
    }
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(Error::InvalidCutoff(cutoff));
    }
    Ok(())
}

/// Settings shared by the tool handlers
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory holding `journal/`, `logs/` and `reminders/`
    pub data_dir: PathBuf,
    /// Settings for `search_file_by_name`
    pub search:   SearchConfig,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("data"), search: SearchConfig::default() }
    }
}
