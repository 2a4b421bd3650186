//! Common types and constants for `fuzzfind`

use std::path::{Path, PathBuf};

/// Number of matches returned when the caller does not ask for a limit
pub const DEFAULT_LIMIT: usize = 10;

/// Minimum similarity a file name needs to be returned
pub const DEFAULT_CUTOFF: f64 = 0.6;

/// Capacity of the bounded candidate queue between traversal and scoring
pub const DEFAULT_QUEUE_SIZE: usize = 1_024;

/// Upper bound on scorer threads picked by default
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// Root searched when the caller passes none
#[cfg(windows)]
pub const DEFAULT_ROOT: &str = "C:\\";

/// Root searched when the caller passes none
#[cfg(not(windows))]
pub const DEFAULT_ROOT: &str = "/";

/// A regular file found during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Final path component, compared against the query
    pub name:  String,
    /// Full path of the file
    pub path:  PathBuf,
    /// Discovery sequence number, assigned once by the crawler
    pub order: u64,
}

impl Candidate {
    /// Build a candidate for `path`, taking the name from its last component
    #[must_use]
    pub fn new(path: PathBuf, order: u64) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Self { name, path, order }
    }
}

/// A candidate with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// The matched file
    pub candidate: Candidate,
    /// Similarity score (0.0 to 1.0)
    pub score:     f64,
}

impl ScoredCandidate {
    /// Path of the matched file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.candidate.path
    }
}

const _: () = {
    assert!(DEFAULT_LIMIT > 0);
    assert!(DEFAULT_CUTOFF >= 0.0 && DEFAULT_CUTOFF <= 1.0);
    assert!(DEFAULT_QUEUE_SIZE > 0);
    assert!(MAX_DEFAULT_WORKERS > 0);
};
