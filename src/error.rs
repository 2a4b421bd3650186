//! Error types for `fuzzfind`

use std::path::PathBuf;

use arrayvec::ArrayString;
use thiserror::Error;

/// Maximum length of user-facing error messages
pub const MAX_ERROR_LENGTH: usize = 256;

/// Custom result type for `fuzzfind` operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for `fuzzfind`
///
/// Input errors (`InvalidRoot`, `InvalidK`, `InvalidCutoff`, `InvalidQuery`,
/// `InvalidPattern`) are raised before any traversal starts. `SubtreeUnreadable`
/// is only ever handed to a [`SearchObserver`](crate::observer::SearchObserver);
/// a search never returns it.
#[derive(Debug, Error)]
pub enum Error {
    /// IO operation failed
    #[error("Error: {0}")]
    Io(#[from] std::io::Error),

    /// Search root is missing or is not a directory
    #[error("Error: Search root is not a directory: {}", path.display())]
    InvalidRoot {
        /// The rejected root
        path: PathBuf,
    },

    /// A directory could not be listed; its subtree was skipped
    #[error("Error: Skipped unreadable directory {}: {source}", path.display())]
    SubtreeUnreadable {
        /// Directory whose listing failed
        path:   PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Result limit must be at least one
    #[error("Error: Result limit must be at least 1")]
    InvalidK,

    /// Similarity cutoff outside `[0, 1]`
    #[error("Error: Similarity cutoff {0} is outside [0, 1]")]
    InvalidCutoff(f64),

    /// Query rejected before searching
    #[error("Error: Invalid query: {0}")]
    InvalidQuery(&'static str),

    /// Exclude pattern failed to compile
    #[error("Error: {0}")]
    InvalidPattern(Box<ArrayString<MAX_ERROR_LENGTH>>),

    /// Record sink refused the store name or fields
    #[error("Error: {0}")]
    InvalidRecord(Box<ArrayString<MAX_ERROR_LENGTH>>),

    /// Tool call was malformed or named an unknown tool
    #[error("Error: {0}")]
    InvalidCall(Box<ArrayString<MAX_ERROR_LENGTH>>),

    /// Date did not parse as `YYYY-MM-DD`
    #[error("Error: Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The search was cancelled before it completed
    #[error("Error: Search cancelled")]
    Cancelled,
}

/// Copy `msg` into a fixed-size buffer, truncating on a char boundary
fn bounded(msg: &str) -> Box<ArrayString<MAX_ERROR_LENGTH>> {
    let mut buf = ArrayString::new();
    for c in msg.chars() {
        if buf.try_push(c).is_err() {
            break;
        }
    }
    Box::new(buf)
}

impl Error {
    /// Create a new pattern error
    pub fn pattern(msg: &str) -> Self {
        Self::InvalidPattern(bounded(msg))
    }

    /// Create a new record error
    pub fn record(msg: &str) -> Self {
        Self::InvalidRecord(bounded(msg))
    }

    /// Create a new tool call error
    pub fn call(msg: &str) -> Self {
        Self::InvalidCall(bounded(msg))
    }

    /// Get a user-friendly error message with action items
    #[must_use]
    pub fn user_message(&self) -> ArrayString<MAX_ERROR_LENGTH> {
        let tip = match self {
            Self::Io(_) => "Check file permissions and try again",
            Self::InvalidRoot { .. } => "Pass an existing directory as the search root",
            Self::SubtreeUnreadable { .. } => "Run with --verbose to list skipped directories",
            Self::InvalidK => "Use --limit with a value of 1 or more",
            Self::InvalidCutoff(_) => "Use --cutoff with a value between 0.0 and 1.0",
            Self::InvalidQuery(_) => "Try a non-empty file name",
            Self::InvalidPattern(_) => "Check the --exclude glob syntax",
            Self::InvalidRecord(_) => "Use a plain file name without directories",
            Self::InvalidCall(_) => "Send one JSON object per line with \"tool\" and \"args\"",
            Self::InvalidDate(_) => "Dates look like 2025-05-04",
            Self::Cancelled => "Raise --timeout or narrow the search root",
        };

        let mut msg = ArrayString::new();
        for c in self.to_string().chars().chain("\nTip: ".chars()).chain(tip.chars()) {
            if msg.try_push(c).is_err() {
                break;
            }
        }
        msg
    }
}
