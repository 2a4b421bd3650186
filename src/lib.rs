//! `fuzzfind` - Fuzzy file name search and personal logging tools.
//!
//! The core walks a directory tree and keeps the `k` file names most similar
//! to a query, in memory bounded by `k` rather than by the size of the tree.
//! The [`tools`] module wraps it, together with CSV journal and reminder
//! logging, for a tool-calling host.

#![deny(
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]

pub mod cancel;
pub mod config;
pub mod crawler;
pub mod error;
pub mod observer;
pub mod rank;
pub mod search;
pub mod similarity;
pub mod tools;
pub mod types;

pub use cancel::CancelToken;
pub use config::{SearchConfig, ToolContext};
pub use error::{Error, Result};
pub use search::Searcher;
pub use types::{Candidate, ScoredCandidate};
