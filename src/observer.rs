//! Observability hook for the search path
//!
//! The crawler and pipeline never log on their own. They report
//! [`SearchEvent`]s to a caller-supplied [`SearchObserver`], which keeps the
//! search testable without capturing log output.

use std::path::Path;

use tracing::{debug, info, trace, warn};

use crate::error::Error;

/// Something that happened during a search call
#[derive(Debug)]
pub enum SearchEvent<'a> {
    /// Search accepted its inputs and is about to walk `root`
    Started {
        /// Search root
        root:  &'a Path,
        /// Query file name
        query: &'a str,
    },
    /// A directory could not be listed and its subtree was skipped
    SubtreeSkipped {
        /// Always `Error::SubtreeUnreadable`
        error: &'a Error,
    },
    /// A directory was listed and its files handed out
    DirectoryListed {
        /// Directory that was listed
        path:  &'a Path,
        /// Files it contributed
        files: usize,
    },
    /// A directory was reached again through a link and not re-entered
    CycleSkipped {
        /// Path the directory was reached through
        path: &'a Path,
    },
    /// The walk finished without being cancelled
    Finished {
        /// Regular files seen
        files:   u64,
        /// Directories listed
        dirs:    u64,
        /// Directories skipped as unreadable
        skipped: u64,
        /// Matches returned
        matches: usize,
    },
}

/// Receives search events; must be callable from the traversal thread
pub trait SearchObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &SearchEvent<'_>);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {
    fn on_event(&self, _event: &SearchEvent<'_>) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SearchObserver for TracingObserver {
    fn on_event(&self, event: &SearchEvent<'_>) {
        match event {
            SearchEvent::Started { root, query } => {
                info!("Starting fuzzy file search for '{query}' under {}", root.display());
            },
            SearchEvent::SubtreeSkipped { error } => warn!("{error}"),
            SearchEvent::DirectoryListed { path, files } => {
                trace!("Listed {} ({files} files)", path.display());
            },
            SearchEvent::CycleSkipped { path } => {
                debug!("Not re-entering already visited directory {}", path.display());
            },
            SearchEvent::Finished { files, dirs, skipped, matches } => {
                info!(
                    "Search finished: {matches} matches in {files} files ({dirs} directories, \
                     {skipped} skipped)"
                );
            },
        }
    }
}
