//! Tool handlers exposed to a tool-calling host
//!
//! Every handler goes through a [`Toolbox`], which owns the data directory,
//! the search settings and the side-effect sinks so tests can swap them out.

pub mod browser;
#[cfg(feature = "serve")]
pub mod host;
pub mod journal;
pub mod notify;
pub mod record;

use std::fmt;
use std::path::Path;

use chrono::Local;
use tracing::{error, info, warn};

use self::browser::{Browser, SystemBrowser, search_url};
use self::journal::{JOURNAL_HEADER, journal_store};
use self::notify::{DesktopNotifier, Notifier};
use self::record::{CsvRecordSink, Field, RecordSink, bare_name};
use crate::cancel::CancelToken;
use crate::config::ToolContext;
use crate::error::Result;
use crate::observer::TracingObserver;
use crate::search::Searcher;
use crate::types::{DEFAULT_ROOT, ScoredCandidate};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tool handlers bound to one context and set of sinks
pub struct Toolbox {
    context:  ToolContext,
    records:  Box<dyn RecordSink>,
    notifier: Box<dyn Notifier>,
    browser:  Box<dyn Browser>,
    cancel:   CancelToken,
}

impl fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolbox")
            .field("context", &self.context)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Toolbox {
    /// Toolbox writing CSV files, showing desktop notifications and opening
    /// the system browser
    #[must_use]
    pub fn new(context: ToolContext) -> Self {
        Self {
            context,
            records: Box::new(CsvRecordSink),
            notifier: Box::new(DesktopNotifier),
            browser: Box::new(SystemBrowser),
            cancel: CancelToken::new(),
        }
    }

    /// Replace the record sink
    #[must_use]
    pub fn with_records(mut self, records: impl RecordSink + 'static) -> Self {
        self.records = Box::new(records);
        self
    }

    /// Replace the notification sink
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Replace the browser sink
    #[must_use]
    pub fn with_browser(mut self, browser: impl Browser + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    /// Cancel file searches when `cancel` fires
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The context in use
    #[must_use]
    pub const fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Full paths of the files whose names best match `filename`, best first
    ///
    /// Searches `root_dir`, or the platform root when `None`.
    ///
    /// # Errors
    /// Returns the search error; see [`Searcher::search`].
    pub fn search_file_by_name(
        &self,
        filename: &str,
        root_dir: Option<&Path>,
    ) -> Result<Vec<String>> {
        let matches = self.find_matches(filename, root_dir)?;
        Ok(matches.iter().map(|m| m.path().to_string_lossy().into_owned()).collect())
    }

    /// Like [`search_file_by_name`](Self::search_file_by_name), keeping the
    /// similarity scores
    ///
    /// # Errors
    /// Returns the search error; see [`Searcher::search`].
    pub fn find_matches(
        &self,
        filename: &str,
        root_dir: Option<&Path>,
    ) -> Result<Vec<ScoredCandidate>> {
        let root = root_dir.unwrap_or_else(|| Path::new(DEFAULT_ROOT));
        let matches = Searcher::new(self.context.search.clone())
            .with_observer(&TracingObserver)
            .with_cancel(self.cancel.clone())
            .search(root, filename)?;

        if matches.is_empty() {
            warn!("No matching files found.");
        }
        Ok(matches)
    }

    /// Append a mood entry to the journal for `year` and `month`
    ///
    /// # Errors
    /// Returns `InvalidRecord` if `year` or `month` is not a plain name, or an
    /// I/O error from the record sink.
    pub fn add_log_to_journal(
        &self,
        year: &str,
        month: &str,
        date: &str,
        mood: &str,
        log: &str,
    ) -> Result<()> {
        let store = journal_store(&self.context.data_dir, year, month)?;
        self.records.append(&store, &JOURNAL_HEADER, &[
            Field::Plain(date),
            Field::Plain(mood),
            Field::Text(log),
        ])?;
        info!("Journal entry for {date} added to {}", store.display());
        Ok(())
    }

    /// Summarize moods logged between `from_date` and `to_date`
    ///
    /// # Errors
    /// See [`journal::analyze_mood_trend`].
    pub fn analyze_mood_trend(&self, from_date: &str, to_date: &str) -> Result<String> {
        journal::analyze_mood_trend(&self.context.data_dir, from_date, to_date)
    }

    /// Append a timestamped entry to `logs/<filename>`
    ///
    /// # Errors
    /// Returns `InvalidRecord` if `filename` is not a plain file name, or an
    /// I/O error from the record sink.
    pub fn add_log_to_file(&self, filename: &str, log: &str) -> Result<()> {
        let store = self.context.data_dir.join("logs").join(bare_name(filename)?);
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.records.append(&store, &["Timestamp", "Log"], &[
            Field::Plain(&timestamp),
            Field::Text(log),
        ])?;
        info!("Log entry added to {}", store.display());
        Ok(())
    }

    /// Record a reminder and show it as a desktop notification
    ///
    /// # Errors
    /// Returns an I/O error from the record sink; the notification itself
    /// never fails the call.
    pub fn add_reminder(&self, title: &str, message: &str) -> Result<()> {
        let store = self.context.data_dir.join("reminders").join("reminders_log.csv");
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.records.append(&store, &["Timestamp", "Title", "Message"], &[
            Field::Plain(&timestamp),
            Field::Text(title),
            Field::Text(message),
        ])?;
        self.notifier.notify(title, message);
        Ok(())
    }

    /// Open a web search for `query` in the default browser
    ///
    /// Launch failures are logged, not returned. Returns the URL opened.
    pub fn search_web(&self, query: &str) -> String {
        let url = search_url(query);
        match self.browser.open(&url) {
            Ok(()) => info!("[DuckDuckGo Search] Opened search for query: {query}"),
            Err(e) => error!("[DuckDuckGo Search] Failed to open search for query '{query}': {e}"),
        }
        url
    }
}
