//! Search pipeline
//!
//! ```text
//! Crawler ──candidates──▶ Scorer 0..N ──matches ≥ cutoff──▶ TopK (caller)
//!          (bounded channel)                  (bounded channel)
//! ```
//!
//! The crawler assigns discovery order, so how many scorers run and in what
//! order their results land has no effect on the returned ranking. With one
//! worker everything runs on the calling thread.

use std::panic;
use std::path::Path;
use std::thread;

use crossbeam_channel::bounded;

use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::crawler::Crawler;
use crate::error::{Error, Result};
use crate::observer::{NoopObserver, SearchEvent, SearchObserver};
use crate::rank::{TopK, rank};
use crate::similarity::Scorer;
use crate::types::ScoredCandidate;

/// Runs fuzzy file name searches with one configuration
pub struct Searcher<'o> {
    config:   SearchConfig,
    observer: &'o dyn SearchObserver,
    cancel:   CancelToken,
}

impl std::fmt::Debug for Searcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Searcher<'static> {
    /// Create a searcher that reports nothing and is never cancelled
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self { config, observer: &NoopObserver, cancel: CancelToken::new() }
    }
}

impl<'o> Searcher<'o> {
    /// Report search events to `observer`
    #[must_use]
    pub fn with_observer<'a>(self, observer: &'a dyn SearchObserver) -> Searcher<'a> {
        Searcher { config: self.config, observer, cancel: self.cancel }
    }

    /// Stop searching when `cancel` fires
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The configuration in use
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find the files under `root` whose names best match `query`
    ///
    /// Returns at most `limit` matches scoring at least `cutoff`, best first,
    /// ties in discovery order. An empty result means nothing scored high
    /// enough.
    ///
    /// # Errors
    /// Returns error if:
    /// - `limit` or `cutoff` is invalid (`InvalidK`, `InvalidCutoff`)
    /// - `query` is empty (`InvalidQuery`)
    /// - `root` is not a directory (`InvalidRoot`)
    /// - an exclude pattern is invalid (`InvalidPattern`)
    /// - the cancel token fired before the search finished (`Cancelled`)
    pub fn search(&self, root: &Path, query: &str) -> Result<Vec<ScoredCandidate>> {
        self.config.validate()?;
        if query.trim().is_empty() {
            return Err(Error::InvalidQuery("query must not be empty"));
        }
        let mut crawler = Crawler::new(root, &self.config, self.observer, self.cancel.clone())?;
        self.observer.on_event(&SearchEvent::Started { root, query });

        let (results, (files, dirs, skipped)) = if self.config.workers <= 1 {
            let results =
                rank(crawler.by_ref(), query, self.config.limit, self.config.cutoff)?;
            (results, crawler.progress())
        } else {
            self.run_pipeline(crawler, query)?
        };

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.observer.on_event(&SearchEvent::Finished {
            files,
            dirs,
            skipped,
            matches: results.len(),
        });
        Ok(results)
    }

    fn run_pipeline(
        &self,
        crawler: Crawler<'_>,
        query: &str,
    ) -> Result<(Vec<ScoredCandidate>, (u64, u64, u64))> {
        let cutoff = self.config.cutoff;
        let mut top = TopK::new(self.config.limit, cutoff)?;
        let (candidate_tx, candidate_rx) = bounded(self.config.queue_size);
        let (match_tx, match_rx) = bounded::<ScoredCandidate>(self.config.queue_size);

        let progress = thread::scope(|s| {
            let crawl = s.spawn(move || {
                let mut crawler = crawler;
                for candidate in crawler.by_ref() {
                    // every scorer has stopped
                    if candidate_tx.send(candidate).is_err() {
                        break;
                    }
                }
                crawler.progress()
            });

            for _ in 0..self.config.workers {
                let candidates = candidate_rx.clone();
                let matches = match_tx.clone();
                let cancel = self.cancel.clone();
                s.spawn(move || {
                    let mut scorer = Scorer::new(query);
                    for candidate in candidates {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let Some(score) = scorer.score_at_least(&candidate.name, cutoff) else {
                            continue;
                        };
                        if matches.send(ScoredCandidate { candidate, score }).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(candidate_rx);
            drop(match_tx);

            for scored in &match_rx {
                top.offer(scored);
            }

            crawl.join().unwrap_or_else(|payload| panic::resume_unwind(payload))
        });

        Ok((top.into_sorted(), progress))
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::observer::testing::{Recorded, RecordingObserver};

    fn tree(names: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for name in names {
            let path = temp_dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            File::create(path).unwrap();
        }
        temp_dir
    }

    fn file_names(results: &[ScoredCandidate]) -> Vec<&str> {
        results.iter().map(|r| r.candidate.name.as_str()).collect()
    }

    fn config(limit: usize, cutoff: f64, workers: usize) -> SearchConfig {
        SearchConfig::default().with_limit(limit).with_cutoff(cutoff).with_workers(workers)
    }

    #[test]
    fn test_exact_match_first_sequential_and_parallel() {
        let dir = tree(&["report.txt", "report_final.txt", "reports_2024.csv"]);
        for workers in [1, 4] {
            let results =
                Searcher::new(config(2, 0.5, workers)).search(dir.path(), "report").unwrap();
            assert_eq!(file_names(&results), ["report.txt", "report_final.txt"], "{workers}");
        }
    }

    #[test]
    fn test_worker_count_does_not_change_ranking() {
        let mut names = Vec::new();
        for i in 0..40 {
            names.push(format!("dir_{}/notes_{i:02}.md", i % 5));
        }
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let dir = tree(&names);

        let baseline = Searcher::new(config(7, 0.3, 1)).search(dir.path(), "notes_1.md").unwrap();
        assert_eq!(baseline.len(), 7);
        for workers in [2, 3, 8] {
            for _ in 0..3 {
                let results = Searcher::new(config(7, 0.3, workers))
                    .search(dir.path(), "notes_1.md")
                    .unwrap();
                assert_eq!(results, baseline);
            }
        }
    }

    #[test]
    fn test_input_errors_fail_fast() {
        let dir = tree(&["a.txt"]);
        let searcher = Searcher::new(config(0, 0.5, 1));
        assert!(matches!(searcher.search(dir.path(), "a"), Err(Error::InvalidK)));

        let searcher = Searcher::new(config(1, 2.0, 1));
        assert!(matches!(searcher.search(dir.path(), "a"), Err(Error::InvalidCutoff(_))));

        let searcher = Searcher::new(config(1, 0.5, 1));
        assert!(matches!(searcher.search(dir.path(), "  "), Err(Error::InvalidQuery(_))));

        let missing = PathBuf::from(dir.path()).join("missing");
        assert!(matches!(searcher.search(&missing, "a"), Err(Error::InvalidRoot { .. })));
    }

    #[test]
    fn test_cancelled_search_returns_no_results() {
        let dir = tree(&["report.txt", "sub/report.txt"]);
        for workers in [1, 4] {
            let cancel = CancelToken::new();
            cancel.cancel();
            let searcher = Searcher::new(config(5, 0.5, workers)).with_cancel(cancel);
            assert!(matches!(searcher.search(dir.path(), "report"), Err(Error::Cancelled)));
        }
    }

    #[test]
    fn test_observer_sees_start_and_finish() {
        let dir = tree(&["report.txt", "other.bin"]);
        let observer = RecordingObserver::default();
        let results = Searcher::new(config(5, 0.6, 2))
            .with_observer(&observer)
            .search(dir.path(), "report")
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(
            observer.events(),
            [Recorded::Started, Recorded::Finished { files: 2, skipped: 0, matches: 1 }]
        );
    }
}
