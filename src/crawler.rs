//! Directory crawler
//!
//! Depth-first, pre-order walk. Each directory is listed once, its entries
//! are sorted by name, its files are emitted in that order, and then its
//! subdirectories are entered in that order. For a tree that does not change
//! during the walk the discovery order is therefore the same on every run.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::observer::{SearchEvent, SearchObserver};
use crate::types::Candidate;

/// Identity of a directory, independent of the path it was reached through
#[cfg(unix)]
type DirId = (u64, u64);

/// Identity of a directory, independent of the path it was reached through
#[cfg(not(unix))]
type DirId = PathBuf;

#[cfg(unix)]
fn dir_id(path: &Path) -> io::Result<DirId> {
    use std::os::unix::fs::MetadataExt;

    let meta = fs::metadata(path)?;
    Ok((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn dir_id(path: &Path) -> io::Result<DirId> {
    fs::canonicalize(path)
}

/// Lazy walker yielding every regular file under a root
///
/// Memory is bounded by the pending-directory stack, the largest single
/// directory listing, and the set of visited directory identities.
pub struct Crawler<'o> {
    /// Directories still to list, with their depth below the root
    stack:        Vec<(PathBuf, usize)>,
    /// Identities of directories already listed in this walk
    visited:      HashSet<DirId>,
    /// Names to skip
    exclude:      Option<GlobSet>,
    max_depth:    Option<usize>,
    follow_links: bool,
    cancel:       CancelToken,
    observer:     &'o dyn SearchObserver,
    /// Rest of the batch handed out by the iterator
    pending:      std::vec::IntoIter<Candidate>,
    /// Next discovery sequence number
    next_order:   u64,
    /// Number of files produced
    file_count:   u64,
    /// Number of directories listed
    dir_count:    u64,
    /// Number of directories skipped as unreadable
    skip_count:   u64,
    cancelled:    bool,
}

impl fmt::Debug for Crawler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawler")
            .field("stack", &self.stack)
            .field("visited", &self.visited.len())
            .field("max_depth", &self.max_depth)
            .field("follow_links", &self.follow_links)
            .field("next_order", &self.next_order)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

impl<'o> Crawler<'o> {
    /// Create a new crawler starting at `root`
    ///
    /// # Errors
    /// Returns error if:
    /// - `root` does not exist, is not a directory or cannot be listed
    ///   (`InvalidRoot`)
    /// - an exclude pattern does not compile (`InvalidPattern`)
    pub fn new(
        root: &Path,
        config: &SearchConfig,
        observer: &'o dyn SearchObserver,
        cancel: CancelToken,
    ) -> Result<Self> {
        if !root.is_dir() || fs::read_dir(root).is_err() {
            return Err(Error::InvalidRoot { path: root.to_path_buf() });
        }
        let root = std::path::absolute(root)?;
        let exclude = compile_excludes(&config.exclude)?;

        Ok(Self {
            stack: vec![(root, 0)],
            visited: HashSet::new(),
            exclude,
            max_depth: config.max_depth,
            follow_links: config.follow_links,
            cancel,
            observer,
            pending: Vec::new().into_iter(),
            next_order: 0,
            file_count: 0,
            dir_count: 0,
            skip_count: 0,
            cancelled: false,
        })
    }

    /// Get the current progress of the crawl
    ///
    /// Returns a tuple of:
    /// - Number of files produced so far
    /// - Number of directories listed
    /// - Number of directories skipped as unreadable
    #[must_use = "Progress information should be used for monitoring"]
    pub const fn progress(&self) -> (u64, u64, u64) {
        (self.file_count, self.dir_count, self.skip_count)
    }

    /// Whether the walk stopped because the cancel token fired
    #[must_use]
    pub const fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// List the next directory and return its files
    ///
    /// Returns `None` once the walk is exhausted or cancelled. Unreadable
    /// directories and directories reached a second time are reported to the
    /// observer and passed over.
    pub fn process_next(&mut self) -> Option<Vec<Candidate>> {
        loop {
            if self.cancel.is_cancelled() {
                self.cancelled = true;
                self.stack.clear();
                return None;
            }

            let (dir, depth) = self.stack.pop()?;

            match dir_id(&dir) {
                Ok(id) => {
                    if !self.visited.insert(id) {
                        self.observer.on_event(&SearchEvent::CycleSkipped { path: &dir });
                        continue;
                    }
                },
                Err(source) => {
                    self.skip(dir, source);
                    continue;
                },
            }

            let entries = match list_sorted(&dir) {
                Ok(entries) => entries,
                Err(source) => {
                    self.skip(dir, source);
                    continue;
                },
            };
            self.dir_count += 1;

            let descend = self.max_depth.is_none_or(|max| depth < max);
            let mut files = Vec::new();
            let mut subdirs = Vec::new();

            for entry in entries {
                if self.is_excluded(&entry) {
                    continue;
                }
                match self.classify(&entry) {
                    Some(Kind::File) => {
                        files.push(Candidate::new(entry.path(), self.next_order));
                        self.next_order += 1;
                    },
                    Some(Kind::Dir) if descend => subdirs.push(entry.path()),
                    _ => {},
                }
            }

            // popped in name order
            self.stack.extend(subdirs.into_iter().rev().map(|path| (path, depth + 1)));
            self.file_count += files.len() as u64;
            self.observer
                .on_event(&SearchEvent::DirectoryListed { path: &dir, files: files.len() });

            return Some(files);
        }
    }

    fn classify(&self, entry: &DirEntry) -> Option<Kind> {
        // entry may have vanished since the listing
        let file_type = entry.file_type().ok()?;
        if file_type.is_symlink() {
            // broken links resolve to nothing
            let target = fs::metadata(entry.path()).ok()?;
            return if target.is_file() {
                Some(Kind::File)
            } else if target.is_dir() && self.follow_links {
                Some(Kind::Dir)
            } else {
                None
            };
        }
        if file_type.is_dir() {
            Some(Kind::Dir)
        } else if file_type.is_file() {
            Some(Kind::File)
        } else {
            None
        }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        self.exclude.as_ref().is_some_and(|set| set.is_match(Path::new(&entry.file_name())))
    }

    fn skip(&mut self, path: PathBuf, source: io::Error) {
        self.skip_count += 1;
        let error = Error::SubtreeUnreadable { path, source };
        self.observer.on_event(&SearchEvent::SubtreeSkipped { error: &error });
    }
}

impl Iterator for Crawler<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if let Some(candidate) = self.pending.next() {
                return Some(candidate);
            }
            self.pending = self.process_next()?.into_iter();
        }
    }
}

/// What a directory entry contributes to the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    File,
    Dir,
}

fn list_sorted(dir: &Path) -> io::Result<Vec<DirEntry>> {
    // an entry that fails to read is dropped, not the whole listing
    let mut entries: Vec<DirEntry> = fs::read_dir(dir)?.filter_map(io::Result::ok).collect();
    entries.sort_by_cached_key(DirEntry::file_name);
    Ok(entries)
}

fn compile_excludes(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::pattern(&format!("Invalid pattern: {e}")))?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| Error::pattern(&format!("Invalid pattern: {e}")))?;
    Ok(Some(set))
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::TempDir;

    use super::*;
    use crate::observer::NoopObserver;
    use crate::observer::testing::{Recorded, RecordingObserver};

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    fn crawl(root: &Path, config: &SearchConfig) -> Vec<Candidate> {
        Crawler::new(root, config, &NoopObserver, CancelToken::new()).unwrap().collect()
    }

    fn relative(root: &Path, found: &[Candidate]) -> Vec<String> {
        let root = std::path::absolute(root).unwrap();
        found
            .iter()
            .map(|c| c.path.strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_new_crawler() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig::default();
        let crawler = Crawler::new(temp_dir.path(), &config, &NoopObserver, CancelToken::new());
        assert!(crawler.is_ok());
    }

    #[test]
    fn test_invalid_root() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig::default();

        let missing = temp_dir.path().join("missing");
        let result = Crawler::new(&missing, &config, &NoopObserver, CancelToken::new());
        assert!(matches!(result, Err(Error::InvalidRoot { .. })));

        let file = temp_dir.path().join("file.txt");
        touch(&file);
        let result = Crawler::new(&file, &config, &NoopObserver, CancelToken::new());
        assert!(matches!(result, Err(Error::InvalidRoot { .. })));
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut crawler = Crawler::new(
            temp_dir.path(),
            &SearchConfig::default(),
            &NoopObserver,
            CancelToken::new(),
        )
        .unwrap();

        let result = crawler.process_next();
        assert!(matches!(result, Some(files) if files.is_empty()));
        assert!(crawler.process_next().is_none());
    }

    #[test]
    fn test_preorder_sorted_walk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir(root.join("a")).unwrap();
        touch(&root.join("z.txt"));
        touch(&root.join("c.txt"));
        touch(&root.join("a/2.txt"));
        touch(&root.join("a/1.txt"));
        touch(&root.join("b/inner/deep.txt"));
        touch(&root.join("b/top.txt"));

        let found = crawl(root, &SearchConfig::default());
        assert_eq!(
            relative(root, &found),
            ["c.txt", "z.txt", "a/1.txt", "a/2.txt", "b/top.txt", "b/inner/deep.txt"]
        );
        let orders: Vec<u64> = found.iter().map(|c| c.order).collect();
        assert_eq!(orders, [0, 1, 2, 3, 4, 5]);
        assert!(found.iter().all(|c| c.path.is_absolute()));
    }

    #[test]
    fn test_restartable() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..3 {
            let dir = temp_dir.path().join(format!("dir_{i}"));
            fs::create_dir(&dir).unwrap();
            touch(&dir.join("test.txt"));
        }
        let config = SearchConfig::default();
        assert_eq!(crawl(temp_dir.path(), &config), crawl(temp_dir.path(), &config));
    }

    #[test]
    fn test_progress_reporting() {
        let temp_dir = TempDir::new().unwrap();
        let mut crawler = Crawler::new(
            temp_dir.path(),
            &SearchConfig::default(),
            &NoopObserver,
            CancelToken::new(),
        )
        .unwrap();
        assert_eq!(crawler.progress(), (0, 0, 0));

        for i in 0..3 {
            let subdir = temp_dir.path().join(format!("dir_{i}"));
            fs::create_dir(&subdir).unwrap();
            for j in 0..2 {
                touch(&subdir.join(format!("file_{j}.txt")));
            }
        }

        let mut last_files = 0;
        while let Some(batch) = crawler.process_next() {
            let (files, _, _) = crawler.progress();
            assert_eq!(files, last_files + batch.len() as u64);
            last_files = files;
        }
        assert_eq!(crawler.progress(), (6, 4, 0));
    }

    #[test]
    fn test_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("one/two")).unwrap();
        touch(&root.join("top.txt"));
        touch(&root.join("one/mid.txt"));
        touch(&root.join("one/two/low.txt"));

        let config = SearchConfig { max_depth: Some(0), ..SearchConfig::default() };
        assert_eq!(relative(root, &crawl(root, &config)), ["top.txt"]);

        let config = SearchConfig { max_depth: Some(1), ..SearchConfig::default() };
        assert_eq!(relative(root, &crawl(root, &config)), ["top.txt", "one/mid.txt"]);
    }

    #[test]
    fn test_exclude_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("node_modules")).unwrap();
        touch(&root.join("node_modules/report.txt"));
        touch(&root.join("report.txt"));
        touch(&root.join("report.TMP"));

        let config = SearchConfig {
            exclude: vec!["node_modules".into(), "*.tmp".into()],
            ..SearchConfig::default()
        };
        assert_eq!(relative(root, &crawl(root, &config)), ["report.txt"]);
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig { exclude: vec!["[unclosed".into()], ..SearchConfig::default() };
        let result = Crawler::new(temp_dir.path(), &config, &NoopObserver, CancelToken::new());
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_cancelled_before_start() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("file.txt"));
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut crawler =
            Crawler::new(temp_dir.path(), &SearchConfig::default(), &NoopObserver, cancel)
                .unwrap();
        assert!(crawler.next().is_none());
        assert!(crawler.was_cancelled());
    }

    #[test]
    fn test_cancelled_between_directories() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a", "b", "c"] {
            fs::create_dir(temp_dir.path().join(name)).unwrap();
            touch(&temp_dir.path().join(name).join("file.txt"));
        }
        let cancel = CancelToken::new();
        let mut crawler =
            Crawler::new(temp_dir.path(), &SearchConfig::default(), &NoopObserver, cancel.clone())
                .unwrap();

        assert!(crawler.process_next().is_some_and(|files| files.is_empty()));
        assert!(crawler.process_next().is_some_and(|files| files.len() == 1));
        cancel.cancel();
        assert!(crawler.process_next().is_none());
        assert!(crawler.was_cancelled());
        assert_eq!(crawler.progress(), (1, 2, 0));
    }

    #[test]
    fn test_vanished_subtree_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["first", "gone", "last"] {
            fs::create_dir(root.join(name)).unwrap();
            touch(&root.join(name).join("file.txt"));
        }

        let observer = RecordingObserver::default();
        let mut crawler =
            Crawler::new(root, &SearchConfig::default(), &observer, CancelToken::new()).unwrap();
        // root listed, all three subdirectories queued
        assert!(crawler.process_next().is_some_and(|files| files.is_empty()));
        fs::remove_dir_all(root.join("gone")).unwrap();

        let found: Vec<Candidate> = crawler.by_ref().collect();
        assert_eq!(relative(root, &found), ["first/file.txt", "last/file.txt"]);
        assert_eq!(crawler.progress(), (2, 3, 1));

        let skipped: Vec<Recorded> = observer
            .events()
            .into_iter()
            .filter(|e| matches!(e, Recorded::SubtreeSkipped(_)))
            .collect();
        let gone = std::path::absolute(root.join("gone")).unwrap();
        assert_eq!(skipped, [Recorded::SubtreeSkipped(gone)]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("a")).unwrap();
        touch(&root.join("a/file.txt"));
        symlink(root.join("a"), root.join("a/loop")).unwrap();
        symlink(root, root.join("a/up")).unwrap();

        let observer = RecordingObserver::default();
        let crawler =
            Crawler::new(root, &SearchConfig::default(), &observer, CancelToken::new()).unwrap();
        let found: Vec<Candidate> = crawler.collect();

        assert_eq!(relative(root, &found), ["a/file.txt"]);
        let cycles =
            observer.events().iter().filter(|e| matches!(e, Recorded::CycleSkipped(_))).count();
        assert_eq!(cycles, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_without_following() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("real")).unwrap();
        touch(&root.join("real/inside.txt"));
        touch(&root.join("target.txt"));
        symlink(root.join("real"), root.join("linked")).unwrap();
        symlink(root.join("target.txt"), root.join("alias.txt")).unwrap();
        symlink(root.join("gone"), root.join("broken.txt")).unwrap();

        let config = SearchConfig { follow_links: false, ..SearchConfig::default() };
        assert_eq!(
            relative(root, &crawl(root, &config)),
            ["alias.txt", "target.txt", "real/inside.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["first", "locked", "last"] {
            fs::create_dir(root.join(name)).unwrap();
            touch(&root.join(name).join("file.txt"));
        }
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let privileged = fs::read_dir(&locked).is_ok();

        let observer = RecordingObserver::default();
        let crawler =
            Crawler::new(root, &SearchConfig::default(), &observer, CancelToken::new()).unwrap();
        let found: Vec<Candidate> = crawler.collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if privileged {
            assert_eq!(found.len(), 3);
            return;
        }
        assert_eq!(relative(root, &found), ["first/file.txt", "last/file.txt"]);
        let locked_skipped =
            |e: &Recorded| matches!(e, Recorded::SubtreeSkipped(p) if p.ends_with("locked"));
        assert!(observer.events().iter().any(locked_skipped));
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_root_is_invalid() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("locked");
        fs::create_dir(&root).unwrap();
        touch(&root.join("file.txt"));
        fs::set_permissions(&root, fs::Permissions::from_mode(0o000)).unwrap();
        let privileged = fs::read_dir(&root).is_ok();

        let config = SearchConfig::default();
        let result = Crawler::new(&root, &config, &NoopObserver, CancelToken::new());
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();

        if privileged {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(Error::InvalidRoot { path }) if path == root));
        }
    }
}
