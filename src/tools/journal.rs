//! Mood journal layout and trend report
//!
//! Entries live at `<data>/journal/<year>/<month>/<month>_journal_log.csv`
//! with a `Date,Mood,Log` header.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use super::record::{bare_name, parse_records};
use crate::error::{Error, Result};

/// Header of every journal store
pub const JOURNAL_HEADER: [&str; 3] = ["Date", "Mood", "Log"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Path of the journal store for `year` and `month`
///
/// # Errors
/// Returns `InvalidRecord` if either part is not a plain path component.
pub fn journal_store(data_dir: &Path, year: &str, month: &str) -> Result<PathBuf> {
    let year = bare_name(year)?;
    let month = bare_name(month)?;
    Ok(data_dir.join("journal").join(year).join(month).join(format!("{month}_journal_log.csv")))
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(input.to_string()))
}

/// Count moods logged between `from` and `to`, both inclusive
///
/// Moods are listed in the order they are first met, walking year and month
/// directories in name order. Rows whose date does not parse are skipped.
///
/// # Errors
/// Returns `InvalidDate` if `from` or `to` is not `YYYY-MM-DD`, or an I/O
/// error if a journal store exists but cannot be read.
pub fn analyze_mood_trend(data_dir: &Path, from: &str, to: &str) -> Result<String> {
    let from_date = parse_date(from)?;
    let to_date = parse_date(to)?;

    let mut counts: Vec<(String, usize)> = Vec::new();
    for store in journal_stores(&data_dir.join("journal"))? {
        let content = fs::read_to_string(&store)?;
        let mut rows = parse_records(&content).into_iter();
        let Some(header) = rows.next() else { continue };
        let (Some(date_col), Some(mood_col)) = (
            header.iter().position(|h| h == "Date"),
            header.iter().position(|h| h == "Mood"),
        ) else {
            debug!("Journal store {} has no Date/Mood header", store.display());
            continue;
        };

        for row in rows {
            let (Some(date), Some(mood)) = (row.get(date_col), row.get(mood_col)) else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT) else {
                continue;
            };
            if date < from_date || date > to_date {
                continue;
            }
            match counts.iter_mut().find(|(seen, _)| seen == mood) {
                Some((_, count)) => *count += 1,
                None => counts.push((mood.clone(), 1)),
            }
        }
    }

    if counts.is_empty() {
        return Ok(format!("No journal entries found between {from} and {to}."));
    }
    let summary: Vec<String> =
        counts.iter().map(|(mood, count)| format!("{mood} ({count})")).collect();
    Ok(format!("Mood trend from {from} to {to}: {}", summary.join(", ")))
}

/// Every existing `<year>/<month>/<month>_journal_log.csv` under `root`
fn journal_stores(root: &Path) -> Result<Vec<PathBuf>> {
    let mut stores = Vec::new();
    for year in sorted_dirs(root)? {
        let is_year = year
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if !is_year {
            continue;
        }
        for month in sorted_dirs(&year)? {
            let Some(name) = month.file_name().and_then(|n| n.to_str()) else { continue };
            let store = month.join(format!("{name}_journal_log.csv"));
            if store.is_file() {
                stores.push(store);
            }
        }
    }
    Ok(stores)
}

fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
