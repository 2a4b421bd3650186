//! Append-only CSV record stores

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// One field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    /// Quoted only when it holds a delimiter, quote or line break
    Plain(&'a str),
    /// Free text, always quoted
    Text(&'a str),
}

/// Accepts records and appends them to a named store
pub trait RecordSink: Send + Sync {
    /// Append `fields` to `store`, writing `header` first if the store is new
    ///
    /// # Errors
    /// Returns an error if the store cannot be created or written.
    fn append(&self, store: &Path, header: &[&str], fields: &[Field<'_>]) -> Result<()>;
}

/// Writes comma-separated records to files on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRecordSink;

impl RecordSink for CsvRecordSink {
    fn append(&self, store: &Path, header: &[&str], fields: &[Field<'_>]) -> Result<()> {
        if let Some(parent) = store.parent() {
            fs::create_dir_all(parent)?;
        }
        let is_new = !store.exists();

        let mut out = String::new();
        if is_new {
            let header: Vec<Field<'_>> = header.iter().map(|h| Field::Plain(h)).collect();
            out.push_str(&encode_record(&header));
        }
        out.push_str(&encode_record(fields));

        let mut file = OpenOptions::new().create(true).append(true).open(store)?;
        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

/// Encode one record, including its trailing newline
#[must_use]
pub fn encode_record(fields: &[Field<'_>]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        let (value, force) = match *field {
            Field::Plain(value) => (value, false),
            Field::Text(value) => (value, true),
        };
        if force || value.contains([',', '"', '\n', '\r']) {
            line.push('"');
            line.push_str(&value.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(value);
        }
    }
    line.push('\n');
    line
}

/// Split CSV text into records of unquoted fields
///
/// Quoted fields may contain commas, doubled quotes and line breaks. Blank
/// lines are dropped.
#[must_use]
pub fn parse_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                },
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {},
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                }
                record.clear();
            },
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

/// Check that `name` can be used as a single path component
///
/// # Errors
/// Returns `InvalidRecord` for empty names, `.`/`..`, and names containing a
/// path separator.
pub fn bare_name(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::record(&format!("'{name}' is not a plain file name")));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_encode_quotes_when_needed() {
        let line = encode_record(&[Field::Plain("2025-05-04"), Field::Plain("a,b")]);
        assert_eq!(line, "2025-05-04,\"a,b\"\n");
    }

    #[test]
    fn test_encode_text_always_quoted() {
        let line = encode_record(&[Field::Plain("Happy"), Field::Text("Said \"hi\"")]);
        assert_eq!(line, "Happy,\"Said \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_parse_round_trip_of_awkward_fields() {
        let fields = [Field::Plain("x"), Field::Text("line one\nline, two \"quoted\"")];
        let parsed = parse_records(&encode_record(&fields));
        assert_eq!(parsed, [vec!["x".to_string(), "line one\nline, two \"quoted\"".to_string()]]);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_crlf() {
        let parsed = parse_records("a,b\r\n\r\nc,d");
        assert_eq!(parsed, [vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_header_written_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("nested/dir/log.csv");
        let sink = CsvRecordSink;

        sink.append(&store, &["Timestamp", "Log"], &[Field::Plain("t1"), Field::Text("one")])
            .unwrap();
        sink.append(&store, &["Timestamp", "Log"], &[Field::Plain("t2"), Field::Text("two")])
            .unwrap();

        let content = fs::read_to_string(&store).unwrap();
        assert_eq!(content, "Timestamp,Log\nt1,\"one\"\nt2,\"two\"\n");
    }

    #[test]
    fn test_bare_name() {
        assert!(bare_name("reflections_log.csv").is_ok());
        for bad in ["", ".", "..", "../escape.csv", "dir/file.csv", "dir\\file.csv"] {
            assert!(matches!(bare_name(bad), Err(Error::InvalidRecord(_))), "{bad}");
        }
    }
}
