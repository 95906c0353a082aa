//! Paper record sources.
//!
//! Two sources feed the edge aggregator, both lazily:
//!
//! - [`PapersCsv`]: a flat papers table with a semicolon-joined
//!   `authors_str` column.
//! - [`ScopusRecords`]: a directory tree of Scopus
//!   `abstracts-retrieval-response` JSON files, one paper per file.
//!
//! Each yields `Result<PaperRecord, MalformedRecord>`. A malformed record is
//! not fatal; the aggregator skips it and counts it. Only a missing source
//! or a papers table without an `authors_str` column fails the stage.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::PipelineError;
use crate::model::split_author_list;

/// Column holding the semicolon-joined author list in a papers table.
pub const AUTHORS_COLUMN: &str = "authors_str";

/// One paper with its author names in paper order (not yet normalized).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaperRecord {
    /// Source identifier (Scopus EID or table row), for diagnostics only.
    pub id: Option<String>,
    pub authors: Vec<String>,
}

impl PaperRecord {
    /// Build a record from a semicolon-joined author string.
    #[must_use]
    pub fn from_joined(id: Option<String>, joined: &str) -> Self {
        Self {
            id,
            authors: split_author_list(joined).map(str::to_string).collect(),
        }
    }
}

/// A record that could not be turned into a [`PaperRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    pub origin: String,
    pub reason: String,
}

impl MalformedRecord {
    fn new(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

pub type RecordResult = Result<PaperRecord, MalformedRecord>;

// ---------------------------------------------------------------------------
// Papers CSV
// ---------------------------------------------------------------------------

/// Lazy reader over a papers table.
pub struct PapersCsv {
    path: PathBuf,
    reader: csv::Reader<File>,
    authors_idx: usize,
    row: usize,
    done: bool,
}

impl PapersCsv {
    /// Open `path` and locate the `authors_str` column.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingFile`] if the file does not exist,
    /// [`PipelineError::SchemaMismatch`] if the column is absent.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::MissingFile(path.to_path_buf()));
        }
        let mut reader = csv::Reader::from_path(path).map_err(|source| PipelineError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let headers = reader.headers().map_err(|source| PipelineError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let authors_idx = headers
            .iter()
            .position(|h| h.trim() == AUTHORS_COLUMN)
            .ok_or_else(|| PipelineError::SchemaMismatch {
                path: path.to_path_buf(),
                missing: vec![AUTHORS_COLUMN.to_string()],
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            authors_idx,
            row: 0,
            done: false,
        })
    }
}

impl Iterator for PapersCsv {
    type Item = RecordResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut record = csv::StringRecord::new();
        self.row += 1;
        let origin = format!("{}:row {}", self.path.display(), self.row);
        match self.reader.read_record(&mut record) {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) => match record.get(self.authors_idx).map(str::trim) {
                Some(joined) if !joined.is_empty() => {
                    Some(Ok(PaperRecord::from_joined(Some(origin), joined)))
                }
                _ => Some(Err(MalformedRecord::new(origin, "missing author list"))),
            },
            Err(err) => {
                if err.is_io_error() {
                    self.done = true;
                }
                Some(Err(MalformedRecord::new(origin, err.to_string())))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scopus JSON
// ---------------------------------------------------------------------------

/// Lazy reader over every non-hidden file below a directory, in path order.
///
/// Scopus dumps name files by EID with no extension, so any regular file
/// counts. Entries whose name starts with `.` are skipped, and so is
/// everything below a hidden directory.
pub struct ScopusRecords {
    files: std::vec::IntoIter<Result<PathBuf, MalformedRecord>>,
}

impl ScopusRecords {
    /// Enumerate the document files under `root`.
    ///
    /// File contents are read one at a time as the iterator advances; only
    /// the path list is held up front. An unreadable directory entry is
    /// yielded as a [`MalformedRecord`] in walk order.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingFile`] if `root` is not a directory.
    pub fn open(root: &Path) -> Result<Self, PipelineError> {
        if !root.is_dir() {
            return Err(PipelineError::MissingFile(root.to_path_buf()));
        }
        let files: Vec<Result<PathBuf, MalformedRecord>> = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|entry| match entry {
                Ok(e) if e.file_type().is_file() => Some(Ok(e.into_path())),
                Ok(_) => None,
                Err(err) => {
                    let origin = err
                        .path()
                        .map_or_else(|| root.display().to_string(), |p| p.display().to_string());
                    warn!(%origin, error = %err, "unreadable scopus entry");
                    Some(Err(MalformedRecord::new(origin, err.to_string())))
                }
            })
            .collect();
        debug!(root = %root.display(), files = files.len(), "scopus files discovered");
        Ok(Self {
            files: files.into_iter(),
        })
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

impl Iterator for ScopusRecords {
    type Item = RecordResult;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.files.next()?.and_then(|path| read_scopus_file(&path)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

fn read_scopus_file(path: &Path) -> RecordResult {
    let origin = path.display().to_string();
    let file = File::open(path).map_err(|e| MalformedRecord::new(&origin, e.to_string()))?;
    let value: Value = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| MalformedRecord::new(&origin, e.to_string()))?;
    parse_scopus(&value).map_err(|reason| MalformedRecord::new(origin, reason))
}

/// Extract a [`PaperRecord`] from one Scopus abstract-retrieval document.
///
/// Author names come from `authors.author[*]."ce:indexed-name"`, falling back
/// to `preferred-name."ce:indexed-name"`. `author` may be a single object or
/// an array; non-object entries and entries without a name are ignored.
///
/// # Errors
///
/// Returns a reason string when the document has no
/// `abstracts-retrieval-response` object, no `coredata.eid` or no
/// `authors` block.
pub fn parse_scopus(doc: &Value) -> Result<PaperRecord, String> {
    let resp = doc
        .get("abstracts-retrieval-response")
        .filter(|v| v.is_object())
        .ok_or_else(|| "missing abstracts-retrieval-response".to_string())?;

    let id = resp
        .pointer("/coredata/eid")
        .and_then(Value::as_str)
        .filter(|eid| !eid.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| "missing coredata.eid".to_string())?;

    let authors_block = resp
        .get("authors")
        .filter(|v| v.is_object())
        .ok_or_else(|| "missing authors block".to_string())?;

    let entries: Vec<&Value> = match authors_block.get("author") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    };

    let authors = entries
        .into_iter()
        .filter(|a| a.is_object())
        .filter_map(|a| {
            a.get("ce:indexed-name")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    a.pointer("/preferred-name/ce:indexed-name")
                        .and_then(Value::as_str)
                })
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Ok(PaperRecord {
        id: Some(id),
        authors,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn from_joined_splits_on_semicolons() {
        let rec = PaperRecord::from_joined(None, "Bob; Alice;Carol");
        assert_eq!(rec.authors, vec!["Bob", " Alice", "Carol"]);
    }

    #[test]
    fn scopus_author_array() {
        let doc = json!({
            "abstracts-retrieval-response": {
                "coredata": { "eid": "2-s2.0-1" },
                "authors": { "author": [
                    { "ce:indexed-name": "Smith J." },
                    { "preferred-name": { "ce:indexed-name": "Doe A." } },
                    "not an object",
                    { "@auid": "42" }
                ]}
            }
        });
        let rec = parse_scopus(&doc).expect("valid doc");
        assert_eq!(rec.id.as_deref(), Some("2-s2.0-1"));
        assert_eq!(rec.authors, vec!["Smith J.", "Doe A."]);
    }

    #[test]
    fn scopus_single_author_object() {
        let doc = json!({
            "abstracts-retrieval-response": {
                "coredata": { "eid": "2-s2.0-7" },
                "authors": { "author": { "ce:indexed-name": "Solo H." } }
            }
        });
        let rec = parse_scopus(&doc).expect("valid doc");
        assert_eq!(rec.authors, vec!["Solo H."]);
        assert_eq!(rec.id.as_deref(), Some("2-s2.0-7"));
    }

    #[test]
    fn scopus_without_eid_is_malformed() {
        let authors = json!({ "author": [{ "ce:indexed-name": "A" }, { "ce:indexed-name": "B" }] });
        let no_coredata = json!({ "abstracts-retrieval-response": { "authors": authors } });
        let blank_eid = json!({
            "abstracts-retrieval-response": {
                "coredata": { "eid": " " },
                "authors": authors
            }
        });
        assert_eq!(
            parse_scopus(&no_coredata).expect_err("no eid"),
            "missing coredata.eid"
        );
        assert!(parse_scopus(&blank_eid).is_err());
    }

    #[test]
    fn scopus_without_authors_block_is_malformed() {
        let doc = json!({ "abstracts-retrieval-response": { "coredata": {} } });
        assert!(parse_scopus(&doc).is_err());
        assert!(parse_scopus(&json!({ "other": 1 })).is_err());
    }

    #[test]
    fn papers_csv_requires_authors_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("papers.csv");
        std::fs::write(&path, "eid,title\n1,x\n").expect("write");
        match PapersCsv::open(&path) {
            Err(PipelineError::SchemaMismatch { missing, .. }) => {
                assert_eq!(missing, vec![AUTHORS_COLUMN.to_string()]);
            }
            other => panic!("expected schema mismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn papers_csv_missing_file_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            PapersCsv::open(&dir.path().join("nope.csv")),
            Err(PipelineError::MissingFile(_))
        ));
    }

    #[test]
    fn papers_csv_skips_rows_without_authors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("papers.csv");
        let mut f = File::create(&path).expect("create");
        writeln!(f, "eid,authors_str").expect("write");
        writeln!(f, "1,\"Bob; Alice\"").expect("write");
        writeln!(f, "2,").expect("write");
        writeln!(f, "3,Dan").expect("write");
        drop(f);

        let rows: Vec<RecordResult> = PapersCsv::open(&path).expect("open").collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].as_ref().expect("row 1").authors,
            vec!["Bob", " Alice"]
        );
        assert!(rows[1].is_err());
        assert_eq!(rows[2].as_ref().expect("row 3").authors, vec!["Dan"]);
    }

    fn scopus_doc(eid: &str, authors: &[&str]) -> String {
        let author: Vec<Value> = authors
            .iter()
            .map(|name| json!({ "ce:indexed-name": name }))
            .collect();
        json!({
            "abstracts-retrieval-response": {
                "coredata": { "eid": eid },
                "authors": { "author": author }
            }
        })
        .to_string()
    }

    #[test]
    fn scopus_dir_reads_extensionless_files_and_reports_bad_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let year = dir.path().join("2018");
        std::fs::create_dir_all(&year).expect("mkdir");
        std::fs::write(year.join("201800000"), scopus_doc("2-s2.0-1", &["A", "B"])).expect("write");
        std::fs::write(year.join("201800001"), "{ not json").expect("write");
        std::fs::write(year.join("201800002.json"), scopus_doc("2-s2.0-2", &["C"])).expect("write");

        let records: Vec<RecordResult> = ScopusRecords::open(dir.path()).expect("open").collect();
        assert_eq!(records.len(), 3);
        let first = records[0].as_ref().expect("201800000");
        assert_eq!(first.id.as_deref(), Some("2-s2.0-1"));
        assert_eq!(first.authors, vec!["A", "B"]);
        assert!(records[1].is_err());
        assert_eq!(records[2].as_ref().expect("201800002.json").authors, vec!["C"]);
    }

    #[test]
    fn scopus_dir_skips_hidden_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let year = dir.path().join("2018");
        let hidden_dir = dir.path().join(".cache");
        std::fs::create_dir_all(&year).expect("mkdir");
        std::fs::create_dir_all(&hidden_dir).expect("mkdir");
        std::fs::write(year.join("201800000"), scopus_doc("2-s2.0-1", &["A", "B"])).expect("write");
        std::fs::write(year.join(".hidden.json"), scopus_doc("2-s2.0-9", &["H1", "H2"]))
            .expect("write");
        std::fs::write(year.join(".DS_Store"), "binary junk").expect("write");
        std::fs::write(hidden_dir.join("201800003"), scopus_doc("2-s2.0-3", &["X"]))
            .expect("write");

        let records: Vec<RecordResult> = ScopusRecords::open(dir.path()).expect("open").collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().expect("visible file").authors, vec!["A", "B"]);
    }

    #[cfg(unix)]
    #[test]
    fn scopus_dir_reports_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let open_year = dir.path().join("2018");
        let locked_year = dir.path().join("2019");
        std::fs::create_dir_all(&open_year).expect("mkdir");
        std::fs::create_dir_all(&locked_year).expect("mkdir");
        std::fs::write(open_year.join("201800000"), scopus_doc("2-s2.0-1", &["A", "B"]))
            .expect("write");
        std::fs::write(locked_year.join("201900000"), scopus_doc("2-s2.0-2", &["C", "D"]))
            .expect("write");
        std::fs::set_permissions(&locked_year, std::fs::Permissions::from_mode(0o000))
            .expect("chmod");

        // Privileged users read through the mode bits; nothing to observe.
        let readable = std::fs::read_dir(&locked_year).is_ok();
        let records: Vec<RecordResult> = ScopusRecords::open(dir.path()).expect("open").collect();
        std::fs::set_permissions(&locked_year, std::fs::Permissions::from_mode(0o755))
            .expect("chmod");
        if readable {
            return;
        }

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].as_ref().expect("2018").authors, vec!["A", "B"]);
        let bad = records[1].as_ref().expect_err("unreadable 2019");
        assert!(bad.origin.ends_with("2019"));
    }
}
