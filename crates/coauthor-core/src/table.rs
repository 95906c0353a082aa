//! Flat CSV artifacts exchanged between stages.
//!
//! | Artifact | Columns |
//! |---|---|
//! | edge tables (full / top-author) | `source,target[,weight]` |
//! | node tables (full / top-author) | `node,type` |
//! | degree table | `author,degree` |
//!
//! Readers check required columns by name and fail with
//! [`PipelineError::SchemaMismatch`]; a missing file is
//! [`PipelineError::MissingFile`]. Neither is ever replaced by empty data.
//! Individual bad rows are returned as rows with missing fields and left to
//! the consumer to count.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::degree::DegreeIndex;
use crate::error::PipelineError;
use crate::model::{Edge, EdgeSet};

pub const NODE_TYPE_AUTHOR: &str = "author";

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One edge-table row as read from disk. Fields may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EdgeRow {
    pub source: Option<String>,
    pub target: Option<String>,
    pub weight: Option<u32>,
    /// The table has a `weight` column but this row's cell is not a
    /// positive integer.
    pub bad_weight: bool,
}

impl EdgeRow {
    /// Trimmed endpoints, or `None` if either is missing/blank, both are
    /// the same author, or the weight cell is unusable.
    #[must_use]
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        if self.bad_weight {
            return None;
        }
        let source = self.source.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let target = self.target.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        (source != target).then_some((source, target))
    }

    /// Weight, defaulting to 1 when the table has no `weight` column.
    #[must_use]
    pub fn weight_or_default(&self) -> u32 {
        self.weight.unwrap_or(1)
    }

    /// Canonical edge and weight for a well-formed row.
    #[must_use]
    pub fn to_edge(&self) -> Option<(Edge, u32)> {
        let (a, b) = self.endpoints()?;
        Edge::new(a, b).map(|e| (e, self.weight_or_default()))
    }
}

fn read_error(path: &Path) -> impl FnOnce(csv::Error) -> PipelineError + '_ {
    move |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path) -> impl FnOnce(csv::Error) -> PipelineError + '_ {
    move |source| PipelineError::CsvWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// Open `path` for reading and resolve `required` (and `optional`) column
/// positions from the header row.
fn open_with_columns(
    path: &Path,
    required: &[&str],
    optional: &[&str],
) -> Result<(csv::Reader<File>, Vec<usize>, Vec<Option<usize>>), PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(read_error(path))?;
    let headers = reader.headers().map_err(read_error(path))?.clone();
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);

    let mut req = Vec::with_capacity(required.len());
    let mut missing = Vec::new();
    for &name in required {
        match find(name) {
            Some(idx) => req.push(idx),
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::SchemaMismatch {
            path: path.to_path_buf(),
            missing,
        });
    }

    let opt = optional.iter().map(|&name| find(name)).collect();
    Ok((reader, req, opt))
}

fn field(record: &csv::StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Edge tables
// ---------------------------------------------------------------------------

/// Chunked reader over an edge table.
pub struct EdgeTableReader {
    path: PathBuf,
    reader: csv::Reader<File>,
    source_idx: usize,
    target_idx: usize,
    weight_idx: Option<usize>,
}

impl EdgeTableReader {
    /// Open an edge table and check for `source` and `target` columns.
    ///
    /// # Errors
    ///
    /// Missing file, unreadable header, or missing columns.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let (reader, req, opt) = open_with_columns(path, &["source", "target"], &["weight"])?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            source_idx: req[0],
            target_idx: req[1],
            weight_idx: opt[0],
        })
    }

    /// True when the table carries a `weight` column.
    #[must_use]
    pub const fn has_weights(&self) -> bool {
        self.weight_idx.is_some()
    }

    /// Read up to `chunk_size` rows. `Ok(None)` at end of table.
    ///
    /// # Errors
    ///
    /// I/O failures while reading. Short or unparseable rows are returned
    /// with missing fields instead, and a weight cell that is blank, zero
    /// or not an integer sets [`EdgeRow::bad_weight`].
    pub fn next_chunk(&mut self, chunk_size: usize) -> Result<Option<Vec<EdgeRow>>, PipelineError> {
        let chunk_size = chunk_size.max(1);
        let mut rows = Vec::with_capacity(chunk_size.min(64 * 1024));
        let mut record = csv::StringRecord::new();
        while rows.len() < chunk_size {
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    let weight = self.weight_idx.map(|i| {
                        field(&record, i)
                            .and_then(|w| w.parse::<u32>().ok())
                            .filter(|&w| w > 0)
                    });
                    rows.push(EdgeRow {
                        source: field(&record, self.source_idx),
                        target: field(&record, self.target_idx),
                        weight: weight.flatten(),
                        bad_weight: matches!(weight, Some(None)),
                    });
                }
                Ok(false) => break,
                Err(err) if err.is_io_error() => return Err(read_error(&self.path)(err)),
                Err(_) => rows.push(EdgeRow::default()),
            }
        }
        Ok((!rows.is_empty()).then_some(rows))
    }

    /// Iterate the table in chunks of `chunk_size` rows.
    #[must_use]
    pub fn chunks(self, chunk_size: usize) -> EdgeChunks {
        EdgeChunks {
            reader: self,
            chunk_size,
            failed: false,
        }
    }
}

/// Iterator of edge-table chunks; stops after the first error.
pub struct EdgeChunks {
    reader: EdgeTableReader,
    chunk_size: usize,
    failed: bool,
}

impl Iterator for EdgeChunks {
    type Item = Result<Vec<EdgeRow>, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_chunk(self.chunk_size) {
            Ok(chunk) => chunk.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Read a whole edge table into an [`EdgeSet`].
///
/// Repeated pairs keep the first weight seen. Returns the set and the
/// number of malformed rows skipped.
///
/// # Errors
///
/// See [`EdgeTableReader::open`].
pub fn read_edge_set(path: &Path, chunk_size: usize) -> Result<(EdgeSet, usize), PipelineError> {
    let reader = EdgeTableReader::open(path)?;
    let mut set = EdgeSet::new(reader.has_weights());
    let mut malformed = 0usize;
    for chunk in reader.chunks(chunk_size) {
        for row in chunk? {
            match row.to_edge() {
                Some((edge, weight)) => {
                    if !set.contains(&edge) {
                        set.add(edge, weight);
                    }
                }
                None => malformed += 1,
            }
        }
    }
    Ok((set, malformed))
}

/// Streaming edge-table writer.
pub struct EdgeTableWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    weighted: bool,
    rows: usize,
}

impl EdgeTableWriter {
    /// Create `path` and write the header. The `weight` column is present
    /// only when `weighted` is true.
    ///
    /// # Errors
    ///
    /// File creation or header write failure.
    pub fn create(path: &Path, weighted: bool) -> Result<Self, PipelineError> {
        let mut writer = csv::Writer::from_path(path).map_err(write_error(path))?;
        let header = if weighted {
            writer.write_record(["source", "target", "weight"])
        } else {
            writer.write_record(["source", "target"])
        };
        header.map_err(write_error(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            weighted,
            rows: 0,
        })
    }

    /// Write one edge.
    ///
    /// # Errors
    ///
    /// Write failure.
    pub fn write(&mut self, source: &str, target: &str, weight: u32) -> Result<(), PipelineError> {
        let result = if self.weighted {
            self.writer
                .write_record([source, target, weight.to_string().as_str()])
        } else {
            self.writer.write_record([source, target])
        };
        result.map_err(write_error(&self.path))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and close; returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Flush failure.
    pub fn finish(mut self) -> Result<usize, PipelineError> {
        self.writer.flush().map_err(|source| PipelineError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.rows)
    }
}

/// Write a full [`EdgeSet`] in canonical order.
///
/// # Errors
///
/// See [`EdgeTableWriter`].
pub fn write_edges(path: &Path, edges: &EdgeSet) -> Result<usize, PipelineError> {
    let mut writer = EdgeTableWriter::create(path, edges.is_weighted())?;
    for (edge, weight) in edges.iter() {
        writer.write(edge.source(), edge.target(), weight)?;
    }
    writer.finish()
}

// ---------------------------------------------------------------------------
// Node tables
// ---------------------------------------------------------------------------

/// Write a `node,type` table, `type` always `author`.
///
/// # Errors
///
/// File creation or write failure.
pub fn write_nodes<'a, I>(path: &Path, nodes: I) -> Result<usize, PipelineError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut writer = csv::Writer::from_path(path).map_err(write_error(path))?;
    writer
        .write_record(["node", "type"])
        .map_err(write_error(path))?;
    let mut rows = 0;
    for node in nodes {
        writer
            .write_record([node, NODE_TYPE_AUTHOR])
            .map_err(write_error(path))?;
        rows += 1;
    }
    writer.flush().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(rows)
}

/// Read the `node` column of a node table, in file order.
///
/// # Errors
///
/// Missing file, missing `node` column, or read failure.
pub fn read_nodes(path: &Path) -> Result<Vec<String>, PipelineError> {
    let (mut reader, req, _) = open_with_columns(path, &["node"], &[])?;
    let mut nodes = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_error(path))?;
        if let Some(node) = field(&record, req[0]) {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

// ---------------------------------------------------------------------------
// Degree tables
// ---------------------------------------------------------------------------

/// Write an `author,degree` table in the order given.
///
/// # Errors
///
/// File creation or write failure.
pub fn write_degrees(path: &Path, degrees: &[(&str, usize)]) -> Result<usize, PipelineError> {
    let mut writer = csv::Writer::from_path(path).map_err(write_error(path))?;
    writer
        .write_record(["author", "degree"])
        .map_err(write_error(path))?;
    for (author, degree) in degrees {
        writer
            .write_record([*author, degree.to_string().as_str()])
            .map_err(write_error(path))?;
    }
    writer.flush().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(degrees.len())
}

/// Read a degree table back into a [`DegreeIndex`].
///
/// Rows with a blank author or a non-integer degree are skipped; their
/// count is returned alongside the index.
///
/// # Errors
///
/// Missing file, missing `author`/`degree` columns, or read failure.
pub fn read_degrees(path: &Path) -> Result<(DegreeIndex, usize), PipelineError> {
    let (mut reader, req, _) = open_with_columns(path, &["author", "degree"], &[])?;
    let mut pairs = Vec::new();
    let mut malformed = 0usize;
    for record in reader.records() {
        let record = record.map_err(read_error(path))?;
        let author = field(&record, req[0]);
        let degree = field(&record, req[1]).and_then(|d| d.parse::<usize>().ok());
        match (author, degree) {
            (Some(a), Some(d)) => pairs.push((a, d)),
            _ => malformed += 1,
        }
    }
    Ok((DegreeIndex::from_pairs(pairs), malformed))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(weighted: bool) -> EdgeSet {
        EdgeSet::from_weighted(
            [("Bob", "Alice", 2), ("Carol", "Alice", 1), ("Dan", "Alice", 1)]
                .into_iter()
                .map(|(a, b, w)| (Edge::new(a, b).expect("distinct"), w)),
            weighted,
        )
    }

    #[test]
    fn weighted_edge_table_has_weight_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("edges.csv");
        assert_eq!(write_edges(&path, &sample(true)).expect("write"), 3);
        let text = std::fs::read_to_string(&path).expect("read");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("source,target,weight"));
        assert_eq!(lines.next(), Some("Alice,Bob,2"));

        let (set, malformed) = read_edge_set(&path, 2).expect("read back");
        assert_eq!(set, sample(true));
        assert_eq!(malformed, 0);
    }

    #[test]
    fn unweighted_table_reads_as_weight_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("edges.csv");
        write_edges(&path, &sample(false)).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("source,target\n"));

        let (set, _) = read_edge_set(&path, 10).expect("read back");
        assert!(!set.is_weighted());
        assert_eq!(set.weight("Alice", "Bob"), Some(1));
    }

    #[test]
    fn missing_columns_are_a_schema_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("edges.csv");
        std::fs::write(&path, "from,to\nA,B\n").expect("write");
        match EdgeTableReader::open(&path) {
            Err(PipelineError::SchemaMismatch { missing, .. }) => {
                assert_eq!(missing, vec!["source".to_string(), "target".to_string()]);
            }
            other => panic!("expected schema mismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn missing_file_is_not_empty_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            read_degrees(&dir.path().join("author_degrees.csv")),
            Err(PipelineError::MissingFile(_))
        ));
    }

    #[test]
    fn short_rows_come_back_with_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("edges.csv");
        std::fs::write(&path, "source,target\nA,B\nC\n,D\nE,F\n").expect("write");
        let mut reader = EdgeTableReader::open(&path).expect("open");
        let chunk = reader.next_chunk(10).expect("read").expect("rows");
        assert_eq!(chunk.len(), 4);
        assert!(chunk[0].endpoints().is_some());
        assert!(chunk[1].endpoints().is_none());
        assert!(chunk[2].endpoints().is_none());
        assert!(reader.next_chunk(10).expect("read").is_none());
    }

    #[test]
    fn unusable_weights_are_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("edges.csv");
        std::fs::write(
            &path,
            "source,target,weight\nA,B,3.0\nA,C,abc\nA,D,2\nA,E,0\nA,F,\nA,G\nB,C,5\n",
        )
        .expect("write");

        let (set, malformed) = read_edge_set(&path, 3).expect("read");
        assert_eq!(malformed, 5);
        assert_eq!(set.len(), 2);
        assert_eq!(set.weight("A", "D"), Some(2));
        assert_eq!(set.weight("B", "C"), Some(5));
        assert_eq!(set.weight("A", "B"), None);
        assert_eq!(set.weight("A", "C"), None);

        let mut reader = EdgeTableReader::open(&path).expect("open");
        let chunk = reader.next_chunk(10).expect("read").expect("rows");
        assert!(chunk[1].bad_weight);
        assert!(chunk[1].endpoints().is_none());
        assert!(!chunk[2].bad_weight);
    }

    #[test]
    fn chunks_cover_every_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("edges.csv");
        write_edges(&path, &sample(true)).expect("write");
        let sizes: Vec<usize> = EdgeTableReader::open(&path)
            .expect("open")
            .chunks(2)
            .map(|c| c.expect("chunk").len())
            .collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[test]
    fn degree_table_round_trip_skips_bad_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("degrees.csv");
        write_degrees(&path, &[("Alice", 3), ("Bob", 2)]).expect("write");
        let (idx, malformed) = read_degrees(&path).expect("read");
        assert_eq!(idx.get("Alice"), Some(3));
        assert_eq!(malformed, 0);

        std::fs::write(&path, "author,degree\nAlice,3\nBob,many\n,4\n").expect("write");
        let (idx, malformed) = read_degrees(&path).expect("read");
        assert_eq!(idx.len(), 1);
        assert_eq!(malformed, 2);
    }

    #[test]
    fn node_table_has_author_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nodes.csv");
        write_nodes(&path, ["Alice", "Bob"]).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text, "node,type\nAlice,author\nBob,author\n");
        assert_eq!(read_nodes(&path).expect("read"), vec!["Alice", "Bob"]);
    }
}
