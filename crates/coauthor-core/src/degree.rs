//! Degree index: author → number of distinct incident edges.
//!
//! # Overview
//!
//! Two input shapes are supported:
//!
//! - a materialized [`EdgeSet`] ([`DegreeIndex::from_edges`]), one pass
//!   incrementing both endpoints of every edge;
//! - a chunked stream of edge-table rows ([`DegreeAccumulator`]), where the
//!   same author reappears across chunks. Counts accumulate into one running
//!   map and are never reset between chunks. Rows are canonicalized first,
//!   so `A,B` and `B,A` count once.
//!
//! Degrees are always taken over the full edge set; the selector and
//! renderer only ever read them.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{Edge, EdgeSet};
use crate::table::EdgeRow;

// ---------------------------------------------------------------------------
// DegreeIndex
// ---------------------------------------------------------------------------

/// Per-author degree over the full edge set. Unordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegreeIndex {
    degrees: HashMap<String, usize>,
}

impl DegreeIndex {
    /// Count incident edges for every endpoint in `edges`.
    #[must_use]
    pub fn from_edges(edges: &EdgeSet) -> Self {
        let mut degrees: HashMap<String, usize> = HashMap::new();
        for (edge, _) in edges.iter() {
            *degrees.entry(edge.source().to_string()).or_insert(0) += 1;
            *degrees.entry(edge.target().to_string()).or_insert(0) += 1;
        }
        Self { degrees }
    }

    /// Rebuild an index from `(author, degree)` pairs, e.g. a degree table.
    /// A repeated author keeps the last degree seen.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            degrees: pairs.into_iter().map(|(a, d)| (a.into(), d)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, author: &str) -> Option<usize> {
        self.degrees.get(author).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.degrees.iter().map(|(a, d)| (a.as_str(), *d))
    }

    /// All entries, degree descending then name ascending.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self.iter().collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

// ---------------------------------------------------------------------------
// DegreeAccumulator
// ---------------------------------------------------------------------------

/// Counters from a chunked degree build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DegreeStats {
    pub rows: usize,
    pub malformed_rows: usize,
    /// Rows naming a pair already counted, in either orientation.
    pub duplicate_rows: usize,
    pub chunks: usize,
}

/// Running degree counts over edge-table chunks.
#[derive(Debug, Default)]
pub struct DegreeAccumulator {
    counts: HashMap<String, usize>,
    seen: HashSet<Edge>,
    stats: DegreeStats,
}

impl DegreeAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one row. Malformed rows (see [`EdgeRow::endpoints`]) and
    /// repeats of an already counted pair are tallied separately; neither
    /// touches the counts.
    pub fn add_row(&mut self, row: &EdgeRow) -> bool {
        self.stats.rows += 1;
        let Some(edge) = row.endpoints().and_then(|(a, b)| Edge::new(a, b)) else {
            self.stats.malformed_rows += 1;
            return false;
        };
        if self.seen.contains(&edge) {
            self.stats.duplicate_rows += 1;
            return false;
        }
        *self.counts.entry(edge.source().to_string()).or_insert(0) += 1;
        *self.counts.entry(edge.target().to_string()).or_insert(0) += 1;
        self.seen.insert(edge);
        true
    }

    /// Merge one chunk of rows into the running counts.
    pub fn add_chunk(&mut self, rows: &[EdgeRow]) {
        for row in rows {
            self.add_row(row);
        }
        self.stats.chunks += 1;
        debug!(
            chunk = self.stats.chunks,
            rows = self.stats.rows,
            authors = self.counts.len(),
            "degree chunk merged"
        );
    }

    /// Consume the accumulator.
    #[must_use]
    pub fn finish(self) -> (DegreeIndex, DegreeStats) {
        if self.stats.malformed_rows > 0 {
            warn!(
                malformed = self.stats.malformed_rows,
                "edge rows without two distinct endpoints were skipped"
            );
        }
        if self.stats.duplicate_rows > 0 {
            warn!(
                duplicates = self.stats.duplicate_rows,
                "repeated edge rows were counted once"
            );
        }
        (
            DegreeIndex {
                degrees: self.counts,
            },
            self.stats,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Edge;

    fn row(source: Option<&str>, target: Option<&str>) -> EdgeRow {
        EdgeRow {
            source: source.map(str::to_string),
            target: target.map(str::to_string),
            weight: None,
            bad_weight: false,
        }
    }

    fn sample_edges() -> EdgeSet {
        EdgeSet::from_weighted(
            [("Alice", "Bob"), ("Alice", "Carol"), ("Bob", "Carol"), ("Alice", "Dan")]
                .into_iter()
                .map(|(a, b)| (Edge::new(a, b).expect("distinct"), 1)),
            false,
        )
    }

    #[test]
    fn degrees_from_edge_set() {
        let idx = DegreeIndex::from_edges(&sample_edges());
        assert_eq!(idx.get("Alice"), Some(3));
        assert_eq!(idx.get("Bob"), Some(2));
        assert_eq!(idx.get("Carol"), Some(2));
        assert_eq!(idx.get("Dan"), Some(1));
        assert_eq!(idx.get("Eve"), None);
    }

    #[test]
    fn sorted_breaks_ties_by_name() {
        let idx = DegreeIndex::from_edges(&sample_edges());
        let sorted: Vec<&str> = idx.sorted().into_iter().map(|(a, _)| a).collect();
        assert_eq!(sorted, vec!["Alice", "Bob", "Carol", "Dan"]);
    }

    #[test]
    fn chunked_counts_match_single_pass() {
        let rows: Vec<EdgeRow> = sample_edges()
            .iter()
            .map(|(e, _)| row(Some(e.source()), Some(e.target())))
            .collect();

        let mut acc = DegreeAccumulator::new();
        for chunk in rows.chunks(1) {
            acc.add_chunk(chunk);
        }
        let (chunked, stats) = acc.finish();
        assert_eq!(chunked, DegreeIndex::from_edges(&sample_edges()));
        assert_eq!(stats.chunks, 4);
        assert_eq!(stats.malformed_rows, 0);
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let mut acc = DegreeAccumulator::new();
        acc.add_chunk(&[
            row(Some("A"), Some("B")),
            row(None, Some("B")),
            row(Some("A"), None),
            row(Some("  "), Some("B")),
            row(Some("A"), Some("A")),
        ]);
        let (idx, stats) = acc.finish();
        assert_eq!(idx.get("A"), Some(1));
        assert_eq!(idx.get("B"), Some(1));
        assert_eq!(stats.rows, 5);
        assert_eq!(stats.malformed_rows, 4);
    }

    #[test]
    fn repeated_pairs_count_once_in_either_orientation() {
        let mut acc = DegreeAccumulator::new();
        acc.add_chunk(&[row(Some("A"), Some("B")), row(Some("A"), Some("C"))]);
        acc.add_chunk(&[row(Some("B"), Some("A")), row(Some(" A "), Some("B"))]);
        let (idx, stats) = acc.finish();
        assert_eq!(idx.get("A"), Some(2));
        assert_eq!(idx.get("B"), Some(1));
        assert_eq!(idx.get("C"), Some(1));
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.duplicate_rows, 2);
        assert_eq!(stats.malformed_rows, 0);
    }

    #[test]
    fn empty_index() {
        let idx = DegreeIndex::from_edges(&EdgeSet::new(false));
        assert!(idx.is_empty());
        assert!(idx.sorted().is_empty());
    }
}
