//! Edge aggregation: paper author lists → deduplicated co-authorship edges.
//!
//! # Overview
//!
//! Every paper with `n` distinct authors contributes the `n·(n−1)/2` pairs of
//! its author clique. Pairs are canonicalized ([`Edge::new`]) and collected
//! into one [`EdgeSet`] that grows across batches, so global deduplication
//! never depends on a single batch seeing every occurrence of a pair.
//!
//! ## Accumulator Lifecycle
//!
//! ```text
//! EdgeAggregator::new()      created at stage start
//!        ↓  ingest_batch()   once per fixed-size batch of records
//!        ↓  ...
//! EdgeAggregator::finish()   consumed at stage end → (EdgeSet, AggregateStats)
//! ```
//!
//! [`aggregate_chunked`] wraps that lifecycle around a lazy record iterator.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::model::{Edge, EdgeSet, NameNormalizer, TrimNormalizer};
use crate::records::RecordResult;

/// How repeated co-authorship across papers is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightMode {
    /// Set semantics: every edge has weight 1.
    Presence,
    /// Weight = number of distinct papers that produced the pair.
    #[default]
    PaperCount,
}

/// Counters collected while aggregating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    /// Records offered to the aggregator, malformed ones included.
    pub records_seen: usize,
    /// Malformed records skipped.
    pub records_skipped: usize,
    /// Records that produced at least one pair.
    pub papers_with_pairs: usize,
    /// Batches ingested.
    pub batches: usize,
}

/// Running accumulator of co-authorship edges.
#[derive(Debug)]
pub struct EdgeAggregator<N = TrimNormalizer> {
    edges: EdgeSet,
    normalizer: N,
    mode: WeightMode,
    stats: AggregateStats,
}

impl EdgeAggregator<TrimNormalizer> {
    /// Aggregator using the default trim-only name normalization.
    #[must_use]
    pub fn new(mode: WeightMode) -> Self {
        Self::with_normalizer(mode, TrimNormalizer)
    }
}

impl<N: NameNormalizer> EdgeAggregator<N> {
    pub fn with_normalizer(mode: WeightMode, normalizer: N) -> Self {
        Self {
            edges: EdgeSet::new(mode == WeightMode::PaperCount),
            normalizer,
            mode,
            stats: AggregateStats::default(),
        }
    }

    /// Add one paper's author list. Returns the number of pairs it emitted.
    ///
    /// Names are normalized, blanks dropped and repeats removed (keeping the
    /// first occurrence), so a paper listing an author twice produces no
    /// self-edge and counts once toward each pair's weight.
    pub fn ingest_paper<S: AsRef<str>>(&mut self, authors: &[S]) -> usize {
        let mut seen = HashSet::with_capacity(authors.len());
        let names: Vec<String> = authors
            .iter()
            .filter_map(|raw| self.normalizer.normalize(raw.as_ref()))
            .filter(|name| seen.insert(name.clone()))
            .collect();

        let mut emitted = 0;
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                let Some(edge) = Edge::new(a.as_str(), b.as_str()) else {
                    continue;
                };
                match self.mode {
                    WeightMode::Presence => {
                        self.edges.insert(edge);
                    }
                    WeightMode::PaperCount => self.edges.add(edge, 1),
                }
                emitted += 1;
            }
        }
        emitted
    }

    /// Ingest one record, skipping (and counting) malformed ones.
    pub fn ingest(&mut self, record: RecordResult) {
        self.stats.records_seen += 1;
        match record {
            Ok(paper) => {
                if self.ingest_paper(&paper.authors) > 0 {
                    self.stats.papers_with_pairs += 1;
                }
            }
            Err(bad) => {
                self.stats.records_skipped += 1;
                trace!(origin = %bad.origin, reason = %bad.reason, "skipping malformed record");
            }
        }
    }

    /// Ingest one batch of records into the running edge set.
    pub fn ingest_batch<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = RecordResult>,
    {
        for record in batch {
            self.ingest(record);
        }
        self.stats.batches += 1;
        debug!(
            batch = self.stats.batches,
            records = self.stats.records_seen,
            edges = self.edges.len(),
            "edge batch merged"
        );
    }

    /// Consume the accumulator.
    #[must_use]
    pub fn finish(self) -> (EdgeSet, AggregateStats) {
        (self.edges, self.stats)
    }
}

/// Fold a lazy record stream into an [`EdgeSet`], `chunk_size` records at a
/// time. Only one batch of records is resident at once; `chunk_size == 0`
/// is treated as 1.
#[instrument(skip(records, normalizer))]
pub fn aggregate_chunked<I, N>(
    records: I,
    chunk_size: usize,
    mode: WeightMode,
    normalizer: N,
) -> (EdgeSet, AggregateStats)
where
    I: IntoIterator<Item = RecordResult>,
    N: NameNormalizer,
{
    let chunk_size = chunk_size.max(1);
    let mut records = records.into_iter();
    let mut aggregator = EdgeAggregator::with_normalizer(mode, normalizer);

    loop {
        let batch: Vec<RecordResult> = records.by_ref().take(chunk_size).collect();
        if batch.is_empty() {
            break;
        }
        aggregator.ingest_batch(batch);
    }

    aggregator.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
