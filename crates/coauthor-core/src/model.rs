//! Core graph vocabulary: authors, canonical edges and the edge set.
//!
//! # Canonical Order
//!
//! An [`Edge`] is an unordered pair stored with the lexicographically
//! smaller name first. Two papers listing the same pair in opposite order
//! therefore produce equal edges, which is how duplicates collapse in
//! [`EdgeSet`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

/// Maps a raw author string to the identity used for edges.
///
/// Returning `None` drops the name. The default [`TrimNormalizer`] only trims
/// whitespace; an entity resolver that merges spelling variants can be
/// substituted here without touching the aggregation code.
pub trait NameNormalizer {
    fn normalize(&self, raw: &str) -> Option<String>;
}

/// Trims surrounding whitespace, preserves case, drops empty names.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimNormalizer;

impl NameNormalizer for TrimNormalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        let name = raw.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

impl<F> NameNormalizer for F
where
    F: Fn(&str) -> Option<String>,
{
    fn normalize(&self, raw: &str) -> Option<String> {
        self(raw)
    }
}

/// Split a semicolon-joined author list (`"Bob; Alice; Carol"`).
///
/// Empty segments are kept as empty strings; normalization decides what
/// to drop.
pub fn split_author_list(joined: &str) -> impl Iterator<Item = &str> {
    joined.split(';')
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// An unordered co-authorship pair with `source < target`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    source: String,
    target: String,
}

impl Edge {
    /// Build a canonical edge. Returns `None` for a self-loop.
    #[must_use]
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Option<Self> {
        let a = a.into();
        let b = b.into();
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self {
                source: a,
                target: b,
            }),
            std::cmp::Ordering::Greater => Some(Self {
                source: b,
                target: a,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The lexicographically smaller endpoint.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The lexicographically larger endpoint.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// True if `author` is either endpoint.
    #[must_use]
    pub fn touches(&self, author: &str) -> bool {
        self.source == author || self.target == author
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.source, self.target)
    }
}

// ---------------------------------------------------------------------------
// EdgeSet
// ---------------------------------------------------------------------------

/// Deduplicated co-authorship edges with per-edge weights.
///
/// Iteration is in canonical edge order, so everything derived from an
/// `EdgeSet` (tables, hashes, subgraphs) is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeSet {
    edges: BTreeMap<Edge, u32>,
    weighted: bool,
}

impl EdgeSet {
    /// An empty set. `weighted` records whether weights carry paper counts
    /// (and should be persisted) or are all implicitly 1.
    #[must_use]
    pub fn new(weighted: bool) -> Self {
        Self {
            edges: BTreeMap::new(),
            weighted,
        }
    }

    /// Collect `(edge, weight)` pairs; weights of repeated edges are summed.
    pub fn from_weighted<I>(edges: I, weighted: bool) -> Self
    where
        I: IntoIterator<Item = (Edge, u32)>,
    {
        let mut set = Self::new(weighted);
        for (edge, weight) in edges {
            set.add(edge, weight);
        }
        set
    }

    /// Add `weight` to `edge`, inserting it if absent.
    pub fn add(&mut self, edge: Edge, weight: u32) {
        *self.edges.entry(edge).or_insert(0) += weight;
    }

    /// Insert `edge` with weight 1 if absent; presence-only semantics.
    pub fn insert(&mut self, edge: Edge) -> bool {
        if self.edges.contains_key(&edge) {
            return false;
        }
        self.edges.insert(edge, 1);
        true
    }

    #[must_use]
    pub fn contains(&self, edge: &Edge) -> bool {
        self.edges.contains_key(edge)
    }

    /// Weight of the pair `(a, b)` in either order.
    #[must_use]
    pub fn weight(&self, a: &str, b: &str) -> Option<u32> {
        Edge::new(a, b).and_then(|e| self.edges.get(&e).copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[must_use]
    pub const fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// Iterate `(edge, weight)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&Edge, u32)> + '_ {
        self.edges.iter().map(|(e, w)| (e, *w))
    }

    /// Every author appearing in at least one edge, sorted.
    #[must_use]
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.edges
            .keys()
            .flat_map(|e| [e.source(), e.target()])
            .collect()
    }

    /// Keep only edges for which `keep` returns true.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(&Edge, u32) -> bool) -> Self {
        Self {
            edges: self
                .edges
                .iter()
                .filter(|(e, w)| keep(e, **w))
                .map(|(e, w)| (e.clone(), *w))
                .collect(),
            weighted: self.weighted,
        }
    }

    /// BLAKE3 hash of the canonical edge list (weights included).
    ///
    /// Equal edge sets hash equally regardless of input order or chunking.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (edge, weight) in &self.edges {
            hasher.update(edge.source.as_bytes());
            hasher.update(b"\x00");
            hasher.update(edge.target.as_bytes());
            hasher.update(b"\x00");
            hasher.update(&weight.to_le_bytes());
        }
        format!("blake3:{}", hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a EdgeSet {
    type Item = (&'a Edge, &'a u32);
    type IntoIter = std::collections::btree_map::Iter<'a, Edge, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
