//! Top-K author selection over the global degree index.

use serde::Serialize;

use crate::degree::DegreeIndex;

/// An author with its global degree, in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedAuthor {
    pub author: String,
    pub degree: usize,
}

/// Select up to `k` authors by degree descending, ties by name ascending.
///
/// The order is a pure function of the index, so `top_k(idx, 5)` is always
/// a prefix of `top_k(idx, 10)`. `k` larger than the index returns every
/// author; `k == 0` returns nothing.
#[must_use]
pub fn top_k(index: &DegreeIndex, k: usize) -> Vec<RankedAuthor> {
    if k == 0 {
        return Vec::new();
    }
    index
        .sorted()
        .into_iter()
        .take(k)
        .map(|(author, degree)| RankedAuthor {
            author: author.to_string(),
            degree,
        })
        .collect()
}

/// Dense rank (1-based) of each selected author by degree descending.
///
/// Equal degrees share a rank and the next distinct degree takes the next
/// integer, so ranks run `1..=distinct_degrees`.
#[must_use]
pub fn dense_ranks(selected: &[RankedAuthor]) -> Vec<usize> {
    let mut degrees: Vec<usize> = selected.iter().map(|r| r.degree).collect();
    degrees.sort_unstable_by(|a, b| b.cmp(a));
    degrees.dedup();
    selected
        .iter()
        .map(|r| {
            degrees
                .iter()
                .position(|d| *d == r.degree)
                .map_or(degrees.len() + 1, |p| p + 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ranked: &[RankedAuthor]) -> Vec<&str> {
        ranked.iter().map(|r| r.author.as_str()).collect()
    }

    fn tied_index() -> DegreeIndex {
        DegreeIndex::from_pairs([
            ("Zed", 5),
            ("Carol", 2),
            ("Alice", 5),
            ("Bob", 2),
            ("Dan", 1),
            ("Eve", 2),
        ])
    }

    #[test]
    fn ties_resolve_by_name() {
        let top = top_k(&tied_index(), 4);
        assert_eq!(names(&top), vec!["Alice", "Zed", "Bob", "Carol"]);
        assert_eq!(top[0].degree, 5);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let idx = tied_index();
        assert_eq!(top_k(&idx, 6), top_k(&idx, 6));
    }

    #[test]
    fn k_beyond_len_returns_all() {
        assert_eq!(top_k(&tied_index(), 100).len(), 6);
    }

    #[test]
    fn k_zero_and_empty_index() {
        assert!(top_k(&tied_index(), 0).is_empty());
        assert!(top_k(&DegreeIndex::default(), 3).is_empty());
    }

    #[test]
    fn dense_ranks_share_ties() {
        let top = top_k(&tied_index(), 6);
        // Alice 5, Zed 5, Bob 2, Carol 2, Eve 2, Dan 1
        assert_eq!(dense_ranks(&top), vec![1, 1, 2, 2, 2, 3]);
        assert!(dense_ranks(&[]).is_empty());
    }
}
