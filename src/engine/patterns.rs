//! Fixed-length pattern mining over classified history
//!
//! Several models look for the most frequent n-gram inside a bounded suffix
//! of the history. The enumeration is shared here so every model inherits the
//! same tie-break: when two patterns occur equally often, the one seen first
//! (scanning from the newest round) wins.

use crate::types::Category;

/// A repeated window of categories with its occurrence count
#[derive(Debug, Clone, PartialEq)]
pub struct DominantPattern {
    pub pattern: Vec<Option<Category>>,
    pub count: usize,
}

impl DominantPattern {
    /// Final element of the pattern window
    pub fn last(&self) -> Option<Category> {
        self.pattern.last().copied().flatten()
    }
}

/// Most frequent n-gram in the sequence (newest first), first-seen wins ties.
///
/// Returns `None` when the sequence is shorter than `n`.
pub fn dominant_ngram(sequence: &[Option<Category>], n: usize) -> Option<DominantPattern> {
    if n == 0 || sequence.len() < n {
        return None;
    }

    // Insertion-ordered counting keeps the tie-break deterministic.
    let mut seen: Vec<(&[Option<Category>], usize)> = Vec::new();
    for window in sequence.windows(n) {
        match seen.iter_mut().find(|(p, _)| *p == window) {
            Some((_, count)) => *count += 1,
            None => seen.push((window, 1)),
        }
    }

    let mut best: Option<&(&[Option<Category>], usize)> = None;
    for entry in &seen {
        if best.map_or(true, |b| entry.1 > b.1) {
            best = Some(entry);
        }
    }

    best.map(|(pattern, count)| DominantPattern {
        pattern: pattern.to_vec(),
        count: *count,
    })
}
