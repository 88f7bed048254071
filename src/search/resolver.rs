//! Title resolver - maps free-text user input to one canonical title
//!
//! Resolution runs an ordered chain of matchers and the first hit wins:
//! 1. exact title
//! 2. fuzzy sequence ratio at or above the cutoff
//! 3. case-insensitive substring containment
//!
//! Finding nothing is a normal outcome (`None`), not an error.

use serde::Serialize;
use tracing::{debug, trace};

use crate::core::item::Item;

/// Default minimum ratio for the fuzzy matcher
pub const DEFAULT_CUTOFF: f32 = 0.4;

/// A single hit produced by a matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub score: f32,
}

/// One resolution strategy
pub trait Matcher {
    /// Short identifier shown in output
    fn name(&self) -> &'static str;

    /// Try to match `input` against the items, in sequence order
    fn attempt(&self, input: &str, items: &[Item]) -> Option<Candidate>;
}

/// Title equal to the input
pub struct ExactMatcher;

impl Matcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn attempt(&self, input: &str, items: &[Item]) -> Option<Candidate> {
        items
            .iter()
            .position(|item| item.title == input)
            .map(|index| Candidate { index, score: 1.0 })
    }
}

/// Highest sequence ratio, accepted at or above `cutoff`.
/// Ties go to the earliest item.
pub struct FuzzyMatcher {
    cutoff: f32,
}

impl FuzzyMatcher {
    pub fn new(cutoff: f32) -> Self {
        Self { cutoff }
    }
}

impl Matcher for FuzzyMatcher {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn attempt(&self, input: &str, items: &[Item]) -> Option<Candidate> {
        let input_lower = input.to_lowercase();
        let mut best: Option<Candidate> = None;

        for (index, item) in items.iter().enumerate() {
            let score = sequence_ratio(&input_lower, &item.title.to_lowercase());
            if score < self.cutoff {
                continue;
            }
            if best.map_or(true, |b| score > b.score) {
                best = Some(Candidate { index, score });
            }
        }

        best
    }
}

/// First title containing the input, case-insensitive.
/// Score is the share of the title covered by the input.
pub struct ContainsMatcher;

impl Matcher for ContainsMatcher {
    fn name(&self) -> &'static str {
        "contains"
    }

    fn attempt(&self, input: &str, items: &[Item]) -> Option<Candidate> {
        let input_lower = input.to_lowercase();
        let input_len = input_lower.chars().count();

        items.iter().enumerate().find_map(|(index, item)| {
            let title_lower = item.title.to_lowercase();
            title_lower.contains(&input_lower).then(|| Candidate {
                index,
                score: input_len as f32 / title_lower.chars().count().max(1) as f32,
            })
        })
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub index: usize,
    pub title: String,
    pub matcher: &'static str,
    pub score: f32,
}

/// Ordered chain of matchers
pub struct Resolver {
    matchers: Vec<Box<dyn Matcher>>,
}

impl Resolver {
    /// Default chain: exact, fuzzy (with `cutoff`), contains
    pub fn new(cutoff: f32) -> Self {
        Self {
            matchers: vec![
                Box::new(ExactMatcher),
                Box::new(FuzzyMatcher::new(cutoff)),
                Box::new(ContainsMatcher),
            ],
        }
    }

    /// Chain with no matchers; add them with `with_matcher`
    pub fn empty() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// Append a matcher to the end of the chain
    pub fn with_matcher(mut self, matcher: Box<dyn Matcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Resolve `input` to a title drawn from `items`
    pub fn resolve(&self, input: &str, items: &[Item]) -> Option<Resolution> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        for matcher in &self.matchers {
            if let Some(candidate) = matcher.attempt(input, items) {
                let title = items[candidate.index].title.clone();
                debug!(
                    input,
                    title = %title,
                    matcher = matcher.name(),
                    score = candidate.score,
                    "Resolved"
                );
                return Some(Resolution {
                    index: candidate.index,
                    title,
                    matcher: matcher.name(),
                    score: candidate.score,
                });
            }
            trace!(input, matcher = matcher.name(), "No hit");
        }

        debug!(input, "No match");
        None
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF)
    }
}

/// Similarity ratio of two strings in [0, 1]: `2 * M / T`.
///
/// M counts characters in matching blocks, found by taking the longest common
/// substring and recursing on the pieces left and right of it. T is the total
/// character count of both strings. Two empty strings score 1.0.
pub fn sequence_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f32 / total as f32
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block within a[alo..ahi] and b[blo..bhi] as (i, j, len).
/// Earliest in `a` wins, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // run[j - blo + 1] = length of the common run ending at (i - 1, j)
    let mut prev = vec![0usize; bhi - blo + 1];
    let mut curr = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            curr[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };
            let k = curr[col];
            if k > best_k {
                best_i = i + 1 - k;
                best_j = j + 1 - k;
                best_k = k;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_k)
}
