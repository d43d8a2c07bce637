//! Near-miss suggestions for unknown unit names
//!
//! A candidate matches a search term when the term is a substring of its
//! abbreviation or full name, or when a similarity ratio against the
//! abbreviation, the full name or any single word of the full name reaches
//! `SIMILARITY_THRESHOLD`. Substring matches always rank first.

use std::cmp::Ordering;
use std::collections::HashSet;
use serde::Serialize;

/// Minimum similarity (0..=1) for a fuzzy match
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Shortest abbreviation considered when checking whether the term contains
/// the abbreviation; single letters would match almost everything.
const MIN_CONTAINED_ABBREV: usize = 2;

/// Ratcliff/Obershelp similarity: `2 * M / T`, where `M` counts characters in
/// matching blocks found by repeatedly taking the longest common substring.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_common_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Earliest longest common substring as `(start_a, start_b, len)`
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];

    for i in 0..a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                row[j + 1] = prev[j] + 1;
                if row[j + 1] > best.2 {
                    best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
                }
            }
        }
        prev = row;
    }

    best
}

/// How well a candidate matches a search term
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Substring,
    Similar(f64),
}

impl MatchKind {
    fn rank(&self) -> f64 {
        match self {
            MatchKind::Substring => f64::INFINITY,
            MatchKind::Similar(score) => *score,
        }
    }
}

/// Score a candidate against `search`. `None` means no match.
pub fn match_candidate(abbrev: &str, full_name: &str, search: &str) -> Option<MatchKind> {
    let search = search.trim().to_lowercase();
    if search.is_empty() {
        return Some(MatchKind::Substring);
    }
    let abbrev = abbrev.to_lowercase();
    let full_name = full_name.to_lowercase();

    let contains_abbrev = abbrev.chars().count() >= MIN_CONTAINED_ABBREV && search.contains(&abbrev);
    if abbrev.contains(&search) || full_name.contains(&search) || contains_abbrev {
        return Some(MatchKind::Substring);
    }

    let best = full_name
        .split_whitespace()
        .map(|word| similarity(&search, word))
        .chain([similarity(&search, &abbrev), similarity(&search, &full_name)])
        .fold(0.0_f64, f64::max);

    (best >= SIMILARITY_THRESHOLD).then_some(MatchKind::Similar(best))
}

/// True if the candidate should be listed for `search`
pub fn matches_search(abbrev: &str, full_name: &str, search: &str) -> bool {
    match_candidate(abbrev, full_name, search).is_some()
}

/// A ranked suggestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub full_name: String,
    #[serde(skip)]
    pub kind: MatchKind,
}

/// Rank `(abbreviation, full name)` candidates for `search`. Substring
/// matches come first, then by descending similarity, then by name. Each
/// name appears once, at its best rank.
pub fn rank<'a, I>(search: &str, candidates: I) -> Vec<Suggestion>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out: Vec<Suggestion> = candidates
        .into_iter()
        .filter_map(|(abbrev, full_name)| {
            match_candidate(abbrev, full_name, search).map(|kind| Suggestion {
                name: abbrev.to_string(),
                full_name: full_name.to_string(),
                kind,
            })
        })
        .collect();

    out.sort_by(|a, b| {
        b.kind
            .rank()
            .partial_cmp(&a.kind.rank())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    let mut seen = HashSet::new();
    out.retain(|s| seen.insert(s.name.clone()));
    out
}
