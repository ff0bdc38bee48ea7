//! Fuzzy address matching.
//!
//! Similarity is `rapidfuzz`'s normalized Indel ratio scaled to 0–100:
//! twice the longest common subsequence over the combined length.
//! Inputs are preprocessed first (lowercase, punctuation to spaces,
//! whitespace collapsed), so `"Rua Principal, 100"` and `"rua principal 100"`
//! compare equal.

use rapidfuzz::fuzz;

/// Default minimum score for an address lookup to count as a match.
pub const DEFAULT_THRESHOLD: f64 = 60.0;

/// The winning candidate of [`best_match`].
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    /// Position of the candidate in the input iteration order.
    pub index: usize,
    pub candidate: &'a str,
    pub score: f64,
}

/// Lowercases, turns non-alphanumerics into spaces, and collapses whitespace.
pub fn preprocess(s: &str) -> String {
    let replaced: String = s
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Indel similarity of two already-preprocessed strings, 0–100.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Returns the candidate most similar to `query`, if it scores at least
/// `threshold`.
///
/// Ties go to the first candidate encountered. Returns `None` for an empty
/// candidate set or a query with no alphanumeric content.
///
/// ```rust
/// use inspection_desk::matcher::best_match;
///
/// let addresses = ["Av. Brasil, 25", "Rua Principal, 100"];
/// let m = best_match("Rua Principal 100", addresses, 60.0).unwrap();
/// assert_eq!(m.index, 1);
/// assert!(best_match("Travessa Azul", addresses, 60.0).is_none());
/// ```
pub fn best_match<'a, I>(query: &str, candidates: I, threshold: f64) -> Option<Match<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = preprocess(query);
    if query.is_empty() {
        return None;
    }

    let mut best: Option<Match<'a>> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let score = ratio(&query, &preprocess(candidate));
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Match {
                index,
                candidate,
                score,
            });
        }
    }

    best.filter(|m| m.score >= threshold)
}
