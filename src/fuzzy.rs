//! Approximate string matching over character diffs.

use similar::TextDiff;

/// Similarity in `[0, 1]`: twice the characters the two strings share in
/// order, over their total length.
pub fn ratio(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// The candidate most similar to `query`, if it scores at least `cutoff`.
///
/// Ties go to the lexicographically larger candidate.
pub fn close_match<'a, I>(query: &str, candidates: I, cutoff: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(f64, &'a str)> = None;
    for candidate in candidates {
        let score = ratio(candidate, query);
        if score < cutoff {
            continue;
        }
        let better = match best {
            None => true,
            Some((s, c)) => score > s || (score == s && candidate > c),
        };
        if better {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_known_values() {
        assert_eq!(ratio("abcd", "abcd"), 1.0);
        assert_eq!(ratio("abcd", "wxyz"), 0.0);
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-6);
        assert!((ratio("ape", "apple") - 0.75).abs() < 1e-6);
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn test_close_match_picks_best_above_cutoff() {
        let candidates = ["ocean lab", "library", "krupp college"];
        assert_eq!(
            close_match("ocean lap", candidates.iter().copied(), 0.6),
            Some("ocean lab")
        );
        assert_eq!(close_match("xyz", candidates.iter().copied(), 0.6), None);
    }

    #[test]
    fn test_close_match_tie_prefers_larger_candidate() {
        // "cab" and "cat" both share two characters with "ca".
        let candidates = ["cab", "cat"];
        assert_eq!(close_match("ca", candidates.iter().copied(), 0.6), Some("cat"));
    }

    #[test]
    fn test_close_match_multibyte() {
        let candidates = ["café", "mensa"];
        assert_eq!(close_match("cafe", candidates.iter().copied(), 0.6), Some("café"));
    }
}
