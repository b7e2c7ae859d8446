use crate::search::fuzzy::FuzzyMatcher;
use proptest::prelude::*;

/// Case-insensitive subsequence check, the ground truth the scorer must obey.
fn is_subsequence(candidate: &str, pattern: &str) -> bool {
    let mut cand = candidate.chars().flat_map(|c| c.to_lowercase().next());
    'outer: for p in pattern.chars().flat_map(|c| c.to_lowercase().next()) {
        for c in cand.by_ref() {
            if c == p {
                continue 'outer;
            }
        }
        return false;
    }
    true
}

// Property test: a positive score implies the pattern is a case-insensitive
// subsequence of the candidate
proptest! {
    #[test]
    fn positive_score_implies_subsequence(
        candidate in "[a-zA-Z0-9 _-]{0,40}",
        pattern in "[a-zA-Z0-9]{1,8}",
    ) {
        let result = FuzzyMatcher::new().evaluate(&candidate, &pattern);
        if result.score > 0 {
            prop_assert!(is_subsequence(&candidate, &pattern));
        }
    }
}

// Property test: a pattern that is not a subsequence always scores 0,
// no partial credit for the characters that did match
proptest! {
    #[test]
    fn non_subsequence_scores_zero(
        candidate in "[a-zA-Z ]{0,40}",
        pattern in "[a-zA-Z]{1,8}",
    ) {
        if !is_subsequence(&candidate, &pattern) {
            let result = FuzzyMatcher::new().evaluate(&candidate, &pattern);
            prop_assert_eq!(result.score, 0);
            prop_assert!(result.positions.is_empty());
        }
    }
}

// Property test: repeated evaluation returns identical score and positions
proptest! {
    #[test]
    fn evaluation_is_deterministic(
        candidate in "[a-zA-Z0-9 ._-]{0,40}",
        pattern in "[a-zA-Z0-9]{0,8}",
    ) {
        let matcher = FuzzyMatcher::new();
        let first = matcher.evaluate(&candidate, &pattern);
        let second = matcher.evaluate(&candidate, &pattern);
        prop_assert_eq!(first, second);
    }
}

// Property test: when matched, positions are strictly ascending with one
// entry per pattern character
proptest! {
    #[test]
    fn positions_are_ascending_and_complete(
        candidate in "[a-zA-Z0-9 ]{0,40}",
        pattern in "[a-zA-Z0-9]{1,8}",
    ) {
        let result = FuzzyMatcher::new().evaluate(&candidate, &pattern);
        if result.score > 0 {
            prop_assert_eq!(result.positions.len(), pattern.chars().count());
            prop_assert!(result.positions.windows(2).all(|w| w[0] < w[1]));
            let cand_len = candidate.chars().count() as u32;
            prop_assert!(result.positions.iter().all(|&p| p < cand_len));
        }
    }
}

// Property test: filtering at a higher threshold always yields a subset of
// filtering at a lower one
proptest! {
    #[test]
    fn threshold_filtering_is_monotonic(
        candidates in proptest::collection::vec("[a-zA-Z0-9 ]{0,30}", 0..20),
        pattern in "[a-zA-Z0-9]{1,6}",
        t1 in 0u32..100,
        spread in 1u32..100,
    ) {
        let t2 = t1 + spread;
        let matcher = FuzzyMatcher::new();
        let keep = |threshold: u32| -> Vec<&String> {
            candidates
                .iter()
                .filter(|c| matcher.evaluate(c, &pattern).score > threshold)
                .collect()
        };
        let loose = keep(t1);
        let strict = keep(t2);
        prop_assert!(strict.iter().all(|c| loose.contains(c)));
    }
}
