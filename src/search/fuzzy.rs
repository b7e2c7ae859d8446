//! Fuzzy Matching Engine
//!
//! Scores a search pattern against a candidate label by finding the best
//! subsequence alignment. Matching is case-insensitive and position-aware so
//! the UI can highlight the matched characters.

use unicode_normalization::UnicodeNormalization;

/// Score returned for an exact case-insensitive match of the whole candidate.
pub const MAX_SCORE: u32 = 1_000_000;

/// Base score for every matched character.
const SCORE_BASE: i32 = 10;
/// Bonus when a match directly follows the previous matched character.
const BONUS_CONSECUTIVE: i32 = 8;
/// Bonus when a match sits on a word boundary (start of string, after
/// whitespace or a separator, or on a lowercase-to-uppercase transition).
const BONUS_BOUNDARY: i32 = 12;
/// Penalty charged once per contiguous run of skipped candidate characters.
const PENALTY_GAP: i32 = 5;
/// Bonus when the pattern is an exact prefix of the candidate.
const BONUS_PREFIX: i32 = 50;
/// Shorter candidates outrank longer ones of equal alignment quality. The
/// bonus decays with candidate length and never inverts alignment quality.
const LENGTH_BONUS_SCALE: i32 = 100;

/// Match result with score and position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Final score; 0 means the pattern did not match
    pub score: u32,
    /// Indices of matched characters in the NFC-normalized candidate,
    /// ascending, one per pattern character
    pub positions: Vec<u32>,
}

impl MatchResult {
    /// The non-match result: score 0, no positions.
    pub fn none() -> Self {
        Self {
            score: 0,
            positions: Vec::new(),
        }
    }

    /// Whether the pattern matched at all
    pub fn matched(&self) -> bool {
        self.score > 0
    }
}

/// One in-progress alignment: accumulated score plus the matched positions.
#[derive(Debug, Clone)]
struct Alignment {
    score: i32,
    positions: Vec<u32>,
}

/// Fuzzy matcher over (candidate, pattern) pairs.
///
/// Stateless and shareable across threads; every call to [`evaluate`] is a
/// pure function of its inputs.
///
/// [`evaluate`]: FuzzyMatcher::evaluate
#[derive(Debug, Default, Clone, Copy)]
pub struct FuzzyMatcher;

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Score `pattern` against `candidate`.
    ///
    /// The pattern must occur as a subsequence of the candidate (order
    /// preserved, gaps allowed, case-insensitive). If any pattern character
    /// cannot be placed, the result is [`MatchResult::none`] - there is no
    /// partial credit. Among all valid alignments the highest-scoring one is
    /// chosen by dynamic programming over (candidate index, pattern index)
    /// with two rolling rows.
    ///
    /// An empty pattern yields [`MatchResult::none`]; callers decide what an
    /// empty search term means.
    pub fn evaluate(&self, candidate: &str, pattern: &str) -> MatchResult {
        let cand: Vec<char> = candidate.nfc().collect();
        let pat: Vec<char> = pattern.nfc().collect();

        if pat.is_empty() || pat.len() > cand.len() {
            return MatchResult::none();
        }

        let cand_folded: Vec<char> = cand.iter().map(|&c| fold(c)).collect();
        let pat_folded: Vec<char> = pat.iter().map(|&c| fold(c)).collect();

        if cand_folded == pat_folded {
            return MatchResult {
                score: MAX_SCORE,
                positions: (0..cand.len() as u32).collect(),
            };
        }

        let best = match self.best_alignment(&cand, &cand_folded, &pat_folded) {
            Some(alignment) => alignment,
            None => return MatchResult::none(),
        };

        let mut total = best.score;
        if cand_folded[..pat_folded.len()] == pat_folded[..] {
            total += BONUS_PREFIX;
        }
        total += LENGTH_BONUS_SCALE / (1 + cand.len() as i32);

        // Every matched character nets at least SCORE_BASE - PENALTY_GAP > 0,
        // so a complete alignment is always positive; the clamp reserves
        // MAX_SCORE for exact equality.
        let score = total.clamp(1, MAX_SCORE as i32 - 1) as u32;
        MatchResult {
            score,
            positions: best.positions,
        }
    }

    /// Maximum-scoring subsequence alignment, or `None` when the pattern is
    /// not a subsequence of the candidate.
    ///
    /// Rolling state per pattern index `j`:
    /// - `prev_end[j]`: best alignment with `pat[j]` matched exactly at the
    ///   previous candidate index (extending it is a consecutive run);
    /// - `detached[j]`: best alignment with `pat[j]` matched anywhere earlier
    ///   (extending it opens a gap, charged once per run).
    fn best_alignment(
        &self,
        cand: &[char],
        cand_folded: &[char],
        pat_folded: &[char],
    ) -> Option<Alignment> {
        let m = pat_folded.len();
        let mut prev_end: Vec<Option<Alignment>> = vec![None; m];
        let mut detached: Vec<Option<Alignment>> = vec![None; m];
        let mut best_final: Option<Alignment> = None;

        for (i, &c) in cand_folded.iter().enumerate() {
            let boundary = is_boundary(cand, i);
            let mut cur_end: Vec<Option<Alignment>> = vec![None; m];

            for j in 0..m {
                if c != pat_folded[j] {
                    continue;
                }
                let char_score = SCORE_BASE + if boundary { BONUS_BOUNDARY } else { 0 };

                let cell = if j == 0 {
                    let lead_gap = if i > 0 { -PENALTY_GAP } else { 0 };
                    Some(Alignment {
                        score: char_score + lead_gap,
                        positions: vec![i as u32],
                    })
                } else {
                    let adjacent = prev_end[j - 1]
                        .as_ref()
                        .map(|a| (a.score + char_score + BONUS_CONSECUTIVE, a));
                    let gapped = detached[j - 1]
                        .as_ref()
                        .map(|a| (a.score + char_score - PENALTY_GAP, a));
                    // On equal scores keep the consecutive run.
                    let extended = match (adjacent, gapped) {
                        (Some(a), Some(g)) => Some(if g.0 > a.0 { g } else { a }),
                        (a, g) => a.or(g),
                    };
                    extended.map(|(score, from)| {
                        let mut positions = from.positions.clone();
                        positions.push(i as u32);
                        Alignment { score, positions }
                    })
                };

                if j == m - 1 {
                    if let Some(ref done) = cell {
                        let better = best_final
                            .as_ref()
                            .map(|b| done.score > b.score)
                            .unwrap_or(true);
                        if better {
                            best_final = cell.clone();
                        }
                    }
                }
                cur_end[j] = cell;
            }

            for j in 0..m {
                if let Some(ended) = prev_end[j].take() {
                    let better = detached[j]
                        .as_ref()
                        .map(|d| ended.score > d.score)
                        .unwrap_or(true);
                    if better {
                        detached[j] = Some(ended);
                    }
                }
            }
            prev_end = cur_end;
        }

        best_final
    }
}

/// Case folding for comparison. Per-character so that match positions stay
/// 1:1 with the normalized candidate.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Word boundary test for the character at `i`.
fn is_boundary(cand: &[char], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = cand[i - 1];
    if prev.is_whitespace() || !prev.is_alphanumeric() {
        return true;
    }
    prev.is_lowercase() && cand[i].is_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(candidate: &str, pattern: &str) -> u32 {
        FuzzyMatcher::new().evaluate(candidate, pattern).score
    }

    #[test]
    fn test_exact_match_is_max_score() {
        let result = FuzzyMatcher::new().evaluate("Chrome", "chrome");
        assert_eq!(result.score, MAX_SCORE);
        assert_eq!(result.positions, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_missing_character_scores_zero() {
        assert_eq!(score("add new bsd", "inst"), 0);
        assert_eq!(score("aac", "inst"), 0);
    }

    #[test]
    fn test_pattern_longer_than_candidate_scores_zero() {
        assert_eq!(score("Chrome", "Can have rum only in my glass"), 0);
    }

    #[test]
    fn test_order_must_be_preserved() {
        // All characters present, but never in pattern order.
        assert_eq!(score("tsni", "inst"), 0);
        assert!(score("inst", "inst") > 0);
    }

    #[test]
    fn test_launcher_ranking() {
        let sources = [
            "file open in browser-test",
            "Install Package",
            "add new bsd",
            "Inste",
            "aac",
        ];

        let mut scored: Vec<(&str, u32)> = sources
            .iter()
            .map(|s| (*s, score(s, "inst")))
            .filter(|(_, s)| *s > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].0, "Inste");
        assert_eq!(scored[1].0, "Install Package");
        assert_eq!(scored[2].0, "file open in browser-test");
    }

    #[test]
    fn test_prefix_outranks_scattered() {
        assert!(score("Chrome", "chr") > score("Color Chooser", "chr"));
    }

    #[test]
    fn test_word_boundary_beats_middle() {
        assert!(score("Video Player", "vp") > score("navpoint", "vp"));
    }

    #[test]
    fn test_positions_cover_pattern() {
        let result = FuzzyMatcher::new().evaluate("Install Package", "inpa");
        assert!(result.matched());
        assert_eq!(result.positions.len(), 4);
        assert!(result.positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_positions_prefer_word_starts() {
        let result = FuzzyMatcher::new().evaluate("file open in browser-test", "inst");
        // The 'i'/'n' of the standalone word "in" score a boundary bonus and
        // a consecutive run, beating the scattered 'i' of "file".
        assert_eq!(result.positions[0], 10);
        assert_eq!(result.positions[1], 11);
    }

    #[test]
    fn test_empty_pattern_is_benign() {
        let result = FuzzyMatcher::new().evaluate("anything", "");
        assert_eq!(result, MatchResult::none());
        let result = FuzzyMatcher::new().evaluate("", "");
        assert_eq!(result, MatchResult::none());
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            score("Install Package", "INST"),
            score("Install Package", "inst")
        );
    }

    #[test]
    fn test_unicode_candidates() {
        assert!(score("Café Browser", "café") > 0);
        assert!(score("Łódź Viewer", "łódź") > 0);
    }

    #[test]
    fn test_deterministic() {
        let matcher = FuzzyMatcher::new();
        let a = matcher.evaluate("file open in browser-test", "inst");
        let b = matcher.evaluate("file open in browser-test", "inst");
        assert_eq!(a, b);
    }

    #[test]
    fn test_shorter_candidate_wins_equal_alignment() {
        assert!(score("Inste", "inst") > score("Install Package", "inst"));
    }
}
