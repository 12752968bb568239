//! Best-effort extraction of structured scores from free-text judgments.
//!
//! The judge is asked to emit one line per criterion in the form
//! `<Label>: <result> - <explanation>`, but its output is treated as opaque
//! text: these functions scan line by line and fall back to defaults rather
//! than failing. Nothing here returns an error.

use crate::rubric::{ComparisonLabel, RubricMode, ScoreSet, DEFAULT_SCORE};
use std::collections::BTreeMap;

/// Extract a [`ScoreSet`] for the given mode from a free-text judgment.
///
/// Scans line by line. A line is recognized when it begins with one of the
/// mode's criterion labels (case-insensitively for [`RubricMode::Answer`],
/// exactly otherwise); the text after the first `:` is searched for the first
/// integer-or-decimal numeral, which becomes the criterion's score. When a
/// label matches more than one line, the last matching line wins. After the
/// scan, every criterion still missing is filled with [`DEFAULT_SCORE`].
///
/// Parsed numerals are preserved as-is, including values outside the declared
/// 1-5 scale; clamping would silently alter judge output.
///
/// # Example
///
/// ```
/// use sensemaking_eval::{parse_scores, RubricMode};
///
/// let scores = parse_scores("Correctness: 4 - ok", RubricMode::Action);
/// assert_eq!(scores.get("correctness"), Some(4.0));
/// // Criteria absent from the text get the midpoint default.
/// assert_eq!(scores.get("safety"), Some(3.0));
/// ```
pub fn parse_scores(text: &str, mode: RubricMode) -> ScoreSet {
    let mut scores = ScoreSet::new();

    for line in text.lines() {
        let line = line.trim();
        for criterion in mode.criteria() {
            if !line_starts_with(line, criterion.label, mode.case_insensitive()) {
                continue;
            }
            match line.split_once(':').and_then(|(_, rest)| first_numeral(rest)) {
                Some(value) => scores.insert(criterion.key, value),
                None if mode.eager_default() => scores.insert(criterion.key, DEFAULT_SCORE),
                None => {}
            }
            break;
        }
    }

    for criterion in mode.criteria() {
        if scores.get(criterion.key).is_none() {
            scores.insert(criterion.key, DEFAULT_SCORE);
        }
    }

    scores
}

/// Extract per-criterion categorical verdicts from a pairwise comparison
/// judgment.
///
/// For each comparison criterion found at a line start (exact label match),
/// the trimmed text after the first `:` is classified by its first character:
/// `A` maps to [`ComparisonLabel::MethodA`], `B` to
/// [`ComparisonLabel::MethodB`], anything else to [`ComparisonLabel::Tie`].
/// Criteria absent from the text are filled with `Tie`, so the returned map
/// always covers the full comparison criterion set.
///
/// # Example
///
/// ```
/// use sensemaking_eval::{parse_comparison, ComparisonLabel};
///
/// let labels = parse_comparison("Comprehensiveness: A - more thorough");
/// assert_eq!(labels["comprehensiveness"], ComparisonLabel::MethodA);
/// assert_eq!(labels["factual_accuracy"], ComparisonLabel::Tie);
/// ```
pub fn parse_comparison(text: &str) -> BTreeMap<String, ComparisonLabel> {
    let mut labels = BTreeMap::new();

    for line in text.lines() {
        let line = line.trim();
        for criterion in RubricMode::Comparison.criteria() {
            if !line.starts_with(criterion.label) {
                continue;
            }
            let label = match line.split_once(':') {
                Some((_, rest)) => match rest.trim_start().chars().next() {
                    Some('A') => ComparisonLabel::MethodA,
                    Some('B') => ComparisonLabel::MethodB,
                    _ => ComparisonLabel::Tie,
                },
                None => ComparisonLabel::Tie,
            };
            labels.insert(criterion.key.to_string(), label);
            break;
        }
    }

    for criterion in RubricMode::Comparison.criteria() {
        labels
            .entry(criterion.key.to_string())
            .or_insert(ComparisonLabel::Tie);
    }

    labels
}

fn line_starts_with(line: &str, label: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        line.get(..label.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(label))
    } else {
        line.starts_with(label)
    }
}

/// Find the first `\d+(\.\d+)?` token in the text and parse it.
fn first_numeral(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            return text[start..i].parse().ok();
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::integer("4 - ok", Some(4.0))]
    #[case::decimal("4.5 out of 5", Some(4.5))]
    #[case::embedded("score is 3", Some(3.0))]
    #[case::first_of_many("2 then 5", Some(2.0))]
    #[case::fraction("4/5", Some(4.0))]
    #[case::trailing_dot("4. Good", Some(4.0))]
    #[case::no_digits("excellent", None)]
    #[case::empty("", None)]
    #[case::negative_sign_dropped("-2", Some(2.0))]
    fn test_first_numeral(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(first_numeral(input), expected);
    }

    #[test]
    fn test_parse_scores_clean_input() {
        let text = "Correctness: 4 - ok";
        let scores = parse_scores(text, RubricMode::Action);
        assert_eq!(scores.get("correctness"), Some(4.0));
    }

    #[test]
    fn test_parse_scores_fills_every_criterion() {
        let scores = parse_scores("nothing recognizable here", RubricMode::Answer);
        assert_eq!(scores.len(), 4);
        for criterion in RubricMode::Answer.criteria() {
            assert_eq!(scores.get(criterion.key), Some(DEFAULT_SCORE));
        }
    }

    #[test]
    fn test_parse_scores_full_answer_judgment() {
        let text = "\
Comprehensiveness: 4 - covers the main aspects
Human Enfranchisement: 5 - cites sources throughout
Diversity: 2 - single viewpoint
Faithfulness: 3.5 - mostly grounded

Overall Score: 3.6 - solid answer";
        let scores = parse_scores(text, RubricMode::Answer);
        assert_eq!(scores.get("comprehensiveness"), Some(4.0));
        assert_eq!(scores.get("human_enfranchisement"), Some(5.0));
        assert_eq!(scores.get("diversity"), Some(2.0));
        assert_eq!(scores.get("faithfulness"), Some(3.5));
        assert_eq!(scores.len(), 4);
    }

    #[test]
    fn test_parse_scores_answer_mode_ignores_case() {
        let scores = parse_scores("COMPREHENSIVENESS: 5", RubricMode::Answer);
        assert_eq!(scores.get("comprehensiveness"), Some(5.0));
    }

    #[test]
    fn test_parse_scores_action_mode_is_case_sensitive() {
        let scores = parse_scores("correctness: 5", RubricMode::Action);
        assert_eq!(scores.get("correctness"), Some(DEFAULT_SCORE));
    }

    #[test]
    fn test_parse_scores_label_without_numeral_defaults() {
        let scores = parse_scores("Safety: excellent", RubricMode::Action);
        assert_eq!(scores.get("safety"), Some(DEFAULT_SCORE));
    }

    #[test]
    fn test_parse_scores_last_match_wins() {
        let text = "Clarity: 2 - first pass\nClarity: 5 - revised";
        let scores = parse_scores(text, RubricMode::Action);
        assert_eq!(scores.get("clarity"), Some(5.0));
    }

    #[test]
    fn test_parse_scores_action_eager_default_overwrites() {
        // A later recognized line with no numeral resets to the default in
        // action mode; the answer mode skips such lines instead.
        let action = parse_scores("Clarity: 4\nClarity: unclear", RubricMode::Action);
        assert_eq!(action.get("clarity"), Some(DEFAULT_SCORE));

        let answer = parse_scores(
            "Diversity: 4\nDiversity: unclear",
            RubricMode::Answer,
        );
        assert_eq!(answer.get("diversity"), Some(4.0));
    }

    #[test]
    fn test_parse_scores_preserves_out_of_range_values() {
        let scores = parse_scores("Correctness: 9 - off the scale", RubricMode::Action);
        assert_eq!(scores.get("correctness"), Some(9.0));
    }

    #[test]
    fn test_parse_scores_indented_lines() {
        let scores = parse_scores("   Practicality: 4", RubricMode::Action);
        assert_eq!(scores.get("practicality"), Some(4.0));
    }

    #[test]
    fn test_parse_scores_idempotent_on_clean_input() {
        let first = parse_scores("Correctness: 4 - ok", RubricMode::Action);
        let second = parse_scores("Correctness: 4 - ok", RubricMode::Action);
        assert_eq!(first, second);
    }

    #[rstest]
    #[case::method_a("Comprehensiveness: A - reason", ComparisonLabel::MethodA)]
    #[case::method_b("Comprehensiveness: B", ComparisonLabel::MethodB)]
    #[case::tie_explicit("Comprehensiveness: Tie - equal", ComparisonLabel::Tie)]
    #[case::tie_unparsable("Comprehensiveness: unclear", ComparisonLabel::Tie)]
    #[case::tie_empty_result("Comprehensiveness:", ComparisonLabel::Tie)]
    #[case::tie_no_colon("Comprehensiveness", ComparisonLabel::Tie)]
    fn test_parse_comparison_classification(
        #[case] line: &str,
        #[case] expected: ComparisonLabel,
    ) {
        let labels = parse_comparison(line);
        assert_eq!(labels["comprehensiveness"], expected);
    }

    #[test]
    fn test_parse_comparison_full_judgment() {
        let text = "\
Comprehensiveness: A - more thorough
Supporting Evidence: B - better citations
Diverse Perspectives: Tie - both narrow
Factual Accuracy: A
Overall Preference: B - despite gaps";
        let labels = parse_comparison(text);
        assert_eq!(labels["comprehensiveness"], ComparisonLabel::MethodA);
        assert_eq!(labels["supporting_evidence"], ComparisonLabel::MethodB);
        assert_eq!(labels["diverse_perspectives"], ComparisonLabel::Tie);
        assert_eq!(labels["factual_accuracy"], ComparisonLabel::MethodA);
        assert_eq!(labels["overall_preference"], ComparisonLabel::MethodB);
    }

    #[test]
    fn test_parse_comparison_missing_criteria_default_to_tie() {
        let labels = parse_comparison("Factual Accuracy: B");
        assert_eq!(labels.len(), 5);
        assert_eq!(labels["factual_accuracy"], ComparisonLabel::MethodB);
        assert_eq!(labels["overall_preference"], ComparisonLabel::Tie);
    }

    #[test]
    fn test_parse_comparison_empty_text() {
        let labels = parse_comparison("");
        assert_eq!(labels.len(), 5);
        assert!(labels.values().all(|l| *l == ComparisonLabel::Tie));
    }
}
