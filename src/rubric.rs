//! Rubric vocabulary: evaluation modes, criteria, and score collections.
//!
//! Every evaluation mode carries a fixed set of named criteria on a 1-5
//! ordinal scale. The midpoint default applied when a criterion cannot be
//! extracted lives here as a single policy shared by every mode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default score assigned when a criterion is missing or unparsable.
///
/// This is the midpoint of the 1-5 ordinal scale. Extraction fills every
/// recognized criterion with this value rather than omitting it.
pub const DEFAULT_SCORE: f64 = 3.0;

/// A named rubric dimension on a fixed 1-5 ordinal scale.
///
/// `key` is the stable snake_case identifier used in [`ScoreSet`]s and JSON
/// reports; `label` is the human-readable line prefix the judge is asked to
/// emit (e.g. `Human Enfranchisement: 4 - ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criterion {
    /// Stable identifier, e.g. `human_enfranchisement`.
    pub key: &'static str,
    /// Display label the judge emits, e.g. `Human Enfranchisement`.
    pub label: &'static str,
}

const ANSWER_CRITERIA: &[Criterion] = &[
    Criterion {
        key: "comprehensiveness",
        label: "Comprehensiveness",
    },
    Criterion {
        key: "human_enfranchisement",
        label: "Human Enfranchisement",
    },
    Criterion {
        key: "diversity",
        label: "Diversity",
    },
    Criterion {
        key: "faithfulness",
        label: "Faithfulness",
    },
];

const ACTION_CRITERIA: &[Criterion] = &[
    Criterion {
        key: "correctness",
        label: "Correctness",
    },
    Criterion {
        key: "completeness",
        label: "Completeness",
    },
    Criterion {
        key: "practicality",
        label: "Practicality",
    },
    Criterion {
        key: "safety",
        label: "Safety",
    },
    Criterion {
        key: "clarity",
        label: "Clarity",
    },
];

const COMPARISON_CRITERIA: &[Criterion] = &[
    Criterion {
        key: "comprehensiveness",
        label: "Comprehensiveness",
    },
    Criterion {
        key: "supporting_evidence",
        label: "Supporting Evidence",
    },
    Criterion {
        key: "diverse_perspectives",
        label: "Diverse Perspectives",
    },
    Criterion {
        key: "factual_accuracy",
        label: "Factual Accuracy",
    },
    Criterion {
        key: "overall_preference",
        label: "Overall Preference",
    },
];

/// Evaluation mode, carrying its recognized criterion set and the parsing
/// conventions that go with it.
///
/// # Example
///
/// ```
/// use sensemaking_eval::RubricMode;
///
/// let keys: Vec<&str> = RubricMode::Answer
///     .criteria()
///     .iter()
///     .map(|c| c.key)
///     .collect();
/// assert_eq!(
///     keys,
///     ["comprehensiveness", "human_enfranchisement", "diversity", "faithfulness"]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricMode {
    /// Qualitative answer evaluation without a reference answer.
    Answer,
    /// Action-specific evaluation against a ground-truth answer.
    Action,
    /// Pairwise A/B comparison of two answers to the same question.
    Comparison,
}

impl RubricMode {
    /// The recognized criteria for this mode, in prompt order.
    pub fn criteria(self) -> &'static [Criterion] {
        match self {
            RubricMode::Answer => ANSWER_CRITERIA,
            RubricMode::Action => ACTION_CRITERIA,
            RubricMode::Comparison => COMPARISON_CRITERIA,
        }
    }

    /// Whether label matching during extraction ignores ASCII case.
    ///
    /// Only the qualitative answer mode matches case-insensitively; the
    /// action and comparison modes require the exact label.
    pub fn case_insensitive(self) -> bool {
        matches!(self, RubricMode::Answer)
    }

    /// Whether a recognized label line with no numeral assigns the default
    /// immediately (and so can overwrite an earlier parse on a later line).
    ///
    /// The action mode assigns eagerly; the answer mode skips the line and
    /// relies on the post-scan backfill.
    pub(crate) fn eager_default(self) -> bool {
        matches!(self, RubricMode::Action)
    }
}

/// Categorical outcome of one pairwise comparison criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonLabel {
    /// The first method's answer was preferred.
    MethodA,
    /// The second method's answer was preferred.
    MethodB,
    /// No preference, or the judgment line was absent or unparsable.
    Tie,
}

/// Mapping from criterion key to numeric score.
///
/// After extraction every recognized criterion of the active mode is present,
/// either parsed from the judgment or filled with [`DEFAULT_SCORE`]. Keys are
/// ordered for deterministic serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSet(BTreeMap<String, f64>);

impl ScoreSet {
    /// Create an empty score set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a criterion score.
    pub fn insert(&mut self, key: impl Into<String>, score: f64) {
        self.0.insert(key.into(), score);
    }

    /// Look up a criterion score.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Number of criteria present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set contains no scores.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, score)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Unweighted arithmetic mean of all scores, or 0.0 if empty.
    pub fn mean(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.values().sum::<f64>() / self.0.len() as f64
    }
}

impl FromIterator<(String, f64)> for ScoreSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_criterion_counts() {
        assert_eq!(RubricMode::Answer.criteria().len(), 4);
        assert_eq!(RubricMode::Action.criteria().len(), 5);
        assert_eq!(RubricMode::Comparison.criteria().len(), 5);
    }

    #[test]
    fn test_only_answer_mode_is_case_insensitive() {
        assert!(RubricMode::Answer.case_insensitive());
        assert!(!RubricMode::Action.case_insensitive());
        assert!(!RubricMode::Comparison.case_insensitive());
    }

    #[test]
    fn test_score_set_mean() {
        let mut scores = ScoreSet::new();
        scores.insert("correctness", 4.0);
        scores.insert("clarity", 2.0);
        assert_eq!(scores.mean(), 3.0);
    }

    #[test]
    fn test_score_set_mean_empty() {
        assert_eq!(ScoreSet::new().mean(), 0.0);
    }

    #[test]
    fn test_score_set_overwrite() {
        let mut scores = ScoreSet::new();
        scores.insert("safety", 2.0);
        scores.insert("safety", 5.0);
        assert_eq!(scores.get("safety"), Some(5.0));
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn test_score_set_serialization_is_flat() {
        let mut scores = ScoreSet::new();
        scores.insert("clarity", 4.0);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"clarity":4.0}"#);
    }

    #[test]
    fn test_comparison_label_serde_names() {
        let json = serde_json::to_string(&ComparisonLabel::MethodA).unwrap();
        assert_eq!(json, r#""method_a""#);
        let tie: ComparisonLabel = serde_json::from_str(r#""tie""#).unwrap();
        assert_eq!(tie, ComparisonLabel::Tie);
    }
}
