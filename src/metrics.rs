//! Automatic text-similarity metrics and the provider seam.
//!
//! The engine consumes metric values, it does not compute the n-gram or
//! alignment families itself: those come from a [`MetricProvider`]
//! implementation injected by the caller. The built-in [`LexicalMetrics`]
//! provider covers only the signals the engine has always computed inline,
//! word-overlap similarity and the exact-match flag.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors a metric provider can signal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetricsError {
    /// The provider cannot run at all (e.g. a missing backend).
    #[error("Metric computation unavailable: {0}")]
    Unavailable(String),

    /// The provider ran but failed on this input pair.
    #[error("Metric computation failed: {0}")]
    Failed(String),
}

/// Fixed record of automatic similarity metrics for one answer.
///
/// All similarity values are expected in `[0, 1]` by the upstream metric
/// definitions; the engine does not re-validate them. When computation is
/// unavailable every value defaults to 0.0 and `note` explains why, rather
/// than the record being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomaticMetrics {
    /// N-gram precision overlap against the reference.
    pub bleu: f64,
    /// Alignment-based overlap against the reference.
    pub meteor: f64,
    /// Longest-common-subsequence F1 against the reference.
    pub rouge_l_f1: f64,
    /// Unigram overlap F1.
    pub rouge_1_f1: f64,
    /// Bigram overlap F1.
    pub rouge_2_f1: f64,
    /// Word-overlap F1 between the token sets.
    pub semantic_similarity: f64,
    /// Whether the normalized texts are identical.
    pub exact_match: bool,
    /// Explanatory note, set when values are defaults rather than computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AutomaticMetrics {
    /// The all-zero record substituted when metric computation is
    /// unavailable, carrying an explanatory note instead of failing.
    pub fn unavailable(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }
}

/// Collaborator that computes [`AutomaticMetrics`] for a predicted answer
/// against a reference answer.
///
/// Implementations may fail; the engine absorbs an `Err` into
/// [`AutomaticMetrics::unavailable`] so a metric outage never fails an item.
///
/// # Example
///
/// ```
/// use sensemaking_eval::{AutomaticMetrics, MetricProvider, MetricsError};
///
/// struct PerfectMetrics;
///
/// impl MetricProvider for PerfectMetrics {
///     fn name(&self) -> &str {
///         "perfect"
///     }
///
///     fn compute(
///         &self,
///         _predicted: &str,
///         _reference: &str,
///     ) -> Result<AutomaticMetrics, MetricsError> {
///         Ok(AutomaticMetrics {
///             bleu: 1.0,
///             meteor: 1.0,
///             rouge_l_f1: 1.0,
///             exact_match: true,
///             ..AutomaticMetrics::default()
///         })
///     }
/// }
/// ```
pub trait MetricProvider: Send + Sync {
    /// The name of this provider (used in logs).
    fn name(&self) -> &str;

    /// Compute metrics for a predicted answer against a reference.
    fn compute(&self, predicted: &str, reference: &str) -> Result<AutomaticMetrics, MetricsError>;
}

/// Built-in provider for the engine's own lexical signals.
///
/// Computes the exact-match flag and the word-overlap F1 published as
/// `semantic_similarity`. The n-gram and alignment metric fields are left at
/// 0.0 with a note; supply an external [`MetricProvider`] for those.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalMetrics;

impl MetricProvider for LexicalMetrics {
    fn name(&self) -> &str {
        "lexical"
    }

    fn compute(&self, predicted: &str, reference: &str) -> Result<AutomaticMetrics, MetricsError> {
        let predicted = normalize(predicted);
        let reference = normalize(reference);

        Ok(AutomaticMetrics {
            semantic_similarity: word_overlap_f1(&predicted, &reference),
            exact_match: predicted == reference,
            note: Some("n-gram and alignment metrics require an external provider".to_string()),
            ..AutomaticMetrics::default()
        })
    }
}

/// Normalize text for comparison.
///
/// - Replace punctuation with spaces (keeping `&`, which joins compound
///   action phrases)
/// - Lowercase
/// - Collapse whitespace runs into single spaces
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '&' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// F1 over the two texts' word sets; 0.0 when either side is empty or the
/// sets are disjoint.
fn word_overlap_f1(predicted: &str, reference: &str) -> f64 {
    let predicted: BTreeSet<&str> = predicted.split_whitespace().collect();
    let reference: BTreeSet<&str> = reference.split_whitespace().collect();
    if predicted.is_empty() || reference.is_empty() {
        return 0.0;
    }

    let overlap = predicted.intersection(&reference).count();
    if overlap == 0 {
        return 0.0;
    }

    let precision = overlap as f64 / predicted.len() as f64;
    let recall = overlap as f64 / reference.len() as f64;
    2.0 * precision * recall / (precision + recall)
}
