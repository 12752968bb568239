//! Per-item evaluation records and score fusion.
//!
//! Records are value objects: constructed once per answer (or per matched
//! pair), immutable afterward. Failures are data, not panics; an errored
//! record carries its message and is excluded from aggregation downstream.

use crate::metrics::AutomaticMetrics;
use crate::rubric::{ComparisonLabel, ScoreSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weights for fusing automatic metrics with the judge's rubric score.
///
/// The default encodes the design choice that lexical-overlap metrics are the
/// primary, reproducible signal for ground-truth-bearing questions, with the
/// judge's qualitative opinion as a secondary corrective: 60% automatic, 40%
/// judge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Weight of the automatic-metric component.
    pub nlp: f64,
    /// Weight of the judge component.
    pub llm: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { nlp: 0.6, llm: 0.4 }
    }
}

impl FusionWeights {
    /// Create custom weights.
    pub fn new(nlp: f64, llm: f64) -> Self {
        Self { nlp, llm }
    }

    /// Fuse automatic metrics with a judge mean score (1-5 scale) into one
    /// overall score.
    ///
    /// The automatic component is the mean of BLEU, METEOR, and ROUGE-L F1
    /// (each already in `[0, 1]`); the judge component is the mean criterion
    /// score normalized from its 1-5 scale to `[0, 1]`.
    ///
    /// # Example
    ///
    /// ```
    /// use sensemaking_eval::{AutomaticMetrics, FusionWeights};
    ///
    /// let metrics = AutomaticMetrics {
    ///     bleu: 0.8,
    ///     meteor: 0.6,
    ///     rouge_l_f1: 0.4,
    ///     ..AutomaticMetrics::default()
    /// };
    /// let overall = FusionWeights::default().fuse(&metrics, 4.0);
    /// assert!((overall - 0.68).abs() < 1e-9);
    /// ```
    pub fn fuse(&self, metrics: &AutomaticMetrics, judge_mean: f64) -> f64 {
        let nlp_component = (metrics.bleu + metrics.meteor + metrics.rouge_l_f1) / 3.0;
        let llm_component = judge_mean / 5.0;
        self.nlp * nlp_component + self.llm * llm_component
    }
}

/// One answer's evaluation result.
///
/// Holds the extracted [`ScoreSet`], the automatic metrics where a reference
/// answer existed, the fused `overall_score`, and the raw judgment text. The
/// raw text is kept for audit and debugging only; nothing downstream
/// re-parses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEvaluation {
    /// Identifier of the evaluated question.
    pub question_id: String,

    /// Name of the answer-generation method.
    pub method: String,

    /// Extracted per-criterion scores (empty when the item errored).
    pub scores: ScoreSet,

    /// Automatic metrics, present only in ground-truth mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<AutomaticMetrics>,

    /// Fused overall score.
    pub overall_score: f64,

    /// Raw judgment text, kept for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment: Option<String>,

    /// Error message when the item failed to evaluate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemEvaluation {
    /// Create a qualitative-mode result: the overall score is the unweighted
    /// mean of the rubric scores, on the 1-5 scale.
    pub fn qualitative(
        question_id: impl Into<String>,
        method: impl Into<String>,
        scores: ScoreSet,
        judgment: impl Into<String>,
    ) -> Self {
        let overall_score = scores.mean();
        Self {
            question_id: question_id.into(),
            method: method.into(),
            scores,
            metrics: None,
            overall_score,
            judgment: Some(judgment.into()),
            error: None,
        }
    }

    /// Create a ground-truth-mode result: the overall score fuses the
    /// automatic metrics with the judge mean per `weights`.
    pub fn ground_truth(
        question_id: impl Into<String>,
        method: impl Into<String>,
        scores: ScoreSet,
        metrics: AutomaticMetrics,
        judgment: impl Into<String>,
        weights: FusionWeights,
    ) -> Self {
        let overall_score = weights.fuse(&metrics, scores.mean());
        Self {
            question_id: question_id.into(),
            method: method.into(),
            scores,
            metrics: Some(metrics),
            overall_score,
            judgment: Some(judgment.into()),
            error: None,
        }
    }

    /// Create an error-marked result. Excluded from all aggregation.
    pub fn failure(
        question_id: impl Into<String>,
        method: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            method: method.into(),
            scores: ScoreSet::new(),
            metrics: None,
            overall_score: 0.0,
            judgment: None,
            error: Some(error.into()),
        }
    }

    /// Whether this item evaluated successfully.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Categorical outcome of one matched question pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseOutcome {
    /// Identifier of the compared question.
    pub question_id: String,

    /// Per-criterion verdicts; covers the full comparison criterion set.
    pub labels: BTreeMap<String, ComparisonLabel>,

    /// Raw comparison text, kept for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment: Option<String>,

    /// Error message when the comparison failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PairwiseOutcome {
    /// Create a successful comparison outcome.
    pub fn success(
        question_id: impl Into<String>,
        labels: BTreeMap<String, ComparisonLabel>,
        judgment: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            labels,
            judgment: Some(judgment.into()),
            error: None,
        }
    }

    /// Create an error-marked outcome. Excluded from tallies.
    pub fn failure(question_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            labels: BTreeMap::new(),
            judgment: None,
            error: Some(error.into()),
        }
    }

    /// Whether this comparison completed successfully.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
