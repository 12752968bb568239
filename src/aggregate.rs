//! Reduction of per-item records into aggregate statistics.
//!
//! All functions here are pure: they recompute fully from the supplied
//! collection, exclude error-marked records from every mean and from the
//! denominator, and report zeros (never a panic or division error) for empty
//! or fully-errored input.

use crate::item::{ItemEvaluation, PairwiseOutcome};
use crate::rubric::{ComparisonLabel, RubricMode, DEFAULT_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean statistics over a collection of item evaluations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistics {
    /// Metric or criterion key to arithmetic mean over non-errored items.
    pub means: BTreeMap<String, f64>,

    /// Number of items included (errored items do not count).
    pub total_evaluated: usize,
}

impl AggregateStatistics {
    /// Look up a mean, defaulting to 0.0 for unknown keys.
    pub fn get(&self, key: &str) -> f64 {
        self.means.get(key).copied().unwrap_or(0.0)
    }
}

/// Win/tie tallies for one comparison criterion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairwiseTally {
    /// Outcomes where the first method won.
    pub method1_wins: usize,
    /// Outcomes where the second method won.
    pub method2_wins: usize,
    /// Tied or unparsable outcomes.
    pub ties: usize,
    /// `method1_wins / total`, 0.0 when no outcomes were tallied.
    pub method1_win_rate: f64,
    /// `method2_wins / total`, 0.0 when no outcomes were tallied.
    pub method2_win_rate: f64,
    /// `ties / total`, 0.0 when no outcomes were tallied.
    pub tie_rate: f64,
}

/// Aggregate qualitative rubric evaluations: one mean per criterion of the
/// mode plus the mean `overall_score`.
pub fn aggregate_rubric(items: &[ItemEvaluation], mode: RubricMode) -> AggregateStatistics {
    let mut stats = AggregateStatistics::default();
    for criterion in mode.criteria() {
        stats.means.insert(criterion.key.to_string(), 0.0);
    }
    stats.means.insert("overall_score".to_string(), 0.0);

    let included: Vec<&ItemEvaluation> = items.iter().filter(|i| i.is_success()).collect();
    if included.is_empty() {
        return stats;
    }
    let n = included.len() as f64;

    for criterion in mode.criteria() {
        let sum: f64 = included
            .iter()
            .map(|i| i.scores.get(criterion.key).unwrap_or(DEFAULT_SCORE))
            .sum();
        stats.means.insert(criterion.key.to_string(), sum / n);
    }
    let overall: f64 = included.iter().map(|i| i.overall_score).sum();
    stats.means.insert("overall_score".to_string(), overall / n);
    stats.total_evaluated = included.len();
    stats
}

/// Aggregate ground-truth evaluations: means of every automatic metric, the
/// exact-match rate, the mean judge score (1-5 scale), and the mean fused
/// overall score.
pub fn aggregate_ground_truth(items: &[ItemEvaluation]) -> AggregateStatistics {
    let mut stats = AggregateStatistics::default();
    for key in [
        "bleu_mean",
        "meteor_mean",
        "rouge_l_f1_mean",
        "rouge_1_f1_mean",
        "rouge_2_f1_mean",
        "semantic_similarity_mean",
        "exact_match_rate",
        "judge_score_mean",
        "overall_score_mean",
    ] {
        stats.means.insert(key.to_string(), 0.0);
    }

    let included: Vec<&ItemEvaluation> = items.iter().filter(|i| i.is_success()).collect();
    if included.is_empty() {
        return stats;
    }
    let n = included.len() as f64;

    let mut bleu = 0.0;
    let mut meteor = 0.0;
    let mut rouge_l = 0.0;
    let mut rouge_1 = 0.0;
    let mut rouge_2 = 0.0;
    let mut semantic = 0.0;
    let mut exact = 0usize;
    let mut judge = 0.0;
    let mut overall = 0.0;

    for item in &included {
        let metrics = item.metrics.clone().unwrap_or_default();
        bleu += metrics.bleu;
        meteor += metrics.meteor;
        rouge_l += metrics.rouge_l_f1;
        rouge_1 += metrics.rouge_1_f1;
        rouge_2 += metrics.rouge_2_f1;
        semantic += metrics.semantic_similarity;
        exact += usize::from(metrics.exact_match);
        judge += item.scores.mean();
        overall += item.overall_score;
    }

    stats.means.insert("bleu_mean".to_string(), bleu / n);
    stats.means.insert("meteor_mean".to_string(), meteor / n);
    stats.means.insert("rouge_l_f1_mean".to_string(), rouge_l / n);
    stats.means.insert("rouge_1_f1_mean".to_string(), rouge_1 / n);
    stats.means.insert("rouge_2_f1_mean".to_string(), rouge_2 / n);
    stats
        .means
        .insert("semantic_similarity_mean".to_string(), semantic / n);
    stats
        .means
        .insert("exact_match_rate".to_string(), exact as f64 / n);
    stats.means.insert("judge_score_mean".to_string(), judge / n);
    stats
        .means
        .insert("overall_score_mean".to_string(), overall / n);
    stats.total_evaluated = included.len();
    stats
}

/// Tally pairwise outcomes per comparison criterion.
///
/// Errored outcomes are excluded entirely; an outcome missing a criterion
/// counts as a tie for it. The returned map always covers the full
/// comparison criterion set, with zeroed tallies when nothing was counted.
pub fn tally_pairwise(outcomes: &[PairwiseOutcome]) -> BTreeMap<String, PairwiseTally> {
    let mut tallies = BTreeMap::new();
    let included: Vec<&PairwiseOutcome> = outcomes.iter().filter(|o| o.is_success()).collect();

    for criterion in RubricMode::Comparison.criteria() {
        let mut tally = PairwiseTally::default();
        for outcome in &included {
            match outcome
                .labels
                .get(criterion.key)
                .copied()
                .unwrap_or(ComparisonLabel::Tie)
            {
                ComparisonLabel::MethodA => tally.method1_wins += 1,
                ComparisonLabel::MethodB => tally.method2_wins += 1,
                ComparisonLabel::Tie => tally.ties += 1,
            }
        }
        let total = tally.method1_wins + tally.method2_wins + tally.ties;
        if total > 0 {
            tally.method1_win_rate = tally.method1_wins as f64 / total as f64;
            tally.method2_win_rate = tally.method2_wins as f64 / total as f64;
            tally.tie_rate = tally.ties as f64 / total as f64;
        }
        tallies.insert(criterion.key.to_string(), tally);
    }
    tallies
}
