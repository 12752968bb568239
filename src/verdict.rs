//! Winner resolution from aggregate statistics or pairwise tallies.

use crate::aggregate::{AggregateStatistics, PairwiseTally};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed metric list used to resolve a ground-truth comparison winner.
///
/// Other aggregate metrics are still reported per-metric, but only these
/// contribute to the verdict's win counts.
pub const COMPARED_METRICS: &[&str] = &[
    "bleu_mean",
    "meteor_mean",
    "rouge_l_f1_mean",
    "exact_match_rate",
    "judge_score_mean",
];

/// The overall winner of a method comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Method1,
    Method2,
    Tie,
}

/// One metric's head-to-head result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    /// Metric key from the aggregate statistics.
    pub metric: String,
    /// First method's aggregate value.
    pub method1_score: f64,
    /// Second method's aggregate value.
    pub method2_score: f64,
    /// Strictly greater wins; exact equality is a tie.
    pub winner: Winner,
    /// Absolute difference between the values.
    pub difference: f64,
}

/// Final decision over a method comparison.
///
/// Win rates use only decided metrics in the denominator
/// (`method_wins / (method1_wins + method2_wins)`, 0 when no metric was
/// decided). Ties are excluded, so equal nonzero win counts produce a `Tie`
/// verdict with nonzero win rates; this mirrors the tallying the results are
/// compared against and is intentional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Method with strictly more per-metric wins, or `Tie` on equal counts.
    pub overall_winner: Winner,
    /// Metrics the first method won.
    pub method1_wins: usize,
    /// Metrics the second method won.
    pub method2_wins: usize,
    /// `method1_wins / (method1_wins + method2_wins)`, 0.0 when undecided.
    pub method1_win_rate: f64,
    /// `method2_wins / (method1_wins + method2_wins)`, 0.0 when undecided.
    pub method2_win_rate: f64,
    /// Number of metrics considered.
    pub metrics_compared: usize,
}

/// Compare two methods' aggregate statistics metric by metric.
///
/// Covers the union of both key sets in deterministic order; a key missing
/// from one side compares as 0.0.
pub fn compare_statistics(
    method1: &AggregateStatistics,
    method2: &AggregateStatistics,
) -> Vec<MetricComparison> {
    let mut keys: Vec<&String> = method1.means.keys().collect();
    for key in method2.means.keys() {
        if !method1.means.contains_key(key) {
            keys.push(key);
        }
    }
    keys.sort();

    keys.into_iter()
        .map(|key| {
            let method1_score = method1.get(key);
            let method2_score = method2.get(key);
            let winner = if method1_score > method2_score {
                Winner::Method1
            } else if method2_score > method1_score {
                Winner::Method2
            } else {
                Winner::Tie
            };
            MetricComparison {
                metric: key.clone(),
                method1_score,
                method2_score,
                winner,
                difference: (method1_score - method2_score).abs(),
            }
        })
        .collect()
}

/// Resolve the overall winner from per-metric comparisons, counting only the
/// metrics named in `compared`.
pub fn resolve_winner(comparisons: &[MetricComparison], compared: &[&str]) -> Verdict {
    let considered: Vec<&MetricComparison> = comparisons
        .iter()
        .filter(|c| compared.contains(&c.metric.as_str()))
        .collect();

    let method1_wins = considered
        .iter()
        .filter(|c| c.winner == Winner::Method1)
        .count();
    let method2_wins = considered
        .iter()
        .filter(|c| c.winner == Winner::Method2)
        .count();

    build_verdict(method1_wins, method2_wins, considered.len())
}

/// Resolve an overall winner from pairwise tallies: each criterion whose
/// tally favors one method counts as a metric win for it.
pub fn resolve_from_tallies(tallies: &BTreeMap<String, PairwiseTally>) -> Verdict {
    let mut method1_wins = 0;
    let mut method2_wins = 0;
    for tally in tallies.values() {
        if tally.method1_wins > tally.method2_wins {
            method1_wins += 1;
        } else if tally.method2_wins > tally.method1_wins {
            method2_wins += 1;
        }
    }
    build_verdict(method1_wins, method2_wins, tallies.len())
}

fn build_verdict(method1_wins: usize, method2_wins: usize, metrics_compared: usize) -> Verdict {
    let overall_winner = if method1_wins > method2_wins {
        Winner::Method1
    } else if method2_wins > method1_wins {
        Winner::Method2
    } else {
        Winner::Tie
    };

    let decided = method1_wins + method2_wins;
    let (method1_win_rate, method2_win_rate) = if decided > 0 {
        (
            method1_wins as f64 / decided as f64,
            method2_wins as f64 / decided as f64,
        )
    } else {
        (0.0, 0.0)
    };

    Verdict {
        overall_winner,
        method1_wins,
        method2_wins,
        method1_win_rate,
        method2_win_rate,
        metrics_compared,
    }
}
