//! The evaluation engine: batch flows, comparison assembly, and reports.
//!
//! The [`Evaluator`] drives every judge and metric call. Processing is
//! strictly sequential: one item at a time, with the awaited collaborator
//! calls as the only suspension points. A failure evaluating one item is
//! recorded on that item and never aborts the batch; only an empty input
//! surfaces as a top-level [`EvalError`] so callers can branch on it.

use crate::aggregate::{
    aggregate_ground_truth, aggregate_rubric, tally_pairwise, AggregateStatistics, PairwiseTally,
};
use crate::dataset::{AnswerRecord, DatasetError, QuestionRecord};
use crate::extract::{parse_comparison, parse_scores};
use crate::item::{FusionWeights, ItemEvaluation, PairwiseOutcome};
use crate::judge::{action_rubric_request, answer_rubric_request, comparison_request, Judge};
use crate::metrics::{AutomaticMetrics, MetricProvider};
use crate::rubric::RubricMode;
use crate::verdict::{
    compare_statistics, resolve_from_tallies, resolve_winner, MetricComparison, Verdict,
    COMPARED_METRICS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur at the evaluation-run level.
///
/// Per-item failures are not errors here; they are recorded on the item
/// records and excluded from aggregation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvalError {
    /// Failed to load a data file.
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// There was nothing to evaluate.
    #[error("No items to evaluate: {0}")]
    EmptyInput(String),
}

/// Configuration for the evaluation engine.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct EvalConfig {
    /// Maximum number of question pairs sent to the judge per comparison run
    /// (default: 5). This is cost control, not a semantic limit; raise it to
    /// `usize::MAX` to compare every matched pair.
    pub max_pairs: usize,

    /// Weights for fusing automatic metrics with judge scores.
    pub fusion: FusionWeights,

    /// Display name of the first method (default: `method1`).
    pub method1_name: String,

    /// Display name of the second method (default: `method2`).
    pub method2_name: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_pairs: 5,
            fusion: FusionWeights::default(),
            method1_name: "method1".to_string(),
            method2_name: "method2".to_string(),
        }
    }
}

impl EvalConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pairwise comparison cap.
    #[must_use]
    pub fn with_max_pairs(mut self, max_pairs: usize) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    /// Set the fusion weights.
    #[must_use]
    pub fn with_fusion(mut self, fusion: FusionWeights) -> Self {
        self.fusion = fusion;
        self
    }

    /// Set the method display names.
    #[must_use]
    pub fn with_method_names(
        mut self,
        method1: impl Into<String>,
        method2: impl Into<String>,
    ) -> Self {
        self.method1_name = method1.into();
        self.method2_name = method2.into();
        self
    }
}

/// Evaluation engine over injected collaborators.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sensemaking_eval::{
///     AnswerRecord, EvalConfig, Evaluator, LexicalMetrics, QuestionRecord, ScriptedJudge,
/// };
///
/// # async fn example() {
/// let judge = ScriptedJudge::new().otherwise("Comprehensiveness: 4 - solid");
/// let evaluator = Evaluator::new(
///     Arc::new(judge),
///     Arc::new(LexicalMetrics),
///     EvalConfig::default(),
/// );
///
/// let questions = vec![QuestionRecord {
///     id: "q1".to_string(),
///     question: "What patterns recur across the reports?".to_string(),
///     category: None,
///     ground_truth: None,
/// }];
/// let answers = vec![AnswerRecord {
///     question_id: "q1".to_string(),
///     answer: "Several recurring failure modes...".to_string(),
///     method: None,
///     error: None,
/// }];
///
/// let items = evaluator.evaluate_answers(&answers, &questions, "baseline").await;
/// assert_eq!(items.len(), 1);
/// assert!(items[0].is_success());
/// # }
/// ```
pub struct Evaluator {
    judge: Arc<dyn Judge>,
    metrics: Arc<dyn MetricProvider>,
    config: EvalConfig,
}

impl Evaluator {
    /// Create an engine over the given collaborators.
    pub fn new(
        judge: Arc<dyn Judge>,
        metrics: Arc<dyn MetricProvider>,
        config: EvalConfig,
    ) -> Self {
        Self {
            judge,
            metrics,
            config,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate answers against the qualitative rubric, one judge call per
    /// answer.
    ///
    /// Answers flagged as errored upstream are skipped. A judge failure is
    /// recorded as an error-marked item and the batch continues.
    pub async fn evaluate_answers(
        &self,
        answers: &[AnswerRecord],
        questions: &[QuestionRecord],
        method: &str,
    ) -> Vec<ItemEvaluation> {
        let question_lookup: BTreeMap<&str, &QuestionRecord> =
            questions.iter().map(|q| (q.id.as_str(), q)).collect();

        let mut items = Vec::new();
        for answer in answers.iter().filter(|a| !a.is_errored()) {
            let question = question_lookup
                .get(answer.question_id.as_str())
                .map(|q| q.question.as_str())
                .unwrap_or("");

            let request = answer_rubric_request(question, &answer.answer, method);
            match self.judge.complete(request).await {
                Ok(text) => {
                    let scores = parse_scores(&text, RubricMode::Answer);
                    items.push(ItemEvaluation::qualitative(
                        &answer.question_id,
                        method,
                        scores,
                        text,
                    ));
                }
                Err(e) => {
                    log::warn!(
                        "Judge failed on question {} ({}): {}",
                        answer.question_id,
                        method,
                        e
                    );
                    items.push(ItemEvaluation::failure(
                        &answer.question_id,
                        method,
                        e.to_string(),
                    ));
                }
            }
        }
        items
    }

    /// Evaluate answers to ground-truth-bearing questions: automatic metrics
    /// plus one judge call per answer, fused per the configured weights.
    ///
    /// Returns [`EvalError::EmptyInput`] when no non-errored answer matches a
    /// question that carries a ground truth.
    pub async fn evaluate_ground_truth(
        &self,
        answers: &[AnswerRecord],
        questions: &[QuestionRecord],
        method: &str,
    ) -> Result<GroundTruthReport, EvalError> {
        let gt_questions: BTreeMap<&str, &QuestionRecord> = questions
            .iter()
            .filter(|q| q.has_ground_truth())
            .map(|q| (q.id.as_str(), q))
            .collect();

        let matched: Vec<&AnswerRecord> = answers
            .iter()
            .filter(|a| !a.is_errored() && gt_questions.contains_key(a.question_id.as_str()))
            .collect();

        if matched.is_empty() {
            return Err(EvalError::EmptyInput(format!(
                "no ground-truth questions matched the supplied answers for {method}"
            )));
        }

        log::info!(
            "Evaluating {} answers from {} against ground truth",
            matched.len(),
            method
        );

        let mut items = Vec::new();
        for answer in matched {
            let Some(question) = gt_questions.get(answer.question_id.as_str()) else {
                continue;
            };
            let Some(reference) = question.ground_truth.as_deref() else {
                continue;
            };

            let metrics = match self.metrics.compute(&answer.answer, reference) {
                Ok(m) => m,
                Err(e) => {
                    log::warn!(
                        "Metric provider {} failed on question {}: {}",
                        self.metrics.name(),
                        answer.question_id,
                        e
                    );
                    AutomaticMetrics::unavailable(e.to_string())
                }
            };

            let request = action_rubric_request(&question.question, &answer.answer, reference);
            match self.judge.complete(request).await {
                Ok(text) => {
                    let scores = parse_scores(&text, RubricMode::Action);
                    items.push(ItemEvaluation::ground_truth(
                        &answer.question_id,
                        method,
                        scores,
                        metrics,
                        text,
                        self.config.fusion,
                    ));
                }
                Err(e) => {
                    log::warn!(
                        "Judge failed on question {} ({}): {}",
                        answer.question_id,
                        method,
                        e
                    );
                    items.push(ItemEvaluation::failure(
                        &answer.question_id,
                        method,
                        e.to_string(),
                    ));
                }
            }
        }

        let aggregate = aggregate_ground_truth(&items);
        Ok(GroundTruthReport {
            method: method.to_string(),
            items,
            aggregate,
        })
    }

    /// Compare two methods on the qualitative rubric: both sets are evaluated
    /// individually, and matched pairs go through the pairwise judge path.
    pub async fn compare_methods(
        &self,
        method1_answers: &[AnswerRecord],
        method2_answers: &[AnswerRecord],
        questions: &[QuestionRecord],
    ) -> Result<MethodComparison, EvalError> {
        if questions.is_empty() {
            return Err(EvalError::EmptyInput("no questions supplied".to_string()));
        }

        log::info!(
            "Comparing {} vs {} answers",
            self.config.method1_name,
            self.config.method2_name
        );

        let method1_items = self
            .evaluate_answers(method1_answers, questions, &self.config.method1_name)
            .await;
        let method2_items = self
            .evaluate_answers(method2_answers, questions, &self.config.method2_name)
            .await;

        if method1_items.is_empty() && method2_items.is_empty() {
            return Err(EvalError::EmptyInput(
                "neither method produced answers to evaluate".to_string(),
            ));
        }

        let pairwise = self
            .compare_pairs(method1_answers, method2_answers, questions)
            .await;

        let method1_averages = aggregate_rubric(&method1_items, RubricMode::Answer);
        let method2_averages = aggregate_rubric(&method2_items, RubricMode::Answer);
        let tallies = tally_pairwise(&pairwise);
        let verdict = resolve_from_tallies(&tallies);

        Ok(MethodComparison {
            method1_name: self.config.method1_name.clone(),
            method2_name: self.config.method2_name.clone(),
            method1_items,
            method2_items,
            method1_averages,
            method2_averages,
            pairwise,
            tallies,
            verdict,
        })
    }

    /// Compare two methods on ground-truth questions and resolve the winner
    /// over the fixed metric list.
    pub async fn compare_ground_truth_methods(
        &self,
        method1_answers: &[AnswerRecord],
        method2_answers: &[AnswerRecord],
        questions: &[QuestionRecord],
    ) -> Result<GroundTruthComparison, EvalError> {
        let method1 = self
            .evaluate_ground_truth(method1_answers, questions, &self.config.method1_name)
            .await?;
        let method2 = self
            .evaluate_ground_truth(method2_answers, questions, &self.config.method2_name)
            .await?;

        let comparisons = compare_statistics(&method1.aggregate, &method2.aggregate);
        let verdict = resolve_winner(&comparisons, COMPARED_METRICS);

        Ok(GroundTruthComparison {
            method1_name: self.config.method1_name.clone(),
            method2_name: self.config.method2_name.clone(),
            method1,
            method2,
            comparisons,
            verdict,
        })
    }

    /// Run the pairwise judge path over matched question pairs, up to the
    /// configured cap.
    async fn compare_pairs(
        &self,
        method1_answers: &[AnswerRecord],
        method2_answers: &[AnswerRecord],
        questions: &[QuestionRecord],
    ) -> Vec<PairwiseOutcome> {
        let question_lookup: BTreeMap<&str, &QuestionRecord> =
            questions.iter().map(|q| (q.id.as_str(), q)).collect();
        let method1_lookup: BTreeMap<&str, &AnswerRecord> = method1_answers
            .iter()
            .filter(|a| !a.is_errored())
            .map(|a| (a.question_id.as_str(), a))
            .collect();
        let method2_lookup: BTreeMap<&str, &AnswerRecord> = method2_answers
            .iter()
            .filter(|a| !a.is_errored())
            .map(|a| (a.question_id.as_str(), a))
            .collect();

        let mut outcomes = Vec::new();
        let common_ids = method1_lookup
            .keys()
            .filter(|id| method2_lookup.contains_key(**id))
            .take(self.config.max_pairs);

        for id in common_ids {
            let question = question_lookup
                .get(id)
                .map(|q| q.question.as_str())
                .unwrap_or("");
            let answer1 = method1_lookup[id];
            let answer2 = method2_lookup[id];

            let request = comparison_request(
                question,
                &answer1.answer,
                &answer2.answer,
                &self.config.method1_name,
                &self.config.method2_name,
            );
            match self.judge.complete(request).await {
                Ok(text) => {
                    let labels = parse_comparison(&text);
                    outcomes.push(PairwiseOutcome::success(*id, labels, text));
                }
                Err(e) => {
                    log::warn!("Pairwise judge failed on question {}: {}", id, e);
                    outcomes.push(PairwiseOutcome::failure(*id, e.to_string()));
                }
            }
        }
        outcomes
    }
}

/// One method's ground-truth evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthReport {
    /// Name of the evaluated method.
    pub method: String,

    /// Per-item records, including error-marked failures.
    pub items: Vec<ItemEvaluation>,

    /// Statistics over the successful items.
    pub aggregate: AggregateStatistics,
}

impl GroundTruthReport {
    /// Item ids that failed to evaluate.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| !i.is_success())
            .map(|i| i.question_id.as_str())
            .collect()
    }

    /// A short human-readable summary of the run.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("=== Ground Truth Evaluation: {} ===", self.method));
        lines.push(format!(
            "Evaluated: {} (of {} items)",
            self.aggregate.total_evaluated,
            self.items.len()
        ));
        lines.push(format!(
            "BLEU {:.3} | METEOR {:.3} | ROUGE-L {:.3}",
            self.aggregate.get("bleu_mean"),
            self.aggregate.get("meteor_mean"),
            self.aggregate.get("rouge_l_f1_mean")
        ));
        lines.push(format!(
            "Exact match rate: {:.3}",
            self.aggregate.get("exact_match_rate")
        ));
        lines.push(format!(
            "Judge score: {:.3} | Overall: {:.3}",
            self.aggregate.get("judge_score_mean"),
            self.aggregate.get("overall_score_mean")
        ));
        let failed = self.failed_ids();
        if !failed.is_empty() {
            lines.push(format!("Failed items: {}", failed.join(", ")));
        }
        lines.join("\n")
    }

    /// Write the report to a pretty-JSON file.
    pub fn write_json(&self, path: &Path) -> Result<(), std::io::Error> {
        write_json_file(self, path)
    }
}

/// A qualitative comparison run between two methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodComparison {
    /// Display name of the first method.
    pub method1_name: String,
    /// Display name of the second method.
    pub method2_name: String,
    /// First method's per-item records.
    pub method1_items: Vec<ItemEvaluation>,
    /// Second method's per-item records.
    pub method2_items: Vec<ItemEvaluation>,
    /// First method's rubric averages.
    pub method1_averages: AggregateStatistics,
    /// Second method's rubric averages.
    pub method2_averages: AggregateStatistics,
    /// Pairwise outcomes for the matched question pairs.
    pub pairwise: Vec<PairwiseOutcome>,
    /// Win/tie tallies per comparison criterion.
    pub tallies: BTreeMap<String, PairwiseTally>,
    /// Overall decision derived from the tallies.
    pub verdict: Verdict,
}

impl MethodComparison {
    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!();
        println!("=== Method Comparison ===");
        println!("{} vs {}", self.method1_name, self.method2_name);
        println!();
        println!("Average rubric scores:");
        for (key, mean1) in &self.method1_averages.means {
            let mean2 = self.method2_averages.get(key);
            println!("  {key}: {mean1:.2} vs {mean2:.2}");
        }
        println!();
        println!("Pairwise results ({} pairs):", self.pairwise.len());
        for (criterion, tally) in &self.tallies {
            println!(
                "  {criterion}: {} {} / {} {} / {} ties",
                self.method1_name,
                tally.method1_wins,
                self.method2_name,
                tally.method2_wins,
                tally.ties
            );
        }
        println!();
        println!("Winner: {:?}", self.verdict.overall_winner);
    }

    /// Write the comparison to a pretty-JSON file.
    pub fn write_json(&self, path: &Path) -> Result<(), std::io::Error> {
        write_json_file(self, path)
    }
}

/// A ground-truth comparison run between two methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthComparison {
    /// Display name of the first method.
    pub method1_name: String,
    /// Display name of the second method.
    pub method2_name: String,
    /// First method's full report.
    pub method1: GroundTruthReport,
    /// Second method's full report.
    pub method2: GroundTruthReport,
    /// Head-to-head result for every aggregate metric.
    pub comparisons: Vec<MetricComparison>,
    /// Overall decision over the fixed compared-metric list.
    pub verdict: Verdict,
}

impl GroundTruthComparison {
    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!();
        println!("{}", self.method1.summary());
        println!();
        println!("{}", self.method2.summary());
        println!();
        println!("=== Verdict ===");
        println!(
            "{}: {} metric wins ({:.0}%)",
            self.method1_name,
            self.verdict.method1_wins,
            self.verdict.method1_win_rate * 100.0
        );
        println!(
            "{}: {} metric wins ({:.0}%)",
            self.method2_name,
            self.verdict.method2_wins,
            self.verdict.method2_win_rate * 100.0
        );
        println!("Overall winner: {:?}", self.verdict.overall_winner);
    }

    /// Write the comparison to a pretty-JSON file.
    pub fn write_json(&self, path: &Path) -> Result<(), std::io::Error> {
        write_json_file(self, path)
    }
}

fn write_json_file<T: Serialize>(value: &T, path: &Path) -> Result<(), std::io::Error> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}
