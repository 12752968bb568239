//! # Sensemaking Eval
//!
//! Evaluation aggregation and comparison engine for LLM-judged question
//! answering.
//!
//! ## Overview
//!
//! `sensemaking-eval` scores free-text answers from two competing
//! answer-generation methods and decides which method won:
//!
//! - **Extraction**: turns semi-structured judge text into per-criterion
//!   scores with a documented midpoint-default fallback
//! - **Fusion**: combines automatic text metrics and judge scores into one
//!   overall score per answer (60/40 by default)
//! - **Pairwise**: tallies categorical A/B/tie verdicts over matched
//!   question pairs
//! - **Aggregation**: reduces per-item records into mean statistics, robust
//!   to partial failures
//! - **Verdict**: resolves a winner with an explicit tie rule
//!
//! ## Architecture
//!
//! ```text
//! answers + questions
//!     ↓ (Judge, MetricProvider — injected collaborators)
//! raw judgment text + automatic metrics
//!     ↓ extract / fuse
//! ItemEvaluation / PairwiseOutcome
//!     ↓ aggregate
//! AggregateStatistics
//!     ↓ resolve
//! Verdict
//! ```
//!
//! The judge and the metric provider are capability objects passed into the
//! [`Evaluator`]; there are no ambient clients, so tests and offline replays
//! substitute deterministic fakes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensemaking_eval::{
//!     load_answers, load_questions, EvalConfig, Evaluator, LexicalMetrics, ScriptedJudge,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let questions = load_questions(Path::new("questions.json")).await?;
//! let vanilla = load_answers(Path::new("vanilla_answers.json")).await?;
//! let graph = load_answers(Path::new("graph_answers.json")).await?;
//!
//! // Any Judge implementation works here; ScriptedJudge replays canned text.
//! let judge = Arc::new(ScriptedJudge::new().otherwise("Correctness: 3"));
//! let config = EvalConfig::new().with_method_names("vanilla", "graph");
//! let evaluator = Evaluator::new(judge, Arc::new(LexicalMetrics), config);
//!
//! let comparison = evaluator
//!     .compare_ground_truth_methods(&vanilla, &graph, &questions)
//!     .await?;
//! comparison.print_summary();
//! comparison.write_json(Path::new("comparison.json"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure philosophy
//!
//! A criterion the judge did not score resolves locally to the 3.0 scale
//! midpoint. A judge or metric failure marks that one item as errored and the
//! batch continues; errored items never enter a mean. Only an empty input
//! surfaces as a top-level [`EvalError`].

pub mod aggregate;
pub mod dataset;
pub mod evaluator;
pub mod extract;
pub mod item;
pub mod judge;
pub mod metrics;
pub mod rubric;
pub mod verdict;

// Re-export public API
pub use aggregate::{
    aggregate_ground_truth, aggregate_rubric, tally_pairwise, AggregateStatistics, PairwiseTally,
};
pub use dataset::{
    load_answers, load_judgments, load_questions, AnswerRecord, DatasetError, JudgmentKind,
    QuestionRecord, RecordedJudgment,
};
pub use evaluator::{
    EvalConfig, EvalError, Evaluator, GroundTruthComparison, GroundTruthReport, MethodComparison,
};
pub use extract::{parse_comparison, parse_scores};
pub use item::{FusionWeights, ItemEvaluation, PairwiseOutcome};
pub use judge::{
    action_rubric_request, answer_rubric_request, comparison_request, Judge, JudgeError,
    JudgeFuture, JudgeRequest, ScriptedJudge,
};
pub use metrics::{AutomaticMetrics, LexicalMetrics, MetricProvider, MetricsError};
pub use rubric::{ComparisonLabel, Criterion, RubricMode, ScoreSet, DEFAULT_SCORE};
pub use verdict::{
    compare_statistics, resolve_from_tallies, resolve_winner, MetricComparison, Verdict, Winner,
    COMPARED_METRICS,
};
