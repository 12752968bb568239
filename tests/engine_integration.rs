//! End-to-end engine tests with deterministic collaborators.
//!
//! These exercise the full extraction → fusion → aggregation → verdict
//! pipeline through the public API, the way a caller wires it up, with a
//! scripted judge and fake metric providers instead of live services.

use sensemaking_eval::{
    AnswerRecord, AutomaticMetrics, EvalConfig, EvalError, Evaluator, MetricProvider,
    MetricsError, QuestionRecord, ScriptedJudge, Winner,
};
use std::sync::Arc;

/// Reports perfect scores on the three fused metrics for exact matches,
/// zeros otherwise.
struct ExactOrNothing;

impl MetricProvider for ExactOrNothing {
    fn name(&self) -> &str {
        "exact_or_nothing"
    }

    fn compute(&self, predicted: &str, reference: &str) -> Result<AutomaticMetrics, MetricsError> {
        let exact = predicted.trim().eq_ignore_ascii_case(reference.trim());
        let value = if exact { 1.0 } else { 0.0 };
        Ok(AutomaticMetrics {
            bleu: value,
            meteor: value,
            rouge_l_f1: value,
            rouge_1_f1: value,
            rouge_2_f1: value,
            semantic_similarity: value,
            exact_match: exact,
            note: None,
        })
    }
}

/// Always unavailable, like a missing metrics backend.
struct BrokenMetrics;

impl MetricProvider for BrokenMetrics {
    fn name(&self) -> &str {
        "broken"
    }

    fn compute(&self, _: &str, _: &str) -> Result<AutomaticMetrics, MetricsError> {
        Err(MetricsError::Unavailable("backend not installed".to_string()))
    }
}

fn question(id: &str, text: &str, ground_truth: Option<&str>) -> QuestionRecord {
    QuestionRecord {
        id: id.to_string(),
        question: text.to_string(),
        category: ground_truth.map(|_| "action_specific".to_string()),
        ground_truth: ground_truth.map(str::to_string),
    }
}

fn answer(question_id: &str, text: &str) -> AnswerRecord {
    AnswerRecord {
        question_id: question_id.to_string(),
        answer: text.to_string(),
        method: None,
        error: None,
    }
}

const PERFECT_ACTION_JUDGMENT: &str = "\
Correctness: 5 - matches the ground truth exactly
Completeness: 5 - nothing missing
Practicality: 5 - directly actionable
Safety: 5 - standard procedure
Clarity: 5 - unambiguous";

#[tokio::test]
async fn exact_match_with_perfect_judge_fuses_to_one() {
    let judge = ScriptedJudge::new().otherwise(PERFECT_ACTION_JUDGMENT);
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(ExactOrNothing),
        EvalConfig::default(),
    );

    let questions = vec![question("q1", "Which action?", Some("Replace the filter"))];
    let answers = vec![answer("q1", "Replace the filter")];

    let report = evaluator
        .evaluate_ground_truth(&answers, &questions, "m")
        .await
        .unwrap();

    assert_eq!(report.items.len(), 1);
    let item = &report.items[0];
    assert!(item.is_success());
    assert!((item.overall_score - 1.0).abs() < 1e-9);
    assert!(item.metrics.as_ref().unwrap().exact_match);
    assert_eq!(report.aggregate.get("exact_match_rate"), 1.0);
    assert_eq!(report.aggregate.get("judge_score_mean"), 5.0);
}

#[tokio::test]
async fn ground_truth_comparison_resolves_winner() {
    // Method 2 answers both questions exactly; method 1 answers one.
    let judge = ScriptedJudge::new()
        .respond_when(["wrong thing entirely"], "Correctness: 1 - unrelated\nSafety: 2")
        .otherwise(PERFECT_ACTION_JUDGMENT);
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(ExactOrNothing),
        EvalConfig::new().with_method_names("sparse", "dense"),
    );

    let questions = vec![
        question("q1", "Which action first?", Some("Replace the filter")),
        question("q2", "Which action second?", Some("Drain the tank")),
    ];
    let method1 = vec![
        answer("q1", "Replace the filter"),
        answer("q2", "wrong thing entirely"),
    ];
    let method2 = vec![
        answer("q1", "Replace the filter"),
        answer("q2", "Drain the tank"),
    ];

    let comparison = evaluator
        .compare_ground_truth_methods(&method1, &method2, &questions)
        .await
        .unwrap();

    assert_eq!(comparison.verdict.overall_winner, Winner::Method2);
    assert_eq!(comparison.verdict.method1_wins, 0);
    assert!(comparison.verdict.method2_wins >= 4);
    assert!((comparison.verdict.method2_win_rate - 1.0).abs() < 1e-9);
    assert_eq!(comparison.method1.aggregate.get("exact_match_rate"), 0.5);
    assert_eq!(comparison.method2.aggregate.get("exact_match_rate"), 1.0);

    // The report carries a per-metric block for every aggregate key.
    assert!(comparison
        .comparisons
        .iter()
        .any(|c| c.metric == "overall_score_mean"));
}

#[tokio::test]
async fn identical_methods_tie_with_zero_win_counts() {
    let judge = ScriptedJudge::new().otherwise(PERFECT_ACTION_JUDGMENT);
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(ExactOrNothing),
        EvalConfig::default(),
    );

    let questions = vec![question("q1", "Which action?", Some("Replace the filter"))];
    let answers1 = vec![answer("q1", "Replace the filter")];
    let answers2 = vec![answer("q1", "Replace the filter")];

    let comparison = evaluator
        .compare_ground_truth_methods(&answers1, &answers2, &questions)
        .await
        .unwrap();

    assert_eq!(comparison.verdict.overall_winner, Winner::Tie);
    assert_eq!(comparison.verdict.method1_wins, 0);
    assert_eq!(comparison.verdict.method2_wins, 0);
    assert_eq!(comparison.verdict.method1_win_rate, 0.0);
}

#[tokio::test]
async fn judge_failure_is_isolated_and_excluded_from_means() {
    // Only q1 and q3 are scripted; q2's judge call fails.
    let judge = ScriptedJudge::new()
        .respond_when(["first"], PERFECT_ACTION_JUDGMENT)
        .respond_when(["third"], "Correctness: 1\nCompleteness: 1\nPracticality: 1\nSafety: 1\nClarity: 1");
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(ExactOrNothing),
        EvalConfig::default(),
    );

    let questions = vec![
        question("q1", "first question", Some("Replace the filter")),
        question("q2", "second question", Some("Drain the tank")),
        question("q3", "third question", Some("Bleed the line")),
    ];
    let answers = vec![
        answer("q1", "Replace the filter"),
        answer("q2", "Drain the tank"),
        answer("q3", "something else"),
    ];

    let report = evaluator
        .evaluate_ground_truth(&answers, &questions, "m")
        .await
        .unwrap();

    assert_eq!(report.items.len(), 3);
    assert_eq!(report.aggregate.total_evaluated, 2);
    assert_eq!(report.failed_ids(), vec!["q2"]);
    // judge mean over the two survivors: (5 + 1) / 2
    assert!((report.aggregate.get("judge_score_mean") - 3.0).abs() < 1e-9);
    // the failed run still yields a complete report
    assert!((report.aggregate.get("exact_match_rate") - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn metric_outage_degrades_to_zero_defaults_with_note() {
    let judge = ScriptedJudge::new().otherwise(PERFECT_ACTION_JUDGMENT);
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(BrokenMetrics),
        EvalConfig::default(),
    );

    let questions = vec![question("q1", "Which action?", Some("Replace the filter"))];
    let answers = vec![answer("q1", "Replace the filter")];

    let report = evaluator
        .evaluate_ground_truth(&answers, &questions, "m")
        .await
        .unwrap();

    let item = &report.items[0];
    assert!(item.is_success(), "a metric outage must not fail the item");
    let metrics = item.metrics.as_ref().unwrap();
    assert_eq!(metrics.bleu, 0.0);
    assert!(!metrics.exact_match);
    assert!(metrics.note.as_ref().unwrap().contains("backend not installed"));
    // Only the judge component survives: 0.6 * 0 + 0.4 * (5/5)
    assert!((item.overall_score - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn empty_input_is_a_branchable_error() {
    let judge = ScriptedJudge::new().otherwise(PERFECT_ACTION_JUDGMENT);
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(ExactOrNothing),
        EvalConfig::default(),
    );

    // Questions exist but none carries a ground truth.
    let questions = vec![question("q1", "Which action?", None)];
    let answers = vec![answer("q1", "Replace the filter")];

    let result = evaluator
        .evaluate_ground_truth(&answers, &questions, "m")
        .await;
    match result {
        Err(EvalError::EmptyInput(reason)) => {
            assert!(reason.contains("ground-truth"));
        }
        other => panic!("expected EmptyInput, got {other:?}"),
    }
}

#[tokio::test]
async fn qualitative_comparison_tallies_and_verdict() {
    let judge = ScriptedJudge::new()
        .respond_when(
            ["Answer A ("],
            "Comprehensiveness: A - deeper\nSupporting Evidence: A\n\
             Diverse Perspectives: Tie\nFactual Accuracy: B\nOverall Preference: A - on balance",
        )
        .respond_when(
            ["Method: strong"],
            "Comprehensiveness: 5\nHuman Enfranchisement: 4\nDiversity: 4\nFaithfulness: 5",
        )
        .respond_when(
            ["Method: weak"],
            "Comprehensiveness: 2\nHuman Enfranchisement: 2\nDiversity: 3\nFaithfulness: 2",
        );
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(ExactOrNothing),
        EvalConfig::new().with_method_names("strong", "weak"),
    );

    let questions = vec![question("q1", "What patterns recur?", None)];
    let answers1 = vec![answer("q1", "a long synthesis")];
    let answers2 = vec![answer("q1", "a short take")];

    let comparison = evaluator
        .compare_methods(&answers1, &answers2, &questions)
        .await
        .unwrap();

    assert!((comparison.method1_averages.get("comprehensiveness") - 5.0).abs() < 1e-9);
    assert!((comparison.method1_averages.get("overall_score") - 4.5).abs() < 1e-9);
    assert!((comparison.method2_averages.get("overall_score") - 2.25).abs() < 1e-9);

    assert_eq!(comparison.pairwise.len(), 1);
    assert_eq!(comparison.tallies["comprehensiveness"].method1_wins, 1);
    assert_eq!(comparison.tallies["factual_accuracy"].method2_wins, 1);
    assert_eq!(comparison.tallies["diverse_perspectives"].ties, 1);

    // 3 criteria favor method1, 1 favors method2, 1 tied.
    assert_eq!(comparison.verdict.overall_winner, Winner::Method1);
    assert_eq!(comparison.verdict.method1_wins, 3);
    assert_eq!(comparison.verdict.method2_wins, 1);
    assert!((comparison.verdict.method1_win_rate - 0.75).abs() < 1e-9);
}

#[tokio::test]
async fn comparison_report_serializes_with_verdict_block() {
    let judge = ScriptedJudge::new().otherwise(PERFECT_ACTION_JUDGMENT);
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(ExactOrNothing),
        EvalConfig::default(),
    );

    let questions = vec![question("q1", "Which action?", Some("Replace the filter"))];
    let answers = vec![answer("q1", "Replace the filter")];

    let comparison = evaluator
        .compare_ground_truth_methods(&answers, &answers, &questions)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comparison.json");
    comparison.write_json(&path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["verdict"]["overall_winner"], "tie");
    assert!(value["method1"]["items"].is_array());
    assert!(value["method1"]["aggregate"]["means"].is_object());
}
