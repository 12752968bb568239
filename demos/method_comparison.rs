//! Method Comparison Demo
//!
//! Runs both comparison flows end to end with deterministic collaborators:
//! a scripted judge standing in for the LLM and a simple metric provider
//! standing in for an external metrics backend.
//!
//! Run with:
//!   cargo run --example method_comparison

use sensemaking_eval::{
    AnswerRecord, AutomaticMetrics, EvalConfig, Evaluator, MetricProvider, MetricsError,
    QuestionRecord, ScriptedJudge,
};
use std::sync::Arc;

/// Stand-in for an external metric backend: full marks on an exact match,
/// flat partial credit otherwise.
struct DemoMetrics;

impl MetricProvider for DemoMetrics {
    fn name(&self) -> &str {
        "demo"
    }

    fn compute(&self, predicted: &str, reference: &str) -> Result<AutomaticMetrics, MetricsError> {
        let exact = predicted.trim().eq_ignore_ascii_case(reference.trim());
        let value = if exact { 1.0 } else { 0.3 };
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

fn questions() -> Vec<QuestionRecord> {
    vec![
        QuestionRecord {
            id: "q1".to_string(),
            question: "What corrective action resolves the hydraulic fault?".to_string(),
            category: Some("action_specific".to_string()),
            ground_truth: Some("Replace the pressure switch".to_string()),
        },
        QuestionRecord {
            id: "q2".to_string(),
            question: "What corrective action resolves the sensor fault?".to_string(),
            category: Some("action_specific".to_string()),
            ground_truth: Some("Recalibrate the sensor".to_string()),
        },
    ]
}

fn answers(texts: [&str; 2]) -> Vec<AnswerRecord> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| AnswerRecord {
            question_id: format!("q{}", i + 1),
            answer: text.to_string(),
            method: None,
            error: None,
        })
        .collect()
}

/// Script one response per judge call the run will make.
///
/// Each rule keys on a phrase unique to one prompt family ("Answer A (" for
/// pairwise, "Ground Truth Answer:" for the action rubric, "sensemaking
/// question" for the qualitative rubric) plus enough of the item to pin the
/// question and answer. A real deployment implements `Judge` over a model
/// API instead.
fn scripted_judge() -> ScriptedJudge {
    ScriptedJudge::new()
        // Pairwise comparisons
        .respond_when(
            ["hydraulic", "Answer A ("],
            "Comprehensiveness: Tie - identical\nFactual Accuracy: Tie\nOverall Preference: Tie",
        )
        .respond_when(
            ["sensor fault", "Answer A ("],
            "Comprehensiveness: B - matches the fault\nSupporting Evidence: B\n\
             Diverse Perspectives: Tie\nFactual Accuracy: B\nOverall Preference: B - correct action",
        )
        // Action rubric (ground-truth mode)
        .respond_when(
            ["hydraulic", "Ground Truth Answer:", "Replace the pressure switch"],
            "Correctness: 5 - exact\nCompleteness: 5\nPracticality: 5\nSafety: 5\nClarity: 5",
        )
        .respond_when(
            ["sensor fault", "Ground Truth Answer:", "Check the wiring"],
            "Correctness: 2 - wrong subsystem\nCompleteness: 2\nPracticality: 3\nSafety: 3\nClarity: 4",
        )
        .respond_when(
            ["sensor fault", "Ground Truth Answer:", "Recalibrate the sensor"],
            "Correctness: 5 - exact\nCompleteness: 5\nPracticality: 5\nSafety: 5\nClarity: 5",
        )
        // Qualitative rubric
        .respond_when(
            ["sensemaking question", "Check the wiring"],
            "Comprehensiveness: 2 - misses the fault\nHuman Enfranchisement: 2\n\
             Diversity: 3\nFaithfulness: 2",
        )
        .respond_when(
            ["sensemaking question"],
            "Comprehensiveness: 4 - addresses the fault\nHuman Enfranchisement: 3\n\
             Diversity: 3\nFaithfulness: 5",
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let questions = questions();
    let baseline = answers(["Replace the pressure switch", "Check the wiring"]);
    let retrieval = answers(["Replace the pressure switch", "Recalibrate the sensor"]);

    let config = EvalConfig::new().with_method_names("baseline", "retrieval");
    let evaluator = Evaluator::new(Arc::new(scripted_judge()), Arc::new(DemoMetrics), config);

    println!("=== Qualitative comparison: baseline vs retrieval ===");
    let comparison = evaluator
        .compare_methods(&baseline, &retrieval, &questions)
        .await?;
    comparison.print_summary();

    println!();
    println!("=== Ground-truth comparison: baseline vs retrieval ===");
    let comparison = evaluator
        .compare_ground_truth_methods(&baseline, &retrieval, &questions)
        .await?;
    comparison.print_summary();

    println!();
    println!("Per-item overall scores ({}):", comparison.method1_name);
    for item in &comparison.method1.items {
        println!(
            "  {}: {:.3} (exact match: {})",
            item.question_id,
            item.overall_score,
            item.metrics.as_ref().map(|m| m.exact_match).unwrap_or(false)
        );
    }

    Ok(())
}
