//! Offline evaluation CLI.
//!
//! Replays recorded judge responses through the engine: loads questions, two
//! methods' answer files, and a judgment transcript, then runs the full
//! extraction → fusion → aggregation → verdict pipeline and reports the
//! result. No model API is contacted.

use clap::Parser;
use sensemaking_eval::{
    load_answers, load_judgments, load_questions, AnswerRecord, EvalConfig, Evaluator,
    JudgmentKind, LexicalMetrics, QuestionRecord, RecordedJudgment, ScriptedJudge,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Replay recorded judgments through the evaluation engine.
#[derive(Parser, Debug)]
#[command(name = "sensemaking-eval")]
#[command(about = "Compare two answer-generation methods from recorded judgments")]
#[command(version)]
struct Args {
    /// Path to the questions JSON file
    #[arg(long, short = 'q')]
    questions: PathBuf,

    /// Path to the first method's answers JSON file
    #[arg(long)]
    method1_answers: PathBuf,

    /// Path to the second method's answers JSON file
    #[arg(long)]
    method2_answers: PathBuf,

    /// Path to the recorded judgments JSON file
    #[arg(long, short = 'j')]
    judgments: PathBuf,

    /// Comparison mode: "compare" (qualitative rubric) or "ground-truth"
    #[arg(long, short = 'm', default_value = "compare")]
    mode: String,

    /// Display name of the first method
    #[arg(long, default_value = "method1")]
    method1_name: String,

    /// Display name of the second method
    #[arg(long, default_value = "method2")]
    method2_name: String,

    /// Maximum question pairs sent through the pairwise path
    #[arg(long, default_value = "5")]
    max_pairs: usize,

    /// Output format: table or json
    #[arg(long, short = 'o', default_value = "table")]
    output: String,

    /// Output file path (defaults to stdout)
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Validate CLI arguments.
    fn validate(&self) -> Result<(), String> {
        if !["table", "json"].contains(&self.output.as_str()) {
            return Err(format!(
                "Invalid output format '{}'. Use 'table' or 'json'.",
                self.output
            ));
        }
        if !["compare", "ground-truth"].contains(&self.mode.as_str()) {
            return Err(format!(
                "Invalid mode '{}'. Use 'compare' or 'ground-truth'.",
                self.mode
            ));
        }
        if self.max_pairs == 0 {
            return Err("max-pairs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Build EvalConfig from CLI arguments.
    fn eval_config(&self) -> EvalConfig {
        EvalConfig::new()
            .with_max_pairs(self.max_pairs)
            .with_method_names(&self.method1_name, &self.method2_name)
    }
}

/// Build a replay judge from recorded judgments.
///
/// Comparison rules are registered before rubric rules: a comparison prompt
/// contains both the question and each method's answer, so it would
/// otherwise satisfy a rubric rule's needles.
fn build_judge(
    judgments: &[RecordedJudgment],
    questions: &[QuestionRecord],
    args: &Args,
    method1_answers: &[AnswerRecord],
    method2_answers: &[AnswerRecord],
) -> ScriptedJudge {
    fn answer_text(answers: &[AnswerRecord], id: &str) -> Option<String> {
        answers
            .iter()
            .find(|a| a.question_id == id)
            .map(|a| a.answer.clone())
    }

    let question_text: BTreeMap<&str, &str> = questions
        .iter()
        .map(|q| (q.id.as_str(), q.question.as_str()))
        .collect();

    let mut judge = ScriptedJudge::new();
    for judgment in judgments
        .iter()
        .filter(|j| j.kind == JudgmentKind::Comparison)
    {
        let Some(question) = question_text.get(judgment.question_id.as_str()) else {
            log::warn!("Judgment for unknown question {}", judgment.question_id);
            continue;
        };
        judge = judge.respond_when(
            [question.to_string(), "Answer A (".to_string()],
            &judgment.text,
        );
    }
    for judgment in judgments.iter().filter(|j| j.kind == JudgmentKind::Rubric) {
        let Some(question) = question_text.get(judgment.question_id.as_str()) else {
            log::warn!("Judgment for unknown question {}", judgment.question_id);
            continue;
        };
        let answer = match judgment.method.as_deref() {
            Some(m) if m == args.method1_name => {
                answer_text(method1_answers, &judgment.question_id)
            }
            Some(m) if m == args.method2_name => {
                answer_text(method2_answers, &judgment.question_id)
            }
            other => {
                log::warn!(
                    "Rubric judgment for question {} names unknown method {:?}",
                    judgment.question_id,
                    other
                );
                None
            }
        };
        let Some(answer) = answer else { continue };
        judge = judge.respond_when([question.to_string(), answer], &judgment.text);
    }
    judge
}

/// Output a report in the requested format.
fn output_report<T: Serialize>(
    report: &T,
    print_table: impl Fn(),
    args: &Args,
) -> Result<(), String> {
    match args.output.as_str() {
        "table" => {
            print_table();
            if let Some(path) = &args.output_file {
                let json = serde_json::to_string_pretty(report)
                    .map_err(|e| format!("Failed to serialize results: {e}"))?;
                std::fs::write(path, json)
                    .map_err(|e| format!("Failed to write output file: {e}"))?;
                println!("\nDetailed results written to: {}", path.display());
            }
        }
        "json" => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|e| format!("Failed to serialize results: {e}"))?;
            if let Some(path) = &args.output_file {
                std::fs::write(path, &json)
                    .map_err(|e| format!("Failed to write output file: {e}"))?;
                eprintln!("Results written to: {}", path.display());
            } else {
                println!("{json}");
            }
        }
        _ => unreachable!(), // Already validated
    }
    Ok(())
}

async fn run(args: &Args) -> Result<(), String> {
    let questions = load_questions(&args.questions)
        .await
        .map_err(|e| format!("Failed to load questions: {e}"))?;
    let method1_answers = load_answers(&args.method1_answers)
        .await
        .map_err(|e| format!("Failed to load {} answers: {e}", args.method1_name))?;
    let method2_answers = load_answers(&args.method2_answers)
        .await
        .map_err(|e| format!("Failed to load {} answers: {e}", args.method2_name))?;
    let judgments = load_judgments(&args.judgments)
        .await
        .map_err(|e| format!("Failed to load judgments: {e}"))?;

    eprintln!("=== Sensemaking Evaluation (offline replay) ===");
    eprintln!("Questions: {}", questions.len());
    eprintln!(
        "Answers: {} ({}), {} ({})",
        method1_answers.len(),
        args.method1_name,
        method2_answers.len(),
        args.method2_name
    );
    eprintln!("Recorded judgments: {}", judgments.len());
    eprintln!();

    let judge = build_judge(
        &judgments,
        &questions,
        args,
        &method1_answers,
        &method2_answers,
    );
    let evaluator = Evaluator::new(
        Arc::new(judge),
        Arc::new(LexicalMetrics),
        args.eval_config(),
    );

    match args.mode.as_str() {
        "compare" => {
            let comparison = evaluator
                .compare_methods(&method1_answers, &method2_answers, &questions)
                .await
                .map_err(|e| format!("Evaluation failed: {e}"))?;
            output_report(&comparison, || comparison.print_summary(), args)
        }
        "ground-truth" => {
            let comparison = evaluator
                .compare_ground_truth_methods(&method1_answers, &method2_answers, &questions)
                .await
                .map_err(|e| format!("Evaluation failed: {e}"))?;
            output_report(&comparison, || comparison.print_summary(), args)
        }
        _ => unreachable!(), // Already validated
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = args.validate() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensemaking_eval::{Judge, JudgeRequest};

    fn test_args() -> Args {
        Args {
            questions: PathBuf::from("questions.json"),
            method1_answers: PathBuf::from("m1.json"),
            method2_answers: PathBuf::from("m2.json"),
            judgments: PathBuf::from("judgments.json"),
            mode: "compare".to_string(),
            method1_name: "vanilla".to_string(),
            method2_name: "graph".to_string(),
            max_pairs: 5,
            output: "table".to_string(),
            output_file: None,
            verbose: false,
        }
    }

    #[test]
    fn test_validate_valid_args() {
        assert!(test_args().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_output() {
        let mut args = test_args();
        args.output = "yaml".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_mode() {
        let mut args = test_args();
        args.mode = "tournament".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_zero_max_pairs() {
        let mut args = test_args();
        args.max_pairs = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_eval_config_from_args() {
        let config = test_args().eval_config();
        assert_eq!(config.max_pairs, 5);
        assert_eq!(config.method1_name, "vanilla");
        assert_eq!(config.method2_name, "graph");
    }

    #[tokio::test]
    async fn test_build_judge_routes_by_method_and_kind() {
        let args = test_args();
        let questions = vec![QuestionRecord {
            id: "q1".to_string(),
            question: "What recurring failures appear?".to_string(),
            category: None,
            ground_truth: None,
        }];
        let m1 = vec![AnswerRecord {
            question_id: "q1".to_string(),
            answer: "vanilla answer text".to_string(),
            method: None,
            error: None,
        }];
        let m2 = vec![AnswerRecord {
            question_id: "q1".to_string(),
            answer: "graph answer text".to_string(),
            method: None,
            error: None,
        }];
        let judgments = vec![
            RecordedJudgment {
                question_id: "q1".to_string(),
                kind: JudgmentKind::Rubric,
                method: Some("vanilla".to_string()),
                text: "Diversity: 2".to_string(),
            },
            RecordedJudgment {
                question_id: "q1".to_string(),
                kind: JudgmentKind::Rubric,
                method: Some("graph".to_string()),
                text: "Diversity: 5".to_string(),
            },
            RecordedJudgment {
                question_id: "q1".to_string(),
                kind: JudgmentKind::Comparison,
                method: None,
                text: "Overall Preference: B".to_string(),
            },
        ];

        let judge = build_judge(&judgments, &questions, &args, &m1, &m2);

        let rubric_prompt =
            "Question: What recurring failures appear?\nAnswer: vanilla answer text\nMethod: vanilla";
        let text = judge
            .complete(JudgeRequest::new(rubric_prompt, ""))
            .await
            .unwrap();
        assert_eq!(text, "Diversity: 2");

        let comparison_prompt = "Question: What recurring failures appear?\n\
             Answer A (vanilla): vanilla answer text\n\
             Answer B (graph): graph answer text";
        let text = judge
            .complete(JudgeRequest::new(comparison_prompt, ""))
            .await
            .unwrap();
        assert_eq!(text, "Overall Preference: B");
    }
}
