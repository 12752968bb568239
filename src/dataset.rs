//! Loading questions, answers, and recorded judgments from JSON files.
//!
//! File formats are lenient: field aliases cover the common variants and
//! optional fields default rather than failing the whole file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors that can occur when loading data files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatasetError {
    /// Failed to read the file.
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the file contents.
    #[error("Failed to parse dataset: {0}")]
    Parse(String),
}

/// One question, optionally carrying a ground-truth reference answer.
///
/// # Example JSON
///
/// ```json
/// {
///   "id": "q7",
///   "question": "What corrective action resolves the reported fault?",
///   "category": "action_specific",
///   "ground_truth_answer": "Replace the pressure switch"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Unique question identifier.
    pub id: String,

    /// The question text.
    pub question: String,

    /// Optional question category (e.g. `action_specific`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Known-correct reference answer, when one exists.
    #[serde(
        default,
        alias = "ground_truth_answer",
        skip_serializing_if = "Option::is_none"
    )]
    pub ground_truth: Option<String>,
}

impl QuestionRecord {
    /// Whether this question carries a reference answer.
    pub fn has_ground_truth(&self) -> bool {
        self.ground_truth.is_some()
    }
}

/// One generated answer, tagged with the question it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Identifier of the answered question.
    pub question_id: String,

    /// The answer text.
    #[serde(default)]
    pub answer: String,

    /// Name of the generating method, when recorded in the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Upstream generation error; errored answers are skipped during
    /// evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerRecord {
    /// Whether the upstream generator failed to produce this answer.
    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }
}

/// The kind of judge call a recorded judgment transcribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentKind {
    /// A per-answer rubric judgment (qualitative or ground-truth mode).
    Rubric,
    /// A pairwise A/B comparison judgment.
    Comparison,
}

/// One recorded judge response, for offline replay through the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedJudgment {
    /// Identifier of the judged question.
    pub question_id: String,

    /// Which judge call this transcribes.
    pub kind: JudgmentKind,

    /// Method the judged answer came from; unset for comparisons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// The judge's free-text response.
    pub text: String,
}

/// Load a JSON array of questions.
pub async fn load_questions(path: &Path) -> Result<Vec<QuestionRecord>, DatasetError> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| DatasetError::Parse(e.to_string()))
}

/// Load a JSON array of answers.
pub async fn load_answers(path: &Path) -> Result<Vec<AnswerRecord>, DatasetError> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| DatasetError::Parse(e.to_string()))
}

/// Load a JSON array of recorded judgments.
pub async fn load_judgments(path: &Path) -> Result<Vec<RecordedJudgment>, DatasetError> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| DatasetError::Parse(e.to_string()))
}
