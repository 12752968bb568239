//! The external judge seam and the prompts rendered for it.
//!
//! The judge is a capability object injected into the engine, never an
//! ambient singleton. It receives a rendered prompt and returns free text;
//! the engine assumes nothing about the response beyond the line-prefix
//! convention the prompts request, and scans it best-effort (see
//! [`crate::extract`]).

use crate::rubric::RubricMode;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors a judge can signal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JudgeError {
    /// Error from the underlying model provider.
    #[error("Judge provider error: {0}")]
    Provider(String),

    /// The judge call timed out (timeouts are the collaborator's policy,
    /// not the engine's).
    #[error("Judge request timed out after {0}ms")]
    Timeout(u64),

    /// The judge returned no content.
    #[error("No content in judge response")]
    NoContent,

    /// A [`ScriptedJudge`] had no response for the prompt.
    #[error("No scripted response matches the prompt: {0}")]
    Unscripted(String),
}

/// Boxed future returned by [`Judge::complete`].
pub type JudgeFuture<'a> = Pin<Box<dyn Future<Output = Result<String, JudgeError>> + Send + 'a>>;

/// A rendered request for the judge: the user prompt plus a system
/// instruction framing the judge's role.
#[derive(Debug, Clone)]
pub struct JudgeRequest {
    /// The rendered evaluation prompt.
    pub prompt: String,

    /// System instruction for the judge.
    pub system_instruction: String,
}

impl JudgeRequest {
    /// Create a request from a prompt and system instruction.
    pub fn new(prompt: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: system_instruction.into(),
        }
    }
}

/// External language-model judge.
///
/// Returns opaque free text to be scanned by the extraction layer. The trait
/// is object-safe so evaluators can hold `Arc<dyn Judge>` and tests can
/// substitute a [`ScriptedJudge`].
///
/// # Example
///
/// ```
/// use sensemaking_eval::{Judge, JudgeFuture, JudgeRequest};
///
/// struct AlwaysFour;
///
/// impl Judge for AlwaysFour {
///     fn name(&self) -> &str {
///         "always_four"
///     }
///
///     fn complete(&self, _request: JudgeRequest) -> JudgeFuture<'_> {
///         Box::pin(async { Ok("Correctness: 4 - canned".to_string()) })
///     }
/// }
/// ```
pub trait Judge: Send + Sync {
    /// The name of this judge (used in logs and reports).
    fn name(&self) -> &str;

    /// Produce a free-text judgment for the rendered request.
    fn complete(&self, request: JudgeRequest) -> JudgeFuture<'_>;
}

const ANSWER_RUBRIC_SYSTEM: &str = "You are an expert evaluator of analytical answers to \
sensemaking questions. Assess answer quality against the requested criteria and respond \
in exactly the requested line format.";

const ACTION_RUBRIC_SYSTEM: &str = "You are an expert evaluator of action recommendations. \
Compare the predicted answer against the ground truth with attention to procedural \
correctness and safety, and respond in exactly the requested line format.";

const COMPARISON_SYSTEM: &str = "You are an expert evaluator comparing two analytical \
answers to the same question. Judge each criterion independently and respond in exactly \
the requested line format.";

/// One `<Label>: <placeholder>` format line per criterion of the mode.
fn format_lines(mode: RubricMode, placeholder: &str) -> String {
    mode.criteria()
        .iter()
        .map(|c| format!("{}: {}", c.label, placeholder))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the qualitative answer-rubric request.
///
/// Asks for a 1-5 score per qualitative criterion in the
/// `<Label>: [score] - [explanation]` line format the extractor scans.
pub fn answer_rubric_request(question: &str, answer: &str, method: &str) -> JudgeRequest {
    let prompt = format!(
        "Evaluate this answer to a sensemaking question.\n\n\
         Question: {question}\n\
         Answer: {answer}\n\
         Method: {method}\n\n\
         Rate the answer on these criteria (1-5 scale):\n\n\
         1. COMPREHENSIVENESS: completeness within the implied context of the question.\n\
         2. HUMAN ENFRANCHISEMENT: provision of supporting source material or context.\n\
         3. DIVERSITY: provision of differing viewpoints or angles on the question.\n\
         4. FAITHFULNESS: factual accuracy and grounding in source material.\n\n\
         For each criterion provide a score (1-5) and a brief explanation.\n\n\
         Format your response as:\n{lines}",
        lines = format_lines(RubricMode::Answer, "[score] - [explanation]"),
    );
    JudgeRequest::new(prompt, ANSWER_RUBRIC_SYSTEM)
}

/// Render the ground-truth action-rubric request.
pub fn action_rubric_request(question: &str, predicted: &str, ground_truth: &str) -> JudgeRequest {
    let prompt = format!(
        "Evaluate this predicted answer against the ground truth.\n\n\
         Question: {question}\n\
         Ground Truth Answer: {ground_truth}\n\
         Predicted Answer: {predicted}\n\n\
         Rate the predicted answer on these criteria (1-5 scale):\n\n\
         1. CORRECTNESS: how factually correct is the predicted answer?\n\
         2. COMPLETENESS: does it include all necessary action steps?\n\
         3. PRACTICALITY: how practical and actionable is the suggested action?\n\
         4. SAFETY: does it maintain or improve safety standards?\n\
         5. CLARITY: how clear and understandable is the instruction?\n\n\
         For each criterion provide a score (1-5) and a brief explanation.\n\n\
         Format your response as:\n{lines}",
        lines = format_lines(RubricMode::Action, "[score] - [explanation]"),
    );
    JudgeRequest::new(prompt, ACTION_RUBRIC_SYSTEM)
}

/// Render the pairwise comparison request.
///
/// The first method's answer is presented as `A`, the second as `B`; the
/// extractor maps the judge's `A`/`B`/anything-else verdicts back to the
/// methods in that order.
pub fn comparison_request(
    question: &str,
    answer_a: &str,
    answer_b: &str,
    method_a: &str,
    method_b: &str,
) -> JudgeRequest {
    let prompt = format!(
        "Compare these two answers to the same question.\n\n\
         Question: {question}\n\n\
         Answer A ({method_a}): {answer_a}\n\n\
         Answer B ({method_b}): {answer_b}\n\n\
         Compare the answers on these criteria:\n\
         1. Which is more comprehensive?\n\
         2. Which provides better supporting evidence?\n\
         3. Which offers more diverse perspectives?\n\
         4. Which is more factually accurate?\n\n\
         For each criterion, indicate A, B, or Tie, then give an overall preference.\n\n\
         Format your response as:\n{lines}",
        lines = format_lines(RubricMode::Comparison, "[A/B/Tie] - [explanation]"),
    );
    JudgeRequest::new(prompt, COMPARISON_SYSTEM)
}

/// Deterministic judge for tests, demos, and offline replay of recorded
/// judgments.
///
/// Responses are registered as rules: a list of needles that must all appear
/// in the prompt, plus the canned response. Rules are tried in registration
/// order; the first rule whose needles all match wins. A fallback can be set
/// with [`otherwise`](Self::otherwise); without one, an unmatched prompt
/// yields [`JudgeError::Unscripted`].
///
/// # Example
///
/// ```
/// use sensemaking_eval::{Judge, JudgeRequest, ScriptedJudge};
///
/// # async fn example() {
/// let judge = ScriptedJudge::new()
///     .respond_when(["capital of France"], "Correctness: 5 - exact")
///     .otherwise("Correctness: 3");
///
/// let request = JudgeRequest::new("What is the capital of France?", "");
/// let text = judge.complete(request).await.unwrap();
/// assert!(text.starts_with("Correctness: 5"));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedJudge {
    rules: Vec<(Vec<String>, String)>,
    fallback: Option<String>,
}

impl ScriptedJudge {
    /// Create a judge with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule: respond with `response` when every needle appears in the
    /// prompt. Earlier rules take precedence.
    #[must_use]
    pub fn respond_when<I, S>(mut self, needles: I, response: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push((
            needles.into_iter().map(Into::into).collect(),
            response.into(),
        ));
        self
    }

    /// Set the response for prompts no rule matches.
    #[must_use]
    pub fn otherwise(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(response.into());
        self
    }
}

impl Judge for ScriptedJudge {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(&self, request: JudgeRequest) -> JudgeFuture<'_> {
        let result = self
            .rules
            .iter()
            .find(|(needles, _)| needles.iter().all(|n| request.prompt.contains(n)))
            .map(|(_, response)| response.clone())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| JudgeError::Unscripted(truncate(&request.prompt, 120)));
        Box::pin(async move { result })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_rubric_request_contains_format_lines() {
        let request = answer_rubric_request("Q?", "An answer", "baseline");
        assert!(request.prompt.contains("Question: Q?"));
        assert!(request.prompt.contains("Method: baseline"));
        assert!(request.prompt.contains("Comprehensiveness: [score] - [explanation]"));
        assert!(request.prompt.contains("Human Enfranchisement: [score] - [explanation]"));
        assert_eq!(request.system_instruction, ANSWER_RUBRIC_SYSTEM);
    }

    #[test]
    fn test_action_rubric_request_contains_ground_truth() {
        let request = action_rubric_request("Q?", "predicted", "the truth");
        assert!(request.prompt.contains("Ground Truth Answer: the truth"));
        assert!(request.prompt.contains("Predicted Answer: predicted"));
        assert!(request.prompt.contains("Safety: [score] - [explanation]"));
    }

    #[test]
    fn test_comparison_request_orders_answers() {
        let request = comparison_request("Q?", "first", "second", "vanilla", "graph");
        assert!(request.prompt.contains("Answer A (vanilla): first"));
        assert!(request.prompt.contains("Answer B (graph): second"));
        assert!(request.prompt.contains("Overall Preference: [A/B/Tie] - [explanation]"));
    }

    #[tokio::test]
    async fn test_scripted_judge_matches_all_needles() {
        let judge = ScriptedJudge::new()
            .respond_when(["alpha", "beta"], "both")
            .respond_when(["alpha"], "just alpha");

        let both = judge
            .complete(JudgeRequest::new("alpha and beta here", ""))
            .await
            .unwrap();
        assert_eq!(both, "both");

        let one = judge
            .complete(JudgeRequest::new("alpha only", ""))
            .await
            .unwrap();
        assert_eq!(one, "just alpha");
    }

    #[tokio::test]
    async fn test_scripted_judge_registration_order_wins() {
        let judge = ScriptedJudge::new()
            .respond_when(["alpha"], "first rule")
            .respond_when(["alpha"], "second rule");

        let text = judge
            .complete(JudgeRequest::new("alpha", ""))
            .await
            .unwrap();
        assert_eq!(text, "first rule");
    }

    #[tokio::test]
    async fn test_scripted_judge_fallback() {
        let judge = ScriptedJudge::new().otherwise("default");
        let text = judge
            .complete(JudgeRequest::new("anything", ""))
            .await
            .unwrap();
        assert_eq!(text, "default");
    }

    #[tokio::test]
    async fn test_scripted_judge_unmatched_errors() {
        let judge = ScriptedJudge::new().respond_when(["needle"], "response");
        let err = judge
            .complete(JudgeRequest::new("no match here", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, JudgeError::Unscripted(_)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789abc", 10), "0123456789...");
    }
}
