use crate::error::{Result, VignetteError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A multiple-choice clinical case as found in the input dataset.
///
/// Fields are optional so that a record with gaps still loads; the gap is
/// reported when the vignette is prepared for a call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vignette {
    pub case_id: Option<String>,
    pub question: Option<String>,
    /// Option letter to option text, kept sorted by letter
    pub options: Option<BTreeMap<String, String>>,
    pub answer: Option<String>,
    pub answer_idx: Option<i64>,
}

impl Vignette {
    /// Case id for log lines, even when the record has none
    pub fn case_label(&self) -> &str {
        self.case_id.as_deref().unwrap_or("<unknown>")
    }

    /// Borrow a field that must be present, naming it in the error otherwise
    pub fn require<'a, T>(&self, value: &'a Option<T>, field: &'static str) -> Result<&'a T> {
        value.as_ref().ok_or_else(|| VignetteError::MissingField {
            case_id: self.case_label().to_string(),
            field,
        })
    }
}

/// A vignette paired with the model's raw reply, as written by the runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub case_id: String,
    pub original_question: String,
    pub original_options: BTreeMap<String, String>,
    pub original_answer: String,
    pub original_answer_idx: i64,
    #[serde(alias = "claude_response")]
    pub model_response: String,
}

impl EvaluationResult {
    /// Build a result from a vignette, failing if any ground-truth field is missing
    pub fn from_vignette(vignette: &Vignette, model_response: String) -> Result<Self> {
        Ok(Self {
            case_id: vignette.require(&vignette.case_id, "case_id")?.clone(),
            original_question: vignette.require(&vignette.question, "question")?.clone(),
            original_options: vignette.require(&vignette.options, "options")?.clone(),
            original_answer: vignette.require(&vignette.answer, "answer")?.clone(),
            original_answer_idx: *vignette.require(&vignette.answer_idx, "answer_idx")?,
            model_response,
        })
    }
}

/// Converter input record: a runner result, optionally augmented with
/// self-evaluation output produced by a later pass.
///
/// Only the fields the grading sheet shows are read; anything else in the
/// record (options, answer index, parsed letter, confidence) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnnotatedResult {
    #[serde(deserialize_with = "value_as_text")]
    pub case_id: String,
    pub original_question: String,
    #[serde(deserialize_with = "value_as_text")]
    pub original_answer: String,
    #[serde(
        alias = "claude_response",
        alias = "initial_response",
        alias = "claude_initial_response"
    )]
    pub model_response: String,
    #[serde(alias = "claude_correct")]
    pub correct: Option<bool>,
    #[serde(alias = "claude_self_evaluation")]
    pub self_evaluation: Option<String>,
}

/// Accept any JSON scalar as cell text: strings verbatim, `null` as empty,
/// numbers and booleans in their JSON spelling
fn value_as_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

/// A vignette that was dropped from the batch, and why
#[derive(Debug, Clone, Serialize)]
pub struct SkippedCase {
    pub case_id: String,
    pub reason: String,
}

/// Outcome of one batch: surviving results in input order plus every skip
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<EvaluationResult>,
    pub skipped: Vec<SkippedCase>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.results.len() + self.skipped.len()
    }
}
