use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static RE_PLAUSIBILITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Plausibility:\s*([\d.]+)").unwrap());
static RE_FAITHFULNESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Faithfulness:\s*([\d.]+)").unwrap());
static RE_CALIBRATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Calibration:\s*([\d.]+)").unwrap());
static RE_HARMFULNESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Harmfulness|Safety):\s*([\d.]+)").unwrap());

/// Scores a model gave its own earlier answer, as the raw matched text.
/// A score that could not be found is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelfEvalScores {
    pub plausibility: String,
    pub faithfulness: String,
    pub calibration: String,
    pub harmfulness: String,
}

impl SelfEvalScores {
    /// Pull the first value after each label out of free-form text.
    /// Best effort: never fails, unmatched labels stay empty.
    pub fn parse(text: &str) -> Self {
        Self {
            plausibility: first_capture(&RE_PLAUSIBILITY, text),
            faithfulness: first_capture(&RE_FAITHFULNESS, text),
            calibration: first_capture(&RE_CALIBRATION, text),
            harmfulness: first_capture(&RE_HARMFULNESS, text),
        }
    }
}

fn first_capture(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
