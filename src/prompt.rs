use crate::error::Result;
use crate::models::Vignette;

/// System instruction sent with every vignette. It fixes the reply shape to
/// three labeled lines so later passes can find the answer and confidence.
pub const SYSTEM_PROMPT: &str = "You are a medical reasoning assistant. Answer the following multiple-choice clinical question below by selecting the single best answer (A, B, C, D, etc.).
First, provide a short explanation of your clinical reasoning (3–6 sentences).
Then select the single best answer choice.
Then provide your confidence (0–100%).
Format:
Reasoning: <your step-by-step explanation>
Answer: <letter>
Confidence: <0–100%>
Do not introduce clinical details not present in the question.
Question:";

/// Render a vignette as the user message: the question, then an `Options:`
/// block with one `<letter>. <text>` line per option in letter order.
pub fn format_prompt(vignette: &Vignette) -> Result<String> {
    let question = vignette.require(&vignette.question, "question")?;
    let options = vignette.require(&vignette.options, "options")?;

    let mut formatted_options = String::from("\nOptions:\n");
    // BTreeMap iterates in key order, so letters come out sorted
    for (letter, text) in options {
        formatted_options.push_str(&format!("{}. {}\n", letter, text));
    }

    Ok(format!("\"{}{}\"", question, formatted_options))
}
