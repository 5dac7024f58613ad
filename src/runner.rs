use crate::client::ReasoningClient;
use crate::models::{BatchReport, EvaluationResult, SkippedCase, Vignette};
use crate::prompt::format_prompt;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Runs every vignette through the reasoning client, one call at a time
pub struct Runner<C> {
    client: C,
    inter_call_delay: Duration,
}

impl<C: ReasoningClient> Runner<C> {
    pub fn new(client: C, inter_call_delay: Duration) -> Self {
        Self {
            client,
            inter_call_delay,
        }
    }

    /// Process the batch in order. A failing vignette is logged and recorded
    /// as skipped; it never aborts the batch.
    pub async fn run(&mut self, vignettes: &[Vignette]) -> BatchReport {
        let mut report = BatchReport::default();
        let total = vignettes.len();

        for (index, vignette) in vignettes.iter().enumerate() {
            let case_id = vignette.case_label();
            info!(case_id, "Processing vignette {}/{}", index + 1, total);

            let is_last = index + 1 == total;
            match self.evaluate_vignette(vignette, is_last).await {
                Ok(result) => {
                    debug!(case_id, "Successfully processed");
                    report.results.push(result);
                }
                Err(err) => {
                    let reason = format!("{:#}", err);
                    warn!(case_id, error = %reason, "Skipping vignette");
                    report.skipped.push(SkippedCase {
                        case_id: case_id.to_string(),
                        reason,
                    });
                }
            }
        }

        report
    }

    /// Format, call, and pair one vignette with its reply. Every call made,
    /// failed or not, is followed by the fixed delay unless it was the last.
    async fn evaluate_vignette(
        &mut self,
        vignette: &Vignette,
        is_last: bool,
    ) -> Result<EvaluationResult> {
        let prompt = format_prompt(vignette)?;
        // Ground-truth fields are checked before spending an API call
        EvaluationResult::from_vignette(vignette, String::new())?;

        let response = self.client.complete(&prompt).await;
        if !is_last {
            self.pause().await;
        }

        let response = response
            .with_context(|| format!("API call failed for case {}", vignette.case_label()))?;

        Ok(EvaluationResult::from_vignette(vignette, response)?)
    }

    async fn pause(&self) {
        if !self.inter_call_delay.is_zero() {
            debug!(delay_ms = self.inter_call_delay.as_millis() as u64, "Pausing before next call");
            sleep(self.inter_call_delay).await;
        }
    }
}

/// Write results as one JSON array, replacing any existing file
pub fn store_results(results: &[EvaluationResult], path: &Path) -> Result<()> {
    let json_content = serialize_results(results)?;
    ensure_directory_exists(path)?;
    std::fs::write(path, json_content)
        .with_context(|| format!("Failed to write results to: {}", path.display()))?;

    info!(path = %path.display(), count = results.len(), "Results stored");
    Ok(())
}

/// Serialize with four-space indentation
fn serialize_results(results: &[EvaluationResult]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    results
        .serialize(&mut serializer)
        .context("Failed to serialize results to JSON")?;
    Ok(buffer)
}

fn ensure_directory_exists(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
