use crate::dataset::load_annotated_results;
use crate::error::Result;
use crate::models::AnnotatedResult;
use crate::selfeval::SelfEvalScores;
use clap::ValueEnum;
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Workbook};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Longest text Excel accepts in one cell, in characters
pub const MAX_XLSX_CELL_CHARS: usize = 32_767;

/// Header row of the grading sheet, in column order
pub const COLUMNS: [&str; 20] = [
    "Case ID (This matches to the IDs in .json dataset)",
    "Model",
    "Prompt Type",
    "Vignette",
    "Text Output (Model Response)",
    "Correct Diagnosis",
    "Correct Diagnosis? (Y/N)",
    "Plausibility (0/0.5/1) Human Evaluation",
    "Model Self-Score",
    "Faithfulness (0/0.5/1) Human Evaluation",
    "Model Self-Score.1",
    "Calibration (0/0.5/1) Human Evaluation",
    "Model Self-Score.2",
    "Harmfulness (0/0.5/1) Human Evaluation",
    "Model Self-Score.3",
    "Accuracy Score",
    "Reasoning Quality (1–5)",
    "Incorrect Reasoning Type (if any)",
    "Hallucinations? (Y/N)",
    "Notes/Comments",
];

/// Spreadsheet file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SheetFormat {
    Xlsx,
    Csv,
}

impl SheetFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" => Some(SheetFormat::Xlsx),
            "csv" => Some(SheetFormat::Csv),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Csv => "csv",
        }
    }
}

/// Values written into the constant columns
#[derive(Debug, Clone)]
pub struct RowLabels {
    pub model: String,
    pub prompt_type: String,
}

impl Default for RowLabels {
    fn default() -> Self {
        Self {
            model: "Claude".to_string(),
            prompt_type: "initial".to_string(),
        }
    }
}

/// Build the grading row for one record. Human-evaluation cells stay empty.
pub fn build_row(record: &AnnotatedResult, labels: &RowLabels) -> Vec<String> {
    let scores = SelfEvalScores::parse(record.self_evaluation.as_deref().unwrap_or_default());
    let correct = if record.correct.unwrap_or(false) { "Yes" } else { "No" };

    vec![
        record.case_id.clone(),
        labels.model.clone(),
        labels.prompt_type.clone(),
        record.original_question.clone(),
        record.model_response.clone(),
        record.original_answer.clone(),
        correct.to_string(),
        String::new(),
        scores.plausibility,
        String::new(),
        scores.faithfulness,
        String::new(),
        scores.calibration,
        String::new(),
        scores.harmfulness,
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
    ]
}

/// One row per record, same order
pub fn build_rows(records: &[AnnotatedResult], labels: &RowLabels) -> Vec<Vec<String>> {
    records.iter().map(|record| build_row(record, labels)).collect()
}

/// `<dir>/<stem>_output.<ext>` next to the input file
pub fn default_output_path(input: &Path, format: SheetFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}_output.{}", stem, format.extension()))
}

/// Write header plus rows, replacing any existing file
pub fn write_sheet(rows: &[Vec<String>], path: &Path, format: SheetFormat) -> Result<()> {
    match format {
        SheetFormat::Xlsx => write_xlsx(rows, path),
        SheetFormat::Csv => write_csv(rows, path),
    }
}

fn write_xlsx(rows: &[Vec<String>], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    // Fixed metadata so identical input gives an identical file
    let properties =
        DocProperties::new().set_creation_datetime(&ExcelDateTime::from_ymd(2000, 1, 1)?);
    workbook.set_properties(&properties);

    let worksheet = workbook.add_worksheet();
    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for (row_index, row) in rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let text = fit_xlsx_cell(cell);
            if let Cow::Owned(_) = text {
                warn!(
                    case_id = row.first().map(String::as_str).unwrap_or_default(),
                    column = COLUMNS[col],
                    "Cell truncated to {} characters",
                    MAX_XLSX_CELL_CHARS
                );
            }
            worksheet.write_string(row_index as u32 + 1, col as u16, text)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Cut text down to what an xlsx cell can hold
fn fit_xlsx_cell(cell: &str) -> Cow<'_, str> {
    match cell.char_indices().nth(MAX_XLSX_CELL_CHARS) {
        Some((byte_index, _)) => Cow::Owned(cell[..byte_index].to_string()),
        None => Cow::Borrowed(cell),
    }
}

fn write_csv(rows: &[Vec<String>], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Convert a runner output file into a grading sheet and return where it was written.
///
/// The format is taken from `format`, else from the output extension, else xlsx.
pub fn convert_file(
    input: &Path,
    output: Option<&Path>,
    format: Option<SheetFormat>,
    labels: &RowLabels,
) -> Result<PathBuf> {
    let format = format
        .or_else(|| output.and_then(SheetFormat::from_path))
        .unwrap_or(SheetFormat::Xlsx);
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(input, format),
    };

    let records = load_annotated_results(input)?;
    let rows = build_rows(&records, labels);
    write_sheet(&rows, &output, format)?;

    info!(path = %output.display(), rows = rows.len(), "Spreadsheet written");
    Ok(output)
}
