use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the dataset, runner and export layers
#[derive(Error, Debug)]
pub enum VignetteError {
    /// The file exists but does not have the expected JSON structure
    #[error("Data format error in '{path}': {source}")]
    DataFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A vignette lacks a field needed to build its prompt or result
    #[error("Case {case_id} is missing field '{field}'")]
    MissingField { case_id: String, field: &'static str },

    #[error("Model returned no text content")]
    EmptyResponse,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, VignetteError>;
