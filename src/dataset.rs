use crate::error::{Result, VignetteError};
use crate::models::{AnnotatedResult, Vignette};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load the vignette dataset, a JSON array of case records
pub fn load_vignettes(path: &Path) -> Result<Vec<Vignette>> {
    read_json_array(path)
}

/// Load runner output, with or without self-evaluation fields
pub fn load_annotated_results(path: &Path) -> Result<Vec<AnnotatedResult>> {
    read_json_array(path)
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|source| VignetteError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| VignetteError::DataFormat {
        path: path.to_path_buf(),
        source,
    })
}
