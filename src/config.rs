use crate::error::VignetteError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest pause allowed between two API calls, in seconds
pub const MIN_INTER_CALL_DELAY_SECS: f64 = 0.5;

/// Configuration for one vignette run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Path to the vignette dataset (JSON array)
    pub input_path: PathBuf,
    /// Where the evaluation results are written; overwritten if present
    pub output_path: PathBuf,
    /// OpenAI-compatible API endpoint
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Environment variable name containing the API key
    pub env_var_api_key: String,
    /// Model to query
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Minimum pause between the starts of consecutive API calls, in seconds
    #[serde(default = "default_inter_call_delay")]
    pub inter_call_delay_secs: f64,
    /// HTTP timeout for a single API call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Replaces the built-in system instruction when set
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_api_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f64 {
    1.0
}

fn default_max_tokens() -> u32 {
    20000
}

fn default_inter_call_delay() -> f64 {
    MIN_INTER_CALL_DELAY_SECS
}

fn default_request_timeout() -> u64 {
    120
}

impl RunConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RunConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line path overrides
    pub fn with_paths(mut self, input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        if let Some(input) = input {
            self.input_path = input;
        }
        if let Some(output) = output {
            self.output_path = output;
        }
        self
    }

    pub fn validate(&self) -> Result<(), VignetteError> {
        if !self.inter_call_delay_secs.is_finite()
            || self.inter_call_delay_secs < MIN_INTER_CALL_DELAY_SECS
        {
            return Err(VignetteError::InvalidConfig(format!(
                "inter_call_delay_secs must be a finite number of at least {}, got {}",
                MIN_INTER_CALL_DELAY_SECS, self.inter_call_delay_secs
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(VignetteError::InvalidConfig(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(VignetteError::InvalidConfig("model must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_secs_f64(self.inter_call_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.env_var_api_key)
            .with_context(|| format!("Environment variable {} not found", self.env_var_api_key))
    }
}
