//! Runtime configuration loaded from `config.yaml`.
//!
//! Endpoints, model names, timeouts and limits live in a YAML file so they can
//! be changed without rebuilding. Secrets (the Gemini key and the Hugging Face
//! token) never come from this file; they are read from the CLI or the
//! environment by [`crate::cli::Cli`].
//!
//! # Lookup order
//!
//! 1. The path given with `--config`
//! 2. `{config_dir}/awful_bias_detector/config.yaml` if it exists
//! 3. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::AnalysisError;

pub const DEFAULT_CLASSIFIER_MODEL: &str = "valurank/distilroberta-bias";
pub const DEFAULT_CLASSIFIER_API_BASE: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Settings read from `config.yaml`. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Text-classification model served by the inference endpoint.
    pub classifier_model: String,
    pub classifier_api_base: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    /// Timeout for classifier and Gemini calls.
    pub request_timeout_secs: u64,
    /// Timeout for fetching article pages.
    pub scrape_timeout_secs: u64,
    pub user_agent: String,
    /// Characters of article text sent to the classifier (about 512 tokens).
    pub max_input_chars: usize,
    /// Extracted page text at or below this length counts as a failed scrape.
    pub min_extracted_chars: usize,
    pub max_retries: usize,
    /// Analyses in flight at once in batch mode.
    pub batch_concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            classifier_model: DEFAULT_CLASSIFIER_MODEL.to_string(),
            classifier_api_base: DEFAULT_CLASSIFIER_API_BASE.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            request_timeout_secs: 60,
            scrape_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_input_chars: 2000,
            min_extracted_chars: 100,
            max_retries: 3,
            batch_concurrency: 4,
        }
    }
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, AnalysisError> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `explicit` if given, else the per-user file, else defaults.
    #[instrument(level = "info", skip_all)]
    pub async fn load(explicit: Option<&str>) -> Result<Self, AnalysisError> {
        let path = match explicit {
            Some(p) => Some(PathBuf::from(p)),
            None => default_config_path().filter(|p| p.exists()),
        };

        match path {
            Some(path) => {
                let yaml = tokio::fs::read_to_string(&path).await.map_err(|e| {
                    AnalysisError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                let config = Self::from_yaml(&yaml)?;
                info!(config_path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            None => {
                debug!("No config file found; using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_input_chars == 0 {
            return Err(AnalysisError::Config("max_input_chars must be > 0".into()));
        }
        if self.batch_concurrency == 0 {
            return Err(AnalysisError::Config("batch_concurrency must be > 0".into()));
        }
        for (name, base) in [
            ("classifier_api_base", &self.classifier_api_base),
            ("gemini_api_base", &self.gemini_api_base),
        ] {
            url::Url::parse(base)
                .map_err(|e| AnalysisError::Config(format!("{name} is not a URL: {e}")))?;
        }
        Ok(())
    }
}

/// `{config_dir}/awful_bias_detector/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| config_path_in(&d))
}

fn config_path_in(dir: &Path) -> PathBuf {
    dir.join("awful_bias_detector").join("config.yaml")
}
