//! Layered configuration for scaffold.
//!
//! Settings resolve in this order, later layers winning:
//! built-in defaults → `scaffold.toml` → environment (after `.env`) → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [model]
//! name = "gpt-4o"
//! base_url = "https://api.openai.com/v1"
//! timeout_secs = 300
//! temperature = 0.2
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::GenerateError;

pub const CONFIG_FILE: &str = "scaffold.toml";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
const MODEL_VAR: &str = "SCAFFOLD_MODEL";
const TIMEOUT_VAR: &str = "SCAFFOLD_TIMEOUT_SECS";

/// `[model]` table of `scaffold.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Parsed `scaffold.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaffoldToml {
    #[serde(default)]
    pub model: ModelSection,
}

impl ScaffoldToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scaffold.toml")
    }

    /// Returns the default configuration if the file doesn't exist.
    pub fn load_or_default(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Effective settings for talking to the model service.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub name: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
}

impl ModelSettings {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Unified configuration with CLI overrides applied on top.
#[derive(Debug, Clone)]
pub struct ScaffoldConfig {
    pub project_dir: PathBuf,
    pub toml: ScaffoldToml,
    pub cli_model: Option<String>,
    pub cli_timeout_secs: Option<u64>,
}

impl ScaffoldConfig {
    pub fn new(project_dir: &Path) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let toml = ScaffoldToml::load_or_default(&project_dir)?;

        Ok(Self {
            project_dir,
            toml,
            cli_model: None,
            cli_timeout_secs: None,
        })
    }

    pub fn with_cli_args(
        project_dir: &Path,
        model: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.cli_model = model;
        config.cli_timeout_secs = timeout_secs;
        Ok(config)
    }

    /// Load `<project_dir>/.env` into the process environment if present.
    ///
    /// Variables already set in the environment are not overridden.
    pub fn load_dotenv(&self) -> Option<PathBuf> {
        dotenvy::from_path(self.project_dir.join(".env"))
            .ok()
            .map(|()| self.project_dir.join(".env"))
    }

    /// Model settings (CLI → env → file → default).
    pub fn model_settings(&self) -> ModelSettings {
        self.model_settings_with(&|key| std::env::var(key).ok())
    }

    fn model_settings_with(&self, env: &dyn Fn(&str) -> Option<String>) -> ModelSettings {
        let file = &self.toml.model;

        let name = self
            .cli_model
            .clone()
            .or_else(|| non_empty(env(MODEL_VAR)))
            .or_else(|| file.name.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = non_empty(env(BASE_URL_VAR))
            .or_else(|| file.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = self
            .cli_timeout_secs
            .or_else(|| env(TIMEOUT_VAR).and_then(|v| v.trim().parse().ok()))
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        ModelSettings {
            name,
            base_url,
            timeout_secs,
            temperature: file.temperature,
        }
    }

    /// The API credential. Fatal when missing.
    pub fn api_key(&self) -> Result<String, GenerateError> {
        Self::api_key_with(&|key| std::env::var(key).ok())
    }

    fn api_key_with(env: &dyn Fn(&str) -> Option<String>) -> Result<String, GenerateError> {
        non_empty(env(API_KEY_VAR)).ok_or(GenerateError::CredentialMissing)
    }

    /// Check the configuration and return human-readable warnings.
    pub fn validate(&self) -> Vec<String> {
        settings_warnings(&self.model_settings())
    }
}

fn settings_warnings(settings: &ModelSettings) -> Vec<String> {
    let mut warnings = Vec::new();
    if settings.timeout_secs == 0 {
        warnings.push("model.timeout_secs is 0; requests will fail immediately".to_string());
    }
    if let Some(t) = settings.temperature {
        if !(0.0..=2.0).contains(&t) {
            warnings.push(format!("model.temperature {} is outside 0.0-2.0", t));
        }
    }
    if !settings.base_url.starts_with("http://") && !settings.base_url.starts_with("https://") {
        warnings.push(format!(
            "model.base_url '{}' is not an http(s) URL",
            settings.base_url
        ));
    }
    warnings
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
