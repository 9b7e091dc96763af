//! Typed error hierarchy for scaffold.
//!
//! Two top-level enums cover the two failure scopes:
//! - `GenerateError`: fatal failures that abort the whole run
//! - `ActionError`: per-action failures that are recorded and skipped

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a generation run before any action executes.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("OPENAI_API_KEY not found. Set it in a .env file or directly in your environment.")]
    CredentialMissing,

    #[error("Model request failed: {0}")]
    RequestFailure(#[source] reqwest::Error),

    #[error("Model service returned {status}: {body}")]
    ServiceStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Model request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenerateError {
    /// Classify a transport error, separating timeouts from other failures.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            GenerateError::Timeout { secs: timeout_secs }
        } else {
            GenerateError::RequestFailure(err)
        }
    }
}

/// Errors from a single planned action. Never fatal to the run.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Path '{requested}' resolves outside the working directory")]
    PathEscape { requested: String },

    #[error("Refusing privileged command: {command}")]
    PrivilegeEscalation { command: String },

    #[error("Unsupported action '{tool}'")]
    UnsupportedAction { tool: String },

    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ActionError {
    /// Short machine-readable tag used in the JSON summary.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::PathEscape { .. } => "path_escape",
            ActionError::PrivilegeEscalation { .. } => "privilege_escalation",
            ActionError::UnsupportedAction { .. } => "unsupported_action",
            ActionError::InvalidArguments { .. } => "invalid_arguments",
            ActionError::WriteFailure { .. } => "write_failure",
        }
    }
}
