//! Replays a model-issued plan against the local filesystem.
//!
//! Each action is resolved through the [`PathGuard`] before anything touches
//! disk. Per-action failures are recorded in the [`DispatchReport`] and the
//! run moves on; a partially generated project is still useful.

use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::action::{ActionKind, ActionRecord, PlanStep};
use crate::errors::ActionError;
use crate::guard::PathGuard;

/// A recorded per-action failure.
#[derive(Debug, Clone, Serialize)]
pub struct ActionFailure {
    pub kind: &'static str,
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

/// One line of the action log, in plan order.
#[derive(Debug, Clone, Serialize)]
pub struct ActionLogEntry {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `"ok"` or the failure message.
    pub result: String,
}

/// Running tally of a dispatch pass.
///
/// Passed into [`dispatch`] and handed back, so several passes (the main plan,
/// then an optional README) accumulate into one report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub directories: Vec<String>,
    pub files: Vec<String>,
    pub failures: Vec<ActionFailure>,
    pub log: Vec<ActionLogEntry>,
}

impl DispatchReport {
    pub fn dirs_created(&self) -> usize {
        self.directories.len()
    }

    pub fn files_created(&self) -> usize {
        self.files.len()
    }

    /// Number of actions that completed successfully.
    pub fn succeeded(&self) -> usize {
        self.dirs_created() + self.files_created()
    }

    fn record_success(&mut self, action: &ActionRecord, rel: String) {
        match action.kind {
            ActionKind::MakeDirectory => self.directories.push(rel.clone()),
            ActionKind::WriteFile => self.files.push(rel.clone()),
        }
        self.log.push(ActionLogEntry {
            tool: action.kind.tool_name().to_string(),
            path: Some(rel),
            result: "ok".to_string(),
        });
    }

    fn record_failure(&mut self, tool: &str, path: Option<String>, error: &ActionError) {
        let message = error.to_string();
        self.failures.push(ActionFailure {
            kind: error.kind(),
            tool: tool.to_string(),
            path: path.clone(),
            message: message.clone(),
        });
        self.log.push(ActionLogEntry {
            tool: tool.to_string(),
            path,
            result: message,
        });
    }
}

/// Execute `plan` in order and fold the outcomes into `report`.
pub fn dispatch(
    guard: &PathGuard,
    plan: impl IntoIterator<Item = PlanStep>,
    mut report: DispatchReport,
) -> DispatchReport {
    for step in plan {
        match step {
            PlanStep::Action(action) => match execute(guard, &action) {
                Ok(rel) => {
                    debug!(kind = %action.kind, path = %rel, "action applied");
                    report.record_success(&action, rel);
                }
                Err(e) => {
                    warn!(kind = %action.kind, path = %action.path, error = %e, "action skipped");
                    report.record_failure(action.kind.tool_name(), Some(action.path.clone()), &e);
                }
            },
            PlanStep::Rejected { tool, error } => {
                warn!(tool = %tool, error = %error, "tool call rejected");
                report.record_failure(&tool, None, &error);
            }
        }
    }
    report
}

/// Apply one action. Returns the target's path relative to the root.
pub fn execute(guard: &PathGuard, action: &ActionRecord) -> Result<String, ActionError> {
    let target = guard.resolve(&action.path)?;
    let write_failure = |source: std::io::Error| ActionError::WriteFailure {
        path: target.clone(),
        source,
    };

    match action.kind {
        ActionKind::MakeDirectory => {
            std::fs::create_dir_all(&target).map_err(write_failure)?;
        }
        ActionKind::WriteFile => {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(write_failure)?;
            }
            let content = action.content.as_deref().unwrap_or_default();
            std::fs::write(&target, content).map_err(write_failure)?;
        }
    }

    Ok(relative_display(guard.root(), &target))
}

fn relative_display(root: &Path, target: &Path) -> String {
    match target.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => target.display().to_string(),
    }
}
