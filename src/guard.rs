//! Working-directory confinement for model-issued actions.
//!
//! Every path the model asks for is resolved against a canonical root and must
//! stay equal to or below it. The target usually does not exist yet, so the
//! request is normalized lexically first and only the deepest existing
//! ancestor is canonicalized; that catches symlinks inside the root that point
//! elsewhere.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::errors::ActionError;

/// Programs whose invocation means the model asked for elevated privileges.
const ESCALATION_PROGRAMS: &[&str] = &["sudo", "su", "doas", "pkexec", "runas"];

/// Confines filesystem targets to a single root directory.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Build a guard for `root`. The root must exist.
    pub fn new(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve working directory {}", root.display()))?;
        Ok(Self { root })
    }

    /// The canonical root every action is confined to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `requested` against the root.
    ///
    /// An empty request resolves to the root itself. Absolute requests are
    /// accepted only when they already point inside the root.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, ActionError> {
        let escape = || ActionError::PathEscape {
            requested: requested.to_string(),
        };

        let normalized = normalize_lexically(&self.root.join(requested.trim()));
        let anchored = anchor_to_disk(&normalized).ok_or_else(escape)?;

        if anchored.starts_with(&self.root) {
            Ok(anchored)
        } else {
            Err(escape())
        }
    }
}

/// Reject shell commands that invoke a privilege-escalation program.
pub fn check_command(command: &str) -> Result<(), ActionError> {
    let escalates = command
        .split(|c: char| c.is_whitespace() || matches!(c, ';' | '&' | '|' | '(' | ')' | '`' | '$'))
        .filter(|token| !token.is_empty())
        .map(|token| token.rsplit('/').next().unwrap_or(token).to_lowercase())
        .any(|program| ESCALATION_PROGRAMS.contains(&program.as_str()));

    if escalates {
        Err(ActionError::PrivilegeEscalation {
            command: command.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Drop `.` and apply `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the rest.
///
/// Returns `None` when an existing entry cannot be canonicalized, which is
/// the case for a dangling symlink.
fn anchor_to_disk(path: &Path) -> Option<PathBuf> {
    let mut existing = path;
    let mut rest: Vec<OsString> = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut anchored) => {
                for part in rest.iter().rev() {
                    anchored.push(part);
                }
                return Some(anchored);
            }
            Err(_) if std::fs::symlink_metadata(existing).is_ok() => return None,
            Err(_) => {}
        }

        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Some(path.to_path_buf()),
        }
    }
}
