//! Collects the project request from the terminal.
//!
//! When stdin is a terminal, project type and name are asked with `dialoguer`
//! prompts (drawn on stderr, so a redirected stdout does not hide them).
//! The description is always read line by line until a literal `END` line,
//! so piped input works the same way.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Line that terminates the multi-line description.
pub const END_SENTINEL: &str = "END";

/// What the user asked for. Immutable once submitted to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub project_type: String,
    pub name: String,
    pub description: String,
}

impl ProjectRequest {
    pub fn new(
        project_type: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self> {
        let project_type = project_type.into().trim().to_string();
        let name = name.into().trim().to_string();
        if project_type.is_empty() {
            bail!("Project type must not be empty");
        }
        if name.is_empty() {
            bail!("Project name must not be empty");
        }
        Ok(Self {
            project_type,
            name,
            description: description.into(),
        })
    }
}

/// Read description lines until `END` (or end of input).
///
/// Lines are joined with `\n`; the sentinel itself is not included.
pub fn read_description<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read project description")?;
        if line.trim() == END_SENTINEL {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

/// Read a full request from non-interactive input.
///
/// Expected layout: project type on the first line, name on the second,
/// then the description terminated by `END`.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<ProjectRequest> {
    let project_type = read_line(reader).context("Failed to read project type")?;
    let name = read_line(reader).context("Failed to read project name")?;
    let description = read_description(reader)?;
    ProjectRequest::new(project_type, name, description)
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask for the request interactively.
pub fn prompt_request() -> Result<ProjectRequest> {
    use dialoguer::Input;

    let project_type: String = Input::new()
        .with_prompt("Enter project type (e.g., MERN Stack, Django+React)")
        .validate_with(|s: &String| non_blank(s))
        .interact_text()
        .context("Failed to read project type")?;

    let name: String = Input::new()
        .with_prompt("Enter project name")
        .validate_with(|s: &String| non_blank(s))
        .interact_text()
        .context("Failed to read project name")?;

    eprintln!();
    eprintln!(
        "Enter project description (type '{}' on a new line when finished):",
        END_SENTINEL
    );
    let description = read_description(&mut std::io::stdin().lock())?;

    ProjectRequest::new(project_type, name, description)
}

fn non_blank(s: &str) -> Result<(), &'static str> {
    if s.trim().is_empty() {
        Err("Value must not be empty")
    } else {
        Ok(())
    }
}

/// How the request is gathered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Prompt,
    Piped,
}

impl InputMode {
    /// Only stdin decides; stdout may be redirected while a person types.
    pub fn for_stdin(stdin_is_terminal: bool) -> Self {
        if stdin_is_terminal {
            InputMode::Prompt
        } else {
            InputMode::Piped
        }
    }
}

/// Prompt when a person is at the terminal, otherwise read stdin.
pub fn collect_request() -> Result<ProjectRequest> {
    use std::io::IsTerminal;

    match InputMode::for_stdin(std::io::stdin().is_terminal()) {
        InputMode::Prompt => prompt_request(),
        InputMode::Piped => read_request(&mut std::io::stdin().lock()),
    }
}
