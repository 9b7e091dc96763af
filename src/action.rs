//! Actions the model may request and their decoding from tool calls.

use serde::{Deserialize, Serialize};

use crate::errors::ActionError;
use crate::guard::check_command;

/// Tool name the model uses to create a directory.
pub const MAKE_DIRECTORY_TOOL: &str = "create_directory";
/// Tool name the model uses to write a file.
pub const WRITE_FILE_TOOL: &str = "write_to_file";
/// Shell execution is never offered, but models sometimes ask for it anyway.
const RUN_COMMAND_TOOL: &str = "run_command";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MakeDirectory,
    WriteFile,
}

impl ActionKind {
    /// Tool name the model uses for this kind of action.
    pub fn tool_name(self) -> &'static str {
        match self {
            ActionKind::MakeDirectory => MAKE_DIRECTORY_TOOL,
            ActionKind::WriteFile => WRITE_FILE_TOOL,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::MakeDirectory => write!(f, "make_directory"),
            ActionKind::WriteFile => write!(f, "write_file"),
        }
    }
}

/// One filesystem instruction issued by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ActionRecord {
    pub fn make_directory(path: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::MakeDirectory,
            path: path.into(),
            content: None,
        }
    }

    pub fn write_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::WriteFile,
            path: path.into(),
            content: Some(content.into()),
        }
    }
}

/// One entry of the ordered plan returned by the model.
///
/// Calls that cannot become an [`ActionRecord`] keep their position in the
/// plan as `Rejected`, so the dispatcher reports them in order.
#[derive(Debug)]
pub enum PlanStep {
    Action(ActionRecord),
    Rejected { tool: String, error: ActionError },
}

#[derive(Debug, Deserialize)]
struct CreateDirectoryArgs {
    #[serde(alias = "path")]
    directory_name: String,
}

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    #[serde(alias = "path")]
    filename: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunCommandArgs {
    command: String,
}

impl PlanStep {
    /// Decode a single function call. `arguments` is the JSON-encoded argument
    /// object exactly as the model produced it.
    pub fn from_tool_call(name: &str, arguments: &str) -> Self {
        let rejected = |error: ActionError| PlanStep::Rejected {
            tool: name.to_string(),
            error,
        };
        let invalid = |err: serde_json::Error| {
            rejected(ActionError::InvalidArguments {
                tool: name.to_string(),
                message: err.to_string(),
            })
        };

        match name {
            MAKE_DIRECTORY_TOOL => match serde_json::from_str::<CreateDirectoryArgs>(arguments) {
                Ok(args) => PlanStep::Action(ActionRecord::make_directory(args.directory_name)),
                Err(e) => invalid(e),
            },
            WRITE_FILE_TOOL => match serde_json::from_str::<WriteFileArgs>(arguments) {
                Ok(args) => PlanStep::Action(ActionRecord {
                    kind: ActionKind::WriteFile,
                    path: args.filename,
                    content: args.content,
                }),
                Err(e) => invalid(e),
            },
            RUN_COMMAND_TOOL => match serde_json::from_str::<RunCommandArgs>(arguments) {
                Ok(args) => match check_command(&args.command) {
                    Err(e) => rejected(e),
                    Ok(()) => rejected(ActionError::UnsupportedAction {
                        tool: name.to_string(),
                    }),
                },
                Err(e) => invalid(e),
            },
            _ => rejected(ActionError::UnsupportedAction {
                tool: name.to_string(),
            }),
        }
    }
}
