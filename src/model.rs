//! Chat-completions client for the hosted model.
//!
//! One request carries the system instruction, the user's three strings and
//! the tool schema; the ordered tool calls in the reply become the plan.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::action::{MAKE_DIRECTORY_TOOL, PlanStep, WRITE_FILE_TOOL};
use crate::config::ModelSettings;
use crate::dispatch::DispatchReport;
use crate::errors::{ActionError, GenerateError};
use crate::input::ProjectRequest;

/// System instruction for project generation.
pub const GENERATION_SYSTEM_PROMPT: &str = "You are an expert fullstack developer assistant capable of generating complete project structures. \
You have access to tools that can create directories and write files to set up a complete project structure. \
Focus on creating a well-organized, production-ready project structure with proper files and content. \
You must work only within the current directory using relative paths and cannot run commands or use sudo. \
Issue every directory and file the project needs in this single response. \
When creating files, include proper content that would be expected in a professional project.";

/// System instruction for the optional README pass.
pub const README_SYSTEM_PROMPT: &str = "You are an expert technical writer specialized in creating comprehensive README.md files \
for software projects. Generate a professional README.md that includes a project description, features, \
prerequisites, installation, usage, API endpoints (if applicable), technologies used, and contributing guidelines. \
Reply with the Markdown content only.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    /// Kept loose so one odd entry cannot sink the calls around it.
    #[serde(default)]
    tool_calls: Option<Vec<Value>>,
}

/// The model's answer to a generation request.
#[derive(Debug)]
pub struct GenerationPlan {
    pub steps: Vec<PlanStep>,
    /// Any prose the model returned next to its tool calls.
    pub notes: Option<String>,
}

/// Declared operations the model may call.
pub fn tool_schema() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": MAKE_DIRECTORY_TOOL,
                "description": "Creates a directory (and any missing parents) in the current working directory",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "directory_name": {
                            "type": "string",
                            "description": "Relative path of the directory to create"
                        }
                    },
                    "required": ["directory_name"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": WRITE_FILE_TOOL,
                "description": "Writes content to a file in the current working directory, overwriting it if it exists",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "filename": {
                            "type": "string",
                            "description": "Relative path of the file to write"
                        },
                        "content": {
                            "type": "string",
                            "description": "Full content of the file"
                        }
                    },
                    "required": ["filename", "content"]
                }
            }
        }
    ])
}

pub fn generation_user_message(request: &ProjectRequest) -> String {
    format!(
        "Generate a complete {} project named '{}' with the following description: {}\n\n\
         Please create the directory structure, all necessary files with appropriate content, \
         and include configuration files, code files, and documentation.",
        request.project_type, request.name, request.description
    )
}

pub fn readme_user_message(request: &ProjectRequest, report: &DispatchReport) -> String {
    let list = |items: &[String]| {
        items
            .iter()
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Generate a detailed README.md for a {} project named '{}' with the following description:\n\n{}\n\n\
         This project has the following structure:\n\nDirectories:\n{}\n\nFiles:\n{}",
        request.project_type,
        request.name,
        request.description,
        list(&report.directories),
        list(&report.files)
    )
}

/// Build the single generation request body.
pub fn build_generation_request<'a>(
    settings: &'a ModelSettings,
    request: &ProjectRequest,
) -> ChatRequest<'a> {
    ChatRequest {
        model: &settings.name,
        messages: vec![
            ChatMessage::system(GENERATION_SYSTEM_PROMPT),
            ChatMessage::user(generation_user_message(request)),
        ],
        tools: Some(tool_schema()),
        tool_choice: Some("auto"),
        temperature: settings.temperature,
    }
}

/// Decode a chat-completions response body into a plan.
///
/// Tool calls keep the order the model emitted them in. A reply with no tool
/// calls yields an empty plan.
pub fn parse_plan(body: &str) -> Result<GenerationPlan, GenerateError> {
    let message = first_message(body)?;
    let steps = message
        .tool_calls
        .unwrap_or_default()
        .iter()
        .map(decode_tool_call)
        .collect();
    let notes = message.content.filter(|c| !c.trim().is_empty());
    Ok(GenerationPlan { steps, notes })
}

/// Decode one raw `tool_calls` entry.
///
/// Entries without a `function` object are unsupported. `arguments` is
/// normally a JSON-encoded string, but an inline object is accepted too.
fn decode_tool_call(call: &Value) -> PlanStep {
    let Some(function) = call.get("function").filter(|f| f.is_object()) else {
        let tool = call
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        return PlanStep::Rejected {
            tool: tool.clone(),
            error: ActionError::UnsupportedAction { tool },
        };
    };
    let Some(name) = function.get("name").and_then(Value::as_str) else {
        return PlanStep::Rejected {
            tool: "unknown".to_string(),
            error: ActionError::InvalidArguments {
                tool: "unknown".to_string(),
                message: "tool call has no function name".to_string(),
            },
        };
    };
    let arguments = match function.get("arguments") {
        Some(Value::String(raw)) => raw.clone(),
        None | Some(Value::Null) => "{}".to_string(),
        Some(inline) => inline.to_string(),
    };
    PlanStep::from_tool_call(name, &arguments)
}

/// Extract the plain text reply from a chat-completions response body.
pub fn parse_text(body: &str) -> Result<String, GenerateError> {
    first_message(body)?
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| GenerateError::MalformedResponse("response has no content".to_string()))
}

fn first_message(body: &str) -> Result<ResponseMessage, GenerateError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| GenerateError::MalformedResponse("response has no choices".to_string()))
}

/// Thin HTTP client over the chat-completions endpoint.
pub struct ModelClient {
    http: reqwest::Client,
    api_key: String,
    settings: ModelSettings,
}

impl ModelClient {
    pub fn new(settings: ModelSettings, api_key: String) -> Result<Self, GenerateError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(GenerateError::RequestFailure)?;
        Ok(Self {
            http,
            api_key,
            settings,
        })
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Send the generation request and decode the returned plan.
    pub async fn request_plan(
        &self,
        request: &ProjectRequest,
    ) -> Result<GenerationPlan, GenerateError> {
        let body = build_generation_request(&self.settings, request);
        let raw = self.send(&body).await?;
        let plan = parse_plan(&raw)?;
        info!(steps = plan.steps.len(), "received action plan");
        Ok(plan)
    }

    /// Ask for README.md content describing what was created.
    pub async fn request_readme(
        &self,
        request: &ProjectRequest,
        report: &DispatchReport,
    ) -> Result<String, GenerateError> {
        let body = ChatRequest {
            model: &self.settings.name,
            messages: vec![
                ChatMessage::system(README_SYSTEM_PROMPT),
                ChatMessage::user(readme_user_message(request, report)),
            ],
            tools: None,
            tool_choice: None,
            temperature: self.settings.temperature,
        };
        let raw = self.send(&body).await?;
        parse_text(&raw)
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<String, GenerateError> {
        let url = self.settings.completions_url();
        let timeout = self.settings.timeout_secs;
        info!(model = %self.settings.name, %url, "sending chat request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerateError::from_transport(e, timeout))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GenerateError::from_transport(e, timeout))?;
        debug!(%status, bytes = text.len(), "chat response received");

        if !status.is_success() {
            return Err(GenerateError::ServiceStatus { status, body: text });
        }
        Ok(text)
    }
}
