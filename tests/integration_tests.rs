//! Integration tests for scaffold
//!
//! The binary is driven through piped stdin against a local mock of the
//! chat-completions endpoint.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use axum::{Json, Router, http::StatusCode, routing::post};
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

const STDIN: &str = "MERN Stack\nshop\nAn online store\nwith a cart\nEND\n";

/// Helper to create a scaffold Command with a clean environment
fn scaffold() -> Command {
    let mut cmd = cargo_bin_cmd!("scaffold");
    for var in [
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "SCAFFOLD_MODEL",
        "SCAFFOLD_TIMEOUT_SECS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn tool_call(name: &str, arguments: Value) -> Value {
    json!({
        "id": format!("call_{name}"),
        "type": "function",
        "function": {"name": name, "arguments": arguments.to_string()}
    })
}

fn plan_response() -> Value {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "Project generation is complete.",
                "tool_calls": [
                    tool_call("create_directory", json!({"directory_name": "src"})),
                    tool_call("write_to_file", json!({"filename": "src/index.js", "content": "console.log(1)"})),
                    tool_call("write_to_file", json!({"filename": "../../etc/evil", "content": "x"})),
                    tool_call("run_command", json!({"command": "sudo npm install -g nodemon"})),
                ]
            }
        }]
    })
}

async fn chat(Json(body): Json<Value>) -> Json<Value> {
    if body.get("tools").is_some() {
        Json(plan_response())
    } else {
        Json(json!({"choices": [{"message": {"content": "# shop\n\nAn online store.\n"}}]}))
    }
}

async fn spawn_mock(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

async fn spawn_chat_mock() -> String {
    spawn_mock(Router::new().route("/v1/chat/completions", post(chat))).await
}

fn read_summary(dir: &TempDir) -> Value {
    let content = fs::read_to_string(dir.path().join("shop_generation_summary.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_scaffold_help() {
        scaffold()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--readme"));
    }

    #[test]
    fn test_scaffold_version() {
        scaffold().arg("--version").assert().success();
    }

    #[test]
    fn test_missing_credential_fails_before_prompting() {
        let dir = TempDir::new().unwrap();

        scaffold()
            .current_dir(dir.path())
            .write_stdin(STDIN)
            .assert()
            .failure()
            .stderr(predicate::str::contains("OPENAI_API_KEY"))
            .stdout(predicate::str::contains("PROJECT GENERATOR").not());

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_config_file_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("scaffold.toml"), "[model\n").unwrap();

        scaffold()
            .current_dir(dir.path())
            .env("OPENAI_API_KEY", "sk-test")
            .write_stdin(STDIN)
            .assert()
            .failure()
            .stderr(predicate::str::contains("scaffold.toml"));
    }
}

// =============================================================================
// End-to-end generation against a mock model service
// =============================================================================

mod generation {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generates_project_and_summary() {
        let base_url = spawn_chat_mock().await;
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            scaffold()
                .current_dir(&root)
                .env("OPENAI_API_KEY", "sk-test")
                .env("OPENAI_BASE_URL", &base_url)
                .write_stdin(STDIN)
                .assert()
                .success()
                .stdout(predicate::str::contains("Total Files Created: 1"))
                .stdout(predicate::str::contains("Total Directories Created: 1"))
                .stdout(predicate::str::contains("path_escape"))
                .stdout(predicate::str::contains("shop_generation_summary.json"));
        })
        .await
        .unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("src/index.js")).unwrap(),
            "console.log(1)"
        );
        assert!(!dir.path().join("README.md").exists());

        let summary = read_summary(&dir);
        assert_eq!(summary["project_type"], "MERN Stack");
        assert_eq!(summary["description"], "An online store\nwith a cart");
        assert_eq!(summary["total_files"], 1);
        assert_eq!(summary["total_directories"], 1);
        assert_eq!(summary["files_created"], json!(["src/index.js"]));

        let kinds: Vec<_> = summary["failures"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, vec!["path_escape", "privilege_escalation"]);
        assert_eq!(summary["model_notes"], "Project generation is complete.");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_readme_flag_writes_readme() {
        let base_url = spawn_chat_mock().await;
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            scaffold()
                .current_dir(&root)
                .arg("--readme")
                .env("OPENAI_API_KEY", "sk-test")
                .env("OPENAI_BASE_URL", &base_url)
                .write_stdin(STDIN)
                .assert()
                .success();
        })
        .await
        .unwrap();

        let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(readme.starts_with("# shop"));

        let summary = read_summary(&dir);
        assert_eq!(summary["total_files"], 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_credential_from_dotenv_file() {
        let base_url = spawn_chat_mock().await;
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".env"),
            format!("OPENAI_API_KEY=sk-from-dotenv\nOPENAI_BASE_URL={base_url}\n"),
        )
        .unwrap();
        let root = dir.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            scaffold()
                .current_dir(&root)
                .write_stdin(STDIN)
                .assert()
                .success();
        })
        .await
        .unwrap();

        assert!(dir.path().join("src/index.js").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_service_error_is_fatal_and_creates_nothing() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        );
        let base_url = spawn_mock(app).await;
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            scaffold()
                .current_dir(&root)
                .env("OPENAI_API_KEY", "sk-test")
                .env("OPENAI_BASE_URL", &base_url)
                .write_stdin(STDIN)
                .assert()
                .failure()
                .stderr(predicate::str::contains("500"));
        })
        .await
        .unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_slow_service_times_out_and_creates_nothing() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Json(plan_response())
            }),
        );
        let base_url = spawn_mock(app).await;
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            scaffold()
                .current_dir(&root)
                .args(["--timeout", "1"])
                .env("OPENAI_API_KEY", "sk-test")
                .env("OPENAI_BASE_URL", &base_url)
                .write_stdin(STDIN)
                .assert()
                .failure()
                .stderr(predicate::str::contains("timed out"));
        })
        .await
        .unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_project_dir_flag_confines_output() {
        let base_url = spawn_chat_mock().await;
        let cwd = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let cwd_path = cwd.path().to_path_buf();
        let target_path = target.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            scaffold()
                .current_dir(&cwd_path)
                .arg("--project-dir")
                .arg(&target_path)
                .env("OPENAI_API_KEY", "sk-test")
                .env("OPENAI_BASE_URL", &base_url)
                .write_stdin(STDIN)
                .assert()
                .success();
        })
        .await
        .unwrap();

        assert!(target.path().join("src/index.js").exists());
        assert_eq!(fs::read_dir(cwd.path()).unwrap().count(), 0);
    }
}
