//! The interactive generation flow.

use anyhow::Result;
use console::style;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

use scaffold::action::{ActionRecord, PlanStep};
use scaffold::config::ScaffoldConfig;
use scaffold::dispatch::{DispatchReport, dispatch};
use scaffold::guard::PathGuard;
use scaffold::input::{ProjectRequest, collect_request};
use scaffold::model::ModelClient;
use scaffold::summary::GenerationSummary;
use scaffold::ui::RequestSpinner;
use scaffold::ui::icons::ROCKET;

use crate::Cli;

const RULE_WIDTH: usize = 80;

pub async fn cmd_generate(project_dir: &Path, cli: &Cli) -> Result<()> {
    let config = ScaffoldConfig::with_cli_args(project_dir, cli.model.clone(), cli.timeout)?;
    if let Some(path) = config.load_dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }
    for warning in config.validate() {
        println!("  {} {}", style("⚠").yellow(), warning);
    }

    // Credential problems must surface before any request is attempted.
    let api_key = config.api_key()?;
    let guard = PathGuard::new(&config.project_dir)?;
    let client = ModelClient::new(config.model_settings(), api_key)?;

    print_banner();
    let request = collect_request()?;
    print_request(&request);

    let started = Instant::now();
    let spinner = RequestSpinner::start(format!(
        "Waiting for {} to plan the project...",
        client.settings().name
    ));
    let plan = match client.request_plan(&request).await {
        Ok(plan) => {
            spinner.succeed(format!("Received {} actions", plan.steps.len()));
            plan
        }
        Err(e) => {
            spinner.fail("Model request failed");
            return Err(e.into());
        }
    };

    let mut report = dispatch(&guard, plan.steps, DispatchReport::default());
    if cli.readme {
        report = generate_readme(&client, &guard, &request, report).await;
    }

    let summary = GenerationSummary::new(
        &request,
        guard.root(),
        report,
        started.elapsed(),
        plan.notes,
    );
    println!("{}", summary.render());

    let path = summary.save()?;
    println!();
    println!("Detailed generation summary saved to {}", path.display());
    Ok(())
}

/// A failed README pass never discards the project that was already written.
async fn generate_readme(
    client: &ModelClient,
    guard: &PathGuard,
    request: &ProjectRequest,
    report: DispatchReport,
) -> DispatchReport {
    let spinner = RequestSpinner::start("Writing README.md...");
    match client.request_readme(request, &report).await {
        Ok(content) => {
            spinner.succeed("README.md generated");
            let step = PlanStep::Action(ActionRecord::write_file("README.md", content));
            dispatch(guard, [step], report)
        }
        Err(e) => {
            spinner.fail("README generation failed");
            warn!(error = %e, "README generation failed");
            println!("  {} README.md was not generated: {}", style("⚠").yellow(), e);
            report
        }
    }
}

fn print_banner() {
    let rule = "=".repeat(RULE_WIDTH);
    println!("{}", rule);
    println!("{}", style("PROJECT GENERATOR").bold());
    println!("{}", rule);
    println!("This tool will generate a complete project structure based on your specifications.");
    println!("Please provide the following information:");
    println!();
}

fn print_request(request: &ProjectRequest) {
    println!();
    println!(
        "{}Starting project generation for {}...",
        ROCKET,
        style(&request.name).cyan()
    );
    println!("Type: {}", request.project_type);
    println!("Description: {}", request.description);
    println!("{}", "=".repeat(RULE_WIDTH));
}
