use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "scaffold")]
#[command(
    version,
    about = "Generate a fullstack project skeleton from a description using a hosted language model"
)]
pub struct Cli {
    /// Log every action at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory the project is generated into (defaults to the current directory)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Model name. Overrides scaffold.toml and SCAFFOLD_MODEL.
    #[arg(long)]
    pub model: Option<String>,

    /// Request timeout in seconds. Overrides scaffold.toml and SCAFFOLD_TIMEOUT_SECS.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Also generate a README.md describing the created structure
    #[arg(long)]
    pub readme: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "scaffold=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    cmd::cmd_generate(&project_dir, &cli).await
}
