//! End-of-run summary: JSON record in the project root plus a text report.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::dispatch::{ActionFailure, ActionLogEntry, DispatchReport};
use crate::input::ProjectRequest;
use crate::ui::icons::{CHECK, CROSS, FILE_NEW, FOLDER, SPARKLE};

/// Directories never worth listing in the tree.
const TREE_SKIP: &[&str] = &[".git", "node_modules", "target", "__pycache__", ".venv", "venv"];
const MAX_TREE_ENTRIES: usize = 400;
const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub project_name: String,
    pub project_type: String,
    pub description: String,
    pub root: PathBuf,
    pub generated_at: String,
    pub generation_time_seconds: f64,
    pub total_files: usize,
    pub total_directories: usize,
    pub files_created: Vec<String>,
    pub directories_created: Vec<String>,
    pub failures: Vec<ActionFailure>,
    pub actions: Vec<ActionLogEntry>,
    pub tree: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_notes: Option<String>,
}

impl GenerationSummary {
    /// Build the summary from a finished dispatch and render the tree of `root`.
    pub fn new(
        request: &ProjectRequest,
        root: &Path,
        report: DispatchReport,
        elapsed: Duration,
        model_notes: Option<String>,
    ) -> Self {
        let file_name = summary_file_name(&request.name);
        let tree = render_tree(root, &[file_name.as_str()]);

        Self {
            project_name: request.name.clone(),
            project_type: request.project_type.clone(),
            description: request.description.clone(),
            root: root.to_path_buf(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            generation_time_seconds: elapsed.as_secs_f64(),
            total_files: report.files_created(),
            total_directories: report.dirs_created(),
            files_created: report.files,
            directories_created: report.directories,
            failures: report.failures,
            actions: report.log,
            tree,
            model_notes,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(summary_file_name(&self.project_name))
    }

    /// Write the summary as pretty JSON. Returns the path written.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.path();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize summary")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        Ok(path)
    }

    /// Human-readable report for stdout.
    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        out.push_str(&format!("\n{}\n", rule));
        out.push_str(&format!("{}\n", style("PROJECT GENERATION SUMMARY").bold()));
        out.push_str(&format!("{}\n", rule));
        out.push_str(&format!("Project Name: {}\n", self.project_name));
        out.push_str(&format!("Project Type: {}\n", self.project_type));
        out.push_str(&format!(
            "Generation Time: {:.2} seconds\n",
            self.generation_time_seconds
        ));
        out.push_str(&format!("Total Files Created: {}\n", self.total_files));
        out.push_str(&format!(
            "Total Directories Created: {}\n",
            self.total_directories
        ));

        out.push_str(&format!("\n{}\n", style("DIRECTORIES CREATED:").bold()));
        for dir in &self.directories_created {
            out.push_str(&format!("{}{}\n", FOLDER, dir));
        }

        out.push_str(&format!("\n{}\n", style("FILES CREATED:").bold()));
        for file in &self.files_created {
            out.push_str(&format!("{}{}\n", FILE_NEW, file));
        }

        if self.failures.is_empty() {
            out.push_str(&format!("\n{}All actions succeeded\n", CHECK));
        } else {
            out.push_str(&format!(
                "\n{} ({})\n",
                style("FAILED ACTIONS:").red().bold(),
                self.failures.len()
            ));
            for failure in &self.failures {
                out.push_str(&format!(
                    "{}[{}] {}\n",
                    CROSS,
                    style(failure.kind).red(),
                    failure.message
                ));
            }
        }

        out.push_str(&format!("\n{}\n", style("PROJECT TREE:").bold()));
        out.push_str(&self.tree);

        if let Some(notes) = &self.model_notes {
            out.push_str(&format!("\n{}{}\n", SPARKLE, style("MODEL NOTES:").bold()));
            out.push_str(notes);
            out.push('\n');
        }

        out
    }
}

/// `<slug>_generation_summary.json`, with the project name reduced to
/// `[A-Za-z0-9_-]`.
pub fn summary_file_name(project_name: &str) -> String {
    let slug: String = project_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let slug = if slug.is_empty() { "project".to_string() } else { slug };
    format!("{}_generation_summary.json", slug)
}

/// Render the directory tree below `root`, directories first, names sorted.
///
/// Entries named in `exclude` or in the built-in skip list are left out.
pub fn render_tree(root: &Path, exclude: &[&str]) -> String {
    let skipped =
        |name: &str| TREE_SKIP.iter().any(|s| *s == name) || exclude.iter().any(|s| *s == name);

    let entries: Vec<(usize, String, bool)> = WalkDir::new(root)
        .min_depth(1)
        .sort_by(|a, b| {
            b.file_type()
                .is_dir()
                .cmp(&a.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| !skipped(&e.file_name().to_string_lossy()))
        .filter_map(|e| e.ok())
        .map(|e| {
            (
                e.depth(),
                e.file_name().to_string_lossy().into_owned(),
                e.file_type().is_dir(),
            )
        })
        .collect();

    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let mut out = format!("{}/\n", root_name);

    // open[d] is true while the ancestor at depth d+1 still has siblings below it.
    let mut open: Vec<bool> = Vec::new();
    for (i, (depth, name, is_dir)) in entries.iter().enumerate().take(MAX_TREE_ENTRIES) {
        let is_last = !entries[i + 1..]
            .iter()
            .take_while(|(d, _, _)| d >= depth)
            .any(|(d, _, _)| d == depth);

        open.truncate(depth - 1);
        for &more in &open {
            out.push_str(if more { "│   " } else { "    " });
        }
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push_str(name);
        if *is_dir {
            out.push('/');
        }
        out.push('\n');
        open.push(!is_last);
    }

    if entries.len() > MAX_TREE_ENTRIES {
        out.push_str(&format!(
            "... {} more entries\n",
            entries.len() - MAX_TREE_ENTRIES
        ));
    }
    out
}
