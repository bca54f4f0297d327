//! Upload command handler.
//!
//! Indexes files from disk through the same pipeline the HTTP upload
//! endpoint uses. Directories are walked recursively.

use clap::Args;
use ragdesk_core::{config::AppConfig, AppError, AppResult};
use ragdesk_knowledge::{IngestReport, RagPipeline};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Index files or directories
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// Files or directories to index
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl UploadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing upload command");

        let files = collect_files(&self.paths);
        if files.is_empty() {
            return Err(AppError::Validation("No files found to upload".to_string()));
        }

        let pipeline = RagPipeline::from_config(config)?;

        let mut reports: Vec<IngestReport> = Vec::new();
        let mut failures: Vec<(PathBuf, String)> = Vec::new();

        for path in &files {
            match ingest_file(&pipeline, path).await {
                Ok(report) => {
                    if !self.json {
                        println!("{}: {} chunks", report.file_name, report.chunks);
                    }
                    reports.push(report);
                }
                Err(e) => {
                    tracing::warn!("Failed to index {:?}: {}", path, e);
                    if !self.json {
                        eprintln!("{}: {}", path.display(), e);
                    }
                    failures.push((path.clone(), e.to_string()));
                }
            }
        }

        if self.json {
            let output = serde_json::json!({
                "uploaded": reports,
                "failed": failures
                    .iter()
                    .map(|(path, error)| serde_json::json!({
                        "path": path.display().to_string(),
                        "error": error,
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::Other(format!(
                "{} of {} files failed to index",
                failures.len(),
                files.len()
            )))
        }
    }
}

async fn ingest_file(pipeline: &RagPipeline, path: &Path) -> AppResult<IngestReport> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    pipeline.ingest_bytes(&bytes, &file_name).await
}

/// Expand directories into the regular files below them, skipping hidden
/// entries. Explicit file arguments are kept as given.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let walker = WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

            for entry in walker {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        files.push(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    files
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
