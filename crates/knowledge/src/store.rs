//! JSON file store for the vector index.
//!
//! The whole index is one pretty-printed JSON array of [`ChunkRecord`]s.
//! Writes replace the file atomically through a temporary sibling and a
//! rename, so readers only ever see a complete index. The store itself does
//! not serialize writers: two overlapping load/save cycles lose one of the
//! updates. Writes in the pipeline go through [`crate::writer::IndexWriter`].

use crate::types::{ChunkRecord, IndexStats};
use chrono::{DateTime, Utc};
use ragdesk_core::{AppError, AppResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Size and modification time of the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFileInfo {
    pub bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Location of one persisted index.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record.
    ///
    /// Never fails. A missing or unreadable file, or one that is not a JSON
    /// array, gives an empty index. Array elements that are not valid records
    /// are skipped with a warning.
    pub async fn load(&self) -> Vec<ChunkRecord> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No index at {:?} yet", self.path);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Failed to read index {:?}, treating as empty: {}", self.path, e);
                return Vec::new();
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_slice(&bytes) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Index {:?} is not a JSON array, treating as empty: {}", self.path, e);
                return Vec::new();
            }
        };

        let total = values.len();
        let records: Vec<ChunkRecord> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();

        if records.len() != total {
            tracing::warn!(
                "Skipped {} malformed records in {:?}",
                total - records.len(),
                self.path
            );
        }

        tracing::debug!("Loaded {} records from {:?}", records.len(), self.path);
        records
    }

    /// Replace the whole index with `records`.
    ///
    /// Creates the parent directory when missing, writes a temporary file next
    /// to the index and renames it over the canonical path.
    pub async fn save(&self, records: &[ChunkRecord]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Index(format!("Failed to create index directory {:?}: {}", parent, e))
            })?;
        }

        let json = serde_json::to_vec_pretty(records)?;
        let tmp_path = self.temp_path();

        tokio::fs::write(&tmp_path, &json).await.map_err(|e| {
            AppError::Index(format!("Failed to write index {:?}: {}", tmp_path, e))
        })?;

        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AppError::Index(format!(
                "Failed to replace index {:?}: {}",
                self.path, e
            )));
        }

        tracing::debug!("Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }

    /// File size and modification time; `None` when no index was written yet.
    pub async fn file_info(&self) -> Option<IndexFileInfo> {
        let metadata = tokio::fs::metadata(&self.path).await.ok()?;
        Some(IndexFileInfo {
            bytes: metadata.len(),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Record, file and dimension counts plus file metadata.
    pub async fn stats(&self) -> IndexStats {
        let records = self.load().await;
        let files: HashSet<&str> = records.iter().map(|r| r.file_name.as_str()).collect();
        let info = self.file_info().await;

        IndexStats {
            chunks: records.len(),
            files: files.len(),
            dimensions: records.first().map(|r| r.embedding.len()),
            index_bytes: info.map(|i| i.bytes).unwrap_or(0),
            modified_at: info.and_then(|i| i.modified_at),
        }
    }

    // Unique per write so concurrent savers never rename each other's file.
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index.json".to_string());
        self.path
            .with_file_name(format!("{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()))
    }
}
