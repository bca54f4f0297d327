//! Core types for the document index and the ask/ingest boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rag::Citation;

/// Default number of passages retrieved per question.
pub const DEFAULT_TOP_K: i64 = 5;

/// One retrievable passage as persisted in the index file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier (UUID v4), assigned at ingest
    pub id: String,

    /// Original upload name, shown in citations
    #[serde(rename = "fileName")]
    pub file_name: String,

    /// Passage text, never empty
    #[serde(rename = "chunk")]
    pub text: String,

    /// Embedding vector; same length for every record in one index
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Create a record with a fresh identifier.
    pub fn new(file_name: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            text: text.into(),
            embedding,
        }
    }
}

/// A record paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    pub score: f32,
}

/// Result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub ok: bool,
    pub file_name: String,
    pub chunks: usize,
}

/// A question submitted for a grounded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    /// Question text; blank is rejected
    #[serde(default)]
    pub question: String,

    /// Requested passage count, clamped to `[1, 10]`
    #[serde(default = "default_top_k")]
    pub top_k: i64,

    /// Whether the model may add knowledge beyond the documents
    #[serde(default = "default_allow_general", alias = "allowGeneral")]
    pub allow_general_knowledge: bool,
}

fn default_top_k() -> i64 {
    DEFAULT_TOP_K
}

fn default_allow_general() -> bool {
    true
}

impl AskRequest {
    /// Question with the default retrieval settings.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: DEFAULT_TOP_K,
            allow_general_knowledge: true,
        }
    }

    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_general_knowledge(mut self, allow: bool) -> Self {
        self.allow_general_knowledge = allow;
        self
    }
}

/// Grounded answer with its ranked sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<Citation>,
    pub used_general_knowledge: bool,
}

/// Summary of the persisted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Number of chunk records
    pub chunks: usize,

    /// Number of distinct source file names
    pub files: usize,

    /// Embedding length, absent for an empty index
    pub dimensions: Option<usize>,

    /// Size of the index file on disk
    pub index_bytes: u64,

    /// Last modification time of the index file
    pub modified_at: Option<DateTime<Utc>>,
}
