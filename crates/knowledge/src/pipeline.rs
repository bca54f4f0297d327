//! Process-wide RAG pipeline.
//!
//! [`RagPipeline`] is built once at startup from [`AppConfig`] and shared by
//! every request. It owns the embedding client, the index writer and the
//! answer synthesizer; nothing in this crate keeps global state.

use crate::chunker::chunk_text;
use crate::embeddings::EmbeddingClient;
use crate::parser::extract_text;
use crate::rag::AnswerSynthesizer;
use crate::retrieval::Retriever;
use crate::store::IndexStore;
use crate::types::{AskRequest, AskResponse, ChunkRecord, IndexStats, IngestReport};
use crate::writer::IndexWriter;
use chrono::Utc;
use ragdesk_core::config::ChunkingSettings;
use ragdesk_core::{AppConfig, AppError, AppResult};
use ragdesk_llm::{create_client, LlmClient};
use ragdesk_prompt::{load_templates, PromptBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Subdirectory of the data dir holding template overrides.
const PROMPTS_DIR: &str = "prompts";

/// Ingest and question answering over one index.
pub struct RagPipeline {
    chunking: ChunkingSettings,
    upload_dir: PathBuf,
    embeddings: Arc<EmbeddingClient>,
    store: IndexStore,
    writer: IndexWriter,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl RagPipeline {
    /// Build the configured embedding and completion clients and wire them up.
    ///
    /// API keys are read from the environment variables named in the config.
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let embeddings = Arc::new(EmbeddingClient::from_settings(&config.embedding)?);

        let api_key = AppConfig::resolve_api_key(&config.llm.api_key_env);
        let llm = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            api_key.as_deref(),
        )?;

        Self::new(config, embeddings, llm)
    }

    /// Wire the pipeline around existing clients.
    pub fn new(
        config: &AppConfig,
        embeddings: Arc<EmbeddingClient>,
        llm: Arc<dyn LlmClient>,
    ) -> AppResult<Self> {
        let templates = load_templates(&config.data_dir.join(PROMPTS_DIR))?;
        let prompts = PromptBuilder::new(&templates)?;

        let store = IndexStore::new(config.index_path());
        let writer = IndexWriter::spawn(store.clone());
        let retriever = Retriever::new(Arc::clone(&embeddings), store.clone());
        let synthesizer = AnswerSynthesizer::new(llm, prompts, &config.llm);

        tracing::info!(
            "RAG pipeline ready: index={:?}, embeddings={}/{}",
            store.path(),
            embeddings.provider_name(),
            embeddings.model_name()
        );

        Ok(Self {
            chunking: config.chunking,
            upload_dir: config.upload_dir(),
            embeddings,
            store,
            writer,
            retriever,
            synthesizer,
        })
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Index an uploaded file.
    ///
    /// The bytes are staged under the upload directory for extraction and the
    /// staged file is removed afterwards whatever the outcome. Every call
    /// stages to its own file, so overlapping uploads of one name never share it.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn ingest_upload(&self, bytes: &[u8], file_name: &str) -> AppResult<IngestReport> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let staged = self.upload_dir.join(staged_file_name(
            file_name,
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
        ));

        let extracted = match tokio::fs::write(&staged, bytes).await {
            Ok(()) => read_and_extract(&staged, file_name).await,
            Err(e) => Err(AppError::from(e)),
        };

        match tokio::fs::remove_file(&staged).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove staged upload {:?}: {}", staged, e),
        }

        self.ingest_text(&extracted?, file_name).await
    }

    /// Index raw document bytes.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn ingest_bytes(&self, bytes: &[u8], file_name: &str) -> AppResult<IngestReport> {
        let text = extract_text(bytes, file_name);
        self.ingest_text(&text, file_name).await
    }

    /// Chunk, embed and append already extracted text.
    ///
    /// Nothing is written unless every chunk was embedded.
    pub async fn ingest_text(&self, text: &str, file_name: &str) -> AppResult<IngestReport> {
        if text.trim().is_empty() {
            return Err(AppError::Validation(
                "Could not extract text from file".to_string(),
            ));
        }

        let chunks = chunk_text(text, self.chunking.size, self.chunking.overlap);
        let vectors = self.embeddings.embed_many(&chunks).await?;

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| ChunkRecord::new(file_name, chunk, embedding))
            .collect();
        let added = records.len();

        self.writer.append(records).await?;

        tracing::info!("Ingested {}: {} chunks", file_name, added);

        Ok(IngestReport {
            ok: true,
            file_name: file_name.to_string(),
            chunks: added,
        })
    }

    /// Answer a question from the indexed documents.
    #[instrument(skip(self, request), fields(top_k = request.top_k))]
    pub async fn ask(&self, request: AskRequest) -> AppResult<AskResponse> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Missing question".to_string()));
        }

        let ranked = self.retriever.retrieve(question, request.top_k).await?;
        let answer = self
            .synthesizer
            .answer(question, &ranked, request.allow_general_knowledge)
            .await?;

        Ok(AskResponse {
            answer: answer.text,
            sources: answer.citations,
            used_general_knowledge: request.allow_general_knowledge,
        })
    }

    pub async fn stats(&self) -> IndexStats {
        self.store.stats().await
    }

    /// Drop every record; the way to switch embedding models.
    pub async fn clear(&self) -> AppResult<()> {
        self.writer.clear().await
    }
}

async fn read_and_extract(path: &Path, file_name: &str) -> AppResult<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(extract_text(&bytes, file_name))
}

/// `<millis>_<unique>_<name>` with every character of the name outside
/// `[A-Za-z0-9._-]` replaced.
pub fn staged_file_name(file_name: &str, millis: i64, unique: Uuid) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}_{}", millis, unique.simple(), safe)
}
