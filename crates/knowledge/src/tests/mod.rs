//! End-to-end scenarios for ingest, retrieval and answering.

mod concurrency;

use crate::embeddings::providers::mock::MockEmbeddingProvider;
use crate::embeddings::{EmbeddingClient, EmbeddingProvider};
use crate::pipeline::RagPipeline;
use ragdesk_core::{AppConfig, AppError, AppResult};
use ragdesk_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Mock embeddings that count remote calls and can be told to fail.
#[derive(Debug)]
pub(crate) struct CountingProvider {
    inner: MockEmbeddingProvider,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingProvider {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MockEmbeddingProvider::new(128),
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            inner: MockEmbeddingProvider::new(128),
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingProvider {
    fn provider_name(&self) -> &str {
        "counting"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Embedding("Embedding API error (503)".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

/// Completion model that always answers the same and records prompts.
pub(crate) struct CannedLlm {
    pub(crate) requests: Mutex<Vec<LlmRequest>>,
}

impl CannedLlm {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for CannedLlm {
    fn provider_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(LlmResponse {
            content: "The documents say so [1].".to_string(),
            model: request.model.clone(),
            usage: LlmUsage::new(100, 7),
        })
    }
}

/// Config rooted in a fresh temporary data directory.
pub(crate) fn temp_config() -> (TempDir, AppConfig) {
    let temp = TempDir::new().unwrap();
    let config = AppConfig {
        data_dir: temp.path().to_path_buf(),
        ..AppConfig::default()
    };
    (temp, config)
}

pub(crate) fn pipeline_with(
    config: &AppConfig,
    provider: Arc<CountingProvider>,
    llm: Arc<CannedLlm>,
) -> RagPipeline {
    let embeddings = Arc::new(EmbeddingClient::new(provider, 32, 1));
    RagPipeline::new(config, embeddings, llm).unwrap()
}

/// `len` characters cycling through the alphabet, no whitespace.
pub(crate) fn alphabet_text(len: usize) -> String {
    (0..len)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect()
}
