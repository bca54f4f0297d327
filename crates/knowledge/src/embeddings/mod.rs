//! Embedding client with batching and a concurrency limit.
//!
//! Every vector in the system, for chunks and for queries alike, comes from
//! [`EmbeddingClient::embed_many`]. Large inputs are split into batches sent
//! one after another, and each batch holds a permit from a shared semaphore
//! while its request is in flight, so concurrent uploads cannot flood the
//! remote API.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use ragdesk_core::config::EmbeddingSettings;
use ragdesk_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::instrument;

/// Batching embedding client shared by the whole process.
#[derive(Debug)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    limiter: Semaphore,
}

impl EmbeddingClient {
    /// Wrap a provider.
    ///
    /// `batch_size` and `max_concurrent_batches` are raised to at least 1.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
        max_concurrent_batches: usize,
    ) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            limiter: Semaphore::new(max_concurrent_batches.max(1)),
        }
    }

    /// Build the configured provider, reading its API key from the environment.
    pub fn from_settings(settings: &EmbeddingSettings) -> AppResult<Self> {
        let api_key = AppConfig::resolve_api_key(&settings.api_key_env);
        let provider = create_provider(settings, api_key.as_deref())?;

        tracing::debug!(
            "Embedding client: provider={}, model={}, batch_size={}, max_concurrent_batches={}",
            provider.provider_name(),
            provider.model_name(),
            settings.batch_size,
            settings.max_concurrent_batches
        );

        Ok(Self::new(
            provider,
            settings.batch_size,
            settings.max_concurrent_batches,
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Embed texts, one vector per input, in input order.
    ///
    /// Any failed batch fails the whole call and vectors from earlier batches
    /// are discarded. Empty input returns immediately without a remote call.
    #[instrument(skip(self, texts), fields(count = texts.len(), provider = %self.provider.provider_name()))]
    pub async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            let _permit = self
                .limiter
                .acquire()
                .await
                .map_err(|_| AppError::Embedding("Embedding limiter closed".to_string()))?;

            let batch_vectors = self.provider.embed_batch(batch).await?;
            if batch_vectors.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Provider returned {} vectors for a batch of {}",
                    batch_vectors.len(),
                    batch.len()
                )));
            }

            tracing::debug!(batch = batch_index, size = batch.len(), "Embedded batch");
            vectors.extend(batch_vectors);
        }

        check_dimensions(&vectors)?;

        Ok(vectors)
    }

    /// Embed a single text; the first result of a one-element `embed_many`.
    pub async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed_many(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// All vectors from one call must share a non-zero length.
fn check_dimensions(vectors: &[Vec<f32>]) -> AppResult<()> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };

    let dimensions = first.len();
    if dimensions == 0 {
        return Err(AppError::Embedding(
            "Provider returned an empty vector".to_string(),
        ));
    }

    if let Some(other) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(AppError::Embedding(format!(
            "Inconsistent embedding dimensions: {} and {}",
            dimensions,
            other.len()
        )));
    }

    Ok(())
}
