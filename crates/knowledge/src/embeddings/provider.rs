//! Embedding provider trait and factory.

use super::providers::{
    mock::MockEmbeddingProvider, ollama::OllamaEmbeddingProvider, openai::OpenAiEmbeddingProvider,
};
use ragdesk_core::config::EmbeddingSettings;
use ragdesk_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// One call to `embed_batch` is one remote request. Implementations must
/// return exactly one vector per input, in input order.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Generate embeddings for multiple texts in one request.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;
}

/// Create an embedding provider based on configuration.
///
/// # Errors
/// Returns `AppError::Config` for an unknown provider or a missing OpenAI key.
pub fn create_provider(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let endpoint = settings.endpoint.as_deref();

    match settings.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockEmbeddingProvider::new(settings.mock_dimensions))),

        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(format!(
                    "OpenAI embedding provider requires an API key (set {})",
                    settings.api_key_env
                ))
            })?;
            Ok(Arc::new(OpenAiEmbeddingProvider::new(
                endpoint,
                api_key,
                settings.model(),
            )))
        }

        "ollama" => Ok(Arc::new(OllamaEmbeddingProvider::new(endpoint, settings.model()))),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: mock, openai, ollama",
            settings.provider
        ))),
    }
}
