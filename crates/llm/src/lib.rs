//! LLM integration crate for Ragdesk.
//!
//! This crate provides a provider-agnostic abstraction for chat completions.
//! Answer synthesis talks to the model exclusively through [`LlmClient`].
//!
//! # Providers
//! - **OpenAI-compatible**: `/chat/completions` (default)
//! - **Ollama**: local runtime via `/api/generate`
//!
//! # Example
//! ```no_run
//! use ragdesk_llm::{LlmClient, LlmRequest, providers::OpenAiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new("sk-...");
//! let request = LlmRequest::new("Hello, world!", "gpt-4o-mini").with_system("Be brief.");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
