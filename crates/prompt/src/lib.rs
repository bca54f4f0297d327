//! Prompt assembly for Ragdesk answers.
//!
//! This crate provides:
//! - The system and user templates used for grounded answers
//! - Handlebars rendering with the persona, retrieved context and question
//! - An optional YAML override of the templates under the data directory

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::PromptBuilder;
pub use loader::{load_templates, TEMPLATES_FILE};
pub use types::{BuiltPrompt, PromptTemplates};
