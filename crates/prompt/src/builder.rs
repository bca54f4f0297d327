//! Prompt builder for rendering the answer templates.

use crate::types::{BuiltPrompt, PromptTemplates};
use handlebars::Handlebars;
use ragdesk_core::{AppError, AppResult};

const SYSTEM_TEMPLATE: &str = "system";
const USER_TEMPLATE: &str = "user";

/// Renders the system and user messages for one question.
///
/// Templates are compiled once at construction. Rendering is strict, so a
/// template that references an unknown variable fails instead of silently
/// producing an empty string.
pub struct PromptBuilder {
    registry: Handlebars<'static>,
}

impl PromptBuilder {
    /// Compile the given templates.
    ///
    /// # Errors
    /// Returns `AppError::Prompt` if either template fails to parse.
    pub fn new(templates: &PromptTemplates) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text output, retrieved chunks must reach the model unchanged
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        registry
            .register_template_string(SYSTEM_TEMPLATE, &templates.system)
            .map_err(|e| AppError::Prompt(format!("Failed to register system template: {}", e)))?;
        registry
            .register_template_string(USER_TEMPLATE, &templates.user)
            .map_err(|e| AppError::Prompt(format!("Failed to register user template: {}", e)))?;

        Ok(Self { registry })
    }

    /// Builder with the built-in templates.
    pub fn with_defaults() -> AppResult<Self> {
        Self::new(&PromptTemplates::default())
    }

    /// Render both messages.
    ///
    /// # Arguments
    /// * `persona` - Opening line of the system message
    /// * `context` - Numbered retrieval context
    /// * `question` - The user's question, already trimmed
    /// * `allow_general_knowledge` - Selects the permissive or documents-only rule
    pub fn build(
        &self,
        persona: &str,
        context: &str,
        question: &str,
        allow_general_knowledge: bool,
    ) -> AppResult<BuiltPrompt> {
        let data = serde_json::json!({
            "persona": persona,
            "context": context,
            "question": question,
            "allowGeneralKnowledge": allow_general_knowledge,
        });

        let system = self
            .registry
            .render(SYSTEM_TEMPLATE, &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render system template: {}", e)))?;
        let user = self
            .registry
            .render(USER_TEMPLATE, &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render user template: {}", e)))?;

        tracing::debug!(
            system_chars = system.len(),
            user_chars = user.len(),
            allow_general_knowledge,
            "Built answer prompt"
        );

        Ok(BuiltPrompt { system, user })
    }
}
