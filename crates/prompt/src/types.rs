//! Prompt template types.

use serde::{Deserialize, Serialize};

/// Default system template.
///
/// The general-knowledge toggle switches between the permissive and the
/// documents-only rule.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "{{persona}}\n\
Use the DOCUMENT CONTEXT as the primary source of truth.\n\
{{#if allowGeneralKnowledge}}You MAY add general knowledge if it does not conflict with the documents.{{else}}Do NOT use any knowledge outside the DOCUMENT CONTEXT.{{/if}}\n\
Cite statements grounded in the documents with [1], [2], etc.";

/// Default user template.
pub const DEFAULT_USER_TEMPLATE: &str = "DOCUMENT CONTEXT:\n{{context}}\n\nQUESTION:\n{{question}}";

/// Handlebars sources for the two answer messages.
///
/// Both templates see the variables `persona`, `context`, `question` and
/// `allowGeneralKnowledge`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    /// Template for the system message
    pub system: String,

    /// Template for the user message
    pub user: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_TEMPLATE.to_string(),
            user: DEFAULT_USER_TEMPLATE.to_string(),
        }
    }
}

/// A fully rendered prompt ready for the completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message
    pub system: String,

    /// User message
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_default_user_template() {
        let yaml = "system: \"{{persona}} Answer in one sentence.\"\n";
        let templates: PromptTemplates = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(templates.system, "{{persona}} Answer in one sentence.");
        assert_eq!(templates.user, DEFAULT_USER_TEMPLATE);
    }

    #[test]
    fn test_default_system_template_mentions_citations() {
        let templates = PromptTemplates::default();
        assert!(templates.system.starts_with("{{persona}}\n"));
        assert!(templates.system.contains("[1], [2]"));
    }
}
