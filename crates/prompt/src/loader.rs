//! Loader for the optional template override file.

use crate::types::PromptTemplates;
use ragdesk_core::{AppError, AppResult};
use std::path::Path;

/// File name of the override, relative to the prompts directory.
pub const TEMPLATES_FILE: &str = "answer.yaml";

/// Load answer templates from `<prompts_dir>/answer.yaml`.
///
/// A missing file yields the built-in templates. Keys absent from the file
/// keep their defaults.
///
/// # Errors
/// Returns `AppError::Prompt` if the file exists but cannot be read or parsed.
pub fn load_templates(prompts_dir: &Path) -> AppResult<PromptTemplates> {
    let path = prompts_dir.join(TEMPLATES_FILE);

    if !path.exists() {
        tracing::debug!("No template override at {:?}, using defaults", path);
        return Ok(PromptTemplates::default());
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        AppError::Prompt(format!("Failed to read template file {:?}: {}", path, e))
    })?;

    let templates: PromptTemplates = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse template YAML {:?}: {}", path, e))
    })?;

    if templates.system.trim().is_empty() || templates.user.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Template file {:?} has an empty template",
            path
        )));
    }

    tracing::info!("Loaded answer templates from {:?}", path);

    Ok(templates)
}
