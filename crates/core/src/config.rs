//! Configuration management for Ragdesk.
//!
//! This module handles loading and merging configuration from multiple sources,
//! lowest precedence first:
//! - Built-in defaults
//! - Config file (`<data_dir>/config.yaml` or an explicit path)
//! - Environment variables
//! - Command-line flags
//!
//! All runtime state (index, temporary uploads) lives under the data directory
//! unless a path is overridden explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Completion providers the LLM crate can build.
pub const KNOWN_LLM_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Embedding providers the knowledge crate can build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the index, temporary uploads and config.yaml
    pub data_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Explicit index file location (defaults to `<data_dir>/index.json`)
    pub index_path: Option<PathBuf>,

    /// Explicit upload scratch directory (defaults to `<data_dir>/uploads`)
    pub upload_dir: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub server: ServerConfig,

    pub llm: LlmSettings,

    pub embedding: EmbeddingSettings,

    pub chunking: ChunkingSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "127.0.0.1:8080"
    pub bind: String,

    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            cors_origins: Vec::new(),
            max_upload_bytes: 15 * 1024 * 1024,
        }
    }
}

/// Completion model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// Provider name ("openai", "ollama")
    pub provider: String,

    /// Custom endpoint; provider default when absent
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Chat model identifier
    pub model: String,

    /// Sampling temperature for grounded answers
    pub temperature: f32,

    /// Persona sentence opening the system instruction
    pub persona: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            persona: "You are a medical assistant. Answer succinctly and factually in 4-8 sentences."
                .to_string(),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name ("openai", "ollama", "mock")
    pub provider: String,

    /// Embedding model identifier; the provider's default when absent
    pub model: Option<String>,

    /// Custom endpoint; provider default when absent
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Texts sent per remote call when embedding many chunks
    pub batch_size: usize,

    /// Embedding calls allowed in flight across the whole process
    pub max_concurrent_batches: usize,

    /// Vector length produced by the mock provider
    pub mock_dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            batch_size: 32,
            max_concurrent_batches: 1,
            mock_dimensions: 384,
        }
    }
}

impl EmbeddingSettings {
    /// Configured model, or the default of the configured provider.
    pub fn model(&self) -> &str {
        match &self.model {
            Some(model) => model,
            None => match self.provider.to_lowercase().as_str() {
                "ollama" => "nomic-embed-text",
                "mock" => "trigram-v1",
                _ => "text-embedding-3-small",
            },
        }
    }
}

/// Chunking parameters used on the ingest path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkingSettings {
    /// Window size in characters (clamped to a floor by the chunker)
    pub size: usize,

    /// Characters shared by consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            size: 350,
            overlap: 60,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    index_path: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
    server: Option<ServerConfig>,
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    chunking: Option<ChunkingSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ragdesk"),
            config_file: None,
            index_path: None,
            upload_dir: None,
            log_level: None,
            verbose: false,
            no_color: false,
            server: ServerConfig::default(),
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            chunking: ChunkingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment and defaults.
    ///
    /// Environment variables:
    /// - `RAGDESK_DATA_DIR`: data directory
    /// - `RAGDESK_CONFIG`: path to config file
    /// - `RAGDESK_INDEX_PATH`: index file location
    /// - `RAGDESK_UPLOAD_DIR`: upload scratch directory
    /// - `RAGDESK_BIND`: server bind address
    /// - `RAGDESK_CORS_ORIGIN`: comma-separated allowed origins
    /// - `RAGDESK_LLM_PROVIDER`, `RAGDESK_LLM_MODEL`
    /// - `RAGDESK_EMBEDDING_PROVIDER`, `RAGDESK_EMBEDDING_MODEL`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ragdesk_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {:?}", config.index_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with_env(|key| std::env::var(key).ok())
    }

    /// Load configuration reading variables through `env`.
    pub fn load_with_env<F>(env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(data_dir) = env("RAGDESK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Some(config_file) = env("RAGDESK_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = config.config_path();
        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Some(path) = env("RAGDESK_INDEX_PATH") {
            config.index_path = Some(PathBuf::from(path));
        }

        if let Some(dir) = env("RAGDESK_UPLOAD_DIR") {
            config.upload_dir = Some(PathBuf::from(dir));
        }

        if let Some(bind) = env("RAGDESK_BIND") {
            config.server.bind = bind;
        }

        if let Some(origins) = env("RAGDESK_CORS_ORIGIN") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(provider) = env("RAGDESK_LLM_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Some(model) = env("RAGDESK_LLM_MODEL") {
            config.llm.model = model;
        }

        if let Some(provider) = env("RAGDESK_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Some(model) = env("RAGDESK_EMBEDDING_MODEL") {
            config.embedding.model = Some(model);
        }

        if let Some(level) = env("RUST_LOG") {
            config.log_level = Some(level);
        }

        if env("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Path of the YAML file consulted by [`AppConfig::load`].
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("config.yaml"))
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(data_dir) = config_file.data_dir {
            result.data_dir = data_dir;
        }
        if let Some(index_path) = config_file.index_path {
            result.index_path = Some(index_path);
        }
        if let Some(upload_dir) = config_file.upload_dir {
            result.upload_dir = Some(upload_dir);
        }
        if let Some(server) = config_file.server {
            result.server = server;
        }
        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and YAML.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Location of the persisted vector index.
    pub fn index_path(&self) -> PathBuf {
        self.index_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("index.json"))
    }

    /// Scratch directory for uploaded files awaiting extraction.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create data directory {:?}: {}",
                    self.data_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Resolve an API key from the named environment variable.
    pub fn resolve_api_key(env_var: &str) -> Option<String> {
        std::env::var(env_var).ok().filter(|key| !key.trim().is_empty())
    }

    /// Validate provider names and numeric limits.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batchSize must be at least 1".to_string(),
            ));
        }

        if self.embedding.max_concurrent_batches == 0 {
            return Err(AppError::Config(
                "embedding.maxConcurrentBatches must be at least 1".to_string(),
            ));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(AppError::Config(
                "server.maxUploadBytes must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.embedding.model(), "text-embedding-3-small");
        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.chunking.size, 350);
        assert_eq!(config.chunking.overlap, 60);
        assert_eq!(config.server.max_upload_bytes, 15 * 1024 * 1024);
        assert!(config.index_path().ends_with("index.json"));
        assert!(config.upload_dir().ends_with("uploads"));
    }

    #[test]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with_env(env_from(&[
            ("RAGDESK_DATA_DIR", data_dir.as_str()),
            ("RAGDESK_INDEX_PATH", "/tmp/rag/index.json"),
            ("RAGDESK_CORS_ORIGIN", "https://a.example, ,https://b.example"),
            ("RAGDESK_EMBEDDING_PROVIDER", "mock"),
            ("NO_COLOR", "1"),
        ]))
        .unwrap();

        assert_eq!(config.index_path(), PathBuf::from("/tmp/rag/index.json"));
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.embedding.provider, "mock");
        assert!(config.no_color);
    }

    #[test]
    fn test_yaml_then_env_precedence() {
        let temp = TempDir::new().unwrap();
        let yaml = r#"
llm:
  provider: ollama
  model: llama3.2
  temperature: 0.1
embedding:
  provider: mock
  batchSize: 8
chunking:
  size: 500
logging:
  level: warn
  color: false
"#;
        std::fs::write(temp.path().join("config.yaml"), yaml).unwrap();
        let data_dir = temp.path().to_string_lossy().to_string();

        let config = AppConfig::load_with_env(env_from(&[
            ("RAGDESK_DATA_DIR", data_dir.as_str()),
            ("RAGDESK_LLM_MODEL", "llama3.1"),
        ]))
        .unwrap();

        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3.1");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.embedding.batch_size, 8);
        assert_eq!(config.embedding.max_concurrent_batches, 1);
        assert_eq!(config.chunking.size, 500);
        assert_eq!(config.chunking.overlap, 60);
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert!(config.no_color);
    }

    #[test]
    fn test_embedding_model_follows_provider() {
        let config = AppConfig::load_with_env(env_from(&[(
            "RAGDESK_EMBEDDING_PROVIDER",
            "ollama",
        )]))
        .unwrap();
        assert_eq!(config.embedding.model(), "nomic-embed-text");

        let config = AppConfig::load_with_env(env_from(&[
            ("RAGDESK_EMBEDDING_PROVIDER", "ollama"),
            ("RAGDESK_EMBEDDING_MODEL", "mxbai-embed-large"),
        ]))
        .unwrap();
        assert_eq!(config.embedding.model(), "mxbai-embed-large");

        let yaml: EmbeddingSettings = serde_yaml::from_str("provider: ollama\n").unwrap();
        assert_eq!(yaml.model(), "nomic-embed-text");
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let result = AppConfig::load_with_env(env_from(&[(
            "RAGDESK_CONFIG",
            "/nonexistent/ragdesk.yaml",
        )]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("/srv/ragdesk")),
            None,
            true,
            false,
        );

        assert_eq!(config.data_dir, PathBuf::from("/srv/ragdesk"));
        assert_eq!(config.index_path(), PathBuf::from("/srv/ragdesk/index.json"));
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.embedding.provider = "gguf".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_limits() {
        let mut config = AppConfig::default();
        config.embedding.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.embedding.max_concurrent_batches = 0;
        assert!(config.validate().is_err());

        assert!(AppConfig::default().validate().is_ok());
    }
}
