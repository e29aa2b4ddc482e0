//! Configuration management for medrag.
//!
//! Configuration is layered, later layers winning:
//! - Built-in defaults
//! - A YAML file (`MEDRAG_CONFIG`, or `./medrag.yaml` when present)
//! - Environment variables
//! - Command-line flags (`with_overrides`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Completion providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["managed", "ollama"];

/// Upper bound for suggested questions; equals the size of the fallback list.
pub const MAX_SUGGESTED_QUESTIONS: usize = 4;

/// Default config file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "medrag.yaml";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file the values were loaded from, if any
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Default completion model identifier
    pub model: String,

    /// Search service settings
    pub search: SearchConfig,

    /// Completion service settings
    pub completion: CompletionConfig,

    /// Credential resolution for the managed services
    pub auth: AuthConfig,

    /// Relational store settings
    pub storage: StorageConfig,

    /// Prompt and suggestion tuning
    pub assistant: AssistantConfig,

    /// Log level override
    #[serde(skip)]
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    #[serde(skip)]
    pub verbose: bool,

    /// Disable colored output
    #[serde(skip)]
    pub no_color: bool,
}

/// Search service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Full URL of the search endpoint
    pub endpoint: String,

    /// Chunks retrieved as prompt context
    pub num_chunks: usize,

    /// Hard cap on chunks per request
    pub max_chunks: usize,

    /// Columns requested from the index
    pub columns: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081/search".to_string(),
            num_chunks: 3,
            max_chunks: 10,
            columns: vec![
                "chunk".to_string(),
                "relative_path".to_string(),
                "category".to_string(),
            ],
        }
    }
}

/// Completion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    /// Provider name ("managed" or "ollama")
    pub provider: String,

    /// Endpoint override; each provider has its own default
    pub endpoint: Option<String>,

    /// Request timeout applied at the HTTP boundary
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "managed".to_string(),
            endpoint: None,
            timeout_secs: 60,
        }
    }
}

/// Credential resolution settings.
///
/// Secrets themselves never live in the config file, only the names of the
/// environment variables holding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    /// Environment variable holding a ready bearer token
    pub token_env: String,

    /// Token exchange URL; when set, username/password are traded for a token
    pub token_url: Option<String>,

    /// Environment variable holding the exchange username
    pub username_env: String,

    /// Environment variable holding the exchange password
    pub password_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: "MEDRAG_API_TOKEN".to_string(),
            token_url: None,
            username_env: "MEDRAG_USER".to_string(),
            password_env: "MEDRAG_PASSWORD".to_string(),
        }
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// SQLite database holding chat history and document chunks
    pub database_path: PathBuf,

    /// Create the history table when it is missing
    pub create_history_table: bool,

    /// Delete turns older than this many days; `None` keeps everything
    pub history_retention_days: Option<u32>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("medrag.sqlite"),
            create_history_table: true,
            history_retention_days: None,
        }
    }
}

/// Prompt assembly and suggestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantConfig {
    /// Suggested follow-up questions returned per answer
    pub min_suggested_questions: usize,

    /// Prior turns embedded in the prompt
    pub history_turns: usize,

    /// Chunk rows scanned when mining questions
    pub question_scan_limit: usize,

    /// Directory with YAML prompt template overrides
    pub prompts_dir: Option<PathBuf>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            min_suggested_questions: MAX_SUGGESTED_QUESTIONS,
            history_turns: 3,
            question_scan_limit: 50,
            prompts_dir: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    model: Option<String>,
    search: Option<SearchConfig>,
    completion: Option<CompletionConfig>,
    auth: Option<AuthConfig>,
    storage: Option<StorageConfig>,
    assistant: Option<AssistantConfig>,
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
            config_file: None,
            model: "llama3.3-70b".to_string(),
            search: SearchConfig::default(),
            completion: CompletionConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            assistant: AssistantConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, a YAML file and the environment.
    ///
    /// The file is `config_file` when given, else `MEDRAG_CONFIG`, else
    /// `./medrag.yaml` if it exists. An explicitly named file must exist.
    ///
    /// Environment variables:
    /// - `MEDRAG_MODEL`: Completion model
    /// - `MEDRAG_SEARCH_ENDPOINT`: Search endpoint URL
    /// - `MEDRAG_COMPLETION_PROVIDER`: Completion provider
    /// - `MEDRAG_COMPLETION_ENDPOINT`: Completion endpoint URL
    /// - `MEDRAG_DATABASE`: SQLite database path
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit =
            config_file.or_else(|| std::env::var("MEDRAG_CONFIG").ok().map(PathBuf::from));

        let config_path = match explicit {
            Some(path) if !path.exists() => {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
            Some(path) => Some(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_path {
            config = config.merge_yaml(&path)?;
            config.config_file = Some(path);
        }

        config.apply_env();

        Ok(config)
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

        if let Some(model) = config_file.model {
            result.model = model;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(completion) = config_file.completion {
            result.completion = completion;
        }
        if let Some(auth) = config_file.auth {
            result.auth = auth;
        }
        if let Some(storage) = config_file.storage {
            result.storage = storage;
        }
        if let Some(assistant) = config_file.assistant {
            result.assistant = assistant;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Environment variables override the YAML config.
    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("MEDRAG_MODEL") {
            self.model = model;
        }

        if let Ok(endpoint) = std::env::var("MEDRAG_SEARCH_ENDPOINT") {
            self.search.endpoint = endpoint;
        }

        if let Ok(provider) = std::env::var("MEDRAG_COMPLETION_PROVIDER") {
            self.completion.provider = provider;
        }

        if let Ok(endpoint) = std::env::var("MEDRAG_COMPLETION_ENDPOINT") {
            self.completion.endpoint = Some(endpoint);
        }

        if let Ok(database) = std::env::var("MEDRAG_DATABASE") {
            self.storage.database_path = PathBuf::from(database);
        }

        if self.log_level.is_none() {
            self.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the file and environment.
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(model) = model {
            self.model = model;
        }

        let explicit_level = log_level.is_some();
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if !explicit_level {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate the configuration before any service is contacted.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.completion.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown completion provider: {}. Supported: {}",
                self.completion.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::Config("Model name cannot be empty".to_string()));
        }

        if self.search.endpoint.trim().is_empty() {
            return Err(AppError::Config(
                "Search endpoint cannot be empty".to_string(),
            ));
        }

        if self.search.max_chunks == 0 {
            return Err(AppError::Config(
                "search.maxChunks must be at least 1".to_string(),
            ));
        }

        if self.search.num_chunks == 0 || self.search.num_chunks > self.search.max_chunks {
            return Err(AppError::Config(format!(
                "search.numChunks must be between 1 and {} (got {})",
                self.search.max_chunks, self.search.num_chunks
            )));
        }

        let suggested = self.assistant.min_suggested_questions;
        if suggested == 0 || suggested > MAX_SUGGESTED_QUESTIONS {
            return Err(AppError::Config(format!(
                "assistant.minSuggestedQuestions must be between 1 and {} (got {})",
                MAX_SUGGESTED_QUESTIONS, suggested
            )));
        }

        if self.assistant.question_scan_limit == 0 {
            return Err(AppError::Config(
                "assistant.questionScanLimit must be at least 1".to_string(),
            ));
        }

        if self.completion.timeout_secs == 0 {
            return Err(AppError::Config(
                "completion.timeoutSecs must be at least 1".to_string(),
            ));
        }

        if self.storage.history_retention_days == Some(0) {
            return Err(AppError::Config(
                "storage.historyRetentionDays must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model, "llama3.3-70b");
        assert_eq!(config.search.num_chunks, 3);
        assert_eq!(config.search.max_chunks, 10);
        assert_eq!(config.assistant.min_suggested_questions, 4);
        assert_eq!(config.assistant.history_turns, 3);
        assert_eq!(config.assistant.question_scan_limit, 50);
        assert_eq!(config.storage.history_retention_days, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            Some("mistral-large2".to_string()),
            None,
            true,
            true,
        );

        assert_eq!(overridden.model, "mistral-large2");
        assert!(overridden.verbose);
        assert!(overridden.no_color);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_log_level_flag_beats_verbose() {
        let overridden = AppConfig::default().with_overrides(
            None,
            Some("warn".to_string()),
            true,
            false,
        );

        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("warn".to_string()));
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("medrag.yaml");
        fs::write(
            &path,
            r#"
model: snowflake-arctic
search:
  numChunks: 5
storage:
  databasePath: /tmp/history.sqlite
  historyRetentionDays: 30
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.model, "snowflake-arctic");
        assert_eq!(merged.search.num_chunks, 5);
        // Unspecified fields of a section keep their defaults
        assert_eq!(merged.search.max_chunks, 10);
        assert_eq!(merged.search.columns.len(), 3);
        assert_eq!(
            merged.storage.database_path,
            PathBuf::from("/tmp/history.sqlite")
        );
        assert_eq!(merged.storage.history_retention_days, Some(30));
        assert!(merged.storage.create_history_table);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        fs::write(&path, "search: [not, a, map").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = AppConfig::load(Some(PathBuf::from("/definitely/not/here.yaml")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.completion.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_chunk_bounds() {
        let mut config = AppConfig::default();
        config.search.num_chunks = 11;
        assert!(config.validate().is_err());

        config.search.num_chunks = 0;
        assert!(config.validate().is_err());

        config.search.num_chunks = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_suggestion_bounds() {
        let mut config = AppConfig::default();
        config.assistant.min_suggested_questions = 5;
        assert!(config.validate().is_err());

        config.assistant.min_suggested_questions = 0;
        assert!(config.validate().is_err());

        config.assistant.min_suggested_questions = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_retention() {
        let mut config = AppConfig::default();
        config.storage.history_retention_days = Some(0);
        assert!(config.validate().is_err());

        config.storage.history_retention_days = Some(90);
        assert!(config.validate().is_ok());
    }
}
