use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for GraphCheck
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphCheckConfig {
    /// Graph store backend and location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Repository ingest settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Script validation settings
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Graph store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend: "rocksdb" or "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Database directory for the rocksdb backend
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            db_path: default_db_path(),
        }
    }
}

/// Repository ingest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of parallel parse workers
    #[serde(default = "default_ingest_workers")]
    pub workers: usize,

    /// Files larger than this are skipped and listed in the ingest result
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_ingest_workers(),
            max_file_size_bytes: default_max_file_size(),
        }
    }
}

/// Script validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Upper bound on concurrent graph lookups
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// Maximum edit distance for a name to count as a suggestion
    #[serde(default = "default_fuzzy_max_distance")]
    pub fuzzy_max_distance: usize,

    /// Maximum number of suggestions per unknown symbol
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: default_max_concurrent_lookups(),
            fuzzy_max_distance: default_fuzzy_max_distance(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_storage_backend() -> String {
    "rocksdb".to_string()
}
fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".graphcheck")
        .join("graph.db")
}
fn default_ingest_workers() -> usize {
    num_cpus::get().min(8)
}
fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}
fn default_max_concurrent_lookups() -> usize {
    10
}
fn default_fuzzy_max_distance() -> usize {
    2
}
fn default_max_suggestions() -> usize {
    3
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with layered loading
pub struct ConfigManager {
    config: GraphCheckConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (including a .env file)
    /// 2. Config file (.graphcheck.toml or ~/.graphcheck/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match &config_path {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => info!("No config file found, using defaults"),
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenvy::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".graphcheck.env");
            if home_env.exists() {
                if let Err(e) = dotenvy::from_path(&home_env) {
                    warn!("Failed to load .graphcheck.env: {}", e);
                }
            }
        }
    }

    /// Search order:
    /// 1. ./.graphcheck.toml (current directory)
    /// 2. ~/.graphcheck/config.toml (user config)
    /// 3. Defaults
    fn load_config_file() -> Result<(GraphCheckConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".graphcheck.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".graphcheck").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((GraphCheckConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<GraphCheckConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config: GraphCheckConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    fn apply_env_overrides(mut config: GraphCheckConfig) -> GraphCheckConfig {
        if let Ok(backend) = std::env::var("GRAPHCHECK_STORE") {
            config.storage.backend = backend;
        }
        if let Ok(path) = std::env::var("GRAPHCHECK_DB_PATH") {
            config.storage.db_path = PathBuf::from(path);
        }
        if let Ok(workers) = std::env::var("GRAPHCHECK_INGEST_WORKERS") {
            if let Ok(n) = workers.parse() {
                config.ingest.workers = n;
            }
        }
        if let Ok(size) = std::env::var("GRAPHCHECK_MAX_FILE_SIZE") {
            if let Ok(bytes) = size.parse() {
                config.ingest.max_file_size_bytes = bytes;
            }
        }
        if let Ok(lookups) = std::env::var("GRAPHCHECK_MAX_CONCURRENT_LOOKUPS") {
            if let Ok(n) = lookups.parse() {
                config.validator.max_concurrent_lookups = n;
            }
        }
        if let Ok(distance) = std::env::var("GRAPHCHECK_FUZZY_MAX_DISTANCE") {
            if let Ok(d) = distance.parse() {
                config.validator.fuzzy_max_distance = d;
            }
        }
        if let Ok(count) = std::env::var("GRAPHCHECK_MAX_SUGGESTIONS") {
            if let Ok(n) = count.parse() {
                config.validator.max_suggestions = n;
            }
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }

        config
    }

    fn validate_config(config: &GraphCheckConfig) -> Result<(), ConfigError> {
        match config.storage.backend.as_str() {
            "rocksdb" | "memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid storage backend: {}. Must be one of: rocksdb, memory",
                    other
                )))
            }
        }

        if config.ingest.workers == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.workers must be at least 1".to_string(),
            ));
        }

        if config.validator.max_concurrent_lookups == 0 {
            return Err(ConfigError::ValidationError(
                "validator.max_concurrent_lookups must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn config(&self) -> &GraphCheckConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write a default config file, creating parent directories as needed.
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = GraphCheckConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphCheckConfig::default();
        assert_eq!(config.storage.backend, "rocksdb");
        assert_eq!(config.validator.fuzzy_max_distance, 2);
        assert_eq!(config.validator.max_suggestions, 3);
        assert!(config.ingest.workers >= 1);
    }

    #[test]
    fn test_config_validation() {
        let config = GraphCheckConfig::default();
        assert!(ConfigManager::validate_config(&config).is_ok());

        let mut bad_config = config.clone();
        bad_config.storage.backend = "neo4j".to_string();
        assert!(ConfigManager::validate_config(&bad_config).is_err());

        let mut bad_workers = GraphCheckConfig::default();
        bad_workers.ingest.workers = 0;
        assert!(ConfigManager::validate_config(&bad_workers).is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: GraphCheckConfig =
            toml::from_str("[validator]\nfuzzy_max_distance = 1\n").unwrap();
        assert_eq!(parsed.validator.fuzzy_max_distance, 1);
        assert_eq!(parsed.validator.max_suggestions, 3);
        assert_eq!(parsed.storage.backend, "rocksdb");
    }

    #[test]
    fn test_default_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        ConfigManager::create_default_config(&path).unwrap();
        let loaded = ConfigManager::read_toml_file(&path).unwrap();
        assert_eq!(loaded.storage.backend, "rocksdb");
        assert_eq!(
            loaded.validator.max_concurrent_lookups,
            GraphCheckConfig::default().validator.max_concurrent_lookups
        );

        std::fs::write(&path, "[storage\nbackend = ").unwrap();
        assert!(ConfigManager::read_toml_file(&path).is_err());
    }
}
