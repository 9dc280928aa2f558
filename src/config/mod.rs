//! Configuration management for reelvibe
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! Environment variables override file values so deployments can tune the
//! serving engine without editing the config.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Social feed configuration
    #[serde(default)]
    pub feeds: FeedConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Query/ranking configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Social feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Subreddits to harvest suggestion threads from
    #[serde(default = "default_feed_subreddits")]
    pub subreddits: Vec<String>,

    /// Number of hot posts fetched per feed
    #[serde(default = "default_feed_post_limit")]
    pub post_limit: u32,

    /// Minimum post score for a post to be ingested
    #[serde(default = "default_post_score_threshold")]
    pub post_score_threshold: i64,

    /// Minimum comment score for a suggestion to count
    #[serde(default = "default_comment_score_threshold")]
    pub comment_score_threshold: i64,

    /// User agent string for feed requests
    #[serde(default = "default_feed_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// HTTP embedding backend URL
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,
}

/// Query/ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of similar posts whose suggestions are aggregated per query
    #[serde(default = "default_similar_post_count")]
    pub similar_post_count: usize,

    /// Maximum number of catalog results returned
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Catalog identifier served over HTTP
    #[serde(default = "default_catalog_id")]
    pub catalog_id: String,

    /// Addon identifier reported in the manifest
    #[serde(default = "default_addon_id")]
    pub addon_id: String,

    /// Addon display name reported in the manifest
    #[serde(default = "default_addon_name")]
    pub addon_name: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:7000"
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for reelvibe data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to the recommendations (suggestion store) database
    pub recs_db_file: PathBuf,

    /// Path to the read-only reference catalog database
    pub catalog_db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: FeedConfig::default(),
            embedding: EmbeddingConfig::default(),
            query: QueryConfig::default(),
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            subreddits: default_feed_subreddits(),
            post_limit: default_feed_post_limit(),
            post_score_threshold: default_post_score_threshold(),
            comment_score_threshold: default_comment_score_threshold(),
            user_agent: default_feed_user_agent(),
            timeout_secs: default_feed_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_embedding_batch_size(),
            backend_url: default_embedding_backend_url(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            similar_post_count: default_similar_post_count(),
            max_results: default_max_results(),
            catalog_id: default_catalog_id(),
            addon_id: default_addon_id(),
            addon_name: default_addon_name(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
        }
    }
}

impl Config {
    /// Get the default base directory for reelvibe (~/.reelvibe)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".reelvibe")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            recs_db_file: base.join("recommendations.db"),
            catalog_db_file: base.join("catalog.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            recs_db_file: base.join("recommendations.db"),
            catalog_db_file: base.join("catalog.db"),
            base_dir: base,
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to
    /// defaults when no file exists yet
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Apply environment overrides on top of file values.
    ///
    /// Deployments tune the engine through the environment; anything set
    /// there wins over the config file.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(count) = env_parse::<usize>("SIMILAR_POST_COUNT")? {
            self.query.similar_post_count = count;
        }
        if let Some(max) = env_parse::<usize>("MAX_RESULTS")? {
            self.query.max_results = max;
        }
        if let Some(threshold) = env_parse::<i64>("POST_SCORE_THRESHOLD")? {
            self.feeds.post_score_threshold = threshold;
        }
        if let Some(threshold) = env_parse::<i64>("COMMENT_SCORE_THRESHOLD")? {
            self.feeds.comment_score_threshold = threshold;
        }
        if let Ok(url) = std::env::var("REELVIBE_EMBEDDING_BACKEND_URL") {
            if !url.is_empty() {
                self.embedding.backend_url = url;
            }
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.feeds.subreddits.is_empty() {
            warn!("No subreddits configured; ingestion will produce nothing");
        }

        if self.embedding.dimension == 0 {
            return Err(Error::Config(
                "embedding.dimension must be positive".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be positive".to_string(),
            ));
        }

        if self.query.similar_post_count == 0 {
            return Err(Error::Config(
                "query.similar_post_count must be positive".to_string(),
            ));
        }

        if self.query.max_results == 0 {
            return Err(Error::Config(
                "query.max_results must be positive".to_string(),
            ));
        }

        if self.feeds.post_score_threshold < 0 || self.feeds.comment_score_threshold < 0 {
            return Err(Error::Config(
                "feeds score thresholds must be >= 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) if !raw.is_empty() => raw.parse::<T>().map(Some).map_err(|_| {
            Error::Config(format!("Environment variable {} is not a valid value: {}", name, raw))
        }),
        _ => Ok(None),
    }
}
