//! Configuration loading for the semantic search subsystem.
//!
//! Layered precedence: built-in defaults -> config file
//! (~/.config/crm-search/config.toml) -> environment variables (CRM_*).
//!
//! Components receive an explicit config object at construction; there are
//! no ambient environment checks inside the pipeline. "Unconfigured" is a
//! first-class state: search degrades to empty results and backfill skips.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::CrmError;

/// Embedding provider connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// API base URL (e.g., "https://api.openai.com/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Vector dimensionality of the model
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// API key (loaded from env var or config file, never re-serialized)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retries for transient provider failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            dimension: default_dimension(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl ProviderSettings {
    /// Whether the provider can be called at all.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && !self.base_url.is_empty() && !self.model.is_empty()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.dimension == 0 {
            return Err("dimension must be > 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

/// Semantic search defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// Minimum cosine similarity for a result to qualify.
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,

    /// Maximum results returned from one search.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_threshold() -> f32 {
    0.3
}

fn default_limit() -> usize {
    10
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            default_limit: default_limit(),
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(-1.0..=1.0).contains(&self.default_threshold) {
            return Err(format!(
                "default_threshold must be -1.0..=1.0, got {}",
                self.default_threshold
            ));
        }
        if self.default_limit == 0 {
            return Err("default_limit must be > 0".to_string());
        }
        Ok(())
    }
}

/// Batch backfill pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct BackfillSettings {
    /// Entities processed concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches, to stay under provider rate limits.
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_pause_ms() -> u64 {
    1000
}

impl Default for BackfillSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
        }
    }
}

impl BackfillSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        Ok(())
    }
}

/// Top-level configuration for the subsystem.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrmSearchConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub backfill: BackfillSettings,
}

impl CrmSearchConfig {
    /// Load configuration with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/crm-search/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (CRM_*)
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, CrmError> {
        let config_dir = ProjectDirs::from("", "", "crm-search")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: CRM_PROVIDER_API_KEY, CRM_SEARCH_DEFAULT_LIMIT, etc.
        builder = builder.add_source(
            Environment::with_prefix("CRM")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| CrmError::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| CrmError::Config(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), CrmError> {
        self.provider.validate().map_err(CrmError::Config)?;
        self.search.validate().map_err(CrmError::Config)?;
        self.backfill.validate().map_err(CrmError::Config)?;
        Ok(())
    }
}
