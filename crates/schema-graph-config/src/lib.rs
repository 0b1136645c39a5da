//! Configuration loading for the schema graph construction engine.
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.schema-graph/config.toml`
//! - Local config: `.schema-graph/config.toml` (in the dataset root)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use std::path::PathBuf;
use std::time::Duration;

use schema_graph_core::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Root configuration for the schema graph engine.
///
/// Represents the fully merged configuration from all sources; mirrors
/// [`schema_graph_core::PipelineConfig`] in a TOML-friendly shape plus the
/// ambient concerns (logging) the core crate has no opinion on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data profiling tuning.
    pub profiling: ProfilingConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profiling: ProfilingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// TOML-friendly mirror of [`schema_graph_core::PipelineConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilingConfig {
    /// Per-table upper bound on rows read for profiling.
    pub hard_cap: usize,
    /// Maximum number of `samples` retained per column.
    pub sample_size: usize,
    /// Maximum character length before a textual sample is truncated.
    pub truncate_len: usize,
    /// Maximum distinct non-null values for `categories` to be emitted.
    pub category_threshold: usize,
    /// Maximum entries in `word_frequency`.
    pub word_freq_top_k: usize,
    /// SQLite busy timeout, in seconds.
    pub busy_timeout_secs: u64,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            hard_cap: defaults.hard_cap,
            sample_size: defaults.sample_size,
            truncate_len: defaults.truncate_len,
            category_threshold: defaults.category_threshold,
            word_freq_top_k: defaults.word_freq_top_k,
            busy_timeout_secs: defaults.busy_timeout.as_secs(),
        }
    }
}

impl ProfilingConfig {
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            hard_cap: self.hard_cap,
            sample_size: self.sample_size,
            truncate_len: self.truncate_len,
            category_threshold: self.category_threshold,
            word_freq_top_k: self.word_freq_top_k,
            busy_timeout: Duration::from_secs(self.busy_timeout_secs),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (text, json).
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// CLI overrides applied over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub hard_cap: Option<usize>,
    pub sample_size: Option<usize>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(hard_cap) = overrides.hard_cap {
            self.profiling.hard_cap = hard_cap;
        }
        if let Some(sample_size) = overrides.sample_size {
            self.profiling.sample_size = sample_size;
        }
        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profiling.sample_size == 0 {
            return Err(ConfigError::ValidationError(
                "profiling.sample_size must be greater than zero".to_string(),
            ));
        }
        if self.profiling.hard_cap == 0 {
            return Err(ConfigError::ValidationError(
                "profiling.hard_cap must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default data directory name for config files, grouped under the
/// dataset root the way the teacher groups its workspace state.
pub const CONFIG_DIR_NAME: &str = ".schema-graph";

/// A resolved path to the default local config directory for `root`.
pub fn local_config_dir(root: &std::path::Path) -> PathBuf {
    root.join(CONFIG_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_pipeline_defaults() {
        let config = AppConfig::default();
        let pipeline = config.profiling.to_pipeline_config();
        assert_eq!(pipeline.sample_size, PipelineConfig::default().sample_size);
        assert_eq!(pipeline.hard_cap, PipelineConfig::default().hard_cap);
    }

    #[test]
    fn apply_overrides_updates_selected_fields() {
        let mut config = AppConfig::default();
        let overrides = ConfigOverrides {
            sample_size: Some(10),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_overrides(&overrides);
        assert_eq!(config.profiling.sample_size, 10);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn validate_rejects_zero_sample_size() {
        let mut config = AppConfig::default();
        config.profiling.sample_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_roundtrip_preserves_values() {
        let mut config = AppConfig::default();
        config.profiling.sample_size = 12;
        config.logging.level = "warn".to_string();

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.profiling.sample_size, 12);
        assert_eq!(parsed.logging.level, "warn");
    }
}
