//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.schema-graph/config.toml`
//! 2. Local config: `<dataset_root>/.schema-graph/config.toml`
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::{AppConfig, ConfigOverrides, CONFIG_DIR_NAME};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    global_config_dir: Option<PathBuf>,
    global_config: Option<AppConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new loader, automatically detecting `~/.schema-graph`.
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME));
        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory (for tests).
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir.as_ref().map(|d| d.join(CONFIG_FILE_NAME))
    }

    pub fn local_config_path(&self, dataset_root: &Path) -> PathBuf {
        dataset_root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a dataset root, merging global → local →
    /// CLI overrides.
    pub fn load(
        &mut self,
        dataset_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(dataset_root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    pub fn load_global(&mut self) -> Result<Option<AppConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("no home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!(?global_path, "global config not found");
            return Ok(None);
        }

        debug!(?global_path, "loading global config");
        let config = load_config_file(&global_path)?;
        self.global_config = Some(config.clone());
        Ok(Some(config))
    }

    pub fn load_local(&self, dataset_root: &Path) -> Result<Option<AppConfig>, ConfigError> {
        let local_path = self.local_config_path(dataset_root);
        if !local_path.exists() {
            trace!(?local_path, "local config not found");
            return Ok(None);
        }
        debug!(?local_path, "loading local config");
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the global config file.
    pub fn save_global(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };
        save_config_file(&global_dir.join(CONFIG_FILE_NAME), config)
    }

    /// Save configuration to the local config file for a dataset root.
    pub fn save_local(&self, dataset_root: &Path, config: &AppConfig) -> Result<(), ConfigError> {
        save_config_file(&self.local_config_path(dataset_root), config)
    }

    /// Clear cached global configuration, forcing reload on next call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

fn save_config_file(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Merge two configurations field-by-field, `overlay` taking precedence
/// whenever it differs from the built-in default.
fn merge_configs(base: AppConfig, overlay: AppConfig) -> AppConfig {
    let defaults = AppConfig::default();
    AppConfig {
        profiling: crate::ProfilingConfig {
            hard_cap: pick(overlay.profiling.hard_cap, base.profiling.hard_cap, defaults.profiling.hard_cap),
            sample_size: pick(
                overlay.profiling.sample_size,
                base.profiling.sample_size,
                defaults.profiling.sample_size,
            ),
            truncate_len: pick(
                overlay.profiling.truncate_len,
                base.profiling.truncate_len,
                defaults.profiling.truncate_len,
            ),
            category_threshold: pick(
                overlay.profiling.category_threshold,
                base.profiling.category_threshold,
                defaults.profiling.category_threshold,
            ),
            word_freq_top_k: pick(
                overlay.profiling.word_freq_top_k,
                base.profiling.word_freq_top_k,
                defaults.profiling.word_freq_top_k,
            ),
            busy_timeout_secs: pick(
                overlay.profiling.busy_timeout_secs,
                base.profiling.busy_timeout_secs,
                defaults.profiling.busy_timeout_secs,
            ),
        },
        logging: crate::LoggingConfig {
            level: if overlay.logging.level != defaults.logging.level {
                overlay.logging.level
            } else {
                base.logging.level
            },
            format: overlay.logging.format,
        },
    }
}

fn pick<T: PartialEq>(overlay: T, base: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_default_when_no_files_present() {
        let temp = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let config = loader.load(temp.path(), None).unwrap();
        assert_eq!(config.profiling.sample_size, AppConfig::default().profiling.sample_size);
    }

    #[test]
    fn local_config_overrides_default() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            "[profiling]\nsample_size = 12\n",
        );
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let config = loader.load(temp.path(), None).unwrap();
        assert_eq!(config.profiling.sample_size, 12);
    }

    #[test]
    fn local_overrides_global_which_overrides_default() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        std::fs::create_dir_all(&global_dir).unwrap();
        std::fs::write(
            global_dir.join(CONFIG_FILE_NAME),
            "[profiling]\nsample_size = 8\ncategory_threshold = 4\n",
        )
        .unwrap();
        write_config(temp.path(), "[profiling]\nsample_size = 20\n");

        let mut loader = ConfigLoader::with_global_dir(&global_dir);
        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.profiling.sample_size, 20);
        assert_eq!(config.profiling.category_threshold, 4);
    }

    #[test]
    fn cli_overrides_win_over_files() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[profiling]\nsample_size = 20\n");
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let overrides = ConfigOverrides {
            sample_size: Some(99),
            ..Default::default()
        };
        let config = loader.load(temp.path(), Some(&overrides)).unwrap();
        assert_eq!(config.profiling.sample_size, 99);
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let mut config = AppConfig::default();
        config.profiling.sample_size = 42;
        loader.save_local(temp.path(), &config).unwrap();

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let loaded = loader.load(temp.path(), None).unwrap();
        assert_eq!(loaded.profiling.sample_size, 42);
    }

    #[test]
    fn cache_clearing_forces_reload() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        std::fs::create_dir_all(&global_dir).unwrap();
        std::fs::write(global_dir.join(CONFIG_FILE_NAME), "[logging]\nlevel = \"debug\"\n").unwrap();

        let mut loader = ConfigLoader::with_global_dir(&global_dir);
        let _ = loader.load_global().unwrap();
        assert!(loader.global_config.is_some());
        loader.clear_cache();
        assert!(loader.global_config.is_none());
    }
}
