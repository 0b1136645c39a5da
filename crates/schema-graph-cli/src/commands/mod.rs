//! CLI command implementations.

pub mod batch;
pub mod build;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use schema_graph_config::{AppConfig, ConfigLoader};

/// Load configuration for `dataset_root`, honoring an explicit `--config`
/// file override before falling back to global/local discovery.
pub fn load_config(config_path: Option<&Path>, dataset_root: &Path) -> Result<AppConfig> {
    if let Some(path) = config_path {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        return toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()));
    }

    let mut loader = ConfigLoader::new();
    loader
        .load(dataset_root, None)
        .context("failed to load configuration")
}

/// Print a message respecting `--quiet`.
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}
