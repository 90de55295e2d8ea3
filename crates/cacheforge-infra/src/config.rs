//! Run configuration loader.
//!
//! Reads `cacheforge.toml` and deserializes it into [`SearchConfig`]. The
//! file in the data directory is optional and falls back to defaults; a path
//! the user named explicitly must exist and parse.

use std::path::{Path, PathBuf};

use cacheforge_types::config::SearchConfig;

/// Failure to load an explicitly requested config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load the search configuration from a path the user named.
///
/// A missing, unreadable, or malformed file is an error. Validation is left
/// to the caller.
pub async fn load_search_config_strict(path: &Path) -> Result<SearchConfig, ConfigLoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str::<SearchConfig>(&content).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the search configuration from the default location.
///
/// - If the file does not exist, returns [`SearchConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and returns the default.
/// - Otherwise returns the parsed config. Validation is left to the caller.
pub async fn load_search_config(path: &Path) -> SearchConfig {
    match load_search_config_strict(path).await {
        Ok(config) => config,
        Err(ConfigLoadError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            SearchConfig::default()
        }
        Err(err) => {
            let cause = match &err {
                ConfigLoadError::Read { source, .. } => source.to_string(),
                ConfigLoadError::Parse { source, .. } => source.to_string(),
            };
            tracing::warn!("{err}: {cause}, using defaults");
            SearchConfig::default()
        }
    }
}
