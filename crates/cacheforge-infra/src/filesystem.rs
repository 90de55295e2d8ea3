//! Local filesystem adapter and data-directory layout.
//!
//! Implements the `FileSystem` port from `cacheforge-core` with `tokio::fs`.

use std::path::{Path, PathBuf};

use cacheforge_core::fs::FileSystem;

/// File name of the experiment store inside the data directory.
pub const DATABASE_FILE: &str = "cacheforge.db";

/// File name of the run configuration inside the data directory.
pub const CONFIG_FILE: &str = "cacheforge.toml";

/// Local filesystem implementation of the `FileSystem` trait.
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }

    /// `{data_dir}/cacheforge.db`
    pub fn database_path(data_dir: &Path) -> PathBuf {
        data_dir.join(DATABASE_FILE)
    }

    /// `{data_dir}/cacheforge.toml`
    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFileSystem {
    async fn write_file(&self, path: &Path, content: &str) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await
    }

    async fn read_file(&self, path: &Path) -> Result<String, std::io::Error> {
        tokio::fs::read_to_string(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `CACHEFORGE_DATA_DIR` environment variable
/// 2. `~/.cacheforge`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CACHEFORGE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".cacheforge");
    }

    PathBuf::from(".cacheforge")
}
