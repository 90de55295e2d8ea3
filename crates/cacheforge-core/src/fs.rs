//! FileSystem trait for abstracting artifact I/O.
//!
//! Defined in cacheforge-core so the evaluation pipeline and the retrieval
//! prompt can write and read policy sources without depending on any specific
//! filesystem implementation. The `LocalFileSystem` adapter lives in
//! cacheforge-infra.

use std::path::Path;

/// Abstraction over filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Write string content to a file, creating parent directories as needed.
    fn write_file(
        &self,
        path: &Path,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;

    /// Read a file's content as a string.
    fn read_file(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<String, std::io::Error>> + Send;

    /// Check whether a path exists.
    fn exists(&self, path: &Path) -> impl std::future::Future<Output = bool> + Send;
}
