//! Toolchain and Harness trait definitions.
//!
//! Both are external programs. Implementations (cacheforge-infra) own the
//! command lines, fixed flags, and per-call timeouts; the pipeline only sees
//! these two operations.

use std::path::{Path, PathBuf};

use cacheforge_types::error::ToolError;

/// Result of one build attempt.
///
/// A non-zero toolchain exit is a value, not an error: the controller
/// recovers from it by regenerating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Built { executable: PathBuf },
    Failed { status: Option<i32>, diagnostics: String },
}

/// Compiles a policy source into a simulator executable.
pub trait Toolchain: Send + Sync {
    /// Build `source` into `executable`.
    ///
    /// Returns `Err` only when the toolchain could not run at all (spawn
    /// failure, timeout).
    fn build(
        &self,
        source: &Path,
        executable: &Path,
    ) -> impl std::future::Future<Output = Result<BuildOutcome, ToolError>> + Send;
}

/// Runs a built candidate against one trace.
pub trait Harness: Send + Sync {
    /// Execute `executable` on `trace` and return its stdout.
    fn run(
        &self,
        executable: &Path,
        trace: &Path,
    ) -> impl std::future::Future<Output = Result<String, ToolError>> + Send;
}
