//! g++ toolchain adapter.
//!
//! Builds `g++ <flags> -I<include_dir> <source> <library> -o <executable>`.
//! A non-zero exit is a [`BuildOutcome::Failed`] carrying stderr, not an
//! error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cacheforge_core::eval::tools::{BuildOutcome, Toolchain};
use cacheforge_types::config::ToolchainConfig;
use cacheforge_types::error::ToolError;
use tokio::process::Command;

use super::run_with_timeout;

/// Compiles candidates against the prebuilt simulator library.
#[derive(Debug, Clone)]
pub struct GxxToolchain {
    compiler: String,
    flags: Vec<String>,
    include_dir: PathBuf,
    library: PathBuf,
    timeout: Duration,
}

impl GxxToolchain {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            compiler: config.compiler.clone(),
            flags: config.flags.clone(),
            include_dir: config.include_dir.clone(),
            library: config.library.clone(),
            timeout: config.timeout(),
        }
    }

    fn command(&self, source: &Path, executable: &Path) -> Command {
        let mut command = Command::new(&self.compiler);
        command
            .args(&self.flags)
            .arg(format!("-I{}", self.include_dir.display()))
            .arg(source)
            .arg(&self.library)
            .arg("-o")
            .arg(executable);
        command
    }
}

impl Toolchain for GxxToolchain {
    #[tracing::instrument(skip(self), fields(compiler = %self.compiler))]
    async fn build(&self, source: &Path, executable: &Path) -> Result<BuildOutcome, ToolError> {
        let output = run_with_timeout(
            self.command(source, executable),
            &self.compiler,
            self.timeout,
        )
        .await?;

        if output.status.success() {
            Ok(BuildOutcome::Built {
                executable: executable.to_path_buf(),
            })
        } else {
            Ok(BuildOutcome::Failed {
                status: output.status.code(),
                diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// A toolchain whose "compiler" is `sh <script>`, so the script sees the
    /// real g++ argument list.
    fn scripted(dir: &Path, script: &str, timeout: Duration) -> GxxToolchain {
        let path = dir.join("fake-gxx.sh");
        std::fs::write(&path, script).unwrap();
        GxxToolchain {
            compiler: "sh".to_string(),
            flags: vec![path.display().to_string(), "-Wall".to_string()],
            include_dir: PathBuf::from("inc"),
            library: PathBuf::from("lib/config1.a"),
            timeout,
        }
    }

    #[tokio::test]
    async fn test_build_success_passes_gxx_arguments() {
        let dir = tempfile::tempdir().unwrap();
        // Record the arguments into the "executable".
        let tc = scripted(
            dir.path(),
            "for last; do :; done\necho \"$@\" > \"$last\"\n",
            Duration::from_secs(10),
        );
        let source = dir.path().join("000_lru.cc");
        let exe = dir.path().join("000_lru.out");

        let outcome = tc.build(&source, &exe).await.unwrap();
        assert_eq!(outcome, BuildOutcome::Built { executable: exe.clone() });

        let args = std::fs::read_to_string(&exe).unwrap();
        let expected = format!(
            "-Wall -Iinc {} lib/config1.a -o {}",
            source.display(),
            exe.display()
        );
        assert_eq!(args.trim(), expected);
    }

    #[tokio::test]
    async fn test_build_failure_is_outcome_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let tc = scripted(
            dir.path(),
            "echo \"000_lru.cc:3: error: expected ';'\" >&2\nexit 1\n",
            Duration::from_secs(10),
        );
        let outcome = tc
            .build(&dir.path().join("a.cc"), &dir.path().join("a.out"))
            .await
            .unwrap();
        match outcome {
            BuildOutcome::Failed { status, diagnostics } => {
                assert_eq!(status, Some(1));
                assert!(diagnostics.contains("expected ';'"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_build_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let tc = scripted(dir.path(), "sleep 5\n", Duration::from_millis(100));
        let err = tc
            .build(&dir.path().join("a.cc"), &dir.path().join("a.out"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_compiler_is_spawn_error() {
        let tc = GxxToolchain::new(&ToolchainConfig {
            compiler: "cacheforge-no-such-compiler".to_string(),
            ..ToolchainConfig::default()
        });
        let err = tc
            .build(Path::new("a.cc"), Path::new("a.out"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
