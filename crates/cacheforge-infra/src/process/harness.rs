//! ChampSim harness adapter.
//!
//! Runs `<executable> -warmup_instructions <n> -simulation_instructions <n>
//! -traces <trace>` and returns stdout for metric extraction.

use std::path::Path;
use std::time::Duration;

use cacheforge_core::eval::tools::Harness;
use cacheforge_types::config::HarnessConfig;
use cacheforge_types::error::ToolError;
use tokio::process::Command;

use super::run_with_timeout;

/// Runs built candidates against trace files.
#[derive(Debug, Clone)]
pub struct ChampSimHarness {
    warmup_instructions: u64,
    simulation_instructions: u64,
    timeout: Duration,
}

impl ChampSimHarness {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            warmup_instructions: config.warmup_instructions,
            simulation_instructions: config.simulation_instructions,
            timeout: config.timeout(),
        }
    }
}

impl Harness for ChampSimHarness {
    #[tracing::instrument(skip_all, fields(executable = %executable.display(), trace = %trace.display()))]
    async fn run(&self, executable: &Path, trace: &Path) -> Result<String, ToolError> {
        let program = executable.display().to_string();
        let mut command = Command::new(executable);
        command
            .arg("-warmup_instructions")
            .arg(self.warmup_instructions.to_string())
            .arg("-simulation_instructions")
            .arg(self.simulation_instructions.to_string())
            .arg("-traces")
            .arg(trace);

        let started = std::time::Instant::now();
        let output = run_with_timeout(command, &program, self.timeout).await?;
        tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "simulation finished");

        if !output.status.success() {
            return Err(ToolError::HarnessExit {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| ToolError::Output(e.to_string()))
    }
}
