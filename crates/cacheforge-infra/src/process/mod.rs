//! External program adapters: the C++ toolchain and the simulator harness.
//!
//! Both spawn through [`run_with_timeout`], which captures output and kills
//! the child if it outlives its deadline.

pub mod harness;
pub mod toolchain;

use std::process::{Output, Stdio};
use std::time::Duration;

use cacheforge_types::error::ToolError;
use tokio::process::Command;

/// Spawn `command`, wait for it with a deadline, and capture its output.
///
/// The child is killed when the deadline passes.
pub async fn run_with_timeout(
    mut command: Command,
    program: &str,
    timeout: Duration,
) -> Result<Output, ToolError> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        }),
        Err(_) => Err(ToolError::Timeout {
            program: program.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}
