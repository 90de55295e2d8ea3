//! Run configuration for cacheforge.
//!
//! `SearchConfig` is the top-level `cacheforge.toml`. Every field has a
//! default equal to the fixed constants the search was tuned with, so an
//! empty file (or no file) yields a runnable configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::llm::ReasoningEffort;
use crate::workload::{default_workloads, Workload, AGGREGATE_WORKLOAD};

/// Top-level configuration for a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of successfully evaluated iterations before the run stops.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// How many top historical candidates the cold-start prompt summarizes.
    #[serde(default = "default_history_top_k")]
    pub history_top_k: u32,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub harness: HarnessConfig,

    #[serde(default)]
    pub retry: BuildRetryConfig,

    /// Ordered workload list; every candidate is evaluated on each in turn.
    #[serde(default = "default_workloads")]
    pub workloads: Vec<Workload>,
}

fn default_max_iterations() -> u32 {
    25
}

fn default_history_top_k() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_top_k: default_history_top_k(),
            generation: GenerationConfig::default(),
            toolchain: ToolchainConfig::default(),
            harness: HarnessConfig::default(),
            retry: BuildRetryConfig::default(),
            workloads: default_workloads(),
        }
    }
}

impl SearchConfig {
    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workloads.is_empty() {
            return Err(ConfigError::NoWorkloads);
        }
        let mut seen = std::collections::HashSet::new();
        for workload in &self.workloads {
            if workload.name == AGGREGATE_WORKLOAD {
                return Err(ConfigError::ReservedWorkload(workload.name.clone()));
            }
            if !seen.insert(workload.name.as_str()) {
                return Err(ConfigError::DuplicateWorkload(workload.name.clone()));
            }
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Zero { field: "max_iterations" });
        }
        if self.retry.max_build_attempts == 0 {
            return Err(ConfigError::Zero { field: "retry.max_build_attempts" });
        }
        Ok(())
    }
}

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub reasoning_effort: ReasoningEffort,

    /// OpenAI-compatible API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "o4-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    600
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            reasoning_effort: ReasoningEffort::default(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_tokens: None,
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Build toolchain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default = "default_compiler")]
    pub compiler: String,

    #[serde(default = "default_compiler_flags")]
    pub flags: Vec<String>,

    /// Passed as `-I<include_dir>`.
    #[serde(default = "default_include_dir")]
    pub include_dir: PathBuf,

    /// Prebuilt simulator library linked into every candidate.
    #[serde(default = "default_library")]
    pub library: PathBuf,

    /// Directory generated sources and executables are written to.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    #[serde(default = "default_build_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_compiler() -> String {
    "g++".to_string()
}

fn default_compiler_flags() -> Vec<String> {
    vec!["-Wall".to_string(), "--std=c++11".to_string()]
}

fn default_include_dir() -> PathBuf {
    PathBuf::from("ChampSim_CRC2/inc")
}

fn default_library() -> PathBuf {
    PathBuf::from("ChampSim_CRC2/lib/config1.a")
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("ChampSim_CRC2/new_policies")
}

fn default_build_timeout_secs() -> u64 {
    120
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            flags: default_compiler_flags(),
            include_dir: default_include_dir(),
            library: default_library(),
            artifact_dir: default_artifact_dir(),
            timeout_secs: default_build_timeout_secs(),
        }
    }
}

impl ToolchainConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Evaluation harness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_warmup_instructions")]
    pub warmup_instructions: u64,

    #[serde(default = "default_simulation_instructions")]
    pub simulation_instructions: u64,

    #[serde(default = "default_harness_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_warmup_instructions() -> u64 {
    1_000_000
}

fn default_simulation_instructions() -> u64 {
    10_000_000
}

fn default_harness_timeout_secs() -> u64 {
    3_600
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            warmup_instructions: default_warmup_instructions(),
            simulation_instructions: default_simulation_instructions(),
            timeout_secs: default_harness_timeout_secs(),
        }
    }
}

impl HarnessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bounds on regenerating a candidate after a build failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRetryConfig {
    /// Total build attempts allowed per iteration index (first attempt included).
    #[serde(default = "default_max_build_attempts")]
    pub max_build_attempts: u32,

    /// Delay before the first regeneration; doubles on each further retry.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_build_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for BuildRetryConfig {
    fn default() -> Self {
        Self {
            max_build_attempts: default_max_build_attempts(),
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
