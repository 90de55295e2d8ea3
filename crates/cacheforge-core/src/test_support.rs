//! In-memory and scripted implementations of every port, for unit tests.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use cacheforge_types::contract::POLICY_OUTPUT_CONTRACT;
use cacheforge_types::error::{RepositoryError, ToolError};
use cacheforge_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
use cacheforge_types::trial::{RankMetric, Trial, TrialRecord, WorkloadArtifact, WorkloadSummary};
use cacheforge_types::workload::Workload;

use crate::eval::tools::{BuildOutcome, Harness, Toolchain};
use crate::fs::FileSystem;
use crate::llm::provider::LlmProvider;
use crate::prompt::composer::PromptComposer;
use crate::repository::trial::TrialRepository;

/// The five default workload labels with predictable descriptions.
pub fn workloads() -> Vec<Workload> {
    ["astar", "lbm", "mcf", "milc", "omnetpp"]
        .into_iter()
        .map(|name| {
            Workload::new(
                name,
                format!("{name} description"),
                format!("traces/{name}.trace.gz"),
            )
        })
        .collect()
}

/// Harness stdout containing a single `LLC TOTAL` line.
pub fn llc_output(hits: u64, accesses: u64) -> String {
    format!(
        "Heartbeat CPU 0 instructions: 10000000\n\
         LLC TOTAL     ACCESS: {accesses:>10}  HIT: {hits:>10}  MISS: {:>10}\n",
        accesses - hits
    )
}

/// A well-formed model answer for a policy called `name`.
pub fn policy_response(name: &str) -> String {
    let body = PromptComposer::new(POLICY_OUTPUT_CONTRACT).render_sections(
        name,
        &format!("{name} keeps hot lines resident."),
        &format!("// {name}\n#include \"../inc/champsim_crc2.h\"\nvoid InitReplacementState() {{}}"),
    );
    format!("Here is my design.\n\n{body}")
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryRepository {
    rows: Mutex<Vec<Trial>>,
    /// Once this many rows are stored, further writes fail.
    capacity: Option<usize>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that loses its connection after `n` successful writes.
    pub fn failing_after(n: usize) -> Self {
        Self {
            capacity: Some(n),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<Trial> {
        self.rows.lock().unwrap().clone()
    }
}

impl TrialRepository for InMemoryRepository {
    async fn record(&self, record: &TrialRecord) -> Result<Trial, RepositoryError> {
        record.validate()?;
        let mut rows = self.rows.lock().unwrap();
        if self.capacity.is_some_and(|n| rows.len() >= n) {
            return Err(RepositoryError::Connection);
        }
        let trial = Trial {
            id: rows.len() as i64 + 1,
            workload: record.workload.clone(),
            policy: record.policy.clone(),
            policy_description: record.policy_description.clone(),
            workload_description: record.workload_description.clone(),
            artifact_reference: record.artifact_reference.clone(),
            hit_rate: record.hit_rate,
            score: record.score,
            recorded_at: Utc::now(),
        };
        rows.push(trial.clone());
        Ok(trial)
    }

    async fn top_by(
        &self,
        workload: &str,
        metric: RankMetric,
        limit: u32,
    ) -> Result<Vec<Trial>, RepositoryError> {
        let mut matching: Vec<Trial> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.workload == workload)
            .cloned()
            .collect();
        // Stable sort keeps insertion order among ties.
        matching.sort_by(|a, b| metric.value(b).total_cmp(&metric.value(a)));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn workloads_with_descriptions(&self) -> Result<Vec<WorkloadSummary>, RepositoryError> {
        Ok(self.workloads_with_artifacts().await?.0)
    }

    async fn workloads_with_artifacts(
        &self,
    ) -> Result<(Vec<WorkloadSummary>, Vec<WorkloadArtifact>), RepositoryError> {
        let rows = self.rows.lock().unwrap().clone();
        let mut summaries: Vec<WorkloadSummary> = Vec::new();
        for row in &rows {
            if !summaries.iter().any(|s| s.label == row.workload) {
                summaries.push(WorkloadSummary {
                    label: row.workload.clone(),
                    description: row.workload_description.clone(),
                });
            }
        }
        summaries.sort_by(|a, b| a.label.cmp(&b.label));
        let artifacts = rows
            .into_iter()
            .map(|row| WorkloadArtifact {
                label: row.workload,
                artifact_reference: row.artifact_reference,
            })
            .collect();
        Ok((summaries, artifacts))
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), content.to_string());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }
}

impl FileSystem for InMemoryFileSystem {
    async fn write_file(&self, path: &Path, content: &str) -> Result<(), std::io::Error> {
        self.insert(path, content);
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<String, std::io::Error> {
        self.get(path).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string())
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }
}

// ---------------------------------------------------------------------------
// Toolchain and harness
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum BuildScript {
    Always,
    FailFirst(u32),
    FailCalls(Vec<u32>),
    TimeOut,
}

/// Toolchain whose build results follow a script. Clones share call counts.
#[derive(Clone)]
pub struct ScriptedToolchain {
    script: BuildScript,
    calls: Arc<AtomicU32>,
}

impl ScriptedToolchain {
    fn with_script(script: BuildScript) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn always_builds() -> Self {
        Self::with_script(BuildScript::Always)
    }

    /// The first `n` builds fail.
    pub fn failing_first(n: u32) -> Self {
        Self::with_script(BuildScript::FailFirst(n))
    }

    /// The listed (1-based) build calls fail.
    pub fn failing_calls(calls: &[u32]) -> Self {
        Self::with_script(BuildScript::FailCalls(calls.to_vec()))
    }

    /// Every build hits the process timeout.
    pub fn timing_out() -> Self {
        Self::with_script(BuildScript::TimeOut)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Toolchain for ScriptedToolchain {
    async fn build(&self, _source: &Path, executable: &Path) -> Result<BuildOutcome, ToolError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fails = match &self.script {
            BuildScript::TimeOut => {
                return Err(ToolError::Timeout {
                    program: "g++".to_string(),
                    secs: 120,
                });
            }
            BuildScript::Always => false,
            BuildScript::FailFirst(n) => call <= *n,
            BuildScript::FailCalls(calls) => calls.contains(&call),
        };
        if fails {
            Ok(BuildOutcome::Failed {
                status: Some(1),
                diagnostics: "error: expected ';' before '}' token".to_string(),
            })
        } else {
            Ok(BuildOutcome::Built {
                executable: executable.to_path_buf(),
            })
        }
    }
}

/// Harness that replays canned outputs in order, cycling when exhausted.
#[derive(Clone)]
pub struct ScriptedHarness {
    outputs: Arc<Vec<String>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedHarness {
    pub fn new(outputs: Vec<String>) -> Self {
        Self {
            outputs: Arc::new(outputs),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// One output per rate, at a resolution of one in a million.
    pub fn with_rates(rates: &[f64]) -> Self {
        const ACCESSES: u64 = 1_000_000;
        Self::new(
            rates
                .iter()
                .map(|rate| llc_output((rate * ACCESSES as f64).round() as u64, ACCESSES))
                .collect(),
        )
    }
}

impl Harness for ScriptedHarness {
    async fn run(&self, _executable: &Path, _trace: &Path) -> Result<String, ToolError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outputs[call % self.outputs.len()].clone())
    }
}

// ---------------------------------------------------------------------------
// Generation provider
// ---------------------------------------------------------------------------

/// Provider that answers from a queue and remembers every request.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let next = {
            self.requests.lock().unwrap().push(request.clone());
            self.responses.lock().unwrap().pop_front()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let content = next.unwrap_or_else(|| {
            Err(LlmError::Provider {
                message: "script exhausted".to_string(),
            })
        })?;
        Ok(CompletionResponse {
            id: format!("resp-{}", self.requests.lock().unwrap().len()),
            content,
            model: request.model.clone(),
            usage: Usage::default(),
        })
    }
}
