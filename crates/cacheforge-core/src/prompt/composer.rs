//! Generation prompt composition.
//!
//! Two loop prompt shapes exist: cold-start (workloads plus ranked history)
//! and refinement (previous candidate plus feedback). Both end with the same
//! output template, rendered from the [`OutputContract`] the parser reads.
//! The ad-hoc retrieval prompt and the history report are built from the
//! top trials of a single workload.

use std::fmt;
use std::path::Path;

use cacheforge_types::contract::OutputContract;
use cacheforge_types::error::{RepositoryError, SearchError};
use cacheforge_types::trial::{format_percent, Trial, WorkloadSummary};
use cacheforge_types::workload::{Workload, AGGREGATE_WORKLOAD};

use crate::fs::FileSystem;
use crate::prompt::skeleton::{render_guidelines, POLICY_SKELETON};
use crate::repository::trial::TrialRepository;
use crate::search::state::PreviousCandidate;

/// Placeholder shown under the name header of the output template.
pub const NAME_PLACEHOLDER: &str = "<name>";

/// Placeholder shown under the description header of the output template.
pub const DESCRIPTION_PLACEHOLDER: &str =
    "<one paragraph describing the approach and why it improves performance>";

/// Number of policies the ad-hoc retrieval prompt and history report show.
pub const DEFAULT_RETRIEVAL_TOP_N: u32 = 2;

/// Result of a single-workload retrieval.
///
/// `NoData` is terminal: callers print it and never send it to the
/// generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    Found(String),
    NoData { workload: String },
}

impl fmt::Display for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retrieval::Found(text) => f.write_str(text),
            Retrieval::NoData { workload } => {
                write!(f, "No data available for workload: {workload}")
            }
        }
    }
}

/// Builds generation prompts.
#[derive(Debug, Clone, Copy)]
pub struct PromptComposer {
    contract: OutputContract,
}

impl PromptComposer {
    pub fn new(contract: OutputContract) -> Self {
        Self { contract }
    }

    pub fn contract(&self) -> OutputContract {
        self.contract
    }

    // -----------------------------------------------------------------------
    // Output template
    // -----------------------------------------------------------------------

    /// Lay out the three contract sections around the given content.
    ///
    /// With placeholders this is the mandatory output template; with real
    /// values it is an answer the parser accepts.
    pub fn render_sections(&self, name: &str, description: &str, code: &str) -> String {
        let c = &self.contract;
        format!(
            "{}\n{name}\n\n{}\n{description}\n\n{}\n{}\n{code}\n```\n",
            c.header_line(c.name_header),
            c.header_line(c.description_header),
            c.header_line(c.implementation_header),
            c.opening_fence(),
        )
    }

    /// The template every loop prompt ends with.
    pub fn render_output_template(&self) -> String {
        self.render_sections(NAME_PLACEHOLDER, DESCRIPTION_PLACEHOLDER, POLICY_SKELETON)
    }

    // -----------------------------------------------------------------------
    // Loop prompts
    // -----------------------------------------------------------------------

    /// Iteration-0 prompt: every known workload, the ranked history, the
    /// skeleton rules, and the output template.
    pub fn cold_start(&self, workloads: &[WorkloadSummary], history: &[Trial]) -> String {
        format!(
            "The following workloads are under consideration:\n\
             {workloads}\n\n\
             The top-performing cache replacement policies from past experiments are:\n\
             {history}\n\n\
             Your task: Propose a new cache replacement policy that aims to **outperform all of the above policies** \
             across these workloads. Consider workload characteristics like branching, memory access patterns, \
             spatial and temporal locality, and phase behavior.\n\n\
             Suggested approach:\n\
             1) Generate 3-4 distinct policy ideas (divergent thinking), briefly explain why each could help with different workloads.\n\
             2) Choose the most promising policy and provide a complete C++ implementation.\n\
             3) Include any tunable parameters or knobs, and note what telemetry/statistics should be tracked.\n\n\
             {guidelines}\n\
             Use the exact output format below:\n\n\
             {template}",
            workloads = summarize_workloads(workloads),
            history = summarize_history(history),
            guidelines = render_guidelines(),
            template = self.render_output_template(),
        )
    }

    /// Prompt for every iteration after the first.
    pub fn refinement(&self, workloads: &[WorkloadSummary], previous: &PreviousCandidate) -> String {
        let candidate = &previous.candidate;
        format!(
            "The following workloads are under consideration:\n\
             {workloads}\n\n\
             Your previous design was **{name}**:\n\n\
             Description:\n{description}\n\n\
             Implementation:\n{fence}\n{source}\n```\n\n\
             Feedback from the last run:\n{feedback}\n\n\
             Task: Refine or redesign the policy to achieve better performance across all workloads. \
             Consider workload characteristics such as branching behavior, memory access patterns, \
             spatial and temporal locality, and phase changes. \
             You may propose modifications, hybrid approaches, or completely new ideas if needed.\n\n\
             {guidelines}\n\
             Produce the output in the exact format below:\n\n\
             {template}",
            workloads = summarize_workloads(workloads),
            name = candidate.name,
            description = candidate.description,
            fence = self.contract.opening_fence(),
            source = candidate.source,
            feedback = previous.feedback,
            guidelines = render_guidelines(),
            template = self.render_output_template(),
        )
    }

    // -----------------------------------------------------------------------
    // Single-workload retrieval
    // -----------------------------------------------------------------------

    /// Ad-hoc prompt built from the top `n` trials of `workload` by hit rate,
    /// including each policy's source read back from its artifact.
    #[tracing::instrument(skip(self, repo, fs))]
    pub async fn top_n_prompt<R: TrialRepository, F: FileSystem>(
        &self,
        repo: &R,
        fs: &F,
        workload: &str,
        n: u32,
    ) -> Result<Retrieval, SearchError> {
        let top = repo.top_by_hit_rate(workload, n).await?;
        let Some(first) = top.first() else {
            return Ok(Retrieval::NoData {
                workload: workload.to_string(),
            });
        };

        let mut prompt = format!(
            "You are a cache policy design expert. Analyze the workload and top policies, \
             then create a new improved policy.\n\n\
             # Workload\n\
             Name: {workload}\n\
             Description: {}\n\n\
             # Examples\n",
            first.workload_description
        );

        for (i, trial) in top.iter().enumerate() {
            let path = Path::new(&trial.artifact_reference);
            let source = fs
                .read_file(path)
                .await
                .map_err(|source| SearchError::Artifact {
                    path: path.to_path_buf(),
                    source,
                })?;
            prompt.push_str(&format!(
                "## Policy {}\n\
                 Name: {}\n\
                 Description: {}\n\
                 Cache Hit Rate: {}\n\
                 Implementation:\n\
                 {}\n{}\n```\n\n",
                i + 1,
                trial.policy,
                trial.policy_description,
                format_percent(trial.hit_rate),
                self.contract.opening_fence(),
                source.trim_end(),
            ));
        }

        prompt.push_str(
            "# Task\nCreate a new cache replacement policy in C++11 that combines strengths and fixes weaknesses.\n\n",
        );
        prompt.push_str(&render_guidelines());
        prompt.push_str("\nYour response MUST follow exactly this format:\n\n");
        prompt.push_str(&self.render_output_template());

        Ok(Retrieval::Found(prompt))
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

/// Known workloads for the cold-start prompt: configured workloads first (in
/// evaluation order), then any other labels already present in the store.
pub async fn known_workloads<R: TrialRepository>(
    repo: &R,
    configured: &[Workload],
) -> Result<Vec<WorkloadSummary>, RepositoryError> {
    let mut known: Vec<WorkloadSummary> = configured
        .iter()
        .map(|w| WorkloadSummary {
            label: w.name.clone(),
            description: w.description.clone(),
        })
        .collect();

    for stored in repo.workloads_with_descriptions().await? {
        if stored.label == AGGREGATE_WORKLOAD || known.iter().any(|k| k.label == stored.label) {
            continue;
        }
        known.push(stored);
    }

    Ok(known)
}

/// One `label: description` line per workload.
pub fn summarize_workloads(workloads: &[WorkloadSummary]) -> String {
    workloads
        .iter()
        .map(|w| format!("{}: {}", w.label, w.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ranked history block: name, score, and description per trial, in the
/// order given.
pub fn summarize_history(history: &[Trial]) -> String {
    if history.is_empty() {
        return "No previous policies have been evaluated yet.\n".to_string();
    }
    history
        .iter()
        .map(|t| {
            format!(
                "Policy: {}\nHit Rate: {}\nDescription:\n{}\n",
                t.policy,
                format_percent(t.score),
                t.policy_description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Natural-language summary of the top `n` policies for `workload`.
#[tracing::instrument(skip(repo))]
pub async fn history_report<R: TrialRepository>(
    repo: &R,
    workload: &str,
    n: u32,
) -> Result<Retrieval, RepositoryError> {
    let top = repo.top_by_hit_rate(workload, n).await?;
    let Some(first) = top.first() else {
        return Ok(Retrieval::NoData {
            workload: workload.to_string(),
        });
    };

    let mut report = format!(
        "Workload: {workload}\nDescription: {}\n\nTop {} policies by cache hit rate:\n\n",
        first.workload_description,
        top.len()
    );
    for (i, trial) in top.iter().enumerate() {
        report.push_str(&format!(
            "{}. Policy: {}\n   Description: {}\n   Cache Hit Rate: {}\n   Artifact: {}\n\n",
            i + 1,
            trial.policy,
            trial.policy_description,
            format_percent(trial.hit_rate),
            trial.artifact_reference,
        ));
    }
    Ok(Retrieval::Found(report))
}
