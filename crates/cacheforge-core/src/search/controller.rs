//! SearchController: the compose, generate, parse, build, evaluate, record,
//! decide loop.
//!
//! Execution is strictly sequential. Every external call is awaited before
//! the next one starts, and the generation call carries its own timeout (the
//! toolchain and harness adapters time out their own processes).

use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use cacheforge_types::config::{BuildRetryConfig, SearchConfig};
use cacheforge_types::contract::OutputContract;
use cacheforge_types::error::SearchError;
use cacheforge_types::llm::{CompletionRequest, LlmError, ReasoningEffort};
use cacheforge_types::policy::PolicyCandidate;
use cacheforge_types::trial::{format_percent, Trial, WorkloadSummary};
use cacheforge_types::workload::AGGREGATE_WORKLOAD;
use serde::Serialize;

use crate::eval::pipeline::{ArtifactTag, EvaluationPipeline, EvaluationReport, PipelineOutcome};
use crate::eval::tools::{Harness, Toolchain};
use crate::fs::FileSystem;
use crate::llm::provider::LlmProvider;
use crate::prompt::composer::{known_workloads, PromptComposer};
use crate::prompt::parser::ResponseParser;
use crate::repository::trial::TrialRepository;
use crate::search::retry::BuildRetryPolicy;
use crate::search::state::LoopState;

/// Run parameters the controller needs, taken from [`SearchConfig`].
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub max_iterations: u32,
    pub history_top_k: u32,
    pub model: String,
    pub reasoning_effort: ReasoningEffort,
    pub max_tokens: Option<u32>,
    pub generation_timeout: Duration,
    pub retry: BuildRetryConfig,
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            history_top_k: config.history_top_k,
            model: config.generation.model.clone(),
            reasoning_effort: config.generation.reasoning_effort,
            max_tokens: config.generation.max_tokens,
            generation_timeout: config.generation.timeout(),
            retry: config.retry.clone(),
        }
    }
}

/// One completed iteration.
#[derive(Debug, Clone, Serialize)]
pub struct IterationSummary {
    pub iteration: u32,
    /// Generation attempts it took to get a candidate that built.
    pub attempts: u32,
    pub report: EvaluationReport,
    pub improved: bool,
}

/// Result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Best aggregate known before the run started.
    pub initial_best: f64,
    pub best_score: f64,
    /// Name of the run's best candidate, if any beat `initial_best`.
    pub best_policy: Option<String>,
    pub iterations: Vec<IterationSummary>,
}

/// A candidate that built and was evaluated at one iteration index.
struct Evaluated {
    candidate: PolicyCandidate,
    report: EvaluationReport,
    attempts: u32,
}

/// Drives the search loop over its five collaborators.
pub struct SearchController<R, P, F, T, H> {
    repo: R,
    provider: P,
    pipeline: EvaluationPipeline<F, T, H>,
    composer: PromptComposer,
    parser: ResponseParser,
    retry: BuildRetryPolicy,
    settings: SearchSettings,
}

impl<R, P, F, T, H> SearchController<R, P, F, T, H>
where
    R: TrialRepository,
    P: LlmProvider,
    F: FileSystem,
    T: Toolchain,
    H: Harness,
{
    pub fn new(
        repo: R,
        provider: P,
        pipeline: EvaluationPipeline<F, T, H>,
        contract: OutputContract,
        settings: SearchSettings,
    ) -> Self {
        Self {
            repo,
            provider,
            pipeline,
            composer: PromptComposer::new(contract),
            parser: ResponseParser::new(contract),
            retry: BuildRetryPolicy::new(settings.retry.clone()),
            settings,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Top aggregate trials by score and the state seeded from them.
    ///
    /// With no history the best-known score starts at zero.
    pub async fn initial_state(&self) -> Result<(LoopState, Vec<Trial>), SearchError> {
        let history = self
            .repo
            .top_by_score(AGGREGATE_WORKLOAD, self.settings.history_top_k)
            .await?;
        let initial_best = history.first().map(|t| t.score).unwrap_or(0.0);
        Ok((
            LoopState::new(self.settings.max_iterations, initial_best),
            history,
        ))
    }

    /// Run until the iteration budget is spent or a fatal error occurs.
    #[tracing::instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self) -> Result<RunSummary, SearchError> {
        let run_id = Uuid::now_v7();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let workloads = known_workloads(&self.repo, self.pipeline.workloads()).await?;
        let (mut state, history) = self.initial_state().await?;
        let initial_best = state.best_score;
        tracing::info!(
            best_score = %format_percent(initial_best),
            history = history.len(),
            max_iterations = state.max_iterations,
            "starting search"
        );

        let mut iterations = Vec::new();
        let mut best_policy = None;

        while !state.is_done() {
            let iteration = state.iteration;
            let evaluated = self.run_iteration(run_id, &state, &workloads, &history).await?;

            let policy = evaluated.candidate.name.clone();
            state = state.decide(evaluated.candidate, evaluated.report.aggregate);
            let improved = state
                .previous
                .as_ref()
                .is_some_and(|p| p.feedback.improved());
            if improved {
                best_policy = Some(policy.clone());
            }

            tracing::info!(
                iteration,
                policy = %policy,
                aggregate = %format_percent(evaluated.report.aggregate),
                best_score = %format_percent(state.best_score),
                improved,
                "iteration complete"
            );

            iterations.push(IterationSummary {
                iteration,
                attempts: evaluated.attempts,
                report: evaluated.report,
                improved,
            });
        }

        Ok(RunSummary {
            run_id,
            initial_best,
            best_score: state.best_score,
            best_policy,
            iterations,
        })
    }

    /// Produce one evaluated candidate at `state.iteration`, regenerating
    /// after build failures until the retry bound is hit.
    ///
    /// Artifacts land under the run's own subdirectory.
    #[tracing::instrument(skip_all, fields(iteration = state.iteration))]
    async fn run_iteration(
        &self,
        run_id: Uuid,
        state: &LoopState,
        workloads: &[WorkloadSummary],
        history: &[Trial],
    ) -> Result<Evaluated, SearchError> {
        let iteration = state.iteration;
        let tag = ArtifactTag::Iteration {
            run: run_id,
            index: iteration,
        };
        let mut attempt = 1;

        loop {
            let prompt = match &state.previous {
                Some(previous) => self.composer.refinement(workloads, previous),
                None => self.composer.cold_start(workloads, history),
            };
            tracing::debug!(attempt, cold_start = state.is_cold_start(), "prompt composed");

            let text = self.generate(prompt, attempt).await?;
            let candidate = self.parser.parse(&text).inspect_err(|e| {
                tracing::error!(attempt, error = %e, "response did not follow the output contract");
            })?;
            tracing::info!(attempt, policy = %candidate.name, "candidate parsed");

            let outcome = self
                .pipeline
                .run(&self.repo, tag, &candidate)
                .await
                .inspect_err(|e| {
                    tracing::warn!(
                        iteration,
                        error = %e,
                        "evaluation aborted; trials already recorded for this iteration are kept"
                    );
                })?;

            match outcome {
                PipelineOutcome::Evaluated(report) => {
                    return Ok(Evaluated {
                        candidate,
                        report,
                        attempts: attempt,
                    });
                }
                PipelineOutcome::BuildFailed {
                    artifact,
                    status,
                    diagnostics,
                } => {
                    tracing::warn!(
                        attempt,
                        artifact = %artifact.display(),
                        ?status,
                        diagnostics = %diagnostics.trim(),
                        "candidate failed to build"
                    );
                    if !self.retry.should_retry(attempt) {
                        tracing::error!(
                            iteration,
                            max_attempts = self.retry.max_attempts(),
                            "no candidate built within the retry bound"
                        );
                        return Err(SearchError::BuildRetriesExhausted {
                            iteration,
                            attempts: attempt,
                        });
                    }
                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off before regenerating");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One generation call, bounded by the configured timeout.
    async fn generate(&self, prompt: String, attempt: u32) -> Result<String, SearchError> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            prompt,
            reasoning_effort: Some(self.settings.reasoning_effort),
            max_tokens: self.settings.max_tokens,
        };

        let span = tracing::info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            attempt,
        );

        let timeout = self.settings.generation_timeout;
        let response = tokio::time::timeout(timeout, self.provider.complete(&request))
            .instrument(span)
            .await
            .map_err(|_| LlmError::Timeout {
                secs: timeout.as_secs(),
            })??;

        tracing::debug!(
            response_id = %response.id,
            output_tokens = response.usage.output_tokens,
            "response received"
        );
        Ok(response.content)
    }
}
