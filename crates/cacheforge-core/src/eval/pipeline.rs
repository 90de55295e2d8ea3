//! EvaluationPipeline: persist, build, evaluate, record.
//!
//! A candidate's source is written to the artifact directory, built once, and
//! then run through the harness on every configured workload in order. Each
//! per-workload trial is recorded as soon as its hit rate is known; the
//! aggregate trial under [`AGGREGATE_WORKLOAD`] is recorded last.

use std::path::{Path, PathBuf};

use cacheforge_types::error::SearchError;
use cacheforge_types::policy::PolicyCandidate;
use cacheforge_types::trial::TrialRecord;
use cacheforge_types::workload::{Workload, AGGREGATE_WORKLOAD};
use serde::Serialize;
use uuid::Uuid;

use crate::eval::metric::{mean, parse_hit_rate};
use crate::eval::tools::{BuildOutcome, Harness, Toolchain};
use crate::fs::FileSystem;
use crate::repository::trial::TrialRepository;

/// Workload description stored on aggregate trials.
pub const AGGREGATE_DESCRIPTION: &str = "Mean hit rate across all configured workloads";

/// Where an artifact comes from; decides its path under the artifact
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactTag {
    /// Generated by the search loop: `run` is the run's id and `index` the
    /// iteration within it.
    Iteration { run: Uuid, index: u32 },
    /// Supplied by hand (baseline seeding).
    Seed,
}

impl ArtifactTag {
    /// `007_adaptive_ship.cc` for iteration 7, `seed_adaptive_ship.cc` for seeds.
    pub fn file_name(&self, token: &str) -> String {
        match self {
            ArtifactTag::Iteration { index, .. } => format!("{index:03}_{token}.cc"),
            ArtifactTag::Seed => format!("seed_{token}.cc"),
        }
    }

    /// Path relative to the artifact directory. Iteration artifacts live in
    /// a per-run subdirectory so a later run never overwrites the source an
    /// earlier trial points at.
    pub fn relative_path(&self, token: &str) -> PathBuf {
        match self {
            ArtifactTag::Iteration { run, .. } => {
                PathBuf::from(run.to_string()).join(self.file_name(token))
            }
            ArtifactTag::Seed => PathBuf::from(self.file_name(token)),
        }
    }
}

/// Hit rate measured on one workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadResult {
    pub workload: String,
    pub hit_rate: f64,
}

/// Everything measured for one built candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub policy: String,
    pub artifact: PathBuf,
    pub results: Vec<WorkloadResult>,
    /// Mean of `results`, as recorded under the aggregate label.
    pub aggregate: f64,
}

/// Outcome of running a candidate through the whole pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Evaluated(EvaluationReport),
    /// The toolchain rejected the source. Nothing was recorded.
    BuildFailed {
        artifact: PathBuf,
        status: Option<i32>,
        diagnostics: String,
    },
}

/// Owns the filesystem, toolchain, and harness ports plus the workload list.
pub struct EvaluationPipeline<F, T, H> {
    fs: F,
    toolchain: T,
    harness: H,
    artifact_dir: PathBuf,
    workloads: Vec<Workload>,
}

impl<F: FileSystem, T: Toolchain, H: Harness> EvaluationPipeline<F, T, H> {
    pub fn new(
        fs: F,
        toolchain: T,
        harness: H,
        artifact_dir: impl Into<PathBuf>,
        workloads: Vec<Workload>,
    ) -> Self {
        Self {
            fs,
            toolchain,
            harness,
            artifact_dir: artifact_dir.into(),
            workloads,
        }
    }

    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    pub fn artifact_path(&self, tag: ArtifactTag, candidate: &PolicyCandidate) -> PathBuf {
        self.artifact_dir.join(tag.relative_path(&candidate.token()))
    }

    /// First seed path not already taken: `seed_x.cc`, then `seed_x_2.cc`,
    /// `seed_x_3.cc`, and so on.
    async fn free_seed_path(&self, candidate: &PolicyCandidate) -> PathBuf {
        let token = candidate.token();
        let mut path = self.artifact_path(ArtifactTag::Seed, candidate);
        let mut n = 2u32;
        while self.fs.exists(&path).await {
            path = self
                .artifact_dir
                .join(ArtifactTag::Seed.file_name(&format!("{token}_{n}")));
            n += 1;
        }
        path
    }

    /// Write the candidate's source. A build retry at the same iteration tag
    /// overwrites the previous attempt's file; seeds never overwrite.
    #[tracing::instrument(skip(self, candidate), fields(policy = %candidate.name))]
    pub async fn persist_artifact(
        &self,
        tag: ArtifactTag,
        candidate: &PolicyCandidate,
    ) -> Result<PathBuf, SearchError> {
        let path = match tag {
            ArtifactTag::Seed => self.free_seed_path(candidate).await,
            ArtifactTag::Iteration { .. } => self.artifact_path(tag, candidate),
        };
        self.fs
            .write_file(&path, &candidate.source)
            .await
            .map_err(|source| SearchError::Artifact {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(artifact = %path.display(), "artifact written");
        Ok(path)
    }

    /// Build the artifact into a sibling `.out` executable.
    #[tracing::instrument(skip(self), fields(artifact = %artifact.display()))]
    pub async fn build(&self, artifact: &Path) -> Result<BuildOutcome, SearchError> {
        let executable = artifact.with_extension("out");
        let outcome = self.toolchain.build(artifact, &executable).await?;
        match &outcome {
            BuildOutcome::Built { executable } => {
                tracing::info!(executable = %executable.display(), "build succeeded");
            }
            BuildOutcome::Failed { status, .. } => {
                tracing::warn!(?status, "build failed");
            }
        }
        Ok(outcome)
    }

    /// Run the harness on every workload, recording one trial per workload
    /// and then the aggregate.
    ///
    /// Per-workload trials already recorded stay in place if a later
    /// workload fails.
    #[tracing::instrument(skip_all, fields(policy = %candidate.name))]
    pub async fn evaluate<R: TrialRepository>(
        &self,
        repo: &R,
        candidate: &PolicyCandidate,
        artifact: &Path,
        executable: &Path,
    ) -> Result<EvaluationReport, SearchError> {
        let artifact_reference = artifact.display().to_string();
        let mut results = Vec::with_capacity(self.workloads.len());

        for workload in &self.workloads {
            let output = self.harness.run(executable, &workload.trace).await?;
            let hit_rate = parse_hit_rate(&output).map_err(|source| SearchError::Metric {
                workload: workload.name.clone(),
                source,
            })?;

            repo.record(&TrialRecord::from_hit_rate(
                &workload.name,
                &candidate.name,
                &candidate.description,
                &workload.description,
                &artifact_reference,
                hit_rate,
            ))
            .await?;

            tracing::info!(workload = %workload.name, hit_rate, "workload evaluated");
            results.push(WorkloadResult {
                workload: workload.name.clone(),
                hit_rate,
            });
        }

        let rates: Vec<f64> = results.iter().map(|r| r.hit_rate).collect();
        let aggregate = mean(&rates);
        repo.record(&TrialRecord::from_hit_rate(
            AGGREGATE_WORKLOAD,
            &candidate.name,
            &candidate.description,
            AGGREGATE_DESCRIPTION,
            &artifact_reference,
            aggregate,
        ))
        .await?;

        tracing::info!(aggregate, "candidate evaluated");
        Ok(EvaluationReport {
            policy: candidate.name.clone(),
            artifact: artifact.to_path_buf(),
            results,
            aggregate,
        })
    }

    /// Persist, build, and (if the build succeeds) evaluate a candidate.
    pub async fn run<R: TrialRepository>(
        &self,
        repo: &R,
        tag: ArtifactTag,
        candidate: &PolicyCandidate,
    ) -> Result<PipelineOutcome, SearchError> {
        let artifact = self.persist_artifact(tag, candidate).await?;
        match self.build(&artifact).await? {
            BuildOutcome::Built { executable } => {
                let report = self.evaluate(repo, candidate, &artifact, &executable).await?;
                Ok(PipelineOutcome::Evaluated(report))
            }
            BuildOutcome::Failed { status, diagnostics } => Ok(PipelineOutcome::BuildFailed {
                artifact,
                status,
                diagnostics,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        llc_output, workloads, InMemoryFileSystem, InMemoryRepository, ScriptedHarness,
        ScriptedToolchain,
    };
    use cacheforge_types::error::MetricError;

    fn pipeline(
        toolchain: ScriptedToolchain,
        harness: ScriptedHarness,
    ) -> EvaluationPipeline<InMemoryFileSystem, ScriptedToolchain, ScriptedHarness> {
        EvaluationPipeline::new(
            InMemoryFileSystem::new(),
            toolchain,
            harness,
            "new_policies",
            workloads(),
        )
    }

    fn candidate() -> PolicyCandidate {
        PolicyCandidate::new("Adaptive SHiP-D", "Signature hit predictor.", "// source")
    }

    const RUN: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0001);

    fn iteration(index: u32) -> ArtifactTag {
        ArtifactTag::Iteration { run: RUN, index }
    }

    fn run_dir() -> String {
        format!("new_policies/{RUN}")
    }

    #[test]
    fn test_artifact_file_names() {
        assert_eq!(iteration(7).file_name("ship"), "007_ship.cc");
        assert_eq!(iteration(1234).file_name("ship"), "1234_ship.cc");
        assert_eq!(ArtifactTag::Seed.file_name("ship"), "seed_ship.cc");
        assert_eq!(
            iteration(7).relative_path("ship"),
            PathBuf::from(RUN.to_string()).join("007_ship.cc")
        );
        assert_eq!(ArtifactTag::Seed.relative_path("ship"), PathBuf::from("seed_ship.cc"));
    }

    #[tokio::test]
    async fn test_second_run_keeps_first_runs_artifact() {
        let pipeline = pipeline(
            ScriptedToolchain::always_builds(),
            ScriptedHarness::with_rates(&[0.5; 5]),
        );
        let repo = InMemoryRepository::new();
        let first_run = Uuid::now_v7();
        let second_run = Uuid::now_v7();
        let first = PolicyCandidate::new("Adaptive SHiP-D", "v1", "// first run");
        let second = PolicyCandidate::new("Adaptive SHiP-D", "v2", "// second run");

        pipeline
            .run(&repo, ArtifactTag::Iteration { run: first_run, index: 0 }, &first)
            .await
            .unwrap();
        pipeline
            .run(&repo, ArtifactTag::Iteration { run: second_run, index: 0 }, &second)
            .await
            .unwrap();

        let rows = repo.rows();
        assert_eq!(rows.len(), 12);
        assert_ne!(rows[0].artifact_reference, rows[6].artifact_reference);
        assert_eq!(
            pipeline.file_system().get(&rows[0].artifact_reference).as_deref(),
            Some("// first run")
        );
        assert_eq!(
            pipeline.file_system().get(&rows[6].artifact_reference).as_deref(),
            Some("// second run")
        );
    }

    #[tokio::test]
    async fn test_seed_never_overwrites() {
        let pipeline = pipeline(
            ScriptedToolchain::always_builds(),
            ScriptedHarness::with_rates(&[0.4; 5]),
        );
        let first = pipeline
            .persist_artifact(ArtifactTag::Seed, &candidate())
            .await
            .unwrap();
        let replacement = PolicyCandidate::new("Adaptive SHiP-D", "again", "// replacement");
        let second = pipeline
            .persist_artifact(ArtifactTag::Seed, &replacement)
            .await
            .unwrap();
        let third = pipeline
            .persist_artifact(ArtifactTag::Seed, &replacement)
            .await
            .unwrap();

        assert_eq!(second, PathBuf::from("new_policies/seed_adaptive_ship_d_2.cc"));
        assert_eq!(third, PathBuf::from("new_policies/seed_adaptive_ship_d_3.cc"));
        assert_eq!(pipeline.file_system().get(&first).as_deref(), Some("// source"));
        assert_eq!(pipeline.file_system().get(&second).as_deref(), Some("// replacement"));
    }

    #[tokio::test]
    async fn test_run_records_each_workload_then_mean() {
        let harness = ScriptedHarness::with_rates(&[0.80, 0.60, 0.70, 0.90, 0.50]);
        let pipeline = pipeline(ScriptedToolchain::always_builds(), harness);
        let repo = InMemoryRepository::new();

        let outcome = pipeline
            .run(&repo, iteration(3), &candidate())
            .await
            .unwrap();
        let PipelineOutcome::Evaluated(report) = outcome else {
            panic!("expected evaluation");
        };

        let expected = format!("{}/003_adaptive_ship_d.cc", run_dir());
        assert_eq!(report.artifact, PathBuf::from(&expected));
        assert!((report.aggregate - 0.70).abs() < 1e-9);
        assert_eq!(
            pipeline.file_system().get(&expected).as_deref(),
            Some("// source")
        );

        let rows = repo.rows();
        assert_eq!(rows.len(), 6);
        let labels: Vec<&str> = rows.iter().map(|t| t.workload.as_str()).collect();
        assert_eq!(labels, vec!["astar", "lbm", "mcf", "milc", "omnetpp", "all"]);
        assert!(rows.iter().all(|t| t.artifact_reference == expected));
        assert!(rows.iter().all(|t| t.score == t.hit_rate));

        let all = &rows[5];
        assert!((all.hit_rate - 0.70).abs() < 1e-9);
        assert_eq!(all.workload_description, AGGREGATE_DESCRIPTION);
        assert_eq!(rows[0].workload_description, "astar description");
    }

    #[tokio::test]
    async fn test_build_failure_records_nothing() {
        let pipeline = pipeline(
            ScriptedToolchain::failing_first(1),
            ScriptedHarness::with_rates(&[0.5; 5]),
        );
        let repo = InMemoryRepository::new();

        let outcome = pipeline
            .run(&repo, iteration(0), &candidate())
            .await
            .unwrap();
        assert!(matches!(outcome, PipelineOutcome::BuildFailed { status: Some(1), .. }));
        assert!(repo.rows().is_empty());
    }

    #[tokio::test]
    async fn test_metric_failure_keeps_earlier_trials() {
        let harness = ScriptedHarness::new(vec![
            llc_output(50, 100),
            llc_output(25, 100),
            "simulation crashed before stats".to_string(),
        ]);
        let pipeline = pipeline(ScriptedToolchain::always_builds(), harness);
        let repo = InMemoryRepository::new();

        let err = pipeline
            .run(&repo, iteration(0), &candidate())
            .await
            .unwrap_err();
        match err {
            SearchError::Metric { workload, source } => {
                assert_eq!(workload, "mcf");
                assert_eq!(source, MetricError::MissingLine);
            }
            other => panic!("unexpected error: {other}"),
        }

        let labels: Vec<String> = repo.rows().into_iter().map(|t| t.workload).collect();
        assert_eq!(labels, vec!["astar", "lbm"]);
    }

    #[tokio::test]
    async fn test_seed_tag() {
        let pipeline = pipeline(
            ScriptedToolchain::always_builds(),
            ScriptedHarness::with_rates(&[0.4; 5]),
        );
        let path = pipeline
            .persist_artifact(ArtifactTag::Seed, &candidate())
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("new_policies/seed_adaptive_ship_d.cc"));
    }
}
