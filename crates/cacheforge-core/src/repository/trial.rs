//! Trial repository trait definition.

use cacheforge_types::error::RepositoryError;
use cacheforge_types::trial::{RankMetric, Trial, TrialRecord, WorkloadArtifact, WorkloadSummary};

/// Repository trait for the append-only experiment history.
///
/// Rows are never updated or deleted. Queries that match nothing return an
/// empty result; errors are reserved for connectivity and storage faults.
pub trait TrialRepository: Send + Sync {
    /// Append one trial. No dedup, no upsert. Returns the stored row.
    fn record(
        &self,
        record: &TrialRecord,
    ) -> impl std::future::Future<Output = Result<Trial, RepositoryError>> + Send;

    /// Up to `limit` trials for `workload`, best `metric` first.
    ///
    /// Ties keep insertion order.
    fn top_by(
        &self,
        workload: &str,
        metric: RankMetric,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Trial>, RepositoryError>> + Send;

    /// Up to `limit` trials for `workload` ordered by hit rate descending.
    fn top_by_hit_rate(
        &self,
        workload: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Trial>, RepositoryError>> + Send {
        self.top_by(workload, RankMetric::HitRate, limit)
    }

    /// Up to `limit` trials for `workload` ordered by score descending.
    fn top_by_score(
        &self,
        workload: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Trial>, RepositoryError>> + Send {
        self.top_by(workload, RankMetric::Score, limit)
    }

    /// Distinct workload labels, each with its first-seen description,
    /// sorted by label.
    fn workloads_with_descriptions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<WorkloadSummary>, RepositoryError>> + Send;

    /// Same as [`Self::workloads_with_descriptions`], plus every stored row's
    /// label paired with its artifact reference (in insertion order).
    fn workloads_with_artifacts(
        &self,
    ) -> impl std::future::Future<
        Output = Result<(Vec<WorkloadSummary>, Vec<WorkloadArtifact>), RepositoryError>,
    > + Send;
}
