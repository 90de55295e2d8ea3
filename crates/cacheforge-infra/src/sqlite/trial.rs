//! SQLite trial repository implementation.
//!
//! Implements `TrialRepository` from `cacheforge-core` over the append-only
//! `experiments` table. Insertion order is the autoincrement row id, which
//! also breaks ranking ties.

use cacheforge_core::repository::trial::TrialRepository;
use cacheforge_types::error::RepositoryError;
use cacheforge_types::trial::{RankMetric, Trial, TrialRecord, WorkloadArtifact, WorkloadSummary};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `TrialRepository`.
pub struct SqliteTrialRepository {
    pool: DatabasePool,
}

impl SqliteTrialRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Pool-level failures mean the store is unreachable; anything else is a
/// failed statement.
fn map_sqlx(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            tracing::error!(error = %e, "database connection error");
            RepositoryError::Connection
        }
        _ => RepositoryError::Query(e.to_string()),
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn row_to_trial(row: &sqlx::sqlite::SqliteRow) -> Result<Trial, RepositoryError> {
    let get_str = |col: &str| -> Result<String, RepositoryError> {
        row.try_get(col)
            .map_err(map_sqlx)
    };
    let get_f64 = |col: &str| -> Result<f64, RepositoryError> {
        row.try_get(col)
            .map_err(map_sqlx)
    };

    Ok(Trial {
        id: row
            .try_get("id")
            .map_err(map_sqlx)?,
        workload: get_str("workload")?,
        policy: get_str("policy")?,
        policy_description: get_str("policy_description")?,
        workload_description: get_str("workload_description")?,
        artifact_reference: get_str("artifact_reference")?,
        hit_rate: get_f64("hit_rate")?,
        score: get_f64("score")?,
        recorded_at: parse_datetime(&get_str("recorded_at")?)?,
    })
}

impl TrialRepository for SqliteTrialRepository {
    #[tracing::instrument(skip(self, record), fields(workload = %record.workload, policy = %record.policy))]
    async fn record(&self, record: &TrialRecord) -> Result<Trial, RepositoryError> {
        record.validate()?;
        let recorded_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO experiments
                (workload, policy, policy_description, workload_description,
                 artifact_reference, hit_rate, score, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.workload)
        .bind(&record.policy)
        .bind(&record.policy_description)
        .bind(&record.workload_description)
        .bind(&record.artifact_reference)
        .bind(record.hit_rate)
        .bind(record.score)
        .bind(recorded_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx)?;

        tracing::debug!(id = result.last_insert_rowid(), hit_rate = record.hit_rate, "trial recorded");

        Ok(Trial {
            id: result.last_insert_rowid(),
            workload: record.workload.clone(),
            policy: record.policy.clone(),
            policy_description: record.policy_description.clone(),
            workload_description: record.workload_description.clone(),
            artifact_reference: record.artifact_reference.clone(),
            hit_rate: record.hit_rate,
            score: record.score,
            recorded_at,
        })
    }

    async fn top_by(
        &self,
        workload: &str,
        metric: RankMetric,
        limit: u32,
    ) -> Result<Vec<Trial>, RepositoryError> {
        // The column name comes from a closed enum, never from input.
        let sql = format!(
            "SELECT * FROM experiments WHERE workload = ? ORDER BY {} DESC, id ASC LIMIT ?",
            metric.column()
        );
        let rows = sqlx::query(&sql)
            .bind(workload)
            .bind(i64::from(limit))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;

        tracing::debug!(workload, %metric, count = rows.len(), "ranked trials fetched");
        rows.iter().map(row_to_trial).collect()
    }

    async fn workloads_with_descriptions(&self) -> Result<Vec<WorkloadSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT workload, workload_description FROM experiments
             WHERE id IN (SELECT MIN(id) FROM experiments GROUP BY workload)
             ORDER BY workload",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| {
                Ok(WorkloadSummary {
                    label: row
                        .try_get("workload")
                        .map_err(map_sqlx)?,
                    description: row
                        .try_get("workload_description")
                        .map_err(map_sqlx)?,
                })
            })
            .collect()
    }

    async fn workloads_with_artifacts(
        &self,
    ) -> Result<(Vec<WorkloadSummary>, Vec<WorkloadArtifact>), RepositoryError> {
        let summaries = self.workloads_with_descriptions().await?;

        let rows = sqlx::query("SELECT workload, artifact_reference FROM experiments ORDER BY id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;

        let artifacts = rows
            .iter()
            .map(|row| {
                Ok(WorkloadArtifact {
                    label: row
                        .try_get("workload")
                        .map_err(map_sqlx)?,
                    artifact_reference: row
                        .try_get("artifact_reference")
                        .map_err(map_sqlx)?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok((summaries, artifacts))
    }
}
