//! Trial types: the append-only record of every evaluated (candidate, workload) pair.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrialError;

/// A recorded trial as read back from the experiment store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Monotonic row id; defines insertion order for tie-breaking.
    pub id: i64,
    pub workload: String,
    pub policy: String,
    pub policy_description: String,
    pub workload_description: String,
    /// Path of the source artifact the trial was built from.
    pub artifact_reference: String,
    pub hit_rate: f64,
    pub score: f64,
    pub recorded_at: DateTime<Utc>,
}

/// A trial about to be appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub workload: String,
    pub policy: String,
    pub policy_description: String,
    pub workload_description: String,
    pub artifact_reference: String,
    pub hit_rate: f64,
    pub score: f64,
}

impl TrialRecord {
    /// Build a record whose score mirrors its hit rate.
    pub fn from_hit_rate(
        workload: impl Into<String>,
        policy: impl Into<String>,
        policy_description: impl Into<String>,
        workload_description: impl Into<String>,
        artifact_reference: impl Into<String>,
        hit_rate: f64,
    ) -> Self {
        Self {
            workload: workload.into(),
            policy: policy.into(),
            policy_description: policy_description.into(),
            workload_description: workload_description.into(),
            artifact_reference: artifact_reference.into(),
            hit_rate,
            score: hit_rate,
        }
    }

    /// Check the record invariants: finite score, hit rate within `[0, 1]`.
    pub fn validate(&self) -> Result<(), TrialError> {
        if self.workload.trim().is_empty() {
            return Err(TrialError::EmptyWorkload);
        }
        if !self.hit_rate.is_finite() || !(0.0..=1.0).contains(&self.hit_rate) {
            return Err(TrialError::HitRateOutOfRange(self.hit_rate));
        }
        if !self.score.is_finite() {
            return Err(TrialError::NonFiniteScore(self.score));
        }
        Ok(())
    }
}

/// Metric a ranking query orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    HitRate,
    Score,
}

impl RankMetric {
    /// Store column holding this metric.
    pub fn column(&self) -> &'static str {
        match self {
            RankMetric::HitRate => "hit_rate",
            RankMetric::Score => "score",
        }
    }

    /// Read this metric from a trial.
    pub fn value(&self, trial: &Trial) -> f64 {
        match self {
            RankMetric::HitRate => trial.hit_rate,
            RankMetric::Score => trial.score,
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankMetric::HitRate => write!(f, "hit_rate"),
            RankMetric::Score => write!(f, "score"),
        }
    }
}

/// One distinct workload label with its (first-seen) description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub label: String,
    pub description: String,
}

/// A stored row's workload label paired with its artifact reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadArtifact {
    pub label: String,
    pub artifact_reference: String,
}

/// Format a hit rate in `[0, 1]` as a percentage with two decimals.
pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}
