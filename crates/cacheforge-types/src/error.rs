use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::ContractField;
use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in cacheforge-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("rejected trial: {0}")]
    Rejected(#[from] TrialError),
}

/// Violations of the trial record invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrialError {
    #[error("workload label is empty")]
    EmptyWorkload,

    #[error("hit rate {0} is outside [0, 1]")]
    HitRateOutOfRange(f64),

    #[error("score {0} is not finite")]
    NonFiniteScore(f64),
}

/// Per-field parse state reported by the response parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Found,
    /// The section header (or code fence) was not located.
    Missing,
    /// The header was located but the section had no content.
    Empty,
}

/// A generated response that does not satisfy the output contract.
///
/// No field values are carried: a response either yields a complete
/// candidate or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response does not follow output contract v{contract_version}: {}", describe_fields(.fields))]
pub struct ParseError {
    pub contract_version: u32,
    pub fields: Vec<(ContractField, FieldStatus)>,
}

impl ParseError {
    /// Status recorded for `field`, if the parser reported it.
    pub fn status(&self, field: ContractField) -> Option<FieldStatus> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, status)| *status)
    }
}

fn describe_fields(fields: &[(ContractField, FieldStatus)]) -> String {
    let bad: Vec<String> = fields
        .iter()
        .filter(|(_, status)| *status != FieldStatus::Found)
        .map(|(field, status)| {
            let what = match status {
                FieldStatus::Missing => "missing",
                FieldStatus::Empty => "empty",
                FieldStatus::Found => "found",
            };
            format!("{field} {what}")
        })
        .collect();
    bad.join(", ")
}

/// Errors from invoking the build toolchain or the evaluation harness.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("harness exited with status {status:?}: {stderr}")]
    HarnessExit { status: Option<i32>, stderr: String },

    #[error("output is not valid UTF-8: {0}")]
    Output(String),
}

/// Errors from extracting the hit-rate metric from harness output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("no 'LLC TOTAL ... ACCESS: <n> HIT: <n>' line in harness output")]
    MissingLine,

    #[error("LLC reported zero accesses")]
    ZeroAccesses,

    #[error("LLC reported {hits} hits for {accesses} accesses")]
    HitsExceedAccesses { hits: u64, accesses: u64 },

    #[error("invalid counter value: {0}")]
    InvalidCount(String),
}

/// Configuration values that cannot drive a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one workload is required")]
    NoWorkloads,

    #[error("workload label '{0}' is reserved for aggregate trials")]
    ReservedWorkload(String),

    #[error("duplicate workload label '{0}'")]
    DuplicateWorkload(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Top-level failure kinds of a search run.
///
/// Build failures are not listed: they are retried in place and only surface
/// as [`SearchError::BuildRetriesExhausted`] once the retry bound is hit.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("build failed {attempts} times at iteration {iteration}")]
    BuildRetriesExhausted { iteration: u32, attempts: u32 },

    #[error("metric parse failed for workload '{workload}': {source}")]
    Metric {
        workload: String,
        #[source]
        source: MetricError,
    },

    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("artifact i/o failed for {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_parse_error_lists_bad_fields_only() {
        let err = ParseError {
            contract_version: 1,
            fields: vec![
                (ContractField::Name, FieldStatus::Missing),
                (ContractField::Description, FieldStatus::Found),
                (ContractField::Code, FieldStatus::Empty),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("v1"));
        assert!(msg.contains("name missing"));
        assert!(msg.contains("code empty"));
        assert!(!msg.contains("description"));
        assert_eq!(err.status(ContractField::Code), Some(FieldStatus::Empty));
    }

    #[test]
    fn test_search_error_from_metric() {
        let err = SearchError::Metric {
            workload: "lbm".to_string(),
            source: MetricError::MissingLine,
        };
        assert!(err.to_string().contains("'lbm'"));
    }

    #[test]
    fn test_rejected_trial_display() {
        let err = RepositoryError::from(TrialError::HitRateOutOfRange(1.5));
        assert_eq!(err.to_string(), "rejected trial: hit rate 1.5 is outside [0, 1]");
    }
}
