//! Build-and-evaluate pipeline and its tool ports.

pub mod metric;
pub mod pipeline;
pub mod tools;

pub use pipeline::{ArtifactTag, EvaluationPipeline, EvaluationReport, PipelineOutcome, WorkloadResult};
pub use tools::{BuildOutcome, Harness, Toolchain};
