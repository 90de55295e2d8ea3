//! Shared domain types for cacheforge.
//!
//! This crate contains the types passed between the search loop and its
//! collaborators: workloads, policy candidates, recorded trials, the output
//! contract shared by prompt composition and response parsing, run
//! configuration, and the error enums.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod contract;
pub mod error;
pub mod llm;
pub mod policy;
pub mod trial;
pub mod workload;
