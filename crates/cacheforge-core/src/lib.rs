//! Search loop and port trait definitions for cacheforge.
//!
//! This crate defines the "ports" (repository, generation, toolchain, harness,
//! and filesystem traits) that the infrastructure layer implements, plus the
//! logic that drives them: prompt composition, response parsing, the
//! build-and-evaluate pipeline, and the search controller. It depends only on
//! `cacheforge-types` -- never on `cacheforge-infra` or any database/IO crate.

pub mod eval;
pub mod fs;
pub mod llm;
pub mod prompt;
pub mod repository;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;
