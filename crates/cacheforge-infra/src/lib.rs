//! Infrastructure implementations for cacheforge.
//!
//! Concrete adapters for the ports defined in `cacheforge-core`: the SQLite
//! experiment store, the OpenAI-compatible generation provider, the g++
//! toolchain and simulator harness (both `tokio::process` with timeouts),
//! the local filesystem, and configuration loading.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod process;
pub mod sqlite;
