//! LlmProvider trait definition.
//!
//! The code-generation service is an external collaborator; the search loop
//! only needs one blocking-style call: send a prompt, get text back.

use cacheforge_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for code-generation backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in cacheforge-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
