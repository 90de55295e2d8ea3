//! Generation provider implementations.
//!
//! Contains the concrete [`LlmProvider`](cacheforge_core::llm::provider::LlmProvider)
//! used by the search loop, plus a factory that resolves the API key from
//! the environment.

pub mod openai_compat;

use secrecy::SecretString;

use cacheforge_types::config::GenerationConfig;
use cacheforge_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Build the generation provider from config, reading the API key from the
/// environment variable named by `api_key_env`.
pub fn create_provider(config: &GenerationConfig) -> Result<OpenAiCompatibleProvider, LlmError> {
    let key = std::env::var(&config.api_key_env).map_err(|_| {
        tracing::error!(env = %config.api_key_env, "generation API key not set");
        LlmError::AuthenticationFailed
    })?;
    create_provider_with_key(config, SecretString::from(key))
}

/// Build the generation provider with an already-resolved key.
pub fn create_provider_with_key(
    config: &GenerationConfig,
    api_key: SecretString,
) -> Result<OpenAiCompatibleProvider, LlmError> {
    OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_generation(config, api_key))
}
