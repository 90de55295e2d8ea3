//! Configuration for the OpenAI-compatible provider.

use std::time::Duration;

use secrecy::SecretString;

use cacheforge_types::config::GenerationConfig;

/// Connection settings for an OpenAI-compatible chat completions endpoint.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name used in spans (e.g., "openai").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl OpenAiCompatConfig {
    pub fn from_generation(config: &GenerationConfig, api_key: SecretString) -> Self {
        Self {
            provider_name: provider_name_for(&config.base_url).to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: config.timeout(),
        }
    }
}

/// Infer a provider label from the base URL host.
fn provider_name_for(base_url: &str) -> &'static str {
    if base_url.contains("api.openai.com") {
        "openai"
    } else if base_url.contains("azure") {
        "azure_openai"
    } else if base_url.contains("localhost") || base_url.contains("127.0.0.1") {
        "local"
    } else {
        "openai_compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_generation_trims_trailing_slash() {
        let config = GenerationConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            timeout_secs: 30,
            ..GenerationConfig::default()
        };
        let oai = OpenAiCompatConfig::from_generation(&config, SecretString::from("k".to_string()));
        assert_eq!(oai.base_url, "http://localhost:8080/v1");
        assert_eq!(oai.provider_name, "local");
        assert_eq!(oai.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_provider_name_for_defaults() {
        assert_eq!(provider_name_for("https://api.openai.com/v1"), "openai");
        assert_eq!(provider_name_for("https://llm.example.com/v1"), "openai_compatible");
    }
}
