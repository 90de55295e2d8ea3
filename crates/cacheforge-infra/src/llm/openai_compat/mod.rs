//! OpenAiCompatibleProvider -- concrete [`LlmProvider`] for any endpoint that
//! speaks the OpenAI chat completions protocol.
//!
//! Uses [`async_openai`] for type-safe request/response handling; the base
//! URL is configurable so local and proxy endpoints work the same way. The
//! prompt is sent as a single user message and the reasoning-effort hint is
//! forwarded as `reasoning_effort`, which o-series models honour.

pub mod config;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionResponse, ReasoningEffort as OaiReasoningEffort,
};
use async_openai::Client;
use secrecy::ExposeSecret;

use cacheforge_core::llm::provider::LlmProvider;
use cacheforge_observe::genai_attrs;
use cacheforge_types::llm::{CompletionRequest, CompletionResponse, LlmError, ReasoningEffort, Usage};

use self::config::OpenAiCompatConfig;

/// Generation provider over an OpenAI-compatible HTTP API.
///
/// Not `Debug`: the inner `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    timeout_secs: u64,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http),
            provider_name: config.provider_name,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// Build a [`CreateChatCompletionRequest`] from a [`CompletionRequest`].
    fn build_request(request: &CompletionRequest) -> CreateChatCompletionRequest {
        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(request.prompt.clone()),
                name: None,
            },
        )];

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            max_completion_tokens: request.max_tokens,
            reasoning_effort: request.reasoning_effort.map(map_reasoning_effort),
            ..Default::default()
        }
    }

    fn map_error(&self, err: async_openai::error::OpenAIError) -> LlmError {
        map_openai_error(err, self.timeout_secs)
    }
}

fn map_reasoning_effort(effort: ReasoningEffort) -> OaiReasoningEffort {
    match effort {
        ReasoningEffort::Low => OaiReasoningEffort::Low,
        ReasoningEffort::Medium => OaiReasoningEffort::Medium,
        ReasoningEffort::High => OaiReasoningEffort::High,
    }
}

/// Convert the wire response into the provider-agnostic shape.
///
/// An answer with no message content is an error: the parser has nothing
/// to work with.
fn into_completion(response: CreateChatCompletionResponse) -> Result<CompletionResponse, LlmError> {
    let content = response
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .ok_or_else(|| LlmError::Deserialization("response contained no message content".to_string()))?;

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: response.id,
        content,
        model: response.model,
        usage,
    })
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    #[tracing::instrument(
        name = "chat",
        skip_all,
        fields(
            gen_ai.operation.name = genai_attrs::OP_CHAT,
            gen_ai.provider.name = %self.provider_name,
            gen_ai.request.model = %request.model,
            gen_ai.response.id = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        )
    )]
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .chat()
            .create(Self::build_request(request))
            .await
            .map_err(|e| {
                let err = self.map_error(e);
                tracing::warn!(error = %err, "generation request failed");
                err
            })?;

        let completion = into_completion(response)?;

        let span = tracing::Span::current();
        span.record(genai_attrs::GEN_AI_RESPONSE_ID, completion.id.as_str());
        span.record(genai_attrs::GEN_AI_USAGE_INPUT_TOKENS, completion.usage.input_tokens);
        span.record(genai_attrs::GEN_AI_USAGE_OUTPUT_TOKENS, completion.usage.output_tokens);

        Ok(completion)
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError, timeout_secs: u64) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if error_type == "invalid_request_error" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => {
            if reqwest_err.is_timeout() {
                return LlmError::Timeout { secs: timeout_secs };
            }
            match reqwest_err.status().map(|s| s.as_u16()) {
                Some(401 | 403) => LlmError::AuthenticationFailed,
                Some(429) => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                Some(503 | 529) => LlmError::Overloaded(err.to_string()),
                _ => LlmError::Provider {
                    message: err.to_string(),
                },
            }
        }
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}
