//! LiteLLM-compatible client implementation for recordforge.
//!
//! This module provides the chat-completion request/response types shared by
//! every provider, the [`LlmProvider`] trait, and a client for any
//! OpenAI-compatible `/chat/completions` endpoint (LiteLLM proxy, OpenRouter,
//! OpenAI itself).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::LlmError;

/// Default model used when neither the request nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Request timeout for completion calls.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 120;

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for a chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier. Empty means "use the provider's default".
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 - 2.0). Higher values = more random.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling parameter (0.0 - 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl CompletionRequest {
    /// Create a new completion request with default sampling parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the top_p for this request.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// Response from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Unique identifier for this response.
    pub id: String,
    /// Model that generated this response.
    pub model: String,
    /// Generated choices.
    pub choices: Vec<Choice>,
    /// Token usage statistics.
    pub usage: Usage,
}

impl CompletionResponse {
    /// Get the content of the first choice, if available.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// A single generated choice from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice in the response.
    pub index: u32,
    /// Generated message.
    pub message: Message,
    /// Reason the generation stopped (e.g., "stop", "length").
    pub finish_reason: String,
}

/// Token usage statistics for a completion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens generated.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// Trait for completion services that can generate text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Generate and return only the text of the first choice.
    ///
    /// A response without any non-empty content is reported as
    /// [`LlmError::EmptyCompletion`].
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let response = self.generate(request).await?;
        match response.first_content() {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            _ => Err(LlmError::EmptyCompletion),
        }
    }
}

/// Client for LiteLLM-compatible APIs.
pub struct LiteLlmClient {
    /// Base URL for the API.
    api_base: String,
    /// Optional API key for authentication.
    api_key: Option<String>,
    /// Default model to use for requests.
    default_model: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl LiteLlmClient {
    /// Create a new LiteLLM client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL for the API (e.g., "http://localhost:4000")
    /// * `api_key` - Optional API key for authentication
    /// * `default_model` - Default model to use when none is specified
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ClientBuild` if the HTTP client cannot be created.
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        default_model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            default_model: default_model.into(),
            http_client: build_http_client()?,
        })
    }

    /// Create a new LiteLLM client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `LITELLM_API_BASE`: Base URL for the API (required)
    /// - `LITELLM_API_KEY`: API key for authentication (optional)
    /// - `LITELLM_DEFAULT_MODEL`: Default model (defaults to [`DEFAULT_MODEL`])
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiBase` if `LITELLM_API_BASE` is not set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base = env::var("LITELLM_API_BASE").map_err(|_| LlmError::MissingApiBase)?;
        let api_key = env::var("LITELLM_API_KEY").ok();
        let default_model =
            env::var("LITELLM_DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self::new(api_base, api_key, default_model)
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Check if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Builds the shared HTTP client used by every provider.
pub(crate) fn build_http_client() -> Result<Client, LlmError> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| LlmError::ClientBuild(e.to_string()))
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) model: Option<String>,
    pub(crate) messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_p: Option<f64>,
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    index: u32,
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    role: String,
    // Content filters and tool calls can yield a null content.
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Sends a prepared request and converts the HTTP response.
///
/// Shared by every OpenAI-shaped provider; only the URL and authentication
/// headers differ between them.
pub(crate) async fn send_completion(
    http_request: reqwest::RequestBuilder,
    api_request: &ApiRequest,
) -> Result<CompletionResponse, LlmError> {
    let http_response = http_request
        .header("Content-Type", "application/json")
        .json(api_request)
        .send()
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

    let status = http_response.status();

    if !status.is_success() {
        let status_code = status.as_u16();

        let error_text = http_response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());

        return Err(classify_error(status_code, &error_text));
    }

    let api_response: ApiResponse = http_response
        .json()
        .await
        .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

    Ok(into_completion_response(api_response))
}

/// Maps a non-success HTTP status and body to an `LlmError`.
fn classify_error(status_code: u16, error_text: &str) -> LlmError {
    let message = serde_json::from_str::<ApiErrorResponse>(error_text)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| error_text.to_string());

    if status_code == 429 {
        return LlmError::RateLimited(message);
    }

    LlmError::ApiError {
        code: status_code,
        message,
    }
}

fn into_completion_response(api_response: ApiResponse) -> CompletionResponse {
    let choices = api_response
        .choices
        .into_iter()
        .map(|choice| Choice {
            index: choice.index,
            message: Message {
                role: choice.message.role,
                content: choice.message.content.unwrap_or_default(),
            },
            finish_reason: choice.finish_reason.unwrap_or_default(),
        })
        .collect();

    let usage = api_response
        .usage
        .map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    CompletionResponse {
        id: api_response.id,
        model: api_response.model,
        choices,
        usage,
    }
}

#[async_trait]
impl LlmProvider for LiteLlmClient {
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };

        let api_request = ApiRequest {
            model: Some(model),
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
        };

        let url = format!("{}/chat/completions", self.api_base);

        let mut http_request = self
            .http_client
            .post(&url)
            .header("HTTP-Referer", "https://recordforge.local")
            .header("X-Title", "recordforge");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        tracing::debug!(url = %url, model = ?api_request.model, "Sending completion request");
        send_completion(http_request, &api_request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are helpful.");
        assert_eq!(system.role, "system");
        assert_eq!(system.content, "You are helpful.");

        let user = Message::user("Hello");
        assert_eq!(user.role, "user");

        let assistant = Message::assistant("Hi there!");
        assert_eq!(assistant.role, "assistant");
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("gpt-4", vec![Message::user("test")])
            .with_temperature(0.7)
            .with_max_tokens(1000)
            .with_top_p(0.95);

        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.top_p, Some(0.95));
    }

    #[test]
    fn test_litellm_client_new_trims_trailing_slash() {
        let client = LiteLlmClient::new(
            "http://localhost:4000/",
            Some("test-key".to_string()),
            "gpt-4",
        )
        .expect("client should build");

        assert_eq!(client.api_base(), "http://localhost:4000");
        assert_eq!(client.default_model(), "gpt-4");
        assert!(client.has_api_key());
    }

    #[tokio::test]
    async fn test_litellm_client_generate_connection_error() {
        let client = LiteLlmClient::new("http://localhost:65535", None, "gpt-4")
            .expect("client should build");

        let request = CompletionRequest::new("gpt-4", vec![Message::user("test")]);
        let result = client.generate(request).await;

        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }

    #[test]
    fn test_api_request_serialization_skips_unset_fields() {
        let request = ApiRequest {
            model: Some("gpt-4".to_string()),
            messages: vec![Message::user("test")],
            temperature: Some(0.7),
            max_tokens: Some(1000),
            top_p: None,
        };

        let json = serde_json::to_string(&request).expect("serialization should succeed");
        assert!(json.contains("\"model\":\"gpt-4\""));
        assert!(json.contains("\"temperature\":0.7"));
        assert!(json.contains("\"max_tokens\":1000"));
        assert!(!json.contains("top_p"));
    }

    #[test]
    fn test_response_with_null_content_and_no_usage() {
        let body = r#"{
            "id": "cmpl-1",
            "model": "gpt-4",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}, "finish_reason": "content_filter"}]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(body).expect("should parse");
        let response = into_completion_response(parsed);

        assert_eq!(response.first_content(), Some(""));
        assert_eq!(response.usage.total_tokens, 0);
        assert_eq!(response.choices[0].finish_reason, "content_filter");
    }

    #[test]
    fn test_classify_error_rate_limit_and_api_error() {
        let body = r#"{"error": {"message": "slow down", "type": "rate_limit"}}"#;
        assert!(matches!(
            classify_error(429, body),
            LlmError::RateLimited(msg) if msg == "slow down"
        ));

        match classify_error(500, "upstream exploded") {
            LlmError::ApiError { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    struct FixedProvider(&'static str);

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn generate(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                id: "id".to_string(),
                model: "m".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(self.0),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_complete_rejects_blank_content() {
        let request = CompletionRequest::new("", vec![Message::user("hi")]);

        let ok = FixedProvider("hello").complete(request.clone()).await;
        assert_eq!(ok.expect("should succeed"), "hello");

        let blank = FixedProvider("   ").complete(request).await;
        assert!(matches!(blank, Err(LlmError::EmptyCompletion)));
    }
}
