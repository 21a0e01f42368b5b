//! Azure OpenAI chat-completion client.
//!
//! Azure scopes a completion endpoint to a deployment rather than a model
//! name, authenticates with an `api-key` header and requires an
//! `api-version` query parameter. The request and response bodies are the
//! same OpenAI shape handled in [`super::litellm`].

use async_trait::async_trait;
use reqwest::Client;

use super::litellm::{
    build_http_client, send_completion, ApiRequest, CompletionRequest, CompletionResponse,
    LlmProvider,
};
use crate::error::LlmError;

/// API version used when `AZURE_OPENAI_API_VERSION` is not set.
pub const DEFAULT_API_VERSION: &str = "2024-06-01";

/// Client for an Azure OpenAI deployment.
pub struct AzureOpenAiClient {
    endpoint: String,
    deployment: String,
    api_key: String,
    api_version: String,
    http_client: Client,
}

impl AzureOpenAiClient {
    /// Create a client for `deployment` on the resource at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ClientBuild` if the HTTP client cannot be created.
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            http_client: build_http_client()?,
        })
    }

    /// Full chat-completions URL for the configured deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiClient {
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // The deployment selects the model; a model field in the body is ignored.
        let api_request = ApiRequest {
            model: None,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
        };

        let url = self.completions_url();
        let http_request = self
            .http_client
            .post(&url)
            .header("api-key", &self.api_key);

        tracing::debug!(deployment = %self.deployment, "Sending Azure completion request");
        send_completion(http_request, &api_request).await
    }
}
