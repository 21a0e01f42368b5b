//! Completion-service integration for recordforge.
//!
//! Every record is produced by one or more chat-completion calls made
//! through the [`LlmProvider`] trait. Two providers are available:
//!
//! - [`LiteLlmClient`] for any OpenAI-compatible `/chat/completions`
//!   endpoint (a LiteLLM proxy, OpenRouter, OpenAI).
//! - [`AzureOpenAiClient`] for an Azure OpenAI deployment.
//!
//! ```ignore
//! use recordforge::llm::{CompletionRequest, LiteLlmClient, LlmProvider, Message};
//!
//! let client = LiteLlmClient::from_env()?;
//! let request = CompletionRequest::new("", vec![Message::user("Say hi")])
//!     .with_max_tokens(50);
//! let text = client.complete(request).await?;
//! ```

pub mod azure;
pub mod litellm;

pub use azure::{AzureOpenAiClient, DEFAULT_API_VERSION};
pub use litellm::{
    Choice, CompletionRequest, CompletionResponse, LiteLlmClient, LlmProvider, Message, Usage,
    DEFAULT_MODEL,
};
