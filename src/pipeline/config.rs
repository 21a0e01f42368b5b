//! Configuration for batch generation and the completion service.
//!
//! [`GeneratorConfig`] holds the batch tuning knobs (concurrency, attempt
//! budget, deadline, seed, output location). [`ServiceSettings`] collects
//! completion-service settings from the environment and CLI and resolves
//! them into a [`ServiceConfig`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, LlmError};
use crate::llm::{AzureOpenAiClient, LiteLlmClient, LlmProvider, DEFAULT_API_VERSION, DEFAULT_MODEL};
use crate::record::OutputFormat;

/// Upper bound on attempts per record.
const MAX_ATTEMPTS_LIMIT: u32 = 20;

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Maximum number of records generated concurrently.
    pub concurrency: usize,
    /// Completion attempts per record before it is skipped.
    pub max_attempts: u32,
    /// Overall deadline for the generation phase of the batch.
    pub deadline: Option<Duration>,
    /// Base seed for per-record randomness. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Format requested from the completion service.
    pub output_format: OutputFormat,
    /// Directory records are written to.
    pub out_dir: PathBuf,
    /// Whether generation metadata is stamped onto records.
    pub write_metadata: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            max_attempts: 3,
            deadline: None,
            seed: None,
            output_format: OutputFormat::Yaml,
            out_dir: PathBuf::from("./output"),
            write_metadata: true,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RECORDFORGE_CONCURRENCY`: Concurrent records (default: 8)
    /// - `RECORDFORGE_MAX_ATTEMPTS`: Attempts per record (default: 3)
    /// - `RECORDFORGE_DEADLINE_SECS`: Batch deadline in seconds (default: none)
    /// - `RECORDFORGE_SEED`: Base RNG seed (default: none)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RECORDFORGE_CONCURRENCY") {
            config.concurrency = parse_env_value(&val, "RECORDFORGE_CONCURRENCY")?;
        }

        if let Ok(val) = std::env::var("RECORDFORGE_MAX_ATTEMPTS") {
            config.max_attempts = parse_env_value(&val, "RECORDFORGE_MAX_ATTEMPTS")?;
        }

        if let Ok(val) = std::env::var("RECORDFORGE_DEADLINE_SECS") {
            let secs: u64 = parse_env_value(&val, "RECORDFORGE_DEADLINE_SECS")?;
            config.deadline = Some(Duration::from_secs(secs));
        }

        if let Ok(val) = std::env::var("RECORDFORGE_SEED") {
            config.seed = Some(parse_env_value(&val, "RECORDFORGE_SEED")?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(ConfigError::ValidationFailed(format!(
                "max_attempts must be between 1 and {}",
                MAX_ATTEMPTS_LIMIT
            )));
        }

        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ValidationFailed(
                "deadline must be greater than 0".to_string(),
            ));
        }

        if self.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "out_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Builder method to set the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Builder method to set the batch deadline.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Builder method to set the base seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the output format.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Builder method to set the output directory.
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    /// Builder method to enable or disable generation metadata.
    pub fn with_metadata(mut self, enabled: bool) -> Self {
        self.write_metadata = enabled;
        self
    }
}

/// Completion-service settings gathered from the environment and CLI.
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    pub azure_endpoint: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_api_version: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl ServiceSettings {
    /// Reads settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_DEPLOYMENT`,
    ///   `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_API_VERSION`
    /// - `LITELLM_API_BASE`, `LITELLM_API_KEY`, `LITELLM_DEFAULT_MODEL`
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            azure_endpoint: var("AZURE_OPENAI_ENDPOINT"),
            azure_deployment: var("AZURE_OPENAI_DEPLOYMENT"),
            azure_api_key: var("AZURE_OPENAI_API_KEY"),
            azure_api_version: var("AZURE_OPENAI_API_VERSION"),
            api_base: var("LITELLM_API_BASE"),
            api_key: var("LITELLM_API_KEY"),
            model: var("LITELLM_DEFAULT_MODEL"),
        }
    }

    /// Returns these settings with every value set in `overrides` replaced.
    pub fn merge(self, overrides: ServiceSettings) -> Self {
        Self {
            azure_endpoint: overrides.azure_endpoint.or(self.azure_endpoint),
            azure_deployment: overrides.azure_deployment.or(self.azure_deployment),
            azure_api_key: overrides.azure_api_key.or(self.azure_api_key),
            azure_api_version: overrides.azure_api_version.or(self.azure_api_version),
            api_base: overrides.api_base.or(self.api_base),
            api_key: overrides.api_key.or(self.api_key),
            model: overrides.model.or(self.model),
        }
    }

    /// Chooses and validates the completion service.
    ///
    /// An Azure endpoint selects Azure OpenAI, which then requires a
    /// deployment and an API key. Otherwise an OpenAI-compatible API base is
    /// required.
    pub fn resolve(self) -> Result<ServiceConfig, ConfigError> {
        if let Some(endpoint) = self.azure_endpoint {
            let deployment = self
                .azure_deployment
                .ok_or_else(|| ConfigError::Missing("AZURE_OPENAI_DEPLOYMENT".to_string()))?;
            let api_key = self
                .azure_api_key
                .ok_or_else(|| ConfigError::Missing("AZURE_OPENAI_API_KEY".to_string()))?;

            return Ok(ServiceConfig::Azure {
                endpoint,
                deployment,
                api_key,
                api_version: self
                    .azure_api_version
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            });
        }

        let api_base = self.api_base.ok_or_else(|| {
            ConfigError::Missing(
                "LITELLM_API_BASE (or AZURE_OPENAI_ENDPOINT for Azure OpenAI)".to_string(),
            )
        })?;

        Ok(ServiceConfig::OpenAiCompatible {
            api_base,
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// A resolved completion-service configuration.
#[derive(Clone, PartialEq)]
pub enum ServiceConfig {
    OpenAiCompatible {
        api_base: String,
        api_key: Option<String>,
        model: String,
    },
    Azure {
        endpoint: String,
        deployment: String,
        api_key: String,
        api_version: String,
    },
}

impl ServiceConfig {
    /// Resolves the service from the environment alone.
    pub fn from_env() -> Result<Self, ConfigError> {
        ServiceSettings::from_env().resolve()
    }

    /// Short human-readable name of the selected service.
    pub fn describe(&self) -> String {
        match self {
            ServiceConfig::OpenAiCompatible {
                api_base, model, ..
            } => format!("{} via {}", model, api_base),
            ServiceConfig::Azure {
                endpoint,
                deployment,
                ..
            } => format!("Azure OpenAI deployment {} at {}", deployment, endpoint),
        }
    }

    /// Builds the provider for this service.
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>, LlmError> {
        match self {
            ServiceConfig::OpenAiCompatible {
                api_base,
                api_key,
                model,
            } => Ok(Arc::new(LiteLlmClient::new(
                api_base.clone(),
                api_key.clone(),
                model.clone(),
            )?)),
            ServiceConfig::Azure {
                endpoint,
                deployment,
                api_key,
                api_version,
            } => Ok(Arc::new(AzureOpenAiClient::new(
                endpoint.clone(),
                deployment.clone(),
                api_key.clone(),
                api_version.clone(),
            )?)),
        }
    }
}

impl std::fmt::Debug for ServiceConfig {
    // Keys stay out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}
