//! recordforge: synthetic business-record generator.
//!
//! For each requested record a domain builds a prompt, a chat-completion
//! service answers it, the reply is validated (and retried when malformed),
//! optional fields are backfilled with random defaults and the record is
//! written to its own file.
//!
//! - [`domains`]: record kinds and their prompts
//! - [`llm`]: completion-service clients
//! - [`pipeline`]: validation, retry, enrichment, persistence and batching
//! - [`record`]: request and record types

pub mod cli;
pub mod domains;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod record;
pub mod utils;

// Re-export commonly used types
pub use error::{ConfigError, GenerationError, LlmError, PersistenceError, ValidationError};
pub use pipeline::{BatchGenerator, BatchSummary, GeneratorConfig};
pub use record::{GenerationRequest, OutputFormat, ParsedRecord};
