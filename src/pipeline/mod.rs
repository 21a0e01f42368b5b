//! The record generation pipeline.
//!
//! # Pipeline Flow
//!
//! For every item of a batch:
//!
//! 1. **Parameters**: the domain draws per-item values from the item's RNG
//! 2. **Prompt**: the domain builds a prompt from the request
//! 3. **Completion + Validation**: the completion service is called until the
//!    reply parses and carries every required field, up to `max_attempts`
//!    ([`retry`], [`validator`])
//! 4. **Enrichment**: absent optional fields receive random defaults
//!    ([`enrich`])
//! 5. **Persistence**: the record is written atomically to
//!    `<out_dir>/<unique_id>.<ext>` ([`persist`])
//!
//! [`orchestrator::BatchGenerator`] runs items concurrently under a
//! semaphore and returns a [`BatchSummary`].
//!
//! # Example
//!
//! ```rust,ignore
//! use recordforge::domains::build_domain;
//! use recordforge::pipeline::{BatchGenerator, GeneratorConfig, ServiceConfig};
//!
//! let provider = ServiceConfig::from_env()?.build_provider()?;
//! let domain = build_domain("retail-product", &Default::default())?;
//! let config = GeneratorConfig::new()
//!     .with_concurrency(4)
//!     .with_out_dir("./products");
//!
//! let summary = BatchGenerator::new(provider, domain, config)?.run(10).await;
//! println!("{} succeeded, {} failed", summary.succeeded(), summary.failed());
//! ```

pub mod config;
pub mod enrich;
pub mod orchestrator;
pub mod persist;
pub mod retry;
pub mod validator;

pub use config::{GeneratorConfig, ServiceConfig, ServiceSettings};
pub use enrich::Enricher;
pub use orchestrator::{BatchGenerator, BatchStats, BatchSummary, ItemReport, ItemStatus};
pub use persist::{GenerationMetadata, RecordWriter, METADATA_KEY};
pub use retry::{generate_with_retry, Generated, RetryController, RetryDecision};
pub use validator::{validate, validate_for};
