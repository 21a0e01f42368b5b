//! Batch orchestration.
//!
//! [`BatchGenerator`] fans a batch of `count` items out over a bounded
//! number of concurrent completions. Each item moves through
//! `Pending -> InFlight -> {Succeeded, Failed}`; a failed item is logged and
//! skipped without affecting its siblings, and no file is written for it.
//!
//! An optional deadline bounds the generation phase of the whole batch.
//! Items still generating when it passes are abandoned and reported as
//! failed. Persistence is never interrupted once it has started.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Serializer};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::config::GeneratorConfig;
use super::persist::{GenerationMetadata, RecordWriter};
use super::retry::{generate_with_retry, Generated};
use super::validator::validate_for;
use crate::domains::{ensure_format, RecordDomain};
use crate::error::{ConfigError, GenerationError, LlmError, PersistenceError};
use crate::llm::{CompletionRequest, LlmProvider, Message};
use crate::record::{GenerationRequest, OutputFormat, Validated};

/// Lifecycle state of one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::InFlight => write!(f, "inflight"),
            ItemStatus::Succeeded => write!(f, "succeeded"),
            ItemStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one batch item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    /// Position of the item in the batch.
    pub index: usize,
    /// Record identity, once the request has been built.
    pub unique_id: Option<Uuid>,
    pub status: ItemStatus,
    /// Completion attempts made.
    pub attempts: u32,
    /// File written for a succeeded item.
    pub path: Option<PathBuf>,
    /// Failure reason for a failed item.
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ItemReport {
    fn pending(index: usize) -> Self {
        Self {
            index,
            unique_id: None,
            status: ItemStatus::Pending,
            attempts: 0,
            path: None,
            error: None,
            duration_ms: 0,
        }
    }

    fn in_flight(mut self, unique_id: Uuid) -> Self {
        self.unique_id = Some(unique_id);
        self.status = ItemStatus::InFlight;
        self
    }

    fn succeeded(mut self, path: PathBuf, attempts: u32, duration: Duration) -> Self {
        self.status = ItemStatus::Succeeded;
        self.path = Some(path);
        self.attempts = attempts;
        self.duration_ms = duration_ms(duration);
        self
    }

    fn failed(mut self, error: &GenerationError, attempts: u32, duration: Duration) -> Self {
        self.status = ItemStatus::Failed;
        self.error = Some(error.to_string());
        self.attempts = attempts;
        self.duration_ms = duration_ms(duration);
        self
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration_ms(*duration))
}

/// Counters for a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Attempts summed over every item.
    pub attempts: u64,
    #[serde(rename = "average_duration_ms", serialize_with = "serialize_millis")]
    pub average_duration: Duration,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_success(&mut self, duration: Duration, attempts: u32) {
        self.total += 1;
        self.succeeded += 1;
        self.attempts += u64::from(attempts);
        self.update_average_duration(duration);
    }

    fn record_failure(&mut self, duration: Duration, attempts: u32) {
        self.total += 1;
        self.failed += 1;
        self.attempts += u64::from(attempts);
        self.update_average_duration(duration);
    }

    fn update_average_duration(&mut self, duration: Duration) {
        if self.total == 1 {
            self.average_duration = duration;
        } else {
            let n = self.total as f64;
            let old_avg = self.average_duration.as_secs_f64();
            let new_avg = old_avg + (duration.as_secs_f64() - old_avg) / n;
            self.average_duration = Duration::from_secs_f64(new_avg.max(0.0));
        }
    }
}

/// End-of-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub domain: String,
    pub format: OutputFormat,
    pub out_dir: PathBuf,
    pub stats: BatchStats,
    /// One report per item, sorted by index.
    pub items: Vec<ItemReport>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn succeeded(&self) -> u64 {
        self.stats.succeeded
    }

    pub fn failed(&self) -> u64 {
        self.stats.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.stats.failed == 0
    }

    /// Paths of every written record, in item order.
    pub fn written_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.items.iter().filter_map(|item| item.path.as_ref())
    }
}

/// Generates a batch of records for one domain.
pub struct BatchGenerator {
    provider: Arc<dyn LlmProvider>,
    domain: Arc<dyn RecordDomain>,
    config: GeneratorConfig,
    writer: RecordWriter,
    concurrency_limiter: Arc<Semaphore>,
}

impl BatchGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid, the domain
    /// cannot produce the configured output format or its prompt template
    /// does not render.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        domain: Arc<dyn RecordDomain>,
        config: GeneratorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        ensure_format(domain.as_ref(), config.output_format)?;

        // Template errors surface here instead of failing every item.
        let sample = GenerationRequest::new(
            0,
            config.output_format,
            domain.item_params(&mut ChaCha8Rng::seed_from_u64(0)),
        );
        domain.build_prompt(&sample)?;

        let metadata = config.write_metadata.then(GenerationMetadata::default);
        let writer = RecordWriter::new(config.out_dir.clone()).with_metadata(metadata);
        let concurrency_limiter = Arc::new(Semaphore::new(config.concurrency));

        Ok(Self {
            provider,
            domain,
            config,
            writer,
            concurrency_limiter,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn domain(&self) -> &Arc<dyn RecordDomain> {
        &self.domain
    }

    /// Generates `count` records and reports on every item.
    ///
    /// Per-item failures never abort the batch.
    #[instrument(skip(self), fields(domain = self.domain.name(), format = %self.config.output_format))]
    pub async fn run(&self, count: usize) -> BatchSummary {
        let started = Instant::now();
        let deadline = self
            .config
            .deadline
            .map(|limit| tokio::time::Instant::now() + limit);

        info!(
            count,
            concurrency = self.config.concurrency,
            max_attempts = self.config.max_attempts,
            out_dir = %self.config.out_dir.display(),
            "Starting batch"
        );

        let futures: Vec<_> = (0..count)
            .map(|index| self.run_item(index, deadline))
            .collect();
        let mut items = futures::future::join_all(futures).await;
        items.sort_by_key(|item| item.index);

        let mut stats = BatchStats::new();
        for item in &items {
            let duration = Duration::from_millis(item.duration_ms);
            match item.status {
                ItemStatus::Succeeded => stats.record_success(duration, item.attempts),
                _ => stats.record_failure(duration, item.attempts),
            }
        }

        let elapsed = started.elapsed();
        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            elapsed_ms = duration_ms(elapsed),
            "Batch finished"
        );

        BatchSummary {
            domain: self.domain.name().to_string(),
            format: self.config.output_format,
            out_dir: self.config.out_dir.clone(),
            stats,
            items,
            elapsed,
        }
    }

    /// Runs one item to completion. Never fails: errors end up in the report.
    #[instrument(skip(self, deadline))]
    async fn run_item(&self, index: usize, deadline: Option<tokio::time::Instant>) -> ItemReport {
        let started = Instant::now();
        let mut rng = self.item_rng(index);

        let params = self.domain.item_params(&mut rng);
        let request = GenerationRequest::new(index, self.config.output_format, params);
        let report = ItemReport::pending(index).in_flight(request.unique_id());
        debug!(unique_id = %request.unique_id(), "Item in flight");

        let mut attempts_made = 0u32;
        let generation = self.generate(&request, deadline, &mut attempts_made).await;

        let generated = match generation {
            Ok(generated) => generated,
            Err(err) => {
                let attempts = match &err {
                    GenerationError::ExhaustedRetries { attempts, .. } => *attempts,
                    _ => attempts_made,
                };
                warn!(unique_id = %request.unique_id(), error = %err, "Skipping item");
                return report.failed(&err, attempts, started.elapsed());
            }
        };

        let attempts = generated.attempts;
        let content = match generated.record {
            Some(record) => {
                let enriched = self.domain.enricher(&request).enrich(record, &mut rng);
                self.domain.inspect(&enriched);
                Validated::Record(enriched)
            }
            None => Validated::Text(generated.raw),
        };

        match self.persist(request, content).await {
            Ok(path) => {
                info!(path = %path.display(), attempts, "Record saved");
                report.succeeded(path, attempts, started.elapsed())
            }
            Err(err) => {
                let err = GenerationError::Persistence(err);
                warn!(error = %err, "Skipping item");
                report.failed(&err, attempts, started.elapsed())
            }
        }
    }

    /// Completion and validation under the concurrency limit and deadline.
    async fn generate(
        &self,
        request: &GenerationRequest,
        deadline: Option<tokio::time::Instant>,
        attempts_made: &mut u32,
    ) -> Result<Generated, GenerationError> {
        let completion_request = self.completion_request(request)?;
        let format = request.output_format();
        let max_attempts = self.config.max_attempts;

        let call = |attempt: u32| {
            *attempts_made = attempt;
            let provider = Arc::clone(&self.provider);
            let completion_request = completion_request.clone();
            async move { provider.complete(completion_request).await }
        };
        let validate = |raw: &str| validate_for(self.domain.as_ref(), raw, format);

        let generation = async {
            let _permit = self.concurrency_limiter.acquire().await.map_err(|e| {
                GenerationError::Completion(LlmError::RequestFailed(format!(
                    "Failed to acquire permit: {}",
                    e
                )))
            })?;
            generate_with_retry(call, validate, max_attempts).await
        };

        match deadline {
            Some(at) => tokio::time::timeout_at(at, generation)
                .await
                .unwrap_or(Err(GenerationError::DeadlineExceeded)),
            None => generation.await,
        }
    }

    /// Writes on the blocking pool; runs to completion once started.
    async fn persist(
        &self,
        request: GenerationRequest,
        content: Validated,
    ) -> Result<PathBuf, PersistenceError> {
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || writer.write(&request, content))
            .await
            .map_err(|e| PersistenceError::Io(io::Error::other(e.to_string())))?
    }

    /// Completion request for an item. The model is left empty so the
    /// provider uses its configured default.
    fn completion_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<CompletionRequest, ConfigError> {
        let sampling = self.domain.sampling();
        let prompt = self.domain.build_prompt(request)?;
        Ok(CompletionRequest::new(
            "",
            vec![
                Message::system(self.domain.system_message()),
                Message::user(prompt),
            ],
        )
        .with_max_tokens(sampling.max_tokens)
        .with_temperature(sampling.temperature)
        .with_top_p(sampling.top_p))
    }

    fn item_rng(&self, index: usize) -> ChaCha8Rng {
        match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }
}
