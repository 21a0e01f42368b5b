//! End-to-end batch tests against a scripted completion service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use recordforge::domains::{build_domain, RecordDomain};
use recordforge::llm::{Choice, CompletionRequest, CompletionResponse, LlmProvider, Message, Usage};
use recordforge::pipeline::{BatchGenerator, GeneratorConfig, ItemStatus, METADATA_KEY};
use recordforge::{LlmError, OutputFormat};
use tempfile::TempDir;

const PRODUCT_JSON: &str = r#"{"product_id":"p-1","created_at":"2025-05-20T12:00:00Z","name":"Trail Lamp","category":"camping","description":"A bright lamp.","price":42.5}"#;

/// Replays queued replies in call order; an empty queue yields empty completions.
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    fn always(reply: &str, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(reply.to_string())).collect())
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(Vec::new())
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))?;

        Ok(CompletionResponse {
            id: "scripted".to_string(),
            model: "scripted".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(reply),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        })
    }
}

/// Tracks how many completions run at once.
struct GaugeProvider {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl GaugeProvider {
    fn new(delay: Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay,
        }
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for GaugeProvider {
    async fn generate(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(CompletionResponse {
            id: "gauge".to_string(),
            model: "gauge".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(PRODUCT_JSON),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        })
    }
}

fn retail() -> Arc<dyn RecordDomain> {
    build_domain("retail-product", &Default::default()).expect("retail domain")
}

fn config(dir: &TempDir, format: OutputFormat) -> GeneratorConfig {
    GeneratorConfig::new()
        .with_out_dir(dir.path())
        .with_output_format(format)
        .with_concurrency(1)
        .with_seed(Some(1234))
}

fn files_in(dir: &TempDir) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir.path())
        .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_record_succeeds_on_third_attempt() {
    let dir = TempDir::new().expect("tempdir");
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok("not: [valid".to_string()),
        Ok(r#"{"name":"Lamp"}"#.to_string()),
        Ok(PRODUCT_JSON.to_string()),
        Ok(PRODUCT_JSON.to_string()),
    ]));

    let generator = BatchGenerator::new(provider.clone(), retail(), config(&dir, OutputFormat::Json))
        .expect("generator");
    let summary = generator.run(1).await;

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.items[0].attempts, 3);
    assert_eq!(provider.calls(), 3, "no call after the first success");

    let path = summary.items[0].path.clone().expect("written path");
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
    let unique_id = summary.items[0].unique_id.expect("unique id");
    assert_eq!(
        path.file_stem().and_then(|s| s.to_str()),
        Some(unique_id.to_string().as_str())
    );

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(record["price"], serde_json::json!(42.5));
    assert!(record.get("currency").is_some());
    assert!(record.get("stock_quantity").is_some());
    assert!(record.get(METADATA_KEY).is_some());
}

#[tokio::test]
async fn test_failed_items_are_skipped_and_siblings_written() {
    let dir = TempDir::new().expect("tempdir");
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(PRODUCT_JSON.to_string()),
        Ok(r#"{"name":"missing fields"}"#.to_string()),
        Ok(PRODUCT_JSON.to_string()),
        Err(LlmError::RateLimited("slow down".to_string())),
    ]));

    let generator = BatchGenerator::new(
        provider.clone(),
        retail(),
        config(&dir, OutputFormat::Json).with_max_attempts(1),
    )
    .expect("generator");
    let summary = generator.run(4).await;

    assert_eq!(summary.stats.total, 4);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 2);
    assert_eq!(provider.calls(), 4);

    let written: Vec<_> = summary.written_paths().cloned().collect();
    assert_eq!(written.len(), 2);
    let mut on_disk = files_in(&dir);
    on_disk.sort();
    let mut expected = written;
    expected.sort();
    assert_eq!(on_disk, expected, "exactly one file per succeeded item");

    for item in summary.items.iter().filter(|i| i.status == ItemStatus::Failed) {
        assert!(item.path.is_none());
        assert!(item.error.is_some());
    }
}

#[tokio::test]
async fn test_deadline_fails_unfinished_items() {
    let dir = TempDir::new().expect("tempdir");
    let provider = Arc::new(ScriptedProvider::slow(Duration::from_secs(30)));

    let generator = BatchGenerator::new(
        provider,
        retail(),
        config(&dir, OutputFormat::Yaml)
            .with_concurrency(2)
            .with_deadline(Some(Duration::from_millis(200))),
    )
    .expect("generator");
    let summary = generator.run(3).await;

    assert_eq!(summary.failed(), 3);
    assert!(summary.elapsed < Duration::from_secs(10));
    for item in &summary.items {
        assert_eq!(item.status, ItemStatus::Failed);
        assert!(item.error.as_deref().unwrap_or_default().contains("deadline"));
    }
    assert!(files_in(&dir).is_empty());
}

#[tokio::test]
async fn test_text_records_get_metadata_footer() {
    let dir = TempDir::new().expect("tempdir");
    let provider = Arc::new(ScriptedProvider::always("Product ID: p-1\nName: Trail Lamp", 1));

    let generator = BatchGenerator::new(provider, retail(), config(&dir, OutputFormat::Text))
        .expect("generator");
    let summary = generator.run(1).await;

    let path = summary.items[0].path.clone().expect("written path");
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("txt"));
    let body = std::fs::read_to_string(path).expect("read");
    assert!(body.starts_with("Product ID: p-1\nName: Trail Lamp"));
    assert!(body.contains("---Generation Metadata---"));
}

#[tokio::test]
async fn test_fenced_yaml_without_metadata() {
    let dir = TempDir::new().expect("tempdir");
    let fenced = "```yaml\nproduct_id: p-1\ncreated_at: '2025-05-20T12:00:00Z'\nname: Trail Lamp\ncategory: camping\ndescription: A bright lamp.\n```";
    let provider = Arc::new(ScriptedProvider::always(fenced, 1));

    let generator = BatchGenerator::new(
        provider,
        retail(),
        config(&dir, OutputFormat::Yaml).with_metadata(false),
    )
    .expect("generator");
    let summary = generator.run(1).await;
    assert!(summary.all_succeeded());

    let path = summary.items[0].path.clone().expect("written path");
    let record: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(path).expect("read")).expect("yaml");
    assert_eq!(record["name"], serde_yaml::Value::from("Trail Lamp"));
    assert!(record.get("price").is_some());
    assert!(record.get(METADATA_KEY).is_none());
}

#[tokio::test]
async fn test_financial_statement_needs_enough_transactions() {
    let dir = TempDir::new().expect("tempdir");
    let domain = build_domain(
        "financial-transaction",
        &[("min_transactions".to_string(), "2".to_string())]
            .into_iter()
            .collect(),
    )
    .expect("financial domain");

    let statement = |count: usize| {
        let txs: Vec<_> = (0..count)
            .map(|i| serde_json::json!({"tx_id": i, "amount": -1.0}))
            .collect();
        serde_json::json!({
            "statement_id": "s", "account_id": "1234567890", "account_type": "checking",
            "start_date": "2025-04-01", "end_date": "2025-04-30",
            "opening_balance": 10.0, "closing_balance": 8.0, "currency": "USD",
            "transactions": txs
        })
        .to_string()
    };
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(statement(1)), Ok(statement(2))]));

    let generator = BatchGenerator::new(provider.clone(), domain, config(&dir, OutputFormat::Json))
        .expect("generator");
    let summary = generator.run(1).await;

    assert!(summary.all_succeeded());
    assert_eq!(summary.items[0].attempts, 2);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_in_flight_completions_never_exceed_concurrency() {
    let dir = TempDir::new().expect("tempdir");
    let provider = Arc::new(GaugeProvider::new(Duration::from_millis(25)));

    let generator = BatchGenerator::new(
        provider.clone(),
        retail(),
        config(&dir, OutputFormat::Json).with_concurrency(3),
    )
    .expect("generator");
    let summary = generator.run(10).await;

    assert_eq!(summary.succeeded(), 10);
    assert!(provider.peak() >= 1);
    assert!(provider.peak() <= 3, "peak in flight was {}", provider.peak());
}

#[tokio::test]
async fn test_persistence_failures_are_not_retried() {
    let dir = TempDir::new().expect("tempdir");
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, "occupied").expect("write blocker");
    let provider = Arc::new(ScriptedProvider::always(PRODUCT_JSON, 3));

    let generator = BatchGenerator::new(
        provider.clone(),
        retail(),
        config(&dir, OutputFormat::Json).with_out_dir(&blocker),
    )
    .expect("generator");
    let summary = generator.run(3).await;

    assert_eq!(summary.failed(), 3);
    assert_eq!(provider.calls(), 3, "one completion per item");
    for item in &summary.items {
        assert_eq!(item.status, ItemStatus::Failed);
        assert_eq!(item.attempts, 1);
        assert!(item.path.is_none());
        let error = item.error.as_deref().unwrap_or_default();
        assert!(error.contains("Persistence failed"), "unexpected error: {error}");
    }
    assert_eq!(files_in(&dir), vec![blocker]);
}

#[tokio::test]
async fn test_tech_support_case_gets_sampled_status() {
    let dir = TempDir::new().expect("tempdir");
    let domain = build_domain(
        "tech-support",
        &[("system_description".to_string(), "ContosoShop".to_string())]
            .into_iter()
            .collect(),
    )
    .expect("tech-support domain");
    let case = serde_json::json!({
        "case_id": "c-1",
        "created_at": "2025-05-20T12:00:00Z",
        "system_description": "ContosoShop",
        "issue_summary": "Checkout fails",
        "customer_name": "Ada Example",
        "contact_email": "ada@example.com",
        "conversation_history": []
    })
    .to_string();
    let provider = Arc::new(ScriptedProvider::always(&case, 1));

    let generator = BatchGenerator::new(provider, domain, config(&dir, OutputFormat::Json))
        .expect("generator");
    let summary = generator.run(1).await;
    assert!(summary.all_succeeded());

    let path = summary.items[0].path.clone().expect("written path");
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).expect("read")).expect("json");
    for field in ["status", "severity", "priority"] {
        assert!(record[field].is_string(), "{field} was not backfilled");
    }
}
