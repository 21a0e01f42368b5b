//! Multi-turn customer support conversations.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};

use super::{clamped_param, param, pick, render, DomainInfo, RecordDomain};
use crate::error::{ConfigError, ValidationError};
use crate::pipeline::enrich::Enricher;
use crate::record::{DomainParams, GenerationRequest, OutputFormat, ParsedRecord};

pub const NAME: &str = "customer-support-chat-log";

pub const REQUIRED_FIELDS: &[&str] = &[
    "conversation_id",
    "created_at",
    "industry",
    "language",
    "issue_summary",
    "customer_profile",
    "messages",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Customer support chat logs with per-message channel and sentiment",
    required_fields: REQUIRED_FIELDS,
};

pub const RESOLUTION_STATUSES: &[&str] = &["open", "in_progress", "resolved", "escalated"];

const DEFAULT_INDUSTRY: &str = "general";
const DEFAULT_AVG_TURNS: u32 = 8;
const DEFAULT_LANGUAGE: &str = "en";

const SYSTEM_MESSAGE: &str =
    "You write realistic but entirely fictional customer support conversations as structured data.";

const PROMPT_HEADER: &str = "You are a helpful assistant generating REALISTIC BUT ENTIRELY FICTIONAL multi-turn customer support chat logs for demonstrations.

## CONVERSATION DETAILS

Conversation ID (immutable): {{conversation_id}}
Created At: {{created_at}}
Industry: {{industry}}
Language: {{language}}
Average Turns Hint: {{avg_turns}}
Use ISO-8601 timestamps and do NOT invent real PII.

## CONVERSATION GUIDELINES

Generate a realistic customer support conversation with occasional ambiguity, realistic product or service references, timestamps per message, and no real PII. Customer messages should reflect real issues people might have, and agent responses should be helpful and professional. Target approximately {{avg_turns}} total messages but this can vary naturally.

Return ONLY the requested format (no markdown fences).
";

const YAML_SKELETON: &str = "Return VALID YAML ONLY (no markdown fences).

conversation_id: (echo above)
created_at: (echo above)
industry: (echo above)
language: (echo above)
issue_summary: single sentence describing the customer's issue
customer_profile:
  name: realistic but fictional name
  email: realistic but fake email address
  plan_tier: e.g., basic, premium, enterprise
messages:
  - role: customer|agent
    message: conversation text
    timestamp: ISO 8601
    channel: email|chat|phone
    sentiment: positive|neutral|negative
resolution_status: open|in_progress|resolved|escalated
resolution_summary: optional text summary (if resolved)
";

const JSON_SKELETON: &str = r#"Return VALID JSON ONLY (no markdown fences).

{
  "conversation_id": "(echo above)",
  "created_at": "(echo above)",
  "industry": "(echo above)",
  "language": "(echo above)",
  "issue_summary": "single sentence describing the customer's issue",
  "customer_profile": {
    "name": "realistic but fictional name",
    "email": "realistic but fake email address",
    "plan_tier": "basic|premium|enterprise"
  },
  "messages": [
    {
      "role": "customer|agent",
      "message": "conversation text",
      "timestamp": "ISO 8601",
      "channel": "email|chat|phone",
      "sentiment": "positive|neutral|negative"
    }
  ],
  "resolution_status": "open|in_progress|resolved|escalated",
  "resolution_summary": "optional text summary (if resolved)"
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT any YAML/JSON formatting markers.

Conversation ID: (echo above)
Created At: (echo above)
Industry: (echo above)
Language: (echo above)
Issue Summary: single sentence describing the customer's issue
Customer Profile:
  Name: realistic but fictional name
  Email: realistic but fake email address
  Plan Tier: basic|premium|enterprise
Conversation History:
  timestamp [customer/channel] message (sentiment)
  timestamp [agent/channel] message (sentiment)
Resolution Status: open|in_progress|resolved|escalated
Resolution Summary: optional text summary (if resolved)
";

/// Chat logs for one industry, each in one of the configured languages.
#[derive(Debug, Clone)]
pub struct CustomerSupportChatLog {
    industry: String,
    avg_turns: u32,
    languages: Vec<String>,
}

impl CustomerSupportChatLog {
    /// An empty language list falls back to English.
    pub fn new(industry: impl Into<String>, avg_turns: u32, languages: Vec<String>) -> Self {
        let languages = if languages.is_empty() {
            vec![DEFAULT_LANGUAGE.to_string()]
        } else {
            languages
        };
        Self {
            industry: industry.into(),
            avg_turns,
            languages,
        }
    }

    /// `industry` defaults to "general", `avg_turns` to 8 (clamped to 2-50)
    /// and `languages` to "en". Languages are comma-separated ISO codes.
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        let avg_turns = clamped_param(params, "avg_turns", DEFAULT_AVG_TURNS, 2..=50)?;
        Ok(Self::new(
            param(params, "industry").unwrap_or(DEFAULT_INDUSTRY),
            avg_turns,
            split_languages(param(params, "languages").unwrap_or(DEFAULT_LANGUAGE)),
        ))
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }
}

fn split_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

impl RecordDomain for CustomerSupportChatLog {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        INFO.description
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn system_message(&self) -> &'static str {
        SYSTEM_MESSAGE
    }

    fn item_params(&self, rng: &mut ChaCha8Rng) -> DomainParams {
        let language = &self.languages[rng.random_range(0..self.languages.len())];

        let mut params = DomainParams::new();
        params.insert("industry".to_string(), self.industry.clone());
        params.insert("avg_turns".to_string(), self.avg_turns.to_string());
        params.insert("language".to_string(), language.clone());
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let conversation_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();
        let avg_turns = self.avg_turns.to_string();

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("conversation_id", conversation_id.as_str()),
                ("created_at", created_at.as_str()),
                ("industry", request.param("industry").unwrap_or(self.industry.as_str())),
                ("language", request.param("language").unwrap_or(DEFAULT_LANGUAGE)),
                ("avg_turns", request.param("avg_turns").unwrap_or(avg_turns.as_str())),
            ],
        )
    }

    fn check_record(&self, record: &ParsedRecord) -> Result<(), ValidationError> {
        match record.get("messages") {
            Some(Value::Array(messages)) if !messages.is_empty() => Ok(()),
            _ => Err(ValidationError::Constraint(
                "messages must be a non-empty list".to_string(),
            )),
        }
    }

    fn enricher(&self, _request: &GenerationRequest) -> Enricher {
        Enricher::new().with_default("resolution_status", |rng| {
            json!(pick(rng, RESOLUTION_STATUSES))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::{params, request};
    use crate::pipeline::validator::validate_for;
    use crate::record::{Validated, ValidationOutcome};

    const CHAT_JSON: &str = r#"{
        "conversation_id": "c-1", "created_at": "2025-05-20T12:00:00Z",
        "industry": "telecom", "language": "es", "issue_summary": "No signal",
        "customer_profile": {"name": "Ana Example", "email": "ana@example.com", "plan_tier": "basic"},
        "messages": [{"role": "customer", "message": "Hola", "timestamp": "2025-05-20T12:01:00Z"}]
    }"#;

    #[test]
    fn test_from_params_defaults_and_clamping() {
        let domain = CustomerSupportChatLog::from_params(&DomainParams::new()).expect("builds");
        assert_eq!(domain.avg_turns, 8);
        assert_eq!(domain.languages(), ["en"]);
        assert_eq!(domain.industry, "general");

        let domain = CustomerSupportChatLog::from_params(&params(&[
            ("avg_turns", "90"),
            ("languages", " en, es ,,fr"),
        ]))
        .expect("builds");
        assert_eq!(domain.avg_turns, 50);
        assert_eq!(domain.languages(), ["en", "es", "fr"]);
    }

    #[test]
    fn test_each_item_uses_a_configured_language() {
        let domain = CustomerSupportChatLog::new("retail", 6, vec!["de".into(), "it".into()]);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..20 {
            let p = domain.item_params(&mut rng);
            assert!(["de", "it"].contains(&p["language"].as_str()));
            assert_eq!(p["avg_turns"], "6");
        }
    }

    #[test]
    fn test_prompt_embeds_conversation_details() {
        let domain = CustomerSupportChatLog::new("telecom", 10, vec!["es".into()]);
        let req = request(
            OutputFormat::Json,
            domain.item_params(&mut ChaCha8Rng::seed_from_u64(0)),
        );
        let prompt = domain.build_prompt(&req).expect("prompt renders");

        assert!(prompt.contains("Conversation ID (immutable): 0b7e6a52-3f0c-4b8e-9d7a-2c1f5e4d3a21"));
        assert!(prompt.contains("Industry: telecom"));
        assert!(prompt.contains("Language: es"));
        assert!(prompt.contains("Target approximately 10 total messages"));
        assert!(prompt.contains("Return VALID JSON ONLY"));
    }

    #[test]
    fn test_empty_conversation_is_rejected() {
        let domain = CustomerSupportChatLog::new("telecom", 8, Vec::new());
        let mut chat: Value = serde_json::from_str(CHAT_JSON).expect("json");
        chat["messages"] = json!([]);

        assert!(matches!(
            validate_for(&domain, &chat.to_string(), OutputFormat::Json),
            ValidationOutcome::Invalid(ValidationError::Constraint(_))
        ));
    }

    #[test]
    fn test_resolution_status_is_backfilled() {
        let domain = CustomerSupportChatLog::new("telecom", 8, Vec::new());
        let record = match validate_for(&domain, CHAT_JSON, OutputFormat::Json) {
            ValidationOutcome::Valid(Validated::Record(record)) => record,
            other => panic!("expected a valid record, got {other:?}"),
        };

        let enriched = domain
            .enricher(&request(OutputFormat::Json, DomainParams::new()))
            .enrich(record, &mut ChaCha8Rng::seed_from_u64(3));

        let status = enriched
            .get("resolution_status")
            .and_then(Value::as_str)
            .expect("status");
        assert!(RESOLUTION_STATUSES.contains(&status));
    }
}
