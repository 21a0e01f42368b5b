//! Technical-support cases with a customer/agent conversation.

use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use super::{pick, render, required_param, DomainInfo, RecordDomain};
use crate::error::ConfigError;
use crate::pipeline::enrich::Enricher;
use crate::record::{DomainParams, GenerationRequest, OutputFormat};

pub const NAME: &str = "tech-support";

pub const REQUIRED_FIELDS: &[&str] = &[
    "case_id",
    "created_at",
    "system_description",
    "issue_summary",
    "customer_name",
    "contact_email",
    "conversation_history",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Technical-support cases with conversation history",
    required_fields: REQUIRED_FIELDS,
};

pub const STATUSES: &[&str] = &["open", "investigating", "resolved", "closed"];
pub const SEVERITIES: &[&str] = &["critical", "high", "medium", "low"];
pub const PRIORITIES: &[&str] = &["P1", "P2", "P3", "P4"];

const SYSTEM_MESSAGE: &str =
    "You generate realistic but entirely fictional technical-support cases as structured data.";

const PROMPT_HEADER: &str = "You are a helpful support agent generating REALISTIC BUT ENTIRELY FICTIONAL technical support cases for demonstrations.

## ON THE CASE

The system being simulated:
- {{system_description}}

The status of this case is: {{status}}
The severity of this case is: {{severity}}
The priority of this case is: {{priority}}
Case ID (immutable): {{case_id}}
Created At: {{created_at}}
Use ISO-8601 timestamps and do NOT invent real PII.

## ON CONVERSATION HISTORY

User messages should be realistic, sometimes unclear, contain realistic error messages and information. The agent's replies should be helpful and ask clarifying questions or to provide specific information.
";

const YAML_SKELETON: &str = "Return VALID YAML ONLY (no markdown fences).

case_id: (echo above)
created_at: (echo above)
system_description: (echo above)
issue_summary: single sentence summary
severity: critical|high|medium|low
priority: P1|P2|P3|P4
status: open|investigating|resolved|closed
customer_name: realistic name
contact_email: realistic but fake email
conversation_history:
  - role: customer|agent
    message: text
    timestamp: ISO 8601
resolved_at: ISO 8601 (optional)
resolution: text (optional)
area: frontend|backend|database|network|other (optional)
is_bug: true|false (optional)
root_cause: text (optional)
";

const JSON_SKELETON: &str = r#"Return VALID JSON ONLY (no markdown fences).

{
  "case_id": "(echo above)",
  "created_at": "(echo above)",
  "system_description": "(echo above)",
  "issue_summary": "single sentence summary",
  "severity": "critical|high|medium|low",
  "priority": "P1|P2|P3|P4",
  "status": "open|investigating|resolved|closed",
  "customer_name": "realistic name",
  "contact_email": "realistic but fake email",
  "conversation_history": [ { "role": "...", "message": "...", "timestamp": "..." } ],
  "resolved_at": "ISO 8601 (optional)",
  "resolution": "text (optional)",
  "area": "frontend|backend|database|network|other (optional)",
  "is_bug": true,
  "root_cause": "text (optional)"
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT any YAML/JSON formatting markers.

Case ID: (echo above)
Created At: (echo above)
System Description: (echo above)
Issue Summary: single sentence summary
Severity: critical|high|medium|low
Priority: P1|P2|P3|P4
Status: open|investigating|resolved|closed
Customer Name: realistic name
Contact Email: realistic but fake email
Conversation History:
  - timestamp [customer] message
  - timestamp [agent]    message
Resolved At: ISO 8601 (optional)
Resolution: text (optional)
Area: frontend|backend|database|network|other (optional)
Is Bug: true|false (optional)
Root Cause: text (optional)
";

/// Support cases for a described system.
#[derive(Debug, Clone)]
pub struct TechSupport {
    system_description: String,
}

impl TechSupport {
    pub fn new(system_description: impl Into<String>) -> Self {
        Self {
            system_description: system_description.into(),
        }
    }

    /// Requires `system_description`.
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        Ok(Self::new(required_param(params, "system_description")?))
    }
}

impl RecordDomain for TechSupport {
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
        let mut params = DomainParams::new();
        params.insert(
            "system_description".to_string(),
            self.system_description.clone(),
        );
        params.insert("status".to_string(), pick(rng, STATUSES).to_string());
        params.insert("severity".to_string(), pick(rng, SEVERITIES).to_string());
        params.insert("priority".to_string(), pick(rng, PRIORITIES).to_string());
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let case_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();
        let header = render(
            PROMPT_HEADER,
            &[
                (
                    "system_description",
                    request
                        .param("system_description")
                        .unwrap_or(self.system_description.as_str()),
                ),
                ("status", request.param("status").unwrap_or("open")),
                ("severity", request.param("severity").unwrap_or("medium")),
                ("priority", request.param("priority").unwrap_or("P3")),
                ("case_id", case_id.as_str()),
                ("created_at", created_at.as_str()),
            ],
        )?;

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };
        Ok(format!("{}\n{}", header, skeleton))
    }

    fn enricher(&self, request: &GenerationRequest) -> Enricher {
        // The sampled values stand in for anything the model left out.
        ["status", "severity", "priority"]
            .into_iter()
            .filter_map(|field| {
                request
                    .param(field)
                    .map(|value| (field, Value::String(value.to_string())))
            })
            .fold(Enricher::new(), |enricher, (field, value)| {
                enricher.with_constant(field, value)
            })
    }
}
