//! IT service desk tickets: incidents, service requests and changes.

use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};

use super::{choice_param, clamped_param, param, pick, render, DomainInfo, RecordDomain};
use crate::error::ConfigError;
use crate::pipeline::enrich::Enricher;
use crate::record::{DomainParams, GenerationRequest, OutputFormat};

pub const NAME: &str = "it-service-desk-ticket";

pub const REQUIRED_FIELDS: &[&str] = &[
    "ticket_id",
    "created_at",
    "ticket_type",
    "service",
    "requester",
    "description",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "IT service desk tickets with work notes and resolution",
    required_fields: REQUIRED_FIELDS,
};

pub const TICKET_TYPES: &[&str] = &["incident", "request", "change"];
pub const PRIORITIES: &[&str] = &["P1", "P2", "P3", "P4"];
pub const IMPACTS: &[&str] = &["high", "medium", "low"];
pub const URGENCIES: &[&str] = &["high", "medium", "low"];
pub const STATUSES: &[&str] = &["new", "assigned", "in_progress", "resolved", "closed"];

/// Per-ticket attributes drawn at random and backfilled when the model
/// leaves them out.
const SAMPLED_FIELDS: &[&str] = &["priority", "impact", "urgency", "status"];

const DEFAULT_SERVICE: &str = "General IT";
const DEFAULT_SLA_HOURS: u32 = 72;

const SYSTEM_MESSAGE: &str =
    "You are an IT service desk agent producing fictional service desk tickets as structured data.";

const PROMPT_HEADER: &str = "You are a helpful IT service desk agent generating REALISTIC BUT ENTIRELY FICTIONAL IT service desk tickets for demonstrations.

## ON THE TICKET

The service area being simulated: {{service}}
Ticket type: {{ticket_type}}

Ticket ID (immutable): {{ticket_id}}
Created At: {{created_at}}
Ticket Type: {{ticket_type}}
Service: {{service}}
Priority: {{priority}}
Impact: {{impact}}
Urgency: {{urgency}}
Status: {{status}}
SLA Hours: {{sla_hours}}
Use ISO-8601 timestamps and do NOT invent real PII.

## ON TICKET LIFECYCLE

Tickets should include appropriate fields for the ticket lifecycle including requester information, work notes with realistic timestamps and authors, and resolution details when applicable. All identities must be fictional.
";

const YAML_SKELETON: &str = "Return VALID YAML ONLY (no markdown fences).

ticket_id: (echo above)
created_at: (echo above)
ticket_type: incident|request|change
service: (echo above)
requester:
  name: fictional name
  email: realistic but fake email
priority: P1|P2|P3|P4
impact: high|medium|low
urgency: high|medium|low
status: new|assigned|in_progress|resolved|closed
assignment_group: text
assignee: text (optional)
description: text
work_notes:
  - timestamp: ISO 8601
    author: text
    note: text
resolution:
  resolved_at: ISO 8601 (optional)
  summary: text (optional)
sla_hours: (echo above)
";

const JSON_SKELETON: &str = r#"Return VALID JSON ONLY (no markdown fences).

{
  "ticket_id": "(echo above)",
  "created_at": "(echo above)",
  "ticket_type": "incident|request|change",
  "service": "(echo above)",
  "requester": {
    "name": "fictional name",
    "email": "realistic but fake email"
  },
  "priority": "P1|P2|P3|P4",
  "impact": "high|medium|low",
  "urgency": "high|medium|low",
  "status": "new|assigned|in_progress|resolved|closed",
  "assignment_group": "text",
  "assignee": "text (optional)",
  "description": "text",
  "work_notes": [
    {
      "timestamp": "ISO 8601",
      "author": "text",
      "note": "text"
    }
  ],
  "resolution": {
    "resolved_at": "ISO 8601 (optional)",
    "summary": "text (optional)"
  },
  "sla_hours": "(echo above)"
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT any YAML/JSON formatting markers.

Ticket ID: (echo above)
Created At: (echo above)
Ticket Type: incident|request|change
Service: (echo above)
Requester: fictional name <realistic but fake email>
Priority: P1|P2|P3|P4
Impact: high|medium|low
Urgency: high|medium|low
Status: new|assigned|in_progress|resolved|closed
Assignment Group: text
Assignee: text (optional)
Description: text
Work Notes:
  - [timestamp] author: note
Resolution:
  Resolved At: ISO 8601 (optional)
  Summary: text (optional)
SLA Hours: (echo above)
";

/// Tickets of one type for one service area.
#[derive(Debug, Clone)]
pub struct ItServiceDeskTicket {
    ticket_type: &'static str,
    service: String,
    sla_hours: u32,
}

impl ItServiceDeskTicket {
    pub fn new(ticket_type: &'static str, service: impl Into<String>, sla_hours: u32) -> Self {
        Self {
            ticket_type,
            service: service.into(),
            sla_hours: sla_hours.clamp(1, 720),
        }
    }

    /// `ticket_type` is incident, request or change (default incident);
    /// `service` defaults to "General IT"; `sla_hours` to 72, clamped to
    /// 1-720.
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        let ticket_type = choice_param(params, "ticket_type", TICKET_TYPES)?.unwrap_or("incident");
        Ok(Self::new(
            ticket_type,
            param(params, "service").unwrap_or(DEFAULT_SERVICE),
            clamped_param(params, "sla_hours", DEFAULT_SLA_HOURS, 1..=720)?,
        ))
    }
}

impl RecordDomain for ItServiceDeskTicket {
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
        params.insert("ticket_type".to_string(), self.ticket_type.to_string());
        params.insert("service".to_string(), self.service.clone());
        params.insert("sla_hours".to_string(), self.sla_hours.to_string());
        params.insert("priority".to_string(), pick(rng, PRIORITIES).to_string());
        params.insert("impact".to_string(), pick(rng, IMPACTS).to_string());
        params.insert("urgency".to_string(), pick(rng, URGENCIES).to_string());
        params.insert("status".to_string(), pick(rng, STATUSES).to_string());
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let ticket_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();
        let sla_hours = self.sla_hours.to_string();

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("ticket_id", ticket_id.as_str()),
                ("created_at", created_at.as_str()),
                ("ticket_type", request.param("ticket_type").unwrap_or(self.ticket_type)),
                ("service", request.param("service").unwrap_or(self.service.as_str())),
                ("sla_hours", sla_hours.as_str()),
                ("priority", request.param("priority").unwrap_or("P3")),
                ("impact", request.param("impact").unwrap_or("medium")),
                ("urgency", request.param("urgency").unwrap_or("medium")),
                ("status", request.param("status").unwrap_or("new")),
            ],
        )
    }

    fn enricher(&self, request: &GenerationRequest) -> Enricher {
        SAMPLED_FIELDS
            .iter()
            .filter_map(|field| {
                request
                    .param(field)
                    .map(|value| (*field, Value::String(value.to_string())))
            })
            .fold(Enricher::new(), |enricher, (field, value)| {
                enricher.with_constant(field, value)
            })
            .with_constant("sla_hours", json!(self.sla_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::{params, request};
    use crate::record::ParsedRecord;
    use rand::prelude::*;

    #[test]
    fn test_from_params_defaults_and_clamping() {
        let domain = ItServiceDeskTicket::from_params(&DomainParams::new()).expect("builds");
        assert_eq!(domain.ticket_type, "incident");
        assert_eq!(domain.service, "General IT");
        assert_eq!(domain.sla_hours, 72);

        let domain = ItServiceDeskTicket::from_params(&params(&[
            ("ticket_type", "change"),
            ("sla_hours", "10000"),
        ]))
        .expect("builds");
        assert_eq!(domain.ticket_type, "change");
        assert_eq!(domain.sla_hours, 720);

        assert!(ItServiceDeskTicket::from_params(&params(&[("ticket_type", "problem")])).is_err());
    }

    #[test]
    fn test_item_params_draw_ticket_attributes() {
        let domain = ItServiceDeskTicket::new("request", "VPN", 24);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..20 {
            let p = domain.item_params(&mut rng);
            assert!(PRIORITIES.contains(&p["priority"].as_str()));
            assert!(IMPACTS.contains(&p["impact"].as_str()));
            assert!(URGENCIES.contains(&p["urgency"].as_str()));
            assert!(STATUSES.contains(&p["status"].as_str()));
        }
    }

    #[test]
    fn test_prompt_embeds_ticket_attributes() {
        let domain = ItServiceDeskTicket::new("incident", "Email", 8);
        let p = params(&[
            ("priority", "P1"),
            ("impact", "high"),
            ("urgency", "low"),
            ("status", "assigned"),
        ]);
        let prompt = domain
            .build_prompt(&request(OutputFormat::Yaml, p))
            .expect("prompt renders");

        assert!(prompt.contains("The service area being simulated: Email"));
        assert!(prompt.contains("Ticket ID (immutable): 0b7e6a52-3f0c-4b8e-9d7a-2c1f5e4d3a21"));
        assert!(prompt.contains("Priority: P1\nImpact: high\nUrgency: low\nStatus: assigned"));
        assert!(prompt.contains("SLA Hours: 8"));
    }

    #[test]
    fn test_enricher_backfills_sampled_attributes_and_sla() {
        let domain = ItServiceDeskTicket::new("incident", "Email", 48);
        let req = request(
            OutputFormat::Json,
            params(&[("priority", "P2"), ("status", "resolved")]),
        );
        let record: ParsedRecord = json!({"ticket_id": "t", "priority": "P4"})
            .as_object()
            .cloned()
            .expect("object")
            .into();

        let enriched = domain
            .enricher(&req)
            .enrich(record, &mut ChaCha8Rng::seed_from_u64(0));

        assert_eq!(enriched.get("priority"), Some(&json!("P4")));
        assert_eq!(enriched.get("status"), Some(&json!("resolved")));
        assert_eq!(enriched.get("sla_hours"), Some(&json!(48)));
        assert!(enriched.get("impact").is_none());
    }
}
