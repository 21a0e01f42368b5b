//! Equipment maintenance logs for manufacturing plants.

use rand_chacha::ChaCha8Rng;
use serde_json::json;

use super::{param, render, DomainInfo, RecordDomain};
use crate::error::ConfigError;
use crate::pipeline::enrich::Enricher;
use crate::record::{DomainParams, GenerationRequest, OutputFormat};

pub const NAME: &str = "manufacturing-maintenance-log";

pub const REQUIRED_FIELDS: &[&str] = &[
    "log_id",
    "created_at",
    "plant",
    "line",
    "equipment_type",
    "equipment_id",
    "technician",
    "issue_description",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Maintenance logs with actions taken, parts used and downtime",
    required_fields: REQUIRED_FIELDS,
};

const DEFAULT_PLANT: &str = "Plant A";
const DEFAULT_LINE: &str = "Line 1";
const DEFAULT_EQUIPMENT_TYPE: &str = "General";

const SYSTEM_MESSAGE: &str =
    "You generate realistic but entirely fictional manufacturing maintenance logs as structured data.";

const PROMPT_HEADER: &str = "You are an AI assistant generating realistic but entirely FICTIONAL manufacturing maintenance logs.

Log ID: {{log_id}}
Created At: {{created_at}}
Plant: {{plant}}
Line: {{line}}
Equipment Type: {{equipment_type}}

Generate one maintenance log entry for a piece of equipment on this line. Include a fictional equipment ID and technician, the issue observed, the actions taken, any parts used with quantities, downtime in minutes and follow-up tasks. Use ISO-8601 timestamps and do NOT invent real PII.
";

const YAML_SKELETON: &str = "Return VALID YAML ONLY (no fences).

log_id: (echo above)
created_at: (echo above)
plant: (echo above)
line: (echo above)
equipment_type: (echo above)
equipment_id: \"EQ-FAKE-001\"
technician: \"Fictional Technician\"
maintenance_type: preventive|corrective|predictive
issue_description: \"What was observed\"
actions_taken:
  - \"Action performed\"
parts_used:
  - part_number: \"PN-FAKE-123\"
    description: \"Part description\"
    quantity: 1
downtime_minutes: 45
status: open|in_progress|completed
follow_up_tasks:
  - \"Follow-up task\"
";

const JSON_SKELETON: &str = r#"Return VALID JSON ONLY (no fences).

{
  "log_id": "(echo above)",
  "created_at": "(echo above)",
  "plant": "(echo above)",
  "line": "(echo above)",
  "equipment_type": "(echo above)",
  "equipment_id": "EQ-FAKE-001",
  "technician": "Fictional Technician",
  "maintenance_type": "preventive|corrective|predictive",
  "issue_description": "What was observed",
  "actions_taken": ["Action performed"],
  "parts_used": [
    {
      "part_number": "PN-FAKE-123",
      "description": "Part description",
      "quantity": 1
    }
  ],
  "downtime_minutes": 45,
  "status": "open|in_progress|completed",
  "follow_up_tasks": ["Follow-up task"]
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT YAML/JSON markers.

Log ID: (echo above)
Created At: (echo above)
Plant: (echo above)
Line: (echo above)
Equipment Type: (echo above)
Equipment ID: fictional ID
Technician: fictional name
Maintenance Type: preventive|corrective|predictive
Issue Description: what was observed
Actions Taken: list of actions
Parts Used: part number, description, quantity
Downtime Minutes: integer
Status: open|in_progress|completed
Follow-up Tasks: list of tasks
";

#[derive(Debug, Clone)]
pub struct ManufacturingMaintenanceLog {
    plant: String,
    line: String,
    equipment_type: String,
}

impl ManufacturingMaintenanceLog {
    pub fn new(
        plant: impl Into<String>,
        line: impl Into<String>,
        equipment_type: impl Into<String>,
    ) -> Self {
        Self {
            plant: plant.into(),
            line: line.into(),
            equipment_type: equipment_type.into(),
        }
    }

    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        Ok(Self::new(
            param(params, "plant").unwrap_or(DEFAULT_PLANT),
            param(params, "line").unwrap_or(DEFAULT_LINE),
            param(params, "equipment_type").unwrap_or(DEFAULT_EQUIPMENT_TYPE),
        ))
    }
}

impl RecordDomain for ManufacturingMaintenanceLog {
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

    fn item_params(&self, _rng: &mut ChaCha8Rng) -> DomainParams {
        let mut params = DomainParams::new();
        params.insert("plant".to_string(), self.plant.clone());
        params.insert("line".to_string(), self.line.clone());
        params.insert("equipment_type".to_string(), self.equipment_type.clone());
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let log_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("log_id", log_id.as_str()),
                ("created_at", created_at.as_str()),
                ("plant", request.param("plant").unwrap_or(self.plant.as_str())),
                ("line", request.param("line").unwrap_or(self.line.as_str())),
                (
                    "equipment_type",
                    request
                        .param("equipment_type")
                        .unwrap_or(self.equipment_type.as_str()),
                ),
            ],
        )
    }

    fn enricher(&self, _request: &GenerationRequest) -> Enricher {
        Enricher::new()
            .with_constant("maintenance_type", json!("preventive"))
            .with_constant("status", json!("open"))
            .with_constant("actions_taken", json!([]))
            .with_constant("parts_used", json!([]))
            .with_constant("follow_up_tasks", json!([]))
    }
}
