//! Anonymized HR employee records.

use rand_chacha::ChaCha8Rng;

use super::{choice_param, param, render, DomainInfo, RecordDomain};
use crate::error::ConfigError;
use crate::record::{DomainParams, GenerationRequest, OutputFormat};

pub const NAME: &str = "hr-employee-record";

pub const REQUIRED_FIELDS: &[&str] = &[
    "record_id",
    "created_at",
    "record_type",
    "department",
    "employee_profile",
    "document",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "HR records: onboarding, performance reviews and leave requests",
    required_fields: REQUIRED_FIELDS,
};

pub const RECORD_TYPES: &[&str] = &["onboarding", "performance", "leave"];

const DEFAULT_DEPARTMENT: &str = "General";

const SYSTEM_MESSAGE: &str =
    "You generate entirely fictional, anonymized HR employee records as structured data.";

const PROMPT_HEADER: &str = "You are an AI assistant generating realistic but entirely FICTIONAL and ANONYMIZED HR employee records. Strictly no real PII. Use clearly fake names, emails, and IDs.

Record ID: {{record_id}}
Created At: {{created_at}}
Record Type: {{record_type}}
Department: {{department}}
";

const YAML_SKELETON: &str = "Return VALID YAML ONLY (no fences).

record_id: (echo above)
created_at: (echo above)
record_type: (echo above)
department: (echo above)
employee_profile:
  fictional_employee_id: \"EMP-FAKE-123\"
  name: \"Fictional Name\"
  email: \"fake@example.com\"
  manager: \"Fictional Manager\"
document:
  title: \"Document title\"
  sections:
    - heading: \"Section heading\"
      content: \"Section content\"
effective_dates:
  start: \"2024-01-01T00:00:00Z\"  # ISO 8601 (optional)
  end: \"2024-12-31T23:59:59Z\"    # ISO 8601 (optional)
approvals:
  - approver: \"Fictional Approver\"
    status: \"approved\"  # approved|rejected|pending
    timestamp: \"2024-01-15T10:30:00Z\"  # ISO 8601
";

const JSON_SKELETON: &str = r#"Return VALID JSON ONLY (no fences).

{
  "record_id": "(echo above)",
  "created_at": "(echo above)",
  "record_type": "(echo above)",
  "department": "(echo above)",
  "employee_profile": {
    "fictional_employee_id": "EMP-FAKE-123",
    "name": "Fictional Name",
    "email": "fake@example.com",
    "manager": "Fictional Manager"
  },
  "document": {
    "title": "Document title",
    "sections": [
      {
        "heading": "Section heading",
        "content": "Section content"
      }
    ]
  },
  "effective_dates": {
    "start": "2024-01-01T00:00:00Z",
    "end": "2024-12-31T23:59:59Z"
  },
  "approvals": [
    {
      "approver": "Fictional Approver",
      "status": "approved",
      "timestamp": "2024-01-15T10:30:00Z"
    }
  ]
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT YAML/JSON markers.

Record ID: (echo above)
Created At: (echo above)
Record Type: (echo above)
Department: (echo above)
Employee Profile: Fictional Employee ID, Name, Email, Manager
Document: Title and sectioned content
Effective Dates: Start and end dates (ISO 8601)
Approvals: Approver name, status, timestamp
";

#[derive(Debug, Clone)]
pub struct HrEmployeeRecord {
    record_type: &'static str,
    department: String,
}

impl HrEmployeeRecord {
    pub fn new(record_type: &'static str, department: impl Into<String>) -> Self {
        Self {
            record_type,
            department: department.into(),
        }
    }

    /// `record_type` is onboarding, performance or leave (default
    /// onboarding); `department` defaults to "General".
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        let record_type = choice_param(params, "record_type", RECORD_TYPES)?.unwrap_or("onboarding");
        Ok(Self::new(
            record_type,
            param(params, "department").unwrap_or(DEFAULT_DEPARTMENT),
        ))
    }
}

impl RecordDomain for HrEmployeeRecord {
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
        params.insert("record_type".to_string(), self.record_type.to_string());
        params.insert("department".to_string(), self.department.clone());
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let record_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("record_id", record_id.as_str()),
                ("created_at", created_at.as_str()),
                ("record_type", request.param("record_type").unwrap_or(self.record_type)),
                (
                    "department",
                    request.param("department").unwrap_or(self.department.as_str()),
                ),
            ],
        )
    }
}
