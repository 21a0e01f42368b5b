//! Fictional legal contracts with numbered clauses.

use chrono::Utc;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use super::{choice_param, parsed_param, render, DomainInfo, RecordDomain};
use crate::error::{ConfigError, ValidationError};
use crate::record::{DomainParams, GenerationRequest, OutputFormat, ParsedRecord};

pub const NAME: &str = "legal-contract";

pub const REQUIRED_FIELDS: &[&str] = &[
    "contract_id",
    "contract_type",
    "title",
    "parties",
    "effective_date",
    "governing_law",
    "clauses",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Legal contracts with parties and clauses",
    required_fields: REQUIRED_FIELDS,
};

pub const CONTRACT_TYPES: &[&str] = &[
    "NDA",
    "Service Agreement",
    "Lease Agreement",
    "Employment Contract",
];
pub const COMPLEXITIES: &[&str] = &["simple", "moderate", "complex"];

const DEFAULT_NUM_CLAUSES: u32 = 5;
const GENERIC_CONTRACT_TYPE: &str = "legal contract";

const SYSTEM_MESSAGE: &str = "You draft realistic but entirely fictional legal contracts as structured data.";

const PROMPT_HEADER: &str = "You are a helpful legal assistant creating REALISTIC BUT ENTIRELY FICTIONAL contracts for demonstrations.

Contract ID (immutable): {{contract_id}}
Contract Type: {{contract_type}}
Language Complexity: {{complexity}}
Clause Count (approx.): {{num_clauses}}
Effective Date: {{effective_date}}
Use ISO-8601 dates and do NOT invent real PII.
";

const YAML_SKELETON: &str = "Return VALID YAML ONLY (no markdown fences).

contract_id: (echo above)
contract_type: (echo above)
title: short descriptive title
parties:
  - Alpha Corp
  - Beta Inc
effective_date: ISO-8601
termination_date: ISO-8601 (optional)
governing_law: text
clauses:
  - clause_title: Confidentiality
    clause_text: Both parties agree ...
full_text: concatenated text of all clauses and metadata
";

const JSON_SKELETON: &str = r#"Return VALID JSON ONLY (no markdown fences).

{
  "contract_id": "(echo above)",
  "contract_type": "(echo above)",
  "title": "short descriptive title",
  "parties": ["Alpha Corp", "Beta Inc"],
  "effective_date": "ISO-8601",
  "termination_date": "ISO-8601 (optional)",
  "governing_law": "text",
  "clauses": [
    {
      "clause_title": "Confidentiality",
      "clause_text": "Both parties agree ..."
    }
  ],
  "full_text": "concatenated text of all clauses and metadata"
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT any YAML/JSON formatting markers.

Contract ID: (echo above)
Contract Type: (echo above)
Title: short descriptive title
Parties: Alpha Corp; Beta Inc
Effective Date: ISO-8601
Termination Date: ISO-8601 (optional)
Governing Law: text
Clauses:
  - Confidentiality: Both parties agree ...
Full Text: concatenated text
";

#[derive(Debug, Clone)]
pub struct LegalContract {
    contract_type: Option<&'static str>,
    num_clauses: u32,
    complexity: &'static str,
}

impl LegalContract {
    pub fn new(contract_type: Option<&'static str>, num_clauses: u32, complexity: &'static str) -> Self {
        Self {
            contract_type,
            num_clauses,
            complexity,
        }
    }

    /// `contract_type` is optional; `num_clauses` defaults to 5 and must be
    /// positive; `complexity` defaults to "moderate".
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        let contract_type = choice_param(params, "contract_type", CONTRACT_TYPES)?;
        let complexity = choice_param(params, "complexity", COMPLEXITIES)?.unwrap_or("moderate");
        let num_clauses: u32 = parsed_param(params, "num_clauses", DEFAULT_NUM_CLAUSES)?;
        if num_clauses == 0 {
            return Err(ConfigError::InvalidValue {
                key: "num_clauses".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(Self::new(contract_type, num_clauses, complexity))
    }
}

impl RecordDomain for LegalContract {
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
        params.insert(
            "contract_type".to_string(),
            self.contract_type.unwrap_or(GENERIC_CONTRACT_TYPE).to_string(),
        );
        params.insert("complexity".to_string(), self.complexity.to_string());
        params.insert("num_clauses".to_string(), self.num_clauses.to_string());
        params.insert(
            "effective_date".to_string(),
            Utc::now().date_naive().to_string(),
        );
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let contract_id = request.unique_id().to_string();
        let num_clauses = self.num_clauses.to_string();
        let effective_date = request.created_at().date_naive().to_string();

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("contract_id", contract_id.as_str()),
                (
                    "contract_type",
                    request
                        .param("contract_type")
                        .unwrap_or(self.contract_type.unwrap_or(GENERIC_CONTRACT_TYPE)),
                ),
                ("complexity", request.param("complexity").unwrap_or(self.complexity)),
                (
                    "num_clauses",
                    request.param("num_clauses").unwrap_or(num_clauses.as_str()),
                ),
                (
                    "effective_date",
                    request
                        .param("effective_date")
                        .unwrap_or(effective_date.as_str()),
                ),
            ],
        )
    }

    fn check_record(&self, record: &ParsedRecord) -> Result<(), ValidationError> {
        match record.get("clauses") {
            Some(Value::Array(clauses)) if !clauses.is_empty() => Ok(()),
            _ => Err(ValidationError::Constraint(
                "clauses must be a non-empty list".to_string(),
            )),
        }
    }
}
