//! Anonymized clinical documents.
//!
//! Records describe fictional patients only. Accepted records are inspected
//! for patient names that look like real personal data, which is logged as a
//! warning for review rather than rejected.

use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::warn;

use super::{param, pick, render, DomainInfo, RecordDomain, SamplingParams};
use crate::error::ConfigError;
use crate::record::{DomainParams, GenerationRequest, OutputFormat, ParsedRecord};

pub const NAME: &str = "healthcare-record";

pub const REQUIRED_FIELDS: &[&str] = &[
    "record_id",
    "document_type",
    "specialty",
    "created_at",
    "patient_details",
    "document_content",
    "author_details",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Anonymized healthcare documents (clinic notes, discharge summaries, ...)",
    required_fields: REQUIRED_FIELDS,
};

/// Document types drawn per record when none is given.
pub const DOCUMENT_TYPES: &[&str] = &[
    "Clinic Note",
    "Discharge Summary",
    "Referral Letter",
    "Operative Note",
    "Pathology Report",
    "Consultation Note",
    "Progress Note",
    "Radiology Report",
];

const DEFAULT_SPECIALTY: &str = "General Medicine";

const SYSTEM_MESSAGE: &str =
    "You generate entirely fictional, anonymized healthcare documents for testing data pipelines.";

const PROMPT_HEADER: &str = "You are an AI assistant tasked with generating realistic but entirely FAKE and ANONYMIZED healthcare documents.
DO NOT include any real patient names, addresses, phone numbers, or any other personally identifiable information (PII). Use placeholder names like \"Jane Doe\", \"John Smith\" or fictional names.
Ensure all medical details, conditions, and treatments are plausible for the specified document type and specialty, but are entirely fictional.
The generated content should be suitable for testing data processing pipelines and AI models without raising privacy concerns or violating content safety policies.

Document Type: {{document_type}}
Specialty: {{specialty}}
Record ID: {{record_id}}
Creation Date: {{created_at}}
";

const YAML_SKELETON: &str = "Output MUST be valid YAML. Do not wrap in markdown.

Generate a FAKE and ANONYMIZED '{{document_type}}' for the '{{specialty}}' specialty.

record_id: {{record_id}}
document_type: '{{document_type}}'
specialty: '{{specialty}}'
created_at: {{created_at}}
patient_details:
  fictional_name: \"Fictional Patient Name (e.g., Jane Doe, Robert Smith)\"
  age: integer (e.g., 35)
  gender: \"Male | Female | Other | Prefer not to say\"
  fictional_patient_id: \"Fake ID (e.g., MRN-FAKE-12345)\"
document_content:
  title: \"Clear title for the document\"
  sections:
    - heading: \"Reason for Visit/Consultation\"
      content: \"Detailed fictional paragraph.\"
    - heading: \"History of Present Illness\"
      content: \"Detailed fictional paragraph.\"
    - heading: \"Assessment\"
      content: \"Fictional assessment or findings.\"
    - heading: \"Plan\"
      content: \"Fictional treatment plan or recommendations.\"
  # Add other sections relevant to the document type, e.g. \"Hospital Course\" for a
  # Discharge Summary or \"Postoperative Diagnosis\" for an Operative Note.
author_details:
  fictional_doctor_name: \"Dr. Fictional Name\"
  fictional_clinic_name: \"Fictional Clinic/Hospital Name\"
  fictional_contact_info: \"fake-email@example.com / 555-0100-FAKE\"

Return ONLY the YAML. DO NOT INCLUDE ANY OTHER TEXT OR MARKUP.
";

const JSON_SKELETON: &str = r#"Output MUST be valid JSON. Do not wrap in markdown.

{
  "record_id": "{{record_id}}",
  "document_type": "{{document_type}}",
  "specialty": "{{specialty}}",
  "created_at": "{{created_at}}",
  "patient_details": {
    "fictional_name": "Fictional Patient Name (e.g., Jane Doe, Robert Smith)",
    "age": 35,
    "gender": "Female",
    "fictional_patient_id": "MRN-FAKE-12345"
  },
  "document_content": {
    "title": "Cardiology Clinic Follow-up Note",
    "sections": [
      { "heading": "Reason for Visit/Consultation", "content": "Detailed fictional paragraph." },
      { "heading": "History of Present Illness", "content": "Detailed fictional paragraph." },
      { "heading": "Assessment", "content": "Fictional assessment or findings." },
      { "heading": "Plan", "content": "Fictional treatment plan or recommendations." }
    ]
  },
  "author_details": {
    "fictional_doctor_name": "Dr. Fictional Name",
    "fictional_clinic_name": "Fictional Clinic/Hospital Name",
    "fictional_contact_info": "fake-email@example.com / 555-0100-FAKE"
  }
}

Ensure the 'sections' array contains appropriate headings and content for a '{{document_type}}' in '{{specialty}}'.
The content must be entirely fictional and anonymized.
Return ONLY the JSON. DO NOT INCLUDE ANY OTHER TEXT OR MARKUP.
"#;

const TEXT_SKELETON: &str = "Generate a FAKE and ANONYMIZED '{{document_type}}' for the '{{specialty}}' specialty.
The output should be plain text, well-formatted, and easy to read.
Include sections like:
- Patient Information (Fictional Name, Age, Gender, Fictional ID)
- Document Title
- Date of Service/Creation: {{created_at}}
- Key Sections relevant to a '{{document_type}}' (e.g., Reason for Visit, History, Assessment, Plan, Findings, Recommendations).
- Authored by (Fictional Doctor, Fictional Clinic).

Example Structure:

Record ID: {{record_id}}
Document Type: {{document_type}}
Specialty: {{specialty}}
Created At: {{created_at}}

Patient: Jane Doe (Fictional)
Age: 45
Gender: Female
Patient ID: FAKE-PT-001

--- Document: {{document_type}} ---
Title: Example {{document_type}} for {{specialty}}

[Section Heading 1]
[Fictional content for section 1...]

[Section Heading 2]
[Fictional content for section 2...]

---
Authored by:
Dr. Fictional Name
Fictional Clinic for {{specialty}}
Contact: fake-doctor@example.com / 555-0101-FAKE

Ensure all information is plausible but entirely fictional and anonymized.
";

/// Healthcare documents of one specialty, with a fixed or per-record
/// document type.
#[derive(Debug, Clone)]
pub struct HealthcareRecord {
    document_type: Option<String>,
    specialty: String,
}

impl HealthcareRecord {
    pub fn new(document_type: Option<String>, specialty: impl Into<String>) -> Self {
        Self {
            document_type,
            specialty: specialty.into(),
        }
    }

    /// `document_type` is optional; `specialty` defaults to "General Medicine".
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        Ok(Self::new(
            param(params, "document_type").map(str::to_string),
            param(params, "specialty").unwrap_or(DEFAULT_SPECIALTY),
        ))
    }
}

impl RecordDomain for HealthcareRecord {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        INFO.description
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn sampling(&self) -> SamplingParams {
        SamplingParams {
            max_tokens: 1500,
            temperature: 0.6,
            ..SamplingParams::default()
        }
    }

    fn system_message(&self) -> &'static str {
        SYSTEM_MESSAGE
    }

    fn item_params(&self, rng: &mut ChaCha8Rng) -> DomainParams {
        let document_type = match &self.document_type {
            Some(fixed) => fixed.clone(),
            None => pick(rng, DOCUMENT_TYPES).to_string(),
        };

        let mut params = DomainParams::new();
        params.insert("document_type".to_string(), document_type);
        params.insert("specialty".to_string(), self.specialty.clone());
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let record_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();
        let document_type = request
            .param("document_type")
            .or(self.document_type.as_deref())
            .unwrap_or(DOCUMENT_TYPES[0]);
        let specialty = request.param("specialty").unwrap_or(self.specialty.as_str());

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("document_type", document_type),
                ("specialty", specialty),
                ("record_id", record_id.as_str()),
                ("created_at", created_at.as_str()),
            ],
        )
    }

    fn inspect(&self, record: &ParsedRecord) {
        if let Some(name) = suspicious_patient_name(record) {
            warn!(
                patient_name = %name,
                "Potential PII-like patient name detected; review the output"
            );
        }
    }
}

/// Returns the patient name when it looks like real personal data.
fn suspicious_patient_name(record: &ParsedRecord) -> Option<&str> {
    let name = record
        .get("patient_details")
        .and_then(|details| details.get("fictional_name"))
        .and_then(Value::as_str)?;

    if name.contains('@') || name.to_lowercase().contains("real name") {
        Some(name)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::{params, request};
    use rand::prelude::*;
    use serde_json::json;

    #[test]
    fn test_defaults_and_sampling() {
        let domain = HealthcareRecord::from_params(&DomainParams::new()).expect("builds");
        let p = domain.item_params(&mut ChaCha8Rng::seed_from_u64(2));

        assert_eq!(p["specialty"], "General Medicine");
        assert!(DOCUMENT_TYPES.contains(&p["document_type"].as_str()));
        assert_eq!(domain.sampling().max_tokens, 1500);
        assert!((domain.sampling().temperature - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fixed_document_type_is_used_for_every_item() {
        let domain = HealthcareRecord::from_params(&params(&[
            ("document_type", "Discharge Summary"),
            ("specialty", "Cardiology"),
        ]))
        .expect("builds");

        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..10 {
            assert_eq!(domain.item_params(&mut rng)["document_type"], "Discharge Summary");
        }
    }

    #[test]
    fn test_random_document_types_vary_across_items() {
        let domain = HealthcareRecord::new(None, "Oncology");
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut seen: Vec<String> = (0..40)
            .map(|_| domain.item_params(&mut rng)["document_type"].clone())
            .collect();
        seen.sort();
        seen.dedup();
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_json_prompt_prefills_identity() {
        let domain = HealthcareRecord::new(Some("Referral Letter".to_string()), "Pediatrics");
        let req = request(
            OutputFormat::Json,
            domain.item_params(&mut ChaCha8Rng::seed_from_u64(0)),
        );
        let prompt = domain.build_prompt(&req).expect("prompt renders");

        assert!(prompt.contains(r#""record_id": "0b7e6a52-3f0c-4b8e-9d7a-2c1f5e4d3a21""#));
        assert!(prompt.contains(r#""specialty": "Pediatrics""#));
        assert!(prompt.contains("'Referral Letter' in 'Pediatrics'"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_suspicious_patient_names() {
        let flagged: ParsedRecord = json!({"patient_details": {"fictional_name": "jane@contoso.com"}})
            .as_object()
            .cloned()
            .expect("object")
            .into();
        assert_eq!(suspicious_patient_name(&flagged), Some("jane@contoso.com"));

        let fine: ParsedRecord = json!({"patient_details": {"fictional_name": "Jane Doe"}})
            .as_object()
            .cloned()
            .expect("object")
            .into();
        assert_eq!(suspicious_patient_name(&fine), None);
        assert_eq!(suspicious_patient_name(&ParsedRecord::new()), None);
    }
}
