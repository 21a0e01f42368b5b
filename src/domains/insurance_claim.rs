//! Insurance claim documents.

use chrono::{Duration, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use super::{choice_param, parsed_param, pick, render, DomainInfo, RecordDomain};
use crate::error::ConfigError;
use crate::pipeline::enrich::Enricher;
use crate::record::{DomainParams, GenerationRequest, OutputFormat};

pub const NAME: &str = "insurance-claim";

pub const REQUIRED_FIELDS: &[&str] = &[
    "claim_id",
    "policy_type",
    "incident_type",
    "date_of_loss",
    "claimant",
    "description",
    "claim_amount",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Insurance claims for auto, home or health policies",
    required_fields: REQUIRED_FIELDS,
};

pub const POLICY_TYPES: &[&str] = &["auto", "home", "health"];
pub const STATUSES: &[&str] = &["open", "investigating", "approved", "rejected"];

const SYSTEM_MESSAGE: &str =
    "You are an insurance adjuster producing fictional claim records as structured data.";

const PROMPT_HEADER: &str = "You are an insurance adjuster generating REALISTIC BUT ENTIRELY FICTIONAL insurance claim records for demonstrations.

## CLAIM OVERVIEW

Claim ID: {{claim_id}}
Policy Type: {{policy_type}}
Incident: {{incident_type}}
Date of Loss: {{date_of_loss}}
Status: {{status}}
";

const FRAUD_HINT: &str = "This claim MAY BE FRAUDULENT - add subtle anomalies.\n";

const REQUIRED_OUTPUT: &str = "
## REQUIRED OUTPUT

Provide a single claim document with realistic data fields.
Respond in {{format}} only - no commentary.
Do NOT invent real PII. Use synthetic names and addresses.
Use ISO-8601 dates.
";

const STRUCTURED_FIELDS: &str = "
Top-level fields: claim_id, policy_type, incident_type, date_of_loss, status,
claimant (name, policy_number, contact), description, claim_amount (number),
currency, adjuster_notes (optional).
";

/// Incidents that fit a policy type.
pub fn incidents_for(policy_type: &str) -> &'static [&'static str] {
    match policy_type {
        "auto" => &["collision", "theft", "windshield damage"],
        "home" => &["fire", "flood", "break-in"],
        "health" => &["surgery", "emergency room visit", "routine check-up"],
        _ => &["other"],
    }
}

/// Claims for one policy type with a given share of suspicious claims.
#[derive(Debug, Clone)]
pub struct InsuranceClaim {
    policy_type: &'static str,
    fraud_percent: u8,
}

impl InsuranceClaim {
    /// `fraud_percent` is clamped to 0..=100.
    pub fn new(policy_type: &'static str, fraud_percent: u8) -> Self {
        Self {
            policy_type,
            fraud_percent: fraud_percent.min(100),
        }
    }

    /// `policy_type` is one of auto/home/health (default auto);
    /// `fraud_percent` is 0..=100 (default 0).
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        let policy_type = choice_param(params, "policy_type", POLICY_TYPES)?.unwrap_or("auto");
        let fraud_percent: u8 = parsed_param(params, "fraud_percent", 0)?;
        if fraud_percent > 100 {
            return Err(ConfigError::InvalidValue {
                key: "fraud_percent".to_string(),
                message: format!("{} is not between 0 and 100", fraud_percent),
            });
        }
        Ok(Self::new(policy_type, fraud_percent))
    }
}

impl RecordDomain for InsuranceClaim {
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
        let days_back = rng.random_range(1..=365);
        let date_of_loss = Utc::now().date_naive() - Duration::days(days_back);
        let fraudulent = rng.random_bool(f64::from(self.fraud_percent) / 100.0);

        let mut params = DomainParams::new();
        params.insert("policy_type".to_string(), self.policy_type.to_string());
        params.insert(
            "incident_type".to_string(),
            pick(rng, incidents_for(self.policy_type)).to_string(),
        );
        params.insert("date_of_loss".to_string(), date_of_loss.to_string());
        params.insert("status".to_string(), pick(rng, STATUSES).to_string());
        params.insert("fraudulent".to_string(), fraudulent.to_string());
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let claim_id = request.unique_id().to_string();
        let format = request.output_format().as_str().to_uppercase();

        let mut template = PROMPT_HEADER.to_string();
        if request.param("fraudulent") == Some("true") {
            template.push_str(FRAUD_HINT);
        }
        template.push_str(REQUIRED_OUTPUT);
        if request.output_format().is_structured() {
            template.push_str(STRUCTURED_FIELDS);
        }

        render(
            &template,
            &[
                ("claim_id", claim_id.as_str()),
                (
                    "policy_type",
                    request.param("policy_type").unwrap_or(self.policy_type),
                ),
                ("incident_type", request.param("incident_type").unwrap_or("other")),
                ("date_of_loss", request.param("date_of_loss").unwrap_or("")),
                ("status", request.param("status").unwrap_or("open")),
                ("format", format.as_str()),
            ],
        )
    }

    fn enricher(&self, request: &GenerationRequest) -> Enricher {
        let status = request.param("status").unwrap_or("open").to_string();
        Enricher::new()
            .with_constant("currency", json!("USD"))
            .with_constant("status", json!(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::{params, request};
    use crate::pipeline::validator::validate_for;
    use crate::record::{Validated, ValidationOutcome};

    #[test]
    fn test_policy_type_must_be_known() {
        assert!(InsuranceClaim::from_params(&params(&[("policy_type", "boat")])).is_err());
        let domain =
            InsuranceClaim::from_params(&params(&[("policy_type", "HOME")])).expect("builds");
        assert_eq!(domain.policy_type, "home");
    }

    #[test]
    fn test_fraud_percent_range() {
        assert!(InsuranceClaim::from_params(&params(&[("fraud_percent", "101")])).is_err());
        assert!(InsuranceClaim::from_params(&params(&[("fraud_percent", "-1")])).is_err());
        assert_eq!(InsuranceClaim::new("auto", 250).fraud_percent, 100);
    }

    #[test]
    fn test_item_params_follow_policy_type() {
        let domain = InsuranceClaim::new("home", 0);
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let today = Utc::now().date_naive();

        for _ in 0..20 {
            let p = domain.item_params(&mut rng);
            assert!(incidents_for("home").contains(&p["incident_type"].as_str()));
            assert!(STATUSES.contains(&p["status"].as_str()));
            assert_eq!(p["fraudulent"], "false");

            let loss: chrono::NaiveDate = p["date_of_loss"].parse().expect("iso date");
            let days = (today - loss).num_days();
            // A day boundary may pass between drawing and checking.
            assert!((0..=366).contains(&days), "{days} days back");
        }
    }

    #[test]
    fn test_every_claim_flagged_at_full_fraud_rate() {
        let domain = InsuranceClaim::new("auto", 100);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = domain.item_params(&mut rng);
        assert_eq!(p["fraudulent"], "true");

        let prompt = domain
            .build_prompt(&request(OutputFormat::Yaml, p))
            .expect("prompt renders");
        assert!(prompt.contains("MAY BE FRAUDULENT"));
        assert!(prompt.contains("Respond in YAML only"));
        assert!(prompt.contains("Top-level fields: claim_id"));
    }

    #[test]
    fn test_text_prompt_has_no_field_list() {
        let domain = InsuranceClaim::new("health", 0);
        let p = domain.item_params(&mut ChaCha8Rng::seed_from_u64(2));
        let prompt = domain
            .build_prompt(&request(OutputFormat::Text, p))
            .expect("prompt renders");

        assert!(prompt.contains("Claim ID: 0b7e6a52-3f0c-4b8e-9d7a-2c1f5e4d3a21"));
        assert!(prompt.contains("Respond in TEXT only"));
        assert!(!prompt.contains("Top-level fields"));
        assert!(!prompt.contains("FRAUDULENT"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_claim_without_status_gets_sampled_status() {
        let domain = InsuranceClaim::new("auto", 0);
        let raw = json!({
            "claim_id": "c-1",
            "policy_type": "auto",
            "incident_type": "collision",
            "date_of_loss": "2025-03-02",
            "claimant": {"name": "Sam Example", "policy_number": "POL-1"},
            "description": "Rear-ended at a junction.",
            "claim_amount": 1800.0
        })
        .to_string();

        let record = match validate_for(&domain, &raw, OutputFormat::Json) {
            ValidationOutcome::Valid(Validated::Record(record)) => record,
            other => panic!("expected a valid record, got {other:?}"),
        };
        let enriched = domain
            .enricher(&request(OutputFormat::Json, params(&[("status", "approved")])))
            .enrich(record, &mut ChaCha8Rng::seed_from_u64(0));

        assert_eq!(enriched.get("status"), Some(&json!("approved")));
        assert_eq!(enriched.get("currency"), Some(&json!("USD")));
    }
}
