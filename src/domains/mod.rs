//! Record domains.
//!
//! A domain describes one kind of business record: the parameters it
//! accepts, how a prompt is built for it, which fields a valid record must
//! carry, extra record checks and the defaults used to backfill optional
//! fields.
//!
//! # Available domains
//!
//! | Name | Record |
//! |------|--------|
//! | `tech-support` | Support case with a conversation history |
//! | `retail-product` | Catalogue entry |
//! | `healthcare-record` | Anonymized clinical document |
//! | `financial-transaction` | Monthly account statement |
//! | `insurance-claim` | Claim document |
//! | `legal-contract` | Contract with clauses |
//! | `customer-support-chat-log` | Multi-turn support conversation |
//! | `ecommerce-order-history` | Customer order history with returns and reviews |
//! | `hr-employee-record` | Anonymized onboarding, review or leave record |
//! | `it-service-desk-ticket` | Incident, request or change ticket |
//! | `manufacturing-maintenance-log` | Equipment maintenance entry |
//! | `travel-booking` | Flight and hotel booking |
//!
//! Domains are constructed by name from a [`DomainParams`] map with
//! [`build_domain`].

pub mod customer_support_chat_log;
pub mod ecommerce_order_history;
pub mod financial_transaction;
pub mod healthcare_record;
pub mod hr_employee_record;
pub mod insurance_claim;
pub mod it_service_desk_ticket;
pub mod legal_contract;
pub mod manufacturing_maintenance_log;
pub mod retail_product;
pub mod tech_support;
pub mod travel_booking;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::debug;

use crate::error::{ConfigError, ValidationError};
use crate::pipeline::enrich::Enricher;
use crate::record::{DomainParams, GenerationRequest, OutputFormat, ParsedRecord};

pub use customer_support_chat_log::CustomerSupportChatLog;
pub use ecommerce_order_history::EcommerceOrderHistory;
pub use financial_transaction::FinancialTransaction;
pub use healthcare_record::HealthcareRecord;
pub use hr_employee_record::HrEmployeeRecord;
pub use insurance_claim::InsuranceClaim;
pub use it_service_desk_ticket::ItServiceDeskTicket;
pub use legal_contract::LegalContract;
pub use manufacturing_maintenance_log::ManufacturingMaintenanceLog;
pub use retail_product::RetailProduct;
pub use tech_support::TechSupport;
pub use travel_booking::TravelBooking;

/// Sampling parameters sent with every completion request of a domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 1200,
            temperature: 0.7,
            top_p: 0.95,
        }
    }
}

/// One kind of record that can be generated.
pub trait RecordDomain: Send + Sync {
    /// Registry name, as used on the command line.
    fn name(&self) -> &'static str;

    /// One-line description for listings.
    fn description(&self) -> &'static str;

    /// Top-level fields every structured record must contain.
    fn required_fields(&self) -> &'static [&'static str];

    /// Output formats this domain can produce.
    fn supported_formats(&self) -> &'static [OutputFormat] {
        &OutputFormat::ALL
    }

    fn sampling(&self) -> SamplingParams {
        SamplingParams::default()
    }

    /// System message sent ahead of the prompt.
    fn system_message(&self) -> &'static str;

    /// Parameters for one item: the fixed domain parameters plus every
    /// per-item random choice, drawn from the item's RNG.
    fn item_params(&self, rng: &mut ChaCha8Rng) -> DomainParams;

    /// Builds the prompt for one item. Pure: all variable data comes from
    /// the request.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Template` if the prompt template cannot be
    /// rendered.
    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError>;

    /// Domain-specific checks on a record that has every required field.
    fn check_record(&self, _record: &ParsedRecord) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Defaults for optional fields of this item's record.
    fn enricher(&self, _request: &GenerationRequest) -> Enricher {
        Enricher::new()
    }

    /// Advisory inspection of an accepted record; may log warnings.
    fn inspect(&self, _record: &ParsedRecord) {}
}

/// Registry entry describing a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub required_fields: &'static [&'static str],
}

/// Every registered domain, in listing order.
pub fn catalog() -> Vec<DomainInfo> {
    vec![
        tech_support::INFO,
        retail_product::INFO,
        healthcare_record::INFO,
        financial_transaction::INFO,
        insurance_claim::INFO,
        legal_contract::INFO,
        customer_support_chat_log::INFO,
        ecommerce_order_history::INFO,
        hr_employee_record::INFO,
        it_service_desk_ticket::INFO,
        manufacturing_maintenance_log::INFO,
        travel_booking::INFO,
    ]
}

/// Names of every registered domain.
pub fn domain_names() -> Vec<&'static str> {
    catalog().into_iter().map(|info| info.name).collect()
}

/// Constructs a domain by registry name.
///
/// # Errors
///
/// Returns `ConfigError::UnknownDomain` for an unregistered name, or the
/// domain's own error for missing or invalid parameters.
pub fn build_domain(name: &str, params: &DomainParams) -> Result<Arc<dyn RecordDomain>, ConfigError> {
    let domain: Arc<dyn RecordDomain> = match name {
        tech_support::NAME => Arc::new(TechSupport::from_params(params)?),
        retail_product::NAME => Arc::new(RetailProduct::from_params(params)?),
        healthcare_record::NAME => Arc::new(HealthcareRecord::from_params(params)?),
        financial_transaction::NAME => Arc::new(FinancialTransaction::from_params(params)?),
        insurance_claim::NAME => Arc::new(InsuranceClaim::from_params(params)?),
        legal_contract::NAME => Arc::new(LegalContract::from_params(params)?),
        customer_support_chat_log::NAME => Arc::new(CustomerSupportChatLog::from_params(params)?),
        ecommerce_order_history::NAME => Arc::new(EcommerceOrderHistory::from_params(params)?),
        hr_employee_record::NAME => Arc::new(HrEmployeeRecord::from_params(params)?),
        it_service_desk_ticket::NAME => Arc::new(ItServiceDeskTicket::from_params(params)?),
        manufacturing_maintenance_log::NAME => {
            Arc::new(ManufacturingMaintenanceLog::from_params(params)?)
        }
        travel_booking::NAME => Arc::new(TravelBooking::from_params(params)?),
        other => return Err(ConfigError::UnknownDomain(other.to_string())),
    };
    Ok(domain)
}

/// Checks that `domain` can produce `format`.
pub fn ensure_format(domain: &dyn RecordDomain, format: OutputFormat) -> Result<(), ConfigError> {
    if domain.supported_formats().contains(&format) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedFormat {
            domain: domain.name().to_string(),
            format: format.to_string(),
        })
    }
}

/// Renders a prompt template with Tera.
///
/// Values are inserted as-is and never rendered themselves. A placeholder
/// with no matching variable is an error.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> Result<String, ConfigError> {
    let mut context = Context::new();
    for (key, value) in vars {
        context.insert(*key, value);
    }

    Tera::one_off(template, &context, false).map_err(|e| ConfigError::Template(error_chain(&e)))
}

/// Tera reports the cause of a render failure as the error's source.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Reads a parameter, treating blank values as absent.
pub(crate) fn param<'a>(params: &'a DomainParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Reads a mandatory parameter.
pub(crate) fn required_param(params: &DomainParams, key: &str) -> Result<String, ConfigError> {
    param(params, key)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::Missing(format!("--{}", key.replace('_', "-"))))
}

/// Parses an optional parameter, falling back to `default` when absent.
pub(crate) fn parsed_param<T: std::str::FromStr>(
    params: &DomainParams,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match param(params, key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse '{}'", raw),
        }),
        None => Ok(default),
    }
}

/// Parses an optional numeric parameter and clamps it into `range`.
pub(crate) fn clamped_param<T>(
    params: &DomainParams,
    key: &str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Ord + Copy + std::fmt::Display,
{
    let value = parsed_param(params, key, default)?;
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        debug!(key, value = %value, clamped = %clamped, "Parameter clamped into range");
    }
    Ok(clamped)
}

/// Reads an optional parameter restricted to `choices` (case-insensitive),
/// returning the canonical spelling.
pub(crate) fn choice_param(
    params: &DomainParams,
    key: &str,
    choices: &[&'static str],
) -> Result<Option<&'static str>, ConfigError> {
    match param(params, key) {
        None => Ok(None),
        Some(raw) => choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(raw))
            .copied()
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{}' is not one of: {}", raw, choices.join(", ")),
            }),
    }
}

/// Picks one element uniformly.
pub(crate) fn pick<'a>(rng: &mut ChaCha8Rng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    /// A request with a fixed identity for prompt tests.
    pub fn request(format: OutputFormat, params: DomainParams) -> GenerationRequest {
        GenerationRequest::with_identity(
            0,
            Uuid::parse_str("0b7e6a52-3f0c-4b8e-9d7a-2c1f5e4d3a21").expect("valid uuid"),
            Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
            format,
            params,
        )
    }

    pub fn params(pairs: &[(&str, &str)]) -> DomainParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
