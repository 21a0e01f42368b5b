//! Retail catalogue entries.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use super::{pick, render, DomainInfo, RecordDomain, SamplingParams};
use crate::error::ConfigError;
use crate::pipeline::enrich::{round_to, Enricher};
use crate::record::{DomainParams, GenerationRequest, OutputFormat};

pub const NAME: &str = "retail-product";

pub const REQUIRED_FIELDS: &[&str] = &["product_id", "created_at", "name", "category", "description"];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Retail-product catalogue entries",
    required_fields: REQUIRED_FIELDS,
};

pub const CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "AUD", "CAD"];

const DEFAULT_INDUSTRY: &str = "general";

const SYSTEM_MESSAGE: &str =
    "You write realistic but entirely fictional retail catalogue entries as structured data.";

const PROMPT_HEADER: &str = "You are a seasoned e-commerce copy-writer producing REALISTIC BUT ENTIRELY FICTIONAL retail-product catalogue entries.

Product ID (immutable): {{product_id}}
Created At: {{created_at}}
Industry Theme: {{industry}}

Always output ONLY the requested data structure, with no markdown fences and no commentary.
";

const YAML_SKELETON: &str = "Return valid YAML ONLY.

product_id: (echo above)
created_at: (echo above)
name: catchy product name
category: sub-category relevant to {{industry}}
description: persuasive paragraph (60-120 words)
price: realistic decimal number > 1
currency: ISO 4217 e.g. USD
tags: [list, of, keywords]
attributes:
  key: value pairs (e.g. colour: red, size: L)
stock_quantity: integer 0-500
rating: float 0-5 with one decimal (optional)
";

const JSON_SKELETON: &str = r#"Return valid JSON ONLY.

{
  "product_id": "(echo above)",
  "created_at": "(echo above)",
  "category": "Relevant sub-category for {{industry}}",
  "name": "Product name",
  "description": "60-120 word paragraph",
  "price": 123.45,
  "currency": "USD",
  "tags": ["tag1","tag2"],
  "attributes": {"key":"value"},
  "stock_quantity": 123,
  "rating": 4.6
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT YAML/JSON markers.

Product ID: (echo above)
Created At: (echo above)
Name: Product name
Category: Relevant sub-category
Description: 60-120 word paragraph
Price: 123.45 USD
Tags: tag1, tag2
Attributes:
  key: value
Stock Quantity: 123
Rating: 4.6
";

/// Catalogue entries for one industry theme.
#[derive(Debug, Clone)]
pub struct RetailProduct {
    industry: String,
}

impl RetailProduct {
    pub fn new(industry: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
        }
    }

    /// `industry` defaults to "general".
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        Ok(Self::new(
            super::param(params, "industry").unwrap_or(DEFAULT_INDUSTRY),
        ))
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }
}

impl RecordDomain for RetailProduct {
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
            max_tokens: 800,
            ..SamplingParams::default()
        }
    }

    fn system_message(&self) -> &'static str {
        SYSTEM_MESSAGE
    }

    fn item_params(&self, _rng: &mut ChaCha8Rng) -> DomainParams {
        let mut params = DomainParams::new();
        params.insert("industry".to_string(), self.industry.clone());
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let product_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();
        let industry = request.param("industry").unwrap_or(self.industry.as_str());

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("product_id", product_id.as_str()),
                ("created_at", created_at.as_str()),
                ("industry", industry),
            ],
        )
    }

    fn enricher(&self, _request: &GenerationRequest) -> Enricher {
        Enricher::new()
            .with_default("price", |rng| json!(round_to(rng.random_range(5.0..=500.0), 2)))
            .with_default("currency", |rng| json!(pick(rng, CURRENCIES)))
            .with_default("stock_quantity", |rng| json!(rng.random_range(0..=500u32)))
            .with_default("rating", |rng| json!(round_to(rng.random_range(1.0..=5.0), 1)))
    }
}
