//! Per-customer e-commerce order histories.

use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use super::{clamped_param, param, render, DomainInfo, RecordDomain, SamplingParams};
use crate::error::{ConfigError, ValidationError};
use crate::record::{DomainParams, GenerationRequest, OutputFormat, ParsedRecord};

pub const NAME: &str = "ecommerce-order-history";

pub const REQUIRED_FIELDS: &[&str] = &["customer_id", "created_at", "industry", "orders"];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Customer order histories with returns, reviews and support interactions",
    required_fields: REQUIRED_FIELDS,
};

const DEFAULT_INDUSTRY: &str = "general retail";
const DEFAULT_ORDERS_MIN: u32 = 3;
const DEFAULT_RETURNS_PERCENT: u32 = 10;

const SYSTEM_MESSAGE: &str =
    "You are an e-commerce data specialist producing fictional customer order histories as structured data.";

const PROMPT_HEADER: &str = "You are an e-commerce data specialist producing REALISTIC BUT ENTIRELY FICTIONAL per-customer order history snapshots.

Customer ID (immutable): {{customer_id}}
Created At: {{created_at}}
Industry: {{industry}}
Orders Min: {{orders_min}}
Returns Percent: {{returns_percent}}

Generate a comprehensive customer order history including orders, returns, product reviews, and (optionally) support interactions. Roughly {{returns_percent}}% of orders should end up returned. All data must be fictional with no real PII. Use ISO timestamps throughout.

Always output ONLY the requested data structure, with no markdown fences and no commentary.
";

const YAML_SKELETON: &str = "Return valid YAML ONLY.

customer_id: (echo above)
created_at: (echo above)
industry: (echo above)
orders:
  - order_id: uuid
    order_date: ISO timestamp
    items:
      - sku: text
        name: product name
        qty: integer
        price: decimal
        currency: USD
    total: decimal
    status: placed|shipped|delivered|returned
  # ... generate at least {{orders_min}} orders ...
returns:  # optional, based on returns_percent
  - order_id: uuid from orders above
    return_date: ISO timestamp
    reason: descriptive text
    status: approved|rejected|pending
reviews:  # optional, for some orders
  - order_id: uuid from orders above
    sku: text from items
    rating: 1-5
    title: review title
    review: review text
interactions:  # optional support interactions
  - timestamp: ISO timestamp
    channel: email|chat|phone
    subject: interaction subject
    outcome: resolution description
";

const JSON_SKELETON: &str = r#"Return valid JSON ONLY.

{
  "customer_id": "(echo above)",
  "created_at": "(echo above)",
  "industry": "(echo above)",
  "orders": [
    {
      "order_id": "uuid",
      "order_date": "ISO timestamp",
      "items": [
        {
          "sku": "text",
          "name": "product name",
          "qty": 1,
          "price": 123.45,
          "currency": "USD"
        }
      ],
      "total": 123.45,
      "status": "placed|shipped|delivered|returned"
    }
    // ... generate at least {{orders_min}} orders ...
  ],
  "returns": [
    {
      "order_id": "uuid from orders above",
      "return_date": "ISO timestamp",
      "reason": "descriptive text",
      "status": "approved|rejected|pending"
    }
  ],
  "reviews": [
    {
      "order_id": "uuid from orders above",
      "sku": "text from items",
      "rating": 5,
      "title": "review title",
      "review": "review text"
    }
  ],
  "interactions": [
    {
      "timestamp": "ISO timestamp",
      "channel": "email|chat|phone",
      "subject": "interaction subject",
      "outcome": "resolution description"
    }
  ]
}
"#;

const TEXT_SKELETON: &str = "Return plain text WITHOUT any YAML/JSON formatting markers.

Customer ID: (echo above)
Created At: (echo above)
Industry: (echo above)

ORDERS:
Order 1:
  Order ID: uuid
  Order Date: ISO timestamp
  Items:
    - SKU: text, Name: product name, Qty: 1, Price: 123.45 USD
  Total: 123.45
  Status: delivered
(at least {{orders_min}} orders)

RETURNS:
Return 1:
  Order ID: uuid from orders
  Return Date: ISO timestamp
  Reason: descriptive text
  Status: approved

REVIEWS:
Review 1:
  Order ID: uuid from orders
  SKU: text from items
  Rating: 5/5
  Title: review title
  Review: review text

INTERACTIONS:
Interaction 1:
  Timestamp: ISO timestamp
  Channel: email
  Subject: interaction subject
  Outcome: resolution description
";

/// Order histories for one industry with a minimum number of orders.
#[derive(Debug, Clone)]
pub struct EcommerceOrderHistory {
    industry: String,
    orders_min: u32,
    returns_percent: u32,
}

impl EcommerceOrderHistory {
    pub fn new(industry: impl Into<String>, orders_min: u32, returns_percent: u32) -> Self {
        Self {
            industry: industry.into(),
            orders_min: orders_min.clamp(1, 50),
            returns_percent: returns_percent.min(100),
        }
    }

    /// `industry` defaults to "general retail", `orders_min` to 3 (clamped
    /// to 1-50) and `returns_percent` to 10 (clamped to 0-100).
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        Ok(Self::new(
            param(params, "industry").unwrap_or(DEFAULT_INDUSTRY),
            clamped_param(params, "orders_min", DEFAULT_ORDERS_MIN, 1..=50)?,
            clamped_param(params, "returns_percent", DEFAULT_RETURNS_PERCENT, 0..=100)?,
        ))
    }

    pub fn orders_min(&self) -> u32 {
        self.orders_min
    }
}

impl RecordDomain for EcommerceOrderHistory {
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
            max_tokens: 3000,
            ..SamplingParams::default()
        }
    }

    fn system_message(&self) -> &'static str {
        SYSTEM_MESSAGE
    }

    fn item_params(&self, _rng: &mut ChaCha8Rng) -> DomainParams {
        let mut params = DomainParams::new();
        params.insert("industry".to_string(), self.industry.clone());
        params.insert("orders_min".to_string(), self.orders_min.to_string());
        params.insert(
            "returns_percent".to_string(),
            self.returns_percent.to_string(),
        );
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let customer_id = request.unique_id().to_string();
        let created_at = request.created_at_rfc3339();
        let orders_min = self.orders_min.to_string();
        let returns_percent = self.returns_percent.to_string();

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("customer_id", customer_id.as_str()),
                ("created_at", created_at.as_str()),
                ("industry", request.param("industry").unwrap_or(self.industry.as_str())),
                ("orders_min", orders_min.as_str()),
                ("returns_percent", returns_percent.as_str()),
            ],
        )
    }

    fn check_record(&self, record: &ParsedRecord) -> Result<(), ValidationError> {
        let count = match record.get("orders") {
            Some(Value::Array(orders)) => orders.len(),
            _ => {
                return Err(ValidationError::Constraint(
                    "orders must be a list".to_string(),
                ))
            }
        };

        if count < self.orders_min as usize {
            return Err(ValidationError::Constraint(format!(
                "fewer than {} orders returned (got {})",
                self.orders_min, count
            )));
        }
        Ok(())
    }
}
