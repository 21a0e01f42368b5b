//! Monthly bank-account statements with a transaction ledger.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};

use super::{param, parsed_param, render, DomainInfo, RecordDomain, SamplingParams};
use crate::error::{ConfigError, ValidationError};
use crate::pipeline::enrich::Enricher;
use crate::record::{DomainParams, GenerationRequest, OutputFormat, ParsedRecord};

pub const NAME: &str = "financial-transaction";

pub const REQUIRED_FIELDS: &[&str] = &[
    "statement_id",
    "account_id",
    "account_type",
    "start_date",
    "end_date",
    "opening_balance",
    "closing_balance",
    "transactions",
];

pub const INFO: DomainInfo = DomainInfo {
    name: NAME,
    description: "Bank-account statements with realistic transactions",
    required_fields: REQUIRED_FIELDS,
};

const DEFAULT_ACCOUNT_TYPE: &str = "checking";
const DEFAULT_MIN_TRANSACTIONS: usize = 50;

const SYSTEM_MESSAGE: &str =
    "You are a banking data specialist producing fictional account statements as structured data.";

const PROMPT_HEADER: &str = "You are a banking data specialist creating realistic but entirely fictional
ACCOUNT STATEMENTS for demonstrations such as fraud-detection analytics.
Never reveal any real PII. Use plausible but fake names & IDs.

Account Type: {{account_type}}
Account ID:   {{account_id}}
Statement ID: {{statement_id}}
Period:       {{start_date}} - {{end_date}}

Generate AT LEAST {{min_transactions}} transactions within the period. Distribute dates,
amounts and balances realistically. Use ISO-8601 dates and two-decimal
currency amounts (USD). Opening balance + sum(transactions) must equal the
closing balance (allow for rounding cents).
";

const YAML_SKELETON: &str = "Return valid YAML ONLY (no fences).

statement_id: {{statement_id}}
account_id: {{account_id}}
account_type: {{account_type}}
start_date: {{start_date}}
end_date: {{end_date}}
opening_balance: 1234.56
closing_balance: 2345.67
currency: USD
transactions:
  - tx_id: uuid
    date: ISO 8601
    description: text
    amount: 12.34               # negative = debit, positive = credit
    balance_after: 1246.90      # running ledger balance
    category: groceries|salary|transfer|utilities|other
";

const JSON_SKELETON: &str = r#"{
  "statement_id":"{{statement_id}}",
  "account_id":"{{account_id}}",
  "account_type":"{{account_type}}",
  "start_date":"{{start_date}}",
  "end_date":"{{end_date}}",
  "opening_balance":1234.56,
  "closing_balance":2345.67,
  "currency":"USD",
  "transactions":[
    {
      "tx_id":"uuid",
      "date":"ISO 8601",
      "description":"text",
      "amount":-25.30,
      "balance_after":1209.26,
      "category":"groceries"
    }
  ]
}
Return JSON ONLY (no markdown fences).
"#;

const TEXT_SKELETON: &str = "Statement ID: {{statement_id}}
Account ID: {{account_id}} ({{account_type}})
Period: {{start_date}} to {{end_date}}
Opening Balance: 1234.56 USD
Closing Balance: 2345.67 USD

Transactions:
date | description | amount | balance_after | category
----------------------------------------------------------------
2024-01-02 | Grocery Store | -45.67 | 1188.89 | groceries
... at least {{min_transactions}} rows ...
";

/// Statements for one account type.
#[derive(Debug, Clone)]
pub struct FinancialTransaction {
    account_type: String,
    min_transactions: usize,
}

impl FinancialTransaction {
    pub fn new(account_type: impl Into<String>, min_transactions: usize) -> Self {
        Self {
            account_type: account_type.into(),
            min_transactions,
        }
    }

    /// `account_type` defaults to "checking", `min_transactions` to 50.
    pub fn from_params(params: &DomainParams) -> Result<Self, ConfigError> {
        let min_transactions =
            parsed_param(params, "min_transactions", DEFAULT_MIN_TRANSACTIONS)?;
        if min_transactions == 0 {
            return Err(ConfigError::InvalidValue {
                key: "min_transactions".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(Self::new(
            param(params, "account_type").unwrap_or(DEFAULT_ACCOUNT_TYPE),
            min_transactions,
        ))
    }

    pub fn min_transactions(&self) -> usize {
        self.min_transactions
    }
}

/// First and last day of the calendar month before `today`.
pub fn previous_month(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first_of_this_month = today.with_day(1).unwrap_or(today);
    let end = first_of_this_month - Duration::days(1);
    let start = end.with_day(1).unwrap_or(end);
    (start, end)
}

impl RecordDomain for FinancialTransaction {
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
            max_tokens: 4000,
            temperature: 0.55,
            ..SamplingParams::default()
        }
    }

    fn system_message(&self) -> &'static str {
        SYSTEM_MESSAGE
    }

    fn item_params(&self, rng: &mut ChaCha8Rng) -> DomainParams {
        let (start, end) = previous_month(Utc::now().date_naive());
        let account_id: u64 = rng.random_range(1_000_000_000..=9_999_999_999);

        let mut params = DomainParams::new();
        params.insert("account_type".to_string(), self.account_type.clone());
        params.insert("account_id".to_string(), account_id.to_string());
        params.insert("start_date".to_string(), start.to_string());
        params.insert("end_date".to_string(), end.to_string());
        params.insert(
            "min_transactions".to_string(),
            self.min_transactions.to_string(),
        );
        params
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Result<String, ConfigError> {
        let statement_id = request.unique_id().to_string();
        let min_transactions = self.min_transactions.to_string();

        let skeleton = match request.output_format() {
            OutputFormat::Yaml => YAML_SKELETON,
            OutputFormat::Json => JSON_SKELETON,
            OutputFormat::Text => TEXT_SKELETON,
        };

        render(
            &format!("{}\n{}", PROMPT_HEADER, skeleton),
            &[
                ("statement_id", statement_id.as_str()),
                (
                    "account_type",
                    request.param("account_type").unwrap_or(self.account_type.as_str()),
                ),
                ("account_id", request.param("account_id").unwrap_or("")),
                ("start_date", request.param("start_date").unwrap_or("")),
                ("end_date", request.param("end_date").unwrap_or("")),
                ("min_transactions", min_transactions.as_str()),
            ],
        )
    }

    fn check_record(&self, record: &ParsedRecord) -> Result<(), ValidationError> {
        let count = match record.get("transactions") {
            Some(Value::Array(items)) => items.len(),
            Some(_) => {
                return Err(ValidationError::Constraint(
                    "transactions must be a list".to_string(),
                ))
            }
            None => 0,
        };

        if count < self.min_transactions {
            return Err(ValidationError::Constraint(format!(
                "fewer than {} transactions returned (got {})",
                self.min_transactions, count
            )));
        }
        Ok(())
    }

    fn enricher(&self, _request: &GenerationRequest) -> Enricher {
        Enricher::new().with_constant("currency", json!("USD"))
    }
}
