//! Core record types shared by the domains and the pipeline.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::ValidationError;

/// Domain-specific prompt parameters, ordered by name.
pub type DomainParams = BTreeMap<String, String>;

/// Serialization format requested from the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Text,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Yaml, OutputFormat::Json, OutputFormat::Text];

    /// File extension used when persisting a record in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }

    /// Whether completions in this format are parsed into a [`ParsedRecord`].
    pub fn is_structured(&self) -> bool {
        !matches!(self, OutputFormat::Text)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(format!(
                "Unknown output format: {} (expected yaml, json or text)",
                other
            )),
        }
    }
}

/// One unit of work: the identity and parameters of a single record.
///
/// Built once per item and never mutated, so every retry of the same item
/// sees the same id, timestamp and parameters.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    index: usize,
    unique_id: Uuid,
    created_at: DateTime<Utc>,
    output_format: OutputFormat,
    params: DomainParams,
}

impl GenerationRequest {
    /// Creates a request with a fresh UUID v4 and the current UTC time.
    pub fn new(index: usize, output_format: OutputFormat, params: DomainParams) -> Self {
        Self::with_identity(index, Uuid::new_v4(), Utc::now(), output_format, params)
    }

    /// Creates a request with an explicit identity.
    pub fn with_identity(
        index: usize,
        unique_id: Uuid,
        created_at: DateTime<Utc>,
        output_format: OutputFormat,
        params: DomainParams,
    ) -> Self {
        Self {
            index,
            unique_id,
            created_at,
            output_format,
            params,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn unique_id(&self) -> Uuid {
        self.unique_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Creation time as an RFC 3339 string with a `Z` suffix.
    pub fn created_at_rfc3339(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn params(&self) -> &DomainParams {
        &self.params
    }

    /// Looks up a single parameter by name.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// File name of the persisted record: `<unique_id>.<ext>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.unique_id, self.output_format.extension())
    }
}

/// A structured record parsed from a completion, in field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedRecord(Map<String, Value>);

impl ParsedRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts or replaces a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Required field names absent from this record, sorted.
    pub fn missing_fields(&self, required: &[&str]) -> Vec<String> {
        let mut missing: Vec<String> = required
            .iter()
            .filter(|name| !self.0.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ParsedRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A completion that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    /// A yaml/json mapping containing every required field.
    Record(ParsedRecord),
    /// Free-form text, accepted as-is.
    Text(String),
}

/// Result of validating one completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(Validated),
    Invalid(ValidationError),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn into_result(self) -> Result<Validated, ValidationError> {
        match self {
            ValidationOutcome::Valid(validated) => Ok(validated),
            ValidationOutcome::Invalid(err) => Err(err),
        }
    }
}
