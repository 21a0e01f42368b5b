//! Response validation for raw completions.
//!
//! Structured formats are parsed into an ordered mapping and checked against
//! the domain's required-field set. Text output is accepted unchanged.

use serde_json::Value;

use crate::domains::RecordDomain;
use crate::error::ValidationError;
use crate::record::{OutputFormat, ParsedRecord, Validated, ValidationOutcome};
use crate::utils::strip_code_fences;

/// Validates a raw completion against a format and required-field set.
///
/// A record is valid exactly when every name in `required` is a top-level
/// key of the parsed mapping. Never panics, whatever the input.
pub fn validate(raw: &str, format: OutputFormat, required: &[&str]) -> ValidationOutcome {
    let record = match format {
        OutputFormat::Text => return ValidationOutcome::Valid(Validated::Text(raw.to_string())),
        OutputFormat::Yaml | OutputFormat::Json => match parse_mapping(raw, format) {
            Ok(record) => record,
            Err(err) => return ValidationOutcome::Invalid(err),
        },
    };

    let missing = record.missing_fields(required);
    if !missing.is_empty() {
        return ValidationOutcome::Invalid(ValidationError::MissingFields { missing });
    }

    ValidationOutcome::Valid(Validated::Record(record))
}

/// Validates a raw completion for a specific domain.
///
/// Runs [`validate`] with the domain's required fields, then the domain's
/// own record checks on a structurally valid record.
pub fn validate_for(domain: &dyn RecordDomain, raw: &str, format: OutputFormat) -> ValidationOutcome {
    match validate(raw, format, domain.required_fields()) {
        ValidationOutcome::Valid(Validated::Record(record)) => match domain.check_record(&record) {
            Ok(()) => ValidationOutcome::Valid(Validated::Record(record)),
            Err(err) => ValidationOutcome::Invalid(err),
        },
        other => other,
    }
}

fn parse_mapping(raw: &str, format: OutputFormat) -> Result<ParsedRecord, ValidationError> {
    let body = strip_code_fences(raw);

    let value: Value = match format {
        OutputFormat::Json => serde_json::from_str(&body).map_err(|e| parse_error(format, e))?,
        _ => serde_yaml::from_str(&body).map_err(|e| parse_error(format, e))?,
    };

    match value {
        Value::Object(map) => Ok(ParsedRecord::from(map)),
        other => Err(ValidationError::Parse {
            format: format.to_string(),
            message: format!("top-level value is {}, expected a mapping", kind_of(&other)),
        }),
    }
}

fn parse_error(format: OutputFormat, err: impl std::fmt::Display) -> ValidationError {
    ValidationError::Parse {
        format: format.to_string(),
        message: err.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "empty",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRODUCT_FIELDS: &[&str] = &["id", "name"];

    #[test]
    fn test_json_missing_required_field() {
        let outcome = validate(r#"{"id":"1"}"#, OutputFormat::Json, PRODUCT_FIELDS);
        assert_eq!(
            outcome,
            ValidationOutcome::Invalid(ValidationError::MissingFields {
                missing: vec!["name".to_string()]
            })
        );
    }

    #[test]
    fn test_json_with_all_required_fields_is_valid() {
        let outcome = validate(
            r#"{"id":"1","name":"Lamp","price":12.5}"#,
            OutputFormat::Json,
            PRODUCT_FIELDS,
        );

        match outcome {
            ValidationOutcome::Valid(Validated::Record(record)) => {
                assert_eq!(record.get("name"), Some(&json!("Lamp")));
                assert_eq!(record.len(), 3);
            }
            other => panic!("expected a valid record, got {other:?}"),
        }
    }

    #[test]
    fn test_yaml_reports_every_missing_field_sorted() {
        let raw = "price: 10\nname: Lamp\n";
        let outcome = validate(raw, OutputFormat::Yaml, &["sku", "name", "category"]);

        let err = outcome.into_result().expect_err("should be invalid");
        assert_eq!(
            err.missing_fields(),
            Some(&["category".to_string(), "sku".to_string()][..])
        );
    }

    #[test]
    fn test_yaml_in_code_fence_is_accepted() {
        let raw = "```yaml\nid: '1'\nname: Lamp\n```";
        assert!(validate(raw, OutputFormat::Yaml, PRODUCT_FIELDS).is_valid());
    }

    #[test]
    fn test_json_in_code_fence_is_accepted() {
        let raw = "```json\n{\"id\": \"1\", \"name\": \"Lamp\"}\n```";
        assert!(validate(raw, OutputFormat::Json, PRODUCT_FIELDS).is_valid());
    }

    #[test]
    fn test_structurally_invalid_input_is_a_parse_error() {
        let cases = [
            ("{\"id\": ", OutputFormat::Json),
            ("Sure! Here is your product.", OutputFormat::Json),
            ("key: [unclosed", OutputFormat::Yaml),
            ("", OutputFormat::Json),
        ];

        for (raw, format) in cases {
            let outcome = validate(raw, format, PRODUCT_FIELDS);
            assert!(
                matches!(
                    outcome,
                    ValidationOutcome::Invalid(ValidationError::Parse { .. })
                ),
                "expected parse error for {raw:?}, got {outcome:?}"
            );
        }
    }

    #[test]
    fn test_non_mapping_top_level_is_a_parse_error() {
        let outcome = validate("- a\n- b\n", OutputFormat::Yaml, &[]);
        match outcome {
            ValidationOutcome::Invalid(ValidationError::Parse { message, .. }) => {
                assert!(message.contains("sequence"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let plain_scalar = validate("just words", OutputFormat::Yaml, &[]);
        assert!(!plain_scalar.is_valid());
    }

    #[test]
    fn test_text_is_always_valid() {
        let raw = "Case ID: 42\nthis is not yaml: [";
        assert_eq!(
            validate(raw, OutputFormat::Text, &["anything"]),
            ValidationOutcome::Valid(Validated::Text(raw.to_string()))
        );
    }

    #[test]
    fn test_empty_required_set_accepts_any_mapping() {
        assert!(validate("{}", OutputFormat::Json, &[]).is_valid());
    }
}
