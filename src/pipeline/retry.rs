//! Bounded retry around completion and validation.
//!
//! [`RetryController`] is the attempt-counter state machine; the async
//! driver [`generate_with_retry`] feeds it one outcome per attempt. Attempts
//! are strictly sequential with no backoff between them.

use std::future::Future;
use tracing::{debug, error, warn};

use crate::error::{GenerationError, LlmError};
use crate::record::{ParsedRecord, Validated, ValidationOutcome};

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Make another attempt, numbered `next_attempt` (1-based).
    Retry { next_attempt: u32 },
    /// The attempt budget is spent.
    GiveUp { attempts: u32 },
}

/// Attempt counter for a single item.
#[derive(Debug, Clone)]
pub struct RetryController {
    max_attempts: u32,
    attempts: u32,
}

impl RetryController {
    /// Creates a controller allowing `max_attempts` attempts. Zero is treated as one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempts: 0,
        }
    }

    /// Starts the next attempt and returns its 1-based number, or `None`
    /// once the budget is spent.
    pub fn begin_attempt(&mut self) -> Option<u32> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    /// Decides whether a failed attempt may be followed by another one.
    pub fn on_failure(&self) -> RetryDecision {
        if self.attempts < self.max_attempts {
            RetryDecision::Retry {
                next_attempt: self.attempts + 1,
            }
        } else {
            RetryDecision::GiveUp {
                attempts: self.attempts,
            }
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// A completion that passed validation.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Raw completion text of the successful attempt.
    pub raw: String,
    /// Parsed record for structured formats, `None` for text.
    pub record: Option<ParsedRecord>,
    /// Number of attempts used, including the successful one.
    pub attempts: u32,
}

/// Calls the completion service until a response validates or the attempt
/// budget is spent.
///
/// `call_completion` receives the 1-based attempt number. It is invoked
/// exactly `max_attempts` times when every attempt fails and never again
/// after a success. Completion errors and validation failures both count as
/// failed attempts.
pub async fn generate_with_retry<C, Fut, V>(
    mut call_completion: C,
    validate: V,
    max_attempts: u32,
) -> Result<Generated, GenerationError>
where
    C: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<String, LlmError>>,
    V: Fn(&str) -> ValidationOutcome,
{
    let mut controller = RetryController::new(max_attempts);
    let mut last_error = String::new();
    let mut last_output = String::new();

    while let Some(attempt) = controller.begin_attempt() {
        debug!(attempt, max_attempts = controller.max_attempts(), "Requesting completion");

        let failure = match call_completion(attempt).await {
            Ok(raw) => match validate(&raw) {
                ValidationOutcome::Valid(validated) => {
                    return Ok(Generated {
                        record: match validated {
                            Validated::Record(record) => Some(record),
                            Validated::Text(_) => None,
                        },
                        raw,
                        attempts: attempt,
                    });
                }
                ValidationOutcome::Invalid(err) => {
                    let message = err.to_string();
                    last_output = raw;
                    message
                }
            },
            Err(err) => {
                last_output.clear();
                err.to_string()
            }
        };

        warn!(
            attempt,
            max_attempts = controller.max_attempts(),
            error = %failure,
            raw = %last_output,
            "Attempt failed"
        );
        last_error = failure;

        if let RetryDecision::GiveUp { attempts } = controller.on_failure() {
            error!(
                attempts,
                error = %last_error,
                raw = %last_output,
                "All attempts failed"
            );
        }
    }

    Err(GenerationError::ExhaustedRetries {
        attempts: controller.attempts(),
        last_error,
        last_output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::pipeline::validator::validate;
    use crate::record::OutputFormat;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn json_validator(raw: &str) -> ValidationOutcome {
        validate(raw, OutputFormat::Json, &["id", "name"])
    }

    #[test]
    fn test_controller_state_machine() {
        let mut controller = RetryController::new(2);
        assert_eq!(controller.begin_attempt(), Some(1));
        assert_eq!(
            controller.on_failure(),
            RetryDecision::Retry { next_attempt: 2 }
        );
        assert_eq!(controller.begin_attempt(), Some(2));
        assert_eq!(controller.on_failure(), RetryDecision::GiveUp { attempts: 2 });
        assert_eq!(controller.begin_attempt(), None);
    }

    #[test]
    fn test_controller_zero_means_one() {
        let mut controller = RetryController::new(0);
        assert_eq!(controller.max_attempts(), 1);
        assert_eq!(controller.begin_attempt(), Some(1));
        assert_eq!(controller.begin_attempt(), None);
    }

    #[tokio::test]
    async fn test_persistent_failure_makes_exactly_max_attempts_calls() {
        let calls = AtomicU32::new(0);

        let result = generate_with_retry(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, LlmError>("not json".to_string()) }
            },
            json_validator,
            3,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(GenerationError::ExhaustedRetries {
                attempts,
                last_output,
                ..
            }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_output, "not json");
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_on_third_attempt_stops_calling() {
        let calls = AtomicU32::new(0);

        let result = generate_with_retry(
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Ok::<_, LlmError>(r#"{"id":"1"}"#.to_string())
                    } else {
                        Ok(r#"{"id":"1","name":"Lamp"}"#.to_string())
                    }
                }
            },
            json_validator,
            5,
        )
        .await
        .expect("third attempt should succeed");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.attempts, 3);
        assert!(result.record.is_some());
    }

    #[tokio::test]
    async fn test_completion_errors_count_as_attempts() {
        let calls = AtomicU32::new(0);

        let result = generate_with_retry(
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 1 {
                        Err(LlmError::RateLimited("busy".to_string()))
                    } else {
                        Ok(r#"{"id":"1","name":"Lamp"}"#.to_string())
                    }
                }
            },
            json_validator,
            2,
        )
        .await
        .expect("second attempt should succeed");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_last_error_is_reported() {
        let result = generate_with_retry(
            |_| async { Ok::<_, LlmError>(r#"{"id":"1"}"#.to_string()) },
            json_validator,
            1,
        )
        .await;

        match result {
            Err(GenerationError::ExhaustedRetries { last_error, .. }) => {
                let expected = ValidationError::MissingFields {
                    missing: vec!["name".to_string()],
                };
                assert_eq!(last_error, expected.to_string());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_text_output_has_no_record() {
        let result = generate_with_retry(
            |_| async { Ok::<_, LlmError>("Plain text record".to_string()) },
            |raw| validate(raw, OutputFormat::Text, &[]),
            3,
        )
        .await
        .expect("text is always valid");

        assert_eq!(result.raw, "Plain text record");
        assert!(result.record.is_none());
        assert_eq!(result.attempts, 1);
    }
}
