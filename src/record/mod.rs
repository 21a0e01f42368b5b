//! Record data model.
//!
//! A [`GenerationRequest`] fixes the identity and parameters of one record
//! before any completion call is made. Completions are validated into a
//! [`ValidationOutcome`]; structured output becomes a [`ParsedRecord`].

pub mod types;

pub use types::{
    DomainParams, GenerationRequest, OutputFormat, ParsedRecord, Validated, ValidationOutcome,
};
