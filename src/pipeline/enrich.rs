//! Set-if-absent enrichment of parsed records.
//!
//! An [`Enricher`] holds an ordered list of field defaults. Each default is
//! produced by a generator that draws from the caller's RNG, so two items
//! never share random state and a seeded RNG gives reproducible output.

use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::record::ParsedRecord;

/// Produces a default value for one field.
pub type FieldGenerator = Box<dyn Fn(&mut ChaCha8Rng) -> Value + Send + Sync>;

/// Ordered set of field defaults applied to a record.
#[derive(Default)]
pub struct Enricher {
    defaults: Vec<(String, FieldGenerator)>,
}

impl Enricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default for `field`, generated on demand.
    pub fn with_default<F>(mut self, field: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&mut ChaCha8Rng) -> Value + Send + Sync + 'static,
    {
        self.defaults.push((field.into(), Box::new(generator)));
        self
    }

    /// Adds a fixed default for `field`.
    pub fn with_constant(self, field: impl Into<String>, value: Value) -> Self {
        self.with_default(field, move |_| value.clone())
    }

    /// Field names this enricher may fill, in application order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.defaults.iter().map(|(field, _)| field.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    /// Inserts every absent default field. Present fields are never touched,
    /// and generators for present fields are not called.
    pub fn enrich(&self, mut record: ParsedRecord, rng: &mut ChaCha8Rng) -> ParsedRecord {
        for (field, generator) in &self.defaults {
            if !record.contains_key(field) {
                let value = generator(rng);
                record.insert(field.clone(), value);
            }
        }
        record
    }
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher")
            .field("fields", &self.fields().collect::<Vec<_>>())
            .finish()
    }
}

/// Rounds to `places` decimal digits, for money and rating values.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
