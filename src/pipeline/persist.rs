//! Record persistence.
//!
//! Each record is written to `<out_dir>/<unique_id>.<ext>`. The content is
//! written to a temporary file in the same directory and renamed into place,
//! so a reader never observes a partially written record.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::PersistenceError;
use crate::record::{GenerationRequest, OutputFormat, ParsedRecord, Validated};

/// Key under which generation metadata is stored in structured records.
pub const METADATA_KEY: &str = "generation_metadata";

/// Provenance stamped onto every persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationMetadata {
    pub generator: String,
    pub generator_version: String,
}

impl Default for GenerationMetadata {
    fn default() -> Self {
        Self {
            generator: env!("CARGO_PKG_NAME").to_string(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Writes validated records into an output directory.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    out_dir: PathBuf,
    metadata: Option<GenerationMetadata>,
}

impl RecordWriter {
    /// Creates a writer that stamps default metadata onto each record.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            metadata: Some(GenerationMetadata::default()),
        }
    }

    /// Replaces or disables (`None`) the metadata stamped onto records.
    pub fn with_metadata(mut self, metadata: Option<GenerationMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Creates the output directory and any missing parents.
    pub fn ensure_dir(&self) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.out_dir)?;
        Ok(())
    }

    /// Path a record for `request` is written to.
    pub fn path_for(&self, request: &GenerationRequest) -> PathBuf {
        self.out_dir.join(request.file_name())
    }

    /// Serializes and atomically writes one record. Blocking.
    pub fn write(
        &self,
        request: &GenerationRequest,
        content: Validated,
    ) -> Result<PathBuf, PersistenceError> {
        let body = self.render(request.output_format(), content)?;
        let path = self.path_for(request);

        self.ensure_dir()?;
        let mut tmp = NamedTempFile::new_in(&self.out_dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| PersistenceError::Persist {
            path: path.display().to_string(),
            message: e.error.to_string(),
        })?;

        debug!(path = %path.display(), bytes = body.len(), "Record written");
        Ok(path)
    }

    /// Renders the file body for a validated record.
    pub fn render(
        &self,
        format: OutputFormat,
        content: Validated,
    ) -> Result<String, PersistenceError> {
        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        match content {
            Validated::Record(record) => {
                let record = match &self.metadata {
                    Some(metadata) => stamp_record(record, metadata, &generated_at),
                    None => record,
                };
                serialize_record(&record, format)
            }
            Validated::Text(text) => {
                let mut body = text.trim_end().to_string();
                if let Some(metadata) = &self.metadata {
                    body.push_str(&format!(
                        "\n\n---Generation Metadata---\nGenerated At: {}\nGenerator: {} {}",
                        generated_at, metadata.generator, metadata.generator_version
                    ));
                }
                body.push('\n');
                Ok(body)
            }
        }
    }
}

fn stamp_record(
    mut record: ParsedRecord,
    metadata: &GenerationMetadata,
    generated_at: &str,
) -> ParsedRecord {
    let previous = record.insert(
        METADATA_KEY,
        json!({
            "generated_at": generated_at,
            "generator": metadata.generator,
            "generator_version": metadata.generator_version,
        }),
    );
    if let Some(previous) = previous {
        debug!(key = METADATA_KEY, replaced = %previous, "Replacing model-supplied metadata");
    }
    record
}

fn serialize_record(record: &ParsedRecord, format: OutputFormat) -> Result<String, PersistenceError> {
    let serialize_error = |message: String| PersistenceError::Serialize {
        format: format.to_string(),
        message,
    };

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(record.as_map())
            .map(|mut body| {
                body.push('\n');
                body
            })
            .map_err(|e| serialize_error(e.to_string())),
        OutputFormat::Yaml => {
            serde_yaml::to_string(record.as_map()).map_err(|e| serialize_error(e.to_string()))
        }
        OutputFormat::Text => serde_json::to_string_pretty(&Value::Object(record.as_map().clone()))
            .map_err(|e| serialize_error(e.to_string())),
    }
}
