/// Job dataset parser - converts the exported JSON dataset into JobRecord domain objects
///
/// Only an unreadable file fails the load. Rows that break the schema are skipped
/// with a warning, and a row whose embedding cannot be read is kept without it.
use crate::domain::base::Entity;
use crate::domain::entities::{JobPayload, JobRecord};
use crate::domain::value_objects::{EmbeddingVector, JobId};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dataset file: {0}")]
    MalformedFile(#[source] serde_json::Error),

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::base::DomainError),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Layout of the dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// A single JSON array of record objects
    JsonArray,
    /// One JSON object per line
    JsonLines,
}

impl DatasetFormat {
    /// Pick the format from the file extension, falling back to the first character
    pub fn detect(path: &Path, content: &str) -> Self {
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match by_extension.as_deref() {
            Some("jsonl") | Some("ndjson") => DatasetFormat::JsonLines,
            _ if content.trim_start().starts_with('[') => DatasetFormat::JsonArray,
            _ => DatasetFormat::JsonLines,
        }
    }
}

/// Parser for job dataset files
pub struct JobDatasetParser;

impl JobDatasetParser {
    /// Parse a dataset file from the given path
    pub async fn parse_file(path: &Path) -> DatasetResult<Vec<JobRecord>> {
        let content = tokio::fs::read_to_string(path).await?;
        let format = DatasetFormat::detect(path, &content);
        Self::parse_content(&content, format)
    }

    /// Parse dataset content into job records, in file order
    ///
    /// Records are numbered from 1: array position for JSON arrays, line number for JSON Lines.
    pub fn parse_content(content: &str, format: DatasetFormat) -> DatasetResult<Vec<JobRecord>> {
        let rows: Vec<(usize, serde_json::Value)> = match format {
            DatasetFormat::JsonArray => {
                serde_json::from_str::<Vec<serde_json::Value>>(content)
                    .map_err(DatasetError::MalformedFile)?
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| (i + 1, value))
                    .collect()
            }
            DatasetFormat::JsonLines => content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .filter_map(|(i, line)| match serde_json::from_str(line) {
                    Ok(value) => Some((i + 1, value)),
                    Err(e) => {
                        warn!("Skipping record {}: malformed JSON: {}", i + 1, e);
                        None
                    }
                })
                .collect(),
        };

        let mut seen = HashSet::with_capacity(rows.len());
        let mut records = Vec::with_capacity(rows.len());
        for (number, value) in rows {
            let record = match serde_json::from_value::<RawJobRecord>(value) {
                Ok(raw) => raw.into_record(number),
                Err(e) => Err(e.to_string()),
            };
            match record {
                Ok(record) if seen.insert(record.id().clone()) => records.push(record),
                Ok(record) => warn!(
                    "Skipping record {}: duplicate job id {}",
                    number,
                    record.id()
                ),
                Err(reason) => warn!("Skipping record {}: {}", number, reason),
            }
        }

        Ok(records)
    }
}

/// A dataset row as exported; unknown keys are ignored
#[derive(Debug, Deserialize)]
struct RawJobRecord {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default, deserialize_with = "lenient_text")]
    job_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    job_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    sub_sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    occupation_role: Option<String>,
    #[serde(default)]
    embedding: Option<RawEmbedding>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Integer(u64),
    // Float ids show up when the exporting frame had missing values in the column
    Float(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEmbedding {
    Values(Vec<f32>),
    /// Stringified list, e.g. "[0.1, -0.2, ...]"
    Encoded(String),
}

impl RawJobRecord {
    /// Build the record, or explain why the row has to be skipped
    fn into_record(self, record: usize) -> Result<JobRecord, String> {
        let id = match self.id {
            Some(RawId::Integer(id)) => JobId::from(id),
            Some(RawId::Float(id)) if id >= 0.0 && id.fract() == 0.0 => JobId::from(id as u64),
            Some(RawId::Float(id)) => return Err(format!("non-integer id {}", id)),
            Some(RawId::Text(id)) => JobId::new(id).map_err(|e| e.to_string())?,
            None => return Err("missing id".to_string()),
        };

        let payload = JobPayload {
            job_title: self.job_title,
            job_description: self.job_description,
            sector: self.sector,
            sub_sector: self.sub_sector,
            occupation_role: self.occupation_role,
        };
        let job = JobRecord::new(id, payload);

        let Some(raw) = self.embedding else {
            return Ok(job);
        };
        let embedding = match raw {
            RawEmbedding::Values(values) => EmbeddingVector::new(values).map_err(|e| e.to_string()),
            RawEmbedding::Encoded(encoded) => serde_json::from_str::<Vec<f32>>(&encoded)
                .map_err(|e| format!("unreadable embedding: {}", e))
                .and_then(|values| EmbeddingVector::new(values).map_err(|e| e.to_string())),
        };

        match embedding {
            Ok(embedding) => Ok(job.with_embedding(embedding)),
            Err(reason) => {
                // The job stays searchable as a hit; searching by it reports the missing vector
                warn!(
                    "Record {} (job {}) has no usable embedding: {}",
                    record,
                    job.id(),
                    reason
                );
                Ok(job)
            }
        }
    }
}

/// Accept strings and numbers; treat null, blank strings and anything else as absent
///
/// Strings are kept exactly as stored so they compare equal to the index payloads.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
