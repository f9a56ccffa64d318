/// Value objects for the domain layer
use super::base::{DomainError, DomainResult, ValueObject};
use std::fmt;

/// Display value substituted for any missing optional field
pub const PLACEHOLDER: &str = "N/A";

/// Unique identifier for a job record
///
/// The dataset stores integer ids while Qdrant point ids may be numeric or
/// UUIDs, so the identifier is kept in its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidValue("JobId cannot be empty".to_string()));
        }
        Ok(JobId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        JobId(id.to_string())
    }
}

impl ValueObject for JobId {}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dense embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    dimensions: Vec<f32>,
}

impl EmbeddingVector {
    pub fn new(dimensions: Vec<f32>) -> DomainResult<Self> {
        if dimensions.is_empty() {
            return Err(DomainError::InvalidValue(
                "Embedding vector cannot be empty".to_string(),
            ));
        }
        if let Some(position) = dimensions.iter().position(|v| !v.is_finite()) {
            return Err(DomainError::InvalidValue(format!(
                "Embedding vector has a non-finite value at index {}",
                position
            )));
        }
        Ok(EmbeddingVector { dimensions })
    }

    pub fn dimensions(&self) -> &[f32] {
        &self.dimensions
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Cosine similarity with another vector of the same length
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> DomainResult<f32> {
        if self.dimension_count() != other.dimension_count() {
            return Err(DomainError::InvalidValue(format!(
                "Dimension mismatch: {} vs {}",
                self.dimension_count(),
                other.dimension_count()
            )));
        }

        let dot: f32 = self
            .dimensions
            .iter()
            .zip(other.dimensions.iter())
            .map(|(a, b)| a * b)
            .sum();
        let norm_a = self.dimensions.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm_b = other.dimensions.iter().map(|v| v * v).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }
        Ok(dot / (norm_a * norm_b))
    }
}

impl ValueObject for EmbeddingVector {}

/// Relevance score reported by the vector index (nominally 0..=1)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(f32);

impl Score {
    pub fn new(value: f32) -> Self {
        Score(value)
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Score scaled to a percentage and rounded to two decimals
    pub fn percentage(&self) -> f64 {
        (f64::from(self.0) * 100.0 * 100.0).round() / 100.0
    }
}

impl ValueObject for Score {}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 87.50 -> "87.5", 100.00 -> "100"
        let formatted = format!("{:.2}", self.percentage());
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{}", trimmed)
    }
}

/// Categorical attribute of a job record that can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryField {
    Sector,
    SubSector,
    OccupationRole,
}

impl CategoryField {
    /// All fields in filter clause order
    pub const ALL: [CategoryField; 3] = [
        CategoryField::Sector,
        CategoryField::SubSector,
        CategoryField::OccupationRole,
    ];

    /// Key of the field in the dataset and in the index payload
    pub fn payload_key(&self) -> &'static str {
        match self {
            CategoryField::Sector => "sector",
            CategoryField::SubSector => "sub_sector",
            CategoryField::OccupationRole => "occupation_role",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryField::Sector => "Sector",
            CategoryField::SubSector => "Sub-sector",
            CategoryField::OccupationRole => "Occupation Role",
        }
    }

    /// Parse a field name as typed by a user ("sector", "sub-sector", "role", ...)
    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sector" => Ok(CategoryField::Sector),
            "sub_sector" | "subsector" => Ok(CategoryField::SubSector),
            "occupation_role" | "occupation" | "role" => Ok(CategoryField::OccupationRole),
            other => Err(DomainError::InvalidValue(format!(
                "Unknown category field '{}' (expected sector, sub-sector or occupation-role)",
                other
            ))),
        }
    }
}

impl ValueObject for CategoryField {}

impl fmt::Display for CategoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
