/// Domain entities
use super::base::Entity;
use super::value_objects::{CategoryField, EmbeddingVector, JobId, Score, PLACEHOLDER};

/// Descriptive fields of a job, as stored in the dataset and in the index payload
///
/// Every field is optional; the source data is not guaranteed to be complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPayload {
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub sector: Option<String>,
    pub sub_sector: Option<String>,
    pub occupation_role: Option<String>,
}

impl JobPayload {
    /// Value of a categorical field, if present
    pub fn category(&self, field: CategoryField) -> Option<&str> {
        match field {
            CategoryField::Sector => self.sector.as_deref(),
            CategoryField::SubSector => self.sub_sector.as_deref(),
            CategoryField::OccupationRole => self.occupation_role.as_deref(),
        }
    }

    pub fn title_or_placeholder(&self) -> &str {
        or_placeholder(&self.job_title)
    }

    pub fn description_or_placeholder(&self) -> &str {
        or_placeholder(&self.job_description)
    }

    pub fn category_or_placeholder(&self, field: CategoryField) -> &str {
        self.category(field).unwrap_or(PLACEHOLDER)
    }
}

fn or_placeholder(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(PLACEHOLDER)
}

/// A job record from the reference dataset
/// Read once at startup and never mutated
#[derive(Debug, Clone)]
pub struct JobRecord {
    id: JobId,
    payload: JobPayload,
    embedding: Option<EmbeddingVector>,
}

impl JobRecord {
    pub fn new(id: JobId, payload: JobPayload) -> Self {
        JobRecord {
            id,
            payload,
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: EmbeddingVector) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn payload(&self) -> &JobPayload {
        &self.payload
    }

    /// The precomputed embedding, if the dataset carried one
    pub fn embedding(&self) -> Option<&EmbeddingVector> {
        self.embedding.as_ref()
    }

    /// Label used when offering the record for selection: "<id> - <title> (<role>)"
    pub fn display_label(&self) -> String {
        format!(
            "{} - {} ({})",
            self.id,
            self.payload.title_or_placeholder(),
            self.payload.category_or_placeholder(CategoryField::OccupationRole)
        )
    }
}

impl Entity for JobRecord {
    type Id = JobId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A single ranked result returned by the vector index
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    id: JobId,
    score: Score,
    payload: JobPayload,
}

impl SearchHit {
    pub fn new(id: JobId, score: Score, payload: JobPayload) -> Self {
        SearchHit { id, score, payload }
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn payload(&self) -> &JobPayload {
        &self.payload
    }
}

impl Entity for SearchHit {
    type Id = JobId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
