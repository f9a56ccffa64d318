use thiserror::Error;
use tracing::{debug, info};

use crate::application::{
    dto::{ExampleSearchRequest, TextSearchRequest, EXAMPLE_TOP_K_RANGE, TEXT_TOP_K_RANGE},
    repositories::{IndexError, JobRepository, VectorIndex},
    services::{EmbeddingError, EmbeddingProvider, EmbeddingRequester},
};
use crate::domain::{
    base::{DomainError, Entity},
    entities::SearchHit,
    query_filter::QueryFilter,
    value_objects::JobId,
};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("No job with id {0} in the dataset")]
    UnknownJob(JobId),

    #[error("Job {0} has no stored embedding")]
    MissingEmbedding(JobId),

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Repository error: {0}")]
    Repository(#[from] DomainError),
}

pub type SearchResult<T> = Result<T, SearchError>;

/// Use case for searching the index with free text
///
/// Embeds the query (with bounded retries), pushes the include filters and the
/// sector exclusion into the index query, and returns the hits unmodified.
pub struct SearchByText<'a, P: EmbeddingProvider, V: VectorIndex> {
    requester: &'a EmbeddingRequester<P>,
    index: &'a V,
}

impl<'a, P: EmbeddingProvider, V: VectorIndex> SearchByText<'a, P, V> {
    pub fn new(requester: &'a EmbeddingRequester<P>, index: &'a V) -> Self {
        Self { requester, index }
    }

    pub async fn execute(&self, request: &TextSearchRequest) -> SearchResult<Vec<SearchHit>> {
        if request.query.trim().is_empty() {
            return Err(SearchError::InvalidRequest(
                "Query text cannot be empty".to_string(),
            ));
        }
        check_top_k(request.top_k, &TEXT_TOP_K_RANGE)?;

        let embedding = self.requester.embed_text(&request.query).await?;
        let filter = QueryFilter::from_selections(&request.include, &request.exclude());
        debug!(
            "Text search: top_k={}, must={}, must_not={}",
            request.top_k,
            filter.must().len(),
            filter.must_not().len()
        );

        let hits = self
            .index
            .search(&embedding, &filter, request.top_k)
            .await?;

        info!("Text search returned {} hits", hits.len());
        Ok(hits)
    }
}

/// Use case for finding records similar to an existing record
///
/// Uses the record's stored embedding, asks the index for one extra hit so the
/// record itself can be dropped, then applies all include/exclude constraints
/// to the retrieved hits before truncating.
pub struct SearchByExample<'a, R: JobRepository, V: VectorIndex> {
    repository: &'a R,
    index: &'a V,
}

impl<'a, R: JobRepository, V: VectorIndex> SearchByExample<'a, R, V> {
    pub fn new(repository: &'a R, index: &'a V) -> Self {
        Self { repository, index }
    }

    pub async fn execute(&self, request: &ExampleSearchRequest) -> SearchResult<Vec<SearchHit>> {
        check_top_k(request.top_k, &EXAMPLE_TOP_K_RANGE)?;

        let record = self
            .repository
            .find_by_id(&request.job_id)?
            .ok_or_else(|| SearchError::UnknownJob(request.job_id.clone()))?;
        let embedding = record
            .embedding()
            .ok_or_else(|| SearchError::MissingEmbedding(request.job_id.clone()))?;

        let mut hits = self
            .index
            .search(embedding, &QueryFilter::match_all(), request.top_k + 1)
            .await?;
        let retrieved = hits.len();

        hits.retain(|hit| hit.id() != &request.job_id);

        let post_filter = QueryFilter::from_selections(&request.include, &request.exclude);
        let mut hits = post_filter.apply(hits);
        hits.truncate(request.top_k as usize);

        info!(
            "Example search for job {}: {} retrieved, {} kept",
            request.job_id,
            retrieved,
            hits.len()
        );
        Ok(hits)
    }
}

fn check_top_k(top_k: u64, range: &std::ops::RangeInclusive<u64>) -> SearchResult<()> {
    if range.contains(&top_k) {
        Ok(())
    } else {
        Err(SearchError::InvalidRequest(format!(
            "Number of results must be between {} and {}, got {}",
            range.start(),
            range.end(),
            top_k
        )))
    }
}
