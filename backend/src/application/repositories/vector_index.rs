use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{entities::SearchHit, query_filter::QueryFilter, value_objects::EmbeddingVector};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Vector index unavailable: {0}")]
    Connection(String),

    #[error("Vector index query failed: {0}")]
    Query(String),
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Nearest-neighbour queries against an external vector index.
///
/// Implementations return hits ordered by descending score, at most `limit` of them.
/// A filter for which `is_match_all()` holds must not constrain the query.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(
        &self,
        query: &EmbeddingVector,
        filter: &QueryFilter,
        limit: u64,
    ) -> IndexResult<Vec<SearchHit>>;
}
