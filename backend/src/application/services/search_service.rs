/// Search service wiring the dataset, the embedding provider and the vector index together
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::application::dto::{ExampleSearchRequest, TextSearchRequest};
use crate::application::repositories::{JobRepository, VectorIndex};
use crate::application::services::embedding_service::{
    EmbeddingProgressCallback, EmbeddingProvider, EmbeddingRequester, RetryPolicy,
};
use crate::application::use_cases::{SearchByExample, SearchByText, SearchResult};
use crate::domain::entities::SearchHit;
use crate::infrastructure::embeddings::{
    GeminiEmbeddingClient, GeminiEmbeddingConfig, QdrantJobIndex,
};
use crate::infrastructure::parsers::DatasetError;
use crate::infrastructure::persistence::JsonJobRepository;

#[derive(Error, Debug)]
pub enum ServiceSetupError {
    #[error("Failed to load job dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Failed to set up vector index: {0}")]
    Index(String),
}

/// Configuration for the search service
#[derive(Debug, Clone)]
pub struct SearchServiceConfig {
    /// Qdrant gRPC endpoint
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    /// Collection holding one point per job, keyed by job id
    pub collection_name: String,
    /// Exported dataset with the stored embeddings
    pub dataset_path: PathBuf,
    pub embedding: GeminiEmbeddingConfig,
    pub retry: RetryPolicy,
}

impl Default for SearchServiceConfig {
    fn default() -> Self {
        SearchServiceConfig {
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_api_key: None,
            collection_name: "JD_without_title".to_string(),
            dataset_path: PathBuf::from("JD_without_title_embeddings.json"),
            embedding: GeminiEmbeddingConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Entry point for both search flows
pub struct SearchService<P: EmbeddingProvider, V: VectorIndex, R: JobRepository> {
    requester: EmbeddingRequester<P>,
    index: V,
    repository: R,
}

impl<P: EmbeddingProvider, V: VectorIndex, R: JobRepository> SearchService<P, V, R> {
    pub fn from_parts(requester: EmbeddingRequester<P>, index: V, repository: R) -> Self {
        SearchService {
            requester,
            index,
            repository,
        }
    }

    /// Search with free text
    pub async fn search_by_text(&self, request: &TextSearchRequest) -> SearchResult<Vec<SearchHit>> {
        SearchByText::new(&self.requester, &self.index)
            .execute(request)
            .await
    }

    /// Search for jobs similar to an existing one
    pub async fn search_by_example(
        &self,
        request: &ExampleSearchRequest,
    ) -> SearchResult<Vec<SearchHit>> {
        SearchByExample::new(&self.repository, &self.index)
            .execute(request)
            .await
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn requester(&self) -> &EmbeddingRequester<P> {
        &self.requester
    }
}

/// The service as deployed: Gemini embeddings, Qdrant index, dataset file
pub type LiveSearchService = SearchService<GeminiEmbeddingClient, QdrantJobIndex, JsonJobRepository>;

impl LiveSearchService {
    /// Load the dataset and prepare the external clients
    ///
    /// Neither Gemini nor Qdrant is contacted here; failures there surface per search.
    pub async fn connect(
        config: SearchServiceConfig,
        progress_callback: Option<EmbeddingProgressCallback>,
    ) -> Result<Self, ServiceSetupError> {
        let repository = JsonJobRepository::load(&config.dataset_path).await?;

        let index = QdrantJobIndex::new(
            &config.qdrant_url,
            config.qdrant_api_key.clone(),
            config.collection_name.clone(),
        )
        .map_err(|e| ServiceSetupError::Index(format!("{:#}", e)))?;

        let mut requester =
            EmbeddingRequester::new(GeminiEmbeddingClient::new(config.embedding), config.retry);
        if let Some(callback) = progress_callback {
            requester = requester.with_progress_callback(callback);
        }

        info!(
            "Search service ready: {} jobs, collection '{}'",
            repository.catalog().len(),
            index.collection_name()
        );

        Ok(SearchService::from_parts(requester, index, repository))
    }
}
