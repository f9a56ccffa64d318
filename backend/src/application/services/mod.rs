pub mod embedding_service;
pub mod search_service;

pub use embedding_service::{
    EmbeddingError, EmbeddingProgressCallback, EmbeddingProgressEvent, EmbeddingProvider,
    EmbeddingRequester, EmbeddingResult, RetryDecision, RetryPolicy,
};
pub use search_service::{LiveSearchService, SearchService, SearchServiceConfig, ServiceSetupError};
