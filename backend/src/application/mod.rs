pub mod dto;
pub mod repositories;
pub mod services;
pub mod use_cases;

// Re-export key types to avoid naming conflicts
pub use dto::{ExampleSearchRequest, TextSearchRequest};
pub use repositories::{IndexError, JobRepository, VectorIndex};
pub use services::{
    EmbeddingError, EmbeddingProgressCallback, EmbeddingProgressEvent, EmbeddingProvider,
    EmbeddingRequester, LiveSearchService, RetryPolicy, SearchService, SearchServiceConfig,
    ServiceSetupError,
};
pub use use_cases::{SearchByExample, SearchByText, SearchError, SearchResult};
