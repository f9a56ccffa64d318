/// Embedding provider and vector index adapters for semantic search
mod gemini_service;
mod qdrant_store;

pub use gemini_service::{GeminiEmbeddingClient, GeminiEmbeddingConfig};
pub use qdrant_store::{to_qdrant_filter, QdrantJobIndex};
