pub mod job_repository;
pub mod vector_index;

pub use job_repository::JobRepository;
pub use vector_index::{IndexError, VectorIndex};
