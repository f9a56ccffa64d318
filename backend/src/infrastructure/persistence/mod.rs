mod json_job_repository;

pub use json_job_repository::JsonJobRepository;
