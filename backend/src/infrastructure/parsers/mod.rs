mod job_dataset;

pub use job_dataset::{DatasetError, DatasetFormat, DatasetResult, JobDatasetParser};
