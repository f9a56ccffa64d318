use crate::application::repositories::JobRepository;
use crate::domain::aggregates::JobCatalog;
use crate::domain::entities::JobRecord;
use crate::domain::value_objects::{CategoryField, JobId};
use crate::domain::DomainResult;
use crate::infrastructure::parsers::{DatasetResult, JobDatasetParser};
use std::path::{Path, PathBuf};
use tracing::info;

/// Read-only JobRepository backed by the exported dataset file
///
/// The file is read once; all lookups are served from the in-memory catalog.
pub struct JsonJobRepository {
    catalog: JobCatalog,
    source: PathBuf,
}

impl JsonJobRepository {
    /// Load the dataset at `path`
    pub async fn load(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let path = path.as_ref();
        info!("Loading job dataset from {}", path.display());

        let records = JobDatasetParser::parse_file(path).await?;
        let catalog = JobCatalog::new(records)?;

        info!(
            "Loaded {} jobs ({} sectors, {} sub-sectors, {} occupation roles)",
            catalog.len(),
            catalog.options(CategoryField::Sector).len(),
            catalog.options(CategoryField::SubSector).len(),
            catalog.options(CategoryField::OccupationRole).len()
        );

        Ok(JsonJobRepository {
            catalog,
            source: path.to_path_buf(),
        })
    }

    pub fn catalog(&self) -> &JobCatalog {
        &self.catalog
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl JobRepository for JsonJobRepository {
    fn find_by_id(&self, id: &JobId) -> DomainResult<Option<&JobRecord>> {
        self.catalog.find_by_id(id)
    }

    fn find_all(&self) -> DomainResult<&[JobRecord]> {
        self.catalog.find_all()
    }

    fn category_options(&self, field: CategoryField) -> DomainResult<&[String]> {
        self.catalog.category_options(field)
    }
}
