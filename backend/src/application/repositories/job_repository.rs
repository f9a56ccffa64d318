use crate::domain::{
    aggregates::JobCatalog, entities::JobRecord, value_objects::CategoryField,
    value_objects::JobId, DomainResult,
};

/// Repository trait for reading the job reference dataset.
///
/// The dataset is loaded once and is read-only afterwards, so the contract only
/// covers lookups. Implementations can be backed by a file, a fixture, etc.
pub trait JobRepository {
    /// Finds a job record by its identifier.
    ///
    /// Returns `Ok(Some(record))` if found, `Ok(None)` if not found,
    /// or an error if the operation fails.
    fn find_by_id(&self, id: &JobId) -> DomainResult<Option<&JobRecord>>;

    /// Returns all job records in dataset order.
    fn find_all(&self) -> DomainResult<&[JobRecord]>;

    /// Returns the sorted distinct values of a categorical field.
    fn category_options(&self, field: CategoryField) -> DomainResult<&[String]>;
}

impl JobRepository for JobCatalog {
    fn find_by_id(&self, id: &JobId) -> DomainResult<Option<&JobRecord>> {
        Ok(self.find(id))
    }

    fn find_all(&self) -> DomainResult<&[JobRecord]> {
        Ok(self.records())
    }

    fn category_options(&self, field: CategoryField) -> DomainResult<&[String]> {
        Ok(self.options(field))
    }
}
