/// Aggregates for the domain layer
use super::base::{DomainError, DomainResult, Entity};
use super::entities::JobRecord;
use super::value_objects::{CategoryField, JobId};
use std::collections::{BTreeSet, HashMap};

/// The read-only reference dataset
///
/// Holds every job record in dataset order, an index by id, and the sorted
/// distinct values of each categorical field (the selectable filter options).
#[derive(Debug, Clone, Default)]
pub struct JobCatalog {
    records: Vec<JobRecord>,
    index: HashMap<JobId, usize>,
    options: HashMap<CategoryField, Vec<String>>,
}

impl JobCatalog {
    /// Build a catalog, rejecting duplicate ids
    pub fn new(records: Vec<JobRecord>) -> DomainResult<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index.insert(record.id().clone(), position).is_some() {
                return Err(DomainError::InvalidValue(format!(
                    "Duplicate job id in dataset: {}",
                    record.id()
                )));
            }
        }

        let options = CategoryField::ALL
            .iter()
            .map(|field| (*field, distinct_values(&records, *field)))
            .collect();

        Ok(JobCatalog {
            records,
            index,
            options,
        })
    }

    pub fn find(&self, id: &JobId) -> Option<&JobRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    /// Sorted distinct non-empty values of a categorical field
    pub fn options(&self, field: CategoryField) -> &[String] {
        self.options
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn distinct_values(records: &[JobRecord], field: CategoryField) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.payload().category(field))
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
