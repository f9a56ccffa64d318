use std::ops::RangeInclusive;

use crate::domain::{query_filter::CategorySelection, value_objects::JobId};

/// Allowed result counts for free-text search
pub const TEXT_TOP_K_RANGE: RangeInclusive<u64> = 1..=10;

/// Allowed result counts for search by example record
pub const EXAMPLE_TOP_K_RANGE: RangeInclusive<u64> = 1..=20;

pub const DEFAULT_TOP_K: u64 = 5;

/// Search request for free-text queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearchRequest {
    /// The query text to embed
    pub query: String,
    /// Number of results to return
    pub top_k: u64,
    /// Fields the results must match, pushed into the index query
    pub include: CategorySelection,
    /// Sector the results must not belong to
    pub exclude_sector: Option<String>,
}

impl TextSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            include: CategorySelection::default(),
            exclude_sector: None,
        }
    }

    pub fn with_top_k(mut self, top_k: u64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_include(mut self, include: CategorySelection) -> Self {
        self.include = include;
        self
    }

    pub fn with_exclude_sector(mut self, sector: Option<String>) -> Self {
        self.exclude_sector = sector;
        self
    }

    /// The exclusion as a selection; only sector is supported for text queries
    pub fn exclude(&self) -> CategorySelection {
        CategorySelection {
            sector: self.exclude_sector.clone(),
            ..Default::default()
        }
    }
}

/// Search request for records similar to an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleSearchRequest {
    /// The record whose stored embedding is the query
    pub job_id: JobId,
    /// Number of results to return
    pub top_k: u64,
    /// Fields the results must match (applied after retrieval)
    pub include: CategorySelection,
    /// Fields the results must not match (applied after retrieval)
    pub exclude: CategorySelection,
}

impl ExampleSearchRequest {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            top_k: DEFAULT_TOP_K,
            include: CategorySelection::default(),
            exclude: CategorySelection::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: u64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_include(mut self, include: CategorySelection) -> Self {
        self.include = include;
        self
    }

    pub fn with_exclude(mut self, exclude: CategorySelection) -> Self {
        self.exclude = exclude;
        self
    }
}
