/// Qdrant vector index for job similarity queries
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, Condition, Filter, PointId, ScoredPoint, SearchPointsBuilder,
        Value,
    },
    Qdrant,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::application::repositories::vector_index::{IndexError, IndexResult, VectorIndex};
use crate::domain::{
    entities::{JobPayload, SearchHit},
    query_filter::{FieldConstraint, QueryFilter},
    value_objects::{EmbeddingVector, JobId, Score},
};

/// Vector index implementation using Qdrant
pub struct QdrantJobIndex {
    client: Qdrant,
    collection_name: String,
}

impl QdrantJobIndex {
    /// Create a new Qdrant index handle
    ///
    /// # Arguments
    /// * `url` - Qdrant server URL (e.g., "http://localhost:6334")
    /// * `api_key` - API key for managed clusters, if any
    /// * `collection_name` - Name of the collection holding the job vectors
    ///
    /// The connection is established lazily on the first query.
    pub fn new(
        url: &str,
        api_key: Option<String>,
        collection_name: impl Into<String>,
    ) -> Result<Self> {
        info!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .build()
            .context("Failed to connect to Qdrant")?;

        Ok(QdrantJobIndex {
            client,
            collection_name: collection_name.into(),
        })
    }

    /// Create a new index handle for a local unauthenticated instance
    pub fn new_local(collection_name: impl Into<String>) -> Result<Self> {
        Self::new("http://localhost:6334", None, collection_name)
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    async fn search_points(
        &self,
        query_embedding: &EmbeddingVector,
        filter: &QueryFilter,
        limit: u64,
    ) -> Result<Vec<SearchHit>> {
        let mut request = SearchPointsBuilder::new(
            &self.collection_name,
            query_embedding.dimensions().to_vec(),
            limit,
        )
        .with_payload(true);

        if let Some(filter) = to_qdrant_filter(filter) {
            request = request.filter(filter);
        }

        let search_result = self
            .client
            .search_points(request)
            .await
            .context("Search failed")?;

        Ok(search_result
            .result
            .into_iter()
            .filter_map(scored_point_to_hit)
            .collect())
    }
}

#[async_trait]
impl VectorIndex for QdrantJobIndex {
    async fn search(
        &self,
        query: &EmbeddingVector,
        filter: &QueryFilter,
        limit: u64,
    ) -> IndexResult<Vec<SearchHit>> {
        debug!(
            "Searching '{}' with limit: {} (filtered: {})",
            self.collection_name,
            limit,
            !filter.is_match_all()
        );

        let hits = self
            .search_points(query, filter, limit)
            .await
            .map_err(|e| IndexError::Query(format!("{:#}", e)))?;

        debug!("Found {} results", hits.len());
        Ok(hits)
    }
}

/// Translate a filter into Qdrant form; `None` when it matches everything
pub fn to_qdrant_filter(filter: &QueryFilter) -> Option<Filter> {
    if filter.is_match_all() {
        return None;
    }

    Some(Filter {
        must: filter.must().iter().map(keyword_condition).collect(),
        must_not: filter.must_not().iter().map(keyword_condition).collect(),
        ..Default::default()
    })
}

fn keyword_condition(constraint: &FieldConstraint) -> Condition {
    Condition::matches(constraint.field.payload_key(), constraint.value.clone())
}

fn scored_point_to_hit(point: ScoredPoint) -> Option<SearchHit> {
    let id = match point.id.as_ref().and_then(point_id_to_job_id) {
        Some(id) => id,
        None => {
            warn!("Dropping search result without a usable point id");
            return None;
        }
    };

    let payload = &point.payload;
    let job_payload = JobPayload {
        job_title: payload_text(payload, "job_title"),
        job_description: payload_text(payload, "job_description"),
        sector: payload_text(payload, "sector"),
        sub_sector: payload_text(payload, "sub_sector"),
        occupation_role: payload_text(payload, "occupation_role"),
    };

    Some(SearchHit::new(id, Score::new(point.score), job_payload))
}

fn point_id_to_job_id(point_id: &PointId) -> Option<JobId> {
    match point_id.point_id_options.as_ref()? {
        PointIdOptions::Num(num) => Some(JobId::from(*num)),
        PointIdOptions::Uuid(uuid) => JobId::new(uuid.clone()).ok(),
    }
}

/// Read a payload field as text; numbers are rendered, null and other kinds are absent
fn payload_text(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    let value = payload.get(key)?;
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }
    if let Some(number) = value.as_integer() {
        return Some(number.to_string());
    }
    value.as_double().map(|number| number.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::base::Entity;
    use crate::domain::query_filter::CategorySelection;
    use crate::domain::value_objects::CategoryField;
    use qdrant_client::qdrant::{condition::ConditionOneOf, r#match::MatchValue};
    use qdrant_client::Payload;
    use serde_json::json;

    /// (key, keyword) of a field-match condition
    fn keyword_of(condition: &Condition) -> (String, String) {
        match condition.condition_one_of.as_ref() {
            Some(ConditionOneOf::Field(field)) => {
                let keyword = match field.r#match.as_ref().and_then(|m| m.match_value.as_ref()) {
                    Some(MatchValue::Keyword(value)) => value.clone(),
                    other => panic!("Expected keyword match, got {:?}", other),
                };
                (field.key.clone(), keyword)
            }
            other => panic!("Expected field condition, got {:?}", other),
        }
    }

    fn payload_map(value: serde_json::Value) -> HashMap<String, Value> {
        let payload: Payload = value.try_into().unwrap();
        payload.into()
    }

    #[test]
    fn test_match_all_sends_no_filter() {
        assert!(to_qdrant_filter(&QueryFilter::match_all()).is_none());
    }

    #[test]
    fn test_filter_translation() {
        let include = CategorySelection::default()
            .with(CategoryField::Sector, "Automotive")
            .with(CategoryField::SubSector, "Repair")
            .with(CategoryField::OccupationRole, "Service Advisor");
        let exclude = CategorySelection::default().with(CategoryField::Sector, "Retail");

        let filter = to_qdrant_filter(&QueryFilter::from_selections(&include, &exclude)).unwrap();

        let must: Vec<_> = filter.must.iter().map(keyword_of).collect();
        assert_eq!(
            must,
            vec![
                ("sector".to_string(), "Automotive".to_string()),
                ("sub_sector".to_string(), "Repair".to_string()),
                ("occupation_role".to_string(), "Service Advisor".to_string()),
            ]
        );

        let must_not: Vec<_> = filter.must_not.iter().map(keyword_of).collect();
        assert_eq!(must_not, vec![("sector".to_string(), "Retail".to_string())]);
        assert!(filter.should.is_empty());
    }

    #[test]
    fn test_scored_point_conversion() {
        let point = ScoredPoint {
            id: Some(PointId::from(42u64)),
            payload: payload_map(json!({
                "job_title": "Workshop Manager",
                "job_description": "Manage a vehicle repair center",
                "sector": "Automotive",
                "sub_sector": "Repair",
                "occupation_role": "Manager",
                "id": 42
            })),
            score: 0.8731,
            ..Default::default()
        };

        let hit = scored_point_to_hit(point).unwrap();
        assert_eq!(hit.id().as_str(), "42");
        assert_eq!(hit.score().percentage(), 87.31);
        assert_eq!(hit.payload().job_title.as_deref(), Some("Workshop Manager"));
        assert_eq!(hit.payload().sector.as_deref(), Some("Automotive"));
        assert_eq!(hit.payload().occupation_role.as_deref(), Some("Manager"));
    }

    #[test]
    fn test_missing_payload_fields_are_absent() {
        let point = ScoredPoint {
            id: Some(PointId::from("5f8d0d55-b54a-4a3c-9d5e-1f2f3a4b5c6d".to_string())),
            payload: payload_map(json!({ "sector": null, "sub_sector": 7 })),
            score: 0.5,
            ..Default::default()
        };

        let hit = scored_point_to_hit(point).unwrap();
        assert_eq!(hit.id().as_str(), "5f8d0d55-b54a-4a3c-9d5e-1f2f3a4b5c6d");
        assert_eq!(hit.payload().job_title, None);
        assert_eq!(hit.payload().sector, None);
        assert_eq!(hit.payload().sub_sector.as_deref(), Some("7"));
    }

    #[test]
    fn test_point_without_id_is_dropped() {
        let point = ScoredPoint {
            id: None,
            score: 0.9,
            ..Default::default()
        };
        assert!(scored_point_to_hit(point).is_none());
    }

    #[tokio::test]
    #[ignore] // Requires running Qdrant instance with a populated collection
    async fn test_search_live_collection() {
        let index = QdrantJobIndex::new_local("JD_without_title").unwrap();
        let query = EmbeddingVector::new(vec![0.01; 768]).unwrap();

        let hits = index.search(&query, &QueryFilter::match_all(), 3).await.unwrap();

        assert!(hits.len() <= 3);
        assert!(hits
            .windows(2)
            .all(|pair| pair[0].score().value() >= pair[1].score().value()));
    }
}
