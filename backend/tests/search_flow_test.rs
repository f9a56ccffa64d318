/// End-to-end tests for both search flows, driven through the public API with in-memory doubles
use async_trait::async_trait;
use job_similarity::application::{
    dto::{ExampleSearchRequest, TextSearchRequest},
    repositories::{vector_index::IndexResult, VectorIndex},
    services::{
        EmbeddingError, EmbeddingProgressEvent, EmbeddingProvider, EmbeddingRequester,
        EmbeddingResult, RetryPolicy, SearchService,
    },
    use_cases::SearchError,
};
use job_similarity::domain::{
    aggregates::JobCatalog,
    base::Entity,
    entities::{JobPayload, JobRecord, SearchHit},
    query_filter::{CategorySelection, QueryFilter},
    value_objects::{CategoryField, EmbeddingVector, JobId, Score},
};
use job_similarity::presentation::{Command, Notice, Reaction, SearchMode, Session};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DIMENSIONS: usize = 768;

/// Brute-force cosine index over the catalog's stored embeddings
struct InMemoryVectorIndex {
    points: Vec<(JobId, EmbeddingVector, JobPayload)>,
    calls: Mutex<Vec<(QueryFilter, u64, usize)>>,
}

impl InMemoryVectorIndex {
    fn from_catalog(catalog: &JobCatalog) -> Self {
        Self {
            points: catalog
                .records()
                .iter()
                .filter_map(|r| {
                    r.embedding()
                        .map(|e| (r.id().clone(), e.clone(), r.payload().clone()))
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn search(
        &self,
        query: &EmbeddingVector,
        filter: &QueryFilter,
        limit: u64,
    ) -> IndexResult<Vec<SearchHit>> {
        self.calls
            .lock()
            .unwrap()
            .push((filter.clone(), limit, query.dimension_count()));

        let mut hits: Vec<SearchHit> = self
            .points
            .iter()
            .filter(|(_, _, payload)| filter.matches(payload))
            .map(|(id, vector, payload)| {
                let score = query.cosine_similarity(vector).unwrap();
                SearchHit::new(id.clone(), Score::new(score), payload.clone())
            })
            .collect();
        hits.sort_by(|a, b| b.score().value().total_cmp(&a.score().value()));
        hits.truncate(limit as usize);
        Ok(hits)
    }
}

/// Fails with a transient error for the first `failures` calls
struct FlakyProvider {
    failures: u32,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl EmbeddingProvider for FlakyProvider {
    async fn embed(&self, _text: &str) -> EmbeddingResult<EmbeddingVector> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(EmbeddingError::Transient("429 Too Many Requests".to_string()));
        }
        Ok(EmbeddingVector::new(direction(0, 0.0)).unwrap())
    }
}

fn direction(axis: usize, tilt: f32) -> Vec<f32> {
    let mut v = vec![0.0; DIMENSIONS];
    v[axis] = 1.0;
    v[DIMENSIONS - 1] = tilt;
    v
}

fn job(id: u64, title: &str, sector: &str, sub_sector: &str, role: &str, tilt: f32) -> JobRecord {
    JobRecord::new(
        JobId::from(id),
        JobPayload {
            job_title: Some(title.to_string()),
            job_description: Some(format!("{} duties", title)),
            sector: Some(sector.to_string()),
            sub_sector: Some(sub_sector.to_string()),
            occupation_role: Some(role.to_string()),
        },
    )
    .with_embedding(EmbeddingVector::new(direction(0, tilt)).unwrap())
}

fn create_job_catalog() -> JobCatalog {
    JobCatalog::new(vec![
        job(101, "Electrician", "Construction", "Electrical", "Electrician", 0.0),
        job(102, "Wiring Technician", "Construction", "Electrical", "Technician", 0.1),
        job(103, "Auto Electrician", "Automotive", "Repair", "Electrician", 0.2),
        job(104, "Workshop Manager", "Automotive", "Repair", "Manager", 0.3),
        job(105, "Store Electrician", "Retail", "Maintenance", "Electrician", 0.4),
        job(106, "Site Supervisor", "Construction", "Civil", "Supervisor", 0.5),
    ])
    .unwrap()
}

type TestService = SearchService<FlakyProvider, InMemoryVectorIndex, JobCatalog>;

fn create_service(failures: u32, max_attempts: u32) -> (TestService, Arc<AtomicU32>) {
    let catalog = create_job_catalog();
    let index = InMemoryVectorIndex::from_catalog(&catalog);
    let calls = Arc::new(AtomicU32::new(0));
    let provider = FlakyProvider {
        failures,
        calls: Arc::clone(&calls),
    };
    let requester =
        EmbeddingRequester::new(provider, RetryPolicy::new(max_attempts, Duration::ZERO));
    (SearchService::from_parts(requester, index, catalog), calls)
}

fn ids(hits: &[SearchHit]) -> Vec<&str> {
    hits.iter().map(|h| h.id().as_str()).collect()
}

#[tokio::test]
async fn test_unfiltered_text_search_returns_top_three() {
    let (service, _) = create_service(0, 5);

    let request = TextSearchRequest::new("electrician repairs wiring").with_top_k(3);
    let hits = service.search_by_text(&request).await.unwrap();

    assert!(hits.len() <= 3);
    assert_eq!(ids(&hits), vec!["101", "102", "103"]);
    assert!(hits
        .windows(2)
        .all(|pair| pair[0].score().value() >= pair[1].score().value()));
}

#[tokio::test]
async fn test_text_search_sends_vector_filter_and_limit() {
    let (service, _) = create_service(0, 5);
    let catalog = create_job_catalog();
    let index = InMemoryVectorIndex::from_catalog(&catalog);
    let requester = EmbeddingRequester::new(
        FlakyProvider {
            failures: 0,
            calls: Arc::new(AtomicU32::new(0)),
        },
        RetryPolicy::new(1, Duration::ZERO),
    );
    let direct = job_similarity::application::SearchByText::new(&requester, &index);

    let request = TextSearchRequest::new("electrician")
        .with_top_k(3)
        .with_include(CategorySelection::default().with(CategoryField::OccupationRole, "Electrician"))
        .with_exclude_sector(Some("Retail".to_string()));
    let hits = direct.execute(&request).await.unwrap();
    assert_eq!(ids(&hits), vec!["101", "103"]);

    let calls = index.calls.lock().unwrap();
    let (filter, limit, dimensions) = &calls[0];
    assert_eq!(*limit, 3);
    assert_eq!(*dimensions, DIMENSIONS);
    assert_eq!(filter.must().len(), 1);
    assert_eq!(filter.must_not().len(), 1);

    // The service facade gives the same answer
    let via_service = service.search_by_text(&request).await.unwrap();
    assert_eq!(ids(&via_service), vec!["101", "103"]);
}

#[tokio::test]
async fn test_retry_succeeds_below_the_attempt_bound() {
    let (service, calls) = create_service(4, 5);

    let hits = service
        .search_by_text(&TextSearchRequest::new("electrician"))
        .await
        .unwrap();

    assert!(!hits.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_retry_gives_up_after_exactly_max_attempts() {
    let (service, calls) = create_service(5, 5);

    let result = service
        .search_by_text(&TextSearchRequest::new("electrician"))
        .await;

    assert!(matches!(
        result,
        Err(SearchError::Embedding(EmbeddingError::Exhausted { attempts: 5, .. }))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_progress_events_report_each_failed_attempt() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let requester = EmbeddingRequester::new(
        FlakyProvider {
            failures: 10,
            calls: Arc::new(AtomicU32::new(0)),
        },
        RetryPolicy::new(3, Duration::ZERO),
    )
    .with_progress_callback(Arc::new(move |event: EmbeddingProgressEvent| {
        sink.lock().unwrap().push(event)
    }));

    assert!(requester.embed_text("electrician").await.is_err());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert!(matches!(
        events[0],
        EmbeddingProgressEvent::AttemptFailed { attempt: 1, .. }
    ));
    assert!(matches!(
        events[1],
        EmbeddingProgressEvent::AttemptFailed { attempt: 2, .. }
    ));
    assert!(matches!(
        events[2],
        EmbeddingProgressEvent::Failed { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn test_example_search_excluding_own_sector() {
    let (service, _) = create_service(0, 5);

    let request = ExampleSearchRequest::new(JobId::from(101))
        .with_top_k(5)
        .with_exclude(CategorySelection::default().with(CategoryField::Sector, "Construction"));
    let hits = service.search_by_example(&request).await.unwrap();

    assert!(hits
        .iter()
        .all(|h| h.payload().sector.as_deref() != Some("Construction")));
    assert!(hits.iter().all(|h| h.id() != &JobId::from(101)));
    assert_eq!(ids(&hits), vec!["103", "104", "105"]);
}

#[tokio::test]
async fn test_example_search_does_not_need_embedding_provider() {
    // A provider that always fails must not affect by-example search
    let (service, calls) = create_service(u32::MAX, 2);

    let hits = service
        .search_by_example(&ExampleSearchRequest::new(JobId::from(104)).with_top_k(2))
        .await
        .unwrap();

    assert_eq!(ids(&hits), vec!["105", "103"]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_session_reruns_example_search_on_filter_change() {
    let (service, _) = create_service(0, 5);
    let catalog = service.repository();
    let mut session = Session::new(catalog).unwrap();

    for line in ["mode example", "job 101", "top-k 3"] {
        let command = Command::parse(line).unwrap().unwrap();
        assert_eq!(session.apply(command, catalog).unwrap(), Reaction::Updated);
    }
    assert_eq!(session.mode(), SearchMode::Example);

    let search = Command::parse("search").unwrap().unwrap();
    assert_eq!(session.apply(search, catalog).unwrap(), Reaction::Search);
    let report = session.run_search(&service).await;
    assert_eq!(ids(report.hits()), vec!["102", "103", "104"]);

    let exclude = Command::parse("exclude sector Automotive").unwrap().unwrap();
    assert_eq!(session.apply(exclude, catalog).unwrap(), Reaction::Search);
    let report = session.run_search(&service).await;
    assert_eq!(ids(report.hits()), vec!["102"]);

    let include = Command::parse("include role Manager").unwrap().unwrap();
    assert_eq!(session.apply(include, catalog).unwrap(), Reaction::Search);
    let report = session.run_search(&service).await;
    assert_eq!(report.notice(), Some(&Notice::NoMatches));
}

#[tokio::test]
async fn test_exclusion_matches_padded_stored_values() {
    let catalog = JobCatalog::new(vec![
        job(201, "Cashier", "Retail ", "Stores", "Cashier", 0.0),
        job(202, "Store Clerk", "Retail ", "Stores", "Clerk", 0.1),
        job(203, "Mechanic", "Automotive", "Repair", "Technician", 0.2),
        job(204, "Parts Seller", "Retail ", "Parts", "Clerk", 0.3),
    ])
    .unwrap();
    let index = InMemoryVectorIndex::from_catalog(&catalog);
    let requester = EmbeddingRequester::new(
        FlakyProvider {
            failures: 0,
            calls: Arc::new(AtomicU32::new(0)),
        },
        RetryPolicy::new(1, Duration::ZERO),
    );
    let service = SearchService::from_parts(requester, index, catalog);
    let catalog = service.repository();
    let mut session = Session::new(catalog).unwrap();

    for line in ["mode example", "job 201", "exclude sector Retail"] {
        let command = Command::parse(line).unwrap().unwrap();
        session.apply(command, catalog).unwrap();
    }
    assert_eq!(session.exclude().sector.as_deref(), Some("Retail "));

    let search = Command::parse("search").unwrap().unwrap();
    assert_eq!(session.apply(search, catalog).unwrap(), Reaction::Search);
    let report = session.run_search(&service).await;
    assert_eq!(ids(report.hits()), vec!["203"]);
}

#[tokio::test]
async fn test_session_reports_embedding_failure_as_warning() {
    let (service, _) = create_service(u32::MAX, 2);
    let catalog = service.repository();
    let mut session = Session::new(catalog).unwrap();

    let search = Command::parse("search").unwrap().unwrap();
    assert_eq!(session.apply(search, catalog).unwrap(), Reaction::Search);
    let report = session.run_search(&service).await;

    assert!(report.hits().is_empty());
    assert!(matches!(report.notice(), Some(Notice::Warning(m)) if m.contains("after 2 attempts")));
}
