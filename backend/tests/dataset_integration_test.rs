/// Integration tests for loading the exported job dataset from disk
use job_similarity::application::repositories::JobRepository;
use job_similarity::domain::{
    base::Entity,
    value_objects::{CategoryField, JobId},
};
use job_similarity::infrastructure::parsers::DatasetError;
use job_similarity::infrastructure::persistence::JsonJobRepository;
use job_similarity::presentation::{render_job_list, render_options, validate_choice};
use std::fs;
use tempfile::TempDir;

fn write_dataset(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const EXPORTED_DATASET: &str = r#"[
    {"id": 3, "job_title": "Service Advisor", "job_description": "Greets customers and schedules repairs",
     "sector": "Automotive", "sub_sector": "Repair", "occupation_role": "Advisor",
     "embedding": "[0.12, -0.5, 0.33]"},
    {"id": 1, "job_title": "Electrician", "job_description": null,
     "sector": "Construction", "sub_sector": "Electrical", "occupation_role": "Electrician",
     "embedding": [0.9, 0.1, 0.0]},
    {"id": 2, "job_title": "Cashier",
     "sector": "Retail", "sub_sector": "", "occupation_role": null},
    {"id": 4, "job_title": "Mechanic",
     "sector": "Automotive", "sub_sector": "Repair", "occupation_role": "Technician",
     "embedding": [0.2, 0.2, 0.2]}
]"#;

#[tokio::test]
async fn test_load_exported_dataset() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, "JD_without_title_embeddings.json", EXPORTED_DATASET);

    let repository = JsonJobRepository::load(&path).await.unwrap();
    let records = repository.find_all().unwrap();

    // File order is kept for the job list
    let ids: Vec<_> = records.iter().map(|r| r.id().as_str()).collect();
    assert_eq!(ids, vec!["3", "1", "2", "4"]);

    let advisor = repository.find_by_id(&JobId::from(3)).unwrap().unwrap();
    assert_eq!(advisor.embedding().unwrap().dimension_count(), 3);

    let cashier = repository.find_by_id(&JobId::from(2)).unwrap().unwrap();
    assert!(cashier.embedding().is_none());
    assert_eq!(cashier.display_label(), "2 - Cashier (N/A)");
}

#[tokio::test]
async fn test_dropdown_options_are_sorted_and_distinct() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, "jobs.json", EXPORTED_DATASET);
    let repository = JsonJobRepository::load(&path).await.unwrap();

    assert_eq!(
        repository.category_options(CategoryField::Sector).unwrap(),
        ["Automotive", "Construction", "Retail"]
    );
    // Blank and null values are not offered
    assert_eq!(
        repository.category_options(CategoryField::SubSector).unwrap(),
        ["Electrical", "Repair"]
    );
    assert_eq!(
        repository.category_options(CategoryField::OccupationRole).unwrap(),
        ["Advisor", "Electrician", "Technician"]
    );

    let rendered = render_options(
        CategoryField::SubSector,
        repository.category_options(CategoryField::SubSector).unwrap(),
    );
    assert_eq!(rendered, "Sub-sector:\n  None\n  Electrical\n  Repair\n");
}

#[tokio::test]
async fn test_job_list_labels() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, "jobs.json", EXPORTED_DATASET);
    let repository = JsonJobRepository::load(&path).await.unwrap();

    let listing = render_job_list(repository.find_all().unwrap());
    assert!(listing.starts_with("3 - Service Advisor (Advisor)\n1 - Electrician (Electrician)\n"));
    assert_eq!(listing.lines().count(), 4);
}

#[tokio::test]
async fn test_load_json_lines_dataset() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(
        &dir,
        "jobs.jsonl",
        "{\"id\": 10, \"job_title\": \"Welder\", \"embedding\": [1.0, 0.0]}\n\
         {\"id\": \"11\", \"job_title\": \"Painter\"}\n",
    );

    let repository = JsonJobRepository::load(&path).await.unwrap();
    assert_eq!(repository.catalog().len(), 2);
    assert!(repository.find_by_id(&JobId::from(11)).unwrap().is_some());
}

#[tokio::test]
async fn test_truncated_dataset_is_rejected() {
    let dir = TempDir::new().unwrap();
    let truncated = write_dataset(&dir, "truncated.json", r#"[{"id": 1}, {"id": "#);
    assert!(matches!(
        JsonJobRepository::load(&truncated).await,
        Err(DatasetError::MalformedFile(_))
    ));
}

#[tokio::test]
async fn test_schema_violations_skip_only_the_offending_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(
        &dir,
        "jobs.json",
        r#"[
            {"id": 1, "job_title": "Mechanic", "sector": "Automotive", "embedding": [0.1, 0.2]},
            {"job_title": "Orphan", "sector": "Retail"},
            {"id": "1", "job_title": "Duplicate", "sector": "Retail"},
            {"id": 2, "job_title": "Cashier", "sector": "Retail ", "embedding": "[0.3,"}
        ]"#,
    );

    let repository = JsonJobRepository::load(&path).await.unwrap();

    let listing = render_job_list(repository.find_all().unwrap());
    assert_eq!(listing, "1 - Mechanic (N/A)\n2 - Cashier (N/A)\n");
    assert!(repository.find_by_id(&JobId::from(1)).unwrap().unwrap().embedding().is_some());
    assert!(repository.find_by_id(&JobId::from(2)).unwrap().unwrap().embedding().is_none());

    // Values are offered exactly as stored
    assert_eq!(
        repository.category_options(CategoryField::Sector).unwrap(),
        ["Automotive", "Retail "]
    );
    assert_eq!(
        validate_choice(&repository, CategoryField::Sector, "Retail").unwrap(),
        Some("Retail ".to_string())
    );
}
