use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use job_similarity::application::dto::{ExampleSearchRequest, TextSearchRequest, DEFAULT_TOP_K};
use job_similarity::application::repositories::JobRepository;
use job_similarity::application::services::{
    EmbeddingProgressCallback, EmbeddingProgressEvent, LiveSearchService, RetryPolicy,
    SearchServiceConfig,
};
use job_similarity::domain::query_filter::CategorySelection;
use job_similarity::domain::value_objects::{CategoryField, JobId};
use job_similarity::presentation::session::HELP;
use job_similarity::presentation::{
    render_job, render_job_list, render_options, validate_choice, Command, Reaction, RenderStyle,
    SearchMode, SearchReport, Session,
};

#[derive(Debug, Parser)]
#[command(
    name = "job-similarity",
    version,
    about = "Semantic similarity search over a job description corpus"
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Endpoints, credentials and dataset location; unset values use the built-in defaults
#[derive(Debug, Args)]
struct ConnectionArgs {
    /// Qdrant gRPC URL [default: http://localhost:6334]
    #[arg(long, env = "QDRANT_URL", global = true)]
    qdrant_url: Option<String>,

    /// Qdrant API key
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true, global = true)]
    qdrant_api_key: Option<String>,

    /// Collection holding the job vectors [default: JD_without_title]
    #[arg(long, env = "QDRANT_COLLECTION", global = true)]
    collection: Option<String>,

    /// Gemini API key used to embed query text
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    gemini_api_key: Option<String>,

    /// Embedding model [default: models/text-embedding-004]
    #[arg(long, env = "EMBEDDING_MODEL", global = true)]
    embedding_model: Option<String>,

    /// Attempts per embedding request [default: 5]
    #[arg(long, env = "EMBEDDING_MAX_RETRIES", global = true)]
    max_retries: Option<u32>,

    /// Seconds between embedding attempts [default: 5]
    #[arg(long, env = "EMBEDDING_RETRY_DELAY_SECS", global = true)]
    retry_delay_secs: Option<u64>,

    /// Dataset with the stored embeddings [default: JD_without_title_embeddings.json]
    #[arg(long, env = "JOB_DATASET", global = true)]
    dataset: Option<PathBuf>,
}

impl ConnectionArgs {
    fn into_config(self) -> SearchServiceConfig {
        let mut config = SearchServiceConfig::default();
        if let Some(url) = self.qdrant_url {
            config.qdrant_url = url;
        }
        config.qdrant_api_key = self.qdrant_api_key.filter(|key| !key.is_empty());
        if let Some(collection) = self.collection {
            config.collection_name = collection;
        }
        config.embedding.api_key = self.gemini_api_key;
        if let Some(model) = self.embedding_model {
            config.embedding.model = model;
        }
        config.retry = RetryPolicy::new(
            self.max_retries.unwrap_or(config.retry.max_attempts),
            self.retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(config.retry.delay),
        );
        if let Some(dataset) = self.dataset {
            config.dataset_path = dataset;
        }
        config
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Find jobs similar to a free-text description
    SearchText {
        /// Job-related query text
        query: String,

        /// Number of results
        #[arg(long, default_value_t = DEFAULT_TOP_K, value_parser = clap::value_parser!(u64).range(1..=10))]
        top_k: u64,

        #[command(flatten)]
        include: IncludeArgs,

        /// Reject results from this sector
        #[arg(long)]
        exclude_sector: Option<String>,
    },

    /// Find jobs similar to a job from the dataset
    SearchExample {
        /// Id of the input job
        job_id: String,

        /// Number of results
        #[arg(long, default_value_t = DEFAULT_TOP_K, value_parser = clap::value_parser!(u64).range(1..=20))]
        top_k: u64,

        #[command(flatten)]
        include: IncludeArgs,

        #[command(flatten)]
        exclude: ExcludeArgs,
    },

    /// List the filter values of one or all categorical fields
    Options {
        /// sector, sub-sector or occupation-role
        field: Option<String>,
    },

    /// List the selectable input jobs
    Jobs,

    /// Start an interactive search session
    Interactive,
}

#[derive(Debug, Args)]
struct IncludeArgs {
    /// Only return jobs from this sector
    #[arg(long)]
    include_sector: Option<String>,

    /// Only return jobs from this sub-sector
    #[arg(long)]
    include_sub_sector: Option<String>,

    /// Only return jobs with this occupation role
    #[arg(long)]
    include_occupation_role: Option<String>,
}

#[derive(Debug, Args)]
struct ExcludeArgs {
    /// Reject jobs from this sector
    #[arg(long)]
    exclude_sector: Option<String>,

    /// Reject jobs from this sub-sector
    #[arg(long)]
    exclude_sub_sector: Option<String>,

    /// Reject jobs with this occupation role
    #[arg(long)]
    exclude_occupation_role: Option<String>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("job_similarity=info,warn"));
    // stdout is reserved for rendered results
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Surface retry progress to the user while a query is being embedded
fn progress_reporter() -> EmbeddingProgressCallback {
    Arc::new(|event: EmbeddingProgressEvent| match event {
        EmbeddingProgressEvent::AttemptFailed {
            attempt, retry_in, ..
        } => eprintln!(
            "Attempt {} failed. Retrying in {} seconds...",
            attempt,
            retry_in.as_secs()
        ),
        EmbeddingProgressEvent::Failed { attempts, error } => {
            eprintln!("Giving up after {} attempts: {}", attempts, error)
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = cli.connection.into_config();
    info!("Using dataset {}", config.dataset_path.display());

    let service = LiveSearchService::connect(config, Some(progress_reporter()))
        .await
        .context("Failed to start search service")?;

    match cli.command {
        Commands::SearchText {
            query,
            top_k,
            include,
            exclude_sector,
        } => {
            let repository = service.repository();
            let request = TextSearchRequest::new(query)
                .with_top_k(top_k)
                .with_include(include.selection(repository)?)
                .with_exclude_sector(validate_choice(
                    repository,
                    CategoryField::Sector,
                    exclude_sector.as_deref().unwrap_or_default(),
                )?);

            let report = SearchReport::from_result(service.search_by_text(&request).await);
            print!("{}", report.render(RenderStyle::Expanded));
        }
        Commands::SearchExample {
            job_id,
            top_k,
            include,
            exclude,
        } => {
            let repository = service.repository();
            let job_id = JobId::new(job_id)?;
            let request = ExampleSearchRequest::new(job_id.clone())
                .with_top_k(top_k)
                .with_include(include.selection(repository)?)
                .with_exclude(exclude.selection(repository)?);

            if let Some(record) = repository.find_by_id(&job_id)? {
                println!("Input job:\n{}", render_job(record));
            }
            let report = SearchReport::from_result(service.search_by_example(&request).await);
            println!("Matched jobs:");
            print!("{}", report.render(RenderStyle::Expanded));
        }
        Commands::Options { field } => {
            let field = field.as_deref().map(CategoryField::parse).transpose()?;
            print_options(service.repository(), field)?;
        }
        Commands::Jobs => {
            print!("{}", render_job_list(service.repository().find_all()?));
        }
        Commands::Interactive => run_interactive(&service).await?,
    }

    Ok(())
}

impl IncludeArgs {
    fn selection<R: JobRepository>(&self, repository: &R) -> Result<CategorySelection> {
        build_selection(
            repository,
            [
                (CategoryField::Sector, &self.include_sector),
                (CategoryField::SubSector, &self.include_sub_sector),
                (CategoryField::OccupationRole, &self.include_occupation_role),
            ],
        )
    }
}

impl ExcludeArgs {
    fn selection<R: JobRepository>(&self, repository: &R) -> Result<CategorySelection> {
        build_selection(
            repository,
            [
                (CategoryField::Sector, &self.exclude_sector),
                (CategoryField::SubSector, &self.exclude_sub_sector),
                (CategoryField::OccupationRole, &self.exclude_occupation_role),
            ],
        )
    }
}

fn build_selection<R: JobRepository>(
    repository: &R,
    values: [(CategoryField, &Option<String>); 3],
) -> Result<CategorySelection> {
    let mut selection = CategorySelection::default();
    for (field, raw) in values {
        if let Some(raw) = raw {
            selection.set(field, validate_choice(repository, field, raw)?);
        }
    }
    Ok(selection)
}

fn print_options<R: JobRepository>(repository: &R, field: Option<CategoryField>) -> Result<()> {
    let fields = match field {
        Some(field) => vec![field],
        None => CategoryField::ALL.to_vec(),
    };
    for field in fields {
        print!("{}", render_options(field, repository.category_options(field)?));
    }
    Ok(())
}

async fn run_interactive(service: &LiveSearchService) -> Result<()> {
    let repository = service.repository();
    let mut session = Session::new(repository)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        // Failures are reported and scoped to the command that caused them
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        let reaction = match session.apply(command, repository) {
            Ok(reaction) => reaction,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match reaction {
            Reaction::Updated => {}
            Reaction::Search => {
                if session.mode() == SearchMode::Example {
                    if let Some(record) = session.input_job(repository) {
                        println!("Input job:\n{}", render_job(record));
                    }
                }
                let mode = session.mode();
                let report = session.run_search(service).await;
                match mode {
                    SearchMode::Text => print!("{}", report.render(RenderStyle::Expanded)),
                    SearchMode::Example => {
                        print!("{}", report.render(RenderStyle::Collapsed));
                        if !report.hits().is_empty() {
                            println!("Type 'expand <n>' for details.");
                        }
                    }
                }
            }
            Reaction::Expand(rank) => match session.last_report().and_then(|r| r.expand(rank)) {
                Some(details) => print!("{}", details),
                None => println!("No result {} to expand", rank),
            },
            Reaction::Options(field) => {
                if let Err(e) = print_options(repository, field) {
                    println!("{:#}", e);
                }
            }
            Reaction::Jobs => match repository.find_all() {
                Ok(records) => print!("{}", render_job_list(records)),
                Err(e) => println!("{}", e),
            },
            Reaction::Show => print!("{}", session.describe()),
            Reaction::Help => println!("{}", HELP),
            Reaction::Quit => break,
        }
    }

    Ok(())
}
