/// Interactive session state and command handling
use std::fmt::Write;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::application::dto::{
    ExampleSearchRequest, TextSearchRequest, DEFAULT_TOP_K, EXAMPLE_TOP_K_RANGE, TEXT_TOP_K_RANGE,
};
use crate::application::repositories::{JobRepository, VectorIndex};
use crate::application::services::{EmbeddingProvider, SearchService};
use crate::application::use_cases::SearchError;
use crate::domain::base::{DomainError, Entity};
use crate::domain::entities::JobRecord;
use crate::domain::query_filter::{parse_choice, CategorySelection};
use crate::domain::value_objects::{CategoryField, JobId};
use crate::presentation::renderer::SearchReport;

/// Query text offered before the user types anything
pub const DEFAULT_QUERY: &str = "Manage a vehicle repair center and interact with customers";

pub const HELP: &str = "\
Commands:
  mode text|example              choose free-text or by-example search
  query <text>                   set the query text (text mode)
  job <id>                       choose the input job (example mode)
  top-k <n>                      number of results (1-10 text, 1-20 example)
  include <field> <value|None>   require a sector, sub-sector or role
  exclude <field> <value|None>   reject a sector (text mode: sector only)
  search                         run the search
  expand <n>                     show details of result n
  options [field]                list filter values
  jobs                           list selectable jobs
  show                           show the current settings
  help                           show this help
  quit                           leave the session";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown command '{0}'. Type 'help' for the list of commands.")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    InvalidValue(String),

    #[error("Repository error: {0}")]
    Repository(#[from] DomainError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Which search flow the session drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Text,
    Example,
}

impl SearchMode {
    pub fn parse(raw: &str) -> SessionResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(SearchMode::Text),
            "example" | "job" => Ok(SearchMode::Example),
            other => Err(SessionError::InvalidValue(format!(
                "Unknown mode '{}' (expected text or example)",
                other
            ))),
        }
    }

    pub fn top_k_range(&self) -> RangeInclusive<u64> {
        match self {
            SearchMode::Text => TEXT_TOP_K_RANGE,
            SearchMode::Example => EXAMPLE_TOP_K_RANGE,
        }
    }
}

/// A parsed prompt line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mode(SearchMode),
    Query(String),
    Job(String),
    TopK(u64),
    Include(CategoryField, String),
    Exclude(CategoryField, String),
    Search,
    Expand(usize),
    Options(Option<CategoryField>),
    Jobs,
    Show,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> SessionResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "mode" => Command::Mode(SearchMode::parse(required(rest, "mode text|example")?)?),
            "query" => Command::Query(required(rest, "query <text>")?.to_string()),
            "job" => Command::Job(required(rest, "job <id>")?.to_string()),
            "top-k" | "topk" | "k" => {
                let raw = required(rest, "top-k <n>")?;
                Command::TopK(raw.parse().map_err(|_| {
                    SessionError::InvalidValue(format!("'{}' is not a number", raw))
                })?)
            }
            "include" => {
                let (field, value) = field_and_value(rest, "include <field> <value|None>")?;
                Command::Include(field, value)
            }
            "exclude" => {
                let (field, value) = field_and_value(rest, "exclude <field> <value|None>")?;
                Command::Exclude(field, value)
            }
            "search" | "s" => Command::Search,
            "expand" => {
                let raw = required(rest, "expand <n>")?;
                Command::Expand(raw.parse().map_err(|_| {
                    SessionError::InvalidValue(format!("'{}' is not a result number", raw))
                })?)
            }
            "options" => {
                if rest.is_empty() {
                    Command::Options(None)
                } else {
                    Command::Options(Some(CategoryField::parse(rest)?))
                }
            }
            "jobs" => Command::Jobs,
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(SessionError::UnknownCommand(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn required<'a>(rest: &'a str, usage: &'static str) -> SessionResult<&'a str> {
    if rest.is_empty() {
        Err(SessionError::Usage(usage))
    } else {
        Ok(rest)
    }
}

fn field_and_value(rest: &str, usage: &'static str) -> SessionResult<(CategoryField, String)> {
    let (field, value) = rest
        .split_once(char::is_whitespace)
        .ok_or(SessionError::Usage(usage))?;
    Ok((CategoryField::parse(field)?, value.trim().to_string()))
}

/// What the caller should do after a command has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// State changed; nothing to run
    Updated,
    Search,
    Expand(usize),
    Options(Option<CategoryField>),
    Jobs,
    Show,
    Help,
    Quit,
}

/// Check a selector value against the option list of its field
///
/// Sentinels and blank input clear the selection.
pub fn validate_choice<R: JobRepository>(
    repository: &R,
    field: CategoryField,
    raw: &str,
) -> SessionResult<Option<String>> {
    let value = match parse_choice(raw) {
        Some(value) => value,
        None => return Ok(None),
    };

    // Resolve to the stored spelling so filters compare equal to the index payloads
    let options = repository.category_options(field)?;
    let stored = options
        .iter()
        .find(|option| option.as_str() == raw || option.as_str() == value)
        .or_else(|| options.iter().find(|option| option.trim() == value));
    if let Some(option) = stored {
        Ok(Some(option.clone()))
    } else {
        Err(SessionError::InvalidValue(format!(
            "'{}' is not a known {} value. Valid options: None, {}",
            value,
            field.label(),
            options.join(", ")
        )))
    }
}

/// Request-scoped state of one interactive user
#[derive(Debug, Clone)]
pub struct Session {
    mode: SearchMode,
    query: String,
    job: Option<JobId>,
    top_k: u64,
    include: CategorySelection,
    exclude: CategorySelection,
    /// Set once a by-example search has run; later changes re-run it
    search_triggered: bool,
    last_report: Option<SearchReport>,
}

impl Session {
    /// Start in text mode, with the first dataset record preselected as input job
    pub fn new<R: JobRepository>(repository: &R) -> SessionResult<Self> {
        let job = repository.find_all()?.first().map(|r| r.id().clone());
        Ok(Session {
            mode: SearchMode::Text,
            query: DEFAULT_QUERY.to_string(),
            job,
            top_k: DEFAULT_TOP_K,
            include: CategorySelection::default(),
            exclude: CategorySelection::default(),
            search_triggered: false,
            last_report: None,
        })
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn job(&self) -> Option<&JobId> {
        self.job.as_ref()
    }

    pub fn top_k(&self) -> u64 {
        self.top_k
    }

    pub fn include(&self) -> &CategorySelection {
        &self.include
    }

    pub fn exclude(&self) -> &CategorySelection {
        &self.exclude
    }

    pub fn search_triggered(&self) -> bool {
        self.search_triggered
    }

    pub fn last_report(&self) -> Option<&SearchReport> {
        self.last_report.as_ref()
    }

    /// Apply a command, validating values against the dataset
    ///
    /// On error the session is left unchanged.
    pub fn apply<R: JobRepository>(
        &mut self,
        command: Command,
        repository: &R,
    ) -> SessionResult<Reaction> {
        match command {
            Command::Mode(mode) => {
                if mode != self.mode {
                    self.mode = mode;
                    self.search_triggered = false;
                    self.last_report = None;
                    if mode == SearchMode::Text {
                        // Text search only honours a sector exclusion
                        self.exclude.sub_sector = None;
                        self.exclude.occupation_role = None;
                    }
                    let range = mode.top_k_range();
                    self.top_k = self.top_k.clamp(*range.start(), *range.end());
                }
                Ok(Reaction::Updated)
            }
            Command::Query(query) => {
                self.query = query;
                Ok(Reaction::Updated)
            }
            Command::Job(raw) => {
                let id = JobId::new(raw)?;
                if repository.find_by_id(&id)?.is_none() {
                    return Err(SessionError::InvalidValue(format!(
                        "No job with id {} in the dataset",
                        id
                    )));
                }
                self.job = Some(id);
                Ok(self.after_change())
            }
            Command::TopK(top_k) => {
                let range = self.mode.top_k_range();
                if !range.contains(&top_k) {
                    return Err(SessionError::InvalidValue(format!(
                        "Number of results must be between {} and {}",
                        range.start(),
                        range.end()
                    )));
                }
                self.top_k = top_k;
                Ok(self.after_change())
            }
            Command::Include(field, raw) => {
                let value = validate_choice(repository, field, &raw)?;
                self.include.set(field, value);
                Ok(self.after_change())
            }
            Command::Exclude(field, raw) => {
                if self.mode == SearchMode::Text && field != CategoryField::Sector {
                    return Err(SessionError::InvalidValue(
                        "Text search can only exclude a sector".to_string(),
                    ));
                }
                let value = validate_choice(repository, field, &raw)?;
                self.exclude.set(field, value);
                Ok(self.after_change())
            }
            Command::Search => {
                if self.mode == SearchMode::Example {
                    self.search_triggered = true;
                }
                Ok(Reaction::Search)
            }
            Command::Expand(rank) => Ok(Reaction::Expand(rank)),
            Command::Options(field) => Ok(Reaction::Options(field)),
            Command::Jobs => Ok(Reaction::Jobs),
            Command::Show => Ok(Reaction::Show),
            Command::Help => Ok(Reaction::Help),
            Command::Quit => Ok(Reaction::Quit),
        }
    }

    fn after_change(&self) -> Reaction {
        if self.mode == SearchMode::Example && self.search_triggered {
            Reaction::Search
        } else {
            Reaction::Updated
        }
    }

    pub fn text_request(&self) -> TextSearchRequest {
        TextSearchRequest::new(self.query.clone())
            .with_top_k(self.top_k)
            .with_include(self.include.clone())
            .with_exclude_sector(self.exclude.sector.clone())
    }

    pub fn example_request(&self) -> Result<ExampleSearchRequest, SearchError> {
        let job_id = self
            .job
            .clone()
            .ok_or_else(|| SearchError::InvalidRequest("No input job selected".to_string()))?;
        Ok(ExampleSearchRequest::new(job_id)
            .with_top_k(self.top_k)
            .with_include(self.include.clone())
            .with_exclude(self.exclude.clone()))
    }

    /// The selected input job, for example mode
    pub fn input_job<'r, R: JobRepository>(&self, repository: &'r R) -> Option<&'r JobRecord> {
        let id = self.job.as_ref()?;
        repository.find_by_id(id).ok().flatten()
    }

    /// Run the search for the current mode and keep the report for `expand`
    pub async fn run_search<P, V, R>(&mut self, service: &SearchService<P, V, R>) -> &SearchReport
    where
        P: EmbeddingProvider,
        V: VectorIndex,
        R: JobRepository,
    {
        let result = match self.mode {
            SearchMode::Text => service.search_by_text(&self.text_request()).await,
            SearchMode::Example => match self.example_request() {
                Ok(request) => service.search_by_example(&request).await,
                Err(error) => Err(error),
            },
        };
        self.last_report.insert(SearchReport::from_result(result))
    }

    /// Current settings, one per line
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let mode = match self.mode {
            SearchMode::Text => "text",
            SearchMode::Example => "example",
        };
        let _ = writeln!(out, "Mode: {}", mode);
        match self.mode {
            SearchMode::Text => {
                let _ = writeln!(out, "Query: {}", self.query);
            }
            SearchMode::Example => {
                let job = self.job.as_ref().map(JobId::as_str).unwrap_or("None");
                let _ = writeln!(out, "Job: {}", job);
            }
        }
        let _ = writeln!(out, "Results: {}", self.top_k);
        let _ = writeln!(out, "Include: {}", describe_selection(&self.include));
        let _ = writeln!(out, "Exclude: {}", describe_selection(&self.exclude));
        out
    }
}

fn describe_selection(selection: &CategorySelection) -> String {
    CategoryField::ALL
        .iter()
        .map(|field| format!("{}={}", field.label(), selection.get(*field).unwrap_or("None")))
        .collect::<Vec<_>>()
        .join(", ")
}
