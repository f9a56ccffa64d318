/// Plain-text rendering of search results for the terminal
use std::fmt::{self, Write};

use crate::application::use_cases::{SearchError, SearchResult};
use crate::domain::entities::{JobPayload, JobRecord, SearchHit};
use crate::domain::query_filter::NO_CONSTRAINT_SENTINELS;
use crate::domain::value_objects::CategoryField;

/// How much of each hit to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStyle {
    /// Numbered header line only
    Collapsed,
    /// Header plus occupation, sector and description
    Expanded,
}

/// Render hits in rank order, numbered from 1
pub fn render_hits(hits: &[SearchHit], style: RenderStyle) -> String {
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&render_hit(i + 1, hit, style));
    }
    out
}

/// Render a single hit at its 1-based rank
pub fn render_hit(rank: usize, hit: &SearchHit, style: RenderStyle) -> String {
    let payload = hit.payload();
    let mut out = format!(
        "{}. {} (Score: {})\n",
        rank,
        payload.title_or_placeholder(),
        hit.score()
    );
    if style == RenderStyle::Expanded {
        push_details(&mut out, payload);
    }
    out
}

/// Render an input record with the same field layout as a hit
pub fn render_job(record: &JobRecord) -> String {
    let payload = record.payload();
    let mut out = format!("Title: {}\n", payload.title_or_placeholder());
    push_details(&mut out, payload);
    out
}

fn push_details(out: &mut String, payload: &JobPayload) {
    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "   Occupation: {}",
        payload.category_or_placeholder(CategoryField::OccupationRole)
    );
    let _ = writeln!(
        out,
        "   Sector: {} | Sub-sector: {}",
        payload.category_or_placeholder(CategoryField::Sector),
        payload.category_or_placeholder(CategoryField::SubSector)
    );
    let _ = writeln!(out, "   Description: {}", payload.description_or_placeholder());
}

/// Selector values for a field, led by the no-constraint sentinel
pub fn render_options(field: CategoryField, options: &[String]) -> String {
    let mut out = format!("{}:\n  {}\n", field.label(), NO_CONSTRAINT_SENTINELS[0]);
    for option in options {
        let _ = writeln!(out, "  {}", option);
    }
    out
}

/// One "<id> - <title> (<role>)" line per record
pub fn render_job_list(records: &[JobRecord]) -> String {
    records
        .iter()
        .map(|record| format!("{}\n", record.display_label()))
        .collect()
}

/// Message shown in place of, or next to, the result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoMatches,
    /// The query text could not be embedded
    Warning(String),
    Error(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoMatches => write!(f, "No matches found."),
            Notice::Warning(message) => write!(f, "Warning: {}", message),
            Notice::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Outcome of one search action, ready for display
#[derive(Debug, Clone)]
pub struct SearchReport {
    hits: Vec<SearchHit>,
    notice: Option<Notice>,
}

impl SearchReport {
    pub fn from_result(result: SearchResult<Vec<SearchHit>>) -> Self {
        match result {
            Ok(hits) if hits.is_empty() => SearchReport {
                hits,
                notice: Some(Notice::NoMatches),
            },
            Ok(hits) => SearchReport { hits, notice: None },
            Err(error @ SearchError::Embedding(_)) => SearchReport {
                hits: Vec::new(),
                notice: Some(Notice::Warning(error.to_string())),
            },
            Err(error) => SearchReport {
                hits: Vec::new(),
                notice: Some(Notice::Error(error.to_string())),
            },
        }
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.notice, Some(Notice::Warning(_)) | Some(Notice::Error(_)))
    }

    pub fn render(&self, style: RenderStyle) -> String {
        match &self.notice {
            Some(notice) => format!("{}\n", notice),
            None => render_hits(&self.hits, style),
        }
    }

    /// Full details of the hit at 1-based `rank`
    pub fn expand(&self, rank: usize) -> Option<String> {
        let hit = self.hits.get(rank.checked_sub(1)?)?;
        Some(render_hit(rank, hit, RenderStyle::Expanded))
    }
}
