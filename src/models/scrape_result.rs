use chrono::{DateTime, Utc};

use crate::error::PageFailure;
use crate::models::record::JobRecord;
use crate::models::source::SourceName;

/// What happened to one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Succeeded {
        records: usize,
        /// Items dropped individually under the skip-item policy.
        skipped_items: usize,
    },
    Failed(PageFailure),
}

impl PageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PageOutcome::Succeeded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub page: u32,
    pub url: String,
    pub outcome: PageOutcome,
}

/// Records collected for one source plus the per-page outcome log.
///
/// Records are in page order, then document order within a page.
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    source: SourceName,
    records: Vec<JobRecord>,
    pages: Vec<PageReport>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl ScrapeResult {
    pub(crate) fn from_parts(
        source: SourceName,
        records: Vec<JobRecord>,
        pages: Vec<PageReport>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            records,
            pages,
            started_at,
            finished_at,
        }
    }

    pub fn source(&self) -> SourceName {
        self.source
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn pages(&self) -> &[PageReport] {
        &self.pages
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn succeeded_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.outcome.is_success()).count()
    }

    pub fn failed_pages(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|p| !p.outcome.is_success())
    }

    /// Pages that produced at least one record.
    pub fn contributing_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.outcome, PageOutcome::Succeeded { records, .. } if records > 0))
            .count()
    }

    /// Every attempted page failed, as opposed to the site listing nothing.
    pub fn is_fully_failed(&self) -> bool {
        !self.pages.is_empty() && self.succeeded_pages() == 0
    }

    pub fn into_records(self) -> Vec<JobRecord> {
        self.records
    }
}
