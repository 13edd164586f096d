// Persistence for finished runs: a CSV snapshot per source and, when a
// database is configured, a Postgres table per source.

pub mod csv;
pub mod postgres;

use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::models::record::JobRecord;
use crate::models::source::{SearchTerms, SourceName};

/// Flat row shape shared by both sinks. The tech stack is a JSON array string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredJob {
    pub job_title: String,
    pub company_name: String,
    pub job_summary: String,
    pub job_link: String,
    pub job_tech_stack: String,
}

impl StoredJob {
    pub fn from_record(record: &JobRecord) -> Result<Self, SinkError> {
        Ok(Self {
            job_title: record.title.clone(),
            company_name: record.company.clone(),
            job_summary: record.summary.clone(),
            job_link: record.link.clone(),
            job_tech_stack: serde_json::to_string(&record.tech_stack)?,
        })
    }

    pub fn into_record(self) -> Result<JobRecord, SinkError> {
        let tech_stack = if self.job_tech_stack.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.job_tech_stack)?
        };
        Ok(JobRecord {
            title: self.job_title,
            company: self.company_name,
            summary: self.job_summary,
            link: self.job_link,
            tech_stack,
        })
    }
}

/// `python_developer_prf`: the table a source's records land in.
pub fn table_name(terms: &SearchTerms, source: SourceName) -> String {
    format!("{}_{}", terms.table_stem(), source.slug())
}

/// `prf_python_developer_job_data.csv`: the snapshot file of a source.
pub fn snapshot_file_name(terms: &SearchTerms, source: SourceName) -> String {
    format!("{}_{}_job_data.csv", source.slug(), terms.table_stem())
}
