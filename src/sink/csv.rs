use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::SinkError;
use crate::models::record::JobRecord;
use crate::models::scrape_result::ScrapeResult;
use crate::models::source::SearchTerms;
use crate::sink::{StoredJob, snapshot_file_name};

/// Write a run's records to `dir`, replacing any earlier snapshot of the
/// same source and search terms. Returns the written path.
pub fn write_snapshot(
    dir: &Path,
    terms: &SearchTerms,
    result: &ScrapeResult,
) -> Result<PathBuf, SinkError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(snapshot_file_name(terms, result.source()));
    write_records(&path, result.records())?;
    tracing::info!(
        "[{}] {} record(s) written to {}",
        result.source(),
        result.records().len(),
        path.display()
    );
    Ok(path)
}

pub fn write_records(path: &Path, records: &[JobRecord]) -> Result<(), SinkError> {
    let file = File::create(path)?;
    let mut writer = ::csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(StoredJob::from_record(record)?)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<Vec<JobRecord>, SinkError> {
    let mut reader = ::csv::Reader::from_path(path)?;
    reader
        .deserialize::<StoredJob>()
        .map(|row| row?.into_record())
        .collect()
}
