use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use crate::error::SinkError;
use crate::models::record::JobRecord;
use crate::models::scrape_result::ScrapeResult;
use crate::models::source::{SearchTerms, SourceName};
use crate::sink::table_name;

pub async fn connect(database_url: &str) -> Result<PgPool, SinkError> {
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url)
        .await?;
    Ok(pool)
}

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    job_title: String,
    company_name: String,
    job_summary: String,
    job_link: String,
    job_tech_stack: Json<Vec<String>>,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        JobRecord {
            title: row.job_title,
            company: row.company_name,
            summary: row.job_summary,
            link: row.job_link,
            tech_stack: row.job_tech_stack.0,
        }
    }
}

/// Table names are interpolated into DDL, so only `[a-z0-9_]` is accepted.
fn checked_table(name: String) -> Result<String, SinkError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(SinkError::InvalidTableName(name))
    }
}

/// Replace the source's table with this run's records in one transaction.
pub async fn replace_table(
    pool: &PgPool,
    terms: &SearchTerms,
    result: &ScrapeResult,
) -> Result<u64, SinkError> {
    let table = checked_table(table_name(terms, result.source()))?;
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "CREATE TABLE {table} (
            job_title TEXT NOT NULL,
            company_name TEXT NOT NULL,
            job_summary TEXT NOT NULL,
            job_link TEXT NOT NULL,
            job_tech_stack JSONB NOT NULL
        )"
    ))
    .execute(&mut *tx)
    .await?;

    let insert = format!(
        "INSERT INTO {table} (job_title, company_name, job_summary, job_link, job_tech_stack) VALUES ($1, $2, $3, $4, $5)"
    );
    let mut inserted = 0;
    for record in result.records() {
        inserted += sqlx::query(&insert)
            .bind(&record.title)
            .bind(&record.company)
            .bind(&record.summary)
            .bind(&record.link)
            .bind(Json(&record.tech_stack))
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    tx.commit().await?;
    tracing::info!("[{}] {inserted} row(s) loaded into '{table}'", result.source());
    Ok(inserted)
}

/// Records stored for each source, concatenated in the given source order.
pub async fn load_records(
    pool: &PgPool,
    terms: &SearchTerms,
    sources: &[SourceName],
) -> Result<Vec<JobRecord>, SinkError> {
    let mut records = Vec::new();
    for source in sources {
        let table = checked_table(table_name(terms, *source))?;
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT job_title, company_name, job_summary, job_link, job_tech_stack FROM {table}"
        ))
        .fetch_all(pool)
        .await?;
        tracing::info!("Loaded {} row(s) from '{table}'", rows.len());
        records.extend(rows.into_iter().map(JobRecord::from));
    }
    Ok(records)
}
