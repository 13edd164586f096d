use std::time::Duration;

/// Failure to obtain a parsed document for one URL.
///
/// Carries only owned data so it can be kept in a run's outcome log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not parse response body: {0}")]
    ParseFailure(String),
}

/// An item handle that cannot be turned into a record at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Malformed item: {reason}")]
    MalformedItem { reason: String },
}

/// An expected structural node is missing from a document.
///
/// Not an error: the affected field degrades to empty and extraction of the
/// rest of the item continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {detail}")]
pub struct ExtractionGap {
    pub field: &'static str,
    pub detail: &'static str,
}

impl ExtractionGap {
    pub fn new(field: &'static str, detail: &'static str) -> Self {
        Self { field, detail }
    }
}

/// Why a single listing page contributed no records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageFailure {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Item {index} failed: {source}")]
    Item {
        index: usize,
        #[source]
        source: ExtractError,
    },
}

/// Invalid source or runtime configuration. Raised before any request is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("URL template has no {{page}} placeholder: {0}")]
    Template(String),

    #[error("Invalid base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("Page count must be at least 1 for {0}")]
    PageCount(String),

    #[error("Invalid delay of {0} seconds")]
    Delay(f64),

    #[error("Delay window is inverted: min {min:?} > max {max:?}")]
    DelayWindow { min: Duration, max: Duration },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),
}
