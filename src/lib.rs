pub mod analysis;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod scrapers;
pub mod sink;

#[cfg(test)]
mod testing;

pub use error::{ConfigError, ExtractError, FetchError, PageFailure, SinkError};
pub use fetcher::{Document, Fetcher, FetcherConfig, HttpFetcher};
pub use models::record::JobRecord;
pub use models::scrape_result::{PageOutcome, PageReport, ScrapeResult};
pub use models::source::{SearchTerms, SourceDescriptor, SourceName};
pub use orchestrator::{DelayWindow, ItemFailurePolicy, Orchestrator};
pub use scrapers::{Scraper, build_scraper};
