// Site scrapers: the extraction contract every job board implements, plus
// the shared subpage enrichment step.

pub mod extract;
pub mod nofluff;
pub mod profession;

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::error::{ConfigError, ExtractError};
use crate::fetcher::{Document, Fetcher};
use crate::models::record::JobRecord;
use crate::models::source::{SourceDescriptor, SourceName};

pub use nofluff::NofScraper;
pub use profession::PrfScraper;

/// Owned reference to one posting's node on a listing page.
///
/// Holds the node's outer HTML so items outlive the listing document and can
/// be processed across subpage requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHandle {
    html: String,
}

impl ItemHandle {
    pub fn from_element(element: ElementRef<'_>) -> Self {
        Self {
            html: element.html(),
        }
    }

    pub fn from_html(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Re-parse the item and run `f` against its root element.
    pub fn with_element<T>(&self, f: impl FnOnce(ElementRef<'_>) -> T) -> Result<T, ExtractError> {
        let fragment = Html::parse_fragment(&self.html);
        let root = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or_else(|| ExtractError::MalformedItem {
                reason: "item has no element".to_string(),
            })?;
        Ok(f(root))
    }
}

/// Fields pulled from a posting's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub company: String,
    pub summary: String,
    pub tech_stack: Vec<String>,
}

/// Extraction contract for one job board.
///
/// `find_items`, `extract_item_fields` and `extract_tech_stack` are required;
/// the subpage summary and company hooks default to empty for sources whose
/// detail pages don't carry them.
#[async_trait]
pub trait Scraper: Send + Sync {
    fn source(&self) -> SourceName;

    /// Posting nodes on a listing page, in document order. Empty when none match.
    fn find_items(&self, document: &Document) -> Vec<ItemHandle>;

    /// Build the record for one item, fetching its subpage when needed.
    async fn extract_item_fields(
        &self,
        item: &ItemHandle,
        fetcher: &dyn Fetcher,
    ) -> Result<JobRecord, ExtractError>;

    /// Required skills from a subpage. Empty when the skills container is missing.
    fn extract_tech_stack(&self, document: &Document) -> Vec<String>;

    fn extract_subpage_summary(&self, _document: &Document) -> String {
        String::new()
    }

    fn extract_subpage_company(&self, _document: &Document) -> String {
        String::new()
    }
}

/// Fetch a detail page and apply the scraper's subpage hooks to it.
///
/// A failed fetch never fails the item; it yields empty enrichment.
pub async fn scrape_subpage<S>(scraper: &S, fetcher: &dyn Fetcher, url: &str) -> Enrichment
where
    S: Scraper + ?Sized,
{
    match fetcher.fetch(url).await {
        Ok(document) => Enrichment {
            company: scraper.extract_subpage_company(&document),
            summary: scraper.extract_subpage_summary(&document),
            tech_stack: scraper.extract_tech_stack(&document),
        },
        Err(e) => {
            tracing::warn!("[{}] subpage {url} unavailable: {e}", scraper.source());
            Enrichment::default()
        }
    }
}

/// Construct the scraper matching a source descriptor.
pub fn build_scraper(source: &SourceDescriptor) -> Result<Box<dyn Scraper>, ConfigError> {
    let scraper: Box<dyn Scraper> = match source.name {
        SourceName::Prf => Box::new(PrfScraper::new(source.base_url.clone())?),
        SourceName::Nof => Box::new(NofScraper::new(source.base_url.clone())?),
    };
    Ok(scraper)
}
