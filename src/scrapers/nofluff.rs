use async_trait::async_trait;
use scraper::Selector;
use url::Url;

use crate::error::{ConfigError, ExtractError, ExtractionGap};
use crate::fetcher::{Document, Fetcher};
use crate::models::record::JobRecord;
use crate::models::source::SourceName;
use crate::scrapers::extract::{self, compile, degrade};
use crate::scrapers::{Enrichment, ItemHandle, Scraper, scrape_subpage};

const ITEMS: &str = "a.posting-list-item";
const TITLE: &str = "h3.posting-title__position";
const MUSTS: &str = r#"section[branch="musts"]"#;
const MUST_ENTRY: &str = "li";
const HEADING: &str = "h2";
const READ_MORE: &str = "nfj-read-more";
const READ_MORE_BODY: &str = "div";
const COMPANY: &str = "a#postingCompanyUrl";

/// Start of the "projekt rövid leírása" heading that precedes the summary.
const SUMMARY_HEADING: &str = "projekt r";

/// Listing cards carry only the title and a detail link; company, summary and
/// tech stack all come from the detail page.
pub struct NofScraper {
    base_url: Url,
    items: Selector,
    title: Selector,
    musts: Selector,
    must_entry: Selector,
    heading: Selector,
    read_more_body: Selector,
    company: Selector,
}

impl NofScraper {
    pub fn new(base_url: Url) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url,
            items: compile(ITEMS)?,
            title: compile(TITLE)?,
            musts: compile(MUSTS)?,
            must_entry: compile(MUST_ENTRY)?,
            heading: compile(HEADING)?,
            read_more_body: compile(READ_MORE_BODY)?,
            company: compile(COMPANY)?,
        })
    }

    fn tech_stack(&self, document: &Document) -> Result<Vec<String>, ExtractionGap> {
        let musts = document
            .select(&self.musts)
            .next()
            .ok_or(ExtractionGap::new("tech_stack", "musts section not found"))?;
        let entries = extract::all_texts(musts, &self.must_entry);
        if entries.is_empty() {
            return Err(ExtractionGap::new("tech_stack", "musts section has no entries"));
        }
        Ok(entries)
    }

    fn summary(&self, document: &Document) -> Result<String, ExtractionGap> {
        let mut saw_heading = false;
        for heading in document.select(&self.heading) {
            if !extract::text_of(heading).contains(SUMMARY_HEADING) {
                continue;
            }
            saw_heading = true;
            let body = extract::next_sibling_named(heading, READ_MORE)
                .and_then(|more| more.select(&self.read_more_body).next());
            if let Some(body) = body {
                return Ok(collapse_text(body.text()));
            }
            tracing::debug!("[nof] summary heading without read-more body, trying next");
        }

        Err(if saw_heading {
            ExtractionGap::new("summary", "read-more body not found after heading")
        } else {
            ExtractionGap::new("summary", "summary heading not found")
        })
    }

    fn company(&self, document: &Document) -> Result<String, ExtractionGap> {
        document
            .select(&self.company)
            .next()
            .map(extract::text_of)
            .ok_or(ExtractionGap::new("company", "company link not found"))
    }
}

/// Join the stripped text fragments of a node with single spaces.
fn collapse_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Scraper for NofScraper {
    fn source(&self) -> SourceName {
        SourceName::Nof
    }

    fn find_items(&self, document: &Document) -> Vec<ItemHandle> {
        document
            .select(&self.items)
            .map(ItemHandle::from_element)
            .collect()
    }

    async fn extract_item_fields(
        &self,
        item: &ItemHandle,
        fetcher: &dyn Fetcher,
    ) -> Result<JobRecord, ExtractError> {
        let (title, link) = item.with_element(|card| {
            let title = extract::first_text(card, &self.title).unwrap_or_default();
            let link = card
                .value()
                .attr("href")
                .filter(|href| !href.trim().is_empty())
                .map(|href| extract::resolve_link(&self.base_url, href));
            (title, link)
        })?;

        let enrichment = match &link {
            Some(link) => scrape_subpage(self, fetcher, link).await,
            None => {
                tracing::debug!("[nof] '{title}' has no detail link");
                Enrichment::default()
            }
        };

        Ok(JobRecord {
            title,
            company: enrichment.company,
            summary: enrichment.summary,
            link: link.unwrap_or_default(),
            tech_stack: enrichment.tech_stack,
        })
    }

    fn extract_tech_stack(&self, document: &Document) -> Vec<String> {
        degrade("nof", self.tech_stack(document))
    }

    /// Text of the read-more body after the project heading. Fragments are
    /// trimmed and joined with one space rather than concatenated.
    fn extract_subpage_summary(&self, document: &Document) -> String {
        degrade("nof", self.summary(document))
    }

    fn extract_subpage_company(&self, document: &Document) -> String {
        degrade("nof", self.company(document))
    }
}
