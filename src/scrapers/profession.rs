use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use url::Url;

use crate::error::{ExtractError, ExtractionGap};
use crate::fetcher::{Document, Fetcher};
use crate::models::record::JobRecord;
use crate::models::source::SourceName;
use crate::scrapers::extract::{self, compile, degrade};
use crate::scrapers::{ItemHandle, Scraper, scrape_subpage};

const ITEMS: &str = "ul.job-cards > li";
const SUMMARY: &str = "div.job-card__text";
const TECH_ICON: &str = r#"img[alt="technologies"]"#;
const TECH_ENTRY: &str = "span";

const ATTR_TITLE: &str = "data-prof-name";
const ATTR_COMPANY: &str = "data-item-brand";
const ATTR_LINK: &str = "data-link";

/// Listing cards carry title, company, summary and link as attributes and
/// text; only the tech stack needs the detail page.
pub struct PrfScraper {
    base_url: Url,
    items: Selector,
    summary: Selector,
    tech_icon: Selector,
    tech_entry: Selector,
}

/// Card fields readable without a network call.
struct CardFields {
    title: String,
    company: String,
    summary: String,
    link: Option<String>,
}

impl PrfScraper {
    pub fn new(base_url: Url) -> Result<Self, crate::error::ConfigError> {
        Ok(Self {
            base_url,
            items: compile(ITEMS)?,
            summary: compile(SUMMARY)?,
            tech_icon: compile(TECH_ICON)?,
            tech_entry: compile(TECH_ENTRY)?,
        })
    }

    fn card_fields(&self, card: ElementRef<'_>) -> CardFields {
        let attr = |name: &str| card.value().attr(name).map(str::to_string);

        CardFields {
            title: attr(ATTR_TITLE).unwrap_or_default(),
            company: attr(ATTR_COMPANY).unwrap_or_default(),
            summary: extract::first_text(card, &self.summary).unwrap_or_default(),
            link: attr(ATTR_LINK)
                .filter(|href| !href.trim().is_empty())
                .map(|href| extract::resolve_link(&self.base_url, &href)),
        }
    }

    /// The skills list sits in the `div` following the span that wraps the
    /// "technologies" icon.
    fn tech_stack(&self, document: &Document) -> Result<Vec<String>, ExtractionGap> {
        let icon = document
            .select(&self.tech_icon)
            .next()
            .ok_or(ExtractionGap::new("tech_stack", "technologies icon not found"))?;
        let wrapper = extract::parent_element(icon)
            .ok_or(ExtractionGap::new("tech_stack", "technologies icon has no parent"))?;
        let list = extract::next_sibling_named(wrapper, "div")
            .ok_or(ExtractionGap::new("tech_stack", "no div after technologies icon"))?;
        Ok(extract::all_texts(list, &self.tech_entry))
    }
}

#[async_trait]
impl Scraper for PrfScraper {
    fn source(&self) -> SourceName {
        SourceName::Prf
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
        let card = item.with_element(|el| self.card_fields(el))?;
        tracing::debug!("[prf] card '{}'", card.title);

        let tech_stack = match &card.link {
            Some(link) => scrape_subpage(self, fetcher, link).await.tech_stack,
            None => Vec::new(),
        };

        Ok(JobRecord {
            title: card.title,
            company: card.company,
            summary: card.summary,
            link: card.link.unwrap_or_default(),
            tech_stack,
        })
    }

    fn extract_tech_stack(&self, document: &Document) -> Vec<String> {
        degrade("prf", self.tech_stack(document))
    }
}
