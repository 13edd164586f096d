use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use crate::error::{ConfigError, PageFailure};
use crate::fetcher::Fetcher;
use crate::models::record::JobRecord;
use crate::models::scrape_result::{PageOutcome, PageReport, ScrapeResult};
use crate::models::source::{SearchTerms, SourceDescriptor};
use crate::scrapers::Scraper;

/// Bounds of the random pause between two listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    min: Duration,
    max: Duration,
}

impl DelayWindow {
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::DelayWindow { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn contains(&self, delay: Duration) -> bool {
        (self.min..=self.max).contains(&delay)
    }

    /// Uniform draw from `[min, max]`.
    pub fn sample(&self) -> Duration {
        rand::rng().random_range(self.min..=self.max)
    }
}

impl Default for DelayWindow {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(5),
            max: Duration::from_secs(10),
        }
    }
}

/// Waits out the rate-limit delay.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// What a failing item does to the rest of its page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemFailurePolicy {
    /// Discard every record of the page and mark it failed.
    #[default]
    DropPage,
    /// Skip only the failing item and keep its siblings.
    SkipItem,
}

/// Drives the paginated scrape of one source.
///
/// Pages are fetched strictly one after another, with a random delay between
/// consecutive listing requests. Page failures are logged and skipped; the
/// run always attempts every configured page.
pub struct Orchestrator {
    fetcher: Box<dyn Fetcher>,
    pacer: Box<dyn Pacer>,
    delay: DelayWindow,
    item_failures: ItemFailurePolicy,
}

impl Orchestrator {
    pub fn new(fetcher: Box<dyn Fetcher>, delay: DelayWindow) -> Self {
        Self {
            fetcher,
            pacer: Box::new(TokioPacer),
            delay,
            item_failures: ItemFailurePolicy::default(),
        }
    }

    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_item_failures(mut self, policy: ItemFailurePolicy) -> Self {
        self.item_failures = policy;
        self
    }

    pub async fn run(
        &self,
        source: &SourceDescriptor,
        scraper: &dyn Scraper,
        terms: &SearchTerms,
    ) -> ScrapeResult {
        let started_at = Utc::now();
        let last_page = source.page_count;
        let mut records = Vec::new();
        let mut pages = Vec::with_capacity(last_page as usize);

        tracing::info!("[{}] starting scrape of {last_page} page(s)", source.name);

        for page in 1..=last_page {
            let url = source.page_url(page, terms);
            tracing::info!("[{}] page {page}/{last_page}: {url}", source.name);

            let outcome = match self.scrape_page(scraper, &url).await {
                Ok((page_records, skipped_items)) => {
                    tracing::info!(
                        "[{}] page {page}: {} record(s)",
                        source.name,
                        page_records.len()
                    );
                    let outcome = PageOutcome::Succeeded {
                        records: page_records.len(),
                        skipped_items,
                    };
                    records.extend(page_records);
                    outcome
                }
                Err(failure) => {
                    tracing::warn!("[{}] page {page} failed: {failure}", source.name);
                    PageOutcome::Failed(failure)
                }
            };
            pages.push(PageReport { page, url, outcome });

            if page < last_page {
                let delay = self.delay.sample();
                tracing::debug!("[{}] waiting {delay:?} before next page", source.name);
                self.pacer.pause(delay).await;
            }
        }

        let result = ScrapeResult::from_parts(source.name, records, pages, started_at, Utc::now());
        tracing::info!(
            "[{}] scrape done: {} record(s), {}/{} page(s) ok",
            source.name,
            result.records().len(),
            result.succeeded_pages(),
            result.pages().len()
        );
        result
    }

    /// Records of one listing page plus the number of individually skipped items.
    async fn scrape_page(
        &self,
        scraper: &dyn Scraper,
        url: &str,
    ) -> Result<(Vec<JobRecord>, usize), PageFailure> {
        let items = {
            let document = self.fetcher.fetch(url).await?;
            scraper.find_items(&document)
        };
        tracing::debug!("[{}] {} item(s) on {url}", scraper.source(), items.len());

        let mut records = Vec::with_capacity(items.len());
        let mut skipped = 0;
        for (index, item) in items.iter().enumerate() {
            match scraper.extract_item_fields(item, self.fetcher.as_ref()).await {
                Ok(record) => records.push(record),
                Err(e) => match self.item_failures {
                    ItemFailurePolicy::DropPage => {
                        return Err(PageFailure::Item { index, source: e });
                    }
                    ItemFailurePolicy::SkipItem => {
                        tracing::warn!("[{}] skipping item {index}: {e}", scraper.source());
                        skipped += 1;
                    }
                },
            }
        }

        Ok((records, skipped))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::FetchError;
    use crate::models::source::{NOF_BASE_URL, SourceName};
    use crate::scrapers::{ItemHandle, NofScraper};
    use crate::testing::{RecordingPacer, StaticFetcher};
    use url::Url;

    const TEMPLATE: &str = "https://nofluffjobs.com/hu/{primary}?page={page}";

    fn listing(ids: &[u32]) -> String {
        let cards: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<a class="posting-list-item" href="/job/{id}"><h3 class="posting-title__position">Job {id}</h3></a>"#
                )
            })
            .collect();
        format!("<html><body>{cards}</body></html>")
    }

    fn source(pages: u32) -> SourceDescriptor {
        SourceDescriptor::new(SourceName::Nof, NOF_BASE_URL, TEMPLATE, pages, false).unwrap()
    }

    fn page_url(page: u32) -> String {
        format!("https://nofluffjobs.com/hu/Python?page={page}")
    }

    fn terms() -> SearchTerms {
        SearchTerms::new("Python", "Developer")
    }

    fn scraper() -> NofScraper {
        NofScraper::new(Url::parse(NOF_BASE_URL).unwrap()).unwrap()
    }

    fn window() -> DelayWindow {
        DelayWindow::new(Duration::from_millis(5), Duration::from_millis(10)).unwrap()
    }

    fn titles(result: &ScrapeResult) -> Vec<&str> {
        result.records().iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn failed_page_is_skipped_and_order_is_kept() {
        let fetcher = StaticFetcher::new()
            .page(&page_url(1), &listing(&[1, 2]))
            .failure(&page_url(2), FetchError::HttpStatus(503))
            .page(&page_url(3), &listing(&[3]))
            .page(&page_url(4), &listing(&[4, 5]));
        let pacer = RecordingPacer::default();
        let orchestrator =
            Orchestrator::new(Box::new(fetcher), window()).with_pacer(Box::new(pacer.clone()));

        let result = orchestrator.run(&source(4), &scraper(), &terms()).await;

        assert_eq!(titles(&result), vec!["Job 1", "Job 2", "Job 3", "Job 4", "Job 5"]);
        assert_eq!(result.pages().len(), 4);
        assert_eq!(
            result.pages()[1].outcome,
            PageOutcome::Failed(PageFailure::Fetch(FetchError::HttpStatus(503)))
        );
        assert_eq!(result.succeeded_pages(), 3);
        assert_eq!(result.contributing_pages(), 3);
        assert_eq!(result.failed_pages().count(), 1);
    }

    #[tokio::test]
    async fn delays_only_between_pages() {
        let fetcher = StaticFetcher::new()
            .page(&page_url(1), &listing(&[1]))
            .page(&page_url(2), &listing(&[]))
            .failure(&page_url(3), FetchError::Network("reset".into()));
        let pacer = RecordingPacer::default();
        let orchestrator =
            Orchestrator::new(Box::new(fetcher), window()).with_pacer(Box::new(pacer.clone()));

        orchestrator.run(&source(3), &scraper(), &terms()).await;

        let pauses = pacer.pauses();
        assert_eq!(pauses.len(), 2);
        assert!(pauses.iter().all(|d| window().contains(*d)));
    }

    #[tokio::test]
    async fn single_page_run_never_pauses() {
        let fetcher = StaticFetcher::new().page(&page_url(1), &listing(&[7]));
        let pacer = RecordingPacer::default();
        let orchestrator =
            Orchestrator::new(Box::new(fetcher), window()).with_pacer(Box::new(pacer.clone()));

        let result = orchestrator.run(&source(1), &scraper(), &terms()).await;

        assert_eq!(titles(&result), vec!["Job 7"]);
        assert!(pacer.pauses().is_empty());
    }

    #[tokio::test]
    async fn all_pages_failing_is_distinguishable_from_no_postings() {
        let pacer = RecordingPacer::default();
        let orchestrator = Orchestrator::new(Box::new(StaticFetcher::new()), window())
            .with_pacer(Box::new(pacer.clone()));
        let failed = orchestrator.run(&source(2), &scraper(), &terms()).await;
        assert!(failed.records().is_empty());
        assert!(failed.is_fully_failed());

        let fetcher = StaticFetcher::new()
            .page(&page_url(1), &listing(&[]))
            .page(&page_url(2), &listing(&[]));
        let orchestrator =
            Orchestrator::new(Box::new(fetcher), window()).with_pacer(Box::new(pacer));
        let empty = orchestrator.run(&source(2), &scraper(), &terms()).await;
        assert!(empty.records().is_empty());
        assert!(!empty.is_fully_failed());
        assert_eq!(empty.succeeded_pages(), 2);
    }

    #[tokio::test]
    async fn subpages_are_fetched_after_their_listing_page() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page(&page_url(1), &listing(&[1, 2]))
                .page(&page_url(2), &listing(&[3])),
        );
        let orchestrator = Orchestrator::new(Box::new(fetcher.clone()), window())
            .with_pacer(Box::new(RecordingPacer::default()));

        let result = orchestrator.run(&source(2), &scraper(), &terms()).await;

        // Subpages are not stubbed, so enrichment degrades but records survive.
        assert_eq!(titles(&result), vec!["Job 1", "Job 2", "Job 3"]);
        assert!(result.records().iter().all(|r| r.tech_stack.is_empty()));
        assert_eq!(
            fetcher.calls(),
            vec![
                page_url(1),
                "https://nofluffjobs.com/job/1".to_string(),
                "https://nofluffjobs.com/job/2".to_string(),
                page_url(2),
                "https://nofluffjobs.com/job/3".to_string(),
            ]
        );
    }

    /// Emits one unparseable item between two good ones.
    struct FlakyScraper(NofScraper);

    #[async_trait]
    impl Scraper for FlakyScraper {
        fn source(&self) -> SourceName {
            SourceName::Nof
        }

        fn find_items(&self, document: &crate::fetcher::Document) -> Vec<ItemHandle> {
            let mut items = self.0.find_items(document);
            items.insert(1, ItemHandle::from_html("not markup"));
            items
        }

        async fn extract_item_fields(
            &self,
            item: &ItemHandle,
            fetcher: &dyn Fetcher,
        ) -> Result<JobRecord, crate::error::ExtractError> {
            self.0.extract_item_fields(item, fetcher).await
        }

        fn extract_tech_stack(&self, document: &crate::fetcher::Document) -> Vec<String> {
            self.0.extract_tech_stack(document)
        }
    }

    fn flaky_fetcher() -> StaticFetcher {
        StaticFetcher::new()
            .page(&page_url(1), &listing(&[1, 2]))
            .page(&page_url(2), &listing(&[3]))
    }

    #[tokio::test]
    async fn failing_item_drops_its_page_by_default() {
        let orchestrator = Orchestrator::new(Box::new(flaky_fetcher()), window())
            .with_pacer(Box::new(RecordingPacer::default()));

        let result = orchestrator
            .run(&source(2), &FlakyScraper(scraper()), &terms())
            .await;

        // Both pages get the injected bad item at index 1.
        assert!(result.records().is_empty());
        assert!(matches!(
            result.pages()[0].outcome,
            PageOutcome::Failed(PageFailure::Item { index: 1, .. })
        ));
        assert!(result.is_fully_failed());
    }

    #[tokio::test]
    async fn skip_item_policy_keeps_siblings() {
        let orchestrator = Orchestrator::new(Box::new(flaky_fetcher()), window())
            .with_pacer(Box::new(RecordingPacer::default()))
            .with_item_failures(ItemFailurePolicy::SkipItem);

        let result = orchestrator
            .run(&source(2), &FlakyScraper(scraper()), &terms())
            .await;

        assert_eq!(titles(&result), vec!["Job 1", "Job 2", "Job 3"]);
        assert_eq!(
            result.pages()[0].outcome,
            PageOutcome::Succeeded { records: 2, skipped_items: 1 }
        );
    }

    #[test]
    fn delay_window_validates_and_samples_in_bounds() {
        assert!(matches!(
            DelayWindow::new(Duration::from_secs(3), Duration::from_secs(1)),
            Err(ConfigError::DelayWindow { .. })
        ));

        let window = DelayWindow::default();
        for _ in 0..100 {
            assert!(window.contains(window.sample()));
        }

        let fixed = DelayWindow::new(Duration::from_secs(2), Duration::from_secs(2)).unwrap();
        assert_eq!(fixed.sample(), Duration::from_secs(2));
    }
}
