//! HTML extraction primitives shared by the site scrapers.

use scraper::{ElementRef, Selector};
use url::Url;

use crate::error::{ConfigError, ExtractionGap};

/// Compile a CSS selector, reporting the failing pattern as a config error.
pub fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// All text below `element`, trimmed.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of the first descendant matching `selector`.
pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(text_of)
}

/// Trimmed text of every descendant matching `selector`, in document order.
pub fn all_texts(element: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    element.select(selector).map(text_of).collect()
}

/// First following sibling element with the given tag name.
pub fn next_sibling_named<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == name)
}

pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Resolve `href` against the source origin. Unresolvable links are kept verbatim.
pub fn resolve_link(base: &Url, href: &str) -> String {
    match base.join(href.trim()) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!("Keeping unresolvable link '{href}': {e}");
            href.to_string()
        }
    }
}

/// Collapse an extraction gap into the field's empty value.
pub fn degrade<T: Default>(source: &str, result: Result<T, ExtractionGap>) -> T {
    result.unwrap_or_else(|gap| {
        tracing::info!("[{source}] extraction gap, {gap}");
        T::default()
    })
}
