use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::error::ConfigError;

/// Characters that encodeURIComponent does NOT encode.
const SEARCH_TERM_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const PRF_BASE_URL: &str = "https://www.profession.hu";
pub const PRF_URL_TEMPLATE: &str =
    "https://www.profession.hu/allasok/{page},10,23,{primary}%20{secondary}";
pub const NOF_BASE_URL: &str = "https://nofluffjobs.com";
pub const NOF_URL_TEMPLATE: &str =
    "https://nofluffjobs.com/hu/{primary}?criteria=keyword%3D{secondary}&page={page}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SourceName {
    /// Listing cards carry title, company and summary inline.
    Prf,
    /// Listing cards carry only a title and a detail link.
    Nof,
}

impl SourceName {
    pub const ALL: [SourceName; 2] = [SourceName::Prf, SourceName::Nof];

    pub fn slug(self) -> &'static str {
        match self {
            SourceName::Prf => "prf",
            SourceName::Nof => "nof",
        }
    }

    /// How many listing pages one run fetches unless overridden.
    pub fn default_page_count(self) -> u32 {
        match self {
            SourceName::Prf => 4,
            SourceName::Nof => 1,
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// The keyword pair a run searches for, e.g. ("Python", "Developer").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    pub primary: String,
    pub secondary: String,
}

impl SearchTerms {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Lowercase `primary_secondary`, the shared prefix of table and file names.
    pub fn table_stem(&self) -> String {
        format!(
            "{}_{}",
            self.primary.to_lowercase(),
            self.secondary.to_lowercase()
        )
    }
}

/// Static per-site configuration, built once per run.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub name: SourceName,
    /// Origin that relative item links are resolved against.
    pub base_url: Url,
    /// Listing URL with `{page}`, `{primary}` and `{secondary}` placeholders.
    pub url_template: String,
    pub page_count: u32,
    pub lowercase_terms: bool,
}

impl SourceDescriptor {
    pub fn new(
        name: SourceName,
        base_url: &str,
        url_template: impl Into<String>,
        page_count: u32,
        lowercase_terms: bool,
    ) -> Result<Self, ConfigError> {
        let url_template = url_template.into();
        if !url_template.contains("{page}") {
            return Err(ConfigError::Template(url_template));
        }
        if page_count == 0 {
            return Err(ConfigError::PageCount(name.to_string()));
        }
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::BaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name,
            base_url,
            url_template,
            page_count,
            lowercase_terms,
        })
    }

    /// Descriptor for a source with its stock template, optionally overridden.
    ///
    /// An override also moves the link base to the override's origin, so
    /// detail pages are requested from the same host as the listing.
    pub fn for_source(
        name: SourceName,
        template_override: Option<&str>,
        page_count: Option<u32>,
    ) -> Result<Self, ConfigError> {
        let (base, template, lowercase) = match name {
            SourceName::Prf => (PRF_BASE_URL, PRF_URL_TEMPLATE, true),
            SourceName::Nof => (NOF_BASE_URL, NOF_URL_TEMPLATE, false),
        };
        let (base, template) = match template_override {
            Some(template) => (template_origin(template)?, template),
            None => (base.to_string(), template),
        };
        Self::new(
            name,
            &base,
            template,
            page_count.unwrap_or_else(|| name.default_page_count()),
            lowercase,
        )
    }

    /// Listing URL for a 1-based page number.
    pub fn page_url(&self, page: u32, terms: &SearchTerms) -> String {
        let encode = |term: &str| {
            let term = if self.lowercase_terms {
                term.to_lowercase()
            } else {
                term.to_string()
            };
            utf8_percent_encode(&term, SEARCH_TERM_SET).to_string()
        };

        self.url_template
            .replace("{page}", &page.to_string())
            .replace("{primary}", &encode(&terms.primary))
            .replace("{secondary}", &encode(&terms.secondary))
    }
}

/// `scheme://host[:port]` of a listing URL template.
fn template_origin(template: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::BaseUrl {
        url: template.to_string(),
        reason,
    };
    let sample = template
        .replace("{page}", "1")
        .replace("{primary}", "term")
        .replace("{secondary}", "term");
    let url = Url::parse(&sample).map_err(|e| invalid(e.to_string()))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(invalid("template has no host".to_string()));
    }
    Ok(origin.ascii_serialization())
}
