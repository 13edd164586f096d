use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;
use crate::fetcher::{DEFAULT_USER_AGENT, FetcherConfig};
use crate::models::source::{SearchTerms, SourceDescriptor, SourceName};
use crate::orchestrator::{DelayWindow, ItemFailurePolicy};

const DEFAULT_MIN_DELAY_SECS: f64 = 5.0;
const DEFAULT_MAX_DELAY_SECS: f64 = 10.0;
const DEFAULT_TOP: usize = 15;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobharvest", about = "Harvest job postings and report their tech stacks")]
pub struct Config {
    /// First search keyword
    #[arg(long, env = "SEARCH_PRIMARY", default_value = "python")]
    pub primary: String,

    /// Second search keyword
    #[arg(long, env = "SEARCH_SECONDARY", default_value = "developer")]
    pub secondary: String,

    /// Postgres connection URL; enables the database sink
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Directory for CSV snapshots
    #[arg(long, env = "OUTPUT_DIR", default_value = "generated_csv_files")]
    pub output_dir: PathBuf,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Scrape the configured sources (default when no subcommand given)
    Harvest(HarvestArgs),
    /// Report tech-stack frequencies over stored records
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct HarvestArgs {
    /// Sources to scrape, in order
    #[arg(long = "source", value_enum)]
    pub sources: Vec<SourceName>,

    /// Listing URL template for prf, e.g. `https://host/allasok/{page},10,23,{primary}%20{secondary}`.
    /// Item links resolve against its host.
    #[arg(long, env = "PRF_URL_TEMPLATE")]
    pub prf_url: Option<String>,

    /// Listing URL template for nof; must contain `{page}`, may use `{primary}`
    /// and `{secondary}`. Item links resolve against its host.
    #[arg(long, env = "NOF_URL_TEMPLATE")]
    pub nof_url: Option<String>,

    #[arg(long)]
    pub prf_pages: Option<u32>,

    #[arg(long)]
    pub nof_pages: Option<u32>,

    /// Lower bound of the pause between listing pages
    #[arg(long, default_value_t = DEFAULT_MIN_DELAY_SECS)]
    pub min_delay_secs: f64,

    /// Upper bound of the pause between listing pages
    #[arg(long, default_value_t = DEFAULT_MAX_DELAY_SECS)]
    pub max_delay_secs: f64,

    /// Drop only a failing item instead of its whole page
    #[arg(long)]
    pub skip_failed_items: bool,

    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, env = "HARVEST_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl Default for HarvestArgs {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            prf_url: std::env::var("PRF_URL_TEMPLATE").ok(),
            nof_url: std::env::var("NOF_URL_TEMPLATE").ok(),
            prf_pages: None,
            nof_pages: None,
            min_delay_secs: DEFAULT_MIN_DELAY_SECS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
            skip_failed_items: false,
            request_timeout_secs: None,
            user_agent: std::env::var("HARVEST_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct AnalyzeArgs {
    /// CSV snapshots to read instead of the database
    #[arg(long = "csv")]
    pub csv_files: Vec<PathBuf>,

    /// Number of entries to report
    #[arg(long, default_value_t = DEFAULT_TOP)]
    pub top: usize,
}

impl Config {
    /// Resolve the command, defaulting to Harvest if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Harvest(HarvestArgs::default()))
    }

    pub fn search_terms(&self) -> SearchTerms {
        SearchTerms::new(&self.primary, &self.secondary)
    }
}

impl HarvestArgs {
    /// Selected sources, all of them when none were named.
    pub fn selected_sources(&self) -> Vec<SourceName> {
        if self.sources.is_empty() {
            SourceName::ALL.to_vec()
        } else {
            self.sources.clone()
        }
    }

    pub fn descriptor(&self, name: SourceName) -> Result<SourceDescriptor, ConfigError> {
        let (template, pages) = match name {
            SourceName::Prf => (self.prf_url.as_deref(), self.prf_pages),
            SourceName::Nof => (self.nof_url.as_deref(), self.nof_pages),
        };
        SourceDescriptor::for_source(name, template, pages)
    }

    pub fn delay_window(&self) -> Result<DelayWindow, ConfigError> {
        let seconds = |value: f64| {
            Duration::try_from_secs_f64(value).map_err(|_| ConfigError::Delay(value))
        };
        DelayWindow::new(seconds(self.min_delay_secs)?, seconds(self.max_delay_secs)?)
    }

    pub fn item_failures(&self) -> ItemFailurePolicy {
        if self.skip_failed_items {
            ItemFailurePolicy::SkipItem
        } else {
            ItemFailurePolicy::DropPage
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            user_agent: self.user_agent.clone(),
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("jobharvest").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn harvest_is_the_default_command() {
        let config = parse(&["--primary", "Rust", "--secondary", "Engineer"]);
        assert_eq!(config.search_terms(), SearchTerms::new("Rust", "Engineer"));
        match config.resolved_command() {
            Command::Harvest(args) => {
                assert_eq!(args.selected_sources(), SourceName::ALL.to_vec());
                assert_eq!(args.item_failures(), ItemFailurePolicy::DropPage);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn harvest_flags_shape_the_run() {
        let config = parse(&[
            "harvest",
            "--source",
            "nof",
            "--nof-pages",
            "3",
            "--min-delay-secs",
            "0.5",
            "--max-delay-secs",
            "1",
            "--skip-failed-items",
            "--request-timeout-secs",
            "20",
        ]);
        let Some(Command::Harvest(args)) = config.command else {
            panic!("expected harvest");
        };

        assert_eq!(args.selected_sources(), vec![SourceName::Nof]);
        assert_eq!(args.descriptor(SourceName::Nof).unwrap().page_count, 3);
        let window = args.delay_window().unwrap();
        assert_eq!(window.min(), Duration::from_millis(500));
        assert_eq!(window.max(), Duration::from_secs(1));
        assert_eq!(args.item_failures(), ItemFailurePolicy::SkipItem);
        assert_eq!(args.fetcher_config().timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn inverted_or_negative_delays_are_config_errors() {
        let args = HarvestArgs {
            min_delay_secs: 4.0,
            max_delay_secs: 1.0,
            ..HarvestArgs::default()
        };
        assert!(args.delay_window().is_err());

        let args = HarvestArgs {
            min_delay_secs: -1.0,
            ..HarvestArgs::default()
        };
        assert!(matches!(args.delay_window(), Err(ConfigError::Delay(_))));
    }

    #[test]
    fn analyze_reads_csv_list() {
        let config = parse(&["analyze", "--csv", "a.csv", "--csv", "b.csv", "--top", "5"]);
        let Some(Command::Analyze(args)) = config.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.csv_files, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        assert_eq!(args.top, 5);
    }

    #[test]
    fn url_template_flag_sets_listing_and_link_host() {
        let config = parse(&[
            "harvest",
            "--nof-url",
            "http://localhost:8080/hu/{primary}?page={page}",
        ]);
        let Some(Command::Harvest(ref args)) = config.command else {
            panic!("expected harvest");
        };

        let source = args.descriptor(SourceName::Nof).unwrap();
        assert_eq!(source.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(
            source.page_url(1, &config.search_terms()),
            "http://localhost:8080/hu/python?page=1"
        );
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(
            Config::try_parse_from(["jobharvest", "harvest", "--source", "monster"]).is_err()
        );
    }
}
