use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobharvest::analysis::{self, CANONICAL_LABELS};
use jobharvest::config::{AnalyzeArgs, Command, Config, HarvestArgs, LogFormat};
use jobharvest::sink::{csv, postgres};
use jobharvest::{
    ConfigError, HttpFetcher, Orchestrator, PageOutcome, SourceName, build_scraper,
};

const CHART_WIDTH: usize = 40;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobharvest=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    match config.resolved_command() {
        Command::Harvest(args) => harvest(&config, &args).await,
        Command::Analyze(args) => analyze(&config, &args).await,
    }
}

async fn harvest(config: &Config, args: &HarvestArgs) -> anyhow::Result<()> {
    let terms = config.search_terms();

    // Every descriptor and scraper is built before the first request.
    let plan = args
        .selected_sources()
        .into_iter()
        .map(|name| -> Result<_, ConfigError> {
            let source = args.descriptor(name)?;
            let scraper = build_scraper(&source)?;
            Ok((source, scraper))
        })
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid source configuration")?;

    let fetcher = HttpFetcher::new(&args.fetcher_config())?;
    let orchestrator = Orchestrator::new(Box::new(fetcher), args.delay_window()?)
        .with_item_failures(args.item_failures());

    let pool = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            Some(postgres::connect(url).await?)
        }
        None => None,
    };

    for (source, scraper) in &plan {
        let result = orchestrator.run(source, scraper.as_ref(), &terms).await;

        for report in result.failed_pages() {
            if let PageOutcome::Failed(failure) = &report.outcome {
                tracing::warn!("[{}] page {} lost: {failure}", source.name, report.page);
            }
        }
        if result.is_fully_failed() {
            tracing::error!("[{}] every page failed, nothing collected", source.name);
        }
        tracing::info!(
            "[{}] run took {}s",
            source.name,
            (result.finished_at() - result.started_at()).num_seconds()
        );

        csv::write_snapshot(&config.output_dir, &terms, &result)
            .with_context(|| format!("Failed to write {} snapshot", source.name))?;
        if let Some(pool) = &pool {
            postgres::replace_table(pool, &terms, &result)
                .await
                .with_context(|| format!("Failed to load {} into the database", source.name))?;
        }
    }

    Ok(())
}

async fn analyze(config: &Config, args: &AnalyzeArgs) -> anyhow::Result<()> {
    let terms = config.search_terms();

    let records = if !args.csv_files.is_empty() {
        let mut records = Vec::new();
        for path in &args.csv_files {
            records.extend(
                csv::read_snapshot(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            );
        }
        records
    } else if let Some(url) = &config.database_url {
        let pool = postgres::connect(url).await?;
        postgres::load_records(&pool, &terms, &SourceName::ALL).await?
    } else {
        anyhow::bail!("Nothing to analyze: pass --csv files or set DATABASE_URL");
    };

    let report = analysis::analyze(&records, &terms, CANONICAL_LABELS);
    let top = report.top(args.top);
    for entry in top {
        tracing::info!("{}: {} ({:.2}%)", entry.label, entry.count, entry.percent);
    }

    println!(
        "{} {}'s top {} tech stack\n",
        terms.primary,
        terms.secondary,
        top.len()
    );
    print!("{}", analysis::render_chart(top, CHART_WIDTH));

    Ok(())
}
