use std::path::PathBuf;

use anyhow::{Context, Result};

use fbref_matches::config::{self, CrawlConfig};
use fbref_matches::fetcher::fetcher_from_config;
use fbref_matches::logging;
use fbref_matches::service::{self, CrawlOutcome};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let mut config = CrawlConfig::from_env();
    apply_args(&mut config);

    let fetcher = fetcher_from_config(&config);
    let report = service::run_crawl(&config, fetcher.as_ref()).context("crawl aborted")?;

    println!("Seasons: {:?}", report.seasons);
    println!(
        "Teams scraped: {} (skipped {})",
        report.teams_scraped,
        report.skips.len()
    );
    for skipped in report.skips.iter().take(12) {
        println!("   - {} {}: {}", skipped.season, skipped.team, skipped.skip);
    }
    match report.outcome {
        CrawlOutcome::Written { records_written } => println!(
            "Scraping completed: {records_written} rows saved to {}",
            config.output_path.display()
        ),
        CrawlOutcome::NoData => println!("No data scraped."),
    }
    Ok(())
}

fn apply_args(config: &mut CrawlConfig) {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if let Some(start) = arg_value(&args, "--start").and_then(|v| v.parse().ok()) {
        config.season_start = start;
    }
    if let Some(end) = arg_value(&args, "--end").and_then(|v| v.parse().ok()) {
        config.season_end = end;
    }
    if let Some(out) = arg_value(&args, "--out") {
        config.output_path = PathBuf::from(out);
    }
    if let Some(threads) = arg_value(&args, "--parallelism").and_then(|v| v.parse::<usize>().ok())
    {
        config.parallelism = threads.clamp(1, 8);
    }
    if let Some(competition) = arg_value(&args, "--competition") {
        config.competition = competition;
    }
    if args.iter().any(|a| a == "--cache") {
        config.page_cache = true;
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
