use std::path::Path;

use tracing::{error, info, warn};
use url::Url;

use crate::aggregate::{Aggregate, aggregate};
use crate::config::{CrawlConfig, TRUSTED_HOST};
use crate::dataset::{self, DatasetView, RunOutcome, RunStatus};
use crate::error::{CrawlError, ExtractError};
use crate::fetcher::PageFetcher;
use crate::record_set::RecordSet;
use crate::season::{SeasonWalker, TeamSkip};
use crate::table::{self, HeaderMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    Written { records_written: usize },
    NoData,
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub seasons: Vec<i32>,
    pub teams_scraped: usize,
    pub skips: Vec<TeamSkip>,
}

pub fn run_crawl<F: PageFetcher + ?Sized>(
    config: &CrawlConfig,
    fetcher: &F,
) -> Result<CrawlReport, CrawlError> {
    let status_path = config.status_path();
    let harvest = match SeasonWalker::new(fetcher, config).run() {
        Ok(harvest) => harvest,
        Err(err) => return Err(record_abort(&status_path, err)),
    };

    let outcome = match aggregate(&harvest.records) {
        Aggregate::Dataset(data) => {
            if let Err(err) = dataset::write_csv_atomic(&config.output_path, &data.rows) {
                return Err(record_abort(&status_path, CrawlError::Output(err)));
            }
            info!(
                "scraping completed: {} rows from {} teams saved to {}",
                data.rows.len(),
                data.teams,
                config.output_path.display()
            );
            CrawlOutcome::Written {
                records_written: data.rows.len(),
            }
        }
        Aggregate::Empty => {
            error!(
                "no data scraped; {} not written",
                config.output_path.display()
            );
            CrawlOutcome::NoData
        }
    };

    let run_outcome = match &outcome {
        CrawlOutcome::Written { records_written } => RunOutcome::Completed {
            records_written: *records_written,
        },
        CrawlOutcome::NoData => RunOutcome::NoData,
    };
    dataset::save_status(&status_path, &RunStatus::now(run_outcome)).map_err(CrawlError::Output)?;

    Ok(CrawlReport {
        outcome,
        seasons: harvest.seasons,
        teams_scraped: harvest.records.len(),
        skips: harvest.skips,
    })
}

fn record_abort(status_path: &Path, err: CrawlError) -> CrawlError {
    let status = RunStatus::now(RunOutcome::Aborted {
        reason: err.to_string(),
    });
    if let Err(save_err) = dataset::save_status(status_path, &status) {
        warn!("could not record aborted run: {save_err:#}");
    }
    err
}

pub fn list_records(config: &CrawlConfig) -> anyhow::Result<DatasetView> {
    dataset::view(&config.output_path, &config.status_path())
}

pub fn validate_source_url(raw: &str) -> Result<Url, ExtractError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ExtractError::Validation(format!("invalid url {raw:?}: {e}")))?;
    if url.scheme() != "https" || url.host_str() != Some(TRUSTED_HOST) || url.port().is_some() {
        return Err(ExtractError::Validation(format!(
            "only https://{TRUSTED_HOST}/ links are allowed, got {raw:?}"
        )));
    }
    Ok(url)
}

pub fn extract_table<F: PageFetcher + ?Sized>(
    config: &CrawlConfig,
    fetcher: &F,
    source_url: &str,
    identifier: &str,
) -> Result<RecordSet, ExtractError> {
    let url = validate_source_url(source_url)?;
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(ExtractError::Validation(
            "table identifier must not be blank".to_string(),
        ));
    }

    let markup = fetcher.fetch(url.as_str(), config.fetch_timeout)?;
    let rows = table::locate(&markup, identifier, HeaderMode::JoinLevels)?;
    dataset::write_csv_atomic(&config.custom_output_path, &rows).map_err(ExtractError::Output)?;
    info!(
        "extracted {} rows of {identifier:?} from {url} into {}",
        rows.len(),
        config.custom_output_path.display()
    );
    Ok(rows)
}
