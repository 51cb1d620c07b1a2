pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetcher;
pub mod http_cache;
pub mod http_client;
pub mod links;
pub mod logging;
pub mod record_set;
pub mod season;
pub mod service;
pub mod table;
pub mod team;

pub use aggregate::{Aggregate, MatchDataset, aggregate};
pub use config::CrawlConfig;
pub use error::{CrawlError, ExtractError, FetchError, Skip, SkipReason, TableError};
pub use fetcher::{HttpPageFetcher, PageFetcher, RenderedPageFetcher};
pub use record_set::RecordSet;
pub use service::{CrawlOutcome, CrawlReport, extract_table, list_records, run_crawl};
