use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out after {}s fetching {url}", .after.as_secs())]
    Timeout { url: String, after: Duration },

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("no table matching {0:?}")]
    NotFound(String),

    #[error("table {identifier:?} is malformed: {message}")]
    Malformed { identifier: String, message: String },
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("standings page for season {season} unavailable: {source}")]
    Standings {
        season: i32,
        #[source]
        source: FetchError,
    },

    #[error("no team links on standings page {url}")]
    NoTeamLinks { url: String },

    #[error("no previous season link on standings page {url}")]
    NoPreviousSeason { url: String },

    #[error("invalid link {href:?} on {page}: {message}")]
    BadLink {
        page: String,
        href: String,
        message: String,
    },

    #[error("writing dataset failed: {0:#}")]
    Output(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("writing extracted table failed: {0:#}")]
    Output(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    TeamPageFetch,
    FixturesTable,
    ShootingLink,
    ShootingPageFetch,
    ShootingTable,
    JoinMismatch,
    CompetitionColumn,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::TeamPageFetch => "team_page_fetch",
            SkipReason::FixturesTable => "fixtures_table",
            SkipReason::ShootingLink => "shooting_link",
            SkipReason::ShootingPageFetch => "shooting_page_fetch",
            SkipReason::ShootingTable => "shooting_table",
            SkipReason::JoinMismatch => "join_mismatch",
            SkipReason::CompetitionColumn => "competition_column",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub reason: SkipReason,
    pub detail: String,
}

impl Skip {
    pub fn new(reason: SkipReason, detail: impl fmt::Display) -> Self {
        Self {
            reason,
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.detail)
    }
}
