use std::time::Duration;

use percent_encoding::percent_decode_str;
use tracing::{info, warn};
use url::Url;

use crate::error::{Skip, SkipReason, TableError};
use crate::fetcher::PageFetcher;
use crate::links::{self, SHOOTING_LINKS};
use crate::record_set::RecordSet;
use crate::table::{self, HeaderMode};

pub const FIXTURES_TABLE: &str = "Scores & Fixtures";
pub const SHOOTING_TABLE: &str = "Shooting";
pub const JOIN_KEY: &str = "Date";
pub const COMPETITION_COLUMN: &str = "Comp";
pub const SEASON_COLUMN: &str = "Season";
pub const TEAM_COLUMN: &str = "Team";
pub const SHOOTING_COLUMNS: &[&str] = &[JOIN_KEY, "Sh", "SoT", "Dist", "FK", "PK", "PKatt"];

const TEAM_URL_SUFFIX: &str = "-Stats";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamLink {
    pub url: Url,
    pub name: String,
}

impl TeamLink {
    pub fn new(url: Url) -> Self {
        let name = team_name_from_url(&url);
        Self { url, name }
    }
}

/// `.../squads/b8fd03ef/Manchester-City-Stats` -> `Manchester City`.
pub fn team_name_from_url(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .unwrap_or_default();
    percent_decode_str(last)
        .decode_utf8_lossy()
        .replace(TEAM_URL_SUFFIX, "")
        .replace('-', " ")
}

#[derive(Debug, Clone)]
pub struct TeamContext<'a> {
    pub competition: &'a str,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSeasonRecord {
    pub season: i32,
    pub team: String,
    pub rows: RecordSet,
}

pub type TeamOutcome = Result<TeamSeasonRecord, Skip>;

/// Fixtures joined with per-match shooting numbers for one team and season.
/// Every failure comes back as a [`Skip`]; nothing escapes this call.
pub fn build<F: PageFetcher + ?Sized>(
    fetcher: &F,
    ctx: &TeamContext<'_>,
    link: &TeamLink,
    season: i32,
) -> TeamOutcome {
    info!("scraping team {} ({season})", link.name);
    let outcome = build_inner(fetcher, ctx, link, season);
    if let Err(skip) = &outcome {
        warn!("skipping {} ({season}): {skip}", link.name);
    }
    outcome
}

fn build_inner<F: PageFetcher + ?Sized>(
    fetcher: &F,
    ctx: &TeamContext<'_>,
    link: &TeamLink,
    season: i32,
) -> TeamOutcome {
    let team_page = fetcher
        .fetch(link.url.as_str(), ctx.fetch_timeout)
        .map_err(|e| Skip::new(SkipReason::TeamPageFetch, e))?;

    let fixtures = table::locate(&team_page, FIXTURES_TABLE, HeaderMode::InnerLevel)
        .map_err(|e| Skip::new(SkipReason::FixturesTable, e))?;

    let shooting_href = links::extract(&team_page, &SHOOTING_LINKS)
        .into_iter()
        .next()
        .ok_or_else(|| Skip::new(SkipReason::ShootingLink, "no shooting stats link on team page"))?;
    let shooting_url = links::resolve(&link.url, &shooting_href)
        .map_err(|e| Skip::new(SkipReason::ShootingLink, format!("{shooting_href}: {e}")))?;

    let shooting_page = fetcher
        .fetch(shooting_url.as_str(), ctx.fetch_timeout)
        .map_err(|e| Skip::new(SkipReason::ShootingPageFetch, e))?;

    let shooting = table::locate(&shooting_page, SHOOTING_TABLE, HeaderMode::InnerLevel)
        .and_then(|set| {
            set.select(SHOOTING_COLUMNS)
                .map_err(|e| TableError::Malformed {
                    identifier: SHOOTING_TABLE.to_string(),
                    message: e.to_string(),
                })
        })
        .map_err(|e| Skip::new(SkipReason::ShootingTable, e))?;

    let merged = merge_fixtures_and_shooting(&fixtures, &shooting)?;

    let rows = merged
        .filter_eq(COMPETITION_COLUMN, ctx.competition)
        .map_err(|e| Skip::new(SkipReason::CompetitionColumn, e))?
        .with_constant(SEASON_COLUMN, &season.to_string())
        .with_constant(TEAM_COLUMN, &link.name);

    Ok(TeamSeasonRecord {
        season,
        team: link.name.clone(),
        rows,
    })
}

pub fn merge_fixtures_and_shooting(
    fixtures: &RecordSet,
    shooting: &RecordSet,
) -> Result<RecordSet, Skip> {
    let merged = fixtures
        .inner_join(shooting, JOIN_KEY)
        .map_err(|e| Skip::new(SkipReason::JoinMismatch, e))?;
    if merged.is_empty() {
        return Err(Skip::new(
            SkipReason::JoinMismatch,
            format!(
                "no shared dates ({} fixtures, {} shooting rows)",
                fixtures.len(),
                shooting.len()
            ),
        ));
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_name_strips_suffix_and_dashes() {
        let url = Url::parse("https://fbref.com/en/squads/b8fd03ef/Manchester-City-Stats").unwrap();
        assert_eq!(team_name_from_url(&url), "Manchester City");
    }

    #[test]
    fn team_name_ignores_trailing_slash() {
        let url = Url::parse("https://fbref.com/en/squads/18bb7c10/Arsenal-Stats/").unwrap();
        assert_eq!(TeamLink::new(url).name, "Arsenal");
    }

    #[test]
    fn team_name_decodes_non_ascii_slugs() {
        let url = Url::parse("https://fbref.com/en/squads/b1278397/Düsseldorf-Stats").unwrap();
        assert_eq!(url.path_segments().unwrap().last(), Some("D%C3%BCsseldorf-Stats"));
        assert_eq!(team_name_from_url(&url), "Düsseldorf");
    }
}
