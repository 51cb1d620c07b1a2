use std::thread;
use std::time::Duration;

use rand::Rng;
use rayon::prelude::*;
use tracing::{error, info};
use url::Url;

use crate::config::CrawlConfig;
use crate::error::{CrawlError, Skip};
use crate::fetcher::PageFetcher;
use crate::links::{self, PREVIOUS_SEASON, SQUAD_LINKS};
use crate::team::{self, TeamContext, TeamLink, TeamOutcome, TeamSeasonRecord};

#[derive(Debug)]
pub enum WalkState {
    AwaitingStandings {
        url: Url,
        season_idx: usize,
    },
    EnumeratingTeams {
        season_idx: usize,
        teams: Vec<TeamLink>,
        previous_season: Url,
    },
    Done,
    Failed(CrawlError),
}

impl WalkState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WalkState::Done | WalkState::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSkip {
    pub season: i32,
    pub team: String,
    pub skip: Skip,
}

#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub seasons: Vec<i32>,
    pub records: Vec<TeamSeasonRecord>,
    pub skips: Vec<TeamSkip>,
}

pub struct SeasonWalker<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    config: &'a CrawlConfig,
    seasons: Vec<i32>,
    pool: Option<rayon::ThreadPool>,
}

impl<'a, F: PageFetcher + ?Sized> SeasonWalker<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a CrawlConfig) -> Self {
        Self {
            fetcher,
            config,
            seasons: config.seasons(),
            pool: build_fetch_pool(config.parallelism),
        }
    }

    pub fn initial_state(&self) -> WalkState {
        if self.seasons.is_empty() {
            return WalkState::Done;
        }
        match Url::parse(&self.config.standings_url) {
            Ok(url) => WalkState::AwaitingStandings { url, season_idx: 0 },
            Err(e) => WalkState::Failed(CrawlError::BadLink {
                page: "configuration".to_string(),
                href: self.config.standings_url.clone(),
                message: e.to_string(),
            }),
        }
    }

    pub fn run(&self) -> Result<Harvest, CrawlError> {
        let mut harvest = Harvest::default();
        let mut state = self.initial_state();
        while !state.is_terminal() {
            state = self.step(state, &mut harvest);
        }
        match state {
            WalkState::Failed(err) => {
                error!("crawl aborted: {err}");
                Err(err)
            }
            _ => Ok(harvest),
        }
    }

    pub fn step(&self, state: WalkState, harvest: &mut Harvest) -> WalkState {
        match state {
            WalkState::AwaitingStandings { url, season_idx } => {
                self.discover(url, season_idx)
            }
            WalkState::EnumeratingTeams {
                season_idx,
                teams,
                previous_season,
            } => {
                let season = self.seasons[season_idx];
                self.harvest_teams(season, &teams, harvest);
                harvest.seasons.push(season);
                let next = season_idx + 1;
                if next >= self.seasons.len() {
                    WalkState::Done
                } else {
                    WalkState::AwaitingStandings {
                        url: previous_season,
                        season_idx: next,
                    }
                }
            }
            terminal => terminal,
        }
    }

    fn discover(&self, url: Url, season_idx: usize) -> WalkState {
        let season = self.seasons[season_idx];
        info!("scraping season {season} from {url}");

        let markup = match self.fetcher.fetch(url.as_str(), self.config.fetch_timeout) {
            Ok(markup) => markup,
            Err(source) => return WalkState::Failed(CrawlError::Standings { season, source }),
        };

        let team_hrefs = links::extract(&markup, &SQUAD_LINKS);
        if team_hrefs.is_empty() {
            return WalkState::Failed(CrawlError::NoTeamLinks {
                url: url.to_string(),
            });
        }
        let Some(previous_href) = links::extract(&markup, &PREVIOUS_SEASON).into_iter().next()
        else {
            return WalkState::Failed(CrawlError::NoPreviousSeason {
                url: url.to_string(),
            });
        };

        let mut teams = Vec::with_capacity(team_hrefs.len());
        for href in &team_hrefs {
            match links::resolve(&url, href) {
                Ok(team_url) => teams.push(TeamLink::new(team_url)),
                Err(e) => return bad_link(&url, href, e),
            }
        }
        let previous_season = match links::resolve(&url, &previous_href) {
            Ok(previous) => previous,
            Err(e) => return bad_link(&url, &previous_href, e),
        };

        info!("season {season}: {} teams", teams.len());
        WalkState::EnumeratingTeams {
            season_idx,
            teams,
            previous_season,
        }
    }

    fn harvest_teams(&self, season: i32, teams: &[TeamLink], harvest: &mut Harvest) {
        let ctx = TeamContext {
            competition: &self.config.competition,
            fetch_timeout: self.config.fetch_timeout,
        };
        let build_one = |link: &TeamLink| -> TeamOutcome {
            let outcome = team::build(self.fetcher, &ctx, link, season);
            self.polite_pause();
            outcome
        };

        let outcomes: Vec<TeamOutcome> = on_fetch_pool(self.pool.as_ref(), teams, build_one);

        for (link, outcome) in teams.iter().zip(outcomes) {
            match outcome {
                Ok(record) => harvest.records.push(record),
                Err(skip) => harvest.skips.push(TeamSkip {
                    season,
                    team: link.name.clone(),
                    skip,
                }),
            }
        }
    }

    fn polite_pause(&self) {
        let jitter_ms = self.config.team_delay_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        let pause = self.config.team_delay + jitter;
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }
}

fn bad_link(page: &Url, href: &str, err: url::ParseError) -> WalkState {
    WalkState::Failed(CrawlError::BadLink {
        page: page.to_string(),
        href: href.to_string(),
        message: err.to_string(),
    })
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|idx| format!("fbref-fetch-{idx}"))
        .build()
        .ok()
}

// Indexed collect keeps input order. No pool means sequential, never rayon's global pool.
fn on_fetch_pool<T, R>(
    pool: Option<&rayon::ThreadPool>,
    items: &[T],
    work: impl Fn(&T) -> R + Send + Sync,
) -> Vec<R>
where
    T: Sync,
    R: Send,
{
    match pool {
        Some(pool) => pool.install(|| items.par_iter().map(&work).collect()),
        None => items.iter().map(&work).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pool_runs_sequentially_on_caller() {
        let caller = thread::current().id();
        let out = on_fetch_pool(None, &[1, 2, 3], |n| (*n * 10, thread::current().id()));
        assert_eq!(out.iter().map(|(n, _)| *n).collect::<Vec<_>>(), [10, 20, 30]);
        assert!(out.iter().all(|(_, id)| *id == caller));
    }

    #[test]
    fn pooled_work_stays_on_pool_threads_in_order() {
        let pool = build_fetch_pool(2).unwrap();
        let out = on_fetch_pool(Some(&pool), &[1, 2, 3, 4, 5], |n| {
            (*n, thread::current().name().map(str::to_string))
        });
        assert_eq!(out.iter().map(|(n, _)| *n).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
        assert!(
            out.iter()
                .all(|(_, name)| name.as_deref().is_some_and(|n| n.starts_with("fbref-fetch-")))
        );
    }
}
