#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fbref_matches::{CrawlConfig, FetchError, PageFetcher};

pub const STANDINGS_2022: &str = "https://fbref.com/en/comps/9/Premier-League-Stats";
pub const STANDINGS_2021: &str =
    "https://fbref.com/en/comps/9/2021-2022/2021-2022-Premier-League-Stats";
pub const STANDINGS_2020: &str =
    "https://fbref.com/en/comps/9/2020-2021/2020-2021-Premier-League-Stats";

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Serves canned pages by exact URL and remembers every request.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, markup: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(markup.into()));
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Err(FetchError::Timeout {
                url: url.to_string(),
                after: Duration::from_secs(60),
            }),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PageFetcher for ScriptedFetcher {
    fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::Navigation {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            })
        })
    }
}

pub fn standings_page(previous: Option<&str>, squads: &[&str]) -> String {
    let prev = previous
        .map(|href| format!(r#"<div class="prevnext"><a class="button2 prev" href="{href}">Previous Season</a></div>"#))
        .unwrap_or_default();
    let rows: String = squads
        .iter()
        .enumerate()
        .map(|(idx, href)| {
            format!(
                r#"<tr><th>{}</th><td><a href="{href}">squad</a></td><td>38</td></tr>"#,
                idx + 1
            )
        })
        .collect();
    format!(
        r#"<html><body>{prev}
        <table class="stats_table" id="results_overall"><caption>Regular season Table</caption>
        <thead><tr><th>Rk</th><th>Squad</th><th>MP</th></tr></thead>
        <tbody>{rows}</tbody></table></body></html>"#
    )
}

/// Team page with a fixtures table of `(date, comp, opponent)` rows.
pub fn team_page(shooting_href: Option<&str>, fixtures: &[(&str, &str, &str)]) -> String {
    let nav = shooting_href
        .map(|href| format!(r#"<ul id="inner_nav"><li><a href="{href}">Shooting</a></li></ul>"#))
        .unwrap_or_default();
    let rows: String = fixtures
        .iter()
        .map(|(date, comp, opponent)| {
            format!(
                "<tr><th>{date}</th><td>{comp}</td><td>Home</td><td>W</td><td>{opponent}</td></tr>"
            )
        })
        .collect();
    format!(
        r#"<html><body>{nav}
        <table class="stats_table" id="matchlogs_for"><caption>Scores &amp; Fixtures 2022-2023 All Competitions</caption>
        <thead><tr><th>Date</th><th>Comp</th><th>Venue</th><th>Result</th><th>Opponent</th></tr></thead>
        <tbody>{rows}</tbody></table></body></html>"#
    )
}

/// Shooting page with a two-level header; `(date, shots)` per row.
pub fn shooting_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(date, shots)| {
            format!(
                "<tr><th>{date}</th><td>Premier League</td><td>{shots}</td><td>4</td><td>16.1</td><td>0</td><td>0</td><td>0</td></tr>"
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <table class="stats_table" id="matchlogs_for"><caption>Shooting 2022-2023 All Competitions</caption>
        <thead>
          <tr class="over_header"><th colspan="2"></th><th colspan="6">Standard</th></tr>
          <tr><th>Date</th><th>Comp</th><th>Sh</th><th>SoT</th><th>Dist</th><th>FK</th><th>PK</th><th>PKatt</th></tr>
        </thead>
        <tbody>{body}</tbody></table></body></html>"#
    )
}

pub fn shooting_href(team: &str) -> String {
    format!("/en/squads/{team}/matchlogs/all_comps/shooting/{team}-Match-Logs")
}

pub fn absolute(href: &str) -> String {
    format!("https://fbref.com{href}")
}

static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "fbref_matches_{label}_{}_{}",
        std::process::id(),
        DIR_SEQ.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// One-season crawl writing into `dir`, without politeness delays.
pub fn test_config(dir: &Path) -> CrawlConfig {
    CrawlConfig {
        standings_url: STANDINGS_2022.to_string(),
        season_start: 2022,
        season_end: 2021,
        team_delay: Duration::ZERO,
        output_path: dir.join("matches.csv"),
        custom_output_path: dir.join("custom_data.csv"),
        ..CrawlConfig::default()
    }
}
