mod common;

use std::time::Duration;

use common::*;
use fbref_matches::SkipReason;
use fbref_matches::team::{self, TeamContext, TeamLink};
use url::Url;

const SQUAD: &str = "/en/squads/aaaa/Alpha-FC-Stats";

fn ctx() -> TeamContext<'static> {
    TeamContext {
        competition: "Premier League",
        fetch_timeout: Duration::from_secs(5),
    }
}

fn link() -> TeamLink {
    TeamLink::new(Url::parse(&absolute(SQUAD)).unwrap())
}

fn skip_reason(fetcher: &ScriptedFetcher) -> SkipReason {
    team::build(fetcher, &ctx(), &link(), 2022)
        .expect_err("team should be skipped")
        .reason
}

#[test]
fn builds_record_from_fixture_pages() {
    let shooting = "/en/squads/b8fd03ef/2022-2023/matchlogs/all_comps/shooting/Manchester-City-Match-Logs-All-Competitions";
    let fetcher = ScriptedFetcher::new()
        .page(&absolute(SQUAD), fixture("team_page.html"))
        .page(&absolute(shooting), fixture("shooting_page.html"));

    let record = team::build(&fetcher, &ctx(), &link(), 2022).unwrap();
    assert_eq!(record.team, "Alpha FC");
    assert_eq!(record.season, 2022);

    // 08-07 and 08-13 overlap in the league; 09-06 is a cup match, 09-17 has no shooting row.
    let rows = &record.rows;
    assert_eq!(rows.column_values("Date").unwrap(), ["2022-08-07", "2022-08-13"]);
    assert_eq!(rows.column_values("Sh").unwrap(), ["13", "20"]);
    assert_eq!(rows.column_values("PKatt").unwrap(), ["1", "0"]);
    assert_eq!(rows.column_values("Season").unwrap(), ["2022", "2022"]);
    assert_eq!(rows.column_values("Team").unwrap(), ["Alpha FC", "Alpha FC"]);
    assert!(rows.column_index("xG").is_some());
    assert!(rows.column_index("npxG").is_none());
}

#[test]
fn team_page_fetch_failure_is_a_skip() {
    let fetcher = ScriptedFetcher::new().failing(&absolute(SQUAD));
    assert_eq!(skip_reason(&fetcher), SkipReason::TeamPageFetch);
}

#[test]
fn missing_fixtures_table_is_a_skip() {
    let fetcher = ScriptedFetcher::new().page(
        &absolute(SQUAD),
        "<html><body><table><caption>Standard Stats</caption><tr><th>Player</th></tr></table></body></html>",
    );
    assert_eq!(skip_reason(&fetcher), SkipReason::FixturesTable);
}

#[test]
fn missing_shooting_link_is_a_skip() {
    let fetcher = ScriptedFetcher::new().page(
        &absolute(SQUAD),
        team_page(None, &[("2022-08-05", "Premier League", "Bravo Town")]),
    );
    assert_eq!(skip_reason(&fetcher), SkipReason::ShootingLink);
    assert_eq!(fetcher.calls().len(), 1);
}

#[test]
fn shooting_page_without_table_is_a_skip() {
    let href = shooting_href("aaaa");
    let fetcher = ScriptedFetcher::new()
        .page(
            &absolute(SQUAD),
            team_page(Some(&href), &[("2022-08-05", "Premier League", "Bravo Town")]),
        )
        .page(&absolute(&href), "<html><body><p>Loading…</p></body></html>");
    assert_eq!(skip_reason(&fetcher), SkipReason::ShootingTable);
}

#[test]
fn disjoint_dates_are_a_join_mismatch() {
    let href = shooting_href("aaaa");
    let fetcher = ScriptedFetcher::new()
        .page(
            &absolute(SQUAD),
            team_page(Some(&href), &[("2022-08-05", "Premier League", "Bravo Town")]),
        )
        .page(&absolute(&href), shooting_page(&[("2023-01-01", "10")]));
    assert_eq!(skip_reason(&fetcher), SkipReason::JoinMismatch);
}

#[test]
fn merge_keeps_shared_dates_with_columns_from_both_sides() {
    let fixtures = fbref_matches::RecordSet::new(
        vec!["Date".into(), "Opponent".into()],
        vec![
            vec!["d1".into(), "A".into()],
            vec!["d2".into(), "B".into()],
            vec!["d3".into(), "C".into()],
        ],
    );
    let shooting = fbref_matches::RecordSet::new(
        vec!["Date".into(), "Sh".into()],
        vec![
            vec!["d2".into(), "5".into()],
            vec!["d3".into(), "7".into()],
            vec!["d4".into(), "9".into()],
        ],
    );

    let merged = team::merge_fixtures_and_shooting(&fixtures, &shooting).unwrap();
    assert_eq!(merged.columns(), ["Date", "Opponent", "Sh"]);
    assert_eq!(merged.column_values("Date").unwrap(), ["d2", "d3"]);
    assert_eq!(merged.column_values("Opponent").unwrap(), ["B", "C"]);
    assert_eq!(merged.column_values("Sh").unwrap(), ["5", "7"]);
}
