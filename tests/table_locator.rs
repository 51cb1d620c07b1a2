mod common;

use common::fixture;
use fbref_matches::TableError;
use fbref_matches::links::{self, PREVIOUS_SEASON, SHOOTING_LINKS, SQUAD_LINKS};
use fbref_matches::table::{self, HeaderMode};

#[test]
fn standings_page_yields_squads_in_table_order() {
    let html = fixture("standings.html");
    let squads = links::extract(&html, &SQUAD_LINKS);
    assert_eq!(
        squads,
        [
            "/en/squads/b8fd03ef/Manchester-City-Stats",
            "/en/squads/18bb7c10/Arsenal-Stats",
            "/en/squads/822bd0ba/Liverpool-Stats",
        ]
    );
    assert_eq!(
        links::extract(&html, &PREVIOUS_SEASON),
        ["/en/comps/9/2021-2022/2021-2022-Premier-League-Stats"]
    );
}

#[test]
fn team_page_has_a_single_shooting_link() {
    let html = fixture("team_page.html");
    let hrefs = links::extract(&html, &SHOOTING_LINKS);
    assert_eq!(hrefs.len(), 1);
    assert!(hrefs[0].ends_with("Manchester-City-Match-Logs-All-Competitions"));
}

#[test]
fn fixtures_table_drops_spacer_rows() {
    let html = fixture("team_page.html");
    let set = table::locate(&html, "Scores & Fixtures", HeaderMode::InnerLevel).unwrap();
    assert_eq!(set.columns().len(), 19);
    assert_eq!(set.columns()[0], "Date");
    assert_eq!(set.len(), 4);
    assert_eq!(set.value(0, "Opponent"), Some("West Ham"));
    assert_eq!(set.value(2, "Comp"), Some("Champions Lg"));
}

#[test]
fn shooting_table_uses_inner_header_names() {
    let html = fixture("shooting_page.html");
    let set = table::locate(&html, "Shooting", HeaderMode::InnerLevel).unwrap();
    assert_eq!(set.columns().len(), 26);
    for name in ["Date", "Sh", "SoT", "Dist", "FK", "PK", "PKatt", "npxG"] {
        assert!(set.column_index(name).is_some(), "missing {name}");
    }
    assert!(set.columns().iter().all(|c| !c.starts_with("Unnamed")));
    // four matches plus the totals footer
    assert_eq!(set.len(), 5);
    assert_eq!(set.value(4, "Sh"), Some("72"));
}

#[test]
fn joined_header_levels_prefix_group_names() {
    let html = fixture("shooting_page.html");
    let set = table::locate(&html, "Shooting", HeaderMode::JoinLevels).unwrap();
    assert_eq!(set.columns()[0], "Date");
    assert!(set.column_index("Standard Sh").is_some());
    assert!(set.column_index("Expected xG").is_some());
    assert!(set.column_index("Match Report").is_some());
}

#[test]
fn divider_rows_inside_body_are_not_data() {
    let html = fixture("team_page.html");
    let set = table::locate(&html, "Standard Stats", HeaderMode::InnerLevel).unwrap();
    assert_eq!(set.column_values("Player").unwrap(), ["Ederson", "Rodri"]);
}

#[test]
fn unknown_identifier_is_not_found() {
    let html = fixture("standings.html");
    let err = table::locate(&html, "Passing", HeaderMode::InnerLevel).unwrap_err();
    assert_eq!(err, TableError::NotFound("Passing".to_string()));
}

#[test]
fn first_matching_table_wins() {
    let html = r#"<html><body>
        <table><caption>Shooting (For)</caption><thead><tr><th>Date</th><th>Sh</th></tr></thead>
          <tbody><tr><td>2022-08-05</td><td>10</td></tr></tbody></table>
        <table><caption>Shooting (Against)</caption><thead><tr><th>Date</th><th>Sh</th></tr></thead>
          <tbody><tr><td>2022-08-05</td><td>3</td></tr></tbody></table>
      </body></html>"#;
    let set = table::locate(html, "Shooting", HeaderMode::InnerLevel).unwrap();
    assert_eq!(set.value(0, "Sh"), Some("10"));
}

#[test]
fn caption_match_is_case_sensitive() {
    let html = fixture("shooting_page.html");
    assert!(matches!(
        table::locate(&html, "shooting", HeaderMode::InnerLevel),
        Err(TableError::NotFound(_))
    ));
}

#[test]
fn table_with_only_blank_headers_is_malformed() {
    let html = r#"<table><caption>Blank</caption>
        <thead><tr><th></th><th></th></tr></thead>
        <tbody><tr><td>1</td><td>2</td></tr></tbody></table>"#;
    assert!(matches!(
        table::locate(html, "Blank", HeaderMode::InnerLevel),
        Err(TableError::Malformed { .. })
    ));
}

#[test]
fn captions_are_listed_in_document_order() {
    let html = fixture("team_page.html");
    let captions = table::table_captions(&html);
    assert_eq!(captions.len(), 2);
    assert!(captions[0].starts_with("Scores & Fixtures"));
    assert!(captions[1].starts_with("Standard Stats"));
}
