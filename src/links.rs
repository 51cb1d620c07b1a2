use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPattern {
    pub scope: Option<&'static str>,
    pub anchor: &'static str,
    pub href_contains: Option<&'static str>,
}

pub const SQUAD_LINKS: LinkPattern = LinkPattern {
    scope: Some("table.stats_table"),
    anchor: "a",
    href_contains: Some("/squads/"),
};

pub const SHOOTING_LINKS: LinkPattern = LinkPattern {
    scope: None,
    anchor: "a",
    href_contains: Some("all_comps/shooting/"),
};

pub const PREVIOUS_SEASON: LinkPattern = LinkPattern {
    scope: None,
    anchor: "a.prev",
    href_contains: None,
};

/// Hrefs matching `pattern` in document order. Runs of the same href are
/// collapsed to one; repeats further apart are kept.
pub fn extract(markup: &str, pattern: &LinkPattern) -> Vec<String> {
    let (anchor, scope) = match compile(pattern) {
        Ok(selectors) => selectors,
        Err(err) => {
            warn!("invalid link pattern {pattern:?}: {err}");
            return Vec::new();
        }
    };

    let document = Html::parse_document(markup);
    let hrefs: Vec<&str> = match scope {
        Some(scope) => {
            let Some(root) = document.select(&scope).next() else {
                return Vec::new();
            };
            root.select(&anchor)
                .filter_map(|a| a.value().attr("href"))
                .collect()
        }
        None => document
            .select(&anchor)
            .filter_map(|a| a.value().attr("href"))
            .collect(),
    };

    let mut out: Vec<String> = hrefs
        .into_iter()
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter(|href| pattern.href_contains.is_none_or(|needle| href.contains(needle)))
        .map(str::to_string)
        .collect();
    out.dedup();
    out
}

pub fn resolve(base: &Url, href: &str) -> Result<Url, url::ParseError> {
    base.join(href)
}

fn compile(pattern: &LinkPattern) -> Result<(Selector, Option<Selector>), String> {
    let anchor = Selector::parse(pattern.anchor).map_err(|e| e.to_string())?;
    let scope = pattern
        .scope
        .map(Selector::parse)
        .transpose()
        .map_err(|e| e.to_string())?;
    Ok((anchor, scope))
}
