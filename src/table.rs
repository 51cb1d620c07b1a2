use scraper::{ElementRef, Html, Selector};

use crate::error::TableError;
use crate::record_set::RecordSet;

const PLACEHOLDER_PREFIX: &str = "Unnamed:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    InnerLevel,
    JoinLevels,
}

/// Parses the first table whose caption contains `identifier`.
pub fn locate(markup: &str, identifier: &str, mode: HeaderMode) -> Result<RecordSet, TableError> {
    let document = Html::parse_document(markup);
    let tables = Selector::parse("table").map_err(|e| TableError::Malformed {
        identifier: identifier.to_string(),
        message: format!("table selector: {e}"),
    })?;

    let table = document
        .select(&tables)
        .find(|table| caption_text(table).is_some_and(|caption| caption.contains(identifier)))
        .ok_or_else(|| TableError::NotFound(identifier.to_string()))?;

    parse_table(table, mode).map_err(|message| TableError::Malformed {
        identifier: identifier.to_string(),
        message,
    })
}

pub fn table_captions(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    let Ok(tables) = Selector::parse("table") else {
        return Vec::new();
    };
    document.select(&tables).filter_map(|t| caption_text(&t)).collect()
}

fn caption_text(table: &ElementRef) -> Option<String> {
    children(*table, "caption").next().map(|c| cell_text(&c))
}

fn parse_table(table: ElementRef, mode: HeaderMode) -> Result<RecordSet, String> {
    let mut header_rows: Vec<ElementRef> = children(table, "thead")
        .flat_map(|head| children(head, "tr"))
        .collect();
    let mut body_rows: Vec<ElementRef> = children(table, "tbody")
        .flat_map(|body| children(body, "tr"))
        .filter(|row| !is_divider_row(row))
        .collect();

    if header_rows.is_empty() {
        let leading = body_rows.iter().take_while(|row| is_header_row(row)).count();
        header_rows = body_rows.drain(..leading).collect();
    }
    body_rows.extend(children(table, "tfoot").flat_map(|foot| children(foot, "tr")));

    if header_rows.is_empty() {
        return Err("no header row".to_string());
    }

    let header_grid = expand_grid(&header_rows);
    let width = header_grid.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Err("header row has no cells".to_string());
    }
    let columns = dedup_names(flatten_header(&header_grid, width, mode));

    let mut rows = expand_grid(&body_rows);
    for (idx, row) in rows.iter_mut().enumerate() {
        if row.len() > width {
            if row[width..].iter().any(|cell| !cell.is_empty()) {
                return Err(format!(
                    "row {} has {} cells but the header has {}",
                    idx + 1,
                    row.len(),
                    width
                ));
            }
            row.truncate(width);
        }
    }

    let mut set = RecordSet::new(columns, rows);
    set.drop_columns_where(|name| name.starts_with(PLACEHOLDER_PREFIX));
    set.drop_empty_rows();
    if set.columns().is_empty() {
        return Err("every column header is empty".to_string());
    }
    Ok(set)
}

fn flatten_header(grid: &[Vec<String>], width: usize, mode: HeaderMode) -> Vec<String> {
    (0..width)
        .map(|col| {
            let levels: Vec<&str> = grid
                .iter()
                .map(|row| row.get(col).map(String::as_str).unwrap_or(""))
                .collect();
            let name = match mode {
                HeaderMode::InnerLevel => levels.last().copied().unwrap_or("").to_string(),
                HeaderMode::JoinLevels => {
                    let mut parts: Vec<&str> = Vec::new();
                    for level in levels.into_iter().filter(|l| !l.is_empty()) {
                        if parts.last() != Some(&level) {
                            parts.push(level);
                        }
                    }
                    parts.join(" ").trim().to_string()
                }
            };
            if name.is_empty() {
                format!("{PLACEHOLDER_PREFIX} {col}")
            } else {
                name
            }
        })
        .collect()
}

fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{name}.{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

fn expand_grid(rows: &[ElementRef]) -> Vec<Vec<String>> {
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    // (column, remaining rows, text) carried down from earlier rows.
    let mut carried: Vec<(usize, usize, String)> = Vec::new();

    for row in rows {
        let mut out: Vec<Option<String>> = Vec::new();
        for (col, remaining, text) in carried.iter_mut() {
            if out.len() <= *col {
                out.resize(*col + 1, None);
            }
            out[*col] = Some(text.clone());
            *remaining -= 1;
        }
        carried.retain(|(_, remaining, _)| *remaining > 0);

        let mut col = 0;
        for cell in row_cells(*row) {
            while out.get(col).is_some_and(Option::is_some) {
                col += 1;
            }
            let text = cell_text(&cell);
            let colspan = span(&cell, "colspan");
            let rowspan = span(&cell, "rowspan");
            for c in col..col + colspan {
                if out.len() <= c {
                    out.resize(c + 1, None);
                }
                out[c] = Some(text.clone());
                if rowspan > 1 {
                    carried.push((c, rowspan - 1, text.clone()));
                }
            }
            col += colspan;
        }
        grid.push(out.into_iter().map(Option::unwrap_or_default).collect());
    }
    grid
}

fn row_cells<'a>(row: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
}

fn is_header_row(row: &ElementRef) -> bool {
    let mut cells = row_cells(*row).peekable();
    cells.peek().is_some() && cells.all(|c| c.value().name() == "th")
}

fn is_divider_row(row: &ElementRef) -> bool {
    row.value().classes().any(|class| class == "thead")
}

fn span(cell: &ElementRef, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, 1000)
}

fn children<'a>(el: ElementRef<'a>, name: &'static str) -> impl Iterator<Item = ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn cell_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
