use std::fs;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::{Deserialize, Serialize};

use crate::record_set::{Record, RecordSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { records_written: usize },
    NoData,
    Aborted { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    #[serde(flatten)]
    pub outcome: RunOutcome,
    pub finished_at: String,
}

impl RunStatus {
    pub fn now(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetView {
    NotFound,
    Empty,
    Aborted { reason: String, at: String },
    Records(Vec<Record>),
}

pub fn write_csv_atomic(path: &Path, rows: &RecordSet) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = path.with_extension("csv.tmp");
    let written = write_then_swap(&tmp, path, rows);
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_then_swap(tmp: &Path, path: &Path, rows: &RecordSet) -> Result<()> {
    let file = fs::File::create(tmp).with_context(|| format!("create {}", tmp.display()))?;
    rows.write_csv(BufWriter::new(file))
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Option<RecordSet>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rows = RecordSet::read_csv(file).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(rows))
}

pub fn save_status(path: &Path, status: &RunStatus) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(status).context("serialize run status")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn load_status(path: &Path) -> Option<RunStatus> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

pub fn view(csv_path: &Path, status_path: &Path) -> Result<DatasetView> {
    match load_status(status_path) {
        Some(RunStatus {
            outcome: RunOutcome::Aborted { reason },
            finished_at,
        }) => {
            return Ok(DatasetView::Aborted {
                reason,
                at: finished_at,
            });
        }
        Some(RunStatus {
            outcome: RunOutcome::NoData,
            ..
        }) => return Ok(DatasetView::Empty),
        _ => {}
    }

    let Some(rows) = read_csv(csv_path)? else {
        return Ok(DatasetView::NotFound);
    };
    if rows.is_empty() {
        return Ok(DatasetView::Empty);
    }
    Ok(DatasetView::Records(rows.to_json_records()))
}

pub fn export_xlsx(path: &Path, sheet_name: &str, rows: &RecordSet) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &RecordSet) -> Result<()> {
    for (col_idx, name) in rows.columns().iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, name)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    for (idx, row) in rows.rows().iter().enumerate() {
        let row_idx = (idx + 1) as u32;
        for (col_idx, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let written = match value.parse::<f64>() {
                Ok(n) if n.is_finite() => worksheet.write_number(row_idx, col_idx as u16, n),
                _ => worksheet.write_string(row_idx, col_idx as u16, value),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
