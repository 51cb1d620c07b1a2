use std::borrow::Borrow;
use std::collections::HashMap;
use std::io::{Read, Write};

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("missing column {0:?}")]
pub struct MissingColumn(pub String);

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    pub fn column_values(&self, column: &str) -> Result<Vec<&str>, MissingColumn> {
        let idx = self.require(column)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    fn require(&self, column: &str) -> Result<usize, MissingColumn> {
        self.column_index(column)
            .ok_or_else(|| MissingColumn(column.to_string()))
    }

    pub fn drop_columns_where(&mut self, mut drop: impl FnMut(&str) -> bool) {
        let keep: Vec<bool> = self.columns.iter().map(|c| !drop(c)).collect();
        if keep.iter().all(|k| *k) {
            return;
        }
        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
    }

    pub fn drop_empty_rows(&mut self) {
        self.rows
            .retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
    }

    pub fn select(&self, columns: &[&str]) -> Result<RecordSet, MissingColumn> {
        let indices = columns
            .iter()
            .map(|c| self.require(c))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(RecordSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Inner join on `key`. Output follows left row order; every matching
    /// right row is emitted in its own order. Non-key columns present on
    /// both sides get `_x` / `_y` suffixes.
    pub fn inner_join(&self, right: &RecordSet, key: &str) -> Result<RecordSet, MissingColumn> {
        let left_key = self.require(key)?;
        let right_key = right.require(key)?;

        let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, row) in right.rows.iter().enumerate() {
            by_key.entry(row[right_key].as_str()).or_default().push(idx);
        }

        let right_cols: Vec<usize> = (0..right.columns.len())
            .filter(|&i| i != right_key)
            .collect();
        let mut columns = Vec::with_capacity(self.columns.len() + right_cols.len());
        for (i, name) in self.columns.iter().enumerate() {
            let clashes = i != left_key
                && right_cols.iter().any(|&j| right.columns[j] == *name);
            columns.push(if clashes {
                format!("{name}_x")
            } else {
                name.clone()
            });
        }
        for &j in &right_cols {
            let name = &right.columns[j];
            let clashes = self
                .columns
                .iter()
                .enumerate()
                .any(|(i, c)| i != left_key && c == name);
            columns.push(if clashes {
                format!("{name}_y")
            } else {
                name.clone()
            });
        }

        let mut rows = Vec::new();
        for left_row in &self.rows {
            let Some(matches) = by_key.get(left_row[left_key].as_str()) else {
                continue;
            };
            for &m in matches {
                let mut row = left_row.clone();
                row.extend(right_cols.iter().map(|&j| right.rows[m][j].clone()));
                rows.push(row);
            }
        }
        Ok(RecordSet { columns, rows })
    }

    pub fn filter_eq(&self, column: &str, value: &str) -> Result<RecordSet, MissingColumn> {
        let idx = self.require(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row[idx] == value)
            .cloned()
            .collect();
        Ok(RecordSet {
            columns: self.columns.clone(),
            rows,
        })
    }

    pub fn with_constant(mut self, column: &str, value: &str) -> RecordSet {
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
        self
    }

    pub fn concat<S: Borrow<RecordSet>>(sets: &[S]) -> RecordSet {
        let mut columns: Vec<String> = Vec::new();
        for set in sets {
            for name in &set.borrow().columns {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(sets.iter().map(|s| s.borrow().rows.len()).sum());
        for set in sets {
            let set = set.borrow();
            let positions: Vec<usize> = set
                .columns
                .iter()
                .filter_map(|name| columns.iter().position(|c| c == name))
                .collect();
            for row in &set.rows {
                let mut out = vec![String::new(); columns.len()];
                for (cell, &pos) in row.iter().zip(&positions) {
                    out[pos] = cell.clone();
                }
                rows.push(out);
            }
        }
        RecordSet { columns, rows }
    }

    pub fn lowercase_columns(&mut self) {
        for name in &mut self.columns {
            *name = name.to_lowercase();
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.columns)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn read_csv<R: Read>(reader: R) -> csv::Result<RecordSet> {
        let mut input = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let columns: Vec<String> = input.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in input.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(RecordSet::new(columns, rows))
    }

    pub fn to_json_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), json_cell(cell)))
                    .collect()
            })
            .collect()
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, k)| k.then_some(item))
        .collect()
}

fn json_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(cell.to_string())
}
