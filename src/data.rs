//! In-memory survey table.
//!
//! A [`Table`] is an ordered set of named columns, each holding one [`Cell`]
//! per row. Every column always has the same number of cells; the only
//! mutable access hands out fixed-length slices so the invariant holds.

use std::fmt;

use anyhow::{Result, bail, ensure};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric view of the cell. Text that parses as a finite number counts.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Cell::Missing => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(value) => {
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                    (*value as i64).to_string()
                } else {
                    value.to_string()
                }
            }
            Cell::Missing => "nan".to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn is_missing_token(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    matches!(
        lowered.as_str(),
        "" | "na" | "n/a" | "nan" | "null" | "none" | "#n/a" | "<na>"
    )
}

pub fn parse_cell(raw: &str) -> Cell {
    if is_missing_token(raw) {
        return Cell::Missing;
    }
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Cell::Number(value),
        _ => Cell::Text(raw.to_string()),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        let columns = vec![Vec::new(); headers.len()];
        Self { headers, columns }
    }

    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Cell>)>,
        S: Into<String>,
    {
        let (headers, columns): (Vec<String>, Vec<Vec<Cell>>) = columns
            .into_iter()
            .map(|(name, cells)| (name.into(), cells))
            .unzip();
        if let Some(first) = columns.first() {
            let expected = first.len();
            for (name, cells) in headers.iter().zip(&columns) {
                ensure!(
                    cells.len() == expected,
                    "Column '{name}' has {} row(s), expected {expected}",
                    cells.len()
                );
            }
        }
        Ok(Self { headers, columns })
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.headers.len() {
            bail!(
                "Row has {} field(s) but the header defines {}",
                row.len(),
                self.headers.len()
            );
        }
        for (column, cell) in self.columns.iter_mut().zip(row) {
            column.push(cell);
        }
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn column(&self, index: usize) -> &[Cell] {
        &self.columns[index]
    }

    pub fn column_mut(&mut self, index: usize) -> &mut [Cell] {
        &mut self.columns[index]
    }
}
