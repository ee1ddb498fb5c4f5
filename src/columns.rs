//! Column selection and resolution.
//!
//! Operators pick columns either by literal name or by 1-based position in
//! the listing rendered by [`render_column_listing`]. Both forms become
//! [`ColumnSpec`]s and are resolved against the loaded [`Table`]; names that
//! do not exist are collected rather than treated as fatal.

use std::fmt;

use itertools::Itertools;
use thiserror::Error;

use crate::{data::Table, table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    Name(String),
    /// 1-based position in the column listing.
    Ordinal(usize),
}

impl ColumnSpec {
    fn label(&self) -> String {
        match self {
            ColumnSpec::Name(name) => name.clone(),
            ColumnSpec::Ordinal(ordinal) => format!("#{ordinal}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No column numbers entered")]
    Empty,
    #[error("'{0}' is not a column number")]
    NotANumber(String),
    #[error("Column number {ordinal} is out of range (1-{column_count})")]
    OutOfRange { ordinal: usize, column_count: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub valid: Vec<ColumnRef>,
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn names(&self) -> Vec<String> {
        self.valid.iter().map(|column| column.name.clone()).collect()
    }

    pub fn missing_warning(&self) -> Option<String> {
        if self.missing.is_empty() {
            None
        } else {
            Some(format!(
                "Warning: The following columns were not found and will be ignored: {}",
                self.missing.join(", ")
            ))
        }
    }
}

pub fn parse_column_names(input: &str) -> Vec<ColumnSpec> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| ColumnSpec::Name(name.to_string()))
        .collect()
}

/// Parses a comma-separated list of 1-based column numbers. Any bad token
/// rejects the whole selection.
pub fn parse_column_ordinals(
    input: &str,
    column_count: usize,
) -> Result<Vec<ColumnSpec>, SelectionError> {
    let tokens = input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>();
    if tokens.is_empty() {
        return Err(SelectionError::Empty);
    }
    tokens
        .into_iter()
        .map(|token| {
            let ordinal = token
                .parse::<usize>()
                .map_err(|_| SelectionError::NotANumber(token.to_string()))?;
            if ordinal == 0 || ordinal > column_count {
                return Err(SelectionError::OutOfRange {
                    ordinal,
                    column_count,
                });
            }
            Ok(ColumnSpec::Ordinal(ordinal))
        })
        .collect()
}

pub fn resolve(table: &Table, specs: &[ColumnSpec]) -> Resolution {
    let mut resolution = Resolution::default();
    for spec in specs {
        let index = match spec {
            ColumnSpec::Name(name) => table.column_index(name),
            ColumnSpec::Ordinal(ordinal) => ordinal
                .checked_sub(1)
                .filter(|idx| *idx < table.column_count()),
        };
        match index {
            Some(index) => resolution.valid.push(ColumnRef {
                index,
                name: table.headers()[index].clone(),
            }),
            None => resolution.missing.push(spec.label()),
        }
    }
    resolution.missing = resolution.missing.into_iter().unique().collect();
    resolution
}

pub fn render_column_listing(table: &Table) -> String {
    let headers = vec!["#".to_string(), "column".to_string()];
    let rows = table
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| vec![(idx + 1).to_string(), name.clone()])
        .collect::<Vec<_>>();
    table::render_table(&headers, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;

    fn survey() -> Table {
        Table::from_columns([
            ("Q1", vec![Cell::Number(1.0)]),
            ("Q2", vec![Cell::Number(2.0)]),
            ("Q3 Other", vec![Cell::Missing]),
        ])
        .unwrap()
    }

    fn names(values: &[&str]) -> Vec<ColumnSpec> {
        values
            .iter()
            .map(|value| ColumnSpec::Name(value.to_string()))
            .collect()
    }

    #[test]
    fn parse_column_names_trims_and_drops_blanks() {
        assert_eq!(
            parse_column_names(" Q1 ,Q3 Other,, "),
            names(&["Q1", "Q3 Other"])
        );
    }

    #[test]
    fn parse_column_ordinals_rejects_whole_selection() {
        assert_eq!(
            parse_column_ordinals("1, 3", 3).unwrap(),
            vec![ColumnSpec::Ordinal(1), ColumnSpec::Ordinal(3)]
        );
        assert_eq!(
            parse_column_ordinals("1,0", 3),
            Err(SelectionError::OutOfRange {
                ordinal: 0,
                column_count: 3
            })
        );
        assert_eq!(
            parse_column_ordinals("4", 3),
            Err(SelectionError::OutOfRange {
                ordinal: 4,
                column_count: 3
            })
        );
        assert_eq!(
            parse_column_ordinals("1,two", 3),
            Err(SelectionError::NotANumber("two".into()))
        );
        assert_eq!(parse_column_ordinals(" , ", 3), Err(SelectionError::Empty));
    }

    #[test]
    fn resolve_splits_valid_and_missing_names() {
        let table = survey();
        let resolution = resolve(&table, &names(&["Q2", "Nope", "Q1", "Nope", "Also"]));
        assert_eq!(resolution.names(), vec!["Q2", "Q1"]);
        assert_eq!(resolution.missing, vec!["Nope", "Also"]);
        assert_eq!(
            resolution.missing_warning().unwrap(),
            "Warning: The following columns were not found and will be ignored: Nope, Also"
        );
    }

    #[test]
    fn resolve_maps_ordinals_to_names() {
        let table = survey();
        let specs = parse_column_ordinals("3,1", table.column_count()).unwrap();
        let resolution = resolve(&table, &specs);
        assert_eq!(
            resolution.valid,
            vec![
                ColumnRef {
                    index: 2,
                    name: "Q3 Other".into()
                },
                ColumnRef {
                    index: 0,
                    name: "Q1".into()
                },
            ]
        );
        assert!(resolution.missing_warning().is_none());
    }

    #[test]
    fn column_listing_is_one_based() {
        let listing = render_column_listing(&survey());
        let lines = listing.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "#  column");
        assert_eq!(lines[2], "1  Q1");
        assert_eq!(lines[4], "3  Q3 Other");
    }
}
