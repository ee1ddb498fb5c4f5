//! Test selection and input construction.
//!
//! ANOVA drops missing values independently per column, while Friedman keeps
//! only rows where every chosen column has a value. A long-format ANOVA
//! instead splits one value column by the labels of a grouping column. The
//! numerical work itself lives in [`crate::stats`].

use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::anyhow;
use log::{debug, info};
use thiserror::Error;

use crate::{
    columns::ColumnRef,
    data::{Cell, Table},
    stats::{self, StatsError, TestStatistic},
    table::{format_float, render_table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    Anova,
    Friedman,
    Distribution,
}

impl TestKind {
    pub const MENU: [TestKind; 3] = [TestKind::Anova, TestKind::Friedman, TestKind::Distribution];

    pub fn menu_label(self) -> &'static str {
        match self {
            TestKind::Anova => "One-way ANOVA",
            TestKind::Friedman => "Friedman test (repeated measures)",
            TestKind::Distribution => "Response distribution charts",
        }
    }

    pub fn minimum_columns(self) -> usize {
        match self {
            TestKind::Anova | TestKind::Friedman => 2,
            TestKind::Distribution => 1,
        }
    }
}

impl FromStr for TestKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim() {
            "1" => Ok(TestKind::Anova),
            "2" => Ok(TestKind::Friedman),
            "3" => Ok(TestKind::Distribution),
            other => Err(anyhow!("'{other}' is not a valid test choice")),
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestKind::Anova => "ANOVA",
            TestKind::Friedman => "Friedman test",
            TestKind::Distribution => "Distribution chart",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("{test} requires at least {required} valid column(s) of data, found {found}")]
    TooFewColumns {
        test: TestKind,
        required: usize,
        found: usize,
    },
    #[error("no complete rows remain across columns {columns}")]
    NoCompleteRows { columns: String },
    #[error("column '{column}' contains non-numeric value '{value}'")]
    NonNumeric { column: String, value: String },
    #[error("{0} is not a hypothesis test")]
    NotATest(TestKind),
    #[error("{0}")]
    Numerical(#[from] StatsError),
}

pub fn require_columns(kind: TestKind, columns: &[ColumnRef]) -> Result<(), DispatchError> {
    let required = kind.minimum_columns();
    let found = columns.len();
    if found < required {
        return Err(DispatchError::TooFewColumns {
            test: kind,
            required,
            found,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveSummary {
    pub column: String,
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

/// Summaries over each column's numeric view; columns without a single
/// numeric value are left out.
pub fn describe_columns(table: &Table, columns: &[ColumnRef]) -> Vec<DescriptiveSummary> {
    columns
        .iter()
        .filter_map(|column| {
            let values = table
                .column(column.index)
                .iter()
                .filter_map(Cell::as_number)
                .collect::<Vec<_>>();
            (!values.is_empty()).then(|| DescriptiveSummary {
                column: column.name.clone(),
                mean: stats::mean(&values),
                std_dev: stats::sample_std_dev(&values),
                count: values.len(),
            })
        })
        .collect()
}

/// Summaries for already-split groups, labelled by group.
pub fn describe_groups(groups: &[(String, Vec<f64>)]) -> Vec<DescriptiveSummary> {
    groups
        .iter()
        .map(|(label, values)| DescriptiveSummary {
            column: label.clone(),
            mean: stats::mean(values),
            std_dev: stats::sample_std_dev(values),
            count: values.len(),
        })
        .collect()
}

pub fn render_summaries(summaries: &[DescriptiveSummary]) -> String {
    let headers = ["column", "mean", "std_dev", "count"].map(String::from);
    let rows = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.column.clone(),
                format_float(summary.mean),
                format_float(summary.std_dev),
                summary.count.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

fn numeric_value(column: &ColumnRef, cell: &Cell) -> Result<f64, DispatchError> {
    match cell {
        Cell::Number(value) => Ok(*value),
        other => Err(DispatchError::NonNumeric {
            column: column.name.clone(),
            value: other.as_display(),
        }),
    }
}

/// One group per column from the loaded cells, missing values dropped.
pub fn anova_groups(table: &Table, columns: &[ColumnRef]) -> Result<Vec<Vec<f64>>, DispatchError> {
    columns
        .iter()
        .map(|column| {
            table
                .column(column.index)
                .iter()
                .filter(|cell| !cell.is_missing())
                .map(|cell| numeric_value(column, cell))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

/// Rows where every chosen column holds a value, one value per column.
pub fn friedman_rows(table: &Table, columns: &[ColumnRef]) -> Result<Vec<Vec<f64>>, DispatchError> {
    let mut rows = Vec::new();
    for row_idx in 0..table.row_count() {
        let cells = columns
            .iter()
            .map(|column| (column, &table.column(column.index)[row_idx]))
            .collect::<Vec<_>>();
        if cells.iter().any(|(_, cell)| cell.is_missing()) {
            continue;
        }
        rows.push(
            cells
                .into_iter()
                .map(|(column, cell)| numeric_value(column, cell))
                .collect::<Result<Vec<_>, _>>()?,
        );
    }
    debug!(
        "{} of {} row(s) complete across {} column(s)",
        rows.len(),
        table.row_count(),
        columns.len()
    );
    if rows.is_empty() {
        return Err(DispatchError::NoCompleteRows {
            columns: columns
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(rows)
}

/// Splits `value` by the labels found in `group`, in label order. Rows with
/// a missing label or a missing value are dropped.
pub fn group_values(
    table: &Table,
    group: &ColumnRef,
    value: &ColumnRef,
) -> Result<Vec<(String, Vec<f64>)>, DispatchError> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let labels = table.column(group.index);
    for (label, cell) in labels.iter().zip(table.column(value.index)) {
        if label.is_missing() || cell.is_missing() {
            continue;
        }
        groups
            .entry(label.as_display())
            .or_default()
            .push(numeric_value(value, cell)?);
    }
    debug!("'{value}' split into {} group(s) by '{group}'", groups.len());
    Ok(groups.into_iter().collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    pub kind: TestKind,
    pub outcome: TestStatistic,
    /// Observations across all groups for ANOVA, complete rows for Friedman.
    pub sample_size: usize,
}

impl TestReport {
    pub fn result_line(&self) -> String {
        match self.kind {
            TestKind::Friedman => format!(
                "Friedman statistic: {}, p-value: {} ({} complete row(s))",
                self.outcome.statistic, self.outcome.p_value, self.sample_size
            ),
            _ => format!(
                "F-statistic: {}, p-value: {}",
                self.outcome.statistic, self.outcome.p_value
            ),
        }
    }
}

/// Runs ANOVA or Friedman over the chosen columns. Distribution charts are
/// handled by [`crate::distribution`] and are rejected here.
pub fn run_test(
    kind: TestKind,
    table: &Table,
    columns: &[ColumnRef],
) -> Result<TestReport, DispatchError> {
    require_columns(kind, columns)?;
    let report = match kind {
        TestKind::Anova => anova_report(&anova_groups(table, columns)?)?,
        TestKind::Friedman => {
            let rows = friedman_rows(table, columns)?;
            TestReport {
                kind,
                outcome: stats::friedman(&rows)?,
                sample_size: rows.len(),
            }
        }
        TestKind::Distribution => return Err(DispatchError::NotATest(kind)),
    };
    info!(
        "{kind} over {} column(s): statistic {}, p-value {}",
        columns.len(),
        report.outcome.statistic,
        report.outcome.p_value
    );
    Ok(report)
}

/// One-way ANOVA of a single value column split by a grouping column.
pub fn anova_by_group(
    table: &Table,
    group: &ColumnRef,
    value: &ColumnRef,
) -> Result<TestReport, DispatchError> {
    let groups = group_values(table, group, value)?
        .into_iter()
        .map(|(_, values)| values)
        .collect::<Vec<_>>();
    let report = anova_report(&groups)?;
    info!(
        "ANOVA of '{value}' by '{group}': statistic {}, p-value {}",
        report.outcome.statistic, report.outcome.p_value
    );
    Ok(report)
}

fn anova_report(groups: &[Vec<f64>]) -> Result<TestReport, DispatchError> {
    Ok(TestReport {
        kind: TestKind::Anova,
        outcome: stats::f_oneway(groups)?,
        sample_size: groups.iter().map(Vec::len).sum(),
    })
}
