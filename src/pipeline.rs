//! The single analysis run: load, select, recode, then test or chart.
//!
//! Only an unreadable input file or closed operator input end the run with
//! an error. Every other problem (unknown columns, too few columns, a
//! failing test or chart) is printed for the operator and the run returns
//! normally.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    columns::{self, ColumnRef, ColumnSpec},
    data::Table,
    dispatch::{self, DescriptiveSummary, TestKind},
    distribution::{self, ChartOutput},
    likert::{self, LikertMapping},
    loader,
    probe::SkipRows,
    prompt::Prompter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectBy {
    Name,
    Ordinal,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: PathBuf,
    /// `None` asks the operator.
    pub skip_rows: Option<SkipRows>,
    pub likert: Option<LikertMapping>,
    pub select_by: SelectBy,
    /// Long-format ANOVA: split each chosen column by this column's labels.
    pub group_column: Option<String>,
    pub chart_output: ChartOutput,
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

pub fn run<R: BufRead, W: Write>(
    options: &PipelineOptions,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let path = options.input.as_path();
    let skip = match options.skip_rows {
        Some(skip) => skip,
        None => prompter.skip_rows()?,
    };
    let skip_rows = skip.resolve(path, options.delimiter, options.encoding);
    if skip == SkipRows::Auto {
        writeln!(
            prompter.output(),
            "Auto-detected {skip_rows} row(s) to skip after the header."
        )?;
    }

    let mut table = loader::load_table(path, skip_rows, options.delimiter, options.encoding)
        .with_context(|| format!("Error reading the CSV file {}", path.display()))?;

    let Some(kind) = prompter.test_kind()? else {
        writeln!(prompter.output(), "Invalid choice. Please select a valid test.")?;
        return Ok(());
    };

    let specs: Vec<ColumnSpec> = match options.select_by {
        SelectBy::Name => prompter.column_names()?,
        SelectBy::Ordinal => prompter.column_ordinals(&table)?,
    };
    let resolution = columns::resolve(&table, &specs);
    if let Some(warning) = resolution.missing_warning() {
        warn!("{} requested column(s) not found", resolution.missing.len());
        writeln!(prompter.output(), "{warning}")?;
    }

    if let Some(mapping) = options.likert {
        let rewritten = likert::normalize_columns(&mut table, &resolution.names(), mapping);
        info!("Recoded {rewritten} column(s) with the {mapping} Likert mapping");
    }

    let out = prompter.output();
    if kind == TestKind::Anova
        && let Some(group) = options.group_column.as_deref()
    {
        return grouped_anova(&table, group, &resolution.valid, out);
    }
    if let Err(err) = dispatch::require_columns(kind, &resolution.valid) {
        writeln!(out, "Error: {err}")?;
        return Ok(());
    }

    match kind {
        TestKind::Anova | TestKind::Friedman => {
            if kind == TestKind::Anova {
                let summaries = dispatch::describe_columns(&table, &resolution.valid);
                write_summaries(out, &summaries)?;
            }
            match dispatch::run_test(kind, &table, &resolution.valid) {
                Ok(report) => writeln!(out, "{}", report.result_line())?,
                Err(err) => {
                    warn!("{kind} failed: {err}");
                    writeln!(out, "Error performing {kind}: {err}")?;
                }
            }
        }
        TestKind::Distribution => {
            let chart_output = &options.chart_output;
            distribution::report_distributions(&table, &resolution.valid, chart_output, out)?;
        }
    }
    Ok(())
}

/// One ANOVA per chosen value column, each split by the labels of `group`.
fn grouped_anova<W: Write>(
    table: &Table,
    group: &str,
    values: &[ColumnRef],
    out: &mut W,
) -> Result<()> {
    let Some(index) = table.column_index(group) else {
        writeln!(out, "Error: grouping column '{group}' was not found")?;
        return Ok(());
    };
    let group = ColumnRef {
        index,
        name: group.to_string(),
    };
    let values = values
        .iter()
        .filter(|value| value.index != group.index)
        .collect::<Vec<_>>();
    if values.is_empty() {
        writeln!(out, "Error: ANOVA by '{group}' requires at least 1 value column")?;
        return Ok(());
    }

    for value in values {
        writeln!(out, "ANOVA of '{value}' grouped by '{group}':")?;
        let outcome = match dispatch::group_values(table, &group, value) {
            Ok(groups) => {
                write_summaries(out, &dispatch::describe_groups(&groups))?;
                dispatch::anova_by_group(table, &group, value)
            }
            Err(err) => Err(err),
        };
        match outcome {
            Ok(report) => writeln!(out, "{}", report.result_line())?,
            Err(err) => {
                warn!("Grouped ANOVA of '{value}' failed: {err}");
                writeln!(out, "Error performing ANOVA: {err}")?;
            }
        }
    }
    Ok(())
}

fn write_summaries<W: Write>(out: &mut W, summaries: &[DescriptiveSummary]) -> Result<()> {
    if summaries.is_empty() {
        return Ok(());
    }
    writeln!(out, "Descriptive statistics:")?;
    write!(out, "{}", dispatch::render_summaries(summaries))?;
    Ok(())
}
