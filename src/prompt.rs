//! Operator prompts.
//!
//! [`Prompter`] works over any `BufRead`/`Write` pair so the interactive
//! flow can be driven from tests. End of input while a question is pending
//! is an error; everything else re-prompts or degrades.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use log::{debug, warn};

use crate::{
    columns::{self, ColumnSpec},
    data::Table,
    dispatch::TestKind,
    probe::SkipRows,
};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Reading operator input")?;
        if read == 0 {
            bail!("Input closed while waiting for: {}", question.trim_end());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Blank or unparsable answers fall back to auto-detection.
    pub fn skip_rows(&mut self) -> Result<SkipRows> {
        let answer = self.ask("Number of rows to skip after the header (blank to auto-detect): ")?;
        match answer.parse::<SkipRows>() {
            Ok(skip) => Ok(skip),
            Err(err) => {
                warn!("{err}; auto-detecting instead");
                writeln!(self.output, "{err}; auto-detecting instead.")?;
                Ok(SkipRows::Auto)
            }
        }
    }

    /// `None` when the answer is not one of the menu entries.
    pub fn test_kind(&mut self) -> Result<Option<TestKind>> {
        writeln!(self.output, "Select the statistical test you want to perform:")?;
        for (idx, kind) in TestKind::MENU.iter().enumerate() {
            writeln!(self.output, "{}. {}", idx + 1, kind.menu_label())?;
        }
        let answer = self.ask("Enter the number of your choice: ")?;
        Ok(answer.parse::<TestKind>().ok())
    }

    pub fn column_names(&mut self) -> Result<Vec<ColumnSpec>> {
        let answer = self.ask("Enter the column names separated by commas: ")?;
        let specs = columns::parse_column_names(&answer);
        debug!("Requested columns: {specs:?}");
        Ok(specs)
    }

    /// Lists the table's columns and asks until every number is in range.
    pub fn column_ordinals(&mut self, table: &Table) -> Result<Vec<ColumnSpec>> {
        writeln!(self.output, "Available columns:")?;
        write!(self.output, "{}", columns::render_column_listing(table))?;
        loop {
            let answer = self.ask("Enter the column numbers separated by commas: ")?;
            match columns::parse_column_ordinals(&answer, table.column_count()) {
                Ok(specs) => {
                    debug!("Requested column numbers: {specs:?}");
                    return Ok(specs);
                }
                Err(err) => writeln!(self.output, "Invalid selection: {err}. Please try again.")?,
            }
        }
    }
}
