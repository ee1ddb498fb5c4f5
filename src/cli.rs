use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::{
    distribution::{ChartOutput, DEFAULT_CHART_DIR},
    io_utils,
    likert::LikertMapping,
    pipeline::{PipelineOptions, SelectBy},
    probe::SkipRows,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Run hypothesis tests and response charts on survey exports",
    long_about = None
)]
pub struct Cli {
    /// Path to the CSV file
    pub file_path: PathBuf,
    /// Convert agreement Likert responses (strongly disagree .. strongly agree) to 1-5
    #[arg(long)]
    pub likert: bool,
    /// Convert difficulty responses (extremely difficult .. extremely easy) to 1-5
    #[arg(long)]
    pub difficulty: bool,
    /// Convert frequency responses (always .. never) to 1-5
    #[arg(long)]
    pub frequency: bool,
    /// Select columns by their number in the listing instead of by name
    #[arg(long = "by-number")]
    pub by_number: bool,
    /// For ANOVA, split each chosen column by the values of this grouping column
    #[arg(long = "group-column", value_name = "COLUMN")]
    pub group_column: Option<String>,
    /// Save charts as files instead of printing them
    #[arg(long = "save-charts")]
    pub save_charts: bool,
    /// Directory for saved charts
    #[arg(long = "output-dir", default_value = DEFAULT_CHART_DIR)]
    pub output_dir: PathBuf,
    /// Rows to skip after the header, or `auto` to detect them (prompts when omitted)
    #[arg(long = "skip-rows")]
    pub skip_rows: Option<SkipRows>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl Cli {
    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        Ok(PipelineOptions {
            input: self.file_path.clone(),
            skip_rows: self.skip_rows,
            likert: LikertMapping::from_flags(self.likert, self.difficulty, self.frequency),
            select_by: if self.by_number {
                SelectBy::Ordinal
            } else {
                SelectBy::Name
            },
            group_column: self.group_column.clone(),
            chart_output: if self.save_charts {
                ChartOutput::File {
                    dir: self.output_dir.clone(),
                }
            } else {
                ChartOutput::Display
            },
            delimiter: io_utils::resolve_input_delimiter(&self.file_path, self.delimiter),
            encoding: io_utils::resolve_encoding(self.input_encoding.as_deref())?,
        })
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
