//! Response distributions for single- and multi-select questions.
//!
//! Cells may hold several comma-separated choices; each choice is tallied on
//! its own. Charts are drawn either as text bars on the console or as SVG
//! files under the chart directory.

use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use log::{info, warn};
use plotters::prelude::*;

use crate::{
    columns::ColumnRef,
    data::{Cell, Table},
    table::render_table,
};

pub const DEFAULT_CHART_DIR: &str = "output";
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutput {
    Display,
    File { dir: PathBuf },
}

/// Counts per response, highest first; equal counts keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseTally {
    entries: Vec<(String, usize)>,
}

impl ResponseTally {
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.entries.first().map_or(0, |(_, count)| *count)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn tally_responses(cells: &[Cell]) -> ResponseTally {
    let mut entries: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for cell in cells.iter().filter(|cell| !cell.is_missing()) {
        let text = cell.as_display();
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match positions.get(token) {
                Some(&position) => entries[position].1 += 1,
                None => {
                    positions.insert(token.to_string(), entries.len());
                    entries.push((token.to_string(), 1));
                }
            }
        }
    }
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    ResponseTally { entries }
}

pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

pub fn chart_file_name(column: &str, generated_at: NaiveDateTime) -> String {
    format!(
        "{}_{}.svg",
        sanitize_file_stem(column),
        generated_at.format("%Y%m%d%H%M%S")
    )
}

pub fn render_text_chart(column: &str, tally: &ResponseTally) -> String {
    let total = tally.total();
    let max = tally.max_count().max(1);
    let headers = ["response", "", "count", "percent"].map(String::from);
    let rows = tally
        .entries()
        .iter()
        .map(|(value, count)| {
            let bar = "#".repeat((count * BAR_WIDTH).div_ceil(max));
            let percent = (*count as f64 / total as f64) * 100.0;
            vec![
                value.clone(),
                bar,
                count.to_string(),
                format!("{percent:.2}%"),
            ]
        })
        .collect::<Vec<_>>();
    format!(
        "Responses for '{column}' ({total} total)\n{}",
        render_table(&headers, &rows)
    )
}

/// Tallies and charts each column. A column without data or whose chart
/// cannot be written is reported and skipped. Returns the files written.
pub fn report_distributions<W: Write>(
    table: &Table,
    columns: &[ColumnRef],
    output: &ChartOutput,
    out: &mut W,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for column in columns {
        let tally = tally_responses(table.column(column.index));
        if tally.is_empty() {
            writeln!(out, "No data available for column '{}'", column.name)?;
            continue;
        }
        match output {
            ChartOutput::Display => {
                writeln!(out, "{}", render_text_chart(&column.name, &tally))?;
            }
            ChartOutput::File { dir } => match save_chart(dir, &column.name, &tally) {
                Ok(path) => {
                    writeln!(out, "Saved chart for '{}' to {}", column.name, path.display())?;
                    written.push(path);
                }
                Err(err) => {
                    warn!("Chart for column '{}' failed: {err:#}", column.name);
                    writeln!(
                        out,
                        "Error generating chart for column '{}': {err:#}",
                        column.name
                    )?;
                }
            },
        }
    }
    info!(
        "Reported distributions for {} column(s), {} chart file(s) written",
        columns.len(),
        written.len()
    );
    Ok(written)
}

fn save_chart(dir: &Path, column: &str, tally: &ResponseTally) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Creating chart directory {dir:?}"))?;
    let path = unique_path(dir, &chart_file_name(column, Local::now().naive_local()));
    draw_bar_chart(&path, column, tally).with_context(|| format!("Drawing chart {path:?}"))?;
    Ok(path)
}

// Columns that sanitize to the same stem within one second get a counter.
fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = file_name.trim_end_matches(".svg");
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}.svg")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn draw_bar_chart(path: &Path, column: &str, tally: &ResponseTally) -> Result<()> {
    let labels = tally
        .entries()
        .iter()
        .map(|(value, _)| value.as_str())
        .collect::<Vec<_>>();
    let root = SVGBackend::new(path, (1024, 640)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Responses for {column}"), ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(
            (0u32..labels.len() as u32).into_segmented(),
            0u32..tally.max_count() as u32 + 1,
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_desc("Response")
        .y_desc("Count")
        .x_label_formatter(&|segment| match segment {
            SegmentValue::Exact(idx) | SegmentValue::CenterOf(idx) => labels
                .get(*idx as usize)
                .map(|label| label.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.mix(0.6).filled())
            .margin(8)
            .data(
                tally
                    .entries()
                    .iter()
                    .enumerate()
                    .map(|(idx, (_, count))| (idx as u32, *count as u32)),
            ),
    )?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn texts(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::Text(v.to_string())).collect()
    }

    #[test]
    fn tally_splits_multi_select_cells() {
        let tally = tally_responses(&texts(&["Red, Blue", "Blue", "Red"]));
        assert_eq!(tally.total(), 4);
        // Equal counts keep first-seen order.
        assert_eq!(
            tally.entries(),
            [("Red".to_string(), 2), ("Blue".to_string(), 2)]
        );
    }

    #[test]
    fn tally_orders_by_descending_count_and_skips_missing() {
        let mut cells = texts(&["Email", "Phone,Email", " , Email"]);
        cells.push(Cell::Missing);
        cells.push(Cell::Number(3.0));
        let tally = tally_responses(&cells);
        assert_eq!(
            tally.entries(),
            [
                ("Email".to_string(), 3),
                ("Phone".to_string(), 1),
                ("3".to_string(), 1)
            ]
        );
        assert!(tally_responses(&[Cell::Missing]).is_empty());
    }

    #[test]
    fn chart_file_names_are_sanitized_and_timestamped() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(
            chart_file_name("Q5: Favourite colour?", at),
            "Q5__Favourite_colour__20240309140507.svg"
        );
        assert_eq!(sanitize_file_stem("a-b_c/d"), "a-b_c_d");
    }

    #[test]
    fn text_chart_scales_bars_to_largest_count() {
        let tally = tally_responses(&texts(&["Yes", "Yes", "No"]));
        let rendered = render_text_chart("Q1", &tally);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Responses for 'Q1' (3 total)");
        assert!(lines[3].starts_with("Yes"));
        assert!(lines[3].contains(&"#".repeat(BAR_WIDTH)));
        assert!(lines[3].ends_with("66.67%"));
        assert!(lines[4].contains(&"#".repeat(BAR_WIDTH / 2)));
        assert!(!lines[4].contains(&"#".repeat(BAR_WIDTH / 2 + 1)));
    }

    #[test]
    fn report_writes_svg_files_and_skips_empty_columns() {
        let dir = tempdir().expect("temp dir");
        let chart_dir = dir.path().join("output");
        let table = Table::from_columns([
            ("Colour?", texts(&["Red, Blue", "Blue", "Red"])),
            ("Empty", vec![Cell::Missing, Cell::Missing, Cell::Missing]),
        ])
        .unwrap();
        let columns = vec![
            ColumnRef {
                index: 0,
                name: "Colour?".into(),
            },
            ColumnRef {
                index: 1,
                name: "Empty".into(),
            },
        ];
        let mut out = Vec::new();

        let written = report_distributions(
            &table,
            &columns,
            &ChartOutput::File {
                dir: chart_dir.clone(),
            },
            &mut out,
        )
        .expect("report");

        assert_eq!(written.len(), 1);
        let file_name = written[0].file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("Colour__"));
        assert!(file_name.ends_with(".svg"));
        let svg = std::fs::read_to_string(&written[0]).expect("read svg");
        assert!(svg.contains("<svg"));
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("No data available for column 'Empty'"));
        assert!(printed.contains("Saved chart for 'Colour?'"));
    }

    #[test]
    fn chart_failure_is_reported_per_column() {
        let dir = tempdir().expect("temp dir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").expect("write blocker");
        let table = Table::from_columns([("Q1", texts(&["A"])), ("Q2", texts(&["B"]))]).unwrap();
        let columns = vec![
            ColumnRef {
                index: 0,
                name: "Q1".into(),
            },
            ColumnRef {
                index: 1,
                name: "Q2".into(),
            },
        ];
        let mut out = Vec::new();

        let written =
            report_distributions(&table, &columns, &ChartOutput::File { dir: blocker }, &mut out)
                .expect("report continues");

        assert!(written.is_empty());
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Error generating chart for column 'Q1'"));
        assert!(printed.contains("Error generating chart for column 'Q2'"));
    }

    #[test]
    fn unique_path_appends_counter_on_collision() {
        let dir = tempdir().expect("temp dir");
        std::fs::write(dir.path().join("Q1_20240101000000.svg"), "").unwrap();
        assert_eq!(
            unique_path(dir.path(), "Q1_20240101000000.svg"),
            dir.path().join("Q1_20240101000000_1.svg")
        );
    }
}
