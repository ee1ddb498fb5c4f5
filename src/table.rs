//! Plain-text table rendering for console reports.
//!
//! Columns are padded to their widest cell and separated by two spaces.
//! Numeric cells are right-aligned so statistics line up on the decimal
//! side; everything else is left-aligned.

use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();

    let header_line = format_row(headers, &widths, |_| Align::Left);
    let _ = writeln!(output, "{header_line}");

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let separator_line = format_row(&separator_cells, &separator_widths, |_| Align::Left);
    let _ = writeln!(output, "{separator_line}");

    for row in rows {
        let row_line = format_row(row, &widths, alignment_for);
        let _ = writeln!(output, "{row_line}");
    }

    output
}

pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.4}")
    }
}

fn alignment_for(cell: &str) -> Align {
    let trimmed = cell.trim().trim_end_matches('%');
    if !trimmed.is_empty() && trimmed.parse::<f64>().is_ok() {
        Align::Right
    } else {
        Align::Left
    }
}

fn format_row(values: &[String], widths: &[usize], align: impl Fn(&str) -> Align) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        let Some(width) = widths.get(idx).copied() else {
            break;
        };
        let sanitized = sanitize_cell(value);
        let padding = " ".repeat(width.saturating_sub(display_width(sanitized.as_ref())));
        let cell = match align(sanitized.as_ref()) {
            Align::Left => format!("{sanitized}{padding}"),
            Align::Right => format!("{padding}{sanitized}"),
        };
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape sequence (e.g. \x1b[31m)
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(
            value
                .chars()
                .map(|ch| match ch {
                    '\n' | '\r' | '\t' => ' ',
                    other => other,
                })
                .collect(),
        )
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn render_table_right_aligns_numbers() {
        let headers = strings(&["column", "mean", "count"]);
        let rows = vec![
            strings(&["Q1", "2.5000", "12"]),
            strings(&["Satisfaction", "10.2500", "3"]),
        ];

        let rendered = render_table(&headers, &rows);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines,
            vec![
                "column        mean     count",
                "------------  -------  -----",
                "Q1             2.5000     12",
                "Satisfaction  10.2500      3",
            ]
        );
    }

    #[test]
    fn render_table_normalizes_control_characters() {
        let headers = strings(&["note"]);
        let rows = vec![strings(&["line1\nline2\tvalue"])];

        let rendered = render_table(&headers, &rows);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "line1 line2 value");
    }

    #[test]
    fn render_table_ignores_ansi_in_widths() {
        let headers = strings(&["résumé", "status"]);
        let rows = vec![strings(&["café", "\u{1b}[31mERR\u{1b}[0m"])];

        let rendered = render_table(&headers, &rows);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "résumé  status");
        assert_eq!(lines[2], "café    \u{1b}[31mERR\u{1b}[0m");
    }

    #[test]
    fn format_float_handles_degenerate_values() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(0.123456), "0.1235");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }
}
