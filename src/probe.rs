//! Detection of the metadata block that survey exports place between the
//! header and the first real response.
//!
//! Exports carry a `Finished` column; the first row holding `TRUE` there is
//! the first genuine response. Every row between the header and that row is
//! metadata (question labels, import identifiers) and is skipped. When the
//! marker cannot be found the exporter's usual two metadata rows are assumed.

use std::{path::Path, str::FromStr};

use anyhow::{Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, warn};

use crate::io_utils::ExportReader;

pub const MARKER_COLUMN: &str = "Finished";
pub const MARKER_VALUE: &str = "TRUE";
pub const DEFAULT_SKIP_ROWS: usize = 2;

/// Number of rows following the header to discard before data begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipRows {
    Auto,
    Fixed(usize),
}

impl SkipRows {
    pub fn resolve(self, path: &Path, delimiter: u8, encoding: &'static Encoding) -> usize {
        match self {
            SkipRows::Fixed(rows) => rows,
            SkipRows::Auto => probe_skip_rows(path, delimiter, encoding),
        }
    }
}

impl FromStr for SkipRows {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(SkipRows::Auto);
        }
        trimmed
            .parse::<usize>()
            .map(SkipRows::Fixed)
            .map_err(|_| {
                anyhow!("Skip rows must be a non-negative number or 'auto', got '{trimmed}'")
            })
    }
}

/// Never fails: any problem reading the file degrades to [`DEFAULT_SKIP_ROWS`].
pub fn probe_skip_rows(path: &Path, delimiter: u8, encoding: &'static Encoding) -> usize {
    match find_first_response(path, delimiter, encoding) {
        Ok(Some(rows)) => {
            debug!("First completed response in {path:?} follows {rows} metadata row(s)");
            rows
        }
        Ok(None) => {
            debug!(
                "No '{MARKER_COLUMN}' = '{MARKER_VALUE}' row found in {path:?}; \
                 skipping {DEFAULT_SKIP_ROWS} row(s)"
            );
            DEFAULT_SKIP_ROWS
        }
        Err(err) => {
            warn!("Probing {path:?} failed ({err:#}); skipping {DEFAULT_SKIP_ROWS} row(s)");
            DEFAULT_SKIP_ROWS
        }
    }
}

fn find_first_response(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Option<usize>> {
    let mut reader = ExportReader::open(path, delimiter, encoding)?;
    let headers = reader.headers()?;
    let Some(marker) = headers.iter().position(|header| header == MARKER_COLUMN) else {
        return Ok(None);
    };

    for row in reader.rows() {
        let row = row?;
        if let Some(field) = row.field(marker)
            && field? == MARKER_VALUE
        {
            return Ok(Some(row.index));
        }
    }
    Ok(None)
}
