use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    data::{Table, parse_cell},
    io_utils::ExportReader,
};

/// Reads `path` into a [`Table`]. The first row is the header; the
/// `skip_rows` records that follow it are discarded.
pub fn load_table(
    path: &Path,
    skip_rows: usize,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Table> {
    let mut reader = ExportReader::open(path, delimiter, encoding)?;
    let mut table = Table::new(reader.headers()?);

    for row in reader.rows().skip(skip_rows) {
        let row = row?;
        let cells = row.decode()?.iter().map(|field| parse_cell(field)).collect();
        table
            .push_row(cells)
            .with_context(|| format!("Loading row {}", row.line()))?;
    }

    debug!("Skipped {skip_rows} row(s) after the header of {path:?}");
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(table)
}
