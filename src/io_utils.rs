//! Reading survey exports from disk.
//!
//! Exports are read as raw byte records and decoded field by field with the
//! configured `encoding_rs` encoding, so a probe that only inspects one
//! column never pays for decoding the rest of the row.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::ByteRecord;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Looks up an encoding label such as `windows-1252`; no label means UTF-8.
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label.map(str::trim) {
        None => Ok(UTF_8),
        Some(value) => Encoding::for_label(value.as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
    }
}

/// An explicit delimiter wins; otherwise `.tsv` exports are tab separated
/// and everything else is comma separated.
pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    if let Some(delimiter) = provided {
        return delimiter;
    }
    let is_tsv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
    if is_tsv {
        DEFAULT_TSV_DELIMITER
    } else {
        DEFAULT_CSV_DELIMITER
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(anyhow!("Field is not valid {} text", encoding.name()));
    }
    Ok(text.into_owned())
}

/// A header-first export opened for sequential reading.
pub struct ExportReader {
    path: PathBuf,
    inner: csv::Reader<BufReader<File>>,
    encoding: &'static Encoding,
}

impl ExportReader {
    pub fn open(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
        let inner = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .double_quote(true)
            .flexible(false)
            .from_reader(BufReader::new(file));
        Ok(Self {
            path: path.to_path_buf(),
            inner,
            encoding,
        })
    }

    pub fn headers(&mut self) -> Result<Vec<String>> {
        let encoding = self.encoding;
        let record = self
            .inner
            .byte_headers()
            .with_context(|| format!("Reading header row of {:?}", self.path))?;
        record
            .iter()
            .map(|field| decode_bytes(field, encoding))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Decoding header row of {:?}", self.path))
    }

    /// Rows after the header, in file order. `RawRow::index` is 0 for the
    /// first row following the header.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<RawRow>> + '_ {
        let encoding = self.encoding;
        self.inner
            .byte_records()
            .enumerate()
            .map(move |(index, record)| {
                let record = record.with_context(|| format!("Reading row {}", index + 2))?;
                Ok(RawRow {
                    index,
                    record,
                    encoding,
                })
            })
    }
}

/// One undecoded row of an export.
#[derive(Debug)]
pub struct RawRow {
    pub index: usize,
    record: ByteRecord,
    encoding: &'static Encoding,
}

impl RawRow {
    /// 1-based line number as a spreadsheet would show it, header included.
    pub fn line(&self) -> usize {
        self.index + 2
    }

    pub fn field(&self, column: usize) -> Option<Result<String>> {
        self.record.get(column).map(|bytes| {
            decode_bytes(bytes, self.encoding)
                .with_context(|| format!("Decoding column {} of row {}", column + 1, self.line()))
        })
    }

    pub fn decode(&self) -> Result<Vec<String>> {
        (0..self.record.len())
            .filter_map(|column| self.field(column))
            .collect()
    }
}
