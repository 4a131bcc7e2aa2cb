//! CSV source access: field names, type-inference sample, and full row
//! stream.
//!
//! [`CsvSource`] is the "read rows from source" collaborator. It exposes the
//! three reads the synchronizer needs — [`headers()`](CsvSource::headers),
//! [`sample()`](CsvSource::sample), and [`records()`](CsvSource::records) —
//! each as an independent pass over the file. A UTF-8 byte-order mark on the
//! first header is stripped.

use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use encoding_rs::Encoding;

use crate::io_utils;

pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
    encoding: &'static Encoding,
}

/// One source row as ordered (column, raw value) pairs in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl CsvSource {
    pub fn open(path: &Path, delimiter: Option<u8>, encoding_label: Option<&str>) -> Result<Self> {
        ensure!(
            !io_utils::is_dash(path),
            "Synchronization reads the source multiple times; stdin input is not supported"
        );
        let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
        let encoding = io_utils::resolve_encoding(encoding_label)?;
        Ok(Self {
            path: path.to_path_buf(),
            delimiter,
            encoding,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Field names from the header row, in file order.
    pub fn headers(&self) -> Result<Vec<String>> {
        let mut reader = io_utils::open_csv_reader_from_path(&self.path, self.delimiter, true)?;
        let raw = reader
            .byte_headers()
            .context("Reading CSV header row")?
            .clone();
        let mut headers = io_utils::decode_record(&raw, self.encoding)?;
        if let Some(first) = headers.first_mut() {
            *first = strip_bom(first).to_string();
        }
        ensure!(!headers.is_empty(), "CSV file has no header row");
        Ok(headers)
    }

    /// Up to `rows` data rows, in file order, for type sampling.
    pub fn sample(&self, rows: usize) -> Result<Vec<Vec<String>>> {
        let mut reader = io_utils::open_csv_reader_from_path(&self.path, self.delimiter, true)?;
        let mut record = csv::ByteRecord::new();
        let mut collected = Vec::new();
        while collected.len() < rows
            && reader
                .read_byte_record(&mut record)
                .context("Reading CSV sample row")?
        {
            collected.push(io_utils::decode_record(&record, self.encoding)?);
        }
        Ok(collected)
    }

    /// Streams every data row as a name→value [`Record`].
    pub fn records(&self) -> Result<Records> {
        let headers = self.headers()?;
        let reader = io_utils::open_csv_reader_from_path(&self.path, self.delimiter, true)?;
        Ok(Records {
            reader,
            headers,
            encoding: self.encoding,
            record: csv::ByteRecord::new(),
        })
    }
}

pub struct Records {
    reader: csv::Reader<Box<dyn Read>>,
    headers: Vec<String>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                let decoded = match io_utils::decode_record(&self.record, self.encoding) {
                    Ok(values) => values,
                    Err(err) => return Some(Err(err)),
                };
                let fields = self.headers.iter().cloned().zip(decoded).collect();
                Some(Ok(Record::new(fields)))
            }
            Err(err) => Some(Err(err).context("Reading CSV data row")),
        }
    }
}

fn strip_bom(value: &str) -> &str {
    value.strip_prefix('\u{feff}').unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_bom_removes_leading_mark_only() {
        assert_eq!(strip_bom("\u{feff}id"), "id");
        assert_eq!(strip_bom("id"), "id");
        assert_eq!(strip_bom("i\u{feff}d"), "i\u{feff}d");
    }

    #[test]
    fn record_lookup_is_by_field_name() {
        let record = Record::new(vec![
            ("id".to_string(), "1".to_string()),
            ("name".to_string(), "alice".to_string()),
        ]);
        assert_eq!(record.get("name"), Some("alice"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 2);
    }
}
