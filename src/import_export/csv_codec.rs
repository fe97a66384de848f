//! Reading and writing the collection CSV dialect.
//!
//! Comma separated, double-quote quoting with `""` escapes, quoted fields may
//! span lines. The first record is the header; blank lines are skipped.

use super::error::CsvParseError;
use anyhow::{Context, Result};
use std::collections::HashMap;

pub const REQUIRED_COLUMNS: [&str; 3] = ["title", "physical_item_name", "formats"];

/// One data row keyed by header name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based position among the data rows.
    pub number: usize,
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new(number: usize, fields: HashMap<String, String>) -> Self {
        Self { number, fields }
    }

    /// Cell value exactly as written, `None` when the column is missing or the
    /// cell holds only whitespace.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// The row as a JSON object, used to echo rejected input back.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvDocument {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl CsvDocument {
    /// Parses `text` and checks that the header carries every required
    /// column. Short records leave the trailing columns absent, extra cells
    /// are dropped.
    pub fn parse(text: &str) -> Result<Self, CsvParseError> {
        if text.trim().is_empty() {
            return Err(CsvParseError::Empty);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = reader.records();
        let headers: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => return Err(CsvParseError::Empty),
        };

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !headers.iter().any(|h| h == *required))
            .map(|required| required.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CsvParseError::MissingColumns(missing));
        }

        let mut rows = Vec::new();
        for record in records {
            let record = record?;
            let fields = headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.clone(), value.to_string()))
                .collect();
            rows.push(RawRow::new(rows.len() + 1, fields));
        }

        Ok(Self { headers, rows })
    }
}

/// Serializes a header and data rows, quoting only where needed.
pub fn write_csv<H, R>(header: H, rows: R) -> Result<String>
where
    H: IntoIterator,
    H::Item: AsRef<[u8]>,
    R: IntoIterator,
    R::Item: IntoIterator,
    <R::Item as IntoIterator>::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
