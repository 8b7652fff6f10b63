//! CSV parser for uploaded files

use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P, encoding: TextEncoding) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_csv_bytes(&bytes, &source_name, encoding)
}

/// Parse raw uploaded bytes into a Table
pub fn parse_csv_bytes(bytes: &[u8], source_name: &str, encoding: TextEncoding) -> Result<Table> {
    let content = encoding.decode(bytes)?;
    parse_csv_str(&content, source_name)
}

/// Parse CSV from already-decoded text
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(content.as_bytes());

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        source_name: source_name.to_string(),
        source: e,
    })?;

    let columns: Vec<Column> = normalize_headers(headers.iter())
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect();

    if columns.is_empty() {
        return Err(Error::CsvParse {
            source_name: source_name.to_string(),
            message: "no columns found in CSV".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            source_name: source_name.to_string(),
            source: e,
        })?;

        let mut cells: Vec<CellValue> = record.iter().map(CellValue::from_field).collect();

        // Pad with absent cells if row is shorter than header
        if cells.len() < columns.len() {
            cells.resize(columns.len(), CellValue::Null);
        }

        if cells.len() > columns.len() {
            warn!(
                source = source_name,
                row = row_idx + 1,
                fields = cells.len(),
                columns = columns.len(),
                "row has more fields than columns, truncating"
            );
            cells.truncate(columns.len());
        }

        rows.push(Row::new(cells));
    }

    debug!(
        source = source_name,
        columns = columns.len(),
        rows = rows.len(),
        "parsed CSV"
    );

    Ok(Table {
        name: source_name.to_string(),
        columns,
        rows,
    })
}

/// Make header names unique the way dataframe readers do.
///
/// An empty header at position `i` becomes `Unnamed: i`; a repeated name
/// `x` becomes `x.1`, `x.2`, and so on, skipping names already taken.
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let raw: Vec<String> = raw
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(raw.len());

    for name in raw {
        let mut candidate = name.clone();
        let mut counter = 0;
        while taken.contains(&candidate) {
            counter += 1;
            candidate = format!("{}.{}", name, counter);
        }
        taken.insert(candidate.clone());
        names.push(candidate);
    }

    names
}
