//! CSV export of cleaned tables
//!
//! Each table becomes a header row plus data rows, comma separated, without
//! an index column. Absent cells are written as empty fields.

use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::merger::LineEnding;
use crate::table::Table;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One exported table, ready to be offered for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    /// Download name, `cleaned_data_<n>.csv`
    pub file_name: String,
    /// Encoded CSV bytes
    pub bytes: Vec<u8>,
}

/// Download name for the table at 1-based `position`
pub fn export_file_name(position: usize) -> String {
    format!("cleaned_data_{}.csv", position)
}

/// Encode a table as CSV bytes
pub fn encode_csv(table: &Table, line_ending: LineEnding, encoding: TextEncoding) -> Result<Vec<u8>> {
    let terminator = match line_ending {
        LineEnding::Lf => csv::Terminator::Any(b'\n'),
        LineEnding::Crlf => csv::Terminator::CRLF,
    };

    let mut writer = csv::WriterBuilder::new()
        .terminator(terminator)
        .from_writer(Vec::new());

    let csv_err = |e: csv::Error| Error::Csv {
        source_name: table.name.clone(),
        source: e,
    };

    writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(csv_err)?;

    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(|c| c.as_str().unwrap_or_default()))
            .map_err(csv_err)?;
    }

    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;

    match encoding {
        TextEncoding::Utf8 => Ok(bytes),
        TextEncoding::Latin1 => {
            let text = String::from_utf8(bytes).map_err(|e| Error::Encoding {
                encoding: TextEncoding::Utf8.label(),
                message: e.to_string(),
            })?;
            encoding.encode(&text)
        }
    }
}

/// Encode every table, naming payloads by position
pub fn export_tables(
    tables: &[Table],
    line_ending: LineEnding,
    encoding: TextEncoding,
) -> Result<Vec<ExportPayload>> {
    tables
        .iter()
        .enumerate()
        .map(|(i, table)| {
            Ok(ExportPayload {
                file_name: export_file_name(i + 1),
                bytes: encode_csv(table, line_ending, encoding)?,
            })
        })
        .collect()
}

/// Write payloads into `output_dir`, creating it if needed
pub fn write_payloads<P: AsRef<Path>>(payloads: &[ExportPayload], output_dir: P) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let path = output_dir.join(&payload.file_name);
        fs::write(&path, &payload.bytes)?;
        info!(path = %path.display(), bytes = payload.bytes.len(), "wrote export");
        written.push(path);
    }

    Ok(written)
}
