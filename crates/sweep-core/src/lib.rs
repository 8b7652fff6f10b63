//! sweep-core: Core library for merging and cleaning uploaded CSV tables
//!
//! This library provides functionality to:
//! - Collect CSV files from paths and directories
//! - Decode CSV bytes (Latin-1 by default) into tables
//! - Merge tables: header alignment, outer-union concatenation,
//!   duplicate removal and empty-row removal
//! - Hold per-user state in an explicit `Session`
//! - Preview tables and export them as `cleaned_data_<n>.csv` payloads

pub mod encoding;
pub mod error;
pub mod export;
pub mod merger;
pub mod parser;
pub mod preview;
pub mod scanner;
pub mod session;
pub mod table;

pub use encoding::TextEncoding;
pub use error::{Error, Result};
pub use export::{encode_csv, export_file_name, export_tables, write_payloads, ExportPayload};
pub use merger::{merge, LineEnding, MergeConfig};
pub use parser::{parse_csv, parse_csv_bytes, parse_csv_str};
pub use preview::{render_table, TablePreview};
pub use scanner::collect_csv_files;
pub use session::{Session, TableSet};
pub use table::{CellKind, CellValue, Column, Row, Table};
