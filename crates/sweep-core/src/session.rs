//! Per-user session holding uploaded tables and the current result

use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::export::{export_tables, ExportPayload};
use crate::merger::{merge, LineEnding, MergeConfig};
use crate::table::Table;
use serde::Serialize;
use tracing::{info, warn};

/// The tables a session currently shows and exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSet<'a> {
    tables: &'a [Table],
    merged: bool,
}

impl<'a> TableSet<'a> {
    pub fn tables(&self) -> &'a [Table] {
        self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Whether this set is the output of a merge
    pub fn is_merged(&self) -> bool {
        self.merged
    }
}

/// Owns one user's uploads and derived tables. Sessions share nothing.
#[derive(Debug, Clone)]
pub struct Session {
    uploads: Vec<Table>,
    /// Result of the last successful merge; `None` shows the uploads
    merged: Option<Vec<Table>>,
    line_ending: LineEnding,
}

impl Session {
    /// Start a session from decoded uploads; at least one table is required
    pub fn new(uploads: Vec<Table>) -> Result<Self> {
        if uploads.is_empty() {
            return Err(Error::NoInput);
        }

        Ok(Self {
            uploads,
            merged: None,
            line_ending: LineEnding::default(),
        })
    }

    /// Add another upload. The session goes back to showing the uploads.
    pub fn add_upload(&mut self, table: Table) {
        self.uploads.push(table);
        self.decline_merge();
    }

    /// The tables as uploaded
    pub fn uploads(&self) -> &[Table] {
        &self.uploads
    }

    pub fn table_set(&self) -> TableSet<'_> {
        match &self.merged {
            Some(tables) => TableSet {
                tables,
                merged: true,
            },
            None => TableSet {
                tables: &self.uploads,
                merged: false,
            },
        }
    }

    /// Line ending used for the next export
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Merging is only offered when more than one file was uploaded
    pub fn offers_merge(&self) -> bool {
        self.uploads.len() > 1
    }

    /// Merge the uploads under `config` and make the result current.
    ///
    /// Always starts from the uploads, never from a previous result. On
    /// error the current table set is left untouched.
    pub fn apply(&mut self, config: &MergeConfig) -> Result<TableSet<'_>> {
        if self.offers_merge() {
            let tables = merge(&self.uploads, config)?;
            self.merged = Some(tables);
        } else {
            warn!("merge requested with a single table, keeping it unchanged");
            self.merged = None;
        }
        self.line_ending = config.line_ending;

        let set = self.table_set();
        info!(tables = set.len(), merged = set.is_merged(), "updated table set");
        Ok(set)
    }

    /// Go back to showing the uploads unmerged
    pub fn decline_merge(&mut self) {
        self.merged = None;
        self.line_ending = LineEnding::default();
    }

    /// Encode the current table set as named CSV payloads
    pub fn export(&self, encoding: TextEncoding) -> Result<Vec<ExportPayload>> {
        export_tables(self.table_set().tables(), self.line_ending, encoding)
    }
}
