//! Core table types for representing uploaded CSV data

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A table decoded from one CSV file, or produced by a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Source label (usually the uploaded file name)
    pub name: String,
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data, one cell per column
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build a table from column names and rows
    pub fn from_parts<S: Into<String>>(
        name: impl Into<String>,
        column_names: impl IntoIterator<Item = S>,
        rows: Vec<Row>,
    ) -> Self {
        let columns = column_names
            .into_iter()
            .enumerate()
            .map(|(i, n)| Column::new(n.into(), i))
            .collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name (exact, case-sensitive)
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get a cell by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.find_column(column)?;
        self.rows.get(row).and_then(|r| r.get(col.index))
    }

    /// Project the table onto `names`, in that order.
    ///
    /// Names missing from this table are skipped, so the result never gains
    /// a column.
    pub fn select(&self, names: &[&str]) -> Table {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|n| self.find_column(n).map(|c| c.index))
            .collect();

        let columns = indices
            .iter()
            .enumerate()
            .map(|(i, &src)| Column::new(self.columns[src].name.clone(), i))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                Row::new(
                    indices
                        .iter()
                        .map(|&src| row.get(src).cloned().unwrap_or(CellValue::Null))
                        .collect(),
                )
            })
            .collect();

        Table {
            name: self.name.clone(),
            columns,
            rows,
        }
    }

    /// The set of value kinds present in a column (Null cells are ignored)
    pub fn kinds_in_column(&self, index: usize) -> BTreeSet<CellKind> {
        self.rows
            .iter()
            .filter_map(|r| r.get(index))
            .filter_map(CellValue::kind)
            .collect()
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as it appears in the header row
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Build a row from optional strings; `None` becomes a Null cell
    pub fn from_options<S: Into<String>>(cells: impl IntoIterator<Item = Option<S>>) -> Self {
        Self {
            cells: cells
                .into_iter()
                .map(|c| c.map_or(CellValue::Null, |s| CellValue::Text(s.into())))
                .collect(),
        }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }

    /// True when every cell is Null (a row with no cells counts as empty)
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(CellValue::is_null)
    }
}

/// A cell value. Text is stored exactly as decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellValue {
    /// Present value
    Text(String),
    /// Absent value, distinct from an empty string
    Null,
}

impl CellValue {
    /// Convert a decoded CSV field; an empty field is absent
    pub fn from_field(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(s.to_string())
        }
    }

    /// Check if the cell is absent
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Borrow the text of a present cell
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Null => None,
        }
    }

    /// Convert to the CSV field representation
    pub fn to_string_value(&self) -> String {
        self.as_str().unwrap_or_default().to_string()
    }

    /// Classify a present cell. Never changes the stored value.
    pub fn kind(&self) -> Option<CellKind> {
        let s = self.as_str()?;
        let trimmed = s.trim();

        // Try integer first, then float
        if trimmed.parse::<i64>().is_ok() {
            Some(CellKind::Integer)
        } else if !trimmed.is_empty() && trimmed.parse::<f64>().is_ok() {
            Some(CellKind::Float)
        } else {
            Some(CellKind::Text)
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Null => write!(f, "NaN"),
        }
    }
}

/// What a present cell looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Integer,
    Float,
    Text,
}
