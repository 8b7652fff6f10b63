//! Read-only previews of tables

use crate::table::{CellKind, CellValue, Table};
use serde::Serialize;
use std::fmt::Write;

/// Summarised value kind of a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Int,
    Float,
    Text,
    Mixed,
    /// Every cell absent
    Empty,
}

impl ColumnKind {
    fn of(table: &Table, index: usize) -> Self {
        let kinds = table.kinds_in_column(index);
        let numeric = kinds.iter().all(|k| matches!(k, CellKind::Integer | CellKind::Float));

        if kinds.is_empty() {
            ColumnKind::Empty
        } else if kinds.len() == 1 && kinds.contains(&CellKind::Integer) {
            ColumnKind::Int
        } else if numeric {
            ColumnKind::Float
        } else if kinds.len() == 1 {
            ColumnKind::Text
        } else {
            ColumnKind::Mixed
        }
    }
}

/// A column header with its summarised kind
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
}

/// Serializable preview of one table
#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    /// `DataFrame <n>`, 1-based
    pub title: String,
    pub source: String,
    pub columns: Vec<ColumnSummary>,
    /// Shown rows; `None` marks an absent cell
    pub rows: Vec<Vec<Option<String>>>,
    pub total_rows: usize,
}

impl TablePreview {
    /// Build a preview of the table at 1-based `position`, keeping at most `limit` rows
    pub fn new(table: &Table, position: usize, limit: Option<usize>) -> Self {
        let shown = limit.unwrap_or(table.row_count());

        Self {
            title: format!("DataFrame {}", position),
            source: table.name.clone(),
            columns: table
                .columns
                .iter()
                .map(|c| ColumnSummary {
                    name: c.name.clone(),
                    kind: ColumnKind::of(table, c.index),
                })
                .collect(),
            rows: table
                .rows
                .iter()
                .take(shown)
                .map(|r| r.cells.iter().map(|c| c.as_str().map(str::to_string)).collect())
                .collect(),
            total_rows: table.row_count(),
        }
    }
}

/// Render a table as tab-separated text with a row limit
pub fn render_table(table: &Table, limit: Option<usize>) -> String {
    let mut out = String::new();

    let header: Vec<&str> = table.column_names();
    let _ = writeln!(out, "{}", header.join("\t"));
    let _ = writeln!(out, "{}", "-".repeat(header.len().max(1) * 12));

    let row_limit = limit.unwrap_or(table.row_count());
    for row in table.rows.iter().take(row_limit) {
        let values: Vec<String> = row.cells.iter().map(CellValue::to_string).collect();
        let _ = writeln!(out, "{}", values.join("\t"));
    }

    if table.row_count() > row_limit {
        let _ = writeln!(out, "... ({} more rows)", table.row_count() - row_limit);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    #[test]
    fn test_render_with_limit() {
        let table = parse_csv_str("id,name\n1,a\n2,\n3,c\n", "t.csv").unwrap();

        let text = render_table(&table, Some(2));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "id\tname");
        assert_eq!(lines[2], "1\ta");
        assert_eq!(lines[3], "2\tNaN");
        assert_eq!(lines[4], "... (1 more rows)");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_render_without_limit() {
        let table = parse_csv_str("id\n1\n2\n", "t.csv").unwrap();
        let text = render_table(&table, None);
        assert!(!text.contains("more rows"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_column_kinds() {
        let table = parse_csv_str(
            "i,f,t,m,e\n1,1.5,x,1,\n2,2,y,z,\n",
            "t.csv",
        )
        .unwrap();

        let preview = TablePreview::new(&table, 1, None);
        let kinds: Vec<ColumnKind> = preview.columns.iter().map(|c| c.kind).collect();

        assert_eq!(
            kinds,
            vec![
                ColumnKind::Int,
                ColumnKind::Float,
                ColumnKind::Text,
                ColumnKind::Mixed,
                ColumnKind::Empty,
            ]
        );
    }

    #[test]
    fn test_preview_json() {
        let table = parse_csv_str("id,name\n1,\n2,b\n", "t.csv").unwrap();
        let preview = TablePreview::new(&table, 3, Some(1));

        let json = serde_json::to_value(&preview).unwrap();

        assert_eq!(json["title"], "DataFrame 3");
        assert_eq!(json["source"], "t.csv");
        assert_eq!(json["total_rows"], 2);
        assert_eq!(json["rows"], serde_json::json!([["1", null]]));
        assert_eq!(json["columns"][0]["kind"], "int");
    }
}
