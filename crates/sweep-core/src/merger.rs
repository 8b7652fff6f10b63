//! Merge engine for combining uploaded tables into one cleaned table
//!
//! The pipeline is fixed: align → combine → drop duplicates → drop empty rows.
//! Each step is a separate function over owned tables so it can be tested on
//! its own; `merge` only decides which steps run.

use crate::error::{Error, Result};
use crate::table::{CellKind, CellValue, Column, Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Name given to the table produced by a merge
pub const MERGED_TABLE_NAME: &str = "merged";

/// Options chosen by the user for a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Keep only the first table's header: restrict later tables to the
    /// columns they share with the first one
    pub align_headers_to_first: bool,
    /// Remove rows identical to an earlier row
    pub drop_duplicate_rows: bool,
    /// Remove rows where every cell is absent
    pub drop_empty_rows: bool,
    /// Line terminator for exported CSV
    pub line_ending: LineEnding,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            align_headers_to_first: true,
            drop_duplicate_rows: false,
            drop_empty_rows: true,
            line_ending: LineEnding::Lf,
        }
    }
}

impl MergeConfig {
    /// Load a config from JSON; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Record terminator written after every exported CSV row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Merge tables under `config`.
///
/// A single table is returned unchanged whatever the config says. Otherwise
/// the result always holds exactly one table.
pub fn merge(tables: &[Table], config: &MergeConfig) -> Result<Vec<Table>> {
    match tables {
        [] => Err(Error::NoInput),
        [single] => Ok(vec![single.clone()]),
        _ => {
            // Alignment reshapes rows, so inputs are checked as given
            for (i, table) in tables.iter().enumerate() {
                check_shape(i + 1, table)?;
            }

            let working = if config.align_headers_to_first {
                align_to_first(tables)
            } else {
                tables.to_vec()
            };

            let mut merged = combine(working)?;

            if config.drop_duplicate_rows {
                merged = drop_duplicate_rows(merged);
            }
            if config.drop_empty_rows {
                merged = drop_empty_rows(merged);
            }

            info!(
                inputs = tables.len(),
                columns = merged.column_count(),
                rows = merged.row_count(),
                "merged tables"
            );

            Ok(vec![merged])
        }
    }
}

/// Restrict every table after the first to the columns it shares with the
/// first table, in the first table's column order. The first table is
/// copied as is.
pub fn align_to_first(tables: &[Table]) -> Vec<Table> {
    let Some((first, rest)) = tables.split_first() else {
        return Vec::new();
    };

    let reference = first.column_names();
    let mut aligned = Vec::with_capacity(tables.len());
    aligned.push(first.clone());

    for table in rest {
        let restricted = table.select(&reference);
        if restricted.column_count() < table.column_count() {
            debug!(
                table = %table.name,
                kept = restricted.column_count(),
                dropped = table.column_count() - restricted.column_count(),
                "aligned header to first table"
            );
        }
        aligned.push(restricted);
    }

    aligned
}

/// Concatenate tables under the union of their columns.
///
/// Union order is first appearance, scanning tables in order. Cells for
/// columns a table lacks are absent. Values are kept as text, so a column
/// that is numeric in one table and text in another combines as text.
pub fn combine(tables: Vec<Table>) -> Result<Table> {
    for (i, table) in tables.iter().enumerate() {
        check_shape(i + 1, table)?;
    }

    // Build unified column list (union of all columns)
    let mut column_names: Vec<&str> = Vec::new();
    let mut seen_columns: HashSet<&str> = HashSet::new();

    for table in &tables {
        for col in &table.columns {
            if seen_columns.insert(col.name.as_str()) {
                column_names.push(col.name.as_str());
            }
        }
    }

    let columns: Vec<Column> = column_names
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.to_string(), i))
        .collect();

    let col_index: HashMap<&str, usize> = columns
        .iter()
        .map(|c| (c.name.as_str(), c.index))
        .collect();

    let total_rows = tables.iter().map(Table::row_count).sum();
    let mut rows: Vec<Row> = Vec::with_capacity(total_rows);
    let mut kinds: Vec<BTreeSet<CellKind>> = vec![BTreeSet::new(); columns.len()];

    for table in &tables {
        // Where each of this table's columns lands in the union
        let targets: Vec<usize> = table
            .columns
            .iter()
            .map(|c| col_index[c.name.as_str()])
            .collect();

        for (src, &dst) in targets.iter().enumerate() {
            kinds[dst].extend(table.kinds_in_column(src));
        }

        for row in &table.rows {
            let mut cells = vec![CellValue::Null; columns.len()];
            for (cell, &dst) in row.cells.iter().zip(&targets) {
                cells[dst] = cell.clone();
            }
            rows.push(Row::new(cells));
        }
    }

    for (col, col_kinds) in columns.iter().zip(&kinds) {
        if col_kinds.len() > 1 && col_kinds.contains(&CellKind::Text) {
            debug!(column = %col.name, "column mixes numbers and text, keeping values as text");
        }
    }

    Ok(Table {
        name: MERGED_TABLE_NAME.to_string(),
        columns,
        rows,
    })
}

/// Remove rows equal to an earlier row across all columns. First wins.
pub fn drop_duplicate_rows(mut table: Table) -> Table {
    let before = table.row_count();
    let mut seen: HashSet<Row> = HashSet::with_capacity(before);
    table.rows.retain(|row| seen.insert(row.clone()));

    debug!(removed = before - table.row_count(), "dropped duplicate rows");
    table
}

/// Remove rows in which every cell is absent
pub fn drop_empty_rows(mut table: Table) -> Table {
    let before = table.row_count();
    table.rows.retain(|row| !row.is_empty());

    debug!(removed = before - table.row_count(), "dropped empty rows");
    table
}

/// Reject tables the union cannot place unambiguously
fn check_shape(position: usize, table: &Table) -> Result<()> {
    let mut names: HashSet<&str> = HashSet::with_capacity(table.column_count());
    for col in &table.columns {
        if !names.insert(col.name.as_str()) {
            return Err(Error::ColumnMismatch {
                table: position,
                detail: format!("column '{}' appears more than once in '{}'", col.name, table.name),
            });
        }
    }

    if let Some((row_idx, row)) = table
        .rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.cells.len() != table.column_count())
    {
        return Err(Error::ColumnMismatch {
            table: position,
            detail: format!(
                "row {} of '{}' has {} cells for {} columns",
                row_idx + 1,
                table.name,
                row.cells.len(),
                table.column_count()
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    fn config(align: bool, dedupe: bool, drop_empty: bool) -> MergeConfig {
        MergeConfig {
            align_headers_to_first: align,
            drop_duplicate_rows: dedupe,
            drop_empty_rows: drop_empty,
            line_ending: LineEnding::Lf,
        }
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_merge_single_table_is_identity() {
        let table = parse_csv_str("id,name\n1,a\n1,a\n,\n", "only.csv").unwrap();

        for cfg in [config(true, true, true), config(false, false, false)] {
            let result = merge(std::slice::from_ref(&table), &cfg).unwrap();
            assert_eq!(result, vec![table.clone()]);
        }
    }

    #[test]
    fn test_merge_no_tables() {
        let err = merge(&[], &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, Error::NoInput));
    }

    #[test]
    fn test_merge_dedupes_across_tables() {
        let t1 = parse_csv_str("id,name\n1,a\n2,b\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("id,name\n1,a\n3,c\n", "t2.csv").unwrap();

        let result = merge(&[t1, t2], &config(false, true, false)).unwrap();

        assert_eq!(result.len(), 1);
        let merged = &result[0];
        assert_eq!(merged.column_names(), vec!["id", "name"]);
        assert_eq!(
            merged.rows,
            vec![
                Row::from_options([Some("1"), Some("a")]),
                Row::from_options([Some("2"), Some("b")]),
                Row::from_options([Some("3"), Some("c")]),
            ]
        );
    }

    #[test]
    fn test_merge_aligns_headers_to_first() {
        let t1 = parse_csv_str("id,name\n1,a\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("id,email\n2,b@example.com\n", "t2.csv").unwrap();

        let result = merge(&[t1, t2], &config(true, false, false)).unwrap();
        let merged = &result[0];

        assert_eq!(merged.column_names(), vec!["id", "name"]);
        assert_eq!(merged.rows[1], Row::from_options([Some("2"), None]));
    }

    #[test]
    fn test_merge_without_alignment_takes_column_union() {
        let t1 = parse_csv_str("id,name\n1,a\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("email,id\nb@example.com,2\n", "t2.csv").unwrap();

        let result = merge(&[t1, t2], &config(false, false, false)).unwrap();
        let merged = &result[0];

        assert_eq!(merged.column_names(), vec!["id", "name", "email"]);
        assert_eq!(merged.rows[0], Row::from_options([Some("1"), Some("a"), None]));
        assert_eq!(
            merged.rows[1],
            Row::from_options([Some("2"), None, Some("b@example.com")])
        );
    }

    #[test]
    fn test_merge_drops_only_fully_empty_rows() {
        let t1 = Table::from_parts(
            "t1.csv",
            ["a", "b"],
            vec![
                Row::from_options::<&str>([None, None]),
                Row::from_options([None, Some("x")]),
            ],
        );
        let t2 = Table::from_parts("t2.csv", ["a", "b"], vec![Row::from_options([Some(""), None])]);

        let result = merge(&[t1, t2], &config(false, false, true)).unwrap();
        let merged = &result[0];

        assert_eq!(merged.row_count(), 2);
        assert_eq!(merged.rows[0], Row::from_options([None, Some("x")]));
        // An empty string is a value, not an absent cell
        assert_eq!(merged.rows[1].cells[0], text(""));
    }

    #[test]
    fn test_merge_row_count_is_sum_without_cleaning() {
        let t1 = parse_csv_str("a,b\n1,2\n1,2\n,\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("a,b\n1,2\n3,4\n", "t2.csv").unwrap();

        let result = merge(&[t1.clone(), t2.clone()], &config(true, false, false)).unwrap();
        assert_eq!(result[0].row_count(), t1.row_count() + t2.row_count());
    }

    #[test]
    fn test_merge_does_not_touch_inputs() {
        let t1 = parse_csv_str("id,name\n1,a\n1,a\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("id,other\n2,z\n", "t2.csv").unwrap();
        let inputs = vec![t1.clone(), t2.clone()];

        merge(&inputs, &config(true, true, true)).unwrap();

        assert_eq!(inputs, vec![t1, t2]);
    }

    #[test]
    fn test_align_never_adds_columns() {
        let t1 = parse_csv_str("a,b,c\n1,2,3\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("c,x,a\n4,5,6\n", "t2.csv").unwrap();
        let t3 = parse_csv_str("Y,Z\n7,8\n", "t3.csv").unwrap();

        let aligned = align_to_first(&[t1.clone(), t2, t3]);

        assert_eq!(aligned[0], t1);
        assert_eq!(aligned[1].column_names(), vec!["a", "c"]);
        assert_eq!(aligned[1].rows[0], Row::from_options([Some("6"), Some("4")]));
        assert_eq!(aligned[2].column_count(), 0);
        assert_eq!(aligned[2].row_count(), 1);

        let merged = combine(aligned).unwrap();
        for name in merged.column_names() {
            assert!(t1.find_column(name).is_some());
        }
    }

    #[test]
    fn test_align_is_case_sensitive() {
        let t1 = parse_csv_str("id,Name\n1,a\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("ID,name\n2,b\n", "t2.csv").unwrap();

        let aligned = align_to_first(&[t1, t2]);
        assert_eq!(aligned[1].column_count(), 0);
    }

    #[test]
    fn test_no_overlap_contributes_empty_rows() {
        let t1 = parse_csv_str("id\n1\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("other\nx\ny\n", "t2.csv").unwrap();

        let kept = merge(&[t1.clone(), t2.clone()], &config(true, false, false)).unwrap();
        assert_eq!(kept[0].row_count(), 3);
        assert!(kept[0].rows[1].is_empty());
        assert!(kept[0].rows[2].is_empty());

        let pruned = merge(&[t1, t2], &config(true, false, true)).unwrap();
        assert_eq!(pruned[0].row_count(), 1);
    }

    #[test]
    fn test_dedupe_is_idempotent_and_stable() {
        let table = Table::from_parts(
            "t.csv",
            ["a"],
            vec![
                Row::from_options([Some("2")]),
                Row::from_options([Some("1")]),
                Row::from_options([Some("2")]),
                Row::from_options::<&str>([None]),
                Row::from_options::<&str>([None]),
            ],
        );

        let once = drop_duplicate_rows(table);
        let twice = drop_duplicate_rows(once.clone());

        assert_eq!(once, twice);
        assert_eq!(
            once.rows,
            vec![
                Row::from_options([Some("2")]),
                Row::from_options([Some("1")]),
                Row::from_options::<&str>([None]),
            ]
        );
    }

    #[test]
    fn test_dedupe_distinguishes_absent_patterns() {
        let table = Table::from_parts(
            "t.csv",
            ["a", "b"],
            vec![
                Row::from_options([Some("1"), None]),
                Row::from_options([Some("1"), Some("")]),
                Row::from_options([None, Some("1")]),
            ],
        );

        assert_eq!(drop_duplicate_rows(table).row_count(), 3);
    }

    #[test]
    fn test_dedupe_compares_post_union_rows() {
        // Same visible values, but the second row gains an absent cell from the union
        let t1 = parse_csv_str("a,b\n1,\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("a\n1\n", "t2.csv").unwrap();

        let result = merge(&[t1, t2], &config(false, true, false)).unwrap();
        assert_eq!(result[0].row_count(), 1);
    }

    #[test]
    fn test_mixed_kinds_combine_as_text() {
        let t1 = parse_csv_str("id,value\n1,10\n", "t1.csv").unwrap();
        let t2 = parse_csv_str("id,value\n2,ten\n", "t2.csv").unwrap();

        let merged = combine(vec![t1, t2]).unwrap();

        assert_eq!(merged.cell(0, "value"), Some(&text("10")));
        assert_eq!(merged.cell(1, "value"), Some(&text("ten")));
    }

    #[test]
    fn test_combine_rejects_duplicate_columns() {
        let t1 = parse_csv_str("id\n1\n", "t1.csv").unwrap();
        let t2 = Table::from_parts("t2.csv", ["id", "id"], vec![Row::from_options([Some("1"), Some("2")])]);

        let err = combine(vec![t1, t2]).unwrap_err();
        assert!(matches!(err, Error::ColumnMismatch { table: 2, .. }));
    }

    #[test]
    fn test_combine_rejects_ragged_rows() {
        let t1 = Table::from_parts("t1.csv", ["a", "b"], vec![Row::from_options([Some("1")])]);
        let t2 = parse_csv_str("a\n1\n", "t2.csv").unwrap();

        let err = merge(&[t1, t2], &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, Error::ColumnMismatch { table: 1, .. }));
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_aligned_merge_rejects_ragged_later_table() {
        let t1 = parse_csv_str("a,b\n1,2\n", "t1.csv").unwrap();
        let t2 = Table::from_parts("t2.csv", ["a", "b"], vec![Row::from_options([Some("9")])]);

        for align in [true, false] {
            let err = merge(&[t1.clone(), t2.clone()], &config(align, false, false)).unwrap_err();
            assert!(matches!(err, Error::ColumnMismatch { table: 2, .. }));
        }
    }

    #[test]
    fn test_aligned_merge_rejects_duplicate_columns_in_later_table() {
        let t1 = parse_csv_str("id\n1\n", "t1.csv").unwrap();
        let t2 = Table::from_parts("t2.csv", ["id", "id"], vec![Row::from_options([Some("1"), Some("2")])]);

        let err = merge(&[t1, t2], &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, Error::ColumnMismatch { table: 2, .. }));
    }

    #[test]
    fn test_config_defaults_and_json() {
        let defaults = MergeConfig::default();
        assert!(defaults.align_headers_to_first);
        assert!(!defaults.drop_duplicate_rows);
        assert!(defaults.drop_empty_rows);
        assert_eq!(defaults.line_ending, LineEnding::Lf);

        let partial: MergeConfig =
            serde_json::from_str(r#"{"drop_duplicate_rows": true, "line_ending": "crlf"}"#).unwrap();
        assert!(partial.align_headers_to_first);
        assert!(partial.drop_duplicate_rows);
        assert_eq!(partial.line_ending, LineEnding::Crlf);
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.json");
        let cfg = config(false, true, false);

        cfg.save(&path).unwrap();
        assert_eq!(MergeConfig::load(&path).unwrap(), cfg);
    }
}
