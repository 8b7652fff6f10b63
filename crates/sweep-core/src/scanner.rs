//! Discovery of uploaded CSV files from paths given by the user

use crate::error::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Expand input paths into an ordered list of CSV files.
///
/// Files are kept in the order given, whatever their extension. Directories
/// are walked and their `.csv` files appended in sorted order. A file named
/// twice is only listed once, at its first position.
pub fn collect_csv_files<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for input in inputs {
        let input = input.as_ref();

        if !input.is_dir() {
            if seen.insert(input.to_path_buf()) {
                files.push(input.to_path_buf());
            }
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file() && is_csv(path) {
                found.push(path.to_path_buf());
            }
        }

        debug!(dir = %input.display(), files = found.len(), "scanned directory");

        for path in found {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
