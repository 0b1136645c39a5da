//! Metadata Loader (ML, §4.2)
//!
//! Locates an optional `database_description/` directory containing one CSV
//! description file per table, keyed by column name, and returns a lookup
//! keyed by `(table, column)`. Absence of the directory or a file is not an
//! error; malformed files are logged and skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::NonFatal;

/// Human-authored descriptions for one column.
#[derive(Debug, Clone, Default)]
pub struct ColumnDescription {
    pub column_description: Option<String>,
    pub value_description: Option<String>,
}

/// `(table, column) -> ColumnDescription` lookup, plus the non-fatal events
/// encountered while building it.
#[derive(Debug, Default)]
pub struct MetadataIndex {
    entries: HashMap<(String, String), ColumnDescription>,
    pub warnings: Vec<NonFatal>,
}

impl MetadataIndex {
    pub fn get(&self, table: &str, column: &str) -> Option<&ColumnDescription> {
        self.entries.get(&(table.to_string(), column.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads per-table description files from `<dataset_root>/database_description/`.
pub struct MetadataLoader {
    description_dir: PathBuf,
}

impl MetadataLoader {
    pub fn new(dataset_root: &Path) -> Self {
        Self {
            description_dir: dataset_root.join("database_description"),
        }
    }

    /// Build the `(table, column) -> description` lookup for `tables`. If the
    /// description directory is absent, returns an empty index without error.
    pub fn load(&self, tables: &[String]) -> MetadataIndex {
        let mut index = MetadataIndex::default();
        if !self.description_dir.is_dir() {
            return index;
        }

        for table in tables {
            let path = self.description_dir.join(format!("{table}.csv"));
            if !path.is_file() {
                index.warnings.push(NonFatal::MetadataMissing {
                    table: table.clone(),
                    detail: format!("no description file at {}", path.display()),
                });
                continue;
            }
            match load_table_file(&path, table) {
                Ok(entries) => index.entries.extend(entries),
                Err(reason) => {
                    warn!(table = %table, %reason, "skipping malformed metadata file");
                    index.warnings.push(NonFatal::MetadataMissing {
                        table: table.clone(),
                        detail: reason,
                    });
                }
            }
        }
        index
    }
}

/// Parses one table's description CSV. Recognized columns:
/// `original_column_name`, `column_description`, `value_description`.
fn load_table_file(
    path: &Path,
    table: &str,
) -> Result<HashMap<(String, String), ColumnDescription>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let column_idx = headers
        .iter()
        .position(|h| h.trim() == "original_column_name")
        .ok_or_else(|| "missing original_column_name column".to_string())?;
    let desc_idx = headers.iter().position(|h| h.trim() == "column_description");
    let value_idx = headers.iter().position(|h| h.trim() == "value_description");

    let mut out = HashMap::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(table = %table, error = %e, "skipping unparsable metadata row");
                continue;
            }
        };
        let Some(column_name) = record.get(column_idx).map(|s| s.trim().to_string()) else {
            continue;
        };
        if column_name.is_empty() {
            continue;
        }
        let column_description = desc_idx
            .and_then(|i| record.get(i))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let value_description = value_idx
            .and_then(|i| record.get(i))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        out.insert(
            (table.to_string(), column_name),
            ColumnDescription {
                column_description,
                value_description,
            },
        );
    }
    Ok(out)
}
