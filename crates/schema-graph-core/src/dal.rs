//! Database Access Layer (DAL, §4.1)
//!
//! Opens a read-only connection to a SQLite file and exposes catalog
//! queries and bounded row reads. All reads are scoped to a single
//! connection released when the `Dal` is dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use serde_json::Value;

use crate::error::PipelineError;

/// Per-table upper bound on rows read for profiling (§4.1, §4.3, GLOSSARY).
pub const HARD_CAP: usize = 100_000;

/// A single raw SQLite value, preserving its storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Interpret as a double-precision number, parsing text/decimal forms.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Integer(i) => Some(*i as f64),
            RawValue::Real(r) => Some(*r),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
            RawValue::Null | RawValue::Blob(_) => None,
        }
    }

    /// Interpret as text for textual-family profiling.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Integer(i) => Some(i.to_string()),
            RawValue::Real(r) => Some(r.to_string()),
            RawValue::Null => None,
            RawValue::Blob(b) => Some(format!("<blob {} bytes>", b.len())),
        }
    }

    /// JSON representation used in `samples` and `range`/`mode` attributes.
    pub fn to_json(&self) -> Value {
        match self {
            RawValue::Null => Value::Null,
            RawValue::Integer(i) => Value::from(*i),
            RawValue::Real(r) => serde_json::Number::from_f64(*r)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RawValue::Text(s) => Value::String(s.clone()),
            RawValue::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
        }
    }
}

impl From<rusqlite::types::ValueRef<'_>> for RawValue {
    fn from(v: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match v {
            ValueRef::Null => RawValue::Null,
            ValueRef::Integer(i) => RawValue::Integer(i),
            ValueRef::Real(r) => RawValue::Real(r),
            ValueRef::Text(t) => RawValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => RawValue::Blob(b.to_vec()),
        }
    }
}

/// One column's catalog metadata, as returned by `PRAGMA table_info`.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    /// 1-based position within a composite primary key, preserving
    /// declaration order; `None` when the column is not part of the PK.
    pub pk_ordinal: Option<usize>,
}

/// One foreign key declaration, as returned by `PRAGMA foreign_key_list`.
/// `to_column` may be absent: SQLite permits omitting the referenced
/// column, implying the target table's primary key.
#[derive(Debug, Clone)]
pub struct ForeignKeyDecl {
    pub from_column: String,
    pub to_table: String,
    pub to_column: Option<String>,
}

/// A table's full catalog description.
#[derive(Debug, Clone)]
pub struct TableDescription {
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyDecl>,
}

/// Read-only SQLite catalog and row access, scoped to a single connection.
pub struct Dal {
    conn: Connection,
}

impl Dal {
    /// Open `path` read-only with the given busy timeout. Fails with
    /// `SourceUnavailable` if the file is missing or not a valid database.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, PipelineError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| {
            PipelineError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        conn.busy_timeout(busy_timeout)
            .map_err(|source| PipelineError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        // Confirm the file is actually a readable SQLite database before
        // any pipeline work begins.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(()))
            .map_err(|source| PipelineError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { conn })
    }

    /// User tables in catalog order, excluding internal `sqlite_*` tables.
    pub fn list_tables(&self) -> Result<Vec<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY rowid")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names
            .into_iter()
            .filter(|n| !n.starts_with("sqlite_"))
            .collect())
    }

    pub fn describe_table(&self, table: &str) -> Result<TableDescription, rusqlite::Error> {
        let quoted = quote_ident(table);

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({quoted})"))?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(1)?;
            let declared_type: String = row.get(2)?;
            let notnull: i64 = row.get(3)?;
            let default: Option<String> = row.get(4)?;
            let pk: i64 = row.get(5)?;
            Ok((name, declared_type, notnull, default, pk))
        })?;

        let mut columns = Vec::new();
        let mut pk_by_ordinal: Vec<(i64, String)> = Vec::new();
        for row in rows {
            let (name, declared_type, notnull, default, pk) = row?;
            if pk > 0 {
                pk_by_ordinal.push((pk, name.clone()));
            }
            columns.push(ColumnInfo {
                name,
                declared_type: declared_type.to_uppercase(),
                is_nullable: notnull == 0,
                default,
                pk_ordinal: if pk > 0 { Some(pk as usize) } else { None },
            });
        }
        pk_by_ordinal.sort_by_key(|(ordinal, _)| *ordinal);
        let primary_key = pk_by_ordinal.into_iter().map(|(_, name)| name).collect();

        let mut fk_stmt = self
            .conn
            .prepare(&format!("PRAGMA foreign_key_list({quoted})"))?;
        let fk_rows = fk_stmt.query_map([], |row| {
            let to_table: String = row.get(2)?;
            let from_column: String = row.get(3)?;
            let to_column: Option<String> = row.get(4)?;
            Ok(ForeignKeyDecl {
                from_column,
                to_table,
                to_column,
            })
        })?;
        let foreign_keys = fk_rows.collect::<Result<Vec<_>, _>>()?;

        Ok(TableDescription {
            columns,
            primary_key,
            foreign_keys,
        })
    }

    pub fn row_count(&self, table: &str) -> Result<u64, rusqlite::Error> {
        let quoted = quote_ident(table);
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {quoted}"), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n.max(0) as u64)
    }

    /// Read the first `limit` rows of `column` from `table`. Determinism is
    /// preferred over statistical randomness at scale: this always reads
    /// the first rows in storage order, never a random sample.
    pub fn sample_values(
        &self,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<RawValue>, rusqlite::Error> {
        let quoted_table = quote_ident(table);
        let quoted_column = quote_ident(column);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {quoted_column} FROM {quoted_table} ORDER BY rowid LIMIT {limit}"
        ))?;
        let rows = stmt.query_map([], |row| {
            let value_ref = row.get_ref(0)?;
            Ok(RawValue::from(value_ref))
        })?;
        rows.collect()
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
