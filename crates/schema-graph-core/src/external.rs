//! External collaborator interface markers (§6 External Interfaces).
//!
//! The NL-SQL dataset loader (Spider/BIRD question sets) is not part of this
//! core; it shares the artifact consumer surface and lives in a separate
//! crate. These types declare its contract so callers can depend on the
//! shape without this crate implementing the loader itself.

use serde::{Deserialize, Serialize};

/// Which question-set a `DatasetRecord` was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetTag {
    Spider,
    SpiderDev,
    Bird,
    BirdDev,
}

/// A question/query pair normalized to a fixed field set, regardless of
/// which dataset it was loaded from. `evidence` is `None` for datasets that
/// do not carry it (Spider); SQL strings have trailing semicolons and
/// surrounding whitespace stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub question: String,
    pub sql_query: String,
    pub evidence: Option<String>,
    pub db_id: String,
}
