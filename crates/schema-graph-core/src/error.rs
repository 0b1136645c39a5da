//! Error taxonomy for the schema graph pipeline.
//!
//! The pipeline distinguishes fatal errors (no artifact is emitted) from
//! non-fatal ones (accumulated into a [`crate::pipeline::RunSummary`] and
//! logged, never propagated past the component that handles them).

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a pipeline run before an artifact is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The database file cannot be opened or a required catalog query failed
    /// before any work began.
    #[error("database source unavailable at {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A foreign key declaration omitted `to_column` and the target table has
    /// no primary key to fall back on.
    #[error("foreign key {from_table}.{from_column} -> {to_table} cannot be resolved: target table has no primary key")]
    UnresolvableFk {
        from_table: String,
        from_column: String,
        to_table: String,
    },

    /// The graph builder rejected a mutation that would violate an
    /// invariant (duplicate node, reference to a missing table, etc).
    #[error(transparent)]
    Builder(#[from] crate::builder::BuilderError),

    /// Serializing or atomically writing the artifact failed.
    #[error("failed to write artifact to {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-fatal degradations recorded in the run summary instead of aborting.
#[derive(Debug, Clone)]
pub enum NonFatal {
    /// A column's type-family-specific statistics could not be computed.
    /// The column node is still emitted with common-block statistics only.
    ProfilerDegraded {
        table: String,
        column: String,
        cause: String,
    },
    /// An expected description file or column entry was absent.
    MetadataMissing { table: String, detail: String },
}

impl std::fmt::Display for NonFatal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonFatal::ProfilerDegraded {
                table,
                column,
                cause,
            } => write!(f, "profiler degraded for {table}.{column}: {cause}"),
            NonFatal::MetadataMissing { table, detail } => {
                write!(f, "metadata missing for table {table}: {detail}")
            }
        }
    }
}
