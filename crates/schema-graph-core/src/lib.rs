//! Schema graph construction engine.
//!
//! Transforms a SQLite database into a directed property graph capturing
//! schema, referential structure, per-column statistics, and descriptions:
//! - Read-only SQLite catalog and row introspection (`dal`)
//! - Optional per-table human-authored descriptions (`metadata`)
//! - Deterministic per-column statistics profiling (`profiler`)
//! - Graph assembly with invariant enforcement (`builder`, `graph`)
//! - Four-phase orchestration and atomic artifact output (`pipeline`, `serializer`)

pub mod builder;
pub mod config;
pub mod dal;
pub mod error;
pub mod external;
pub mod graph;
pub mod metadata;
pub mod pipeline;
pub mod profiler;
pub mod serializer;

pub use builder::{BuilderError, GraphBuilder};
pub use config::PipelineConfig;
pub use dal::{ColumnInfo, Dal, ForeignKeyDecl, RawValue, TableDescription, HARD_CAP};
pub use error::{NonFatal, PipelineError};
pub use external::{DatasetRecord, DatasetTag};
pub use graph::{
    ColumnNode, ColumnStatistics, CommonStats, Edge, EdgeType, FamilyStats, Node, RelationType,
    SchemaGraph, TableNode, GRAPH_SCHEMA_VERSION,
};
pub use metadata::{ColumnDescription, MetadataIndex, MetadataLoader};
pub use pipeline::{run_default, Pipeline, RunSummary};
