//! Artifact Serializer (§5 External Interfaces)
//!
//! Emits the schema graph as a single JSON document: a `schema_version`
//! stamp plus a flat array of tagged nodes and a flat array of tagged
//! edges. Writes are atomic: the document is written to a sibling `.tmp`
//! file and renamed into place, so a reader never observes a partial file.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::PipelineError;
use crate::graph::SchemaGraph;

#[derive(Debug, Serialize)]
struct Artifact<'a> {
    schema_version: &'a str,
    nodes: Vec<Value>,
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Serialize)]
struct EdgeRecord {
    source: String,
    target: String,
    #[serde(flatten)]
    edge: Value,
}

/// Serialize `graph` to a single JSON document.
pub fn to_json(graph: &SchemaGraph) -> Result<String, serde_json::Error> {
    let nodes: Vec<Value> = graph
        .iter_nodes()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    let mut edges = Vec::with_capacity(graph.edge_count());
    for (source, target, edge) in graph.edges_by_type(crate::graph::EdgeType::HasColumn) {
        edges.push(EdgeRecord {
            source: source.key(),
            target: target.key(),
            edge: serde_json::to_value(edge)?,
        });
    }
    for (source, target, edge) in graph.edges_by_type(crate::graph::EdgeType::ForeignKey) {
        edges.push(EdgeRecord {
            source: source.key(),
            target: target.key(),
            edge: serde_json::to_value(edge)?,
        });
    }

    let artifact = Artifact {
        schema_version: graph.schema_version(),
        nodes,
        edges,
    };
    serde_json::to_string_pretty(&artifact)
}

/// Serialize and atomically write `graph` to `path`: write to `path.tmp`,
/// flush, then rename over the destination.
pub fn write_atomic(graph: &SchemaGraph, path: &Path) -> Result<(), PipelineError> {
    let document = to_json(graph).map_err(|source| PipelineError::ArtifactWrite {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, source),
    })?;

    let tmp_path = path.with_extension("tmp");
    let write_result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(document.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    write_result.map_err(|source| PipelineError::ArtifactWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::graph::{ColumnNode, ColumnStatistics, CommonStats, FamilyStats, RelationType, TableNode};
    use tempfile::TempDir;

    fn sample_graph() -> SchemaGraph {
        let mut b = GraphBuilder::new();
        b.add_table(TableNode::new("users", 1, vec!["id".into()], vec!["id".into()], vec![]))
            .unwrap();
        b.add_column(
            ColumnNode {
                name: "id".into(),
                belongs_to: "users".into(),
                data_type: "INTEGER".into(),
                is_primary_key: true,
                is_foreign_key: false,
                is_nullable: false,
                statistics: ColumnStatistics {
                    common: CommonStats {
                        samples: vec![Value::from(1)],
                        null_count: 0,
                        data_integrity: "100%".into(),
                    },
                    family: FamilyStats::Numeric {
                        range: Some((1.0, 1.0)),
                        mean: Some(1.0),
                        mode: None,
                    },
                },
                column_description: None,
                value_description: None,
                profiler_warning: None,
            },
            RelationType::PrimaryKey,
        )
        .unwrap();
        b.finalize().unwrap();
        b.graph()
    }

    #[test]
    fn to_json_includes_schema_version_and_counts() {
        let graph = sample_graph();
        let document = to_json(&graph).unwrap();
        let parsed: Value = serde_json::from_str(&document).unwrap();
        assert_eq!(parsed["schema_version"], "1.0");
        assert_eq!(parsed["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["edges"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn write_atomic_leaves_no_tmp_file_behind() {
        let graph = sample_graph();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        write_atomic(&graph, &path).unwrap();
        assert!(path.is_file());
        assert!(!path.with_extension("tmp").exists());
    }
}
