//! Graph Builder (GB, §4.4)
//!
//! Accumulates typed nodes and edges into a [`SchemaGraph`], enforcing the
//! node/edge invariants I1-I6 at construction time rather than leaving them
//! to be checked after the fact.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::graph::{ColumnNode, Edge, Node, RelationType, SchemaGraph, TableNode};

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    #[error("column {table}.{column} references a table that does not exist")]
    UnknownTable { table: String, column: String },

    #[error("foreign key references unknown table or column: {0}")]
    UnknownForeignKeyTarget(String),
}

/// Builds a [`SchemaGraph`] from table/column/foreign-key declarations,
/// mirroring the Pipeline Orchestrator's four phases (§4.5).
pub struct GraphBuilder {
    graph: SchemaGraph,
    /// `(from_table, from_column, to_table, to_column)` tuples already
    /// inserted, so repeated FK declarations are idempotent (§4.4).
    seen_fks: HashSet<(String, String, String, String)>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: SchemaGraph::new(),
            seen_fks: HashSet::new(),
        }
    }

    /// Add a Table node. Rejects duplicates.
    pub fn add_table(&mut self, table: TableNode) -> Result<(), BuilderError> {
        if self.graph.contains_node(&table.name) {
            return Err(BuilderError::DuplicateNode(table.name));
        }
        self.graph.insert_node(Node::Table(table));
        Ok(())
    }

    /// Add a Column node and its HAS_COLUMN edge in one call. Verifies the
    /// owning table exists (I1).
    pub fn add_column(
        &mut self,
        column: ColumnNode,
        relation_type: RelationType,
    ) -> Result<(), BuilderError> {
        let table_name = column.belongs_to.clone();
        if !self.graph.contains_node(&table_name) {
            return Err(BuilderError::UnknownTable {
                table: table_name,
                column: column.name,
            });
        }
        let key = column.key();
        if self.graph.contains_node(&key) {
            return Err(BuilderError::DuplicateNode(key));
        }
        self.graph.insert_node(Node::Column(column));
        self.graph
            .insert_edge(&table_name, &key, Edge::HasColumn { relation_type })
            .expect("both endpoints were just verified to exist");
        Ok(())
    }

    /// Add a FOREIGN_KEY edge. Computes `reference_path` and `fk_hash`;
    /// silently ignores an exact duplicate `(from_t, from_c, to_t, to_c)`
    /// tuple (idempotent, per §4.4).
    pub fn add_foreign_key_edge(
        &mut self,
        from_table: &str,
        from_column: &str,
        to_table: &str,
        to_column: &str,
    ) -> Result<(), BuilderError> {
        let tuple = (
            from_table.to_string(),
            from_column.to_string(),
            to_table.to_string(),
            to_column.to_string(),
        );
        if self.seen_fks.contains(&tuple) {
            debug!(?tuple, "duplicate foreign key declaration, skipping");
            return Ok(());
        }

        let from_column_key = format!("{from_table}.{from_column}");
        let to_column_key = format!("{to_table}.{to_column}");
        if !self.graph.contains_node(from_table)
            || !self.graph.contains_node(to_table)
            || !self.graph.contains_node(&from_column_key)
            || !self.graph.contains_node(&to_column_key)
        {
            return Err(BuilderError::UnknownForeignKeyTarget(format!(
                "{from_table}.{from_column} -> {to_table}.{to_column}"
            )));
        }

        let reference_path = format!("{from_table}.{from_column}={to_table}.{to_column}");
        let fk_hash = compute_fk_hash(from_table, from_column, to_table, to_column);

        self.graph
            .insert_edge(
                from_table,
                to_table,
                Edge::ForeignKey {
                    from_table: from_table.to_string(),
                    from_column: from_column.to_string(),
                    to_table: to_table.to_string(),
                    to_column: to_column.to_string(),
                    reference_path,
                    fk_hash,
                },
            )
            .expect("both endpoints were just verified to exist");
        self.seen_fks.insert(tuple);
        Ok(())
    }

    /// Walk all FOREIGN_KEY edges and: append `reference_path` to the
    /// endpoints' `reference_to`/`referenced_by`, mark participating
    /// columns `is_foreign_key = true`, and upgrade HAS_COLUMN
    /// `relation_type` where a column is both PK and FK.
    ///
    /// Denormalized lists are rebuilt from scratch here rather than
    /// appended to incrementally, so re-running `finalize` never produces
    /// duplicate entries.
    pub fn finalize(&mut self) -> Result<(), BuilderError> {
        for table in self.graph.tables().map(|t| t.name.clone()).collect::<Vec<_>>() {
            if let Some(node) = self.graph.get_node_mut(&table).and_then(|n| n.as_table_mut()) {
                node.reference_to.clear();
                node.referenced_by.clear();
            }
        }

        let fk_edges: Vec<(String, String, String, String, String)> = self
            .graph
            .edges_by_type(crate::graph::EdgeType::ForeignKey)
            .map(|(_, _, edge)| match edge {
                Edge::ForeignKey {
                    from_table,
                    from_column,
                    to_table,
                    to_column,
                    reference_path,
                    ..
                } => (
                    from_table.clone(),
                    from_column.clone(),
                    to_table.clone(),
                    to_column.clone(),
                    reference_path.clone(),
                ),
                _ => unreachable!("edges_by_type filtered to ForeignKey"),
            })
            .collect();

        for (from_table, from_column, to_table, _to_column, reference_path) in &fk_edges {
            if let Some(node) = self
                .graph
                .get_node_mut(from_table)
                .and_then(|n| n.as_table_mut())
            {
                node.reference_to.push(reference_path.clone());
            }
            if let Some(node) = self
                .graph
                .get_node_mut(to_table)
                .and_then(|n| n.as_table_mut())
            {
                node.referenced_by.push(reference_path.clone());
            }

            let from_column_key = format!("{from_table}.{from_column}");
            if let Some(node) = self
                .graph
                .get_node_mut(&from_column_key)
                .and_then(|n| n.as_column_mut())
            {
                node.is_foreign_key = true;
            }

            for idx in self.graph.outgoing_edge_indices(from_table) {
                let is_fk_column_edge = matches!(
                    self.graph.edge_endpoints(idx),
                    Some((_, target)) if target.key() == from_column_key
                );
                if !is_fk_column_edge {
                    continue;
                }
                if let Some(Edge::HasColumn { relation_type }) = self.graph.edge_weight_mut(idx) {
                    *relation_type = relation_type.upgrade_to_foreign_key();
                }
            }
        }
        Ok(())
    }

    /// Consume the builder, returning the finished graph.
    pub fn graph(self) -> SchemaGraph {
        self.graph
    }

    /// Borrow the graph under construction without consuming the builder.
    pub fn graph_ref(&self) -> &SchemaGraph {
        &self.graph
    }
}

/// Stable fingerprint of an FK four-tuple, used to disambiguate parallel
/// FK edges between the same two tables.
pub fn compute_fk_hash(from_table: &str, from_column: &str, to_table: &str, to_column: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(from_table.as_bytes());
    hasher.update(b".");
    hasher.update(from_column.as_bytes());
    hasher.update(b"->");
    hasher.update(to_table.as_bytes());
    hasher.update(b".");
    hasher.update(to_column.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    bytes
        .iter()
        .take(len / 2 + len % 2)
        .map(|b| format!("{b:02x}"))
        .collect::<String>()
        .chars()
        .take(len)
        .collect()
}
