//! Schema Graph Definitions
//!
//! Defines the Table/Column node model and HAS_COLUMN/FOREIGN_KEY edge model
//! described by the schema graph data model, and a `SchemaGraph` wrapper
//! around `petgraph::StableGraph` for O(1) keyed node lookup and adjacency
//! iteration split by edge type.
//!
//! Schema version: 1.0

use std::collections::HashMap;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use serde_json::Value;

/// Schema version constant for the emitted artifact.
pub const GRAPH_SCHEMA_VERSION: &str = "1.0";

// ============================================================================
// Edge Types
// ============================================================================

/// Types of relationships between schema entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// Table -> Column structural ownership.
    HasColumn,
    /// Table -> Table referential relationship.
    ForeignKey,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::HasColumn => "HAS_COLUMN",
            EdgeType::ForeignKey => "FOREIGN_KEY",
        }
    }
}

/// `relation_type` carried by every HAS_COLUMN edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    PrimaryKey,
    ForeignKey,
    PrimaryAndForeignKey,
    NormalColumn,
}

impl RelationType {
    /// Upgrade a primary/normal relation to reflect that the column also
    /// participates in a foreign key. Idempotent.
    pub fn upgrade_to_foreign_key(self) -> Self {
        match self {
            RelationType::PrimaryKey => RelationType::PrimaryAndForeignKey,
            RelationType::NormalColumn => RelationType::ForeignKey,
            other => other,
        }
    }
}

// ============================================================================
// Column statistics (Data Profiler output, §4.3)
// ============================================================================

/// Statistics shared by every column regardless of inferred type family.
#[derive(Debug, Clone, Serialize)]
pub struct CommonStats {
    /// Up to 6 non-null values in input order; long text values truncated.
    pub samples: Vec<Value>,
    pub null_count: usize,
    /// `"{p}%"` where p = round(100 * non_null / total).
    pub data_integrity: String,
}

/// Type-family-specific statistics. Serialized with `#[serde(flatten)]` so
/// the artifact's Column node stays a single flat attribute map even though
/// the in-memory representation is a tagged variant.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FamilyStats {
    Numeric {
        #[serde(skip_serializing_if = "Option::is_none")]
        range: Option<(f64, f64)>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mean: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<Value>,
    },
    Textual {
        #[serde(skip_serializing_if = "Option::is_none")]
        categories: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        avg_length: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        word_frequency: Option<Vec<(String, usize)>>,
    },
    Temporal {
        #[serde(skip_serializing_if = "Option::is_none")]
        time_span: Option<String>,
    },
    /// No family-specific statistics beyond the common block.
    Opaque {},
}

/// The full statistics block merged into a Column node: common block plus
/// the family-specific block, flattened together at serialization time.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStatistics {
    #[serde(flatten)]
    pub common: CommonStats,
    #[serde(flatten)]
    pub family: FamilyStats,
}

// ============================================================================
// Nodes
// ============================================================================

/// A Table node (§3 Data Model).
#[derive(Debug, Clone, Serialize)]
pub struct TableNode {
    pub name: String,
    pub row_count: u64,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub primary_key: Vec<String>,
    pub foreign_key: Vec<String>,
    /// Filled in by `finalize` after all FK edges exist.
    #[serde(default)]
    pub reference_to: Vec<String>,
    #[serde(default)]
    pub referenced_by: Vec<String>,
}

impl TableNode {
    pub fn new(
        name: impl Into<String>,
        row_count: u64,
        columns: Vec<String>,
        primary_key: Vec<String>,
        foreign_key: Vec<String>,
    ) -> Self {
        let name = name.into();
        Self {
            column_count: columns.len(),
            columns,
            primary_key,
            foreign_key,
            reference_to: Vec::new(),
            referenced_by: Vec::new(),
            name,
            row_count,
        }
    }
}

/// A Column node (§3 Data Model). Key is `"{belongs_to}.{name}"`.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnNode {
    pub name: String,
    pub belongs_to: String,
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub is_nullable: bool,
    #[serde(flatten)]
    pub statistics: ColumnStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_description: Option<String>,
    /// Set when the profiler degraded to common-block-only statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiler_warning: Option<String>,
}

impl ColumnNode {
    pub fn key(&self) -> String {
        format!("{}.{}", self.belongs_to, self.name)
    }
}

/// A node in the schema graph: either a Table or a Column.
///
/// `#[serde(tag = "type")]` produces the `type="Table"`/`type="Column"`
/// discriminator the data model requires, with the variant's fields merged
/// into the same JSON object.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Node {
    Table(TableNode),
    Column(ColumnNode),
}

impl Node {
    /// The node's graph key: a table name, or `"{table}.{column}"`.
    pub fn key(&self) -> String {
        match self {
            Node::Table(t) => t.name.clone(),
            Node::Column(c) => c.key(),
        }
    }

    pub fn as_table(&self) -> Option<&TableNode> {
        match self {
            Node::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableNode> {
        match self {
            Node::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnNode> {
        match self {
            Node::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_column_mut(&mut self) -> Option<&mut ColumnNode> {
        match self {
            Node::Column(c) => Some(c),
            _ => None,
        }
    }
}

// ============================================================================
// Edges
// ============================================================================

/// Edge weight stored in the petgraph instance.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Edge {
    HasColumn {
        relation_type: RelationType,
    },
    ForeignKey {
        from_table: String,
        from_column: String,
        to_table: String,
        to_column: String,
        reference_path: String,
        fk_hash: String,
    },
}

impl Edge {
    pub fn edge_type(&self) -> EdgeType {
        match self {
            Edge::HasColumn { .. } => EdgeType::HasColumn,
            Edge::ForeignKey { .. } => EdgeType::ForeignKey,
        }
    }
}

// ============================================================================
// SchemaGraph (petgraph-backed)
// ============================================================================

/// A petgraph-based schema graph for O(1) keyed lookup and typed adjacency
/// iteration (HAS_COLUMN neighborhoods vs FOREIGN_KEY neighborhoods).
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    graph: StableGraph<Node, Edge, petgraph::Directed>,
    node_index: HashMap<String, NodeIndex>,
    schema_version: String,
}

impl Default for SchemaGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            node_index: HashMap::new(),
            schema_version: GRAPH_SCHEMA_VERSION.to_string(),
        }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    // -- Node operations -----------------------------------------------

    /// Insert a node, returning its index. Callers (the builder) are
    /// responsible for rejecting duplicate keys before calling this.
    pub fn insert_node(&mut self, node: Node) -> NodeIndex {
        let key = node.key();
        let idx = self.graph.add_node(node);
        self.node_index.insert(key, idx);
        idx
    }

    pub fn get_node(&self, key: &str) -> Option<&Node> {
        self.node_index
            .get(key)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    pub fn get_node_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.node_index
            .get(key)
            .copied()
            .and_then(|idx| self.graph.node_weight_mut(idx))
    }

    pub fn node_index(&self, key: &str) -> Option<NodeIndex> {
        self.node_index.get(key).copied()
    }

    pub fn contains_node(&self, key: &str) -> bool {
        self.node_index.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableNode> {
        self.graph.node_weights().filter_map(|n| n.as_table())
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnNode> {
        self.graph.node_weights().filter_map(|n| n.as_column())
    }

    // -- Edge operations ------------------------------------------------

    pub fn insert_edge(&mut self, source: &str, target: &str, edge: Edge) -> Option<EdgeIndex> {
        let source_idx = *self.node_index.get(source)?;
        let target_idx = *self.node_index.get(target)?;
        Some(self.graph.add_edge(source_idx, target_idx, edge))
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edges_by_type(
        &self,
        edge_type: EdgeType,
    ) -> impl Iterator<Item = (&Node, &Node, &Edge)> {
        self.graph.edge_references().filter_map(move |edge_ref| {
            if edge_ref.weight().edge_type() == edge_type {
                let source = self.graph.node_weight(edge_ref.source())?;
                let target = self.graph.node_weight(edge_ref.target())?;
                Some((source, target, edge_ref.weight()))
            } else {
                None
            }
        })
    }

    pub fn outgoing_edges(&self, key: &str) -> impl Iterator<Item = (&Node, &Edge)> {
        let idx = self.node_index.get(key).copied();
        self.graph
            .edges_directed(
                idx.unwrap_or(NodeIndex::new(usize::MAX)),
                Direction::Outgoing,
            )
            .filter_map(move |edge_ref| {
                let target = self.graph.node_weight(edge_ref.target())?;
                Some((target, edge_ref.weight()))
            })
    }

    pub fn incoming_edges(&self, key: &str) -> impl Iterator<Item = (&Node, &Edge)> {
        let idx = self.node_index.get(key).copied();
        self.graph
            .edges_directed(
                idx.unwrap_or(NodeIndex::new(usize::MAX)),
                Direction::Incoming,
            )
            .filter_map(move |edge_ref| {
                let source = self.graph.node_weight(edge_ref.source())?;
                Some((source, edge_ref.weight()))
            })
    }

    /// Mutable access to every outgoing edge weight from a node, used by
    /// `finalize` to upgrade HAS_COLUMN relation types.
    pub fn outgoing_edge_indices(&self, key: &str) -> Vec<EdgeIndex> {
        let idx = match self.node_index.get(key) {
            Some(&idx) => idx,
            None => return Vec::new(),
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.id())
            .collect()
    }

    pub fn edge_weight_mut(&mut self, idx: EdgeIndex) -> Option<&mut Edge> {
        self.graph.edge_weight_mut(idx)
    }

    pub fn edge_endpoints(&self, idx: EdgeIndex) -> Option<(&Node, &Node)> {
        let (s, t) = self.graph.edge_endpoints(idx)?;
        Some((self.graph.node_weight(s)?, self.graph.node_weight(t)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> Node {
        Node::Table(TableNode::new(
            name,
            0,
            vec!["id".to_string()],
            vec!["id".to_string()],
            vec![],
        ))
    }

    #[test]
    fn insert_and_lookup_node() {
        let mut g = SchemaGraph::new();
        g.insert_node(table("users"));
        assert!(g.contains_node("users"));
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.get_node("users").unwrap().key(), "users");
    }

    #[test]
    fn has_column_edge_round_trip() {
        let mut g = SchemaGraph::new();
        g.insert_node(table("users"));
        g.insert_node(Node::Column(ColumnNode {
            name: "id".into(),
            belongs_to: "users".into(),
            data_type: "INTEGER".into(),
            is_primary_key: true,
            is_foreign_key: false,
            is_nullable: false,
            statistics: ColumnStatistics {
                common: CommonStats {
                    samples: vec![],
                    null_count: 0,
                    data_integrity: "100%".into(),
                },
                family: FamilyStats::Numeric {
                    range: None,
                    mean: None,
                    mode: None,
                },
            },
            column_description: None,
            value_description: None,
            profiler_warning: None,
        }));
        let idx = g
            .insert_edge(
                "users",
                "users.id",
                Edge::HasColumn {
                    relation_type: RelationType::PrimaryKey,
                },
            )
            .expect("both endpoints exist");
        assert!(g.graph.edge_weight(idx).is_some());
        assert_eq!(g.edge_count(), 1);
        let (_, target, edge) = g.edges_by_type(EdgeType::HasColumn).next().unwrap();
        assert_eq!(target.key(), "users.id");
        assert!(matches!(
            edge,
            Edge::HasColumn {
                relation_type: RelationType::PrimaryKey
            }
        ));
    }

    #[test]
    fn relation_type_upgrade_is_idempotent() {
        assert_eq!(
            RelationType::PrimaryKey.upgrade_to_foreign_key(),
            RelationType::PrimaryAndForeignKey
        );
        assert_eq!(
            RelationType::PrimaryAndForeignKey.upgrade_to_foreign_key(),
            RelationType::PrimaryAndForeignKey
        );
        assert_eq!(
            RelationType::NormalColumn.upgrade_to_foreign_key(),
            RelationType::ForeignKey
        );
    }
}
