//! In-process model of the graph store adapter (C2). Grounded on
//! `knowledge_graph::graph_db::GraphDatabase`'s petgraph indexing, `find_shortest_path` via
//! `petgraph::algo::astar`, and `get_graph_statistics`; diverges from
//! `KnowledgeGraph::add_relationship` by refusing to auto-vivify placeholder nodes for
//! missing edge endpoints (spec invariant 2).
//!
//! The real backend (Neo4j or similar, per spec §1/§6) is out of scope; this is the typed
//! surface C9/C10 write through, backed by an in-memory graph so the pipelines and their
//! tests don't need a live database.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::error::{GraphError, GraphResult};

/// A node as stored: its kind (one of the five spec §3 entity kinds), its natural id, and
/// its property bag. `(kind, id)` is the node's unique identity (invariant 1).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub kind: String,
    pub id: String,
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub edge_type: String,
    pub source_kind: String,
    pub source_id: String,
    pub target_kind: String,
    pub target_id: String,
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub distinct_labels: usize,
    pub distinct_edge_types: usize,
}

/// Connection state the adapter must be in before any operation besides `connect` succeeds
/// (spec §4.2 failure mode `NotConnected`).
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Connected { uri: String },
}

/// A typed wrapper around a property graph. Every write is parameterized by construction —
/// there is no query string for callers to interpolate labels or property names into, so
/// the "never string-interpolated except from a whitelist" rule (spec §4.2) holds by
/// construction rather than by discipline.
pub struct GraphStore {
    state: ConnectionState,
    graph: DiGraph<NodeRecord, EdgeRecord>,
    index: HashMap<(String, String), NodeIndex>,
    schema_labels: Vec<String>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStore {
            state: ConnectionState::Disconnected,
            graph: DiGraph::new(),
            index: HashMap::new(),
            schema_labels: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    /// Connects to the backend (spec §4.2: "connect/disconnect with explicit
    /// URI/user/password/database"). The transport itself is out of scope (spec §1); this
    /// only records connection state so later operations can report `NotConnected`.
    pub fn connect(&mut self, uri: &str, _user: &str, _password: &str, _database: &str) {
        self.state = ConnectionState::Connected { uri: uri.to_string() };
        tracing::info!(uri, "graph store connected");
    }

    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        tracing::info!("graph store disconnected");
    }

    fn require_connected(&self) -> GraphResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(GraphError::NotConnected)
        }
    }

    /// Ensures a unique-id constraint per entity kind and a search index on the kinds we
    /// recognize (spec §4.2 "ensure schema"). In this in-process model that means
    /// remembering which labels are schema-bootstrapped; a real backend would issue
    /// `CREATE CONSTRAINT`/`CREATE INDEX` statements here.
    pub fn ensure_schema(&mut self, labels: &[&str]) -> GraphResult<()> {
        self.require_connected()?;
        for label in labels {
            if !self.schema_labels.iter().any(|l| l == label) {
                self.schema_labels.push(label.to_string());
            }
        }
        Ok(())
    }

    /// Creates a node. Idempotent modulo identifier (spec §4.2): a create with an existing
    /// `(kind, id)` is a no-op that returns the existing id rather than erroring, matching
    /// "All operations are idempotent modulo identifier."
    pub fn create_node(
        &mut self,
        kind: &str,
        id: &str,
        properties: HashMap<String, String>,
    ) -> GraphResult<String> {
        self.require_connected()?;
        let key = (kind.to_string(), id.to_string());
        if self.index.contains_key(&key) {
            return Ok(id.to_string());
        }
        let record = NodeRecord {
            kind: kind.to_string(),
            id: id.to_string(),
            properties,
        };
        let idx = self.graph.add_node(record);
        self.index.insert(key, idx);
        Ok(id.to_string())
    }

    /// Creates an edge. Rejects dangling edges at merge time (invariant 2): both endpoints
    /// must already exist as nodes of the given kind, unlike the teacher's
    /// `KnowledgeGraph::add_relationship`, which fabricates "Unknown" placeholder entities
    /// for missing endpoints.
    pub fn create_edge(
        &mut self,
        edge_type: &str,
        source_kind: &str,
        source_id: &str,
        target_kind: &str,
        target_id: &str,
        properties: HashMap<String, String>,
    ) -> GraphResult<()> {
        self.require_connected()?;
        let source_key = (source_kind.to_string(), source_id.to_string());
        let target_key = (target_kind.to_string(), target_id.to_string());

        let &source_idx = self
            .index
            .get(&source_key)
            .ok_or_else(|| GraphError::DanglingEdge(format!("{}:{}", source_kind, source_id)))?;
        let &target_idx = self
            .index
            .get(&target_key)
            .ok_or_else(|| GraphError::DanglingEdge(format!("{}:{}", target_kind, target_id)))?;

        let record = EdgeRecord {
            edge_type: edge_type.to_string(),
            source_kind: source_kind.to_string(),
            source_id: source_id.to_string(),
            target_kind: target_kind.to_string(),
            target_id: target_id.to_string(),
            properties,
        };
        self.graph.add_edge(source_idx, target_idx, record);
        Ok(())
    }

    pub fn read_node(&self, kind: &str, id: &str) -> GraphResult<NodeRecord> {
        self.require_connected()?;
        let key = (kind.to_string(), id.to_string());
        let &idx = self.index.get(&key).ok_or_else(|| GraphError::NodeNotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        })?;
        Ok(self.graph[idx].clone())
    }

    pub fn list_nodes_by_label(&self, kind: &str, limit: usize) -> GraphResult<Vec<NodeRecord>> {
        self.require_connected()?;
        Ok(self
            .graph
            .node_weights()
            .filter(|n| n.kind == kind)
            .take(limit)
            .cloned()
            .collect())
    }

    /// Substring search across property values of every node (spec §4.2 "full-text-ish
    /// search by substring across property values").
    pub fn search(&self, substring: &str) -> GraphResult<Vec<NodeRecord>> {
        self.require_connected()?;
        let needle = substring.to_lowercase();
        Ok(self
            .graph
            .node_weights()
            .filter(|n| {
                n.properties
                    .values()
                    .any(|v| v.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    /// Bounded-length shortest path between two nodes, via `petgraph::algo::astar` with a
    /// uniform edge weight, same as `GraphDatabase::find_shortest_path`.
    pub fn shortest_path(
        &self,
        from: (&str, &str),
        to: (&str, &str),
        max_length: usize,
    ) -> GraphResult<Option<Vec<(String, String)>>> {
        self.require_connected()?;
        let from_key = (from.0.to_string(), from.1.to_string());
        let to_key = (to.0.to_string(), to.1.to_string());
        let Some(&from_idx) = self.index.get(&from_key) else {
            return Ok(None);
        };
        let Some(&to_idx) = self.index.get(&to_key) else {
            return Ok(None);
        };

        let result = petgraph::algo::astar(
            &self.graph,
            from_idx,
            |finish| finish == to_idx,
            |_| 1u32,
            |_| 0u32,
        );

        Ok(result.and_then(|(cost, path)| {
            if cost as usize > max_length {
                return None;
            }
            Some(
                path.into_iter()
                    .map(|idx| {
                        let n = &self.graph[idx];
                        (n.kind.clone(), n.id.clone())
                    })
                    .collect(),
            )
        }))
    }

    /// Degree-ranked neighbors, standing in for spec §4.2's "recommendations" operation:
    /// the nodes reachable in one hop from `node`, ordered by their own total degree
    /// (most-connected first) so a caller gets the most structurally significant
    /// neighbors first.
    pub fn recommend_neighbors(
        &self,
        kind: &str,
        id: &str,
        limit: usize,
    ) -> GraphResult<Vec<NodeRecord>> {
        self.require_connected()?;
        let key = (kind.to_string(), id.to_string());
        let Some(&idx) = self.index.get(&key) else {
            return Ok(Vec::new());
        };

        let mut neighbors: Vec<(NodeIndex, usize)> = self
            .graph
            .neighbors_undirected(idx)
            .map(|n| (n, self.graph.edges(n).count() + self.degree_incoming(n)))
            .collect();
        neighbors.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(neighbors
            .into_iter()
            .take(limit)
            .map(|(n, _)| self.graph[n].clone())
            .collect())
    }

    fn degree_incoming(&self, idx: NodeIndex) -> usize {
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .count()
    }

    pub fn statistics(&self) -> GraphStats {
        let mut labels: Vec<&str> = self.graph.node_weights().map(|n| n.kind.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();

        let mut edge_types: Vec<&str> = self.graph.edge_weights().map(|e| e.edge_type.as_str()).collect();
        edge_types.sort_unstable();
        edge_types.dedup();

        GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            distinct_labels: labels.len(),
            distinct_edge_types: edge_types.len(),
        }
    }

    /// Reports whether a relationship of `edge_type` exists from (kind,id) `a` to `b`,
    /// used by the supplemented substance↔substance compatibility shape check (SPEC_FULL
    /// §C) to flag a STORED_IN attempt between substances independently marked
    /// `INCOMPATIBLE_WITH` each other.
    pub fn relationship_exists(&self, a: (&str, &str), edge_type: &str, b: (&str, &str)) -> bool {
        let Some(&a_idx) = self.index.get(&(a.0.to_string(), a.1.to_string())) else {
            return false;
        };
        let Some(&b_idx) = self.index.get(&(b.0.to_string(), b.1.to_string())) else {
            return false;
        };
        self.graph
            .edges_connecting(a_idx, b_idx)
            .any(|e| e.weight().edge_type == edge_type)
    }

    pub fn export_nodes(&self) -> Vec<NodeRecord> {
        self.graph.node_weights().cloned().collect()
    }

    pub fn export_edges(&self) -> Vec<EdgeRecord> {
        self.graph.edge_weights().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_store() -> GraphStore {
        let mut store = GraphStore::new();
        store.connect("bolt://localhost:7687", "neo4j", "", "hazsafe");
        store
    }

    #[test]
    fn operations_fail_before_connect() {
        let mut store = GraphStore::new();
        let err = store.create_node("HazardousSubstance", "s1", HashMap::new());
        assert!(matches!(err, Err(GraphError::NotConnected)));
    }

    #[test]
    fn create_node_is_idempotent_by_id() {
        let mut store = connected_store();
        let mut props = HashMap::new();
        props.insert("name".to_string(), "Sulfuric Acid".to_string());
        store.create_node("HazardousSubstance", "s1", props.clone()).unwrap();
        let id = store.create_node("HazardousSubstance", "s1", HashMap::new()).unwrap();
        assert_eq!(id, "s1");
        assert_eq!(store.statistics().node_count, 1);
    }

    #[test]
    fn create_edge_rejects_dangling_endpoints() {
        let mut store = connected_store();
        store.create_node("HazardousSubstance", "s1", HashMap::new()).unwrap();
        let result = store.create_edge(
            "STORED_IN",
            "HazardousSubstance",
            "s1",
            "Container",
            "missing",
            HashMap::new(),
        );
        assert!(matches!(result, Err(GraphError::DanglingEdge(_))));
    }

    #[test]
    fn create_edge_succeeds_when_both_endpoints_exist() {
        let mut store = connected_store();
        store.create_node("HazardousSubstance", "s1", HashMap::new()).unwrap();
        store.create_node("Container", "c1", HashMap::new()).unwrap();
        store
            .create_edge("STORED_IN", "HazardousSubstance", "s1", "Container", "c1", HashMap::new())
            .unwrap();
        assert_eq!(store.statistics().edge_count, 1);
    }

    #[test]
    fn shortest_path_finds_direct_edge() {
        let mut store = connected_store();
        store.create_node("HazardousSubstance", "s1", HashMap::new()).unwrap();
        store.create_node("Container", "c1", HashMap::new()).unwrap();
        store
            .create_edge("STORED_IN", "HazardousSubstance", "s1", "Container", "c1", HashMap::new())
            .unwrap();
        let path = store
            .shortest_path(("HazardousSubstance", "s1"), ("Container", "c1"), 5)
            .unwrap();
        assert_eq!(path.unwrap().len(), 2);
    }

    #[test]
    fn search_matches_substring_in_property_values() {
        let mut store = connected_store();
        let mut props = HashMap::new();
        props.insert("name".to_string(), "Sulfuric Acid".to_string());
        store.create_node("HazardousSubstance", "s1", props).unwrap();
        let hits = store.search("sulfuric").unwrap();
        assert_eq!(hits.len(), 1);
    }
}
