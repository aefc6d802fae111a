//! The graph store adapter (C2): a typed wrapper around a property-graph backend.
//!
//! Grounded on `knowledge_graph::graph_db::GraphDatabase` (petgraph-backed indexing,
//! `find_shortest_path` via `petgraph::algo::astar`, `get_graph_statistics`), but
//! diverging from `knowledge_graph::KnowledgeGraph::add_relationship`'s auto-vivification
//! of placeholder "Unknown" entities for missing endpoints: invariant 2 requires the
//! engine reject dangling edges at merge time, so `create_edge` here returns
//! `GraphError::DanglingEdge` instead of fabricating a node.
//!
//! No actual network transport is implemented — the backend connection itself is out of
//! scope (spec §1) — this models the in-process graph faithfully enough that C9/C10 can
//! be exercised and tested without a live database.

mod store;

pub use store::{EdgeRecord, GraphStats, GraphStore, NodeRecord};
