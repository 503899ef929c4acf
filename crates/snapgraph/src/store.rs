//! Graph storage behind the tolerant builder.
//!
//! The builder decides *which* node a coordinate belongs to; a
//! [`GraphStore`] owns the nodes and edges themselves. [`PetgraphStore`]
//! is the default implementation, built on a `petgraph` stable graph so
//! that removing an edge never invalidates other node or edge handles.

use std::fmt;
use std::hash::Hash;

use geo::{Coord, LineString};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};

/// Errors reported by a [`GraphStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// An edge referenced a node the store does not hold.
    #[error("node {0} does not exist in the graph store")]
    UnknownNode(String),

    /// The store refused to create a node or edge.
    #[error("graph store rejected the operation: {0}")]
    Rejected(String),
}

/// Node and edge container used by [`TolerantEdgeBuilder`](crate::TolerantEdgeBuilder).
///
/// Handles are small `Copy` values (arena indices); the store owns
/// every coordinate and geometry. Each node carries its representative
/// coordinate and each edge its repaired line geometry.
pub trait GraphStore {
    /// Node handle.
    type Node: Copy + Eq + Hash + fmt::Debug;
    /// Edge handle.
    type Edge: Copy + Eq + fmt::Debug;

    /// Create a node whose representative coordinate is `representative`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot hold another node.
    fn add_node(&mut self, representative: Coord<f64>) -> Result<Self::Node, StoreError>;

    /// Representative coordinate of `node`, if the node exists.
    fn node_coord(&self, node: Self::Node) -> Option<Coord<f64>>;

    /// Create an edge between `a` and `b` carrying `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownNode`] if either node is missing, or
    /// another [`StoreError`] if the store refuses the edge.
    fn add_edge(
        &mut self,
        a: Self::Node,
        b: Self::Node,
        geometry: LineString<f64>,
    ) -> Result<Self::Edge, StoreError>;

    /// An edge connecting `a` and `b` in either direction.
    ///
    /// With parallel edges between the same pair, which one is returned
    /// is up to the store.
    fn find_edge(&self, a: Self::Node, b: Self::Node) -> Option<Self::Edge>;

    /// Line geometry attached to `edge`.
    fn edge_geometry(&self, edge: Self::Edge) -> Option<&LineString<f64>>;

    /// The two nodes joined by `edge`.
    fn edge_endpoints(&self, edge: Self::Edge) -> Option<(Self::Node, Self::Node)>;

    /// Remove `edge`, returning its geometry. Nodes are left in place.
    fn remove_edge(&mut self, edge: Self::Edge) -> Option<LineString<f64>>;

    /// Number of nodes in the store.
    fn node_count(&self) -> usize;

    /// Number of edges in the store.
    fn edge_count(&self) -> usize;
}

/// The undirected graph type held by [`PetgraphStore`].
///
/// Node weights are representative coordinates; edge weights are the
/// repaired line geometries.
pub type SnapGraph = StableUnGraph<Coord<f64>, LineString<f64>>;

/// [`GraphStore`] backed by a `petgraph` [`StableUnGraph`].
#[derive(Debug, Clone, Default)]
pub struct PetgraphStore {
    graph: SnapGraph,
}

impl PetgraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying graph, for traversal with `petgraph` APIs.
    #[must_use]
    pub const fn graph(&self) -> &SnapGraph {
        &self.graph
    }

    /// Consume the store and return the underlying graph.
    #[must_use]
    pub fn into_graph(self) -> SnapGraph {
        self.graph
    }

    /// Representative coordinates of every node.
    pub fn node_coords(&self) -> impl Iterator<Item = Coord<f64>> + '_ {
        self.graph
            .node_indices()
            .filter_map(|n| self.graph.node_weight(n).copied())
    }

    /// Geometries of every edge.
    pub fn edge_geometries(&self) -> impl Iterator<Item = &LineString<f64>> + '_ {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_weight(e))
    }
}

impl GraphStore for PetgraphStore {
    type Node = NodeIndex;
    type Edge = EdgeIndex;

    fn add_node(&mut self, representative: Coord<f64>) -> Result<NodeIndex, StoreError> {
        // `NodeIndex::end()` is reserved by petgraph as the "no node" marker.
        if self.graph.node_count() >= NodeIndex::<u32>::end().index() {
            return Err(StoreError::Rejected("node capacity exhausted".to_owned()));
        }
        Ok(self.graph.add_node(representative))
    }

    fn node_coord(&self, node: NodeIndex) -> Option<Coord<f64>> {
        self.graph.node_weight(node).copied()
    }

    fn add_edge(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        geometry: LineString<f64>,
    ) -> Result<EdgeIndex, StoreError> {
        for node in [a, b] {
            if !self.graph.contains_node(node) {
                return Err(StoreError::UnknownNode(format!("{}", node.index())));
            }
        }
        if self.graph.edge_count() >= EdgeIndex::<u32>::end().index() {
            return Err(StoreError::Rejected("edge capacity exhausted".to_owned()));
        }
        Ok(self.graph.add_edge(a, b, geometry))
    }

    fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    fn edge_geometry(&self, edge: EdgeIndex) -> Option<&LineString<f64>> {
        self.graph.edge_weight(edge)
    }

    fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    fn remove_edge(&mut self, edge: EdgeIndex) -> Option<LineString<f64>> {
        self.graph.remove_edge(edge)
    }

    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
