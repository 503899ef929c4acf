//! Incremental tolerant edge builder.
//!
//! [`TolerantEdgeBuilder`] turns line strings into graph edges. Both
//! endpoints are resolved through a [`NodeRegistry`], so endpoints that
//! differ by less than the tolerance share a node. When an endpoint was
//! snapped, the node's representative coordinate is added to the line
//! (prepended or appended) so that every edge geometry starts and ends
//! exactly on its nodes. The original coordinates are never moved or
//! dropped.
//!
//! Snapping happens on [`add`](TolerantEdgeBuilder::add) only.
//! [`get`](TolerantEdgeBuilder::get) and
//! [`remove`](TolerantEdgeBuilder::remove) look endpoints up exactly, so
//! a line whose endpoint was snapped when it was added is not found
//! again by its original coordinates:
//!
//! ```
//! use geo::line_string;
//! use snapgraph::{BuildConfig, TolerantEdgeBuilder};
//!
//! # fn main() -> Result<(), snapgraph::GraphError> {
//! let mut builder = TolerantEdgeBuilder::with_config(BuildConfig::new(0.02))?;
//! builder.add(&line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 2.0)])?;
//! let snapped = line_string![(x: 2.01, y: 2.0007), (x: 3.0, y: 3.0)];
//! let edge = builder.add(&snapped)?;
//!
//! // The geometry was extended back to the shared node at (2, 2).
//! assert_eq!(edge.geometry.0.len(), 3);
//! // Exact lookups do not know the snapped coordinate.
//! assert!(builder.get(&snapped)?.is_none());
//! # Ok(())
//! # }
//! ```

use geo::{Coord, LineString};

use crate::diagnostics::BuildDiagnostics;
use crate::registry::NodeRegistry;
use crate::store::{GraphStore, PetgraphStore, StoreError};
use crate::types::{BuildConfig, GraphError, endpoints, validate_tolerance};

/// Which end of a line string to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    /// Before the first coordinate.
    Start,
    /// After the last coordinate.
    End,
}

/// An edge as seen by callers of the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge<N, E> {
    /// Edge handle in the graph store.
    pub id: E,
    /// Node at the start of `geometry`.
    pub source: N,
    /// Node at the end of `geometry`.
    pub target: N,
    /// Edge geometry, extended to the node coordinates where snapping
    /// moved an endpoint.
    pub geometry: LineString<f64>,
}

/// [`GraphEdge`] with the handle types of store `S`.
pub type EdgeOf<S> = GraphEdge<<S as GraphStore>::Node, <S as GraphStore>::Edge>;

/// Return a copy of `line` with `coord` inserted at the given end.
///
/// All existing coordinates are kept, in order.
#[must_use]
pub fn extend_line_string(
    line: &LineString<f64>,
    coord: Coord<f64>,
    end: LineEnd,
) -> LineString<f64> {
    let mut coords = Vec::with_capacity(line.0.len() + 1);
    match end {
        LineEnd::Start => {
            coords.push(coord);
            coords.extend_from_slice(&line.0);
        }
        LineEnd::End => {
            coords.extend_from_slice(&line.0);
            coords.push(coord);
        }
    }
    LineString::new(coords)
}

/// Builds a graph from line strings, snapping nearby endpoints together.
///
/// All state (registry, index, and store) is owned by the builder.
/// Mutating operations take `&mut self`; callers sharing one builder
/// between threads must provide their own locking.
#[derive(Debug)]
pub struct TolerantEdgeBuilder<S: GraphStore = PetgraphStore> {
    registry: NodeRegistry<S::Node>,
    store: S,
    diagnostics: BuildDiagnostics,
}

impl TolerantEdgeBuilder<PetgraphStore> {
    /// Builder with the default tolerance and an empty [`PetgraphStore`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: NodeRegistry::new(BuildConfig::DEFAULT_TOLERANCE),
            store: PetgraphStore::new(),
            diagnostics: BuildDiagnostics::default(),
        }
    }

    /// Builder with an empty [`PetgraphStore`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] if `config` is invalid.
    pub fn with_config(config: BuildConfig) -> Result<Self, GraphError> {
        Self::with_store(PetgraphStore::new(), config)
    }
}

impl Default for TolerantEdgeBuilder<PetgraphStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphStore> TolerantEdgeBuilder<S> {
    /// Builder writing into `store`.
    ///
    /// The registry starts empty: nodes already present in `store` are
    /// never used as snap targets.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] if `config` is invalid.
    pub fn with_store(store: S, config: BuildConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self {
            registry: NodeRegistry::new(config.tolerance),
            store,
            diagnostics: BuildDiagnostics::default(),
        })
    }

    /// Current snapping tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.registry.tolerance()
    }

    /// Change the tolerance used for coordinates resolved from now on.
    ///
    /// Existing nodes are not merged or split.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] if `tolerance` is not finite
    /// and positive; the current tolerance is kept.
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), GraphError> {
        validate_tolerance(tolerance)?;
        self.registry.set_tolerance(tolerance);
        Ok(())
    }

    /// The graph store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the builder and return the graph store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// The coordinate registry.
    #[must_use]
    pub const fn registry(&self) -> &NodeRegistry<S::Node> {
        &self.registry
    }

    /// Counters accumulated since the builder was created.
    #[must_use]
    pub const fn diagnostics(&self) -> &BuildDiagnostics {
        &self.diagnostics
    }

    /// Node created for exactly `coord`, if any.
    #[must_use]
    pub fn node_at(&self, coord: Coord<f64>) -> Option<S::Node> {
        self.registry.lookup_exact(coord)
    }

    /// Add `line` as an edge, snapping its endpoints to existing nodes.
    ///
    /// The returned edge's geometry is `line`, with the start node's
    /// coordinate prepended and/or the end node's coordinate appended
    /// when the corresponding endpoint was snapped.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::TooFewPoints`] for lines with fewer than two
    /// coordinates and [`GraphError::NonFiniteCoordinate`] for NaN or
    /// infinite endpoints (nothing is changed in either case), or
    /// [`GraphError::Store`] if the store refuses a node or the edge.
    /// Nodes created before the failure stay in the registry and the
    /// store.
    pub fn add(&mut self, line: &LineString<f64>) -> Result<EdgeOf<S>, GraphError> {
        let (first, last) = endpoints(line)?;

        let start = self.registry.resolve(first, &mut self.store)?;
        self.diagnostics.record_resolution(&start);
        let end = self.registry.resolve(last, &mut self.store)?;
        self.diagnostics.record_resolution(&end);

        let (source, target) = (start.node(), end.node());
        let source_coord = self.representative(source)?;
        let target_coord = self.representative(target)?;

        let mut geometry = line.clone();
        let mut repaired = false;
        if source_coord != first {
            geometry = extend_line_string(&geometry, source_coord, LineEnd::Start);
            repaired = true;
        }
        if target_coord != last {
            geometry = extend_line_string(&geometry, target_coord, LineEnd::End);
            repaired = true;
        }

        let id = self.store.add_edge(source, target, geometry.clone())?;
        self.diagnostics.record_added(repaired);
        tracing::debug!(
            ?id,
            ?source,
            ?target,
            repaired,
            points = geometry.0.len(),
            "added edge"
        );

        Ok(GraphEdge {
            id,
            source,
            target,
            geometry,
        })
    }

    /// The edge whose endpoints are exactly the nodes at `line`'s first
    /// and last coordinates.
    ///
    /// Returns `Ok(None)` if either endpoint is not a registered node
    /// coordinate or no edge joins the two nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::TooFewPoints`] for lines with fewer than two
    /// coordinates, or [`GraphError::NonFiniteCoordinate`] for NaN or
    /// infinite endpoints.
    pub fn get(&self, line: &LineString<f64>) -> Result<Option<EdgeOf<S>>, GraphError> {
        let (first, last) = endpoints(line)?;
        Ok(self.edge_between(first, last))
    }

    /// Remove the edge [`get`](Self::get) would return and hand it back.
    ///
    /// Nodes and registered coordinates are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::TooFewPoints`] for lines with fewer than two
    /// coordinates, or [`GraphError::NonFiniteCoordinate`] for NaN or
    /// infinite endpoints.
    pub fn remove(&mut self, line: &LineString<f64>) -> Result<Option<EdgeOf<S>>, GraphError> {
        let (first, last) = endpoints(line)?;
        let Some(id) = self.find_edge(first, last) else {
            self.diagnostics.remove_misses += 1;
            return Ok(None);
        };
        let Some((source, target)) = self.store.edge_endpoints(id) else {
            self.diagnostics.remove_misses += 1;
            return Ok(None);
        };
        let Some(geometry) = self.store.remove_edge(id) else {
            self.diagnostics.remove_misses += 1;
            return Ok(None);
        };
        self.diagnostics.edges_removed += 1;
        tracing::debug!(?id, ?source, ?target, "removed edge");
        Ok(Some(GraphEdge {
            id,
            source,
            target,
            geometry,
        }))
    }

    /// The edge joining the nodes registered at exactly `a` and `b`.
    ///
    /// Returns `None` when either coordinate is unknown.
    #[must_use]
    pub fn edge_between(&self, a: Coord<f64>, b: Coord<f64>) -> Option<EdgeOf<S>> {
        let id = self.find_edge(a, b)?;
        let (source, target) = self.store.edge_endpoints(id)?;
        let geometry = self.store.edge_geometry(id)?.clone();
        Some(GraphEdge {
            id,
            source,
            target,
            geometry,
        })
    }

    fn find_edge(&self, a: Coord<f64>, b: Coord<f64>) -> Option<S::Edge> {
        let source = self.registry.lookup_exact(a)?;
        let target = self.registry.lookup_exact(b)?;
        self.store.find_edge(source, target)
    }

    fn representative(&self, node: S::Node) -> Result<Coord<f64>, StoreError> {
        self.store
            .node_coord(node)
            .ok_or_else(|| StoreError::UnknownNode(format!("{node:?}")))
    }
}
