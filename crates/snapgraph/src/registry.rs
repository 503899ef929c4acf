//! Coordinate-to-node registry with tolerant fallback.
//!
//! Node identity is decided here. An exact (bit-identical) coordinate
//! seen before maps straight to its node. Any other coordinate is
//! snapped to the nearest registered coordinate closer than the
//! tolerance, and only when there is none is a new node created.
//!
//! Only coordinates that *created* a node are registered. A coordinate
//! that was snapped is not recorded, so resolving it again repeats the
//! tolerance search (which gives the same answer), and
//! [`NodeRegistry::lookup_exact`] does not know it.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use geo::Coord;

use crate::index::{ToleranceIndex, coord_distance};
use crate::store::{GraphStore, StoreError};
use crate::types::{BuildConfig, CoordKey};

/// How a coordinate was mapped to its node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<N> {
    /// The exact coordinate was registered before.
    Exact(N),
    /// The coordinate was snapped to an existing node.
    Snapped {
        /// The node snapped to.
        node: N,
        /// Distance from the resolved coordinate to the registered
        /// coordinate it matched.
        distance: f64,
    },
    /// A new node was created with this coordinate as representative.
    Created(N),
}

impl<N: Copy> Resolution<N> {
    /// The resolved node, however it was found.
    #[must_use]
    pub fn node(&self) -> N {
        match *self {
            Self::Exact(node) | Self::Snapped { node, .. } | Self::Created(node) => node,
        }
    }
}

/// Maps coordinates to node handles.
pub struct NodeRegistry<N> {
    exact: HashMap<CoordKey, N>,
    index: ToleranceIndex<N>,
    tolerance: f64,
}

impl<N> fmt::Debug for NodeRegistry<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("registered", &self.exact.len())
            .field("index", &self.index)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl<N> Default for NodeRegistry<N> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            index: ToleranceIndex::default(),
            tolerance: BuildConfig::DEFAULT_TOLERANCE,
        }
    }
}

impl<N: Copy + Eq + Hash + fmt::Debug> NodeRegistry<N> {
    /// Create an empty registry. The tolerance is not validated here.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    /// Current snapping tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Change the tolerance for future resolutions. Existing nodes are
    /// not re-clustered.
    pub const fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    /// Number of registered representative coordinates (one per node
    /// created through this registry).
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    /// Returns `true` if no node has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Node registered for exactly `coord`, without tolerance fallback.
    #[must_use]
    pub fn lookup_exact(&self, coord: Coord<f64>) -> Option<N> {
        self.exact.get(&CoordKey::from_coord(coord)).copied()
    }

    /// Find or create the node for `coord`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if a new node is needed and `store`
    /// refuses it. Nothing is registered in that case.
    pub fn resolve<S>(
        &mut self,
        coord: Coord<f64>,
        store: &mut S,
    ) -> Result<Resolution<N>, StoreError>
    where
        S: GraphStore<Node = N>,
    {
        if let Some(node) = self.lookup_exact(coord) {
            tracing::trace!(x = coord.x, y = coord.y, ?node, "exact coordinate hit");
            return Ok(Resolution::Exact(node));
        }

        if let Some(candidate) = self
            .index
            .find_nearest_within_tolerance(coord, self.tolerance)
        {
            let distance = coord_distance(coord, candidate.coord);
            tracing::debug!(
                x = coord.x,
                y = coord.y,
                to_x = candidate.coord.x,
                to_y = candidate.coord.y,
                distance,
                node = ?candidate.node,
                "snapped coordinate to existing node"
            );
            return Ok(Resolution::Snapped {
                node: candidate.node,
                distance,
            });
        }

        let node = store.add_node(coord)?;
        self.exact.insert(CoordKey::from_coord(coord), node);
        self.index.insert(coord, node);
        tracing::debug!(x = coord.x, y = coord.y, ?node, "created node");
        Ok(Resolution::Created(node))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use geo::coord;

    use super::*;
    use crate::store::PetgraphStore;

    #[test]
    fn first_resolution_creates_node() {
        let mut store = PetgraphStore::new();
        let mut registry = NodeRegistry::new(0.1);
        let c = coord! { x: 1.0, y: 1.0 };

        let res = registry.resolve(c, &mut store).unwrap();
        assert!(matches!(res, Resolution::Created(_)));
        assert_eq!(store.node_coord(res.node()), Some(c));
        assert_eq!(registry.lookup_exact(c), Some(res.node()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn repeated_coordinate_is_exact_hit() {
        let mut store = PetgraphStore::new();
        let mut registry = NodeRegistry::new(0.1);
        let c = coord! { x: 1.0, y: 1.0 };
        let first = registry.resolve(c, &mut store).unwrap().node();
        let second = registry.resolve(c, &mut store).unwrap();
        assert_eq!(second, Resolution::Exact(first));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn nearby_coordinate_snaps_without_registering() {
        let mut store = PetgraphStore::new();
        let mut registry = NodeRegistry::new(0.02);
        let anchor = registry
            .resolve(coord! { x: 2.0, y: 2.0 }, &mut store)
            .unwrap()
            .node();

        let near = coord! { x: 2.01, y: 2.0007 };
        let res = registry.resolve(near, &mut store).unwrap();
        assert!(matches!(res, Resolution::Snapped { node, .. } if node == anchor));
        assert_eq!(registry.lookup_exact(near), None, "snapped coordinates are not indexed");

        // Resolving again repeats the search and lands on the same node.
        let again = registry.resolve(near, &mut store).unwrap();
        assert_eq!(again.node(), anchor);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn distant_coordinate_gets_own_node() {
        let mut store = PetgraphStore::new();
        let mut registry = NodeRegistry::new(0.02);
        let a = registry
            .resolve(coord! { x: 2.0, y: 2.0 }, &mut store)
            .unwrap()
            .node();
        let b = registry
            .resolve(coord! { x: 2.0, y: 1.75 }, &mut store)
            .unwrap();
        assert!(matches!(b, Resolution::Created(_)));
        assert_ne!(a, b.node());
    }

    #[test]
    fn snapped_distance_is_reported() {
        let mut store = PetgraphStore::new();
        let mut registry = NodeRegistry::new(1.0);
        registry
            .resolve(coord! { x: 0.0, y: 0.0 }, &mut store)
            .unwrap();
        let res = registry
            .resolve(coord! { x: 0.3, y: 0.4 }, &mut store)
            .unwrap();
        let Resolution::Snapped { distance, .. } = res else {
            unreachable!("expected a snap, got {res:?}");
        };
        assert!((distance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn tolerance_change_does_not_recluster() {
        let mut store = PetgraphStore::new();
        let mut registry = NodeRegistry::new(0.01);
        let a = registry
            .resolve(coord! { x: 0.0, y: 0.0 }, &mut store)
            .unwrap()
            .node();
        let b = registry
            .resolve(coord! { x: 0.5, y: 0.0 }, &mut store)
            .unwrap()
            .node();
        assert_ne!(a, b);

        registry.set_tolerance(1.0);
        assert_eq!(
            registry.lookup_exact(coord! { x: 0.5, y: 0.0 }),
            Some(b),
            "existing nodes keep their identity"
        );
        // New coordinates use the wider tolerance and pick the nearest.
        let c = registry
            .resolve(coord! { x: 0.4, y: 0.0 }, &mut store)
            .unwrap()
            .node();
        assert_eq!(c, b);
    }

    #[test]
    fn store_failure_registers_nothing() {
        struct FullStore;

        impl GraphStore for FullStore {
            type Node = u32;
            type Edge = u32;

            fn add_node(&mut self, _: Coord<f64>) -> Result<u32, StoreError> {
                Err(StoreError::Rejected("full".to_owned()))
            }
            fn node_coord(&self, _: u32) -> Option<Coord<f64>> {
                None
            }
            fn add_edge(
                &mut self,
                _: u32,
                _: u32,
                _: geo::LineString<f64>,
            ) -> Result<u32, StoreError> {
                Err(StoreError::Rejected("full".to_owned()))
            }
            fn find_edge(&self, _: u32, _: u32) -> Option<u32> {
                None
            }
            fn edge_geometry(&self, _: u32) -> Option<&geo::LineString<f64>> {
                None
            }
            fn edge_endpoints(&self, _: u32) -> Option<(u32, u32)> {
                None
            }
            fn remove_edge(&mut self, _: u32) -> Option<geo::LineString<f64>> {
                None
            }
            fn node_count(&self) -> usize {
                0
            }
            fn edge_count(&self) -> usize {
                0
            }
        }

        let mut registry = NodeRegistry::new(0.1);
        let c = coord! { x: 1.0, y: 1.0 };
        let err = registry.resolve(c, &mut FullStore).unwrap_err();
        assert_eq!(err, StoreError::Rejected("full".to_owned()));
        assert!(registry.is_empty());
        assert_eq!(registry.lookup_exact(c), None);
    }
}
