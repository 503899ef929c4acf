//! Snap-candidate index: an R\*-tree of registered coordinates queried
//! by horizontal band.
//!
//! Candidates are pruned on `y` only. A band query covers every `x`, so
//! a query for `[y - tolerance, y + tolerance]` returns a superset of the
//! coordinates within `tolerance` of the query point; the true 2D
//! distance is checked afterwards. Ties between equidistant candidates
//! go to the one inserted first.

use std::fmt;

use geo::line_measures::Distance;
use geo::{Coord, Euclidean};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

/// Payload stored next to each indexed coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry<N> {
    node: N,
    /// Insertion sequence number, used for tie-breaking.
    order: usize,
}

/// A coordinate tagged with its owning node, suitable for R\*-tree
/// insertion.
type IndexedCoord<N> = GeomWithData<[f64; 2], IndexEntry<N>>;

/// A registered coordinate together with the node it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate<N> {
    /// The registered coordinate.
    pub coord: Coord<f64>,
    /// Node owning the coordinate.
    pub node: N,
}

/// Approximate range index over coordinates registered as snap targets.
pub struct ToleranceIndex<N> {
    tree: RTree<IndexedCoord<N>>,
    inserted: usize,
}

impl<N> fmt::Debug for ToleranceIndex<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToleranceIndex")
            .field("len", &self.tree.size())
            .field("inserted", &self.inserted)
            .finish()
    }
}

impl<N> Default for ToleranceIndex<N> {
    fn default() -> Self {
        Self {
            tree: RTree::new(),
            inserted: 0,
        }
    }
}

impl<N: Copy> ToleranceIndex<N> {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Register `coord` as a future snap candidate owned by `node`.
    pub fn insert(&mut self, coord: Coord<f64>, node: N) {
        let entry = IndexEntry {
            node,
            order: self.inserted,
        };
        self.inserted += 1;
        self.tree.insert(GeomWithData::new([coord.x, coord.y], entry));
    }

    /// Every registered coordinate with `y_low <= y <= y_high`, in
    /// insertion order. `x` is not considered.
    #[must_use]
    pub fn query_range(&self, y_low: f64, y_high: f64) -> Vec<SnapCandidate<N>> {
        let band = AABB::from_corners([f64::NEG_INFINITY, y_low], [f64::INFINITY, y_high]);
        let mut hits: Vec<&IndexedCoord<N>> = self.tree.locate_in_envelope(&band).collect();
        hits.sort_unstable_by_key(|hit| hit.data.order);
        hits.into_iter()
            .map(|hit| {
                let [x, y] = *hit.geom();
                SnapCandidate {
                    coord: Coord { x, y },
                    node: hit.data.node,
                }
            })
            .collect()
    }

    /// The registered coordinate closest to `point`, provided its
    /// Euclidean distance is strictly less than `tolerance`.
    ///
    /// Among equidistant candidates the earliest inserted wins.
    #[must_use]
    pub fn find_nearest_within_tolerance(
        &self,
        point: Coord<f64>,
        tolerance: f64,
    ) -> Option<SnapCandidate<N>> {
        let mut closest: Option<(f64, SnapCandidate<N>)> = None;
        for candidate in self.query_range(point.y - tolerance, point.y + tolerance) {
            let distance = coord_distance(point, candidate.coord);
            // Strict comparison keeps the earliest candidate on ties.
            if closest.is_none_or(|(best, _)| distance < best) {
                closest = Some((distance, candidate));
            }
        }
        closest
            .filter(|(distance, _)| *distance < tolerance)
            .map(|(_, candidate)| candidate)
    }
}

/// Euclidean distance between two coordinates.
pub(crate) fn coord_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Euclidean.distance(&geo::Point::from(a), &geo::Point::from(b))
}
