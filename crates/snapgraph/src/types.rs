//! Shared types for the snapgraph builder.

use geo::{Coord, Geometry, LineString};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Configuration for tolerant graph construction.
///
/// The tolerance can be changed on a live builder through
/// [`TolerantEdgeBuilder::set_tolerance`](crate::TolerantEdgeBuilder::set_tolerance).
/// A change only affects coordinates resolved afterwards; nodes that
/// already exist keep their representative coordinate and cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Two coordinates snap to the same node when their Euclidean
    /// distance is strictly less than this value.
    pub tolerance: f64,
}

impl BuildConfig {
    /// Default snapping tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 0.01;

    /// Create a configuration with the given tolerance.
    #[must_use]
    pub const fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Check that the configuration can drive a builder.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] if the tolerance is not a
    /// finite, strictly positive number.
    pub fn validate(&self) -> Result<(), GraphError> {
        validate_tolerance(self.tolerance)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

pub(crate) fn validate_tolerance(tolerance: f64) -> Result<(), GraphError> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidConfig(format!(
            "tolerance must be finite and greater than zero, got {tolerance}"
        )))
    }
}

/// Errors produced while building or querying a tolerant graph.
///
/// A lookup that finds nothing is not an error: `get` and `remove`
/// report it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The input geometry is not a line.
    #[error("expected a line string geometry, found {found}")]
    GeometryMismatch {
        /// Kind of geometry that was supplied.
        found: &'static str,
    },

    /// The line string has no distinct first and last coordinate.
    #[error("line string needs at least 2 coordinates, got {points}")]
    TooFewPoints {
        /// Number of coordinates in the rejected line string.
        points: usize,
    },

    /// A line string endpoint has a NaN or infinite component.
    #[error("line string endpoint is not finite: ({x}, {y})")]
    NonFiniteCoordinate {
        /// X component of the rejected endpoint.
        x: f64,
        /// Y component of the rejected endpoint.
        y: f64,
    },

    /// Builder configuration is invalid.
    #[error("invalid build configuration: {0}")]
    InvalidConfig(String),

    /// The graph store refused a node or edge.
    ///
    /// Nodes resolved earlier in the same operation stay registered.
    #[error("graph store failure: {0}")]
    Store(#[from] StoreError),
}

/// Bit-exact hash key for a coordinate.
///
/// `f64` is not `Hash`/`Eq`, so exact lookups compare the raw bit
/// patterns of both components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CoordKey {
    x_bits: u64,
    y_bits: u64,
}

impl CoordKey {
    pub(crate) const fn from_coord(c: Coord<f64>) -> Self {
        Self {
            x_bits: c.x.to_bits(),
            y_bits: c.y.to_bits(),
        }
    }
}

/// First and last coordinates of a line string.
///
/// # Errors
///
/// Returns [`GraphError::TooFewPoints`] for line strings with fewer
/// than two coordinates, or [`GraphError::NonFiniteCoordinate`] if either
/// endpoint has a NaN or infinite component.
pub fn endpoints(line: &LineString<f64>) -> Result<(Coord<f64>, Coord<f64>), GraphError> {
    let (first, last) = match line.0.as_slice() {
        [first, .., last] => (*first, *last),
        other => {
            return Err(GraphError::TooFewPoints {
                points: other.len(),
            });
        }
    };
    for c in [first, last] {
        if !(c.x.is_finite() && c.y.is_finite()) {
            return Err(GraphError::NonFiniteCoordinate { x: c.x, y: c.y });
        }
    }
    Ok((first, last))
}

/// Human-readable name of a geometry variant, used in mismatch errors.
#[must_use]
pub const fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
