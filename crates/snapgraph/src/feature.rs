//! Adapter that feeds geometry-carrying records through the builder.
//!
//! [`FeatureGraphBuilder::add`] writes the edge's final geometry back onto
//! the record, so a record whose endpoint was snapped ends up holding the
//! extended line. [`get`](FeatureGraphBuilder::get) and
//! [`remove`](FeatureGraphBuilder::remove) leave the record untouched.

use std::borrow::Cow;

use geo::{Geometry, LineString};

use crate::builder::{EdgeOf, TolerantEdgeBuilder};
use crate::store::{GraphStore, PetgraphStore};
use crate::types::{BuildConfig, GraphError, geometry_kind};

/// A record that carries a default geometry.
pub trait GeometryRecord {
    /// The record's geometry.
    fn default_geometry(&self) -> &Geometry<f64>;

    /// Replace the record's geometry.
    fn set_default_geometry(&mut self, geometry: Geometry<f64>);
}

/// A geometry with an arbitrary properties payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature<P = ()> {
    /// The feature's geometry.
    pub geometry: Geometry<f64>,
    /// Attributes carried alongside the geometry.
    pub properties: P,
}

impl<P> Feature<P> {
    /// Create a feature from a geometry and its properties.
    pub fn new(geometry: impl Into<Geometry<f64>>, properties: P) -> Self {
        Self {
            geometry: geometry.into(),
            properties,
        }
    }
}

impl<P> GeometryRecord for Feature<P> {
    fn default_geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    fn set_default_geometry(&mut self, geometry: Geometry<f64>) {
        self.geometry = geometry;
    }
}

/// The line string a record's geometry stands for.
///
/// A two-point [`geo::Line`] counts as a line string.
fn record_line<R: GeometryRecord + ?Sized>(
    record: &R,
) -> Result<Cow<'_, LineString<f64>>, GraphError> {
    match record.default_geometry() {
        Geometry::LineString(line) => Ok(Cow::Borrowed(line)),
        Geometry::Line(line) => Ok(Cow::Owned(LineString::from(*line))),
        other => Err(GraphError::GeometryMismatch {
            found: geometry_kind(other),
        }),
    }
}

/// [`TolerantEdgeBuilder`] front end for [`GeometryRecord`]s.
#[derive(Debug)]
pub struct FeatureGraphBuilder<S: GraphStore = PetgraphStore> {
    inner: TolerantEdgeBuilder<S>,
}

impl FeatureGraphBuilder<PetgraphStore> {
    /// Adapter over a new builder with the default tolerance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: TolerantEdgeBuilder::new(),
        }
    }

    /// Adapter over a new builder configured by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] if `config` is invalid.
    pub fn with_config(config: BuildConfig) -> Result<Self, GraphError> {
        TolerantEdgeBuilder::with_config(config).map(Self::from)
    }
}

impl Default for FeatureGraphBuilder<PetgraphStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphStore> From<TolerantEdgeBuilder<S>> for FeatureGraphBuilder<S> {
    fn from(inner: TolerantEdgeBuilder<S>) -> Self {
        Self { inner }
    }
}

impl<S: GraphStore> FeatureGraphBuilder<S> {
    /// The wrapped builder.
    #[must_use]
    pub const fn builder(&self) -> &TolerantEdgeBuilder<S> {
        &self.inner
    }

    /// The wrapped builder, mutably (for example to change the tolerance).
    pub const fn builder_mut(&mut self) -> &mut TolerantEdgeBuilder<S> {
        &mut self.inner
    }

    /// Unwrap the adapter.
    #[must_use]
    pub fn into_builder(self) -> TolerantEdgeBuilder<S> {
        self.inner
    }

    /// Add the record's line as an edge and store the edge's final
    /// geometry on the record as a [`Geometry::LineString`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::GeometryMismatch`] if the record's geometry
    /// is not a line, and otherwise whatever
    /// [`TolerantEdgeBuilder::add`] returns. The record is only updated
    /// on success.
    pub fn add<R: GeometryRecord + ?Sized>(
        &mut self,
        record: &mut R,
    ) -> Result<EdgeOf<S>, GraphError> {
        let edge = {
            let line = record_line(&*record)?;
            self.inner.add(&line)?
        };
        record.set_default_geometry(Geometry::LineString(edge.geometry.clone()));
        Ok(edge)
    }

    /// The edge matching the record's line endpoints exactly.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::GeometryMismatch`] if the record's geometry
    /// is not a line, and otherwise whatever [`TolerantEdgeBuilder::get`]
    /// returns.
    pub fn get<R: GeometryRecord + ?Sized>(
        &self,
        record: &R,
    ) -> Result<Option<EdgeOf<S>>, GraphError> {
        let line = record_line(record)?;
        self.inner.get(&line)
    }

    /// Remove the edge matching the record's line endpoints exactly.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn remove<R: GeometryRecord + ?Sized>(
        &mut self,
        record: &R,
    ) -> Result<Option<EdgeOf<S>>, GraphError> {
        let line = record_line(record)?;
        self.inner.remove(&line)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use geo::{Line, Point, coord, line_string, polygon};

    use super::*;

    fn adapter(tolerance: f64) -> FeatureGraphBuilder {
        FeatureGraphBuilder::with_config(BuildConfig::new(tolerance)).unwrap()
    }

    #[test]
    fn add_writes_back_repaired_geometry() {
        let mut fb = adapter(0.02);
        let mut first = Feature::new(line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 2.0)], "a");
        let mut second = Feature::new(line_string![(x: 2.01, y: 2.0007), (x: 3.0, y: 3.0)], "b");

        fb.add(&mut first).unwrap();
        let edge = fb.add(&mut second).unwrap();

        assert_eq!(second.geometry, Geometry::LineString(edge.geometry.clone()));
        let Geometry::LineString(written) = &second.geometry else {
            unreachable!("adapter always writes a line string");
        };
        assert_eq!(written.0.len(), 3);
        assert_eq!(written.0[0], coord! { x: 2.0, y: 2.0 });
        assert_eq!(second.properties, "b", "properties are untouched");
    }

    #[test]
    fn unsnapped_record_keeps_equal_geometry() {
        let mut fb = adapter(0.01);
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let mut feature = Feature::new(line.clone(), ());
        fb.add(&mut feature).unwrap();
        assert_eq!(feature.geometry, Geometry::LineString(line));
    }

    #[test]
    fn line_geometry_is_accepted_and_written_as_line_string() {
        let mut fb = adapter(0.01);
        let mut feature = Feature::new(
            Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }),
            (),
        );
        fb.add(&mut feature).unwrap();
        assert!(matches!(feature.geometry, Geometry::LineString(ref l) if l.0.len() == 2));
        assert!(fb.get(&feature).unwrap().is_some());
    }

    #[test]
    fn non_line_geometry_is_rejected_without_mutation() {
        let mut fb = adapter(0.01);
        let mut point = Feature::new(Point::new(1.0, 1.0), ());
        assert_eq!(
            fb.add(&mut point),
            Err(GraphError::GeometryMismatch { found: "Point" })
        );

        let triangle = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let mut poly = Feature::new(triangle, ());
        assert_eq!(
            fb.add(&mut poly),
            Err(GraphError::GeometryMismatch { found: "Polygon" })
        );
        assert_eq!(fb.builder().store().node_count(), 0);
        assert_eq!(point.geometry, Geometry::Point(Point::new(1.0, 1.0)));
    }

    #[test]
    fn get_and_remove_do_not_write_back() {
        let mut fb = adapter(0.02);
        fb.add(&mut Feature::new(line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 2.0)], ()))
            .unwrap();
        let original = line_string![(x: 2.01, y: 2.0007), (x: 3.0, y: 3.0)];
        let mut snapped = Feature::new(original.clone(), ());
        fb.add(&mut snapped).unwrap();

        // The written-back geometry finds the edge; the original does not.
        let untouched = Feature::new(original.clone(), ());
        assert_eq!(fb.get(&untouched), Ok(None));
        assert!(fb.get(&snapped).unwrap().is_some());

        let removed = fb.remove(&snapped).unwrap();
        assert!(removed.is_some());
        assert_eq!(untouched.geometry, Geometry::LineString(original));
        assert_eq!(fb.builder().store().edge_count(), 1);
    }

    #[test]
    fn get_borrows_line_string_records() {
        let mut fb = adapter(0.01);
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let mut feature = Feature::new(line.clone(), ());
        let added = fb.add(&mut feature).unwrap();

        let found = fb.get(&feature).unwrap().unwrap();
        assert_eq!(found.id, added.id);
        assert_eq!(found.geometry, line);

        let reversed = Feature::new(line_string![(x: 1.0, y: 1.0), (x: 0.0, y: 0.0)], ());
        assert!(fb.get(&reversed).unwrap().is_some());

        let point = Feature::new(Point::new(0.0, 0.0), ());
        assert_eq!(
            fb.get(&point),
            Err(GraphError::GeometryMismatch { found: "Point" })
        );
    }

    #[test]
    fn failed_add_leaves_record_untouched() {
        let mut fb = adapter(0.01);
        let mut short = Feature::new(line_string![(x: 0.0, y: 0.0)], ());
        assert_eq!(
            fb.add(&mut short),
            Err(GraphError::TooFewPoints { points: 1 })
        );
        assert_eq!(short.geometry, Geometry::LineString(line_string![(x: 0.0, y: 0.0)]));
    }

    #[test]
    fn tolerance_is_adjustable_through_adapter() {
        let mut fb = FeatureGraphBuilder::new();
        fb.builder_mut().set_tolerance(0.5).unwrap();
        assert!((fb.into_builder().tolerance() - 0.5).abs() < f64::EPSILON);
    }
}
