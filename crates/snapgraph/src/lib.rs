//! snapgraph: Build planar line graphs from imprecise segment data (sans-IO).
//!
//! Line strings are added one at a time. Endpoints closer than a
//! configurable tolerance are merged into a single node, and every edge's
//! geometry is extended so that it starts and ends exactly on its nodes:
//!
//! line string -> endpoint resolution (exact / snap / create) ->
//! geometry repair -> edge in the graph store.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! `geo` geometries and returns a `petgraph` graph (or any custom
//! [`GraphStore`]). SVG rendering lives in `snapgraph-export` and file
//! handling in `snapgraph-bench`.

pub mod builder;
pub mod diagnostics;
pub mod feature;
pub mod index;
pub mod registry;
pub mod store;
pub mod types;

pub use builder::{EdgeOf, GraphEdge, LineEnd, TolerantEdgeBuilder, extend_line_string};
pub use diagnostics::{BuildDiagnostics, BuildReport, Clock};
pub use feature::{Feature, FeatureGraphBuilder, GeometryRecord};
pub use index::{SnapCandidate, ToleranceIndex};
pub use registry::{NodeRegistry, Resolution};
pub use store::{GraphStore, PetgraphStore, SnapGraph, StoreError};
pub use types::{BuildConfig, GraphError};

use geo::LineString;

/// Build a graph from a batch of line strings.
///
/// Segments are added in order, so earlier endpoints become the
/// representatives that later endpoints snap to.
///
/// ```
/// use geo::line_string;
/// use snapgraph::{BuildConfig, GraphStore};
///
/// # fn main() -> Result<(), snapgraph::GraphError> {
/// let segments = [
///     line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
///     line_string![(x: 1.005, y: 0.0), (x: 1.0, y: 1.0)],
/// ];
/// let store = snapgraph::build_graph(&segments, BuildConfig::default())?;
/// assert_eq!(store.node_count(), 3);
/// assert_eq!(store.edge_count(), 2);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`GraphError::InvalidConfig`] if `config` is invalid, or the
/// error of the first segment that cannot be added (for example
/// [`GraphError::TooFewPoints`]).
pub fn build_graph(
    segments: &[LineString<f64>],
    config: BuildConfig,
) -> Result<PetgraphStore, GraphError> {
    let mut builder = TolerantEdgeBuilder::with_config(config)?;
    for segment in segments {
        builder.add(segment)?;
    }
    Ok(builder.into_store())
}
