//! Build diagnostics: counts of how endpoints were resolved, plus timing.
//!
//! Every [`TolerantEdgeBuilder`](crate::TolerantEdgeBuilder) keeps a
//! [`BuildDiagnostics`] tally. [`build_with_diagnostics`] runs a whole
//! build and wraps the tally in a timed [`BuildReport`].
//!
//! The core crate never reads a clock itself. Callers supply a [`Clock`],
//! so the library stays usable where `std::time::Instant` is missing.
//!
//! Durations are serialized as fractional seconds (`f64`), because
//! `std::time::Duration` does not implement the serde traits.

use std::time::Duration;

use geo::LineString;
use serde::{Deserialize, Serialize};

use crate::builder::TolerantEdgeBuilder;
use crate::registry::Resolution;
use crate::store::{GraphStore, PetgraphStore};
use crate::types::{BuildConfig, GraphError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Monotonic time source used to time a build.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Running counters kept by a builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildDiagnostics {
    /// Line strings successfully added as edges.
    pub segments_added: usize,
    /// Endpoints that matched a registered coordinate bit for bit.
    pub exact_hits: usize,
    /// Endpoints snapped to an existing node within the tolerance.
    pub endpoints_snapped: usize,
    /// Nodes created by the builder.
    pub nodes_created: usize,
    /// Added edges whose geometry was extended at one or both ends.
    pub edges_repaired: usize,
    /// Edges removed through the builder.
    pub edges_removed: usize,
    /// `remove` calls that found no edge.
    pub remove_misses: usize,
    /// Largest distance any endpoint was snapped across.
    pub max_snap_distance: f64,
}

impl BuildDiagnostics {
    /// Count one endpoint resolution.
    pub(crate) fn record_resolution<N>(&mut self, resolution: &Resolution<N>) {
        match resolution {
            Resolution::Exact(_) => self.exact_hits += 1,
            Resolution::Snapped { distance, .. } => {
                self.endpoints_snapped += 1;
                self.max_snap_distance = self.max_snap_distance.max(*distance);
            }
            Resolution::Created(_) => self.nodes_created += 1,
        }
    }

    /// Count one added edge.
    pub(crate) const fn record_added(&mut self, repaired: bool) {
        self.segments_added += 1;
        if repaired {
            self.edges_repaired += 1;
        }
    }

    /// Total endpoints resolved so far.
    #[must_use]
    pub const fn endpoints_resolved(&self) -> usize {
        self.exact_hits + self.endpoints_snapped + self.nodes_created
    }
}

/// Diagnostics for one complete build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Tolerance the build ran with.
    pub tolerance: f64,
    /// Line strings handed to the builder.
    pub input_segments: usize,
    /// Nodes in the finished graph.
    pub node_count: usize,
    /// Edges in the finished graph.
    pub edge_count: usize,
    /// Wall-clock duration of the build (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Counters collected by the builder.
    pub counters: BuildDiagnostics,
}

impl BuildReport {
    /// Format the report as human-readable text.
    #[must_use]
    pub fn report(&self) -> String {
        let c = &self.counters;
        let mut lines = Vec::new();

        lines.push(format!("Build Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!("Tolerance: {}", self.tolerance));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.duration),
        ));
        lines.push(String::new());

        lines.push(format!("{:<28} {:>10}  {}", "Metric", "Count", "Details"));
        lines.push("-".repeat(60));
        lines.push(format!("{:<28} {:>10}", "Input segments", self.input_segments));
        lines.push(format!("{:<28} {:>10}", "Segments added", c.segments_added));
        lines.push(format!(
            "{:<28} {:>10}  {}",
            "Endpoints resolved",
            c.endpoints_resolved(),
            format_resolution_split(c),
        ));
        lines.push(format!(
            "{:<28} {:>10}  max distance {:.6}",
            "Endpoints snapped", c.endpoints_snapped, c.max_snap_distance,
        ));
        lines.push(format!("{:<28} {:>10}", "Edges repaired", c.edges_repaired));
        lines.push(format!("{:<28} {:>10}", "Edges removed", c.edges_removed));
        lines.push(format!("{:<28} {:>10}", "Remove misses", c.remove_misses));
        lines.push(String::new());
        lines.push(format!(
            "Nodes: {}  |  Edges: {}",
            self.node_count, self.edge_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[allow(clippy::cast_precision_loss)]
fn format_resolution_split(c: &BuildDiagnostics) -> String {
    let total = c.endpoints_resolved();
    if total == 0 {
        return String::new();
    }
    let pct = |n: usize| n as f64 / total as f64 * 100.0;
    format!(
        "exact {:.1}% / snapped {:.1}% / created {:.1}%",
        pct(c.exact_hits),
        pct(c.endpoints_snapped),
        pct(c.nodes_created),
    )
}

/// Build a graph from `segments` and report how the build went.
///
/// Stops at the first segment that fails to add.
///
/// # Errors
///
/// Returns [`GraphError::InvalidConfig`] for an invalid `config`, or the
/// error of the first segment that could not be added.
pub fn build_with_diagnostics<C: Clock>(
    segments: &[LineString<f64>],
    config: BuildConfig,
    clock: &C,
) -> Result<(PetgraphStore, BuildReport), GraphError> {
    let start = clock.now();
    let mut builder = TolerantEdgeBuilder::with_config(config)?;
    for segment in segments {
        builder.add(segment)?;
    }
    let duration = clock.elapsed(&start);

    let counters = builder.diagnostics().clone();
    let store = builder.into_store();
    let report = BuildReport {
        tolerance: config.tolerance,
        input_segments: segments.len(),
        node_count: store.node_count(),
        edge_count: store.edge_count(),
        duration,
        counters,
    };
    tracing::debug!(
        nodes = report.node_count,
        edges = report.edge_count,
        snapped = report.counters.endpoints_snapped,
        "build finished"
    );
    Ok((store, report))
}
