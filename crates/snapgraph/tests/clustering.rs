//! Integration tests: endpoint clustering through the public API.

#![allow(clippy::unwrap_used)]

use geo::{Coord, LineString, coord, line_string};
use snapgraph::{BuildConfig, GraphStore, TolerantEdgeBuilder};

fn builder(tolerance: f64) -> TolerantEdgeBuilder {
    TolerantEdgeBuilder::with_config(BuildConfig::new(tolerance)).unwrap()
}

#[test]
fn nearby_endpoints_share_a_node() {
    let mut b = builder(0.02);
    b.add(&line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 2.0)]).unwrap();
    b.add(&line_string![(x: 2.01, y: 2.0007), (x: 3.0, y: 3.0)]).unwrap();
    b.add(&line_string![(x: 2.0, y: 1.75), (x: 4.0, y: 4.0)]).unwrap();

    let store = b.store();
    assert_eq!(store.node_count(), 5);
    assert_eq!(store.edge_count(), 3);

    let coords: Vec<Coord<f64>> = store.node_coords().collect();
    assert!(coords.contains(&coord! { x: 2.0, y: 2.0 }));
    assert!(!coords.contains(&coord! { x: 2.01, y: 2.0007 }));
    assert!(coords.contains(&coord! { x: 2.0, y: 1.75 }));
}

#[test]
fn distances_below_tolerance_cluster() {
    let tolerance = 0.1;
    // Offsets strictly inside the tolerance, in every direction.
    let offsets = [
        (0.0, 0.0),
        (0.099, 0.0),
        (0.0, -0.099),
        (-0.07, 0.07),
        (0.05, 0.05),
    ];
    let mut b = builder(tolerance);
    let mut nodes = Vec::new();
    for (i, (dx, dy)) in offsets.into_iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let far = coord! { x: 100.0 + i as f64 * 10.0, y: 50.0 };
        let edge = b
            .add(&LineString::new(vec![coord! { x: 5.0 + dx, y: 5.0 + dy }, far]))
            .unwrap();
        nodes.push(edge.source);
    }
    assert!(nodes.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(b.store().node_count(), 1 + offsets.len());
}

#[test]
fn distances_at_or_beyond_tolerance_separate() {
    let tolerance = 0.5;
    let mut b = builder(tolerance);
    let origin = b
        .add(&line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0)])
        .unwrap()
        .source;

    for start in [
        coord! { x: 0.5, y: 0.0 },
        coord! { x: 0.0, y: -0.5 },
        coord! { x: 0.3, y: -0.4 },
        coord! { x: 3.0, y: 0.0 },
    ] {
        let edge = b
            .add(&LineString::new(vec![start, coord! { x: start.x, y: start.y - 20.0 }]))
            .unwrap();
        assert_ne!(edge.source, origin, "{start:?} must not snap to the origin");
    }
}

#[test]
fn y_band_neighbours_far_in_x_do_not_snap() {
    let mut b = builder(0.05);
    b.add(&line_string![(x: 0.0, y: 1.0), (x: 0.0, y: 2.0)]).unwrap();
    // Same y as an existing endpoint, far away in x.
    let edge = b
        .add(&line_string![(x: 7.0, y: 1.0), (x: 7.0, y: 3.0)])
        .unwrap();
    assert_eq!(edge.geometry.0.len(), 2);
    assert_eq!(b.store().node_count(), 4);
}

#[test]
fn every_edge_starts_and_ends_on_its_nodes() {
    let mut b = builder(0.3);
    let lines = [
        line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)],
        line_string![(x: 4.1, y: 0.1), (x: 4.0, y: 4.0)],
        line_string![(x: 3.9, y: 4.2), (x: 0.0, y: 4.0)],
        line_string![(x: 0.1, y: 3.8), (x: 2.0, y: 2.0), (x: -0.2, y: 0.1)],
    ];
    for line in &lines {
        b.add(line).unwrap();
    }

    let store = b.store();
    let graph = store.graph();
    for edge in graph.edge_indices() {
        let (a, z) = store.edge_endpoints(edge).unwrap();
        let geometry = store.edge_geometry(edge).unwrap();
        assert_eq!(geometry.0.first().copied(), store.node_coord(a));
        assert_eq!(geometry.0.last().copied(), store.node_coord(z));
    }
    assert_eq!(store.node_count(), 4, "square closes into a ring");
}

#[test]
fn original_coordinates_survive_repair() {
    let mut b = builder(0.3);
    b.add(&line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)]).unwrap();
    let line = line_string![(x: 4.1, y: 0.1), (x: 5.0, y: 2.0), (x: 3.9, y: -0.1)];
    let edge = b.add(&line).unwrap();

    assert_eq!(edge.geometry.0.len(), line.0.len() + 2);
    assert_eq!(&edge.geometry.0[1..=line.0.len()], line.0.as_slice());
}

#[test]
fn snapped_coordinates_are_not_found_by_exact_queries() {
    let mut b = builder(0.02);
    b.add(&line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 2.0)]).unwrap();
    let snapped = line_string![(x: 2.01, y: 2.0007), (x: 3.0, y: 3.0)];
    b.add(&snapped).unwrap();

    assert_eq!(b.node_at(coord! { x: 2.01, y: 2.0007 }), None);
    assert!(b.get(&snapped).unwrap().is_none());
    assert!(b.remove(&snapped).unwrap().is_none());
    assert!(
        b.edge_between(coord! { x: 2.0, y: 2.0 }, coord! { x: 3.0, y: 3.0 })
            .is_some()
    );
}

#[test]
fn build_graph_matches_incremental_builder() {
    let segments = [
        line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 2.0)],
        line_string![(x: 2.01, y: 2.0007), (x: 3.0, y: 3.0)],
        line_string![(x: 2.0, y: 1.75), (x: 4.0, y: 4.0)],
    ];
    let store = snapgraph::build_graph(&segments, BuildConfig::new(0.02)).unwrap();
    assert_eq!(store.node_count(), 5);
    assert_eq!(store.edge_count(), 3);

    let graph = store.into_graph();
    assert_eq!(graph.node_count(), 5);
}
