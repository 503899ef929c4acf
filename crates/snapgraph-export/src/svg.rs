//! SVG export serializer.
//!
//! Converts a built graph into an SVG string using the [`svg`] crate for
//! document construction, XML escaping, and path data formatting.
//!
//! Each edge geometry becomes a `<path>` element using `M` (move to) and
//! `L` (line to) commands. Each node becomes a `<circle>` drawn on top of
//! the edges.
//!
//! Graph coordinates have `y` pointing up; SVG has `y` pointing down. The
//! document is flipped vertically: a coordinate `(x, y)` is drawn at
//! `(x, max_y - y)`, where `max_y` is the largest `y` in the drawing.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use geo::{Coord, LineString};
use snapgraph::PetgraphStore;
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

/// Margin around the drawing, as a fraction of its larger extent.
const MARGIN_FRACTION: f64 = 0.05;
/// Node circle radius, as a fraction of the drawing's larger extent.
const NODE_RADIUS_FRACTION: f64 = 0.006;
/// Extent used when every coordinate coincides (or there are none).
const DEGENERATE_EXTENT: f64 = 1.0;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the tolerance and input file, so exported files are
    /// distinguishable.
    pub description: Option<&'a str>,

    /// Serialized build configuration, emitted inside a `<metadata>`
    /// element wrapped in a namespaced `<snapgraph:config>` element.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a line string.
///
/// Uses `M` for the first coordinate and `L` for the rest. Returns an
/// empty string for line strings with fewer than 2 coordinates.
/// Coordinates are emitted unchanged (no flip).
///
/// # Examples
///
/// ```
/// use geo::line_string;
/// use snapgraph_export::build_path_data;
///
/// let line = line_string![(x: 10.0, y: 20.0), (x: 30.0, y: 40.0)];
/// assert_eq!(build_path_data(&line), "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(line: &LineString<f64>) -> String {
    path_data_with(line, |c| (c.x, c.y))
}

fn path_data_with(line: &LineString<f64>, tx: impl Fn(&Coord<f64>) -> (f64, f64)) -> String {
    let [first, rest @ ..] = line.0.as_slice() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to(tx(first));
    for c in rest {
        data = data.line_to(tx(c));
    }
    String::from(Value::from(data))
}

/// Axis-aligned extent of everything drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Extent {
    fn of<'a>(coords: impl IntoIterator<Item = &'a Coord<f64>>) -> Option<Self> {
        coords.into_iter().fold(None, |acc, c| {
            Some(acc.map_or(
                Self {
                    min_x: c.x,
                    min_y: c.y,
                    max_x: c.x,
                    max_y: c.y,
                },
                |e: Self| Self {
                    min_x: e.min_x.min(c.x),
                    min_y: e.min_y.min(c.y),
                    max_x: e.max_x.max(c.x),
                    max_y: e.max_y.max(c.y),
                },
            ))
        })
    }

    fn size(&self) -> f64 {
        let size = (self.max_x - self.min_x).max(self.max_y - self.min_y);
        if size > 0.0 { size } else { DEGENERATE_EXTENT }
    }
}

/// Serialize graph edges and nodes into an SVG document string.
///
/// Every edge with 2 or more coordinates becomes a `<path>` inside
/// `<g id="edges">`; every node becomes a `<circle>` inside
/// `<g id="nodes">`. The `viewBox` is the bounding box of all drawn
/// coordinates plus a small margin. Strokes use
/// `vector-effect="non-scaling-stroke"` so they stay visible at any
/// coordinate scale.
///
/// # Examples
///
/// ```
/// use geo::{coord, line_string};
/// use snapgraph_export::{SvgMetadata, to_svg};
///
/// let edges = vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 2.0)]];
/// let nodes = vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 2.0 }];
/// let metadata = SvgMetadata {
///     title: Some("roads"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&edges, &nodes, &metadata);
/// assert!(svg.contains("<title>roads</title>"));
/// assert!(svg.contains("M0,2 L1,0"));
/// ```
#[must_use]
pub fn to_svg(
    edges: &[LineString<f64>],
    nodes: &[Coord<f64>],
    metadata: &SvgMetadata<'_>,
) -> String {
    let points = edges.iter().flat_map(|l| l.0.iter()).chain(nodes);
    let extent = Extent::of(points).unwrap_or(Extent {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    });
    let size = extent.size();
    let margin = size * MARGIN_FRACTION;
    let width = (extent.max_x - extent.min_x) + 2.0 * margin;
    let height = (extent.max_y - extent.min_y) + 2.0 * margin;
    let flip = |c: &Coord<f64>| (c.x, extent.max_y - c.y);

    let mut doc = Document::new().set(
        "viewBox",
        format!("{} {} {width} {height}", extent.min_x - margin, -margin),
    );

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("snapgraph:config");
        config_el.assign("xmlns:snapgraph", "https://github.com/snapgraph/snapgraph");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    let mut edge_group = Group::new()
        .set("id", "edges")
        .set("fill", "none")
        .set("stroke", "black")
        .set("stroke-width", 1);
    for line in edges {
        let d = path_data_with(line, flip);
        if d.is_empty() {
            continue;
        }
        edge_group = edge_group.add(
            Path::new()
                .set("d", d)
                .set("vector-effect", "non-scaling-stroke"),
        );
    }
    doc = doc.add(edge_group);

    let radius = size * NODE_RADIUS_FRACTION;
    let mut node_group = Group::new().set("id", "nodes").set("fill", "red");
    for node in nodes {
        let (cx, cy) = flip(node);
        node_group = node_group.add(Circle::new().set("cx", cx).set("cy", cy).set("r", radius));
    }
    doc = doc.add(node_group);

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// Serialize every edge and node held by `store`.
///
/// Shorthand for [`to_svg`] over the store's edge geometries and node
/// coordinates.
#[must_use]
pub fn graph_to_svg(store: &PetgraphStore, metadata: &SvgMetadata<'_>) -> String {
    let edges: Vec<LineString<f64>> = store.edge_geometries().cloned().collect();
    let nodes: Vec<Coord<f64>> = store.node_coords().collect();
    to_svg(&edges, &nodes, metadata)
}
