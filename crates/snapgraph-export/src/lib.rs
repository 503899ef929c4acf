//! snapgraph-export: Pure format serializers for built graphs (sans-IO)
//!
//! Converts edge geometries and node coordinates into output formats.
//! Currently supports SVG.

pub mod svg;

pub use svg::{SvgMetadata, build_path_data, graph_to_svg, to_svg};
