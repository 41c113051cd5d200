//! Diagnostic SVG of one scatterplot's structures.
//!
//! Renders a [`PairAnalysis`] on a square canvas using the [`svg`]
//! crate for document construction, XML escaping and path data
//! formatting. Each structure is a `<g>` layer with a stable `id`, drawn
//! back to front:
//!
//! | id              | content                                         |
//! |-----------------|-------------------------------------------------|
//! | `alpha-shape`   | filled alpha triangles                          |
//! | `triangulation` | every Delaunay edge                             |
//! | `hull`          | convex hull boundary (dashed)                   |
//! | `tree`          | spanning tree after outlier peeling             |
//! | `spine`         | longest path along the original spanning tree   |
//! | `sites`         | binned sites, radius growing with weight        |
//! | `outliers`      | peeled sites                                    |
//!
//! Data coordinates on `[0, 1]` map into the canvas with the `y` axis
//! pointing up.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use petgraph::graph::EdgeIndex;
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Path, Polygon, Rectangle, Title};
use svg::node::{Node, Text};

use scag_pipeline::{EdgeSet, PairAnalysis, Point, ScatterGraph};

/// Canvas width and height in pixels.
const CANVAS: f64 = 500.0;
/// Blank border around the unit square.
const MARGIN: f64 = 30.0;

/// Metadata to embed in the SVG document.
///
/// When present, `title` and `description` become `<title>` and `<desc>`
/// elements and the axis labels are drawn under and beside the plot.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the pair's measures.
    pub description: Option<&'a str>,

    /// Label of the horizontal variable.
    pub x_label: Option<&'a str>,

    /// Label of the vertical variable.
    pub y_label: Option<&'a str>,
}

/// Map a unit-square point into canvas coordinates.
fn to_canvas(p: Point) -> (f64, f64) {
    let span = 2.0f64.mul_add(-MARGIN, CANVAS);
    (
        p.x.mul_add(span, MARGIN),
        p.y.mul_add(-span, CANVAS - MARGIN),
    )
}

/// Build path data with one `M`/`L` segment per edge.
///
/// Returns `None` when no edge qualifies.
fn segments(graph: &ScatterGraph, edges: impl IntoIterator<Item = EdgeIndex>) -> Option<Data> {
    let mut data = Data::new();
    let mut any = false;
    for e in edges {
        if let Some((a, b)) = graph.endpoints(e) {
            data = data
                .move_to(to_canvas(graph.position(a)))
                .line_to(to_canvas(graph.position(b)));
            any = true;
        }
    }
    any.then_some(data)
}

fn flagged(set: &EdgeSet) -> impl Iterator<Item = EdgeIndex> + '_ {
    set.ones().map(EdgeIndex::new)
}

fn stroked(data: Data, stroke: &str, width: f64) -> Path {
    Path::new()
        .set("d", data)
        .set("fill", "none")
        .set("stroke", stroke)
        .set("stroke-width", width)
        .set("stroke-linecap", "round")
}

fn layer(id: &str) -> Group {
    Group::new().set("id", id)
}

fn axis_label(label: &str, x: f64, y: f64, rotate: bool) -> Element {
    let mut text = Element::new("text");
    text.assign("x", x);
    text.assign("y", y);
    text.assign("text-anchor", "middle");
    text.assign("font-family", "sans-serif");
    text.assign("font-size", 14);
    if rotate {
        text.assign("transform", format!("rotate(-90 {x} {y})"));
    }
    text.append(Text::new(label));
    text
}

/// Serialize a pair analysis into a diagnostic SVG document string.
///
/// # Examples
///
/// ```
/// use scag_export::svg::{SvgMetadata, to_pair_svg};
/// use scag_pipeline::{ScagnosticsConfig, analyze};
///
/// let x = [0.1, 0.9, 0.5, 0.3];
/// let y = [0.2, 0.4, 0.9, 0.6];
/// let config = ScagnosticsConfig { seed: Some(1), ..ScagnosticsConfig::default() };
/// let analysis = analyze(&x, &y, &config).unwrap();
/// let metadata = SvgMetadata { title: Some("a vs b"), ..SvgMetadata::default() };
/// let svg = to_pair_svg(&analysis, &metadata);
/// assert!(svg.contains("<title>a vs b</title>"));
/// ```
#[must_use]
pub fn to_pair_svg(analysis: &PairAnalysis, metadata: &SvgMetadata<'_>) -> String {
    let graph = &analysis.graph;

    let mut doc = Document::new()
        .set("width", CANVAS)
        .set("height", CANVAS)
        .set("viewBox", (0, 0, CANVAS, CANVAS));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let inner = 2.0f64.mul_add(-MARGIN, CANVAS);
    doc = doc
        .add(
            Rectangle::new()
                .set("width", CANVAS)
                .set("height", CANVAS)
                .set("fill", "white"),
        )
        .add(
            Rectangle::new()
                .set("x", MARGIN)
                .set("y", MARGIN)
                .set("width", inner)
                .set("height", inner)
                .set("fill", "none")
                .set("stroke", "#cccccc"),
        );

    let mut alpha = layer("alpha-shape");
    for tri in &analysis.alpha.triangles {
        let points = tri
            .iter()
            .map(|&n| {
                let (x, y) = to_canvas(graph.position(n));
                format!("{x},{y}")
            })
            .collect::<Vec<_>>()
            .join(" ");
        alpha = alpha.add(
            Polygon::new()
                .set("points", points)
                .set("fill", "#cfe3f7")
                .set("stroke", "none"),
        );
    }
    doc = doc.add(alpha);

    let mut triangulation = layer("triangulation");
    if let Some(data) = segments(graph, graph.edges()) {
        triangulation = triangulation.add(stroked(data, "#b0b0b0", 0.5));
    }
    doc = doc.add(triangulation);

    let mut hull = layer("hull");
    if let Some((first, rest)) = analysis.hull.vertices.split_first()
        && !rest.is_empty()
    {
        let mut data = Data::new().move_to(to_canvas(graph.position(*first)));
        for &n in rest {
            data = data.line_to(to_canvas(graph.position(n)));
        }
        hull = hull.add(stroked(data.close(), "#2b6cb0", 1.5).set("stroke-dasharray", "6 4"));
    }
    doc = doc.add(hull);

    let mut tree = layer("tree");
    if let Some(data) = segments(graph, flagged(&analysis.peeling.tree)) {
        tree = tree.add(stroked(data, "#222222", 1.5));
    }
    doc = doc.add(tree);

    let mut spine = layer("spine");
    if let Some(data) = segments(graph, analysis.spine()) {
        spine = spine.add(stroked(data, "#dd6b20", 3.0).set("stroke-opacity", 0.7));
    }
    doc = doc.add(spine);

    let mut sites = layer("sites");
    let mut outliers = layer("outliers");
    for n in graph.nodes() {
        let site = graph.site(n);
        let (cx, cy) = to_canvas(site.point);
        if analysis.peeling.outliers.contains(n.index()) {
            outliers = outliers.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", 5.0)
                    .set("fill", "none")
                    .set("stroke", "#e53e3e")
                    .set("stroke-width", 2.0),
            );
        } else {
            sites = sites.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", 1.5 + site.weight.sqrt().min(6.0))
                    .set("fill", "#222222")
                    .set("fill-opacity", 0.6),
            );
        }
    }
    doc = doc.add(sites).add(outliers);

    if let Some(label) = metadata.x_label {
        doc = doc.add(axis_label(label, CANVAS / 2.0, CANVAS - MARGIN / 3.0, false));
    }
    if let Some(label) = metadata.y_label {
        doc = doc.add(axis_label(label, MARGIN / 2.0, CANVAS / 2.0, true));
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use scag_pipeline::{ScagnosticsConfig, analyze_with_rng};

    use super::*;

    fn analysis(x: &[f64], y: &[f64]) -> PairAnalysis {
        analyze_with_rng(x, y, &ScagnosticsConfig::default(), &mut StdRng::seed_from_u64(3)).unwrap()
    }

    fn grid() -> PairAnalysis {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                x.push(f64::from(i) / 8.0 + 0.125);
                y.push(f64::from(j) / 8.0 + 0.125);
            }
        }
        x.push(1.0);
        y.push(1.0);
        analysis(&x, &y)
    }

    #[test]
    fn canvas_mapping_flips_y() {
        assert_eq!(to_canvas(Point::new(0.0, 0.0)), (MARGIN, CANVAS - MARGIN));
        assert_eq!(to_canvas(Point::new(1.0, 1.0)), (CANVAS - MARGIN, MARGIN));
    }

    #[test]
    fn document_has_declaration_and_every_layer() {
        let svg = to_pair_svg(&grid(), &SvgMetadata::default());
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg"));
        for id in ["alpha-shape", "triangulation", "hull", "tree", "spine", "sites", "outliers"] {
            assert!(svg.contains(&format!("id=\"{id}\"")), "layer {id} missing");
        }
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn one_circle_per_site() {
        let analysis = grid();
        let svg = to_pair_svg(&analysis, &SvgMetadata::default());
        assert_eq!(svg.matches("<circle").count(), analysis.graph.node_count());
    }

    #[test]
    fn alpha_triangles_become_polygons() {
        let analysis = grid();
        let svg = to_pair_svg(&analysis, &SvgMetadata::default());
        assert_eq!(svg.matches("<polygon").count(), analysis.alpha.triangles.len());
    }

    #[test]
    fn metadata_is_escaped() {
        let metadata = SvgMetadata {
            title: Some("a & b"),
            description: Some("x < y"),
            x_label: Some("width"),
            y_label: Some("height"),
        };
        let svg = to_pair_svg(&grid(), &metadata);
        assert!(svg.contains("<title>a &amp; b</title>"));
        assert!(svg.contains("x &lt; y"));
        assert!(svg.contains(">width</text>"));
        assert!(svg.contains("rotate(-90"));
    }

    #[test]
    fn single_site_renders_without_structures() {
        let svg = to_pair_svg(&analysis(&[0.5], &[0.5]), &SvgMetadata::default());
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(!svg.contains("<path"));
    }
}
