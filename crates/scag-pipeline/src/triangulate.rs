//! Delaunay triangulation of binned sites.
//!
//! The distinct site positions go through `geo`'s spade-backed
//! [`TriangulateSpade::unconstrained_triangulation`], which uses exact
//! orientation and in-circle predicates, so nearly flat triangles on the
//! hull are kept. Every edge of every resulting triangle becomes a
//! graph edge.
//!
//! Collinear inputs have no triangles; they come out as the chain of
//! consecutive points along the line. Sites that share a position with
//! an earlier site are joined to it by a zero-length edge.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use geo::{Coord, LineString, TriangulateSpade};
use petgraph::graph::NodeIndex;

use crate::graph::ScatterGraph;
use crate::types::{Point, ScagError, Site};

/// Coordinates smaller than this in magnitude are triangulated as zero.
///
/// The triangulator rejects nonzero values below roughly `2^-142`.
const SNAP_BELOW: f64 = 1e-40;

/// Bit-exact position key for detecting coincident sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordKey {
    x_bits: u64,
    y_bits: u64,
}

impl CoordKey {
    fn from_coord(c: Coord<f64>) -> Self {
        // Normalise -0.0 so it collides with 0.0.
        Self {
            x_bits: (c.x + 0.0).to_bits(),
            y_bits: (c.y + 0.0).to_bits(),
        }
    }
}

/// The position handed to the triangulator for `p`.
fn snapped(p: Point) -> Coord<f64> {
    let snap = |v: f64| if v.abs() < SNAP_BELOW { 0.0 } else { v };
    Coord {
        x: snap(p.x),
        y: snap(p.y),
    }
}

/// Build the triangulated proximity graph of `sites`.
///
/// Node `i` of the returned graph is `sites[i]`.
///
/// # Errors
///
/// Returns [`ScagError::Triangulation`] if a coordinate is outside the
/// range the triangulator can represent.
pub fn triangulate(sites: &[Site]) -> Result<ScatterGraph, ScagError> {
    let mut graph = ScatterGraph::with_sites(sites);

    // Distinct positions, each represented by the first site there.
    let mut first_at = HashMap::<CoordKey, NodeIndex>::new();
    let mut reps: Vec<NodeIndex> = Vec::new();
    for (i, site) in sites.iter().enumerate() {
        let n = NodeIndex::new(i);
        match first_at.entry(CoordKey::from_coord(snapped(site.point))) {
            Entry::Occupied(rep) => {
                graph.connect(*rep.get(), n);
            }
            Entry::Vacant(slot) => {
                slot.insert(n);
                reps.push(n);
            }
        }
    }

    if reps.len() >= 3 {
        delaunay(&mut graph, &reps, &first_at)?;
    }
    if graph.triangles().is_empty() {
        chain(&mut graph, &mut reps);
    }

    tracing::trace!(
        sites = sites.len(),
        distinct = reps.len(),
        edges = graph.edge_count(),
        triangles = graph.triangles().len(),
        "triangulated"
    );
    Ok(graph)
}

fn delaunay(
    graph: &mut ScatterGraph,
    reps: &[NodeIndex],
    first_at: &HashMap<CoordKey, NodeIndex>,
) -> Result<(), ScagError> {
    let positions: LineString<f64> = reps.iter().map(|&n| snapped(graph.position(n))).collect();
    let triangles = positions
        .unconstrained_triangulation()
        .map_err(|e| ScagError::Triangulation(e.to_string()))?;

    for tri in triangles {
        let [a, b, c] = tri
            .to_array()
            .map(|corner| first_at.get(&CoordKey::from_coord(corner)).copied());
        let (Some(a), Some(b), Some(c)) = (a, b, c) else {
            return Err(ScagError::Triangulation(
                "triangle corner matches no site".into(),
            ));
        };
        graph.push_triangle([a, b, c]);
        graph.connect(a, b);
        graph.connect(b, c);
        graph.connect(c, a);
    }
    Ok(())
}

/// Join distinct collinear positions in order along their line.
fn chain(graph: &mut ScatterGraph, reps: &mut [NodeIndex]) {
    reps.sort_by(|&a, &b| {
        let (pa, pb) = (graph.position(a), graph.position(b));
        pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
    });
    for pair in reps.windows(2) {
        graph.connect(pair[0], pair[1]);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use geo::{Area, ConvexHull, MultiPoint};
    use petgraph::algo::connected_components;
    use proptest::prelude::*;

    fn sites(points: &[(f64, f64)]) -> Vec<Site> {
        points.iter().map(|&(x, y)| Site::new(x, y, 1.0)).collect()
    }

    /// Twice the signed area of `abc`; positive when counter-clockwise.
    fn orient(a: Point, b: Point, c: Point) -> f64 {
        (b.x - a.x).mul_add(c.y - a.y, -((b.y - a.y) * (c.x - a.x)))
    }

    /// Positive when `d` lies strictly inside the circumcircle of the
    /// counter-clockwise triangle `abc`.
    fn in_circle(a: Point, b: Point, c: Point, d: Point) -> f64 {
        let (adx, ady) = (a.x - d.x, a.y - d.y);
        let (bdx, bdy) = (b.x - d.x, b.y - d.y);
        let (cdx, cdy) = (c.x - d.x, c.y - d.y);
        let ad = adx.mul_add(adx, ady * ady);
        let bd = bdx.mul_add(bdx, bdy * bdy);
        let cd = cdx.mul_add(cdx, cdy * cdy);
        adx * bdy.mul_add(cd, -(bd * cdy)) - ady * bdx.mul_add(cd, -(bd * cdx))
            + ad * bdx.mul_add(cdy, -(bdy * cdx))
    }

    fn triangle_area(g: &ScatterGraph) -> f64 {
        g.triangles()
            .iter()
            .map(|&[a, b, c]| orient(g.position(a), g.position(b), g.position(c)).abs() / 2.0)
            .sum()
    }

    fn hull_area(points: &[(f64, f64)]) -> f64 {
        MultiPoint::from(points.to_vec()).convex_hull().unsigned_area()
    }

    #[test]
    fn empty_and_single_site() {
        assert_eq!(triangulate(&[]).unwrap().edge_count(), 0);
        let g = triangulate(&sites(&[(0.5, 0.5)])).unwrap();
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn two_sites_make_one_edge() {
        let g = triangulate(&sites(&[(0.0, 0.0), (0.3, 0.4)])).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert!((g.length(petgraph::graph::EdgeIndex::new(0)) - 0.5).abs() < 1e-12);
        assert!(g.triangles().is_empty());
    }

    #[test]
    fn single_triangle() {
        let g = triangulate(&sites(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])).unwrap();
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.triangles().len(), 1);
    }

    #[test]
    fn square_has_one_diagonal() {
        let g = triangulate(&sites(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])).unwrap();
        assert_eq!(g.edge_count(), 5);
        assert_eq!(g.triangles().len(), 2);
    }

    #[test]
    fn flat_hull_triangle_is_kept() {
        let pts = [(0.0, 0.0), (0.5, 0.001), (1.0, 0.0), (0.5, 1.0)];
        let g = triangulate(&sites(&pts)).unwrap();
        assert!(g.edge_between(NodeIndex::new(0), NodeIndex::new(2)).is_some());
        assert_eq!(g.edge_count(), 5);
        assert_eq!(g.triangles().len(), 2);
        assert!((triangle_area(&g) - hull_area(&pts)).abs() < 1e-12);
    }

    #[test]
    fn collinear_sites_form_a_chain() {
        let g = triangulate(&sites(&[(0.0, 0.0), (0.75, 0.75), (0.25, 0.25), (0.5, 0.5)])).unwrap();
        assert_eq!(g.edge_count(), 3);
        assert!(g.triangles().is_empty());
        let total: f64 = g.edges().map(|e| g.length(e)).sum();
        assert!((total - 0.75 * 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn vertical_line_forms_a_chain() {
        let g = triangulate(&sites(&[(0.5, 0.9), (0.5, 0.1), (0.5, 0.4)])).unwrap();
        assert!(g.edge_between(NodeIndex::new(1), NodeIndex::new(2)).is_some());
        assert!(g.edge_between(NodeIndex::new(2), NodeIndex::new(0)).is_some());
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn coincident_sites_get_zero_length_edges() {
        let g = triangulate(&sites(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0)])).unwrap();
        let dup = g
            .edge_between(NodeIndex::new(0), NodeIndex::new(2))
            .unwrap();
        assert!(g.length(dup).abs() < f64::EPSILON);
        assert_eq!(connected_components(g.inner()), 1);
        assert_eq!(g.triangles().len(), 1);
    }

    #[test]
    fn vanishing_coordinates_are_treated_as_zero() {
        let g = triangulate(&sites(&[(1e-300, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)])).unwrap();
        assert_eq!(g.triangles().len(), 1);
        assert!(g.edge_between(NodeIndex::new(0), NodeIndex::new(3)).is_some());
        assert_eq!(connected_components(g.inner()), 1);
    }

    #[test]
    fn unrepresentable_coordinates_are_an_error() {
        let result = triangulate(&sites(&[(0.0, 0.0), (1e100, 0.0), (0.0, 1.0)]));
        assert!(matches!(result, Err(ScagError::Triangulation(_))));
    }

    #[test]
    fn grid_is_fully_triangulated() {
        let pts: Vec<(f64, f64)> = (0..3)
            .flat_map(|i| (0..3).map(move |j| (f64::from(i) * 0.5, f64::from(j) * 0.5)))
            .collect();
        let g = triangulate(&sites(&pts)).unwrap();
        assert_eq!(g.edge_count(), 16);
        assert_eq!(g.triangles().len(), 8);
        assert_eq!(connected_components(g.inner()), 1);
    }

    #[test]
    fn triangle_area_covers_hull() {
        let pts = [
            (0.1, 0.2),
            (0.8, 0.1),
            (0.9, 0.7),
            (0.3, 0.9),
            (0.5, 0.5),
            (0.4, 0.3),
            (0.7, 0.4),
        ];
        let g = triangulate(&sites(&pts)).unwrap();
        assert!((triangle_area(&g) - hull_area(&pts)).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn triangulation_is_delaunay_connected_and_complete(
            coords in proptest::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), 3..60),
        ) {
            let s: Vec<Site> = coords.iter().map(|&(x, y)| Site::new(x, y, 1.0)).collect();
            let g = triangulate(&s).unwrap();
            prop_assert_eq!(connected_components(g.inner()), 1);
            for &[a, b, c] in g.triangles() {
                let (pa, pb, pc) = (g.position(a), g.position(b), g.position(c));
                let (pa, pb) = if orient(pa, pb, pc) < 0.0 { (pb, pa) } else { (pa, pb) };
                for n in g.nodes() {
                    let q = g.position(n);
                    prop_assert!(in_circle(pa, pb, pc, q) < 1e-9);
                }
            }
            if !g.triangles().is_empty() {
                prop_assert!((triangle_area(&g) - hull_area(&coords)).abs() < 1e-9);
            }
        }
    }
}
