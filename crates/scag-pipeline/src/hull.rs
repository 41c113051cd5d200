//! Convex hull of the active sites.
//!
//! Andrew's monotone chain, strict: points on a hull edge but not at a
//! corner are not hull vertices. Vertices come out counter-clockwise
//! starting from the lowest-leftmost site.

use geo::line_measures::Distance;
use geo::{Area, Euclidean, LineString, Polygon};
use petgraph::graph::NodeIndex;

use crate::graph::{EdgeSet, NodeSet, ScatterGraph};
use crate::types::Point;

/// Convex hull of a set of graph nodes.
#[derive(Debug, Clone)]
pub struct Hull {
    /// Hull corners in counter-clockwise order.
    pub vertices: Vec<NodeIndex>,
    /// Hull corners as a node set.
    pub nodes: NodeSet,
    /// Triangulation edges joining consecutive hull corners.
    pub edges: EdgeSet,
    /// Enclosed area.
    pub area: f64,
    /// Length of the closed boundary.
    pub perimeter: f64,
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x).mul_add(b.y - o.y, -((a.y - o.y) * (b.x - o.x)))
}

/// Hull corners of `points`, counter-clockwise, as indices into it.
///
/// Exact duplicates collapse to their first occurrence. Fewer than
/// three distinct non-collinear points yield one or two corners.
#[must_use]
pub fn monotone_chain(points: &[Point]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        let (a, b) = (points[i], points[j]);
        a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
    });
    order.dedup_by(|i, j| points[*i] == points[*j]);
    if order.len() < 3 {
        return order;
    }

    let mut lower: Vec<usize> = Vec::with_capacity(order.len());
    for &i in &order {
        while lower.len() >= 2
            && cross(points[lower[lower.len() - 2]], points[lower[lower.len() - 1]], points[i]) <= 0.0
        {
            lower.pop();
        }
        lower.push(i);
    }
    let mut upper: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order.iter().rev() {
        while upper.len() >= 2
            && cross(points[upper[upper.len() - 2]], points[upper[upper.len() - 1]], points[i]) <= 0.0
        {
            upper.pop();
        }
        upper.push(i);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Convex hull of the nodes in `active`.
#[must_use]
pub fn convex_hull(graph: &ScatterGraph, active: &NodeSet) -> Hull {
    let members: Vec<NodeIndex> = active.ones().map(NodeIndex::new).collect();
    let points: Vec<Point> = members.iter().map(|&n| graph.position(n)).collect();
    let vertices: Vec<NodeIndex> = monotone_chain(&points).into_iter().map(|i| members[i]).collect();

    let mut nodes = graph.node_set();
    let mut edges = graph.edge_set();
    for &v in &vertices {
        nodes.insert(v.index());
    }

    let corners: Vec<geo::Point<f64>> = vertices
        .iter()
        .map(|&v| geo::Point::from(geo::Coord::from(graph.position(v))))
        .collect();
    let mut perimeter = 0.0;
    if vertices.len() >= 2 {
        for k in 0..vertices.len() {
            let next = (k + 1) % vertices.len();
            perimeter += Euclidean.distance(corners[k], corners[next]);
            if let Some(e) = graph.edge_between(vertices[k], vertices[next]) {
                edges.insert(e.index());
            }
        }
    }

    let area = if vertices.len() >= 3 {
        let ring: LineString<f64> = corners.iter().map(|p| p.0).collect();
        Polygon::new(ring, vec![]).unsigned_area()
    } else {
        0.0
    };

    tracing::trace!(corners = vertices.len(), area, perimeter, "convex hull");
    Hull {
        vertices,
        nodes,
        edges,
        area,
        perimeter,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::triangulate::triangulate;
    use crate::types::Site;
    use proptest::prelude::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn square_with_interior_and_edge_points() {
        let p = pts(&[
            (0.0, 0.0),
            (0.5, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.5, 0.5),
        ]);
        let hull = monotone_chain(&p);
        assert_eq!(hull, vec![0, 2, 3, 4]);
    }

    #[test]
    fn collinear_points_give_two_corners() {
        let p = pts(&[(0.2, 0.2), (0.0, 0.0), (0.4, 0.4)]);
        assert_eq!(monotone_chain(&p), vec![1, 2]);
    }

    #[test]
    fn duplicates_collapse() {
        let p = pts(&[(0.3, 0.3), (0.3, 0.3)]);
        assert_eq!(monotone_chain(&p), vec![0]);
    }

    #[test]
    fn hull_measures_square() {
        let sites = [
            Site::new(0.0, 0.0, 1.0),
            Site::new(1.0, 0.0, 1.0),
            Site::new(1.0, 1.0, 1.0),
            Site::new(0.0, 1.0, 1.0),
            Site::new(0.4, 0.6, 1.0),
        ];
        let g = triangulate(&sites).unwrap();
        let hull = convex_hull(&g, &g.all_nodes());
        assert_eq!(hull.vertices.len(), 4);
        assert!(!hull.nodes.contains(4));
        assert_eq!(hull.edges.count_ones(..), 4);
        assert!((hull.area - 1.0).abs() < 1e-12);
        assert!((hull.perimeter - 4.0).abs() < 1e-12);
    }

    #[test]
    fn segment_hull_has_no_area() {
        let g = triangulate(&[Site::new(0.0, 0.0, 1.0), Site::new(0.3, 0.4, 1.0)]).unwrap();
        let hull = convex_hull(&g, &g.all_nodes());
        assert_eq!(hull.vertices.len(), 2);
        assert!(hull.area.abs() < f64::EPSILON);
        assert!((hull.perimeter - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hull_ignores_inactive_nodes() {
        let sites = [
            Site::new(0.0, 0.0, 1.0),
            Site::new(1.0, 0.0, 1.0),
            Site::new(0.0, 1.0, 1.0),
            Site::new(5.0, 5.0, 1.0),
        ];
        let g = triangulate(&sites).unwrap();
        let mut active = g.all_nodes();
        active.set(3, false);
        let hull = convex_hull(&g, &active);
        assert_eq!(hull.vertices.len(), 3);
        assert!((hull.area - 0.5).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn hull_contains_every_point_and_every_corner_matters(
            raw in proptest::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), 3..50),
        ) {
            let p = pts(&raw);
            let hull = monotone_chain(&p);
            prop_assume!(hull.len() >= 3);
            for k in 0..hull.len() {
                let a = p[hull[k]];
                let b = p[hull[(k + 1) % hull.len()]];
                for q in &p {
                    prop_assert!(cross(a, b, *q) >= -1e-12);
                }
            }
            // Dropping a corner must leave it strictly outside the rest.
            for k in 0..hull.len() {
                let prev = p[hull[(k + hull.len() - 1) % hull.len()]];
                let next = p[hull[(k + 1) % hull.len()]];
                prop_assert!(cross(prev, next, p[hull[k]]) < 0.0);
            }
        }
    }
}
