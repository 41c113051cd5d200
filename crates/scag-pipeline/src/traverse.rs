//! Depth-first walks over a tree edge set.
//!
//! Visitation state is an explicit [`NodeSet`]: the caller owns it for
//! [`subtree_count`] (so consecutive walks can share or reset it), while
//! [`path_between`] and [`farthest_node`] allocate their own. Both use
//! an explicit stack so deep trees cannot overflow the call stack.

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::graph::{EdgeSet, NodeSet, ScatterGraph};

/// The part of a tree reachable from a root.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtree {
    /// Summed site weight of the reached nodes.
    pub mass: f64,
    /// Longest edge traversed, 0 when none was.
    pub max_edge: f64,
    /// Reached nodes in visit order, root first.
    pub nodes: Vec<NodeIndex>,
}

/// Walk `tree` from `root`, skipping edges longer than `cutoff` and
/// nodes already in `visited`.
///
/// Every reached node is added to `visited`. A root that is already
/// visited yields an empty subtree.
pub fn subtree_count(
    graph: &ScatterGraph,
    tree: &EdgeSet,
    root: NodeIndex,
    cutoff: f64,
    visited: &mut NodeSet,
) -> Subtree {
    let mut out = Subtree {
        mass: 0.0,
        max_edge: 0.0,
        nodes: Vec::new(),
    };
    if visited.put(root.index()) {
        return out;
    }
    let mut stack = vec![root];
    while let Some(n) = stack.pop() {
        out.mass += graph.site(n).weight;
        out.nodes.push(n);
        for (e, next) in graph.incident_in(n, tree) {
            let w = graph.length(e);
            if w > cutoff || visited.put(next.index()) {
                continue;
            }
            out.max_edge = out.max_edge.max(w);
            stack.push(next);
        }
    }
    out
}

/// The edges of the unique `tree` path from `a` to `b`, in order.
///
/// `Some(vec![])` when `a == b`; `None` when `b` is not reachable.
#[must_use]
pub fn path_between(
    graph: &ScatterGraph,
    tree: &EdgeSet,
    a: NodeIndex,
    b: NodeIndex,
) -> Option<Vec<EdgeIndex>> {
    if a == b {
        return Some(Vec::new());
    }
    let mut visited = graph.node_set();
    visited.insert(a.index());

    // Each frame holds a node, its tree neighbours, and the next one to try.
    let mut frames: Vec<(Vec<(EdgeIndex, NodeIndex)>, usize)> =
        vec![(graph.incident_in(a, tree).collect(), 0)];
    let mut path: Vec<EdgeIndex> = Vec::new();

    while let Some((neighbours, cursor)) = frames.last_mut() {
        let Some(&(e, next)) = neighbours.get(*cursor) else {
            frames.pop();
            path.pop();
            continue;
        };
        *cursor += 1;
        if visited.put(next.index()) {
            continue;
        }
        path.push(e);
        if next == b {
            return Some(path);
        }
        frames.push((graph.incident_in(next, tree).collect(), 0));
    }
    None
}

/// The node farthest from `from` along `tree`, with its distance.
#[must_use]
pub fn farthest_node(graph: &ScatterGraph, tree: &EdgeSet, from: NodeIndex) -> (NodeIndex, f64) {
    let mut visited = graph.node_set();
    visited.insert(from.index());
    let mut best = (from, 0.0);
    let mut stack = vec![(from, 0.0)];
    while let Some((n, d)) = stack.pop() {
        if d > best.1 {
            best = (n, d);
        }
        for (e, next) in graph.incident_in(n, tree) {
            if !visited.put(next.index()) {
                stack.push((next, d + graph.length(e)));
            }
        }
    }
    best
}
