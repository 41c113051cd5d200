//! Proximity graph over binned sites.
//!
//! Nodes and edges live in a petgraph [`UnGraph`] arena and are addressed
//! by stable indices; nothing is ever removed after construction. Role
//! annotations (spanning tree, hull, alpha shape, active nodes) are kept
//! outside the graph as bitsets keyed by index, so each structural pass
//! owns its own flags and can be recomputed without touching the others.

use fixedbitset::FixedBitSet;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::types::{Point, Site};

/// Role flags over edges, keyed by [`EdgeIndex::index`].
pub type EdgeSet = FixedBitSet;

/// Role flags over nodes, keyed by [`NodeIndex::index`].
pub type NodeSet = FixedBitSet;

/// Triangulated proximity graph of one scatterplot.
#[derive(Debug, Clone)]
pub struct ScatterGraph {
    graph: UnGraph<Site, f64>,
    triangles: Vec<[NodeIndex; 3]>,
}

impl ScatterGraph {
    /// A graph with one node per site and no edges.
    ///
    /// Node `i` corresponds to `sites[i]`.
    #[must_use]
    pub fn with_sites(sites: &[Site]) -> Self {
        let mut graph = UnGraph::with_capacity(sites.len(), 3 * sites.len());
        for &site in sites {
            graph.add_node(site);
        }
        Self {
            graph,
            triangles: Vec::new(),
        }
    }

    /// Join two nodes, weighting the edge by their Euclidean distance.
    ///
    /// Returns the existing edge if the nodes are already joined and
    /// `None` for a self-loop.
    pub fn connect(&mut self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        if a == b {
            return None;
        }
        if let Some(e) = self.graph.find_edge(a, b) {
            return Some(e);
        }
        let w = self.position(a).distance(self.position(b));
        Some(self.graph.add_edge(a, b, w))
    }

    /// Record a triangle whose three vertices are sites.
    pub(crate) fn push_triangle(&mut self, tri: [NodeIndex; 3]) {
        self.triangles.push(tri);
    }

    /// The underlying petgraph graph.
    #[must_use]
    pub const fn inner(&self) -> &UnGraph<Site, f64> {
        &self.graph
    }

    /// Triangles of the triangulation, by node index.
    #[must_use]
    pub fn triangles(&self) -> &[[NodeIndex; 3]] {
        &self.triangles
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate over all node indices.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Iterate over all edge indices in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    /// The site stored at a node.
    #[must_use]
    pub fn site(&self, n: NodeIndex) -> Site {
        self.graph[n]
    }

    /// Position of a node.
    #[must_use]
    pub fn position(&self, n: NodeIndex) -> Point {
        self.graph[n].point
    }

    /// Length of an edge.
    #[must_use]
    pub fn length(&self, e: EdgeIndex) -> f64 {
        self.graph[e]
    }

    /// Endpoints of an edge.
    #[must_use]
    pub fn endpoints(&self, e: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(e)
    }

    /// Edge joining two nodes, if any.
    #[must_use]
    pub fn edge_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    /// Edges incident to `n` that are in `set`, paired with the node at
    /// the far end.
    pub fn incident_in<'a>(
        &'a self,
        n: NodeIndex,
        set: &'a EdgeSet,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex)> + 'a {
        self.graph.edges(n).filter_map(move |e| {
            set.contains(e.id().index()).then(|| {
                let other = if e.source() == n { e.target() } else { e.source() };
                (e.id(), other)
            })
        })
    }

    /// Number of edges in `set` incident to `n`.
    #[must_use]
    pub fn degree_in(&self, n: NodeIndex, set: &EdgeSet) -> usize {
        self.incident_in(n, set).count()
    }

    /// An empty edge flag set sized for this graph.
    #[must_use]
    pub fn edge_set(&self) -> EdgeSet {
        FixedBitSet::with_capacity(self.edge_count())
    }

    /// An empty node flag set sized for this graph.
    #[must_use]
    pub fn node_set(&self) -> NodeSet {
        FixedBitSet::with_capacity(self.node_count())
    }

    /// A node set containing every node.
    #[must_use]
    pub fn all_nodes(&self) -> NodeSet {
        let mut set = self.node_set();
        set.insert_range(..);
        set
    }

    /// Summed weight of the nodes in `set`.
    #[must_use]
    pub fn mass(&self, set: &NodeSet) -> f64 {
        set.ones().map(|i| self.graph[NodeIndex::new(i)].weight).sum()
    }

    /// Summed length of the edges in `set`.
    #[must_use]
    pub fn total_length(&self, set: &EdgeSet) -> f64 {
        set.ones().map(|i| self.graph[EdgeIndex::new(i)]).sum()
    }
}
