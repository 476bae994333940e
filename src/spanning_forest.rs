//! Spanning forests of a fully dynamic undirected graph.
//!
//! [`SpanningForest`] is the surface shared by the two frontends: the
//! baseline [`EttSpanningForest`] implemented here and the leveled
//! [`crate::hdt::HdtSpanningForest`]. Both maintain a spanning forest under
//! edge insertions and deletions, classify every edge as tree or non-tree,
//! and search the neighbor sets for a replacement when a tree edge goes
//! away.

use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::euler_tour_tree::EulerTourForest;

pub type NodeId = usize;
pub type EdgeId = usize;

/// Connectivity oracle over a mutating undirected graph.
///
/// Edge slots are allocated with [`Self::new_edge`] and may be reattached
/// after deletion. All precondition violations (attaching an attached slot,
/// deleting a detached one, self loops) are the caller's responsibility.
pub trait SpanningForest: Debug {
    fn new() -> Self;
    /// Adds an isolated node.
    fn create_node(&mut self) -> NodeId;
    /// Allocates a detached edge slot.
    fn new_edge(&mut self) -> EdgeId;
    /// Attaches `e` between `n1` and `n2`. Returns whether two clusters
    /// merged.
    fn create_edge(&mut self, n1: NodeId, n2: NodeId, e: EdgeId) -> bool;
    /// Detaches `e`. Returns whether its cluster split in two.
    fn delete_edge(&mut self, e: EdgeId) -> bool;
    fn has_path(&self, n1: NodeId, n2: NodeId) -> bool;
    /// The nodes of `n`'s cluster, each exactly once.
    fn cluster(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_;
    fn cluster_size(&self, n: NodeId) -> usize;
    /// Deterministic canonical node of `n`'s cluster.
    fn cluster_rep(&self, n: NodeId) -> NodeId;
    fn is_cluster_rep(&self, n: NodeId) -> bool {
        self.cluster_rep(n) == n
    }
    /// The attached edges incident to `n`, each exactly once.
    fn edges(&self, n: NodeId) -> impl Iterator<Item = EdgeId> + '_;
    fn node1(&self, e: EdgeId) -> NodeId;
    fn node2(&self, e: EdgeId) -> NodeId;
    fn is_tree_edge(&self, e: EdgeId) -> bool;
}

#[derive(Debug, Default)]
struct NodeState {
    edges: BTreeSet<EdgeId>,
}

#[derive(Debug, Default)]
struct EdgeState {
    ends: Option<(NodeId, NodeId)>,
    tree_edge: bool,
}

/// Baseline spanning forest: one Euler tour forest, flat neighbor sets.
///
/// Insertion takes O(lg n). Deleting a tree edge scans every neighbor set of
/// the smaller resulting cluster, which is what the leveled variant
/// improves on.
#[derive(Debug)]
pub struct EttSpanningForest {
    ett: EulerTourForest,
    nodes: Vec<NodeState>,
    edges: Vec<EdgeState>,
}

impl EttSpanningForest {
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            ett: EulerTourForest::with_capacity(nodes),
            nodes: Vec::with_capacity(nodes),
            edges: Vec::new(),
        }
    }

    fn promote_to_tree(&mut self, e: EdgeId) {
        let (a, b) = self.edges[e].ends.expect("promoting a detached edge");
        self.ett.create_edge(a, b, e);
        self.edges[e].tree_edge = true;
    }

    /// Looks for a non-tree edge reconnecting the two clusters left by a
    /// tree-edge deletion, scanning the smaller one. Returns whether the
    /// clusters were rejoined.
    fn find_replacement(&mut self, n1: NodeId, n2: NodeId) -> bool {
        let r1 = self.ett.cluster_rep(n1);
        let r2 = self.ett.cluster_rep(n2);
        let (small, large) = if self.ett.cluster_size(n1) < self.ett.cluster_size(n2) {
            (r1, r2)
        } else {
            (r2, r1)
        };
        log::trace!("replacement search from cluster of {small}");
        let members: Vec<NodeId> = self.ett.node_view(small).collect();
        let mut replacement = None;
        'scan: for n in members {
            for &f in &self.nodes[n].edges {
                let (x, y) = self.edges[f].ends.expect("neighbor set holds a detached edge");
                let m = if x == n { y } else { x };
                if self.ett.cluster_rep(m) == large {
                    replacement = Some(f);
                    break 'scan;
                }
            }
        }
        match replacement {
            Some(f) => {
                self.promote_to_tree(f);
                true
            }
            None => false,
        }
    }

    /// Verifies that tree-edge flags agree with the Euler tour forest and
    /// that each cluster carries exactly size − 1 tree edges.
    pub fn check_sanity(&self) -> bool {
        for (e, st) in self.edges.iter().enumerate() {
            if st.ends.is_some() {
                if st.tree_edge != self.ett.is_attached(e) {
                    log::error!("forest sanity: edge {e} flag disagrees with the forest");
                    return false;
                }
            } else if self.ett.is_attached(e) {
                log::error!("forest sanity: detached edge {e} still in the forest");
                return false;
            }
        }
        for n in 0..self.nodes.len() {
            if !self.is_cluster_rep(n) {
                continue;
            }
            let tree_edges = self
                .cluster(n)
                .flat_map(|m| self.nodes[m].edges.iter().copied())
                .filter(|&e| self.edges[e].tree_edge)
                .count();
            // Every tree edge is seen from both endpoints.
            if tree_edges != 2 * (self.cluster_size(n) - 1) {
                log::error!("forest sanity: cluster of {n} is not spanned by its tree edges");
                return false;
            }
        }
        self.ett.check_sanity()
    }
}

impl SpanningForest for EttSpanningForest {
    fn new() -> Self {
        Self {
            ett: EulerTourForest::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn create_node(&mut self) -> NodeId {
        let n = self.ett.create_node();
        debug_assert_eq!(n, self.nodes.len());
        self.nodes.push(NodeState::default());
        n
    }

    fn new_edge(&mut self) -> EdgeId {
        // Edge ids are shared with the Euler tour forest.
        let e = self.ett.new_edge();
        debug_assert_eq!(e, self.edges.len());
        self.edges.push(EdgeState::default());
        e
    }

    fn create_edge(&mut self, n1: NodeId, n2: NodeId, e: EdgeId) -> bool {
        debug_assert_ne!(n1, n2);
        debug_assert!(self.edges[e].ends.is_none());
        self.edges[e].ends = Some((n1, n2));
        self.edges[e].tree_edge = false;
        self.nodes[n1].edges.insert(e);
        self.nodes[n2].edges.insert(e);
        if self.ett.has_path(n1, n2) {
            false
        } else {
            self.promote_to_tree(e);
            true
        }
    }

    fn delete_edge(&mut self, e: EdgeId) -> bool {
        let (n1, n2) = self.edges[e].ends.expect("deleting a detached edge");
        self.nodes[n1].edges.remove(&e);
        self.nodes[n2].edges.remove(&e);
        let mut split = false;
        if self.edges[e].tree_edge {
            self.ett.delete_edge(e);
            self.edges[e].tree_edge = false;
            split = !self.find_replacement(n1, n2);
        }
        self.edges[e].ends = None;
        split
    }

    fn has_path(&self, n1: NodeId, n2: NodeId) -> bool {
        self.ett.has_path(n1, n2)
    }

    fn cluster(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.ett.node_view(n)
    }

    fn cluster_size(&self, n: NodeId) -> usize {
        self.ett.cluster_size(n)
    }

    fn cluster_rep(&self, n: NodeId) -> NodeId {
        self.ett.cluster_rep(n)
    }

    fn edges(&self, n: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.nodes[n].edges.iter().copied()
    }

    fn node1(&self, e: EdgeId) -> NodeId {
        self.edges[e].ends.expect("detached edge").0
    }

    fn node2(&self, e: EdgeId) -> NodeId {
        self.edges[e].ends.expect("detached edge").1
    }

    fn is_tree_edge(&self, e: EdgeId) -> bool {
        self.edges[e].tree_edge
    }
}
