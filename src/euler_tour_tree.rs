//! Euler tour trees over the AVL sequence, after Henzinger and King
//! (J. ACM, 1999).
//!
//! Every tree of the forest is stored as its Euler tour: the sequence of
//! node visits produced by a depth-first walk that records a node on entry
//! and once more after each child subtree. A tour of a tree with k nodes has
//! exactly 2k − 1 occurrences, and exactly one occurrence per node is marked
//! active and cached on the node. An attached edge remembers the four
//! occurrences bracketing its two traversals, which is what makes cutting an
//! edge two sequence splits and one rejoin.

use std::fmt::{self, Debug};

use crate::sequence::{AvlSequence, Idx, EMPTY};

pub type NodeId = usize;
pub type EdgeId = usize;

/// One visit to a node during an Euler tour.
#[derive(Debug)]
struct Occurrence {
    node: NodeId,
    /// Tour edge entering this occurrence, if any.
    left_edge: Option<EdgeId>,
    /// Tour edge leaving this occurrence, if any.
    right_edge: Option<EdgeId>,
    active: bool,
}

#[derive(Debug)]
struct NodeRecord {
    active_occurrence: Idx,
}

#[derive(Debug, Default)]
struct EdgeRecord {
    /// `[o1, o2, o3, o4]` while attached: o1·o2 bracket one traversal of the
    /// edge, o3·o4 the other. `None` while detached.
    occ: Option<[Idx; 4]>,
}

/// A forest of Euler tour trees sharing one occurrence arena.
pub struct EulerTourForest {
    seq: AvlSequence<Occurrence>,
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    free_edges: Vec<EdgeId>,
}

impl Debug for EulerTourForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut db = f.debug_struct("EulerTourForest");
        let mut seen = Vec::new();
        for n in 0..self.nodes.len() {
            let root = self.seq.find_root(self.nodes[n].active_occurrence);
            if !seen.contains(&root) {
                seen.push(root);
                let tour: Vec<NodeId> =
                    self.seq.iter(root).map(|o| self.seq.data(o).node).collect();
                if tour.len() > 1 {
                    db.field(&format!("tour of {n}"), &tour);
                }
            }
        }
        db.finish()
    }
}

impl Default for EulerTourForest {
    fn default() -> Self {
        Self::new()
    }
}

impl EulerTourForest {
    pub fn new() -> Self {
        Self {
            seq: AvlSequence::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            free_edges: Vec::new(),
        }
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            seq: AvlSequence::with_capacity(2 * nodes),
            nodes: Vec::with_capacity(nodes),
            edges: Vec::new(),
            free_edges: Vec::new(),
        }
    }

    /// Creates a new node as its own singleton cluster.
    pub fn create_node(&mut self) -> NodeId {
        let n = self.nodes.len();
        let occ = self.seq.create(Occurrence {
            node: n,
            left_edge: None,
            right_edge: None,
            active: true,
        });
        self.nodes.push(NodeRecord {
            active_occurrence: occ,
        });
        n
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Allocates a detached edge slot.
    pub fn new_edge(&mut self) -> EdgeId {
        match self.free_edges.pop() {
            Some(e) => e,
            None => {
                self.edges.push(EdgeRecord::default());
                self.edges.len() - 1
            }
        }
    }

    /// Returns a detached edge slot to the arena.
    pub fn release_edge(&mut self, e: EdgeId) {
        debug_assert!(self.edges[e].occ.is_none());
        self.free_edges.push(e);
    }

    pub fn is_attached(&self, e: EdgeId) -> bool {
        self.edges[e].occ.is_some()
    }

    /// Links the clusters of `n1` and `n2` across the detached edge `e`.
    /// The two must not already share a cluster.
    pub fn create_edge(&mut self, n1: NodeId, n2: NodeId, e: EdgeId) {
        debug_assert!(!self.has_path(n1, n2));
        debug_assert!(self.edges[e].occ.is_none());
        log::trace!("ett: link {n1} {n2} via edge {e}");
        let o1h = self.make_head(n1);
        let o1t = self.seq.find_tail(self.seq.find_root(o1h));
        let o2h = self.make_head(n2);
        let o2t = self.seq.find_tail(self.seq.find_root(o2h));
        self.seq.join(o1t, o2h);
        let o4 = self.seq.create(Occurrence {
            node: n1,
            left_edge: Some(e),
            right_edge: None,
            active: false,
        });
        self.seq.insert_after(o2t, o4);
        self.seq.mutate_data(o1t, |o| o.right_edge = Some(e));
        self.seq.mutate_data(o2h, |o| o.left_edge = Some(e));
        self.seq.mutate_data(o2t, |o| o.right_edge = Some(e));
        self.edges[e].occ = Some([o1t, o2h, o2t, o4]);
    }

    /// Cuts the attached edge `e`, splitting its cluster in two.
    pub fn delete_edge(&mut self, e: EdgeId) {
        let [o1, o2, o3, o4] = self.edges[e].occ.take().expect("cut of a detached edge");
        log::trace!("ett: cut edge {e}");
        self.seq.split_after(o1);
        self.seq.split_after(o3);
        // Tour rotations may have swapped the roles of the two bracket
        // pairs; the pair whose pieces share a root encloses the middle.
        if self.seq.find_root(o1) == self.seq.find_root(o4) {
            self.rejoin(o3, o2);
            self.seq.mutate_data(o4, |o| o.left_edge = None);
            self.seq.mutate_data(o1, |o| o.right_edge = None);
        } else {
            self.rejoin(o1, o4);
            self.seq.mutate_data(o2, |o| o.left_edge = None);
            self.seq.mutate_data(o3, |o| o.right_edge = None);
        }
    }

    pub fn has_path(&self, n1: NodeId, n2: NodeId) -> bool {
        self.seq.find_root(self.nodes[n1].active_occurrence)
            == self.seq.find_root(self.nodes[n2].active_occurrence)
    }

    /// Canonical node of `n`'s cluster: the node visited by the root of the
    /// tour's tree. It only changes when the cluster is restructured.
    pub fn cluster_rep(&self, n: NodeId) -> NodeId {
        let root = self.seq.find_root(self.nodes[n].active_occurrence);
        self.seq.data(root).node
    }

    pub fn is_cluster_rep(&self, n: NodeId) -> bool {
        self.cluster_rep(n) == n
    }

    pub fn cluster_size(&self, n: NodeId) -> usize {
        (self.seq.size(self.nodes[n].active_occurrence) + 1) / 2
    }

    /// Iterates the nodes of `n`'s cluster, each exactly once.
    pub fn node_view(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.seq
            .iter(self.nodes[n].active_occurrence)
            .filter(move |&o| self.seq.data(o).active)
            .map(move |o| self.seq.data(o).node)
    }

    /// Iterates the tree edges of `n`'s cluster, each exactly once, at the
    /// occurrence closing the edge's first traversal.
    pub fn edge_view(&self, n: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.seq
            .iter(self.nodes[n].active_occurrence)
            .filter_map(move |o| {
                self.seq
                    .data(o)
                    .left_edge
                    .filter(|&e| matches!(self.edges[e].occ, Some(q) if q[1] == o))
            })
    }

    /// Rotates `n`'s tour so that it begins at an occurrence of `n`, and
    /// returns that occurrence.
    fn make_head(&mut self, n: NodeId) -> Idx {
        let new_head = self.nodes[n].active_occurrence;
        let old_root = self.seq.find_root(new_head);
        let old_head = self.seq.find_head(old_root);
        if self.seq.data(old_head).node == n {
            return old_head;
        }
        let old_tail = self.seq.find_tail(old_root);
        let left_of_old_tail = self.seq.previous(old_tail);
        let left_of_new_tail = self.seq.previous(new_head);
        let new_tail = self.seq.create(Occurrence {
            node: n,
            left_edge: None,
            right_edge: None,
            active: false,
        });
        self.seq.split_before(new_head);
        self.seq.remove(old_tail);
        self.seq.join(left_of_old_tail, old_head);
        self.seq.insert_after(left_of_new_tail, new_tail);
        self.seq.mutate_data(new_head, |o| o.left_edge = None);
        self.put_occurrence_on_edge(left_of_old_tail, old_head);
        self.put_occurrence_on_edge(left_of_new_tail, new_tail);
        let tail_occ = self.seq.data(old_tail);
        if tail_occ.active {
            let m = tail_occ.node;
            self.nodes[m].active_occurrence = old_head;
            self.seq.mutate_data(old_head, |o| o.active = true);
        }
        self.seq.destroy(old_tail);
        new_head
    }

    /// Glues the tour piece ending at `p` in front of the piece starting at
    /// `q`. `p` and `q` visit the same node; the duplicate `p` is removed
    /// and freed, transferring its active status to `q` if needed.
    fn rejoin(&mut self, p: Idx, q: Idx) {
        let pp = self.seq.previous(p);
        if pp != EMPTY {
            self.seq.remove(p);
            self.seq.join(pp, q);
            self.put_occurrence_on_edge(pp, q);
        }
        let p_occ = self.seq.data(p);
        if p_occ.active {
            let n = p_occ.node;
            self.nodes[n].active_occurrence = q;
            self.seq.mutate_data(q, |o| o.active = true);
        }
        self.seq.destroy(p);
    }

    /// After `left` and `right` became adjacent in a tour, records `left`'s
    /// outgoing tour edge as the one separating them.
    fn put_occurrence_on_edge(&mut self, left: Idx, right: Idx) {
        let e = self
            .seq
            .data(left)
            .right_edge
            .expect("seam occurrence without a tour edge");
        self.seq.mutate_data(right, |o| o.left_edge = Some(e));
        let occ = self.edges[e].occ.as_mut().expect("stale tour edge");
        if occ[0] == left {
            occ[1] = right;
        } else {
            occ[3] = right;
        }
    }

    /// Verifies the tour invariants of every cluster. Failures are logged.
    pub fn check_sanity(&self) -> bool {
        let mut roots = Vec::new();
        for n in 0..self.nodes.len() {
            let occ = self.nodes[n].active_occurrence;
            if !self.seq.data(occ).active || self.seq.data(occ).node != n {
                log::error!("ett sanity: node {n} has a stale active occurrence");
                return false;
            }
            let root = self.seq.find_root(occ);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        for &root in &roots {
            if !self.seq.check_sanity(root) {
                return false;
            }
            let mut active = 0;
            let mut total = 0;
            for o in self.seq.iter(root) {
                total += 1;
                let occ = self.seq.data(o);
                if occ.active {
                    active += 1;
                    if self.nodes[occ.node].active_occurrence != o {
                        log::error!("ett sanity: active occurrence not cached on {}", occ.node);
                        return false;
                    }
                }
            }
            if total != 2 * active - 1 {
                log::error!("ett sanity: tour length {total} for {active} nodes");
                return false;
            }
        }
        for (e, rec) in self.edges.iter().enumerate() {
            let Some([o1, o2, o3, o4]) = rec.occ else {
                continue;
            };
            if self.seq.data(o1).right_edge != Some(e)
                || self.seq.data(o2).left_edge != Some(e)
                || self.seq.data(o3).right_edge != Some(e)
                || self.seq.data(o4).left_edge != Some(e)
            {
                log::error!("ett sanity: edge {e} occurrence wiring broken");
                return false;
            }
            if self.seq.next(o1) != o2 || self.seq.next(o3) != o4 {
                log::error!("ett sanity: edge {e} brackets not adjacent");
                return false;
            }
            let (a, b) = (self.seq.data(o1).node, self.seq.data(o2).node);
            if self.seq.data(o4).node != a || self.seq.data(o3).node != b || a == b {
                log::error!("ett sanity: edge {e} endpoint mismatch");
                return false;
            }
        }
        true
    }
}
