//! Leveled spanning forest after Holm, de Lichtenberg and Thorup
//! (J. ACM, 2001).
//!
//! Every edge carries a level. The tree edges at levels ≥ ℓ form a
//! sub-forest of those at levels ≥ ℓ − 1, and a level-ℓ cluster with two or
//! more members has at most n / 2^ℓ of them. A deleted tree edge is searched
//! for a replacement from its own level downwards; every non-crossing edge
//! inspected on the way is pushed one level up, which pays for inspecting it
//! again later and bounds deletion at O(lg² n) amortized.

use std::collections::BTreeSet;
use std::fmt::{self, Debug};

use crate::euler_tour_tree::{self, EulerTourForest};
use crate::spanning_forest::{EdgeId, NodeId, SpanningForest};

type Level = usize;

/// One node's presence at one level: its Euler tour node and the incident
/// edges currently living at this level.
#[derive(Debug)]
struct LevelNode {
    ett: euler_tour_tree::NodeId,
    edges: BTreeSet<EdgeId>,
}

#[derive(Debug)]
struct NodeState {
    /// Grow-only; level 0 exists from creation.
    levels: Vec<LevelNode>,
}

#[derive(Debug, Default)]
struct EdgeState {
    ends: Option<(NodeId, NodeId)>,
    level: Level,
    tree_edge: bool,
    /// One Euler tour edge per level 0..=level while a tree edge.
    level_edges: Vec<euler_tour_tree::EdgeId>,
}

/// Spanning forest with edge levels. Same surface as
/// [`crate::spanning_forest::EttSpanningForest`], better deletion bound.
pub struct HdtSpanningForest {
    /// Holds the level nodes of every level, all in one arena.
    ett: EulerTourForest,
    /// Maps an Euler tour node back to the graph node it represents.
    ett_owner: Vec<NodeId>,
    nodes: Vec<NodeState>,
    edges: Vec<EdgeState>,
}

impl Debug for HdtSpanningForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attached = self
            .edges
            .iter()
            .enumerate()
            .filter_map(|(e, st)| st.ends.map(|(a, b)| (e, a, b, st.level, st.tree_edge)))
            .collect::<Vec<_>>();
        f.debug_struct("HdtSpanningForest")
            .field("nodes", &self.nodes.len())
            .field("edges (id, a, b, level, tree)", &attached)
            .finish()
    }
}

impl HdtSpanningForest {
    fn level_ett(&self, n: NodeId, l: Level) -> euler_tour_tree::NodeId {
        self.nodes[n].levels[l].ett
    }

    /// Makes sure `n` participates at every level up to `l`.
    fn ensure_level(&mut self, n: NodeId, l: Level) {
        while self.nodes[n].levels.len() <= l {
            let en = self.ett.create_node();
            debug_assert_eq!(en, self.ett_owner.len());
            self.ett_owner.push(n);
            self.nodes[n].levels.push(LevelNode {
                ett: en,
                edges: BTreeSet::new(),
            });
        }
    }

    /// Turns `e` into a tree edge, wiring Euler tour edges at every level up
    /// to its own.
    fn promote_to_tree(&mut self, e: EdgeId) {
        let (a, b) = self.edges[e].ends.expect("promoting a detached edge");
        for l in 0..=self.edges[e].level {
            let le = self.ett.new_edge();
            self.edges[e].level_edges.push(le);
            let (ea, eb) = (self.level_ett(a, l), self.level_ett(b, l));
            self.ett.create_edge(ea, eb, le);
        }
        self.edges[e].tree_edge = true;
    }

    /// Raises `e` to level `to`, adding the Euler tour edge a raised tree
    /// edge needs at its new level.
    fn raise_tree_edge(&mut self, e: EdgeId, to: Level) {
        self.edges[e].level = to;
        let (a, b) = self.edges[e].ends.expect("raising a detached edge");
        self.ensure_level(a, to);
        self.ensure_level(b, to);
        let le = self.ett.new_edge();
        self.edges[e].level_edges.push(le);
        let (ea, eb) = (self.level_ett(a, to), self.level_ett(b, to));
        self.ett.create_edge(ea, eb, le);
    }

    /// Moves every edge of `n`'s level `to − 1` up to level `to`.
    fn raise_edges(&mut self, n: NodeId, to: Level) {
        self.ensure_level(n, to);
        let moved = std::mem::take(&mut self.nodes[n].levels[to - 1].edges);
        let target = &mut self.nodes[n].levels[to].edges;
        if target.is_empty() {
            *target = moved;
        } else {
            target.extend(moved);
        }
        let raised: Vec<EdgeId> = self.nodes[n].levels[to].edges.iter().copied().collect();
        for e in raised {
            if self.edges[e].tree_edge && self.edges[e].level != to {
                self.raise_tree_edge(e, to);
            } else {
                self.edges[e].level = to;
            }
        }
    }

    /// Replacement search at level `l` for the cut between `n1` and `n2`.
    /// Returns whether a crossing edge was promoted.
    fn replace_at_level(&mut self, n1: NodeId, n2: NodeId, l: Level) -> bool {
        let e1 = self.level_ett(n1, l);
        let e2 = self.level_ett(n2, l);
        let r1 = self.ett.cluster_rep(e1);
        let r2 = self.ett.cluster_rep(e2);
        let (small, large) = if self.ett.cluster_size(e1) < self.ett.cluster_size(e2) {
            (r1, r2)
        } else {
            (r2, r1)
        };
        // Sides of the cut are told apart at level 0.
        let large_super = self.ett_owner[large];
        let large_rep0 = self.ett.cluster_rep(self.level_ett(large_super, 0));
        let members: Vec<NodeId> = self
            .ett
            .node_view(small)
            .map(|en| self.ett_owner[en])
            .collect();
        log::trace!("hdt: replacement search at level {l}, {} nodes", members.len());
        let mut replacements = BTreeSet::new();
        for &n in &members {
            let candidates: Vec<EdgeId> =
                self.nodes[n].levels[l].edges.iter().copied().collect();
            for e in candidates {
                if self.edges[e].tree_edge {
                    continue;
                }
                let (x, y) = self.edges[e].ends.expect("neighbor set holds a detached edge");
                let other = if x == n { y } else { x };
                if self.ett.cluster_rep(self.level_ett(other, 0)) == large_rep0 {
                    self.nodes[n].levels[l].edges.remove(&e);
                    replacements.insert(e);
                }
            }
        }
        if replacements.is_empty() {
            return false;
        }
        // Pay for this scan: everything that stayed on the smaller side
        // moves one level up. The crossing edges keep their level.
        for &n in &members {
            self.raise_edges(n, l + 1);
        }
        for &e in &replacements {
            let (x, y) = self.edges[e].ends.expect("replacement edge detached");
            self.nodes[x].levels[l].edges.insert(e);
            self.nodes[y].levels[l].edges.insert(e);
        }
        let chosen = *replacements.first().expect("nonempty replacement set");
        self.promote_to_tree(chosen);
        true
    }

    /// Highest level any node currently participates at.
    pub fn max_level(&self) -> Level {
        self.nodes
            .iter()
            .map(|n| n.levels.len() - 1)
            .max()
            .unwrap_or(0)
    }

    /// Verifies level bookkeeping and the per-level cluster size bound.
    pub fn check_sanity(&self) -> bool {
        let n_total = self.nodes.len();
        for (e, st) in self.edges.iter().enumerate() {
            let Some((a, b)) = st.ends else {
                if st.tree_edge || !st.level_edges.is_empty() {
                    log::error!("hdt sanity: detached edge {e} with live state");
                    return false;
                }
                continue;
            };
            if st.tree_edge {
                if st.level_edges.len() != st.level + 1 {
                    log::error!("hdt sanity: tree edge {e} misses level edges");
                    return false;
                }
                if !st.level_edges.iter().all(|&le| self.ett.is_attached(le)) {
                    log::error!("hdt sanity: tree edge {e} has a detached level edge");
                    return false;
                }
            } else if !st.level_edges.is_empty() {
                log::error!("hdt sanity: non-tree edge {e} owns level edges");
                return false;
            }
            for (n, lvls) in [(a, &self.nodes[a].levels), (b, &self.nodes[b].levels)] {
                for (l, ln) in lvls.iter().enumerate() {
                    if ln.edges.contains(&e) != (l == st.level) {
                        log::error!("hdt sanity: edge {e} misplaced in the sets of node {n}");
                        return false;
                    }
                }
            }
        }
        for n in 0..self.nodes.len() {
            for (l, ln) in self.nodes[n].levels.iter().enumerate() {
                let size = self.ett.cluster_size(ln.ett);
                if size > 1 && size << l > n_total {
                    log::error!("hdt sanity: level {l} cluster of {n} too big ({size})");
                    return false;
                }
            }
        }
        self.ett.check_sanity()
    }
}

impl SpanningForest for HdtSpanningForest {
    fn new() -> Self {
        Self {
            ett: EulerTourForest::new(),
            ett_owner: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn create_node(&mut self) -> NodeId {
        let n = self.nodes.len();
        let en = self.ett.create_node();
        debug_assert_eq!(en, self.ett_owner.len());
        self.ett_owner.push(n);
        self.nodes.push(NodeState {
            levels: vec![LevelNode {
                ett: en,
                edges: BTreeSet::new(),
            }],
        });
        n
    }

    fn new_edge(&mut self) -> EdgeId {
        self.edges.push(EdgeState::default());
        self.edges.len() - 1
    }

    fn create_edge(&mut self, n1: NodeId, n2: NodeId, e: EdgeId) -> bool {
        debug_assert_ne!(n1, n2);
        debug_assert!(self.edges[e].ends.is_none());
        let st = &mut self.edges[e];
        st.ends = Some((n1, n2));
        st.level = 0;
        st.tree_edge = false;
        self.nodes[n1].levels[0].edges.insert(e);
        self.nodes[n2].levels[0].edges.insert(e);
        if self.ett.has_path(self.level_ett(n1, 0), self.level_ett(n2, 0)) {
            false
        } else {
            self.promote_to_tree(e);
            true
        }
    }

    fn delete_edge(&mut self, e: EdgeId) -> bool {
        let (n1, n2) = self.edges[e].ends.expect("deleting a detached edge");
        let lvl = self.edges[e].level;
        self.nodes[n1].levels[lvl].edges.remove(&e);
        self.nodes[n2].levels[lvl].edges.remove(&e);
        let mut split = false;
        if self.edges[e].tree_edge {
            let level_edges = std::mem::take(&mut self.edges[e].level_edges);
            for le in level_edges {
                self.ett.delete_edge(le);
                self.ett.release_edge(le);
            }
            self.edges[e].tree_edge = false;
            split = !(0..=lvl)
                .rev()
                .any(|l| self.replace_at_level(n1, n2, l));
        }
        self.edges[e].ends = None;
        split
    }

    fn has_path(&self, n1: NodeId, n2: NodeId) -> bool {
        self.ett
            .has_path(self.level_ett(n1, 0), self.level_ett(n2, 0))
    }

    fn cluster(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.ett
            .node_view(self.level_ett(n, 0))
            .map(move |en| self.ett_owner[en])
    }

    fn cluster_size(&self, n: NodeId) -> usize {
        self.ett.cluster_size(self.level_ett(n, 0))
    }

    fn cluster_rep(&self, n: NodeId) -> NodeId {
        self.ett_owner[self.ett.cluster_rep(self.level_ett(n, 0))]
    }

    fn edges(&self, n: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.nodes[n]
            .levels
            .iter()
            .flat_map(|ln| ln.edges.iter().copied())
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
