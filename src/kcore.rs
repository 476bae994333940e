//! k-core pruning over any [`SpanningForest`].
//!
//! The k-core of a graph is its maximal subgraph in which every node has
//! degree at least k. Pruning repeatedly strips nodes of too small a degree
//! by deleting their edges; the report tracks how the giant cluster shrinks
//! and how the k-core splits into clusters.

use std::collections::BTreeMap;

use crate::spanning_forest::{NodeId, SpanningForest};

/// Outcome of [`prune`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KCoreReport {
    /// Largest cluster size before pruning.
    pub initial_giant_size: usize,
    /// Largest cluster size among k-core members after pruning.
    pub steady_giant_size: usize,
    /// Number of sweeps that removed at least one node.
    pub rounds: usize,
    /// Cluster size → number of such clusters, over k-core members only.
    pub cluster_size_dist: BTreeMap<usize, usize>,
}

fn degree<F: SpanningForest>(f: &F, n: NodeId) -> usize {
    f.edges(n).count()
}

/// Deletes every edge incident to `n`.
fn strip_node<F: SpanningForest>(f: &mut F, n: NodeId) {
    let incident: Vec<_> = f.edges(n).collect();
    for e in incident {
        f.delete_edge(e);
    }
}

fn giant_size<F: SpanningForest>(f: &F, nodes: impl Iterator<Item = NodeId>) -> usize {
    nodes.map(|n| f.cluster_size(n)).max().unwrap_or(0)
}

/// Prunes the graph on `nodes` to its k-core and reports the result.
///
/// Already isolated nodes are left alone; a sweep strips every node whose
/// degree is in `1..k`, and pruning stops when a sweep strips nothing.
pub fn prune<F: SpanningForest>(f: &mut F, nodes: &[NodeId], k: usize) -> KCoreReport {
    let initial_giant_size = giant_size(f, nodes.iter().copied());
    let mut rounds = 0;
    loop {
        let doomed: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&n| (1..k).contains(&degree(f, n)))
            .collect();
        if doomed.is_empty() {
            break;
        }
        log::trace!("kcore: sweep {rounds} strips {} nodes", doomed.len());
        for n in doomed {
            strip_node(f, n);
        }
        rounds += 1;
    }
    let core: Vec<NodeId> = nodes
        .iter()
        .copied()
        .filter(|&n| degree(f, n) >= k)
        .collect();
    let mut cluster_size_dist = BTreeMap::new();
    for &n in &core {
        if f.is_cluster_rep(n) {
            *cluster_size_dist.entry(f.cluster_size(n)).or_insert(0) += 1;
        }
    }
    KCoreReport {
        initial_giant_size,
        steady_giant_size: giant_size(f, core.iter().copied()),
        rounds,
        cluster_size_dist,
    }
}
