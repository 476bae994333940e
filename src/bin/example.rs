use dynamic_connectivity::{EdgeId, HdtSpanningForest, NodeId, SpanningForest};

fn add_edge(f: &mut impl SpanningForest, u: NodeId, v: NodeId) -> EdgeId {
    let e = f.new_edge();
    let merged = f.create_edge(u, v, e);
    println!(
        "Adding edge from {} to {} ({})",
        u,
        v,
        if merged { "clusters merged" } else { "extra edge" }
    );
    e
}

fn rem_edge(f: &mut impl SpanningForest, e: EdgeId) {
    let (u, v) = (f.node1(e), f.node2(e));
    let split = f.delete_edge(e);
    println!(
        "Removing edge from {} to {} ({})",
        u,
        v,
        if split { "cluster split" } else { "still connected" }
    );
}

fn connected(f: &impl SpanningForest, u: NodeId, v: NodeId) {
    println!(
        "Is there a path from {} to {}? {}",
        u,
        v,
        if f.has_path(u, v) { "Yes" } else { "No" }
    );
}

fn main() {
    let mut f = HdtSpanningForest::new();
    let nodes: Vec<NodeId> = (0..10).map(|_| f.create_node()).collect();
    let mut path = Vec::new();
    for u in 0..9 {
        path.push(add_edge(&mut f, nodes[u], nodes[u + 1]));
    }
    println!("Created a path of length 10 (vertices 0 to 9)");
    connected(&f, nodes[0], nodes[9]);
    let shortcut = add_edge(&mut f, nodes[0], nodes[5]);
    rem_edge(&mut f, path[2]);
    connected(&f, nodes[0], nodes[9]);
    rem_edge(&mut f, shortcut);
    connected(&f, nodes[0], nodes[9]);
    println!(
        "Cluster of 0 now has {} members",
        f.cluster_size(nodes[0])
    );
}
