//! Fully dynamic connectivity for undirected graphs. The library maintains a
//! spanning forest under edge insertions and deletions and answers
//! connectivity, cluster membership, cluster size and representative queries.
//! See the trait [SpanningForest].
//!
//! Two frontends offer the same surface: [EttSpanningForest] deletes a tree
//! edge by scanning the smaller resulting cluster for a replacement, and
//! [HdtSpanningForest] adds edge levels to amortize that scan to O(lg² n)
//! per deletion. Everything else is O(lg n).
//!
//! ## Usage
//!
//! ```
//! use dynamic_connectivity::{HdtSpanningForest, SpanningForest};
//!
//! let mut f = HdtSpanningForest::new();
//! let nodes: Vec<_> = (0..4).map(|_| f.create_node()).collect();
//! let e01 = f.new_edge();
//! let e12 = f.new_edge();
//! assert!(f.create_edge(nodes[0], nodes[1], e01));
//! assert!(f.create_edge(nodes[1], nodes[2], e12));
//! assert!(f.has_path(nodes[0], nodes[2]));
//! assert!(!f.has_path(nodes[0], nodes[3]));
//! assert_eq!(f.cluster_size(nodes[1]), 3);
//! assert!(f.delete_edge(e12));
//! assert!(!f.has_path(nodes[0], nodes[2]));
//! ```
//!
//! You can see example usage at `src/bin/example.rs` and run it with
//! `cargo run`.
//!
//! ## Implementation
//!
//! Bottom up: [sequence::AvlSequence] keeps an ordered sequence in a
//! height-and-volume augmented AVL tree; [euler_tour_tree::EulerTourForest]
//! stores each forest tree as its Euler tour in such a sequence; the two
//! frontends sit on top and do the tree/non-tree edge bookkeeping. The
//! [kcore] module prunes a graph to its k-core through the common surface.
//!
//! ## Testing
//!
//! Run the tests with `cargo test`. The randomized suites compare every
//! structure against naive references and run the structural sanity checks
//! throughout; `cargo bench` benchmarks the sequence layer.

pub mod euler_tour_tree;
pub mod hdt;
pub mod kcore;
pub mod sequence;
pub mod spanning_forest;

pub use hdt::HdtSpanningForest;
pub use spanning_forest::{EdgeId, EttSpanningForest, NodeId, SpanningForest};
