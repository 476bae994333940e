//! An ordered sequence stored in a balanced binary tree.
//!
//! The in-order traversal of each tree *is* the stored sequence, so there is
//! no key ordering involved. Balancing is AVL: every node keeps its height
//! and its `volume` (subtree size), and sibling heights may differ by at most
//! one. Several sequences can live in the same [`AvlSequence`] arena at once;
//! splitting and joining moves nodes between them without reallocating.

use std::fmt::{Debug, Formatter};

use debug_tree::TreeBuilder;
use derivative::Derivative;

pub type Idx = usize;

/// Sentinel index for "no node".
pub const EMPTY: Idx = usize::MAX;

/// User-defined subtree aggregate, recomputed whenever the structure changes.
///
/// `()` is the trivial aggregate for sequences that only need ordering,
/// height and volume.
pub trait Aggregation<T>: Debug + Clone + Default {
    /// Aggregate of a single element.
    fn from_data(data: &T) -> Self;
    /// Combine with the aggregate of elements to the right.
    fn merge(self, right: Self) -> Self;
}

impl<T> Aggregation<T> for () {
    fn from_data(_: &T) -> Self {}
    fn merge(self, _: Self) -> Self {}
}

fn idx_fmt(u: &Idx, f: &mut Formatter) -> std::fmt::Result {
    if *u == EMPTY {
        write!(f, "∅")
    } else {
        write!(f, "{u}")
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
struct Node<T: Debug, Ag: Debug> {
    #[derivative(Debug(format_with = "idx_fmt"))]
    parent: Idx,
    #[derivative(Debug(format_with = "idx_fmt"))]
    left: Idx,
    #[derivative(Debug(format_with = "idx_fmt"))]
    right: Idx,
    height: u32,
    /// Number of nodes in the subtree rooted here, this node included.
    volume: usize,
    agg: Ag,
    data: T,
}

impl<T: Debug, Ag: Debug> Node<T, Ag> {
    fn new(data: T, agg: Ag) -> Self {
        Self {
            parent: EMPTY,
            left: EMPTY,
            right: EMPTY,
            height: 1,
            volume: 1,
            agg,
            data,
        }
    }
}

/// Arena of AVL-balanced sequences.
pub struct AvlSequence<T: Debug, Ag: Aggregation<T> = ()> {
    nodes: Vec<Node<T, Ag>>,
    free: Vec<Idx>,
}

impl<T: Debug, Ag: Aggregation<T>> Debug for AvlSequence<T, Ag> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let mut builder = TreeBuilder::new();
        let _b = builder.add_branch("AvlSequence");
        for u in 0..self.nodes.len() {
            let n = &self.nodes[u];
            if n.parent == EMPTY && n.volume > 0 {
                self.tree_dbg(u, &mut builder);
            }
        }
        writeln!(f, "{}", builder.string())
    }
}

impl<T: Debug, Ag: Aggregation<T>> Default for AvlSequence<T, Ag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug, Ag: Aggregation<T>> AvlSequence<T, Ag> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Creates a new detached singleton and returns its index. Slots freed by
    /// [`Self::destroy`] are recycled.
    pub fn create(&mut self, data: T) -> Idx {
        let agg = Ag::from_data(&data);
        let node = Node::new(data, agg);
        match self.free.pop() {
            Some(u) => {
                self.nodes[u] = node;
                u
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Returns `p`'s slot to the arena. `p` must be a detached singleton.
    pub fn destroy(&mut self, p: Idx) {
        debug_assert!(self.is_singleton(p));
        // Volume zero marks the slot as free for Debug and check_sanity.
        self.nodes[p].volume = 0;
        self.free.push(p);
    }

    pub fn is_singleton(&self, p: Idx) -> bool {
        let n = &self.nodes[p];
        n.parent == EMPTY && n.left == EMPTY && n.right == EMPTY && n.volume == 1
    }

    pub fn data(&self, p: Idx) -> &T {
        &self.nodes[p].data
    }

    /// Mutates `p`'s payload and recomputes aggregates on the path to the
    /// root.
    pub fn mutate_data(&mut self, p: Idx, f: impl FnOnce(&mut T)) {
        f(&mut self.nodes[p].data);
        self.augment_up(p);
    }

    /// Aggregate over the subtree rooted at `p`.
    pub fn aggregate(&self, p: Idx) -> &Ag {
        &self.nodes[p].agg
    }

    /// Number of nodes in the subtree rooted at `p`.
    pub fn volume(&self, p: Idx) -> usize {
        self.nodes[p].volume
    }

    /// Length of the whole sequence containing `p`.
    pub fn size(&self, p: Idx) -> usize {
        self.nodes[self.find_root(p)].volume
    }

    pub fn find_root(&self, mut p: Idx) -> Idx {
        while self.nodes[p].parent != EMPTY {
            p = self.nodes[p].parent;
        }
        p
    }

    /// Leftmost node of the subtree rooted at `p`.
    pub fn find_head(&self, mut p: Idx) -> Idx {
        while self.nodes[p].left != EMPTY {
            p = self.nodes[p].left;
        }
        p
    }

    /// Rightmost node of the subtree rooted at `p`.
    pub fn find_tail(&self, mut p: Idx) -> Idx {
        while self.nodes[p].right != EMPTY {
            p = self.nodes[p].right;
        }
        p
    }

    /// In-order successor of `p`, or [`EMPTY`].
    pub fn next(&self, p: Idx) -> Idx {
        if self.nodes[p].right != EMPTY {
            return self.find_head(self.nodes[p].right);
        }
        let mut u = p;
        loop {
            let pp = self.nodes[u].parent;
            if pp == EMPTY {
                return EMPTY;
            }
            if self.nodes[pp].left == u {
                return pp;
            }
            u = pp;
        }
    }

    /// In-order predecessor of `p`, or [`EMPTY`].
    pub fn previous(&self, p: Idx) -> Idx {
        if self.nodes[p].left != EMPTY {
            return self.find_tail(self.nodes[p].left);
        }
        let mut u = p;
        loop {
            let pp = self.nodes[u].parent;
            if pp == EMPTY {
                return EMPTY;
            }
            if self.nodes[pp].right == u {
                return pp;
            }
            u = pp;
        }
    }

    pub fn same_sequence(&self, p: Idx, q: Idx) -> bool {
        self.find_root(p) == self.find_root(q)
    }

    /// Inserts the detached singleton `n` immediately before `p`.
    pub fn insert_before(&mut self, p: Idx, n: Idx) {
        debug_assert!(self.is_singleton(n));
        if self.nodes[p].left != EMPTY {
            let r = self.find_tail(self.nodes[p].left);
            self.set_right(r, n);
            self.balance(r);
        } else {
            self.set_left(p, n);
            self.balance(p);
        }
    }

    /// Inserts the detached singleton `n` immediately after `p`.
    pub fn insert_after(&mut self, p: Idx, n: Idx) {
        debug_assert!(self.is_singleton(n));
        if self.nodes[p].right != EMPTY {
            let r = self.find_head(self.nodes[p].right);
            self.set_left(r, n);
            self.balance(r);
        } else {
            self.set_right(p, n);
            self.balance(p);
        }
    }

    /// Detaches `p` from its sequence; `p` becomes a singleton again.
    pub fn remove(&mut self, p: Idx) {
        let (l, r) = (self.nodes[p].left, self.nodes[p].right);
        if l == EMPTY {
            let b = self.nodes[p].parent;
            self.transplant(p, r);
            self.balance(b);
        } else if r == EMPTY {
            let b = self.nodes[p].parent;
            self.transplant(p, l);
            self.balance(b);
        } else {
            // Replace p by its in-order successor and rebalance from the
            // successor's old parent.
            let q = self.find_head(r);
            let mut b = q;
            let qp = self.nodes[q].parent;
            if qp != p {
                b = qp;
                let qr = self.nodes[q].right;
                self.set_left(qp, qr);
                self.set_right(q, self.nodes[p].right);
            }
            self.transplant(p, q);
            self.set_left(q, self.nodes[p].left);
            self.balance(b);
        }
        let n = &mut self.nodes[p];
        n.parent = EMPTY;
        n.left = EMPTY;
        n.right = EMPTY;
        n.height = 1;
        n.volume = 1;
        n.agg = Ag::from_data(&n.data);
    }

    /// Concatenates the sequence containing `p` in front of the sequence
    /// containing `q`. The two must be distinct.
    pub fn join(&mut self, p: Idx, q: Idx) {
        let rp = self.find_root(p);
        let rq = self.find_root(q);
        debug_assert_ne!(rp, rq);
        if self.nodes[rp].height < self.nodes[rq].height {
            self.embed(rp, rq);
        } else {
            self.embrace(rp, rq);
        }
    }

    /// Splits the sequence containing `p` so that `p` becomes the first
    /// element of the second piece.
    pub fn split_before(&mut self, p: Idx) {
        self.make_root(p);
        let q = self.nodes[p].left;
        if q != EMPTY {
            self.nodes[p].left = EMPTY;
            self.nodes[q].parent = EMPTY;
            let t = self.find_tail(q);
            self.balance_down(t);
        }
        self.balance_down(p);
    }

    /// Splits the sequence containing `p` so that `p` becomes the last
    /// element of the first piece.
    pub fn split_after(&mut self, p: Idx) {
        self.make_root(p);
        let q = self.nodes[p].right;
        if q != EMPTY {
            self.nodes[p].right = EMPTY;
            self.nodes[q].parent = EMPTY;
            let h = self.find_head(q);
            self.balance_down(h);
        }
        self.balance_down(p);
    }

    /// Iterates the whole sequence containing `u`, front to back.
    pub fn iter(&self, u: Idx) -> Iter<'_, T, Ag> {
        let root = self.find_root(u);
        Iter {
            seq: self,
            front: self.find_head(root),
            back: self.find_tail(root),
        }
    }

    /// Iterates the whole sequence containing `u`, back to front.
    pub fn riter(&self, u: Idx) -> std::iter::Rev<Iter<'_, T, Ag>> {
        self.iter(u).rev()
    }

    fn height(&self, u: Idx) -> u32 {
        if u == EMPTY {
            0
        } else {
            self.nodes[u].height
        }
    }

    fn vol(&self, u: Idx) -> usize {
        if u == EMPTY {
            0
        } else {
            self.nodes[u].volume
        }
    }

    fn agg_of(&self, u: Idx) -> Ag {
        if u == EMPTY {
            Ag::default()
        } else {
            self.nodes[u].agg.clone()
        }
    }

    fn slope(&self, u: Idx) -> i32 {
        self.height(self.nodes[u].left) as i32 - self.height(self.nodes[u].right) as i32
    }

    /// Recomputes height, volume and the user aggregate of `u` from its
    /// children.
    fn augment(&mut self, u: Idx) {
        let (l, r) = (self.nodes[u].left, self.nodes[u].right);
        let height = self.height(l).max(self.height(r)) + 1;
        let volume = self.vol(l) + self.vol(r) + 1;
        let agg = self
            .agg_of(l)
            .merge(Ag::from_data(&self.nodes[u].data))
            .merge(self.agg_of(r));
        let n = &mut self.nodes[u];
        n.height = height;
        n.volume = volume;
        n.agg = agg;
    }

    fn augment_up(&mut self, mut u: Idx) {
        while u != EMPTY {
            self.augment(u);
            u = self.nodes[u].parent;
        }
    }

    /// Rewires `p`'s parent to point at `q` instead. Does not touch `p`'s own
    /// parent pointer.
    fn transplant(&mut self, p: Idx, q: Idx) {
        let pp = self.nodes[p].parent;
        if pp != EMPTY {
            if self.nodes[pp].left == p {
                self.nodes[pp].left = q;
            } else {
                self.nodes[pp].right = q;
            }
        }
        if q != EMPTY {
            self.nodes[q].parent = pp;
        }
    }

    fn set_left(&mut self, p: Idx, q: Idx) {
        if p != EMPTY {
            self.nodes[p].left = q;
        }
        if q != EMPTY {
            self.nodes[q].parent = p;
        }
    }

    fn set_right(&mut self, p: Idx, q: Idx) {
        if p != EMPTY {
            self.nodes[p].right = q;
        }
        if q != EMPTY {
            self.nodes[q].parent = p;
        }
    }

    fn rotate_right(&mut self, p: Idx) {
        let q = self.nodes[p].left;
        let qr = self.nodes[q].right;
        self.nodes[p].left = qr;
        if qr != EMPTY {
            self.nodes[qr].parent = p;
        }
        let pp = self.nodes[p].parent;
        self.nodes[q].parent = pp;
        if pp != EMPTY {
            if self.nodes[pp].right == p {
                self.nodes[pp].right = q;
            } else {
                self.nodes[pp].left = q;
            }
        }
        self.nodes[q].right = p;
        self.nodes[p].parent = q;
        self.augment(p);
        self.augment(q);
    }

    fn rotate_left(&mut self, p: Idx) {
        let q = self.nodes[p].right;
        let ql = self.nodes[q].left;
        self.nodes[p].right = ql;
        if ql != EMPTY {
            self.nodes[ql].parent = p;
        }
        let pp = self.nodes[p].parent;
        self.nodes[q].parent = pp;
        if pp != EMPTY {
            if self.nodes[pp].left == p {
                self.nodes[pp].left = q;
            } else {
                self.nodes[pp].right = q;
            }
        }
        self.nodes[q].left = p;
        self.nodes[p].parent = q;
        self.augment(p);
        self.augment(q);
    }

    /// Restores the AVL condition walking from `p` up to the root.
    fn balance(&mut self, mut p: Idx) {
        while p != EMPTY {
            self.augment(p);
            let bf = self.slope(p);
            if bf > 1 {
                let l = self.nodes[p].left;
                if self.slope(l) == -1 {
                    self.rotate_left(l);
                }
                self.rotate_right(p);
            } else if bf < -1 {
                let r = self.nodes[p].right;
                if self.slope(r) == 1 {
                    self.rotate_right(r);
                }
                self.rotate_left(p);
            }
            p = self.nodes[p].parent;
        }
    }

    /// Split variant of [`Self::balance`]: stays on `p` after each rotation
    /// because splits can leave an imbalance of more than one level.
    fn balance_down(&mut self, mut p: Idx) {
        while p != EMPTY {
            self.augment(p);
            let bf = self.slope(p);
            if bf > 1 {
                let l = self.nodes[p].left;
                if self.slope(l) == -1 {
                    self.rotate_left(l);
                }
                self.rotate_right(p);
            } else if bf < -1 {
                let r = self.nodes[p].right;
                if self.slope(r) == 1 {
                    self.rotate_right(r);
                }
                self.rotate_left(p);
            } else {
                p = self.nodes[p].parent;
            }
        }
    }

    /// Rotates `p` all the way up to the root of its tree.
    fn make_root(&mut self, p: Idx) {
        while self.nodes[p].parent != EMPTY {
            let pp = self.nodes[p].parent;
            if self.nodes[pp].left == p {
                self.rotate_right(pp);
            } else {
                self.rotate_left(pp);
            }
        }
    }

    /// Splices the shorter tree rooted at `p` into the left spine of the
    /// taller tree rooted at `q`, using the tail of `p` as the connector.
    fn embed(&mut self, p: Idx, q: Idx) {
        let h = self.nodes[p].height;
        let n = self.find_tail(p);
        let mut b = n;
        if self.nodes[n].parent != EMPTY {
            b = self.nodes[n].parent;
            let nl = self.nodes[n].left;
            self.transplant(n, nl);
            self.augment_up(b);
        }
        let mut m = q;
        while h < self.nodes[m].height && self.nodes[m].left != EMPTY {
            m = self.nodes[m].left;
        }
        let mp = self.nodes[m].parent;
        self.set_left(mp, n);
        self.set_right(n, m);
        if n != p {
            self.set_left(n, p);
        }
        self.balance(b);
    }

    /// Mirror of [`Self::embed`]: splices the tree rooted at `q` into the
    /// right spine of the tree rooted at `p`, using the head of `q` as the
    /// connector.
    fn embrace(&mut self, p: Idx, q: Idx) {
        let h = self.nodes[q].height;
        let n = self.find_head(q);
        let mut b = n;
        if self.nodes[n].parent != EMPTY {
            b = self.nodes[n].parent;
            let nr = self.nodes[n].right;
            self.transplant(n, nr);
            self.augment_up(b);
        }
        let mut m = p;
        while h < self.nodes[m].height && self.nodes[m].right != EMPTY {
            m = self.nodes[m].right;
        }
        let mp = self.nodes[m].parent;
        self.set_right(mp, n);
        self.set_left(n, m);
        if n != q {
            self.set_right(n, q);
        }
        self.balance(b);
    }

    fn tree_dbg(&self, u: Idx, tree: &mut TreeBuilder) {
        let _b = tree.add_branch(&format!("{:?}", self.nodes[u]));
        let n = &self.nodes[u];
        if n.left == EMPTY && n.right == EMPTY {
            return;
        }
        for c in [n.left, n.right] {
            if c != EMPTY {
                self.tree_dbg(c, tree);
            } else {
                tree.add_leaf("∅");
            }
        }
    }

    /// Verifies parent consistency, heights, the AVL condition and volumes
    /// of the tree containing `u`. Failures are logged.
    pub fn check_sanity(&self, u: Idx) -> bool {
        self.check_subtree(self.find_root(u), EMPTY)
    }

    fn check_subtree(&self, u: Idx, parent: Idx) -> bool {
        if u == EMPTY {
            return true;
        }
        let n = &self.nodes[u];
        if n.parent != parent {
            log::error!("sequence sanity: bad parent pointer at {u}");
            return false;
        }
        if n.height != self.height(n.left).max(self.height(n.right)) + 1 {
            log::error!("sequence sanity: bad height at {u}");
            return false;
        }
        let bf = self.slope(u);
        if !(-1..=1).contains(&bf) {
            log::error!("sequence sanity: balance violation at {u} (slope {bf})");
            return false;
        }
        if n.volume != self.vol(n.left) + self.vol(n.right) + 1 {
            log::error!("sequence sanity: bad volume at {u}");
            return false;
        }
        self.check_subtree(n.left, u) && self.check_subtree(n.right, u)
    }
}

/// Double-ended in-order iterator over one sequence, yielding node indices.
pub struct Iter<'a, T: Debug, Ag: Aggregation<T>> {
    seq: &'a AvlSequence<T, Ag>,
    front: Idx,
    back: Idx,
}

impl<T: Debug, Ag: Aggregation<T>> Iterator for Iter<'_, T, Ag> {
    type Item = Idx;

    fn next(&mut self) -> Option<Idx> {
        if self.front == EMPTY {
            return None;
        }
        let cur = self.front;
        if cur == self.back {
            self.front = EMPTY;
            self.back = EMPTY;
        } else {
            self.front = self.seq.next(cur);
        }
        Some(cur)
    }
}

impl<T: Debug, Ag: Aggregation<T>> DoubleEndedIterator for Iter<'_, T, Ag> {
    fn next_back(&mut self) -> Option<Idx> {
        if self.back == EMPTY {
            return None;
        }
        let cur = self.back;
        if cur == self.front {
            self.front = EMPTY;
            self.back = EMPTY;
        } else {
            self.back = self.seq.previous(cur);
        }
        Some(cur)
    }
}
