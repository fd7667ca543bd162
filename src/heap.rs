//! The policy-selected meldable heap
//!
//! One structure implements four classic heaps. The heap is a forest of
//! heap-ordered multiway trees whose roots form a circular ring; the minimum
//! item always sits at a root. Two primitives do all the work:
//!
//! - **Successive linking** (consolidation): links roots of equal rank until at
//!   most one tree per rank remains. Eager-meld heaps run it after every meld,
//!   insert and cut; lazy-meld heaps only during `delete_min`.
//! - **Key decrease**: either swap the item up towards the root (eager,
//!   O(depth) exchanges, no structural change) or cut the node into the root
//!   ring and cascade through marked ancestors (lazy, O(1) amortized).
//!
//! `insert` melds a singleton tree into the heap and `delete` is a key decrease
//! below the minimum followed by `delete_min`.
//!
//! # Time Complexity
//!
//! | Operation      | binomial   | lazy binomial | Fibonacci   | binomial with cuts |
//! |----------------|------------|---------------|-------------|--------------------|
//! | `insert`       | O(log n)   | O(1)          | O(1)        | O(log n)           |
//! | `find_min`     | O(1)       | O(1)          | O(1)        | O(1)               |
//! | `delete_min`   | O(log n)   | O(log n)*     | O(log n)*   | O(log n)*          |
//! | `decrease_key` | O(log n)   | O(log n)      | O(1)*       | O(log n)*          |
//! | `meld`         | O(log n)   | O(1)          | O(1)        | O(log n)           |
//!
//! `*` amortized.

use crate::counters::CostCounters;
use crate::error::HeapError;
use crate::item::{Item, Membership};
use crate::node::{self, key_of, Node, NodePtr};
use crate::policy::{DecreaseStrategy, HeapPolicy, HeapVariant, MeldStrategy};
use crate::rank;
use crate::{Key, MIN_KEY};
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Meldable heap whose consolidation and decrease-key behavior is chosen by a
/// [`HeapPolicy`]
///
/// # Example
///
/// ```rust
/// use rust_meldable_heaps::MeldableHeap;
///
/// let mut heap = MeldableHeap::fibonacci();
/// let ten = heap.insert(10, "ten").unwrap();
/// heap.insert(3, "three").unwrap();
/// heap.insert(7, "seven").unwrap();
///
/// heap.decrease_key(&ten, 9).unwrap();
/// assert_eq!(heap.find_min().map(|min| min.key()), Some(1));
/// assert_eq!(heap.find_min().map(|min| *min.payload()), Some("ten"));
/// ```
pub struct MeldableHeap<T> {
    policy: HeapPolicy,
    melds: MeldStrategy,
    decreases: DecreaseStrategy,
    pub(crate) min: Option<Item<T>>,
    pub(crate) len: usize,
    pub(crate) num_trees: usize,
    pub(crate) marked: usize,
    counters: CostCounters,
    pub(crate) membership: Rc<Membership>,
    // The heap owns its nodes through raw pointers
    _marker: PhantomData<Box<Node<T>>>,
}

impl<T> MeldableHeap<T> {
    /// Creates an empty heap with the given policy
    pub fn with_policy(policy: HeapPolicy) -> Self {
        Self {
            policy,
            melds: policy.meld_strategy(),
            decreases: policy.decrease_strategy(),
            min: None,
            len: 0,
            num_trees: 0,
            marked: 0,
            counters: CostCounters::default(),
            membership: Membership::new(),
            _marker: PhantomData,
        }
    }

    pub fn with_variant(variant: HeapVariant) -> Self {
        Self::with_policy(variant.policy())
    }

    /// Eager melds, swap-up decrease-keys
    pub fn binomial() -> Self {
        Self::with_policy(HeapPolicy::BINOMIAL)
    }

    /// Lazy melds, swap-up decrease-keys
    pub fn lazy_binomial() -> Self {
        Self::with_policy(HeapPolicy::LAZY_BINOMIAL)
    }

    /// Lazy melds, cut-based decrease-keys
    pub fn fibonacci() -> Self {
        Self::with_policy(HeapPolicy::FIBONACCI)
    }

    /// Eager melds, cut-based decrease-keys
    pub fn binomial_with_cuts() -> Self {
        Self::with_policy(HeapPolicy::BINOMIAL_WITH_CUTS)
    }

    pub fn policy(&self) -> HeapPolicy {
        self.policy
    }

    pub fn variant(&self) -> HeapVariant {
        self.policy.variant()
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// Number of trees in the root ring
    pub fn num_trees(&self) -> usize {
        self.num_trees
    }

    /// Number of marked (non-root) nodes
    pub fn num_marked_nodes(&self) -> usize {
        self.marked
    }

    /// Lifetime number of links performed by successive linking
    pub fn total_links(&self) -> u64 {
        self.counters.links
    }

    /// Lifetime number of cuts performed by lazy decrease-keys
    pub fn total_cuts(&self) -> u64 {
        self.counters.cuts
    }

    /// Lifetime number of item exchanges performed by swap-up decrease-keys
    pub fn total_heapify_cost(&self) -> u64 {
        self.counters.heapify_cost
    }

    /// Snapshot of all three lifetime counters
    pub fn counters(&self) -> CostCounters {
        self.counters
    }

    /// Inserts `payload` with the given key and returns its handle
    ///
    /// The new item becomes a singleton tree that is melded into the heap, so
    /// eager-meld heaps consolidate immediately and lazy ones just splice.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::NonPositiveKey`] if `key <= 0`.
    pub fn insert(&mut self, key: Key, payload: T) -> Result<Item<T>, HeapError> {
        if key <= 0 {
            warn!(key, "rejected insert of a non-positive key");
            return Err(HeapError::NonPositiveKey(key));
        }
        let item = Item::new(key, payload, &self.membership);
        Node::alloc(item.clone());
        self.absorb(item.clone(), 1, 1, 0);
        Ok(item)
    }

    /// The item with the smallest key, `None` if the heap is empty
    pub fn find_min(&self) -> Option<&Item<T>> {
        self.min.as_ref()
    }

    /// Removes the item with the smallest key and returns its (now stale) handle
    ///
    /// The children of the removed root are promoted into the root ring in its
    /// place, and successive linking always runs afterwards, whatever the
    /// policy. Promoting children is not a cut: `total_cuts` is unaffected.
    /// Does nothing on an empty heap.
    pub fn delete_min(&mut self) -> Option<Item<T>> {
        let min = self.min.take()?;
        let doomed = node_of(&min);

        // SAFETY: `doomed` and every node reachable from it belong to this heap
        let head = unsafe {
            let first_child = (*doomed.as_ptr()).child.take();
            if let Some(first) = first_child {
                for child in node::ring_members(first) {
                    (*child.as_ptr()).parent = None;
                    if (*child.as_ptr()).mark {
                        (*child.as_ptr()).mark = false;
                        self.marked -= 1;
                    }
                }
            }
            (*doomed.as_ptr()).rank = 0;

            // The children ring takes the removed node's place in the root ring
            match (node::unlink(doomed), first_child) {
                (Some(rest), Some(first)) => {
                    node::splice(rest, first);
                    Some(rest)
                }
                (rest, first) => rest.or(first),
            }
        };

        self.len -= 1;
        // SAFETY: `doomed` is now a detached singleton without children
        let removed = unsafe { Node::free(doomed) };
        debug_assert!(removed.ptr_eq(&min));

        match head {
            Some(head) => self.consolidate(head),
            None => {
                self.num_trees = 0;
                debug_assert_eq!(self.marked, 0);
            }
        }
        Some(min)
    }

    /// Decreases the key of `item` by `diff`
    ///
    /// Swap-up heaps exchange the item with its ancestors until heap order
    /// holds; cut-based heaps cut the node into the root ring if it now beats
    /// its parent and run cascading cuts (consolidating right away on
    /// eager-meld heaps).
    ///
    /// Keys may become zero or negative, down to [`MIN_KEY`].
    ///
    /// # Errors
    ///
    /// - [`HeapError::StaleHandle`] / [`HeapError::ForeignHandle`] if `item` is
    ///   not live in this heap
    /// - [`HeapError::NonPositiveDiff`] if `diff <= 0`
    /// - [`HeapError::KeyUnderflow`] if the new key would be below [`MIN_KEY`]
    pub fn decrease_key(&mut self, item: &Item<T>, diff: Key) -> Result<(), HeapError> {
        self.check_owned(item)?;
        if diff <= 0 {
            warn!(diff, "rejected non-positive key decrease");
            return Err(HeapError::NonPositiveDiff(diff));
        }
        let key = item.key();
        let new_key = key
            .checked_sub(diff)
            .filter(|k| *k >= MIN_KEY)
            .ok_or(HeapError::KeyUnderflow { key, diff })?;
        self.lower_key(item, new_key);
        Ok(())
    }

    /// Removes `item` from the heap
    ///
    /// The item is pushed strictly below the current minimum through the
    /// active decrease-key strategy and then removed by `delete_min`, so the
    /// cost is that of one decrease-key plus one delete-min.
    ///
    /// # Errors
    ///
    /// [`HeapError::StaleHandle`] / [`HeapError::ForeignHandle`] if `item` is not
    /// live in this heap.
    pub fn delete(&mut self, item: &Item<T>) -> Result<(), HeapError> {
        self.check_owned(item)?;
        let min = self.min.as_ref().ok_or(HeapError::StaleHandle)?;
        if !min.ptr_eq(item) {
            // Live keys never go below MIN_KEY, so there is always room below
            let below_min = min.key() - 1;
            self.lower_key(item, below_min);
        }
        let removed = self.delete_min();
        debug_assert!(removed.is_some_and(|removed| removed.ptr_eq(item)));
        Ok(())
    }

    /// Moves every item of `other` into this heap, leaving `other` empty
    ///
    /// The root rings are spliced in O(1); eager-meld heaps then consolidate.
    /// Lifetime counters of `other` are added to this heap's and reset in
    /// `other`. Handles of the moved items stay valid and now belong to this
    /// heap.
    ///
    /// # Errors
    ///
    /// [`HeapError::PolicyMismatch`] if the heaps use different policies; both
    /// heaps are left untouched.
    pub fn meld(&mut self, other: &mut MeldableHeap<T>) -> Result<(), HeapError> {
        if self.policy != other.policy {
            warn!(this = %self.policy, other = %other.policy, "rejected meld across policies");
            return Err(HeapError::PolicyMismatch {
                this: self.policy,
                other: other.policy,
            });
        }
        let Some(other_min) = other.min.take() else {
            return Ok(());
        };
        debug!(
            variant = %self.policy,
            this_len = self.len,
            other_len = other.len,
            "meld"
        );

        other.membership.forward_to(&self.membership);
        other.membership = Membership::new();
        self.counters += std::mem::take(&mut other.counters);

        let (len, trees, marked) = (other.len, other.num_trees, other.marked);
        other.len = 0;
        other.num_trees = 0;
        other.marked = 0;

        self.absorb(other_min, len, trees, marked);
        Ok(())
    }

    /// Keys of the roots in ring order, starting at the minimum
    pub fn roots(&self) -> Vec<Key> {
        match &self.min {
            // SAFETY: the root ring belongs to this heap
            Some(min) => unsafe {
                node::ring_members(node_of(min))
                    .into_iter()
                    .map(|root| key_of(root))
                    .collect()
            },
            None => Vec::new(),
        }
    }

    /// Splices a root ring whose minimum is `other_min` into this heap
    fn absorb(&mut self, other_min: Item<T>, len: usize, trees: usize, marked: usize) {
        let Some(self_min) = self.min.clone() else {
            self.min = Some(other_min);
            self.len = len;
            self.num_trees = trees;
            self.marked = marked;
            return;
        };

        let head = node_of(&self_min);
        // SAFETY: both rings are owned by this heap from here on
        unsafe { node::splice(head, node_of(&other_min)) };
        self.len += len;
        self.num_trees += trees;
        self.marked += marked;

        match self.melds {
            MeldStrategy::Lazy => {
                if other_min.key() < self_min.key() {
                    self.min = Some(other_min);
                }
            }
            MeldStrategy::Eager => self.consolidate(head),
        }
    }

    /// Successive linking over the root ring containing `head`.
    ///
    /// Leaves at most one tree per rank, rebuilds the root ring in increasing
    /// rank order and recomputes `num_trees` and the minimum.
    fn consolidate(&mut self, head: NodePtr<T>) {
        let mut buckets: SmallVec<[Option<NodePtr<T>>; 64]> =
            smallvec![None; rank::bucket_count(self.len)];
        let links_before = self.counters.links;

        // SAFETY: the root ring and the trees below it belong to this heap
        unsafe {
            let roots = node::ring_members(head);
            let root_count = roots.len();

            for mut tree in roots {
                node::make_singleton(tree);
                loop {
                    let r = usize::from((*tree.as_ptr()).rank);
                    if r >= buckets.len() {
                        buckets.resize(r + 1, None);
                    }
                    match buckets[r].take() {
                        None => {
                            buckets[r] = Some(tree);
                            break;
                        }
                        // on equal keys the tree being placed stays on top
                        Some(other) if key_of(other) < key_of(tree) => {
                            self.link(tree, other);
                            tree = other;
                        }
                        Some(other) => self.link(other, tree),
                    }
                }
            }

            let mut first: Option<NodePtr<T>> = None;
            let mut min: Option<NodePtr<T>> = None;
            self.num_trees = 0;
            for tree in buckets.into_iter().flatten() {
                self.num_trees += 1;
                match first {
                    None => first = Some(tree),
                    Some(first) => node::splice(first, tree),
                }
                if min.map_or(true, |min| key_of(tree) < key_of(min)) {
                    min = Some(tree);
                }
            }
            self.min = min.map(|min| (*min.as_ptr()).item.clone());

            trace!(
                roots = root_count,
                trees = self.num_trees,
                links = self.counters.links - links_before,
                "successive linking"
            );
        }
    }

    /// Links root `y` below root `x`
    unsafe fn link(&mut self, y: NodePtr<T>, x: NodePtr<T>) {
        debug_assert!(!(*y.as_ptr()).mark, "roots are never marked");
        node::link_as_child(y, x);
        self.counters.links += 1;
    }

    /// Sets the key of a live item to `new_key` (lower than its current key)
    /// and restores heap order with the active strategy
    fn lower_key(&mut self, item: &Item<T>, new_key: Key) {
        debug_assert!(new_key < item.key());
        item.set_key(new_key);
        match self.decreases {
            DecreaseStrategy::SwapUp => self.swap_up(item),
            DecreaseStrategy::CutCascade => self.cut_cascade(item),
        }
        if self.min.as_ref().map_or(true, |min| new_key < min.key()) {
            self.min = Some(item.clone());
        }
    }

    fn swap_up(&mut self, item: &Item<T>) {
        let mut current = node_of(item);
        // SAFETY: the item's node and its ancestors belong to this heap
        unsafe {
            while let Some(parent) = (*current.as_ptr()).parent {
                if key_of(parent) <= key_of(current) {
                    break;
                }
                std::mem::swap(&mut (*current.as_ptr()).item, &mut (*parent.as_ptr()).item);
                (*current.as_ptr()).item.set_node(Some(current));
                (*parent.as_ptr()).item.set_node(Some(parent));
                self.counters.heapify_cost += 1;
                current = parent;
            }
        }
    }

    fn cut_cascade(&mut self, item: &Item<T>) {
        let node = node_of(item);
        // SAFETY: the item's node and its ancestors belong to this heap
        unsafe {
            let Some(parent) = (*node.as_ptr()).parent else {
                return;
            };
            if key_of(parent) <= key_of(node) {
                return;
            }

            // Whether the node that lost a child was a root at that moment.
            // Consolidation after a cut only relinks roots, so a non-root
            // ancestor stays a non-root for the whole cascade.
            let mut lost_child = parent;
            let mut was_root = (*parent.as_ptr()).parent.is_none();
            self.cut(node);

            let mut cascade = 0usize;
            while !was_root {
                if !(*lost_child.as_ptr()).mark {
                    (*lost_child.as_ptr()).mark = true;
                    self.marked += 1;
                    break;
                }
                let Some(grandparent) = (*lost_child.as_ptr()).parent else {
                    break;
                };
                was_root = (*grandparent.as_ptr()).parent.is_none();
                self.cut(lost_child);
                cascade += 1;
                lost_child = grandparent;
            }
            trace!(key = item.key(), cascade, "cut");
        }
    }

    /// Detaches `node` from its parent into the root ring
    unsafe fn cut(&mut self, node: NodePtr<T>) {
        if node::cut_from_parent(node).is_none() {
            return;
        }
        if (*node.as_ptr()).mark {
            (*node.as_ptr()).mark = false;
            self.marked -= 1;
        }
        self.counters.cuts += 1;
        self.add_as_root(node);
        match self.melds {
            MeldStrategy::Eager => self.consolidate(node),
            MeldStrategy::Lazy => {}
        }
    }

    /// Adds the singleton `node` to the root ring
    unsafe fn add_as_root(&mut self, node: NodePtr<T>) {
        match self.min.as_ref().map(node_of) {
            None => {
                self.min = Some((*node.as_ptr()).item.clone());
                self.num_trees = 1;
            }
            Some(head) => {
                node::splice(head, node);
                self.num_trees += 1;
                if key_of(node) < key_of(head) {
                    self.min = Some((*node.as_ptr()).item.clone());
                }
            }
        }
    }

    fn check_owned(&self, item: &Item<T>) -> Result<(), HeapError> {
        if !item.is_live() {
            return Err(HeapError::StaleHandle);
        }
        if !item.belongs_to(&self.membership) {
            warn!("rejected handle owned by another heap");
            return Err(HeapError::ForeignHandle);
        }
        Ok(())
    }
}

/// The node a live item currently sits at
pub(crate) fn node_of<T>(item: &Item<T>) -> NodePtr<T> {
    item.node().expect("live item without a node")
}

impl<T> Default for MeldableHeap<T> {
    fn default() -> Self {
        Self::with_policy(HeapPolicy::default())
    }
}

impl<T> Drop for MeldableHeap<T> {
    fn drop(&mut self) {
        let Some(min) = self.min.take() else {
            return;
        };
        let mut rings = vec![node_of(&min)];
        drop(min);

        // Free ring by ring; recursion would follow tree height
        while let Some(head) = rings.pop() {
            let mut current = head;
            // SAFETY: every node is reachable exactly once and freed once
            unsafe {
                loop {
                    let next = (*current.as_ptr()).next;
                    if let Some(child) = (*current.as_ptr()).child {
                        rings.push(child);
                    }
                    Node::free(current);
                    if next == head {
                        break;
                    }
                    current = next;
                }
            }
        }
    }
}

impl<T> fmt::Debug for MeldableHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeldableHeap")
            .field("variant", &self.variant())
            .field("len", &self.len)
            .field("min", &self.min.as_ref().map(Item::key))
            .field("num_trees", &self.num_trees)
            .field("marked", &self.marked)
            .field("counters", &self.counters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut heap = MeldableHeap::fibonacci();
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);

        heap.insert(5, "a").unwrap();
        heap.insert(3, "b").unwrap();
        heap.insert(7, "c").unwrap();

        assert_eq!(heap.len(), 3);
        assert_eq!(heap.find_min().map(|m| *m.payload()), Some("b"));

        let min = heap.delete_min().unwrap();
        assert_eq!((min.key(), *min.payload()), (3, "b"));
        assert!(!min.is_live());
        assert_eq!(heap.find_min().map(Item::key), Some(5));
    }

    #[test]
    fn test_lazy_insert_only_splices() {
        let mut heap = MeldableHeap::lazy_binomial();
        for key in 1..=8 {
            heap.insert(key, ()).unwrap();
        }
        assert_eq!(heap.num_trees(), 8);
        assert_eq!(heap.total_links(), 0);
        assert_eq!(heap.roots(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_eager_insert_keeps_binary_shape() {
        let mut heap = MeldableHeap::binomial();
        for key in 1..=7 {
            heap.insert(key, ()).unwrap();
        }
        // 7 = 0b111: one tree each of rank 0, 1 and 2
        assert_eq!(heap.num_trees(), 3);
        assert_eq!(heap.total_links(), 4);
    }

    #[test]
    fn test_consolidation_orders_roots_by_rank() {
        let mut heap = MeldableHeap::fibonacci();
        for key in [4, 9, 2, 7, 5, 1, 8, 3] {
            heap.insert(key, ()).unwrap();
        }
        heap.delete_min();
        // 7 items leave one tree each of rank 0, 1 and 2
        assert_eq!(heap.num_trees(), 3);
        assert_eq!(heap.find_min().map(Item::key), Some(2));
        assert_eq!(heap.len(), 7);
    }

    #[test]
    fn test_swap_up_moves_items_not_nodes() {
        let mut heap = MeldableHeap::binomial();
        let items: Vec<_> = (1..=4).map(|k| heap.insert(k * 10, k).unwrap()).collect();
        // a single rank-2 tree rooted at 10
        assert_eq!(heap.num_trees(), 1);
        let deepest = node_of(&items[3]);

        heap.decrease_key(&items[3], 39).unwrap();
        assert_eq!(items[3].key(), 1);
        assert_eq!(heap.find_min(), Some(&items[3]));
        // the item moved up two nodes; the node it left holds an old ancestor
        assert_ne!(node_of(&items[3]), deepest);
        assert_eq!(heap.total_heapify_cost(), 2);
        assert_eq!(heap.total_cuts(), 0);
    }

    #[test]
    fn test_meld_rejects_policy_mismatch() {
        let mut a = MeldableHeap::fibonacci();
        let mut b = MeldableHeap::binomial();
        b.insert(1, ()).unwrap();
        assert_eq!(
            a.meld(&mut b),
            Err(HeapError::PolicyMismatch {
                this: HeapPolicy::FIBONACCI,
                other: HeapPolicy::BINOMIAL,
            })
        );
        assert_eq!(b.len(), 1);
        assert!(a.is_empty());
    }

    #[test]
    fn test_drop_detaches_handles() {
        let mut heap = MeldableHeap::binomial_with_cuts();
        let items: Vec<_> = (1..=20).map(|k| heap.insert(k, k).unwrap()).collect();
        heap.delete_min();
        drop(heap);
        assert!(items.iter().all(|item| !item.is_live()));
    }
}
