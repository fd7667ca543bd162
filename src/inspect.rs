//! Structural validation
//!
//! [`MeldableHeap::check_invariants`] walks every ring of the heap and checks
//! the structural invariants the operations rely on. Tests call it after every
//! operation; it is O(n) and never mutates the heap's structure.

use crate::heap::MeldableHeap;
use crate::node::{key_of, NodePtr};
use crate::rank::Rank;
use crate::Key;
use serde::Serialize;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Summary of a heap's forest, as seen by [`MeldableHeap::check_invariants`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeapShape {
    pub nodes: usize,
    pub roots: usize,
    pub marked: usize,
    pub max_rank: Rank,
    /// Number of nodes on the longest root-to-leaf path
    pub height: usize,
    /// Ranks of the roots in ring order, starting at the minimum
    pub root_ranks: Vec<Rank>,
}

/// A broken structural invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("empty heap reports len {len}, {trees} trees and {marked} marked nodes")]
    EmptyWithCounts {
        len: usize,
        trees: usize,
        marked: usize,
    },
    #[error("minimum item (key {key}) is not attached to a node")]
    DetachedMin { key: Key },
    #[error("minimum item (key {key}) is not a root")]
    MinNotRoot { key: Key },
    #[error("minimum has key {min} but a root has key {root}")]
    MinNotMinimal { min: Key, root: Key },
    #[error("ring around key {key} is not doubly linked")]
    BrokenRing { key: Key },
    #[error("node with key {key} is reachable twice")]
    DuplicateNode { key: Key },
    #[error("item with key {key} does not point back at its node")]
    BackReference { key: Key },
    #[error("item with key {key} belongs to another heap")]
    ForeignItem { key: Key },
    #[error("root with key {key} has a parent")]
    RootHasParent { key: Key },
    #[error("root with key {key} is marked")]
    MarkedRoot { key: Key },
    #[error("child with key {child} does not point at its parent (key {parent})")]
    WrongParent { parent: Key, child: Key },
    #[error("child key {child} is smaller than parent key {parent}")]
    HeapOrder { parent: Key, child: Key },
    #[error("node with key {key} has rank {rank} but {children} children")]
    RankMismatch {
        key: Key,
        rank: Rank,
        children: usize,
    },
    #[error("heap reports {reported} {what} but holds {actual}")]
    CountMismatch {
        what: &'static str,
        reported: usize,
        actual: usize,
    },
}

impl<T> MeldableHeap<T> {
    /// Walks the whole forest and checks every structural invariant
    ///
    /// Checks ring double linkage, parent pointers, heap order, ranks, marks,
    /// item back-references and ownership, that no node is reachable twice,
    /// that `len`, `num_trees` and `num_marked_nodes` match the forest, and
    /// that the minimum is a root holding the smallest key.
    pub fn check_invariants(&self) -> Result<HeapShape, InvariantViolation> {
        let Some(min) = &self.min else {
            if self.len != 0 || self.num_trees != 0 || self.marked != 0 {
                return Err(InvariantViolation::EmptyWithCounts {
                    len: self.len,
                    trees: self.num_trees,
                    marked: self.marked,
                });
            }
            return Ok(HeapShape::default());
        };
        let min_key = min.key();
        let min_node = min
            .node()
            .ok_or(InvariantViolation::DetachedMin { key: min_key })?;

        let mut shape = HeapShape::default();
        let mut seen = FxHashSet::default();
        let mut stack: Vec<(NodePtr<T>, usize)> = Vec::new();

        // SAFETY: read-only walk over nodes owned by this heap
        unsafe {
            if (*min_node.as_ptr()).parent.is_some() {
                return Err(InvariantViolation::MinNotRoot { key: min_key });
            }
            let roots = self.checked_ring(min_node)?;
            for &root in &roots {
                let node = &*root.as_ptr();
                let key = key_of(root);
                if node.parent.is_some() {
                    return Err(InvariantViolation::RootHasParent { key });
                }
                if node.mark {
                    return Err(InvariantViolation::MarkedRoot { key });
                }
                if key < min_key {
                    return Err(InvariantViolation::MinNotMinimal {
                        min: min_key,
                        root: key,
                    });
                }
                shape.root_ranks.push(node.rank);
                stack.push((root, 1));
            }
            shape.roots = roots.len();

            while let Some((ptr, depth)) = stack.pop() {
                let node = &*ptr.as_ptr();
                let key = node.item.key();
                if !seen.insert(ptr) {
                    return Err(InvariantViolation::DuplicateNode { key });
                }
                if node.item.node() != Some(ptr) {
                    return Err(InvariantViolation::BackReference { key });
                }
                if !node.item.belongs_to(&self.membership) {
                    return Err(InvariantViolation::ForeignItem { key });
                }

                shape.nodes += 1;
                shape.marked += usize::from(node.mark);
                shape.max_rank = shape.max_rank.max(node.rank);
                shape.height = shape.height.max(depth);

                let children = match node.child {
                    Some(first) => self.checked_ring(first)?,
                    None => Vec::new(),
                };
                if children.len() != usize::from(node.rank) {
                    return Err(InvariantViolation::RankMismatch {
                        key,
                        rank: node.rank,
                        children: children.len(),
                    });
                }
                for child in children {
                    let child_key = key_of(child);
                    if (*child.as_ptr()).parent != Some(ptr) {
                        return Err(InvariantViolation::WrongParent {
                            parent: key,
                            child: child_key,
                        });
                    }
                    if child_key < key {
                        return Err(InvariantViolation::HeapOrder {
                            parent: key,
                            child: child_key,
                        });
                    }
                    stack.push((child, depth + 1));
                }
            }
        }

        for (what, reported, actual) in [
            ("items", self.len, shape.nodes),
            ("trees", self.num_trees, shape.roots),
            ("marked nodes", self.marked, shape.marked),
        ] {
            if reported != actual {
                return Err(InvariantViolation::CountMismatch {
                    what,
                    reported,
                    actual,
                });
            }
        }
        Ok(shape)
    }

    /// Members of the ring containing `start`, verifying the back links and
    /// giving up once the ring is longer than the heap
    unsafe fn checked_ring(&self, start: NodePtr<T>) -> Result<Vec<NodePtr<T>>, InvariantViolation> {
        let mut members = Vec::new();
        let mut current = start;
        loop {
            let next = (*current.as_ptr()).next;
            if (*next.as_ptr()).prev != current || members.len() > self.len {
                return Err(InvariantViolation::BrokenRing {
                    key: key_of(current),
                });
            }
            members.push(current);
            current = next;
            if current == start {
                return Ok(members);
            }
        }
    }
}
