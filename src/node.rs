//! Tree nodes and circular ring primitives
//!
//! Nodes form heap-ordered multiway trees. The roots of the heap, and the
//! children of every node, are kept in circular doubly linked rings: a node
//! with no siblings points to itself. Splicing two rings, removing a node and
//! appending a child are all O(1).
//!
//! # Safety
//!
//! Every function taking a [`NodePtr`] is `unsafe`: the caller guarantees that
//! the pointer came from [`Node::alloc`], has not been freed, and that no other
//! reference into the node is alive for the duration of the call.

use crate::item::Item;
use crate::rank::{self, Rank};
use std::ptr::NonNull;

pub(crate) type NodePtr<T> = NonNull<Node<T>>;

pub(crate) struct Node<T> {
    /// The item currently living at this node
    pub(crate) item: Item<T>,
    pub(crate) parent: Option<NodePtr<T>>,
    /// Any one member of the children ring
    pub(crate) child: Option<NodePtr<T>>,
    pub(crate) next: NodePtr<T>,
    pub(crate) prev: NodePtr<T>,
    pub(crate) rank: Rank,
    /// Lost a child since it last became a child itself
    pub(crate) mark: bool,
}

impl<T> Node<T> {
    /// Allocates a singleton ring holding `item` and points the item at it
    pub(crate) fn alloc(item: Item<T>) -> NodePtr<T> {
        let node = Box::into_raw(Box::new(Node {
            item,
            parent: None,
            child: None,
            rank: 0,
            mark: false,
            next: NonNull::dangling(), // Will be set immediately
            prev: NonNull::dangling(), // Will be set immediately
        }));
        // SAFETY: Box::into_raw never returns null
        let ptr = unsafe { NonNull::new_unchecked(node) };
        unsafe {
            (*node).next = ptr;
            (*node).prev = ptr;
            (*node).item.set_node(Some(ptr));
        }
        ptr
    }

    /// Frees a node that is no longer reachable, detaching its item.
    ///
    /// Returns the item so the caller decides whether the handle lives on.
    pub(crate) unsafe fn free(ptr: NodePtr<T>) -> Item<T> {
        let node = *Box::from_raw(ptr.as_ptr());
        node.item.set_node(None);
        node.item
    }
}

#[inline]
pub(crate) unsafe fn key_of<T>(node: NodePtr<T>) -> crate::Key {
    (*node.as_ptr()).item.key()
}

/// Isolates `node` into a singleton ring
#[inline]
pub(crate) unsafe fn make_singleton<T>(node: NodePtr<T>) {
    (*node.as_ptr()).next = node;
    (*node.as_ptr()).prev = node;
}

/// Concatenates the ring containing `b` onto the ring containing `a`.
///
/// `b`'s ring is placed in front of `a`, i.e. after `a`'s current tail. With a
/// singleton `b` this appends `b` to the end of `a`'s ring.
pub(crate) unsafe fn splice<T>(a: NodePtr<T>, b: NodePtr<T>) {
    let a_tail = (*a.as_ptr()).prev;
    let b_tail = (*b.as_ptr()).prev;

    (*a_tail.as_ptr()).next = b;
    (*b.as_ptr()).prev = a_tail;
    (*b_tail.as_ptr()).next = a;
    (*a.as_ptr()).prev = b_tail;
}

/// Removes `node` from its ring and leaves it as a singleton.
///
/// Returns a remaining member of the old ring, or `None` if `node` was alone.
pub(crate) unsafe fn unlink<T>(node: NodePtr<T>) -> Option<NodePtr<T>> {
    let next = (*node.as_ptr()).next;
    if next == node {
        return None;
    }
    let prev = (*node.as_ptr()).prev;
    (*prev.as_ptr()).next = next;
    (*next.as_ptr()).prev = prev;
    make_singleton(node);
    Some(next)
}

/// Members of the ring containing `start`, beginning with `start`
pub(crate) unsafe fn ring_members<T>(start: NodePtr<T>) -> Vec<NodePtr<T>> {
    let mut members = Vec::new();
    let mut current = start;
    loop {
        members.push(current);
        current = (*current.as_ptr()).next;
        if current == start {
            break;
        }
    }
    members
}

/// Makes the singleton root `y` the last child of `x`.
///
/// The caller establishes `key(x) <= key(y)` beforehand; this function does not
/// reorder anything to enforce it.
pub(crate) unsafe fn link_as_child<T>(y: NodePtr<T>, x: NodePtr<T>) {
    debug_assert!((*y.as_ptr()).next == y, "only a singleton ring can be linked");
    debug_assert!(key_of(x) <= key_of(y), "link would break heap order");

    (*y.as_ptr()).parent = Some(x);
    match (*x.as_ptr()).child {
        Some(first) => splice(first, y),
        None => (*x.as_ptr()).child = Some(y),
    }
    (*x.as_ptr()).rank = rank::checked_increment((*x.as_ptr()).rank);
    (*y.as_ptr()).mark = false;
}

/// Removes `node` from its parent's children ring.
///
/// Returns the former parent, or `None` (doing nothing) if `node` is a root.
/// The node's mark is left for the caller to settle.
pub(crate) unsafe fn cut_from_parent<T>(node: NodePtr<T>) -> Option<NodePtr<T>> {
    let parent = (*node.as_ptr()).parent?;
    let sibling = unlink(node);
    if (*parent.as_ptr()).child == Some(node) {
        (*parent.as_ptr()).child = sibling;
    }
    (*parent.as_ptr()).rank = rank::checked_decrement((*parent.as_ptr()).rank);
    (*node.as_ptr()).parent = None;
    Some(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Membership;

    fn node(key: crate::Key) -> NodePtr<()> {
        Node::alloc(Item::new(key, (), &Membership::new()))
    }

    unsafe fn keys(start: NodePtr<()>) -> Vec<crate::Key> {
        ring_members(start).into_iter().map(|n| key_of(n)).collect()
    }

    unsafe fn assert_ring(start: NodePtr<()>) {
        for n in ring_members(start) {
            assert!((*(*n.as_ptr()).next.as_ptr()).prev == n);
            assert!((*(*n.as_ptr()).prev.as_ptr()).next == n);
        }
    }

    #[test]
    fn test_splice_and_unlink() {
        unsafe {
            let a = node(1);
            let b = node(2);
            let c = node(3);
            let d = node(4);
            splice(a, b);
            splice(c, d);
            splice(a, c);
            assert_eq!(keys(a), vec![1, 2, 3, 4]);
            assert_ring(a);

            assert_eq!(unlink(b), Some(c));
            assert_eq!(keys(a), vec![1, 3, 4]);
            assert_eq!(keys(b), vec![2]);
            assert_ring(a);

            for n in [a, b, c, d] {
                let item = Node::free(n);
                assert!(!item.is_live());
            }
        }
    }

    #[test]
    fn test_unlink_singleton() {
        unsafe {
            let a = node(1);
            assert_eq!(unlink(a), None);
            assert_eq!(keys(a), vec![1]);
            Node::free(a);
        }
    }

    #[test]
    fn test_link_and_cut() {
        unsafe {
            let root = node(1);
            let kids: Vec<_> = (2..5).map(node).collect();
            for &k in &kids {
                link_as_child(k, root);
            }
            assert_eq!((*root.as_ptr()).rank, 3);
            let first = (*root.as_ptr()).child.unwrap();
            assert_eq!(keys(first), vec![2, 3, 4]);
            assert_ring(first);

            // cutting the child the parent points at moves the pointer along
            assert_eq!(cut_from_parent(kids[0]), Some(root));
            assert_eq!((*root.as_ptr()).rank, 2);
            assert_eq!((*root.as_ptr()).child, Some(kids[1]));
            assert!((*kids[0].as_ptr()).parent.is_none());
            assert_eq!(keys(kids[0]), vec![2]);

            // roots have nothing to be cut from
            assert_eq!(cut_from_parent(root), None);

            cut_from_parent(kids[1]);
            cut_from_parent(kids[2]);
            assert_eq!((*root.as_ptr()).child, None);
            assert_eq!((*root.as_ptr()).rank, 0);

            Node::free(root);
            for k in kids {
                Node::free(k);
            }
        }
    }
}
