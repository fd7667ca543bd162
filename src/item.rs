//! Stable item handles
//!
//! An [`Item`] is what the caller holds on to. It owns the key and payload and
//! points at whichever node currently represents it. Restructuring (links,
//! cuts, swap-up exchanges) moves items between nodes and updates that
//! back-reference, so handles stay valid across every operation until the item
//! is removed, at which point the back-reference is cleared.
//!
//! Each item also records which heap it belongs to. Melds forward the absorbed
//! heap's membership token to the receiver, so ownership checks stay O(1)
//! amortized without touching every moved item.

use crate::node::NodePtr;
use crate::Key;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Identity token of a heap.
///
/// When heap B is melded into heap A, B's token is forwarded to A's and B
/// receives a fresh one; items inserted into B resolve to A from then on.
#[derive(Default)]
pub(crate) struct Membership {
    absorbed_into: RefCell<Option<Rc<Membership>>>,
}

impl Membership {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Record that every item of `self` now belongs to `receiver`
    pub(crate) fn forward_to(&self, receiver: &Rc<Membership>) {
        let previous = self.absorbed_into.replace(Some(Rc::clone(receiver)));
        debug_assert!(previous.is_none(), "membership forwarded twice");
    }

    /// Follow forwarding links to the token of the heap that owns items today
    fn resolve(start: &Rc<Membership>) -> Rc<Membership> {
        let mut current = Rc::clone(start);
        loop {
            let next = current.absorbed_into.borrow().clone();
            match next {
                Some(next) => current = next,
                None => return current,
            }
        }
    }
}

impl Drop for Membership {
    // Unwind forwarding chains iteratively; long meld histories would
    // otherwise recurse once per link.
    fn drop(&mut self) {
        let mut next = self.absorbed_into.get_mut().take();
        while let Some(rc) = next {
            match Rc::try_unwrap(rc) {
                Ok(mut token) => next = token.absorbed_into.get_mut().take(),
                Err(_) => break,
            }
        }
    }
}

pub(crate) struct ItemCell<T> {
    key: Cell<Key>,
    payload: T,
    node: Cell<Option<NodePtr<T>>>,
    owner: RefCell<Rc<Membership>>,
}

/// Handle to an element in a [`MeldableHeap`](crate::MeldableHeap)
///
/// Handles compare equal only to clones of themselves. A handle outlives its
/// element: once the element is removed (or its heap dropped),
/// [`is_live`](Item::is_live) turns false and heap operations on it report
/// [`HeapError::StaleHandle`](crate::HeapError::StaleHandle).
pub struct Item<T>(Rc<ItemCell<T>>);

impl<T> Item<T> {
    pub(crate) fn new(key: Key, payload: T, owner: &Rc<Membership>) -> Self {
        Item(Rc::new(ItemCell {
            key: Cell::new(key),
            payload,
            node: Cell::new(None),
            owner: RefCell::new(Rc::clone(owner)),
        }))
    }

    /// Current key of the element
    pub fn key(&self) -> Key {
        self.0.key.get()
    }

    /// Data associated with the element
    pub fn payload(&self) -> &T {
        &self.0.payload
    }

    /// Whether the element is still stored in a heap
    pub fn is_live(&self) -> bool {
        self.0.node.get().is_some()
    }

    /// Whether both handles refer to the same element
    pub fn ptr_eq(&self, other: &Item<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn set_key(&self, key: Key) {
        self.0.key.set(key);
    }

    pub(crate) fn node(&self) -> Option<NodePtr<T>> {
        self.0.node.get()
    }

    pub(crate) fn set_node(&self, node: Option<NodePtr<T>>) {
        self.0.node.set(node);
    }

    /// Whether the element belongs to the heap identified by `heap`.
    ///
    /// Compresses the item's forwarding path as a side effect.
    pub(crate) fn belongs_to(&self, heap: &Rc<Membership>) -> bool {
        let resolved = Membership::resolve(&self.0.owner.borrow());
        let owned = Rc::ptr_eq(&resolved, heap);
        *self.0.owner.borrow_mut() = resolved;
        owned
    }
}

impl<T> Clone for Item<T> {
    fn clone(&self) -> Self {
        Item(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for Item<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for Item<T> {}

impl<T> Hash for Item<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Item<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("key", &self.key())
            .field("payload", self.payload())
            .field("live", &self.is_live())
            .finish()
    }
}
