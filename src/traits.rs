//! Common traits for meldable heaps
//!
//! This module provides a two-tier trait hierarchy plus cost accounting:
//!
//! - [`Heap`]: insert, inspect and remove the minimum, meld
//! - [`DecreaseKeyHeap`]: handle-based `decrease_key` and `delete`
//! - [`CostAccounting`]: lifetime link/cut/heapify counters and per-operation
//!   cost measurement
//!
//! Generic code (the experiment driver, the test suites) is written against
//! these traits rather than against [`MeldableHeap`] directly.

use crate::counters::CostCounters;
use crate::error::HeapError;
use crate::heap::MeldableHeap;
use crate::item::Item;
use crate::Key;

/// A handle to an element in the heap, used for decrease_key operations
///
/// Handles compare by identity and keep reporting the element's current key
/// for as long as the caller holds them.
pub trait Handle: Clone + PartialEq + Eq {
    /// Current key of the element
    fn key(&self) -> Key;

    /// Whether the element is still stored in a heap
    fn is_live(&self) -> bool;
}

/// Base trait for meldable min-heaps keyed by [`Key`]
///
/// # Example
///
/// ```rust
/// use rust_meldable_heaps::{Heap, MeldableHeap};
///
/// let mut heap = MeldableHeap::lazy_binomial();
/// heap.push(3, "three").unwrap();
/// heap.push(1, "one").unwrap();
///
/// assert_eq!(heap.peek().map(|min| min.key()), Some(1));
/// let popped = heap.pop().unwrap();
/// assert_eq!(*popped.payload(), "one");
/// assert!(!popped.is_live());
/// ```
pub trait Heap<T> {
    /// The handle type returned by `push`
    type Handle: Handle;

    /// Returns true if the heap is empty
    fn is_empty(&self) -> bool;

    /// Returns the number of elements in the heap
    fn len(&self) -> usize;

    /// Inserts an element with the given key, returning its handle
    ///
    /// # Errors
    /// Returns [`HeapError::NonPositiveKey`] if `key <= 0`.
    fn push(&mut self, key: Key, item: T) -> Result<Self::Handle, HeapError>;

    /// Returns the handle of the minimum element without removing it
    ///
    /// # Time Complexity
    /// O(1)
    fn peek(&self) -> Option<&Self::Handle>;

    /// Removes the minimum element and returns its (now stale) handle
    fn pop(&mut self) -> Option<Self::Handle>;

    /// Moves every element of `other` into this heap, leaving `other` empty
    ///
    /// # Time Complexity
    /// O(1) for lazy-meld heaps, O(log n) for eager ones.
    fn merge(&mut self, other: &mut Self) -> Result<(), HeapError>;
}

/// Extended heap trait with `decrease_key` and `delete`
pub trait DecreaseKeyHeap<T>: Heap<T> {
    /// Decreases the key of the element identified by `handle` by `diff`
    ///
    /// # Errors
    /// Returns an error if the handle is stale or foreign, if `diff <= 0`, or
    /// if the new key leaves the supported key range.
    fn decrease_key(&mut self, handle: &Self::Handle, diff: Key) -> Result<(), HeapError>;

    /// Removes the element identified by `handle`
    fn delete(&mut self, handle: &Self::Handle) -> Result<(), HeapError>;
}

/// Access to the lifetime cost counters of a heap
pub trait CostAccounting {
    fn counters(&self) -> CostCounters;

    /// Runs `op` and returns its result together with the links, cuts and
    /// heapify swaps it caused.
    ///
    /// Around a `meld` this includes the absorbed heap's lifetime counters,
    /// which the receiver takes over.
    fn measure<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> (R, u64)
    where
        Self: Sized,
    {
        let before = self.counters();
        let result = op(self);
        (result, self.counters().cost_since(&before))
    }
}

impl<T> Handle for Item<T> {
    fn key(&self) -> Key {
        Item::key(self)
    }

    fn is_live(&self) -> bool {
        Item::is_live(self)
    }
}

impl<T> Heap<T> for MeldableHeap<T> {
    type Handle = Item<T>;

    fn is_empty(&self) -> bool {
        MeldableHeap::is_empty(self)
    }

    fn len(&self) -> usize {
        MeldableHeap::len(self)
    }

    fn push(&mut self, key: Key, item: T) -> Result<Item<T>, HeapError> {
        self.insert(key, item)
    }

    fn peek(&self) -> Option<&Item<T>> {
        self.find_min()
    }

    fn pop(&mut self) -> Option<Item<T>> {
        self.delete_min()
    }

    fn merge(&mut self, other: &mut Self) -> Result<(), HeapError> {
        self.meld(other)
    }
}

impl<T> DecreaseKeyHeap<T> for MeldableHeap<T> {
    fn decrease_key(&mut self, handle: &Item<T>, diff: Key) -> Result<(), HeapError> {
        MeldableHeap::decrease_key(self, handle, diff)
    }

    fn delete(&mut self, handle: &Item<T>) -> Result<(), HeapError> {
        MeldableHeap::delete(self, handle)
    }
}

impl<T> CostAccounting for MeldableHeap<T> {
    fn counters(&self) -> CostCounters {
        MeldableHeap::counters(self)
    }
}
