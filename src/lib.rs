//! Policy-driven meldable heaps
//!
//! This crate provides a single meldable min-heap, [`MeldableHeap`], whose
//! behavior is selected by two flags fixed at construction (see
//! [`HeapPolicy`]). The four combinations give four classic heaps:
//!
//! - **Binomial Heap**: eager melds, swap-up `decrease_key`
//! - **Lazy Binomial Heap**: lazy melds, swap-up `decrease_key`
//! - **Fibonacci Heap**: lazy melds, cut-based `decrease_key`
//! - **Binomial Heap with cuts**: eager melds, cut-based `decrease_key`
//!
//! Every heap counts the links, cuts and heapify swaps it performs
//! ([`CostCounters`]), and the [`experiments`] module compares the four
//! variants on three fixed workloads.
//!
//! # Example
//!
//! ```rust
//! use rust_meldable_heaps::{HeapPolicy, MeldableHeap};
//!
//! let mut heap = MeldableHeap::with_policy(HeapPolicy::FIBONACCI);
//! let a = heap.insert(10, 'a').unwrap();
//! heap.insert(3, 'b').unwrap();
//! let c = heap.insert(7, 'c').unwrap();
//!
//! assert_eq!(heap.delete_min().map(|min| min.key()), Some(3));
//! heap.decrease_key(&a, 9).unwrap();
//! assert_eq!(heap.find_min().map(|min| *min.payload()), Some('a'));
//!
//! heap.delete(&c).unwrap();
//! assert_eq!(heap.len(), 1);
//! heap.check_invariants().unwrap();
//! ```

pub mod counters;
pub mod error;
pub mod experiments;
pub mod heap;
pub mod inspect;
pub mod item;
mod node;
pub mod policy;
pub mod rank;
pub mod traits;

/// Keys are signed: inserted keys are positive, decreased keys may go down to
/// [`MIN_KEY`]
pub type Key = i64;

/// Smallest key an item may hold. One below it is reserved for `delete`.
pub const MIN_KEY: Key = Key::MIN + 1;

pub use counters::CostCounters;
pub use error::HeapError;
pub use heap::MeldableHeap;
pub use inspect::{HeapShape, InvariantViolation};
pub use item::Item;
pub use policy::{DecreaseStrategy, HeapPolicy, HeapVariant, MeldStrategy, ParseVariantError};
pub use traits::{CostAccounting, DecreaseKeyHeap, Handle, Heap};
