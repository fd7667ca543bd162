//! Rank type for node degrees.
//!
//! # Why u8?
//!
//! A node's rank is the number of children in its ring. Successive linking only
//! ever links trees of equal rank, so a tree whose root has rank `r` holds at
//! least `F(r+2)` nodes when cuts are allowed (Fibonacci bound) and exactly
//! `2^r` nodes when they are not. Either way the rank stays below 100 for any
//! heap that fits in memory, and `u8` keeps the node layout compact.

/// Type alias for node rank/degree.
pub type Rank = u8;

/// Increment a rank after a link.
///
/// # Panics
///
/// Panics if `rank == u8::MAX`, which no reachable heap shape produces.
#[inline]
pub fn checked_increment(rank: Rank) -> Rank {
    rank.checked_add(1)
        .expect("rank overflow: linking produced a tree with more than 255 children")
}

/// Decrement a rank after one of the children was cut away.
///
/// # Panics
///
/// Panics on a rank of zero: a node without children cannot lose one.
#[inline]
pub fn checked_decrement(rank: Rank) -> Rank {
    rank.checked_sub(1)
        .expect("rank underflow: cut a child from a node with rank 0")
}

/// Number of rank buckets successive linking needs for a heap of `len` items.
///
/// Sized as `2·⌊log2(len)⌋ + 10`, generous enough for ranks the swap-up
/// variants can reach as well as Fibonacci-bounded ones.
#[inline]
pub fn bucket_count(len: usize) -> usize {
    2 * len.max(1).ilog2() as usize + 10
}
