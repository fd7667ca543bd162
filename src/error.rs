//! Error type for heap operations
//!
//! Every variant is a caller-contract violation. A call that returns an error
//! leaves the heap exactly as it was before the call.

use crate::policy::HeapPolicy;
use crate::Key;
use thiserror::Error;

/// Error type for heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    /// `insert` was called with a key that is not strictly positive
    #[error("inserted keys must be positive, got {0}")]
    NonPositiveKey(Key),

    /// `decrease_key` was called with a difference that is not strictly positive
    #[error("key decrease must be positive, got {0}")]
    NonPositiveDiff(Key),

    /// The decreased key would leave the supported key range
    #[error("decreasing key {key} by {diff} leaves the supported key range")]
    KeyUnderflow {
        /// Current key of the item
        key: Key,
        /// Requested decrease
        diff: Key,
    },

    /// The handle is no longer valid (element was removed)
    #[error("handle is no longer valid (element was removed)")]
    StaleHandle,

    /// The handle belongs to a different heap
    #[error("handle belongs to a different heap")]
    ForeignHandle,

    /// Two heaps with different policies cannot be melded
    #[error("cannot meld a {other} heap into a {this} heap")]
    PolicyMismatch {
        /// Policy of the receiving heap
        this: HeapPolicy,
        /// Policy of the heap being absorbed
        other: HeapPolicy,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            HeapError::NonPositiveKey(0).to_string(),
            "inserted keys must be positive, got 0"
        );
        assert_eq!(
            HeapError::KeyUnderflow { key: 3, diff: 9 }.to_string(),
            "decreasing key 3 by 9 leaves the supported key range"
        );
        let mismatch = HeapError::PolicyMismatch {
            this: HeapPolicy::FIBONACCI,
            other: HeapPolicy::BINOMIAL,
        };
        assert_eq!(
            mismatch.to_string(),
            "cannot meld a binomial heap into a fibonacci heap"
        );
    }
}
