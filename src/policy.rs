//! Heap policies and the strategies they select
//!
//! Two independent flags choose one of four classic heap variants:
//!
//! | variant              | lazy melds | lazy decrease-keys |
//! |----------------------|------------|--------------------|
//! | binomial             | no         | no                 |
//! | lazy binomial        | yes        | no                 |
//! | Fibonacci            | yes        | yes                |
//! | binomial with cuts   | no         | yes                |
//!
//! The flags are translated once, at construction, into a [`MeldStrategy`]
//! (when consolidation runs) and a [`DecreaseStrategy`] (how a decreased key
//! restores heap order).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// When successive linking runs after roots are added
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeldStrategy {
    /// Consolidate after every meld, insert and cut
    Eager,
    /// Only consolidate during `delete_min`
    Lazy,
}

/// How `decrease_key` restores heap order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecreaseStrategy {
    /// Swap the item upwards with its ancestors; ring topology never changes
    SwapUp,
    /// Cut the node to the root ring and cascade through marked ancestors
    CutCascade,
}

/// The pair of policy flags fixed at heap construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeapPolicy {
    /// Defer consolidation to `delete_min`
    pub lazy_melds: bool,
    /// Use cuts instead of swap-up for `decrease_key`
    pub lazy_decrease_keys: bool,
}

impl HeapPolicy {
    /// Eager melds, eager decrease-keys
    pub const BINOMIAL: HeapPolicy = HeapPolicy::new(false, false);
    /// Lazy melds, eager decrease-keys
    pub const LAZY_BINOMIAL: HeapPolicy = HeapPolicy::new(true, false);
    /// Lazy melds, lazy decrease-keys
    pub const FIBONACCI: HeapPolicy = HeapPolicy::new(true, true);
    /// Eager melds, lazy decrease-keys
    pub const BINOMIAL_WITH_CUTS: HeapPolicy = HeapPolicy::new(false, true);

    pub const fn new(lazy_melds: bool, lazy_decrease_keys: bool) -> Self {
        Self {
            lazy_melds,
            lazy_decrease_keys,
        }
    }

    pub fn meld_strategy(self) -> MeldStrategy {
        if self.lazy_melds {
            MeldStrategy::Lazy
        } else {
            MeldStrategy::Eager
        }
    }

    pub fn decrease_strategy(self) -> DecreaseStrategy {
        if self.lazy_decrease_keys {
            DecreaseStrategy::CutCascade
        } else {
            DecreaseStrategy::SwapUp
        }
    }

    /// The conventional name of the variant this policy selects
    pub fn variant(self) -> HeapVariant {
        match (self.lazy_melds, self.lazy_decrease_keys) {
            (false, false) => HeapVariant::Binomial,
            (true, false) => HeapVariant::LazyBinomial,
            (true, true) => HeapVariant::Fibonacci,
            (false, true) => HeapVariant::BinomialWithCuts,
        }
    }
}

impl Default for HeapPolicy {
    fn default() -> Self {
        HeapPolicy::FIBONACCI
    }
}

impl fmt::Display for HeapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.variant(), f)
    }
}

/// The four named heap variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeapVariant {
    Binomial,
    LazyBinomial,
    Fibonacci,
    BinomialWithCuts,
}

impl HeapVariant {
    /// All variants, in the order the experiment tables list them
    pub const ALL: [HeapVariant; 4] = [
        HeapVariant::Binomial,
        HeapVariant::LazyBinomial,
        HeapVariant::Fibonacci,
        HeapVariant::BinomialWithCuts,
    ];

    pub fn policy(self) -> HeapPolicy {
        match self {
            HeapVariant::Binomial => HeapPolicy::BINOMIAL,
            HeapVariant::LazyBinomial => HeapPolicy::LAZY_BINOMIAL,
            HeapVariant::Fibonacci => HeapPolicy::FIBONACCI,
            HeapVariant::BinomialWithCuts => HeapPolicy::BINOMIAL_WITH_CUTS,
        }
    }

    /// Upper-case table label, e.g. `LAZY_BINOMIAL`
    pub fn label(self) -> &'static str {
        match self {
            HeapVariant::Binomial => "BINOMIAL",
            HeapVariant::LazyBinomial => "LAZY_BINOMIAL",
            HeapVariant::Fibonacci => "FIBONACCI",
            HeapVariant::BinomialWithCuts => "BINOMIAL_WITH_CUTS",
        }
    }
}

impl fmt::Display for HeapVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeapVariant::Binomial => "binomial",
            HeapVariant::LazyBinomial => "lazy binomial",
            HeapVariant::Fibonacci => "fibonacci",
            HeapVariant::BinomialWithCuts => "binomial with cuts",
        })
    }
}

/// Error returned when a variant name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown heap variant `{0}`")]
pub struct ParseVariantError(String);

impl FromStr for HeapVariant {
    type Err = ParseVariantError;

    /// Accepts snake_case names (`lazy_binomial`), table labels
    /// (`LAZY_BINOMIAL`) and dashed names (`lazy-binomial`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        HeapVariant::ALL
            .into_iter()
            .find(|variant| variant.label().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseVariantError(s.to_string()))
    }
}

impl From<HeapVariant> for HeapPolicy {
    fn from(variant: HeapVariant) -> Self {
        variant.policy()
    }
}
