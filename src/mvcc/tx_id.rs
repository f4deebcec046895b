//! TxId / VersionId - Replay-assigned identities
//!
//! - Transaction ids are handed out in `Begin`-replay order, starting at 1
//! - Id 0 is reserved for the synthetic seed transaction, always committed
//! - Version ids are handed out in `Write`-replay order and never reused
//!   within one replay, even when the creating transaction aborts

use std::fmt;

use serde::{Deserialize, Serialize};

/// A transaction identity, totally ordered by replay order of `Begin`.
///
/// There is no `Default` so that an id is never conjured by accident.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(u64);

impl TxId {
    /// The synthetic transaction that owns every seed version.
    pub const SEED: TxId = TxId(0);

    /// Creates a TxId with the given value.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns true for the synthetic seed transaction.
    #[inline]
    pub fn is_seed(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T#{}", self.0)
    }
}

/// Identity of a single version record.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u64);

impl VersionId {
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
