//! Version - A value record in an item's history
//!
//! - Created only by a `Write` (or by seeding at step 0)
//! - `value`, `item`, `tx_min` never change after creation
//! - `tx_max` is the single mutable field: set when a writer supersedes the
//!   version, cleared when that writer aborts

use serde::{Deserialize, Serialize};

use super::{TxId, VersionId};

/// Scalar payload carried by every data item.
pub type Value = i64;

/// A single version of a named data item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    id: VersionId,
    item: String,
    value: Value,
    /// The transaction that created this version.
    tx_min: TxId,
    /// The transaction that superseded this version, if any.
    tx_max: Option<TxId>,
}

impl Version {
    /// Creates a fresh, not-yet-superseded version.
    pub fn new(id: VersionId, item: impl Into<String>, value: Value, tx_min: TxId) -> Self {
        Self {
            id,
            item: item.into(),
            value,
            tx_min,
            tx_max: None,
        }
    }

    /// Creates the seed version of an item, owned by the synthetic transaction.
    pub fn seed(id: VersionId, item: impl Into<String>, value: Value) -> Self {
        Self::new(id, item, value, TxId::SEED)
    }

    #[inline]
    pub fn id(&self) -> VersionId {
        self.id
    }

    #[inline]
    pub fn item(&self) -> &str {
        &self.item
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }

    #[inline]
    pub fn tx_min(&self) -> TxId {
        self.tx_min
    }

    #[inline]
    pub fn tx_max(&self) -> Option<TxId> {
        self.tx_max
    }

    /// Marks this version as superseded by `tx`, replacing any previous marker.
    ///
    /// Returns the marker that was overwritten, if one existed.
    pub fn invalidate(&mut self, tx: TxId) -> Option<TxId> {
        self.tx_max.replace(tx)
    }

    /// Clears the invalidation marker if (and only if) it still points at `tx`.
    ///
    /// Returns true if the marker was cleared.
    pub fn revive(&mut self, tx: TxId) -> bool {
        if self.tx_max == Some(tx) {
            self.tx_max = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_version_is_owned_by_seed_tx() {
        let v = Version::seed(VersionId::new(0), "x", 100);
        assert_eq!(v.tx_min(), TxId::SEED);
        assert_eq!(v.tx_max(), None);
        assert_eq!(v.item(), "x");
        assert_eq!(v.value(), 100);
    }

    #[test]
    fn test_invalidate_returns_previous_marker() {
        let mut v = Version::seed(VersionId::new(0), "x", 100);
        assert_eq!(v.invalidate(TxId::new(1)), None);
        assert_eq!(v.invalidate(TxId::new(2)), Some(TxId::new(1)));
        assert_eq!(v.tx_max(), Some(TxId::new(2)));
    }

    #[test]
    fn test_revive_only_clears_own_marker() {
        let mut v = Version::seed(VersionId::new(0), "x", 100);
        v.invalidate(TxId::new(1));
        v.invalidate(TxId::new(2));

        // T1's marker was overwritten by T2; T1 cannot restore anything.
        assert!(!v.revive(TxId::new(1)));
        assert_eq!(v.tx_max(), Some(TxId::new(2)));

        assert!(v.revive(TxId::new(2)));
        assert_eq!(v.tx_max(), None);
    }
}
