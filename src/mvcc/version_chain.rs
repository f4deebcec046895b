//! VersionChain - Version history for one data item
//!
//! Versions are kept in creation order. The chain itself makes no
//! visibility decisions; see `Visibility` for that.

use serde::{Deserialize, Serialize};

use super::{TxId, Version, VersionId};

/// The complete version history of a single named item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChain {
    item: String,
    versions: Vec<Version>,
}

impl VersionChain {
    /// Creates an empty chain for the given item.
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            versions: Vec::new(),
        }
    }

    /// Creates a chain holding only the seed version.
    pub fn seeded(seed: Version) -> Self {
        Self {
            item: seed.item().to_string(),
            versions: vec![seed],
        }
    }

    #[inline]
    pub fn item(&self) -> &str {
        &self.item
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Raw accessor, no visibility filtering.
    #[inline]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Appends a version.
    pub fn push(&mut self, version: Version) {
        self.versions.push(version);
    }

    pub fn get(&self, id: VersionId) -> Option<&Version> {
        self.versions.iter().find(|v| v.id() == id)
    }

    pub fn get_mut(&mut self, id: VersionId) -> Option<&mut Version> {
        self.versions.iter_mut().find(|v| v.id() == id)
    }

    /// Undoes everything `tx` did to this chain.
    ///
    /// Removes the versions `tx` created and clears `tx_max` markers that
    /// still point at `tx`. A marker that another transaction has since
    /// overwritten is left alone, it can no longer be restored.
    ///
    /// Returns `(versions_discarded, markers_cleared)`.
    pub fn rollback(&mut self, tx: TxId) -> (usize, usize) {
        let before = self.versions.len();
        self.versions.retain(|v| v.tx_min() != tx);
        let discarded = before - self.versions.len();

        let cleared = self
            .versions
            .iter_mut()
            .map(|v| v.revive(tx))
            .filter(|cleared| *cleared)
            .count();

        (discarded, cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_with_write(writer: u64) -> VersionChain {
        let mut chain = VersionChain::seeded(Version::seed(VersionId::new(0), "x", 10));
        chain.versions[0].invalidate(TxId::new(writer));
        chain.push(Version::new(VersionId::new(1), "x", 20, TxId::new(writer)));
        chain
    }

    #[test]
    fn test_seeded_chain() {
        let chain = VersionChain::seeded(Version::seed(VersionId::new(0), "x", 10));
        assert_eq!(chain.item(), "x");
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
    }

    #[test]
    fn test_get_by_id() {
        let chain = chain_with_write(1);
        assert_eq!(chain.get(VersionId::new(1)).map(|v| v.value()), Some(20));
        assert!(chain.get(VersionId::new(9)).is_none());
    }

    #[test]
    fn test_rollback_discards_versions_and_clears_markers() {
        let mut chain = chain_with_write(1);

        assert_eq!(chain.rollback(TxId::new(1)), (1, 1));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.versions()[0].tx_max(), None);
    }

    #[test]
    fn test_rollback_keeps_overwritten_marker() {
        let mut chain = chain_with_write(1);
        chain.versions[0].invalidate(TxId::new(2));

        assert_eq!(chain.rollback(TxId::new(1)), (1, 0));
        assert_eq!(chain.versions()[0].tx_max(), Some(TxId::new(2)));
    }

    #[test]
    fn test_rollback_of_uninvolved_tx_is_noop() {
        let mut chain = chain_with_write(1);
        let before = chain.clone();
        assert_eq!(chain.rollback(TxId::new(5)), (0, 0));
        assert_eq!(chain, before);
    }
}
