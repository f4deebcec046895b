//! ReadView - The committed set a visibility decision is made against
//!
//! Snapshot isolation builds one view per transaction at `Begin` and keeps
//! it for the transaction's whole life. Read committed builds a fresh view
//! from the global committed set at every read.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::TxId;

/// An immutable set of committed transaction ids, viewed by one transaction.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadView {
    committed: BTreeSet<TxId>,
}

impl ReadView {
    /// Captures a copy of the given committed set.
    pub fn capture(committed: &BTreeSet<TxId>) -> Self {
        Self {
            committed: committed.clone(),
        }
    }

    /// Returns true if `tx` is committed as far as this view is concerned.
    ///
    /// The seed transaction is always committed.
    #[inline]
    pub fn is_committed(&self, tx: TxId) -> bool {
        tx.is_seed() || self.committed.contains(&tx)
    }

    /// Returns the captured ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TxId> + '_ {
        self.committed.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_always_committed() {
        let view = ReadView::default();
        assert!(view.is_committed(TxId::SEED));
        assert!(!view.is_committed(TxId::new(1)));
    }

    #[test]
    fn test_capture_is_a_copy() {
        let mut set = BTreeSet::new();
        set.insert(TxId::new(1));
        let view = ReadView::capture(&set);

        set.insert(TxId::new(2));

        assert!(view.is_committed(TxId::new(1)));
        assert!(!view.is_committed(TxId::new(2)));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_ids_ascending() {
        let set: BTreeSet<_> = [TxId::new(3), TxId::new(1)].into_iter().collect();
        let view = ReadView::capture(&set);
        let ids: Vec<_> = view.ids().collect();
        assert_eq!(ids, vec![TxId::new(1), TxId::new(3)]);
    }
}
