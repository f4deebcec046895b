//! Visibility Resolver - which value a read sees, which version a write supersedes
//!
//! Selected by matching on the isolation mode:
//! - Snapshot modes evaluate against the view captured at `Begin`
//! - Read committed evaluates against the global committed set at the
//!   instant of the call, so two reads by one transaction may differ
//! - No isolation reads the cell as it is, dirty or not

use std::borrow::Cow;
use std::collections::BTreeSet;

use super::{IsolationMode, TransactionRecord};
use crate::cell::DataCell;
use crate::mvcc::{ReadView, TxId, Value, Version, VersionChain, VersionId, Visibility};

/// Storage of one item, borrowed for resolution.
#[derive(Clone, Copy, Debug)]
pub enum ItemRef<'a> {
    Versions(&'a VersionChain),
    Cell(&'a DataCell),
}

/// What a read resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadResolution {
    pub value: Option<Value>,
    pub version: Option<VersionId>,
}

/// The view `tx` is evaluated against under `mode`.
pub fn read_view<'a>(
    mode: IsolationMode,
    tx: &'a TransactionRecord,
    committed: &BTreeSet<TxId>,
) -> Cow<'a, ReadView> {
    if mode.uses_begin_snapshot() {
        Cow::Borrowed(&tx.snapshot_committed_ids)
    } else {
        Cow::Owned(ReadView::capture(committed))
    }
}

/// Resolves a read of `item` by `tx`.
pub fn resolve_read(
    mode: IsolationMode,
    item: ItemRef<'_>,
    tx: &TransactionRecord,
    committed: &BTreeSet<TxId>,
) -> ReadResolution {
    match item {
        ItemRef::Cell(cell) => ReadResolution {
            value: Some(cell.value()),
            version: None,
        },
        ItemRef::Versions(chain) => {
            let view = read_view(mode, tx, committed);
            let visible = Visibility::visible_version(chain, tx.id, &view).version();
            ReadResolution {
                value: visible.map(Version::value),
                version: visible.map(Version::id),
            }
        }
    }
}

/// The version a write by `tx` to `item` should mark as superseded.
///
/// Cells have no versions, so this is always `None` for them.
pub fn resolve_write_base(
    mode: IsolationMode,
    item: ItemRef<'_>,
    tx: &TransactionRecord,
    committed: &BTreeSet<TxId>,
) -> Option<VersionId> {
    match item {
        ItemRef::Cell(_) => None,
        ItemRef::Versions(chain) => {
            let view = read_view(mode, tx, committed);
            Visibility::write_base(chain, tx.id, &view)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// seed(10) superseded by T1 which wrote 20 and then committed.
    fn chain() -> VersionChain {
        let mut chain = VersionChain::seeded(Version::seed(VersionId::new(0), "x", 10));
        chain
            .get_mut(VersionId::new(0))
            .unwrap()
            .invalidate(TxId::new(1));
        chain.push(Version::new(VersionId::new(1), "x", 20, TxId::new(1)));
        chain
    }

    fn committed(ids: &[u64]) -> BTreeSet<TxId> {
        ids.iter().map(|i| TxId::new(*i)).collect()
    }

    /// T2 began before T1 committed.
    fn reader() -> TransactionRecord {
        TransactionRecord::begin(TxId::new(2), "T2", 0, &committed(&[]))
    }

    #[test]
    fn test_snapshot_reads_as_of_begin() {
        let chain = chain();
        let read = resolve_read(
            IsolationMode::Snapshot,
            ItemRef::Versions(&chain),
            &reader(),
            &committed(&[1]),
        );
        assert_eq!(read.value, Some(10));
        assert_eq!(read.version, Some(VersionId::new(0)));
    }

    #[test]
    fn test_read_committed_reads_as_of_now() {
        let chain = chain();
        let read = resolve_read(
            IsolationMode::ReadCommitted,
            ItemRef::Versions(&chain),
            &reader(),
            &committed(&[1]),
        );
        assert_eq!(read.value, Some(20));
        assert_eq!(read.version, Some(VersionId::new(1)));
    }

    #[test]
    fn test_no_isolation_reads_dirty_cell() {
        let mut cell = DataCell::seed(10);
        cell.overwrite(80, TxId::new(1));
        let read = resolve_read(
            IsolationMode::NoIsolation,
            ItemRef::Cell(&cell),
            &reader(),
            &committed(&[]),
        );
        assert_eq!(read, ReadResolution { value: Some(80), version: None });
    }

    #[test]
    fn test_write_base_follows_view() {
        let chain = chain();
        let tx = reader();
        let now = committed(&[1]);
        assert_eq!(
            resolve_write_base(IsolationMode::Snapshot, ItemRef::Versions(&chain), &tx, &now),
            Some(VersionId::new(0))
        );
        assert_eq!(
            resolve_write_base(IsolationMode::ReadCommitted, ItemRef::Versions(&chain), &tx, &now),
            Some(VersionId::new(1))
        );
        assert_eq!(
            resolve_write_base(IsolationMode::NoIsolation, ItemRef::Cell(&DataCell::seed(1)), &tx, &now),
            None
        );
    }

    #[test]
    fn test_read_view_borrows_snapshot() {
        let tx = reader();
        assert!(matches!(
            read_view(IsolationMode::SnapshotStrict, &tx, &committed(&[1])),
            Cow::Borrowed(_)
        ));
        assert!(matches!(
            read_view(IsolationMode::ReadCommitted, &tx, &committed(&[1])),
            Cow::Owned(_)
        ));
    }
}
