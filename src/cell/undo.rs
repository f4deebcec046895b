//! UndoLog - Before-images recorded by a writing transaction
//!
//! Only the first write of each item is recorded, so rolling back restores
//! the value the item had before the transaction touched it, no matter how
//! many times the transaction wrote it.

use serde::{Deserialize, Serialize};

use super::DataCell;
use crate::mvcc::{TxId, Value};

/// The before-image of one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub item: String,
    pub old_value: Value,
    pub old_writer: TxId,
}

/// Per-transaction undo log, in recording order.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `cell` as the before-image of `item` unless one already exists.
    ///
    /// Returns true if a new entry was pushed.
    pub fn record(&mut self, item: &str, cell: &DataCell) -> bool {
        if self.entries.iter().any(|e| e.item == item) {
            return false;
        }
        self.entries.push(UndoEntry {
            item: item.to_string(),
            old_value: cell.value(),
            old_writer: cell.last_writer(),
        });
        true
    }

    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    /// Entries in the order they must be replayed to roll back.
    pub fn rollback_order(&self) -> impl Iterator<Item = &UndoEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_wins_the_undo_record() {
        let mut log = UndoLog::new();
        let mut cell = DataCell::seed(50);

        assert!(log.record("x", &cell));
        cell.overwrite(60, TxId::new(1));
        assert!(!log.record("x", &cell));

        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].old_value, 50);
        assert_eq!(log.entries()[0].old_writer, TxId::SEED);
    }

    #[test]
    fn test_rollback_order_is_reversed() {
        let mut log = UndoLog::new();
        log.record("x", &DataCell::seed(1));
        log.record("y", &DataCell::seed(2));

        let items: Vec<_> = log.rollback_order().map(|e| e.item.as_str()).collect();
        assert_eq!(items, vec!["y", "x"]);
    }
}
