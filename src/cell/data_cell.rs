//! DataCell - The one and only copy of an item's value

use serde::{Deserialize, Serialize};

use crate::mvcc::{TxId, Value};

/// The current value of an item together with who wrote it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCell {
    value: Value,
    last_writer: TxId,
    committed: bool,
}

impl DataCell {
    /// A committed cell owned by the seed transaction.
    pub fn seed(value: Value) -> Self {
        Self {
            value,
            last_writer: TxId::SEED,
            committed: true,
        }
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }

    #[inline]
    pub fn last_writer(&self) -> TxId {
        self.last_writer
    }

    /// True if the cell's current value was written by a committed transaction.
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Overwrites the cell in place with an uncommitted value.
    pub fn overwrite(&mut self, value: Value, writer: TxId) {
        self.value = value;
        self.last_writer = writer;
        self.committed = false;
    }

    /// Marks the cell committed if `tx` is still its owner.
    ///
    /// Returns true if the flag changed.
    pub fn commit(&mut self, tx: TxId) -> bool {
        if self.last_writer == tx && !self.committed {
            self.committed = true;
            true
        } else {
            false
        }
    }

    /// Puts back a value captured by an undo entry.
    ///
    /// `writer_committed` reflects the restored writer's status now, not at
    /// the time the entry was recorded.
    pub fn restore(&mut self, value: Value, writer: TxId, writer_committed: bool) {
        self.value = value;
        self.last_writer = writer;
        self.committed = writer_committed;
    }
}
