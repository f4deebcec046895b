//! Operation log - the engine's only input
//!
//! Per-transaction operation lists are merged into one global sequence
//! ordered by ascending time. Ties keep declaration order (transaction
//! order first, then operation order), so the merge is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::TransactionDefinition;
use crate::mvcc::Value;

/// The kind of a replayed operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Begin,
    Read,
    Write,
    Commit,
    Abort,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Begin => "begin",
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Commit => "commit",
            OperationKind::Abort => "abort",
        }
    }

    /// True for operations that name a data item.
    pub fn needs_target(&self) -> bool {
        matches!(self, OperationKind::Read | OperationKind::Write)
    }

    /// True for operations that end a transaction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationKind::Commit | OperationKind::Abort)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the merged log. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub time: u64,
    pub kind: OperationKind,
    pub tx_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Operation {
    pub fn new(time: u64, kind: OperationKind, tx_name: impl Into<String>) -> Self {
        Self {
            time,
            kind,
            tx_name: tx_name.into(),
            target: None,
            value: None,
            note: None,
        }
    }

    pub fn begin(time: u64, tx: &str) -> Self {
        Self::new(time, OperationKind::Begin, tx)
    }

    pub fn read(time: u64, tx: &str, item: &str) -> Self {
        Self::new(time, OperationKind::Read, tx).with_target(item)
    }

    pub fn write(time: u64, tx: &str, item: &str, value: Value) -> Self {
        let mut op = Self::new(time, OperationKind::Write, tx).with_target(item);
        op.value = Some(value);
        op
    }

    pub fn commit(time: u64, tx: &str) -> Self {
        Self::new(time, OperationKind::Commit, tx)
    }

    pub fn abort(time: u64, tx: &str) -> Self {
        Self::new(time, OperationKind::Abort, tx)
    }

    pub fn with_target(mut self, item: &str) -> Self {
        self.target = Some(item.to_string());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} {}.{}", self.time, self.tx_name, self.kind)?;
        match (&self.target, self.value) {
            (Some(item), Some(value)) => write!(f, "({}, {})", item, value),
            (Some(item), None) => write!(f, "({})", item),
            _ => Ok(()),
        }
    }
}

/// Seed values plus the merged, time-ordered operations.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationLog {
    items: BTreeMap<String, Value>,
    operations: Vec<Operation>,
}

impl OperationLog {
    /// Builds a log from operations that are already in replay order.
    pub fn new(items: BTreeMap<String, Value>, operations: Vec<Operation>) -> Self {
        Self { items, operations }
    }

    /// Merges per-transaction definitions into one time-ordered log.
    ///
    /// No validation happens here; see `Scenario::from_definition`.
    pub fn merge(items: BTreeMap<String, Value>, transactions: &[TransactionDefinition]) -> Self {
        let mut operations: Vec<Operation> = transactions
            .iter()
            .flat_map(|tx| {
                tx.operations.iter().map(move |op| Operation {
                    time: op.time,
                    kind: op.kind,
                    tx_name: tx.name.clone(),
                    target: op.target.clone(),
                    value: op.value,
                    note: op.comment.clone(),
                })
            })
            .collect();

        // Stable: equal times keep declaration order.
        operations.sort_by_key(|op| op.time);

        Self { items, operations }
    }

    /// Seed value of every item, owned by the synthetic transaction 0.
    pub fn items(&self) -> &BTreeMap<String, Value> {
        &self.items
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations, which is also the last valid step.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The operation applied when moving from `step - 1` to `step`.
    pub fn operation_for_step(&self, step: usize) -> Option<&Operation> {
        step.checked_sub(1).and_then(|i| self.operations.get(i))
    }
}
