//! SimulationState - Everything the replay knows at one step
//!
//! A state is built fresh from step 0 for every request and is never
//! patched incrementally. Maps are ordered so that two replays of the same
//! prefix compare (and serialize) identically.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::IsolationMode;
use crate::cell::{DataCell, UndoLog};
use crate::mvcc::{ReadView, TxId, Value, Version, VersionChain, VersionId, Visibility};
use crate::scenario::Operation;

/// Lifecycle of a replayed transaction. Terminal states never change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Active,
    Committed,
    Aborted,
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Active)
    }
}

/// One observed read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRecord {
    pub item: String,
    pub value_observed: Option<Value>,
    pub version_id_observed: Option<VersionId>,
    pub time: u64,
}

/// One accepted write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRecord {
    pub item: String,
    pub time: u64,
    pub new_value: Value,
    /// Value the write replaced (the base version's, or the cell's).
    pub old_value: Option<Value>,
    pub old_version_id: Option<VersionId>,
    pub new_version_id: Option<VersionId>,
    /// Another transaction's invalidation marker this write replaced.
    pub overwrote_marker: Option<TxId>,
}

/// Runtime record of a transaction, created by its `Begin`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TxId,
    pub name: String,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub status: TxStatus,
    /// Committed set at `Begin`; consulted only by snapshot modes.
    pub snapshot_committed_ids: ReadView,
    pub reads: Vec<ReadRecord>,
    pub writes: Vec<WriteRecord>,
    /// Before-images; filled only in the no-isolation mode.
    pub undo_log: UndoLog,
}

impl TransactionRecord {
    pub(crate) fn begin(id: TxId, name: &str, time: u64, committed: &BTreeSet<TxId>) -> Self {
        Self {
            id,
            name: name.to_string(),
            start_time: time,
            end_time: None,
            status: TxStatus::Active,
            snapshot_committed_ids: ReadView::capture(committed),
            reads: Vec::new(),
            writes: Vec::new(),
            undo_log: UndoLog::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TxStatus::Active
    }

    /// Values this transaction observed for `item`, in read order.
    pub fn observed(&self, item: &str) -> Vec<Option<Value>> {
        self.reads
            .iter()
            .filter(|r| r.item == item)
            .map(|r| r.value_observed)
            .collect()
    }
}

/// Per-item storage: version chains or single cells, chosen by mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum ItemStore {
    Versioned(BTreeMap<String, VersionChain>),
    Cells(BTreeMap<String, DataCell>),
}

/// Why a replayed operation had no effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IgnoreReason {
    /// No `Begin` for this transaction in the replayed prefix
    TransactionNotBegun,
    /// The transaction already committed or aborted
    TransactionNotActive { status: TxStatus },
    /// `Begin` for a transaction that already exists
    DuplicateBegin,
    /// Read or write without a target item
    MissingTarget,
    /// Write without a value
    MissingValue,
    /// Target item has no seed entry
    UnknownItem { item: String },
}

/// What happened when an operation was replayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum OperationOutcome {
    Applied,
    Ignored { reason: IgnoreReason },
    /// Strict snapshot mode refused a write whose base was already superseded
    Rejected {
        #[serde(rename = "conflictWith")]
        conflict_with: TxId,
    },
}

impl OperationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, OperationOutcome::Applied)
    }
}

/// An operation together with its replay outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedOperation {
    /// Position in the log (0-based); the step after it is `index + 1`.
    pub index: usize,
    pub operation: Operation,
    pub outcome: OperationOutcome,
}

/// The aggregate state after replaying a log prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub(crate) mode: IsolationMode,
    pub(crate) step: usize,
    pub(crate) store: ItemStore,
    pub(crate) transactions: BTreeMap<String, TransactionRecord>,
    pub(crate) committed: BTreeSet<TxId>,
    pub(crate) next_tx_id: u64,
    pub(crate) next_version_id: u64,
    pub(crate) applied: Vec<AppliedOperation>,
}

impl SimulationState {
    /// The state at step 0: one committed seed per item.
    pub fn seeded(items: &BTreeMap<String, Value>, mode: IsolationMode) -> Self {
        let mut next_version_id = 0;
        let store = if mode.is_multiversion() {
            let chains = items
                .iter()
                .map(|(item, value)| {
                    let seed = Version::seed(VersionId::new(next_version_id), item.clone(), *value);
                    next_version_id += 1;
                    (item.clone(), VersionChain::seeded(seed))
                })
                .collect();
            ItemStore::Versioned(chains)
        } else {
            ItemStore::Cells(
                items
                    .iter()
                    .map(|(item, value)| (item.clone(), DataCell::seed(*value)))
                    .collect(),
            )
        };

        Self {
            mode,
            step: 0,
            store,
            transactions: BTreeMap::new(),
            committed: BTreeSet::new(),
            next_tx_id: 1,
            next_version_id,
            applied: Vec::new(),
        }
    }

    pub fn mode(&self) -> IsolationMode {
        self.mode
    }

    /// Number of operations replayed to reach this state.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn transactions(&self) -> &BTreeMap<String, TransactionRecord> {
        &self.transactions
    }

    pub fn transaction(&self, name: &str) -> Option<&TransactionRecord> {
        self.transactions.get(name)
    }

    pub fn transaction_by_id(&self, id: TxId) -> Option<&TransactionRecord> {
        self.transactions.values().find(|t| t.id == id)
    }

    /// The global committed set, in ascending id order.
    pub fn committed(&self) -> &BTreeSet<TxId> {
        &self.committed
    }

    pub fn is_committed(&self, tx: TxId) -> bool {
        tx.is_seed() || self.committed.contains(&tx)
    }

    pub fn applied(&self) -> &[AppliedOperation] {
        &self.applied
    }

    /// Operations that were dropped during replay.
    pub fn ignored(&self) -> impl Iterator<Item = &AppliedOperation> {
        self.applied
            .iter()
            .filter(|a| matches!(a.outcome, OperationOutcome::Ignored { .. }))
    }

    pub fn item_names(&self) -> Vec<&str> {
        match &self.store {
            ItemStore::Versioned(chains) => chains.keys().map(String::as_str).collect(),
            ItemStore::Cells(cells) => cells.keys().map(String::as_str).collect(),
        }
    }

    /// Version history of `item` (multi-version modes only).
    pub fn versions(&self, item: &str) -> Option<&VersionChain> {
        match &self.store {
            ItemStore::Versioned(chains) => chains.get(item),
            ItemStore::Cells(_) => None,
        }
    }

    /// The single cell of `item` (no-isolation mode only).
    pub fn cell(&self, item: &str) -> Option<&DataCell> {
        match &self.store {
            ItemStore::Cells(cells) => cells.get(item),
            ItemStore::Versioned(_) => None,
        }
    }

    /// The newest value of `item`, committed or not.
    pub fn current_value(&self, item: &str) -> Option<Value> {
        match &self.store {
            ItemStore::Versioned(chains) => chains
                .get(item)
                .and_then(|c| c.versions().last())
                .map(Version::value),
            ItemStore::Cells(cells) => cells.get(item).map(DataCell::value),
        }
    }

    /// The latest committed value of `item`, as an outside observer would
    /// read it right now.
    pub fn committed_value(&self, item: &str) -> Option<Value> {
        match &self.store {
            ItemStore::Versioned(chains) => {
                let chain = chains.get(item)?;
                let view = ReadView::capture(&self.committed);
                // The seed transaction owns nothing but committed seeds, so
                // reading as it is reading as an outsider.
                Visibility::visible_version(chain, TxId::SEED, &view)
                    .version()
                    .map(Version::value)
            }
            ItemStore::Cells(cells) => {
                let cell = cells.get(item)?;
                if cell.is_committed() {
                    return Some(cell.value());
                }
                self.committed_before_image(item, cell.last_writer())
            }
        }
    }

    /// Walks undo logs back from a dirty writer to the last committed value.
    fn committed_before_image(&self, item: &str, mut writer: TxId) -> Option<Value> {
        for _ in 0..=self.transactions.len() {
            let entry = self
                .transaction_by_id(writer)?
                .undo_log
                .entries()
                .iter()
                .find(|e| e.item == item)?;
            if self.is_committed(entry.old_writer) {
                return Some(entry.old_value);
            }
            writer = entry.old_writer;
        }
        None
    }
}
