//! Replay Engine - fold an operation log prefix into a SimulationState
//!
//! `compute_state_at_step` is total and pure: the result depends only on
//! `(log[..step], mode)`. Every call starts from the seeded state, which is
//! what makes stepping backward exact.

use tracing::{debug, trace};

use super::resolver::{resolve_read, resolve_write_base, ItemRef};
use super::{
    AppliedOperation, IgnoreReason, IsolationMode, ItemStore, OperationOutcome, ReadRecord,
    SimulationState, TransactionRecord, TxStatus, WriteRecord,
};
use crate::mvcc::{TxId, Value, Version, VersionChain, VersionId, Visibility};
use crate::scenario::{Operation, OperationKind, OperationLog};

/// Replays `log[..step]` under `mode`.
///
/// Steps past the end of the log are clamped to its length.
pub fn compute_state_at_step(log: &OperationLog, step: usize, mode: IsolationMode) -> SimulationState {
    let step = if step > log.len() {
        debug!(requested = step, len = log.len(), "step out of range, clamping");
        log.len()
    } else {
        step
    };

    let mut state = SimulationState::seeded(log.items(), mode);
    for (index, op) in log.operations()[..step].iter().enumerate() {
        let outcome = apply(&mut state, op);
        match &outcome {
            OperationOutcome::Applied => trace!(index, op = %op, "applied"),
            OperationOutcome::Ignored { reason } => {
                debug!(index, op = %op, ?reason, "operation ignored")
            }
            OperationOutcome::Rejected { conflict_with } => {
                debug!(index, op = %op, conflict_with = %conflict_with, "write rejected")
            }
        }
        state.applied.push(AppliedOperation {
            index,
            operation: op.clone(),
            outcome,
        });
        state.step = index + 1;
    }
    state
}

/// Replays the whole log.
pub fn replay_all(log: &OperationLog, mode: IsolationMode) -> SimulationState {
    compute_state_at_step(log, log.len(), mode)
}

fn ignored(reason: IgnoreReason) -> OperationOutcome {
    OperationOutcome::Ignored { reason }
}

fn apply(state: &mut SimulationState, op: &Operation) -> OperationOutcome {
    if op.kind != OperationKind::Begin {
        match state.transactions.get(&op.tx_name) {
            None => return ignored(IgnoreReason::TransactionNotBegun),
            Some(tx) if !tx.is_active() => {
                return ignored(IgnoreReason::TransactionNotActive { status: tx.status })
            }
            Some(_) => {}
        }
    }

    match op.kind {
        OperationKind::Begin => begin(state, op),
        OperationKind::Read => read(state, op),
        OperationKind::Write => write(state, op),
        OperationKind::Commit => commit(state, op),
        OperationKind::Abort => abort(state, op),
    }
}

fn begin(state: &mut SimulationState, op: &Operation) -> OperationOutcome {
    if state.transactions.contains_key(&op.tx_name) {
        return ignored(IgnoreReason::DuplicateBegin);
    }
    let id = TxId::new(state.next_tx_id);
    state.next_tx_id += 1;
    let record = TransactionRecord::begin(id, &op.tx_name, op.time, &state.committed);
    state.transactions.insert(op.tx_name.clone(), record);
    OperationOutcome::Applied
}

/// Validates the target of a read or write against the store.
fn target<'a>(state: &SimulationState, op: &'a Operation) -> Result<&'a str, IgnoreReason> {
    let item = op.target.as_deref().ok_or(IgnoreReason::MissingTarget)?;
    let known = match &state.store {
        ItemStore::Versioned(chains) => chains.contains_key(item),
        ItemStore::Cells(cells) => cells.contains_key(item),
    };
    if known {
        Ok(item)
    } else {
        Err(IgnoreReason::UnknownItem {
            item: item.to_string(),
        })
    }
}

fn item_ref<'a>(store: &'a ItemStore, item: &str) -> Option<ItemRef<'a>> {
    match store {
        ItemStore::Versioned(chains) => chains.get(item).map(ItemRef::Versions),
        ItemStore::Cells(cells) => cells.get(item).map(ItemRef::Cell),
    }
}

fn read(state: &mut SimulationState, op: &Operation) -> OperationOutcome {
    let item = match target(state, op) {
        Ok(item) => item,
        Err(reason) => return ignored(reason),
    };

    let SimulationState {
        mode,
        store,
        transactions,
        committed,
        ..
    } = state;
    let Some(tx) = transactions.get_mut(&op.tx_name) else {
        return ignored(IgnoreReason::TransactionNotBegun);
    };
    let Some(storage) = item_ref(store, item) else {
        return ignored(IgnoreReason::UnknownItem {
            item: item.to_string(),
        });
    };

    let resolution = resolve_read(*mode, storage, tx, committed);
    tx.reads.push(ReadRecord {
        item: item.to_string(),
        value_observed: resolution.value,
        version_id_observed: resolution.version,
        time: op.time,
    });
    OperationOutcome::Applied
}

fn write(state: &mut SimulationState, op: &Operation) -> OperationOutcome {
    let item = match target(state, op) {
        Ok(item) => item,
        Err(reason) => return ignored(reason),
    };
    let Some(value) = op.value else {
        return ignored(IgnoreReason::MissingValue);
    };

    let SimulationState {
        mode,
        store,
        transactions,
        committed,
        next_version_id,
        ..
    } = state;
    let Some(tx) = transactions.get_mut(&op.tx_name) else {
        return ignored(IgnoreReason::TransactionNotBegun);
    };

    let record = match store {
        ItemStore::Cells(cells) => {
            let Some(cell) = cells.get_mut(item) else {
                return ignored(IgnoreReason::UnknownItem {
                    item: item.to_string(),
                });
            };
            tx.undo_log.record(item, cell);
            let old_value = cell.value();
            cell.overwrite(value, tx.id);
            WriteRecord {
                item: item.to_string(),
                time: op.time,
                new_value: value,
                old_value: Some(old_value),
                old_version_id: None,
                new_version_id: None,
                overwrote_marker: None,
            }
        }
        ItemStore::Versioned(chains) => {
            let Some(chain) = chains.get_mut(item) else {
                return ignored(IgnoreReason::UnknownItem {
                    item: item.to_string(),
                });
            };
            let base = resolve_write_base(*mode, ItemRef::Versions(&*chain), tx, committed);
            match write_version(*mode, chain, base, tx.id, value, next_version_id) {
                Ok(write) => WriteRecord {
                    item: item.to_string(),
                    time: op.time,
                    new_value: value,
                    old_value: write.old_value,
                    old_version_id: base,
                    new_version_id: Some(write.new_version),
                    overwrote_marker: write.overwrote,
                },
                Err(conflict_with) => return OperationOutcome::Rejected { conflict_with },
            }
        }
    };

    tx.writes.push(record);
    OperationOutcome::Applied
}

struct VersionWrite {
    new_version: VersionId,
    old_value: Option<Value>,
    overwrote: Option<TxId>,
}

/// Supersedes `base` and appends the new version.
///
/// Fails with the conflicting writer when the mode checks write-write
/// conflicts and `base` is already superseded.
fn write_version(
    mode: IsolationMode,
    chain: &mut VersionChain,
    base: Option<VersionId>,
    writer: TxId,
    value: Value,
    next_version_id: &mut u64,
) -> Result<VersionWrite, TxId> {
    let mut old_value = None;
    let mut overwrote = None;

    if let Some(base_version) = base.and_then(|id| chain.get_mut(id)) {
        if mode.checks_write_conflicts() {
            if let Some(other) = Visibility::conflicting_writer(base_version, writer) {
                return Err(other);
            }
        }
        old_value = Some(base_version.value());
        overwrote = base_version.invalidate(writer).filter(|prev| *prev != writer);
    }

    let id = VersionId::new(*next_version_id);
    *next_version_id += 1;
    let item = chain.item().to_string();
    chain.push(Version::new(id, item, value, writer));

    Ok(VersionWrite {
        new_version: id,
        old_value,
        overwrote,
    })
}

fn commit(state: &mut SimulationState, op: &Operation) -> OperationOutcome {
    let Some(tx) = state.transactions.get_mut(&op.tx_name) else {
        return ignored(IgnoreReason::TransactionNotBegun);
    };
    tx.status = TxStatus::Committed;
    tx.end_time = Some(op.time);
    let id = tx.id;

    state.committed.insert(id);
    if let ItemStore::Cells(cells) = &mut state.store {
        for cell in cells.values_mut() {
            cell.commit(id);
        }
    }
    OperationOutcome::Applied
}

fn abort(state: &mut SimulationState, op: &Operation) -> OperationOutcome {
    let SimulationState {
        store,
        transactions,
        committed,
        ..
    } = state;
    let Some(tx) = transactions.get_mut(&op.tx_name) else {
        return ignored(IgnoreReason::TransactionNotBegun);
    };
    tx.status = TxStatus::Aborted;
    tx.end_time = Some(op.time);

    match store {
        ItemStore::Versioned(chains) => {
            for chain in chains.values_mut() {
                let (discarded, cleared) = chain.rollback(tx.id);
                if discarded > 0 || cleared > 0 {
                    trace!(item = chain.item(), discarded, cleared, "rolled back");
                }
            }
        }
        ItemStore::Cells(cells) => {
            for entry in tx.undo_log.rollback_order() {
                if let Some(cell) = cells.get_mut(&entry.item) {
                    let writer_committed =
                        entry.old_writer.is_seed() || committed.contains(&entry.old_writer);
                    cell.restore(entry.old_value, entry.old_writer, writer_committed);
                }
            }
        }
    }
    OperationOutcome::Applied
}
