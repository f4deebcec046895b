//! Replay engine
//!
//! One engine for every isolation mode: the mode selects the storage
//! (version chains or cells) and the view a read is resolved against.
//!
//! - `IsolationMode` - closed set of disciplines
//! - `resolver` - per-mode visibility resolution
//! - `compute_state_at_step` - pure fold of a log prefix
//! - `SimulationState` - the aggregate handed to the presentation layer

mod isolation;
pub mod resolver;
mod replay;
mod state;

pub use isolation::{IsolationMode, ParseIsolationModeError};
pub use replay::{compute_state_at_step, replay_all};
pub use state::{
    AppliedOperation, IgnoreReason, ItemStore, OperationOutcome, ReadRecord, SimulationState,
    TransactionRecord, TxStatus, WriteRecord,
};
