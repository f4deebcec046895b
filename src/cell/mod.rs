//! Single-version storage for the no-isolation model
//!
//! Each item is one mutable `DataCell`. There is no history, so rolling back
//! an aborted transaction relies entirely on that transaction's `UndoLog`.

mod data_cell;
mod undo;

pub use data_cell::DataCell;
pub use undo::{UndoEntry, UndoLog};
