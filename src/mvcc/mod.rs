//! MVCC Domain Types
//!
//! This module provides:
//! - `TxId` / `VersionId` - Replay-ordered identities
//! - `Version` - A value record with creator and invalidator markers
//! - `VersionChain` - Version history for one item
//! - `ReadView` - The committed set a read is evaluated against
//! - `Visibility` - The visibility rule shared by snapshot isolation and
//!   read committed

mod read_view;
mod tx_id;
mod version;
mod version_chain;
mod visibility;

pub use read_view::ReadView;
pub use tx_id::{TxId, VersionId};
pub use version::{Value, Version};
pub use version_chain::VersionChain;
pub use visibility::{Visibility, VisibilityResult};
