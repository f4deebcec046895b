//! txreplay - deterministic transaction replay for isolation-anomaly demos
//!
//! A scenario (seed values plus per-transaction operation lists) is merged
//! into one time-ordered log. `engine::compute_state_at_step` replays any
//! prefix of that log under a chosen isolation mode; `playback` walks the
//! steps with pause, seek and timed autoplay.
//!
//! - `mvcc` - versions, version chains, read views and visibility
//! - `cell` - single-value cells and undo logs for the no-isolation mode
//! - `scenario` - definitions, validation, builtin anomaly scenarios
//! - `engine` - isolation modes and the pure replay fold
//! - `playback` - step controller and tokio autoplay driver
//! - `config` - replay defaults loaded from JSON
//! - `cli` - the `txreplay` command

pub mod cell;
pub mod cli;
pub mod config;
pub mod engine;
pub mod mvcc;
pub mod playback;
pub mod scenario;
