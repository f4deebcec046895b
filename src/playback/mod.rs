//! Playback
//!
//! `PlaybackController` is the synchronous state machine over the step
//! index; `driver` runs one on a tokio task with an autoplay timer and
//! publishes `StepSnapshot`s to observers.

mod controller;
pub mod driver;
mod snapshot;

pub use controller::{ControllerId, PlaybackController, PlaybackState};
pub use driver::{spawn, PlaybackCommand, PlaybackError, PlaybackHandle, PlaybackResult};
pub use snapshot::StepSnapshot;
