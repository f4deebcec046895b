use serde::Serialize;

use super::{ControllerId, PlaybackState};
use crate::engine::{IsolationMode, SimulationState};
use crate::scenario::{KeyMoment, Operation};

/// Everything a renderer needs for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSnapshot {
    pub controller: ControllerId,
    pub scenario: String,
    pub step: usize,
    pub total_steps: usize,
    pub playback: PlaybackState,
    pub mode: IsolationMode,
    pub speed: f64,
    pub interval_ms: u64,
    pub state: SimulationState,
    /// The operation applied to reach `step`; `None` at step 0
    pub current_operation: Option<Operation>,
    pub key_moment: Option<KeyMoment>,
}

impl StepSnapshot {
    pub fn is_at_end(&self) -> bool {
        self.step == self.total_steps
    }
}
