//! Playback Controller - owns the step index and nothing else
//!
//! ```text
//!   Idle ──start──▶ Playing ──pause──▶ PausedByUser
//!    ▲                │  ▲                  │
//!    │              tick └──────resume──────┘
//!  reset              │  ▲
//!    │                ▼  └──────resume──────┐
//!  (any)          Finished      PausedAtKeyMoment
//! ```
//!
//! Every step change recomputes the state from step 0 through the replay
//! engine; the controller never patches a state in place. Each controller
//! belongs to exactly one visualization.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::StepSnapshot;
use crate::config::{ConfigResult, ReplayConfig};
use crate::engine::{compute_state_at_step, IsolationMode, SimulationState};
use crate::scenario::{KeyMoment, Operation, Scenario};

/// Identifies one controller instance in logs and snapshots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerId(Uuid);

impl ControllerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackState {
    /// At step 0, not playing
    Idle,
    Playing,
    PausedByUser,
    PausedAtKeyMoment,
    /// At the last step, not playing
    Finished,
}

impl PlaybackState {
    pub fn is_paused(&self) -> bool {
        matches!(
            self,
            PlaybackState::PausedByUser | PlaybackState::PausedAtKeyMoment
        )
    }
}

/// Drives one scenario through its steps.
#[derive(Debug)]
pub struct PlaybackController {
    id: ControllerId,
    scenario: Scenario,
    config: ReplayConfig,
    mode: IsolationMode,
    speed: f64,
    step: usize,
    playback: PlaybackState,
    /// Key-moment steps that will still pause autoplay
    armed: BTreeSet<usize>,
    state: SimulationState,
}

/// A clone is a separate controller and gets its own id.
impl Clone for PlaybackController {
    fn clone(&self) -> Self {
        Self {
            id: ControllerId::new(),
            scenario: self.scenario.clone(),
            config: self.config.clone(),
            mode: self.mode,
            speed: self.speed,
            step: self.step,
            playback: self.playback,
            armed: self.armed.clone(),
            state: self.state.clone(),
        }
    }
}

impl PlaybackController {
    /// Builds an Idle controller at step 0.
    ///
    /// Fails if `config` does not pass `ReplayConfig::validate`.
    pub fn new(
        scenario: Scenario,
        mode: IsolationMode,
        config: ReplayConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let state = compute_state_at_step(scenario.log(), 0, mode);
        let speed = config.clamp_speed(config.speed);
        let mut controller = Self {
            id: ControllerId::new(),
            scenario,
            config,
            mode,
            speed,
            step: 0,
            playback: PlaybackState::Idle,
            armed: BTreeSet::new(),
            state,
        };
        controller.arm_key_moments();
        debug!(
            controller = %controller.id,
            scenario = controller.scenario.name(),
            mode = %mode,
            "controller created"
        );
        Ok(controller)
    }

    /// Uses the scenario's suggested mode, else the configured default.
    pub fn with_config(scenario: Scenario, config: ReplayConfig) -> ConfigResult<Self> {
        let mode = scenario.suggested_mode().unwrap_or(config.default_isolation);
        Self::new(scenario, mode, config)
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn mode(&self) -> IsolationMode {
        self.mode
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        self.scenario.log().len()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Playing
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The operation applied to reach the current step.
    pub fn current_operation(&self) -> Option<&Operation> {
        self.scenario.log().operation_for_step(self.step)
    }

    pub fn key_moment(&self) -> Option<&KeyMoment> {
        self.scenario.key_moment_at(self.step)
    }

    /// Wall-clock time between ticks at the current speed.
    ///
    /// Saturates at `Duration::MAX`.
    pub fn tick_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.config.base_interval().as_secs_f64() / self.speed)
            .unwrap_or(Duration::MAX)
    }

    pub fn snapshot(&self) -> StepSnapshot {
        StepSnapshot {
            controller: self.id,
            scenario: self.scenario.name().to_string(),
            step: self.step,
            total_steps: self.total_steps(),
            playback: self.playback,
            mode: self.mode,
            speed: self.speed,
            interval_ms: u64::try_from(self.tick_interval().as_millis()).unwrap_or(u64::MAX),
            state: self.state.clone(),
            current_operation: self.current_operation().cloned(),
            key_moment: self.key_moment().cloned(),
        }
    }

    /// Idle/Finished -> Playing. Restarts from step 0 when Finished.
    pub fn start(&mut self) -> bool {
        match self.playback {
            PlaybackState::Idle | PlaybackState::Finished => {
                if self.playback == PlaybackState::Finished {
                    self.arm_key_moments();
                    self.move_to(0);
                }
                self.transition(PlaybackState::Playing);
                true
            }
            _ => false,
        }
    }

    /// Advances one step while Playing.
    ///
    /// Stops at armed key moments and at the end of the log.
    pub fn tick(&mut self) -> bool {
        if self.playback != PlaybackState::Playing {
            return false;
        }
        if self.step >= self.total_steps() {
            self.transition(PlaybackState::Finished);
            return true;
        }

        self.move_to(self.step + 1);
        if self.armed.contains(&self.step) {
            self.transition(PlaybackState::PausedAtKeyMoment);
        } else if self.step == self.total_steps() {
            self.transition(PlaybackState::Finished);
        }
        true
    }

    /// Playing -> PausedByUser.
    pub fn pause(&mut self) -> bool {
        if self.playback != PlaybackState::Playing {
            return false;
        }
        self.transition(PlaybackState::PausedByUser);
        true
    }

    /// Paused -> Playing, disarming the key moment at the current step.
    pub fn resume(&mut self) -> bool {
        if !self.playback.is_paused() {
            return false;
        }
        self.armed.remove(&self.step);
        self.transition(PlaybackState::Playing);
        true
    }

    /// Any state -> Idle at step 0, with every key moment re-armed.
    pub fn reset(&mut self) {
        self.arm_key_moments();
        self.move_to(0);
        self.transition(PlaybackState::Idle);
    }

    /// Moves one step forward. No-op while Playing or at the last step.
    pub fn step_forward(&mut self) -> bool {
        self.seek(self.step + 1)
    }

    /// Moves one step back. No-op while Playing or at step 0.
    pub fn step_backward(&mut self) -> bool {
        match self.step.checked_sub(1) {
            Some(target) => self.seek(target),
            None => false,
        }
    }

    /// Jumps to `step`, clamped to `[0, total_steps]`. No-op while Playing.
    pub fn seek(&mut self, step: usize) -> bool {
        if self.playback == PlaybackState::Playing {
            return false;
        }
        let target = step.min(self.total_steps());
        if target != step {
            debug!(controller = %self.id, requested = step, clamped = target, "step out of range");
        }
        if target == self.step {
            return false;
        }

        self.move_to(target);
        // Idle and Finished are tied to the ends of the log.
        if matches!(
            self.playback,
            PlaybackState::Idle | PlaybackState::Finished
        ) {
            let settled = if self.step == 0 {
                PlaybackState::Idle
            } else if self.step == self.total_steps() {
                PlaybackState::Finished
            } else {
                PlaybackState::PausedByUser
            };
            self.transition(settled);
        }
        true
    }

    /// Sets the speed multiplier, clamped to the configured bounds.
    ///
    /// Returns the speed actually applied.
    pub fn set_speed(&mut self, multiplier: f64) -> f64 {
        self.speed = self.config.clamp_speed(multiplier);
        debug!(controller = %self.id, speed = self.speed, "speed changed");
        self.speed
    }

    /// Switches mode and recomputes the current step under it.
    pub fn set_isolation_mode(&mut self, mode: IsolationMode) -> bool {
        if mode == self.mode {
            return false;
        }
        info!(controller = %self.id, from = %self.mode, to = %mode, "isolation mode changed");
        self.mode = mode;
        self.state = compute_state_at_step(self.scenario.log(), self.step, self.mode);
        true
    }

    fn move_to(&mut self, step: usize) {
        self.step = step;
        self.state = compute_state_at_step(self.scenario.log(), step, self.mode);
    }

    fn arm_key_moments(&mut self) {
        self.armed = if self.config.pause_at_key_moments {
            self.scenario
                .key_moments()
                .iter()
                .filter(|m| m.auto_pause)
                .map(|m| m.step)
                .collect()
        } else {
            BTreeSet::new()
        };
    }

    fn transition(&mut self, to: PlaybackState) {
        if self.playback != to {
            info!(
                controller = %self.id,
                from = ?self.playback,
                to = ?to,
                step = self.step,
                "playback transition"
            );
            self.playback = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::scenario::builtin;

    fn controller(name: &str) -> PlaybackController {
        PlaybackController::with_config(builtin::load(name).unwrap(), ReplayConfig::default())
            .unwrap()
    }

    fn play_until_stopped(c: &mut PlaybackController) {
        while c.tick() && c.is_playing() {}
    }

    #[test]
    fn test_new_controller_is_idle() {
        let c = controller("dirty-read");
        assert_eq!(c.playback_state(), PlaybackState::Idle);
        assert_eq!(c.step(), 0);
        assert_eq!(c.mode(), IsolationMode::NoIsolation);
        assert!(c.current_operation().is_none());
    }

    #[test]
    fn test_tick_only_while_playing() {
        let mut c = controller("dirty-read");
        assert!(!c.tick());
        assert!(c.start());
        assert!(c.tick());
        assert_eq!(c.step(), 1);
    }

    #[test]
    fn test_autoplay_pauses_at_key_moments() {
        // dirty-read: step 2 does not auto-pause, steps 4 and 5 do.
        let mut c = controller("dirty-read");
        c.start();
        play_until_stopped(&mut c);
        assert_eq!(c.step(), 4);
        assert_eq!(c.playback_state(), PlaybackState::PausedAtKeyMoment);
        assert!(c.key_moment().is_some());

        assert!(c.resume());
        play_until_stopped(&mut c);
        assert_eq!(c.step(), 5);

        c.resume();
        play_until_stopped(&mut c);
        assert_eq!(c.step(), c.total_steps());
        assert_eq!(c.playback_state(), PlaybackState::Finished);
    }

    #[test]
    fn test_resume_does_not_repause_same_step() {
        let mut c = controller("dirty-read");
        c.start();
        play_until_stopped(&mut c);
        assert_eq!(c.step(), 4);

        // Step back and forth onto the key moment, then resume from it.
        c.step_backward();
        c.step_forward();
        assert_eq!(c.playback_state(), PlaybackState::PausedAtKeyMoment);
        c.resume();
        assert!(c.is_playing());
        c.tick();
        assert_eq!(c.step(), 5);
    }

    #[test]
    fn test_key_moments_disabled_by_config() {
        let mut config = ReplayConfig::default();
        config.pause_at_key_moments = false;
        let mut c =
            PlaybackController::with_config(builtin::load("dirty-read").unwrap(), config).unwrap();
        c.start();
        play_until_stopped(&mut c);
        assert_eq!(c.playback_state(), PlaybackState::Finished);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut c = controller("lost-update");
        assert!(!c.pause());
        c.start();
        c.tick();
        assert!(c.pause());
        assert_eq!(c.playback_state(), PlaybackState::PausedByUser);
        assert!(!c.tick());
        assert!(c.resume());
        assert!(c.is_playing());
    }

    #[test]
    fn test_start_from_finished_restarts() {
        let mut c = controller("non-repeatable-read");
        c.seek(c.total_steps());
        assert_eq!(c.playback_state(), PlaybackState::Finished);

        assert!(c.start());
        assert_eq!(c.step(), 0);
        assert!(c.is_playing());
    }

    #[test]
    fn test_start_ignored_while_paused() {
        let mut c = controller("lost-update");
        c.start();
        c.tick();
        c.pause();
        assert!(!c.start());
        assert_eq!(c.step(), 1);
    }

    #[test]
    fn test_steps_are_bounded() {
        let mut c = controller("dirty-read");
        assert!(!c.step_backward());
        assert_eq!(c.step(), 0);

        c.seek(c.total_steps());
        let at_end = c.state().clone();
        assert!(!c.step_forward());
        assert_eq!(c.state(), &at_end);
    }

    #[test]
    fn test_forward_then_back_restores_state() {
        for name in builtin::names() {
            let mut c = controller(name);
            for step in 0..c.total_steps() {
                c.seek(step);
                let before = c.state().clone();
                assert!(c.step_forward());
                assert!(c.step_backward());
                assert_eq!(c.state(), &before, "{} at step {}", name, step);
            }
        }
    }

    #[test]
    fn test_seek_clamps() {
        let mut c = controller("dirty-read");
        assert!(c.seek(1000));
        assert_eq!(c.step(), c.total_steps());
    }

    #[test]
    fn test_manual_steps_ignored_while_playing() {
        let mut c = controller("dirty-read");
        c.start();
        assert!(!c.step_forward());
        assert!(!c.seek(3));
        assert_eq!(c.step(), 0);
    }

    #[test]
    fn test_idle_and_finished_follow_the_ends() {
        let mut c = controller("dirty-read");
        c.step_forward();
        assert_eq!(c.playback_state(), PlaybackState::PausedByUser);

        let mut c = controller("dirty-read");
        c.seek(c.total_steps());
        assert_eq!(c.playback_state(), PlaybackState::Finished);
        c.step_backward();
        assert_eq!(c.playback_state(), PlaybackState::PausedByUser);
    }

    #[test]
    fn test_reset_rearms_key_moments() {
        let mut c = controller("dirty-read");
        c.start();
        play_until_stopped(&mut c);
        c.resume();

        c.reset();
        assert_eq!(c.playback_state(), PlaybackState::Idle);
        assert_eq!(c.step(), 0);

        c.start();
        play_until_stopped(&mut c);
        assert_eq!(c.step(), 4);
    }

    #[test]
    fn test_set_speed_clamps_and_scales_interval() {
        let mut c = controller("dirty-read");
        assert_eq!(c.tick_interval(), Duration::from_millis(1200));
        assert_eq!(c.set_speed(2.0), 2.0);
        assert_eq!(c.tick_interval(), Duration::from_millis(600));
        assert_eq!(c.set_speed(50.0), 4.0);
        assert_eq!(c.tick_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_set_isolation_mode_recomputes_in_place() {
        let mut c = controller("dirty-read");
        c.seek(4);
        let t1 = |c: &PlaybackController| c.state().transaction("T1").unwrap().reads[0].value_observed;
        assert_eq!(t1(&c), Some(80));

        assert!(c.set_isolation_mode(IsolationMode::Snapshot));
        assert_eq!(c.step(), 4);
        assert_eq!(t1(&c), Some(100));
        assert!(!c.set_isolation_mode(IsolationMode::Snapshot));
    }

    #[test]
    fn test_snapshot_carries_operation_and_moment() {
        let mut c = controller("dirty-read");
        c.seek(4);
        let snap = c.snapshot();
        assert_eq!(snap.step, 4);
        assert_eq!(snap.total_steps, 7);
        assert_eq!(snap.current_operation.as_ref().map(|o| o.tx_name.as_str()), Some("T1"));
        assert!(snap.key_moment.is_some());
        assert_eq!(snap.state, *c.state());
    }

    #[test]
    fn test_controllers_have_distinct_ids() {
        assert_ne!(controller("dirty-read").id(), controller("dirty-read").id());
    }

    #[test]
    fn test_clone_gets_its_own_id() {
        let mut c = controller("dirty-read");
        c.seek(3);
        let copy = c.clone();
        assert_ne!(copy.id(), c.id());
        assert_eq!(copy.step(), 3);
        assert_eq!(copy.state(), c.state());
        assert_eq!(copy.snapshot().controller, copy.id());
    }

    #[test]
    fn test_inverted_speed_bounds_rejected() {
        let mut config = ReplayConfig::default();
        config.min_speed = 5.0;
        let err = PlaybackController::new(
            builtin::load("dirty-read").unwrap(),
            IsolationMode::Snapshot,
            config,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::SpeedBoundsInverted { min: 5.0, max: 4.0 });
    }

    #[test]
    fn test_zero_min_speed_rejected() {
        let mut config = ReplayConfig::default();
        config.min_speed = 0.0;
        let err = PlaybackController::with_config(builtin::load("dirty-read").unwrap(), config)
            .unwrap_err();
        assert_eq!(err.code(), "TXR_CONFIG_INVALID_SPEED");
        assert!(matches!(err, ConfigError::InvalidSpeed { field: "min_speed", .. }));
    }

    #[test]
    fn test_zero_speed_request_stays_positive() {
        let mut c = controller("dirty-read");
        assert_eq!(c.set_speed(0.0), 0.25);
        assert!(c.snapshot().interval_ms >= 4799);
    }

    #[test]
    fn test_huge_interval_saturates() {
        let mut config = ReplayConfig::default();
        config.base_interval_ms = u64::MAX;
        let mut c = PlaybackController::with_config(builtin::load("dirty-read").unwrap(), config)
            .unwrap();
        c.set_speed(0.25);
        assert_eq!(c.snapshot().interval_ms, u64::MAX);
        assert!(c.tick_interval() >= Duration::from_millis(u64::MAX));
    }
}
