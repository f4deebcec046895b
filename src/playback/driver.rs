//! Playback driver - runs a controller on a tokio task
//!
//! Commands arrive over an mpsc channel; the autoplay timer is an
//! `Interval` that only exists while the controller is Playing. Every
//! command and tick publishes a fresh `StepSnapshot` on a watch channel.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::{PlaybackController, StepSnapshot};
use crate::engine::IsolationMode;

/// Result type for driver operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Playback task has stopped")]
    Closed,

    #[error("Playback task failed: {0}")]
    TaskFailed(String),
}

impl PlaybackError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Closed => "TXR_PLAYBACK_CLOSED",
            Self::TaskFailed(_) => "TXR_PLAYBACK_TASK_FAILED",
        }
    }
}

/// Requests accepted by the playback task.
#[derive(Debug)]
pub enum PlaybackCommand {
    Start,
    Pause,
    Resume,
    Reset,
    StepForward,
    StepBackward,
    Seek(usize),
    SetSpeed(f64),
    SetIsolationMode(IsolationMode),
    Shutdown,
}

/// Client side of a running playback task.
pub struct PlaybackHandle {
    commands: mpsc::Sender<PlaybackCommand>,
    snapshots: watch::Receiver<StepSnapshot>,
    task: JoinHandle<PlaybackController>,
}

/// Moves `controller` onto a new task and returns its handle.
///
/// Must be called from within a tokio runtime.
pub fn spawn(controller: PlaybackController) -> PlaybackHandle {
    let (commands, rx) = mpsc::channel(32);
    let (publisher, snapshots) = watch::channel(controller.snapshot());
    let task = tokio::spawn(run(controller, rx, publisher));
    PlaybackHandle {
        commands,
        snapshots,
        task,
    }
}

impl PlaybackHandle {
    pub async fn send(&self, command: PlaybackCommand) -> PlaybackResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::Closed)
    }

    pub async fn start(&self) -> PlaybackResult<()> {
        self.send(PlaybackCommand::Start).await
    }

    pub async fn pause(&self) -> PlaybackResult<()> {
        self.send(PlaybackCommand::Pause).await
    }

    pub async fn resume(&self) -> PlaybackResult<()> {
        self.send(PlaybackCommand::Resume).await
    }

    pub async fn reset(&self) -> PlaybackResult<()> {
        self.send(PlaybackCommand::Reset).await
    }

    pub async fn step_forward(&self) -> PlaybackResult<()> {
        self.send(PlaybackCommand::StepForward).await
    }

    pub async fn step_backward(&self) -> PlaybackResult<()> {
        self.send(PlaybackCommand::StepBackward).await
    }

    pub async fn seek(&self, step: usize) -> PlaybackResult<()> {
        self.send(PlaybackCommand::Seek(step)).await
    }

    pub async fn set_speed(&self, multiplier: f64) -> PlaybackResult<()> {
        self.send(PlaybackCommand::SetSpeed(multiplier)).await
    }

    pub async fn set_isolation_mode(&self, mode: IsolationMode) -> PlaybackResult<()> {
        self.send(PlaybackCommand::SetIsolationMode(mode)).await
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> StepSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every published snapshot from now on.
    pub fn subscribe(&self) -> watch::Receiver<StepSnapshot> {
        self.snapshots.clone()
    }

    /// Stops the task and hands the controller back.
    pub async fn shutdown(self) -> PlaybackResult<PlaybackController> {
        // The task may already be gone; joining reports the real outcome.
        let _ = self.commands.send(PlaybackCommand::Shutdown).await;
        self.task
            .await
            .map_err(|e| PlaybackError::TaskFailed(e.to_string()))
    }
}

async fn run(
    mut controller: PlaybackController,
    mut commands: mpsc::Receiver<PlaybackCommand>,
    publisher: watch::Sender<StepSnapshot>,
) -> PlaybackController {
    let mut ticker: Option<Interval> = None;
    info!(controller = %controller.id(), scenario = controller.scenario().name(), "playback task started");

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                if matches!(command, PlaybackCommand::Shutdown) {
                    break;
                }
                // A new speed takes effect from the next full period.
                let restart = matches!(command, PlaybackCommand::SetSpeed(_));
                apply(&mut controller, command);
                sync_ticker(&controller, &mut ticker, restart);
            }
            _ = next_tick(&mut ticker) => {
                controller.tick();
                sync_ticker(&controller, &mut ticker, false);
            }
        }
        publisher.send_replace(controller.snapshot());
    }

    info!(controller = %controller.id(), step = controller.step(), "playback task stopped");
    controller
}

fn apply(controller: &mut PlaybackController, command: PlaybackCommand) {
    debug!(controller = %controller.id(), ?command, "playback command");
    match command {
        PlaybackCommand::Start => {
            controller.start();
        }
        PlaybackCommand::Pause => {
            controller.pause();
        }
        PlaybackCommand::Resume => {
            controller.resume();
        }
        PlaybackCommand::Reset => controller.reset(),
        PlaybackCommand::StepForward => {
            controller.step_forward();
        }
        PlaybackCommand::StepBackward => {
            controller.step_backward();
        }
        PlaybackCommand::Seek(step) => {
            controller.seek(step);
        }
        PlaybackCommand::SetSpeed(multiplier) => {
            controller.set_speed(multiplier);
        }
        PlaybackCommand::SetIsolationMode(mode) => {
            controller.set_isolation_mode(mode);
        }
        PlaybackCommand::Shutdown => {}
    }
}

/// Keeps the timer alive exactly while the controller is Playing.
fn sync_ticker(controller: &PlaybackController, ticker: &mut Option<Interval>, restart: bool) {
    if !controller.is_playing() {
        *ticker = None;
        return;
    }
    if ticker.is_none() || restart {
        *ticker = Some(new_ticker(controller.tick_interval()));
    }
}

/// An interval whose first tick lands one full period from now.
fn new_ticker(period: Duration) -> Interval {
    // tokio panics on a zero period.
    let period = period.max(Duration::from_millis(1));
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Waits until `rx` publishes a snapshot matching `predicate`.
pub async fn wait_for(
    rx: &mut watch::Receiver<StepSnapshot>,
    predicate: impl Fn(&StepSnapshot) -> bool,
) -> PlaybackResult<StepSnapshot> {
    let snapshot = rx
        .wait_for(|s| predicate(s))
        .await
        .map_err(|_| PlaybackError::Closed)?;
    Ok(snapshot.clone())
}
