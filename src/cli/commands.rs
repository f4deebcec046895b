//! CLI command implementations
//!
//! Every command resolves its scenario first (builtin name or file path),
//! so a bad scenario fails before any replay or playback starts.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::time;
use tracing::info;

use crate::config::ReplayConfig;
use crate::engine::{
    compute_state_at_step, IsolationMode, OperationOutcome, SimulationState, TxStatus,
};
use crate::mvcc::Value;
use crate::playback::{self, PlaybackController, PlaybackError, PlaybackState, StepSnapshot};
use crate::scenario::{builtin, Scenario, ScenarioLoader};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_line, write_response};

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::List => list(),
        Command::Validate { scenario } => validate(&scenario),
        Command::State {
            scenario,
            mode,
            step,
        } => state(&scenario, mode, step),
        Command::Compare { scenario, step } => compare(&scenario, step),
        Command::Play {
            scenario,
            mode,
            speed,
            config,
        } => play(&scenario, mode, speed, config.as_deref()),
    }
}

/// List the builtin scenarios with their suggested modes
pub fn list() -> CliResult<()> {
    let scenarios = builtin::all()?;
    let entries: Vec<_> = scenarios
        .iter()
        .map(|s| {
            json!({
                "name": s.name(),
                "description": s.description(),
                "suggestedMode": s.suggested_mode(),
                "steps": s.log().len(),
            })
        })
        .collect();
    write_response(json!(entries))
}

/// Validate a scenario and print its merged log and warnings
pub fn validate(name: &str) -> CliResult<()> {
    let scenario = ScenarioLoader::resolve(name)?;
    let operations: Vec<String> = scenario
        .log()
        .operations()
        .iter()
        .map(|op| op.to_string())
        .collect();
    write_response(json!({
        "name": scenario.name(),
        "items": scenario.log().items(),
        "operations": operations,
        "keyMoments": scenario.key_moments(),
        "warnings": scenario.warnings(),
    }))
}

/// Print the step snapshot at a step, with a value summary
pub fn state(name: &str, mode: Option<IsolationMode>, step: Option<usize>) -> CliResult<()> {
    let scenario = ScenarioLoader::resolve(name)?;
    let mode = resolve_mode(&scenario, mode);
    let step = step.unwrap_or(scenario.log().len());

    let mut controller = PlaybackController::new(scenario, mode, ReplayConfig::default())?;
    controller.seek(step);
    let snapshot = controller.snapshot();
    write_response(json!({
        "summary": ModeSummary::of(&snapshot.state),
        "snapshot": snapshot,
    }))
}

/// Summarize the same step under every isolation mode
pub fn compare(name: &str, step: Option<usize>) -> CliResult<()> {
    let scenario = ScenarioLoader::resolve(name)?;
    let step = step.unwrap_or(scenario.log().len());
    let summaries: Vec<ModeSummary> = IsolationMode::ALL
        .iter()
        .map(|mode| ModeSummary::of(&compute_state_at_step(scenario.log(), step, *mode)))
        .collect();
    write_response(json!({
        "name": scenario.name(),
        "modes": summaries,
    }))
}

/// Autoplay a scenario on a tokio runtime, one output line per step.
///
/// The CLI is not interactive, so a key moment is printed and playback
/// resumes after one more interval.
pub fn play(
    name: &str,
    mode: Option<IsolationMode>,
    speed: Option<f64>,
    config_path: Option<&Path>,
) -> CliResult<()> {
    let mut config = match config_path {
        Some(path) => ReplayConfig::load(path)?,
        None => ReplayConfig::default(),
    };
    if let Some(speed) = speed {
        let speed = config.clamp_speed(speed);
        config = config.with_speed(speed);
    }
    let scenario = ScenarioLoader::resolve(name)?;
    let controller = match mode {
        Some(mode) => PlaybackController::new(scenario, mode, config)?,
        None => PlaybackController::with_config(scenario, config)?,
    };
    info!(
        controller = %controller.id(),
        mode = %controller.mode(),
        interval_ms = u64::try_from(controller.tick_interval().as_millis()).unwrap_or(u64::MAX),
        "starting playback"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let handle = playback::spawn(controller);
        let mut snapshots = handle.subscribe();
        handle.start().await?;

        let mut printed = None;
        loop {
            snapshots
                .changed()
                .await
                .map_err(|_| PlaybackError::Closed)?;
            let snapshot = snapshots.borrow_and_update().clone();
            if printed != Some(snapshot.step) {
                write_line(&StepLine::of(&snapshot))?;
                printed = Some(snapshot.step);
            }
            match snapshot.playback {
                PlaybackState::PausedAtKeyMoment => {
                    time::sleep(Duration::from_millis(snapshot.interval_ms)).await;
                    handle.resume().await?;
                }
                PlaybackState::Finished => break,
                _ => {}
            }
        }

        handle.shutdown().await?;
        Ok::<(), CliError>(())
    })
}

fn resolve_mode(scenario: &Scenario, requested: Option<IsolationMode>) -> IsolationMode {
    requested
        .or_else(|| scenario.suggested_mode())
        .unwrap_or_default()
}

/// The observable outcome of a replay, without version internals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSummary {
    pub mode: IsolationMode,
    pub step: usize,
    pub current_values: BTreeMap<String, Option<Value>>,
    pub committed_values: BTreeMap<String, Option<Value>>,
    pub statuses: BTreeMap<String, TxStatus>,
    /// Values each transaction observed, per item, in read order
    pub observed: BTreeMap<String, BTreeMap<String, Vec<Option<Value>>>>,
    pub rejected: Vec<String>,
    pub ignored: usize,
}

impl ModeSummary {
    pub fn of(state: &SimulationState) -> Self {
        let items = state.item_names();
        let mut observed: BTreeMap<String, BTreeMap<String, Vec<Option<Value>>>> = BTreeMap::new();
        for (name, tx) in state.transactions() {
            let reads = observed.entry(name.clone()).or_default();
            for read in &tx.reads {
                reads
                    .entry(read.item.clone())
                    .or_default()
                    .push(read.value_observed);
            }
        }

        Self {
            mode: state.mode(),
            step: state.step(),
            current_values: items
                .iter()
                .map(|i| (i.to_string(), state.current_value(i)))
                .collect(),
            committed_values: items
                .iter()
                .map(|i| (i.to_string(), state.committed_value(i)))
                .collect(),
            statuses: state
                .transactions()
                .iter()
                .map(|(name, tx)| (name.clone(), tx.status))
                .collect(),
            observed,
            rejected: state
                .applied()
                .iter()
                .filter(|a| matches!(a.outcome, OperationOutcome::Rejected { .. }))
                .map(|a| a.operation.to_string())
                .collect(),
            ignored: state.ignored().count(),
        }
    }
}

/// One line of `play` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StepLine<'a> {
    step: usize,
    total_steps: usize,
    playback: PlaybackState,
    operation: Option<String>,
    key_moment: Option<&'a str>,
    values: BTreeMap<String, Option<Value>>,
}

impl<'a> StepLine<'a> {
    fn of(snapshot: &'a StepSnapshot) -> Self {
        Self {
            step: snapshot.step,
            total_steps: snapshot.total_steps,
            playback: snapshot.playback,
            operation: snapshot.current_operation.as_ref().map(|op| op.to_string()),
            key_moment: snapshot.key_moment.as_ref().map(|m| m.text.as_str()),
            values: snapshot
                .state
                .item_names()
                .into_iter()
                .map(|i| (i.to_string(), snapshot.state.current_value(i)))
                .collect(),
        }
    }
}
