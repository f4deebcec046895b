//! Scenario definitions and the merged operation log
//!
//! A scenario is data, not code: seed values for the named items, the
//! per-transaction operation lists, and optional key-moment annotations.
//! `Scenario::from_definition` validates the definition and merges it into
//! the `OperationLog` the replay engine consumes.

pub mod builtin;
mod errors;
mod loader;
mod log;
mod types;
mod validator;

use std::collections::BTreeMap;

pub use errors::{ScenarioError, ScenarioResult, Severity};
pub use loader::ScenarioLoader;
pub use log::{Operation, OperationKind, OperationLog};
pub use types::{
    KeyMoment, OperationDefinition, ScenarioDefinition, SeedItems, TransactionDefinition,
};
pub use validator::{validate, ScenarioWarning};

use crate::engine::IsolationMode;

/// A validated scenario, ready for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    definition: ScenarioDefinition,
    log: OperationLog,
    warnings: Vec<ScenarioWarning>,
}

impl Scenario {
    /// Validates `definition` and merges its transactions into one log.
    pub fn from_definition(definition: ScenarioDefinition) -> ScenarioResult<Self> {
        let log = OperationLog::merge(definition.items.to_map(), &definition.transactions);
        let warnings = validate(&definition, &log)?;
        Ok(Self {
            definition,
            log,
            warnings,
        })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn description(&self) -> Option<&str> {
        self.definition.description.as_deref()
    }

    pub fn suggested_mode(&self) -> Option<IsolationMode> {
        self.definition.suggested_mode
    }

    pub fn definition(&self) -> &ScenarioDefinition {
        &self.definition
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    pub fn key_moments(&self) -> &[KeyMoment] {
        &self.definition.key_moments
    }

    /// The key moment annotated at `step`, if any.
    pub fn key_moment_at(&self, step: usize) -> Option<&KeyMoment> {
        self.definition.key_moments.iter().find(|m| m.step == step)
    }

    /// Display colors by transaction name, passed through for rendering.
    pub fn colors(&self) -> BTreeMap<&str, &str> {
        self.definition
            .transactions
            .iter()
            .filter_map(|tx| tx.color.as_deref().map(|c| (tx.name.as_str(), c)))
            .collect()
    }

    pub fn warnings(&self) -> &[ScenarioWarning] {
        &self.warnings
    }
}
