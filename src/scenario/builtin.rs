//! Built-in anomaly scenarios
//!
//! Each scenario is embedded JSON, one file per anomaly, so the demos are
//! data run through the one generic engine.

use super::errors::{ScenarioError, ScenarioResult};
use super::{Scenario, ScenarioLoader};

const BUILTINS: &[(&str, &str)] = &[
    ("dirty-read", include_str!("../../scenarios/dirty_read.json")),
    ("dirty-write", include_str!("../../scenarios/dirty_write.json")),
    ("lost-update", include_str!("../../scenarios/lost_update.json")),
    (
        "non-repeatable-read",
        include_str!("../../scenarios/non_repeatable_read.json"),
    ),
    ("phantom-read", include_str!("../../scenarios/phantom_read.json")),
];

/// Names of every built-in scenario.
pub fn names() -> Vec<&'static str> {
    BUILTINS.iter().map(|(name, _)| *name).collect()
}

/// Loads one built-in scenario by name.
pub fn load(name: &str) -> ScenarioResult<Scenario> {
    let (_, json) = BUILTINS
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| ScenarioError::UnknownBuiltin(name.to_string()))?;
    ScenarioLoader::from_json_str(json)
}

/// Loads every built-in scenario.
pub fn all() -> ScenarioResult<Vec<Scenario>> {
    BUILTINS
        .iter()
        .map(|(_, json)| ScenarioLoader::from_json_str(json))
        .collect()
}
