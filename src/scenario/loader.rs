//! Scenario loading from JSON text, files, or built-in names

use std::fs;
use std::path::Path;

use tracing::debug;

use super::errors::{ScenarioError, ScenarioResult};
use super::{builtin, Scenario, ScenarioDefinition};

/// Loads and validates scenarios.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Parses and validates a scenario from JSON text.
    pub fn from_json_str(json: &str) -> ScenarioResult<Scenario> {
        let definition: ScenarioDefinition = serde_json::from_str(json)?;
        Scenario::from_definition(definition)
    }

    /// Reads and validates a scenario file.
    pub fn load_path(path: &Path) -> ScenarioResult<Scenario> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScenarioError::malformed(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let scenario = Self::from_json_str(&content)?;
        debug!(path = %path.display(), ops = scenario.log().len(), "scenario loaded");
        Ok(scenario)
    }

    /// Resolves a built-in name first, then falls back to a file path.
    pub fn resolve(name_or_path: &str) -> ScenarioResult<Scenario> {
        if builtin::names().contains(&name_or_path) {
            return builtin::load(name_or_path);
        }
        let path = Path::new(name_or_path);
        if path.exists() {
            return Self::load_path(path);
        }
        Err(ScenarioError::UnknownBuiltin(name_or_path.to_string()))
    }
}
