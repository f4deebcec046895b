//! Scenario definition errors
//!
//! Raised at load time, before any step is computed, so a caller can refuse
//! to render a malformed scenario instead of silently skipping operations.
//!
//! Every variant has a stable code of the form `TXR_SCENARIO_<NAME>`.
//! Operation indices refer to positions in the merged, time-ordered log.

use std::fmt;

use thiserror::Error;

use super::OperationKind;

/// How a caller should treat an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The scenario is refused; nothing is rendered from it
    Reject,
    /// The input could not be read at all
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Result type for scenario operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Scenario definition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("Scenario declares no transactions")]
    EmptyScenario,

    #[error("Scenario declares no data items")]
    NoItems,

    #[error("Data item '{0}' is declared more than once")]
    DuplicateItem(String),

    #[error("Transaction #{position} has an empty name")]
    EmptyTransactionName { position: usize },

    #[error("Transaction '{0}' is declared more than once")]
    DuplicateTransaction(String),

    #[error("Transaction '{0}' never begins")]
    MissingBegin(String),

    #[error("Operation {index} ({kind}) of '{tx}' comes before its begin")]
    OperationBeforeBegin {
        tx: String,
        index: usize,
        kind: OperationKind,
    },

    #[error("Operation {index} of '{tx}' begins the transaction a second time")]
    DuplicateBegin { tx: String, index: usize },

    #[error("Operation {index} ({kind}) of '{tx}' has no target item")]
    MissingTarget {
        tx: String,
        index: usize,
        kind: OperationKind,
    },

    #[error("Operation {index} of '{tx}' writes '{item}' without a value")]
    MissingValue {
        tx: String,
        index: usize,
        item: String,
    },

    #[error("Operation {index} of '{tx}' targets unknown item '{item}'")]
    UnknownItem {
        tx: String,
        index: usize,
        item: String,
    },

    #[error("Key moment at step {step} is past the end of the log ({len} steps)")]
    KeyMomentOutOfRange { step: usize, len: usize },

    #[error("Unknown built-in scenario '{0}'")]
    UnknownBuiltin(String),

    #[error("Malformed scenario: {0}")]
    Malformed(String),
}

impl ScenarioError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyScenario => "TXR_SCENARIO_EMPTY",
            Self::NoItems => "TXR_SCENARIO_NO_ITEMS",
            Self::DuplicateItem(_) => "TXR_SCENARIO_DUPLICATE_ITEM",
            Self::EmptyTransactionName { .. } => "TXR_SCENARIO_EMPTY_TX_NAME",
            Self::DuplicateTransaction(_) => "TXR_SCENARIO_DUPLICATE_TX",
            Self::MissingBegin(_) => "TXR_SCENARIO_MISSING_BEGIN",
            Self::OperationBeforeBegin { .. } => "TXR_SCENARIO_OP_BEFORE_BEGIN",
            Self::DuplicateBegin { .. } => "TXR_SCENARIO_DUPLICATE_BEGIN",
            Self::MissingTarget { .. } => "TXR_SCENARIO_MISSING_TARGET",
            Self::MissingValue { .. } => "TXR_SCENARIO_MISSING_VALUE",
            Self::UnknownItem { .. } => "TXR_SCENARIO_UNKNOWN_ITEM",
            Self::KeyMomentOutOfRange { .. } => "TXR_SCENARIO_KEY_MOMENT_RANGE",
            Self::UnknownBuiltin(_) => "TXR_SCENARIO_UNKNOWN_BUILTIN",
            Self::Malformed(_) => "TXR_SCENARIO_MALFORMED",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            Self::UnknownBuiltin(_) | Self::Malformed(_) => Severity::Fatal,
            _ => Severity::Reject,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(format!("JSON error: {}", e))
    }
}

impl From<std::io::Error> for ScenarioError {
    fn from(e: std::io::Error) -> Self {
        Self::malformed(format!("I/O error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_culprit() {
        let err = ScenarioError::UnknownItem {
            tx: "T1".into(),
            index: 3,
            item: "z".into(),
        };
        let display = err.to_string();
        assert!(display.contains("T1"));
        assert!(display.contains("'z'"));
        assert!(display.contains('3'));
        assert_eq!(err.code(), "TXR_SCENARIO_UNKNOWN_ITEM");
        assert_eq!(err.severity(), Severity::Reject);
    }

    #[test]
    fn test_json_error_is_malformed() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ScenarioError::from(json_err);
        assert_eq!(err.code(), "TXR_SCENARIO_MALFORMED");
        assert_eq!(err.severity(), Severity::Fatal);
        assert_eq!(err.severity().to_string(), "FATAL");
    }
}
