//! CLI-specific error types
//!
//! Every error that reaches the CLI is fatal for the current command.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::playback::PlaybackError;
use crate::scenario::ScenarioError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Scenario failed to load or validate
    Scenario(&'static str),
    /// Replay configuration error
    Config(&'static str),
    /// Playback task error
    Playback(&'static str),
    /// I/O error (stdout, runtime)
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Scenario(code) | Self::Config(code) | Self::Playback(code) => code,
            Self::IoError => "TXR_CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ScenarioError> for CliError {
    fn from(e: ScenarioError) -> Self {
        Self::new(CliErrorCode::Scenario(e.code()), e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(CliErrorCode::Config(e.code()), e.to_string())
    }
}

impl From<PlaybackError> for CliError {
    fn from(e: PlaybackError) -> Self {
        Self::new(CliErrorCode::Playback(e.code()), e.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through() {
        let err: CliError = ScenarioError::UnknownBuiltin("nope".into()).into();
        assert_eq!(err.code_str(), ScenarioError::UnknownBuiltin("nope".into()).code());

        let err: CliError = ConfigError::ZeroInterval.into();
        assert_eq!(err.code_str(), "TXR_CONFIG_ZERO_INTERVAL");
        assert!(err.to_string().starts_with("TXR_CONFIG_ZERO_INTERVAL: "));
    }

    #[test]
    fn test_io_error() {
        let err: CliError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert_eq!(err.code_str(), "TXR_CLI_IO_ERROR");
        assert_eq!(err.message(), "pipe");
    }
}
