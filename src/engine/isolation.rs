//! Isolation modes the replay engine can run under

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The concurrency-control discipline a replay runs under.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationMode {
    /// One mutable cell per item, dirty reads allowed, undo-log rollback.
    #[serde(rename = "none")]
    NoIsolation,
    /// Multi-version; each read sees what is committed at that instant.
    ReadCommitted,
    /// Multi-version snapshot taken at `Begin`. Write-write conflicts are not
    /// checked, so a later writer silently overwrites an invalidation marker.
    #[default]
    Snapshot,
    /// Snapshot isolation that rejects a write whose base version has
    /// already been superseded.
    SnapshotStrict,
}

impl IsolationMode {
    /// Every mode, in the order the CLI compares them.
    pub const ALL: [IsolationMode; 4] = [
        IsolationMode::NoIsolation,
        IsolationMode::ReadCommitted,
        IsolationMode::Snapshot,
        IsolationMode::SnapshotStrict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationMode::NoIsolation => "none",
            IsolationMode::ReadCommitted => "read-committed",
            IsolationMode::Snapshot => "snapshot",
            IsolationMode::SnapshotStrict => "snapshot-strict",
        }
    }

    /// True for the modes backed by version chains.
    pub fn is_multiversion(&self) -> bool {
        !matches!(self, IsolationMode::NoIsolation)
    }

    /// True if reads are evaluated against the view captured at `Begin`.
    pub fn uses_begin_snapshot(&self) -> bool {
        matches!(
            self,
            IsolationMode::Snapshot | IsolationMode::SnapshotStrict
        )
    }

    pub fn checks_write_conflicts(&self) -> bool {
        matches!(self, IsolationMode::SnapshotStrict)
    }
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known isolation mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown isolation mode '{0}' (expected none, read-committed, snapshot or snapshot-strict)")]
pub struct ParseIsolationModeError(pub String);

impl FromStr for IsolationMode {
    type Err = ParseIsolationModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no-isolation" | "dirty" => Ok(IsolationMode::NoIsolation),
            "read-committed" | "rc" => Ok(IsolationMode::ReadCommitted),
            "snapshot" | "si" | "mvcc" => Ok(IsolationMode::Snapshot),
            "snapshot-strict" | "strict" => Ok(IsolationMode::SnapshotStrict),
            _ => Err(ParseIsolationModeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unchecked_snapshot() {
        assert_eq!(IsolationMode::default(), IsolationMode::Snapshot);
        assert!(!IsolationMode::default().checks_write_conflicts());
    }

    #[test]
    fn test_parse_round_trips_display() {
        for mode in IsolationMode::ALL {
            assert_eq!(mode.to_string().parse::<IsolationMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("RC".parse(), Ok(IsolationMode::ReadCommitted));
        assert_eq!("dirty".parse(), Ok(IsolationMode::NoIsolation));
        assert!("serializable".parse::<IsolationMode>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&IsolationMode::NoIsolation).unwrap();
        assert_eq!(json, "\"none\"");
        let mode: IsolationMode = serde_json::from_str("\"read-committed\"").unwrap();
        assert_eq!(mode, IsolationMode::ReadCommitted);
    }

    #[test]
    fn test_mode_flags() {
        assert!(!IsolationMode::NoIsolation.is_multiversion());
        assert!(IsolationMode::ReadCommitted.is_multiversion());
        assert!(!IsolationMode::ReadCommitted.uses_begin_snapshot());
        assert!(IsolationMode::SnapshotStrict.uses_begin_snapshot());
    }
}
