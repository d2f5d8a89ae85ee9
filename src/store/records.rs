//! Raw records exchanged with a timetable store.
//!
//! Input records are kept close to their tabular form (team lists are
//! still comma-separated text, roles are still tags); the adapter turns
//! them into a [`School`](crate::models::School).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cp::SolveStatus;

/// One `key = value` row of the school configuration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Configuration key.
    pub key: String,
    /// Raw value (JSON or plain text).
    pub value: String,
}

impl ConfigEntry {
    /// Creates an entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One row of the teacher roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherRecord {
    /// Unique teacher name.
    pub name: String,
    /// Core subject; empty for PE and Literacy.
    pub subject: Option<String>,
    /// Team number, or a comma-separated list for Literacy.
    pub teams: String,
    /// Role tag: `Core`, `PE` or `Literacy`.
    pub role: String,
    /// Inactive teachers are ignored.
    pub active: bool,
    /// Optional comma-separated class list narrowing a Literacy roster.
    pub classes: Option<String>,
}

impl TeacherRecord {
    /// A Core teacher row.
    pub fn core(name: &str, subject: &str, team: u32) -> Self {
        Self {
            name: name.into(),
            subject: Some(subject.into()),
            teams: team.to_string(),
            role: "Core".into(),
            active: true,
            classes: None,
        }
    }

    /// A PE teacher row.
    pub fn pe(name: &str) -> Self {
        Self {
            name: name.into(),
            subject: None,
            teams: String::new(),
            role: "PE".into(),
            active: true,
            classes: None,
        }
    }

    /// A Literacy teacher row serving whole teams.
    pub fn literacy(name: &str, teams: &str) -> Self {
        Self {
            name: name.into(),
            subject: None,
            teams: teams.into(),
            role: "Literacy".into(),
            active: true,
            classes: None,
        }
    }
}

/// One row of the class roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    /// Unique class name.
    pub name: String,
    /// Owning team; a missing team is a configuration error.
    pub team: Option<u32>,
}

impl ClassRecord {
    /// Creates a class row.
    pub fn new(name: &str, team: u32) -> Self {
        Self {
            name: name.into(),
            team: Some(team),
        }
    }
}

/// A forced lesson row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRecord {
    pub teacher: String,
    pub class: String,
    pub day: String,
    pub period: u32,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Complete,
    FailedInfeasible,
    FailedUnknown,
    FailedConfigError,
    FailedCollaboratorError,
}

impl RunState {
    /// Persisted status string.
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Complete => "Complete",
            RunState::FailedInfeasible => "Failed-Infeasible",
            RunState::FailedUnknown => "Failed-Unknown",
            RunState::FailedConfigError => "Failed-ConfigError",
            RunState::FailedCollaboratorError => "Failed-CollaboratorError",
        }
    }

    /// Parses a persisted status string.
    pub fn parse(text: &str) -> Option<Self> {
        [
            RunState::Complete,
            RunState::FailedInfeasible,
            RunState::FailedUnknown,
            RunState::FailedConfigError,
            RunState::FailedCollaboratorError,
        ]
        .into_iter()
        .find(|s| s.as_str() == text)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The run status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Terminal state.
    pub status: RunState,
    /// When the run finished.
    pub timestamp: DateTime<Utc>,
    /// Solve duration in milliseconds (0 when no solve happened).
    pub duration_ms: i64,
    /// `Optimal` or `Feasible` for complete runs.
    pub quality: Option<SolveStatus>,
    /// Short diagnostic message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_strings() {
        assert_eq!(RunState::FailedConfigError.as_str(), "Failed-ConfigError");
        assert_eq!(RunState::parse("Failed-Unknown"), Some(RunState::FailedUnknown));
        assert_eq!(RunState::parse("Complete"), Some(RunState::Complete));
        assert_eq!(RunState::parse("Done"), None);
    }

    #[test]
    fn test_record_builders() {
        let t = TeacherRecord::literacy("Literacy_T1", "1,2");
        assert_eq!(t.role, "Literacy");
        assert_eq!(t.teams, "1,2");
        assert!(t.active);
        assert_eq!(ClassRecord::new("A", 1).team, Some(1));
    }
}
