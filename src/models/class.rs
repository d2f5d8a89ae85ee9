//! Classes, teams, and subjects.
//!
//! A class belongs to exactly one team for the whole run. Teams are the
//! unit that shares PE, team meetings and advisory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Team number (1..N in configuration data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team {}", self.0)
    }
}

/// Index of a class within a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub usize);

/// Index of a core subject within a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub usize);

/// A student class (homeroom group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
    /// Unique class name (e.g. `A`).
    pub name: String,
    /// Owning team.
    pub team: TeamId,
}

impl SchoolClass {
    /// Creates a class.
    pub fn new(name: impl Into<String>, team: TeamId) -> Self {
        Self {
            name: name.into(),
            team,
        }
    }
}

/// A team and its classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team number.
    pub id: TeamId,
    /// Member classes, in configuration order.
    pub classes: Vec<ClassId>,
}

/// A core subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject name (e.g. `Math`).
    pub name: String,
    /// Taught fewer times per week than the other core subjects.
    pub reduced: bool,
}

impl Subject {
    /// Creates a full-frequency subject.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reduced: false,
        }
    }

    /// Creates a reduced-frequency subject.
    pub fn reduced(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reduced: true,
        }
    }
}
