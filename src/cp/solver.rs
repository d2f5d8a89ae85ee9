//! Solver contract.
//!
//! A backend receives a finished [`CpModel`] and a [`SolverConfig`] and
//! returns a [`CpSolution`]. The call is synchronous and bounded by the
//! configured time budget; a backend that runs out of time stops its
//! search and reports [`SolveStatus::Unknown`]. No work outlives the call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use super::{CpModel, Family, Valuation};

/// Outcome of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// A solution was found and proven optimal (or the model has no objective).
    Optimal,
    /// A solution was found; optimality is not proven.
    Feasible,
    /// No assignment satisfies the model.
    Infeasible,
    /// The budget ran out (or the backend failed) before a proof either way.
    Unknown,
}

impl SolveStatus {
    /// Whether a valuation accompanies this status.
    #[inline]
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Feasible => "Feasible",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-call solver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Wall-clock budget for the call.
    pub time_budget: Duration,
    /// Families the backend must ignore. `Family::Domain` is never ignored.
    pub disabled_families: BTreeSet<Family>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(300),
            disabled_families: BTreeSet::new(),
        }
    }
}

impl SolverConfig {
    /// Sets the time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Switches off one family.
    pub fn without_family(mut self, family: Family) -> Self {
        if family.is_relaxable() {
            self.disabled_families.insert(family);
        }
        self
    }

    /// Whether constraints of `family` are posted to the backend.
    #[inline]
    pub fn is_enabled(&self, family: Family) -> bool {
        !family.is_relaxable() || !self.disabled_families.contains(&family)
    }
}

/// Result of a solve call.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Status.
    pub status: SolveStatus,
    /// Variable values when `status.has_solution()`.
    pub valuation: Option<Valuation>,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl CpSolution {
    /// A solved result.
    pub fn solved(status: SolveStatus, valuation: Valuation, elapsed: Duration) -> Self {
        Self {
            status,
            valuation: Some(valuation),
            elapsed,
        }
    }

    /// An infeasibility proof.
    pub fn infeasible(elapsed: Duration) -> Self {
        Self {
            status: SolveStatus::Infeasible,
            valuation: None,
            elapsed,
        }
    }

    /// No conclusion.
    pub fn unknown(elapsed: Duration) -> Self {
        Self {
            status: SolveStatus::Unknown,
            valuation: None,
            elapsed,
        }
    }

    /// Whether a valuation is available.
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution() && self.valuation.is_some()
    }
}

/// A constraint-solving backend.
pub trait CpSolver {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Solves `model` within `config.time_budget`.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}
