//! Infeasibility diagnosis by family relaxation.
//!
//! After an Infeasible result the model is re-solved once per constraint
//! family, with that family switched off. A family whose removal makes the
//! model solvable is reported as a culprit. Probes that run out of budget
//! are reported as inconclusive rather than guessed.
//!
//! # Algorithm
//! 1. Collect the relaxable families that have at least one constraint
//! 2. For each, solve with [`SolverConfig::without_family`] under the probe
//!    budget
//! 3. Classify the probe by its status
//!
//! Probes are independent; their order follows [`Family::ALL`].

use std::time::Duration;

use tracing::{info, warn};

use crate::cp::{CpModel, CpSolver, Family, SolveStatus, SolverConfig};

/// Outcome of one relaxed re-solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyProbe {
    /// The family that was switched off.
    pub family: Family,
    /// Constraints the family holds.
    pub constraints: usize,
    /// Backend status without the family.
    pub status: SolveStatus,
    /// Time the probe took.
    pub elapsed: Duration,
}

/// All probes of one diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnosis {
    /// Probes in family order.
    pub probes: Vec<FamilyProbe>,
}

impl Diagnosis {
    /// Families whose removal restores feasibility.
    pub fn culprits(&self) -> Vec<Family> {
        self.probes
            .iter()
            .filter(|p| p.status.has_solution())
            .map(|p| p.family)
            .collect()
    }

    /// Families whose probe ended without a conclusion.
    pub fn inconclusive(&self) -> Vec<Family> {
        self.probes
            .iter()
            .filter(|p| p.status == SolveStatus::Unknown)
            .map(|p| p.family)
            .collect()
    }

    /// Culprit family names joined for a status message.
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.culprits().into_iter().map(Family::name).collect();
        if names.is_empty() {
            "no single family explains the conflict".to_string()
        } else {
            format!("relaxing any of [{}] restores feasibility", names.join(", "))
        }
    }
}

/// Probes every populated family of an infeasible model.
pub fn diagnose<S: CpSolver + ?Sized>(
    model: &CpModel,
    solver: &S,
    probe_budget: Duration,
) -> Diagnosis {
    let mut diagnosis = Diagnosis::default();
    for family in Family::ALL {
        let constraints = model.count_in(family);
        if !family.is_relaxable() || constraints == 0 {
            continue;
        }

        let config = SolverConfig::default()
            .with_time_budget(probe_budget)
            .without_family(family);
        let solution = solver.solve(model, &config);
        info!(
            family = family.name(),
            constraints,
            status = %solution.status,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "relaxation probe"
        );
        diagnosis.probes.push(FamilyProbe {
            family,
            constraints,
            status: solution.status,
            elapsed: solution.elapsed,
        });
    }

    let culprits = diagnosis.culprits();
    if culprits.is_empty() {
        warn!(
            inconclusive = diagnosis.inconclusive().len(),
            "no single relaxed family restores feasibility"
        );
    } else {
        warn!(families = ?culprits.iter().map(|f| f.name()).collect::<Vec<_>>(), "infeasibility culprits");
    }
    diagnosis
}
