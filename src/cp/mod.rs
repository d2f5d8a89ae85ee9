//! Constraint model and solver contract.
//!
//! The compiler only talks to this module: it declares variables and
//! posts family-tagged linear and reified constraints on a [`CpModel`],
//! then hands the model to any [`CpSolver`]. [`PumpkinSolver`] is the
//! bundled backend.
//!
//! # Reference
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming"

mod model;
mod pumpkin;
mod solver;

pub use model::{
    BoolVar, Constraint, ConstraintId, CpModel, Family, IntVar, IntVarInfo, LinearExpr, Lit,
    ModelViolation, Relation, Term, Valuation,
};
pub use pumpkin::PumpkinSolver;
pub use solver::{CpSolution, CpSolver, SolveStatus, SolverConfig};
