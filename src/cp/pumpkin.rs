//! Bundled backend on the Pumpkin lazy clause generation solver.
//!
//! Booleans become Pumpkin literals and integers Pumpkin domains. Each
//! enabled constraint is posted as one linear constraint over affine
//! views; an enforcement literal turns it into a half-reification
//! (`lit ⇒ C`).
//!
//! The search runs on the calling thread under a [`TimeBudget`]
//! termination condition. When the budget runs out the solver stops
//! itself and the call reports [`SolveStatus::Unknown`]; nothing keeps
//! running after `solve` returns.
//!
//! # Reference
//! - Ohrimenko, Stuckey, Codish (2009), "Propagation via lazy clause generation"
//! - Flippo et al. (2024), "Pumpkin: a lazy clause generation constraint solver"

use std::time::Instant;

use pumpkin_core::constraints::{self, Constraint as PumpkinConstraint};
use pumpkin_core::results::{ProblemSolution, SatisfactionResult};
use pumpkin_core::termination::TimeBudget;
use pumpkin_core::variables::{AffineView, DomainId, Literal, TransformableVariable};
use pumpkin_core::{ConstraintOperationError, Solver};
use tracing::{debug, warn};

use super::{
    Constraint, CpModel, CpSolution, CpSolver, Relation, SolveStatus, SolverConfig, Term,
    Valuation,
};

/// Pumpkin constraint-programming backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpkinSolver;

impl PumpkinSolver {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

/// A model translated into a Pumpkin solver.
struct Translation {
    solver: Solver,
    literals: Vec<Literal>,
    domains: Vec<DomainId>,
}

enum TranslateError {
    /// Posting hit a conflict before any search.
    RootConflict,
    /// A value does not fit Pumpkin's 32-bit integers.
    Overflow(String),
}

impl CpSolver for PumpkinSolver {
    fn name(&self) -> &str {
        "pumpkin"
    }

    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let start = Instant::now();

        let mut translation = match translate(model, config) {
            Ok(t) => t,
            Err(TranslateError::RootConflict) => {
                debug!(model = model.name(), "conflict while posting constraints");
                return CpSolution::infeasible(start.elapsed());
            }
            Err(TranslateError::Overflow(message)) => {
                warn!(model = model.name(), %message, "model does not fit the backend");
                return CpSolution::unknown(start.elapsed());
            }
        };
        debug!(
            model = model.name(),
            literals = translation.literals.len(),
            domains = translation.domains.len(),
            translate_ms = start.elapsed().as_millis() as u64,
            "translated model for pumpkin"
        );

        let mut termination =
            TimeBudget::starting_now(config.time_budget.saturating_sub(start.elapsed()));
        let mut brancher = translation.solver.default_brancher();

        let outcome = match translation.solver.satisfy(&mut brancher, &mut termination) {
            SatisfactionResult::Satisfiable(satisfiable) => {
                let solution = satisfiable.solution();
                let bools = translation
                    .literals
                    .iter()
                    .map(|&lit| solution.get_literal_value(lit))
                    .collect();
                let ints = translation
                    .domains
                    .iter()
                    .map(|&domain| i64::from(solution.get_integer_value(domain)))
                    .collect();
                // No objective: any solution is optimal.
                CpSolution::solved(
                    SolveStatus::Optimal,
                    Valuation::new(bools, ints),
                    start.elapsed(),
                )
            }
            SatisfactionResult::Unsatisfiable(..) => CpSolution::infeasible(start.elapsed()),
            SatisfactionResult::Unknown(..) => {
                warn!(budget = ?config.time_budget, "time budget exhausted");
                CpSolution::unknown(start.elapsed())
            }
        };
        outcome
    }
}

fn translate(model: &CpModel, config: &SolverConfig) -> Result<Translation, TranslateError> {
    let mut solver = Solver::default();

    let literals: Vec<Literal> = (0..model.bool_count())
        .map(|_| solver.new_literal())
        .collect();

    let mut domains = Vec::with_capacity(model.int_count());
    for info in model.int_vars() {
        let values = info
            .domain()
            .iter()
            .map(|&v| narrow(v, &info.name))
            .collect::<Result<Vec<i32>, _>>()?;
        let (Some(&lo), Some(&hi)) = (values.first(), values.last()) else {
            return Err(TranslateError::RootConflict);
        };
        let contiguous = i64::from(hi) - i64::from(lo) + 1 == values.len() as i64;
        let domain = if contiguous {
            solver.new_bounded_integer(lo, hi)
        } else {
            solver.new_sparse_integer(values)
        };
        domains.push(domain);
    }

    let mut translation = Translation {
        solver,
        literals,
        domains,
    };
    for constraint in model.constraints() {
        if config.is_enabled(constraint.family) {
            post(&mut translation, constraint)?;
        }
    }
    Ok(translation)
}

fn post(t: &mut Translation, constraint: &Constraint) -> Result<(), TranslateError> {
    let expr = constraint.expr.normalized();
    let rhs = narrow(constraint.rhs - expr.constant(), "right-hand side")?;

    let mut terms: Vec<AffineView<DomainId>> = Vec::with_capacity(expr.terms().len());
    for &(term, coeff) in expr.terms() {
        let coeff = narrow(coeff, "coefficient")?;
        let view = match term {
            Term::Bool(v) => t.literals[v.index()].get_integer_variable(),
            Term::Int(v) => t.domains[v.index()].scaled(1),
        };
        terms.push(view.scaled(coeff));
    }

    let enforced_by = constraint.enforced_by.map(|lit| {
        let var = t.literals[lit.var.index()];
        if lit.negated {
            !var
        } else {
            var
        }
    });

    if terms.is_empty() {
        if constraint.relation.holds(0, i64::from(rhs)) {
            return Ok(());
        }
        // A constant constraint that never holds forces its enforcer off.
        let Some(lit) = enforced_by else {
            return Err(TranslateError::RootConflict);
        };
        let tag = t.solver.new_constraint_tag();
        return t
            .solver
            .add_clause([(!lit).get_true_predicate()], tag)
            .map_err(|_| TranslateError::RootConflict);
    }

    let tag = t.solver.new_constraint_tag();
    let solver = &mut t.solver;
    let posted = match constraint.relation {
        Relation::Le => post_linear(
            solver,
            constraints::less_than_or_equals(terms, rhs, tag),
            enforced_by,
        ),
        Relation::Ge => post_linear(
            solver,
            constraints::greater_than_or_equals(terms, rhs, tag),
            enforced_by,
        ),
        Relation::Eq => post_linear(solver, constraints::equals(terms, rhs, tag), enforced_by),
    };
    posted.map_err(|_| TranslateError::RootConflict)
}

fn post_linear<C: PumpkinConstraint>(
    solver: &mut Solver,
    constraint: C,
    enforced_by: Option<Literal>,
) -> Result<(), ConstraintOperationError> {
    let poster = solver.add_constraint(constraint);
    match enforced_by {
        Some(lit) => poster.implied_by(lit),
        None => poster.post(),
    }
}

fn narrow(value: i64, what: &str) -> Result<i32, TranslateError> {
    i32::try_from(value)
        .map_err(|_| TranslateError::Overflow(format!("{what}: {value} exceeds 32 bits")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{BoolVar, Family, LinearExpr};
    use std::time::Duration;

    fn config() -> SolverConfig {
        SolverConfig::default().with_time_budget(Duration::from_secs(30))
    }

    #[test]
    fn test_solves_exactly_one() {
        let mut model = CpModel::new("t");
        let xs: Vec<_> = (0..4).map(|i| model.new_bool(format!("x{i}"))).collect();
        model.add_sum(Family::Prep, xs.iter().copied(), Relation::Eq, 1);
        model.fix(Family::Lunch, xs[0], false);

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolveStatus::Optimal);
        let v = solution.valuation.unwrap();
        assert!(model.check(&v).is_empty());
        assert!(!v.bool(xs[0]));
    }

    #[test]
    fn test_reports_infeasible() {
        let mut model = CpModel::new("t");
        let a = model.new_bool("a");
        let b = model.new_bool("b");
        model.add_sum(Family::Prep, [a, b], Relation::Ge, 2);
        model.fix(Family::Lunch, a, false);

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(solution.valuation.is_none());
    }

    #[test]
    fn test_disabled_family_is_ignored() {
        let mut model = CpModel::new("t");
        let a = model.new_bool("a");
        model.fix(Family::Lunch, a, true);
        model.fix(Family::Elective, a, false);

        let solver = PumpkinSolver::new();
        assert_eq!(solver.solve(&model, &config()).status, SolveStatus::Infeasible);

        let relaxed = config().without_family(Family::Elective);
        let solution = solver.solve(&model, &relaxed);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(solution.valuation.unwrap().bool(a));
    }

    #[test]
    fn test_constant_constraints() {
        let mut model = CpModel::new("t");
        model.add(Family::Elective, LinearExpr::new(), Relation::Eq, 2);
        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolveStatus::Infeasible);

        // an enforced constant violation only switches the enforcer off
        let mut model = CpModel::new("t");
        let g = model.new_bool("g");
        model.add_enforced(Family::Elective, g, LinearExpr::new(), Relation::Ge, 1);
        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(!solution.valuation.unwrap().bool(g));
    }

    #[test]
    fn test_integer_channel() {
        let mut model = CpModel::new("t");
        let x = model.new_int("x", [0, 2, 5]);
        let two = model.reify_eq(x, 2);
        model.fix(Family::Prep, two, true);

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolveStatus::Optimal);
        let v = solution.valuation.unwrap();
        assert_eq!(v.int(x), 2);
        assert!(model.check(&v).is_empty());
    }

    #[test]
    fn test_enforced_rows_both_polarities() {
        // has ⇒ Σ = 2 ; ¬has ⇒ Σ = 0 ; and one x forced on
        let mut model = CpModel::new("t");
        let has = model.new_bool("has");
        let xs: Vec<_> = (0..3).map(|i| model.new_bool(format!("x{i}"))).collect();
        let sum = LinearExpr::sum(xs.iter().copied());
        model.add_enforced(Family::Elective, has, sum.clone(), Relation::Eq, 2);
        model.add_enforced(Family::Elective, has.not(), sum, Relation::Eq, 0);
        model.fix(Family::Pin, xs[1], true);

        let solution = PumpkinSolver::new().solve(&model, &config());
        assert_eq!(solution.status, SolveStatus::Optimal);
        let v = solution.valuation.unwrap();
        assert!(v.bool(has));
        assert_eq!(xs.iter().filter(|&&x| v.bool(x)).count(), 2);
        assert!(model.check(&v).is_empty());
    }

    #[test]
    fn test_reified_eq_witnesses() {
        let mut model = CpModel::new("t");
        let b = model.new_bool("b");
        let xs: Vec<_> = (0..3).map(|i| model.new_bool(format!("x{i}"))).collect();
        model.add_reified(Family::Elective, b, LinearExpr::sum(xs.iter().copied()), Relation::Eq, 2);
        model.fix(Family::Pin, b, false);
        model.fix(Family::Pin, xs[0], true);
        model.fix(Family::Pin, xs[1], true);

        let solution = PumpkinSolver::new().solve(&model, &config());
        let v = solution.valuation.unwrap();
        // Σ ≠ 2 with two forced on leaves only Σ = 3
        assert!(v.bool(xs[2]));
        assert!(model.check(&v).is_empty());
    }

    #[test]
    fn test_budget_stops_search() {
        // 20 pigeons, 19 holes: hopeless for clause learning
        let pigeons = 20;
        let holes = 19;
        let mut model = CpModel::new("pigeons");
        let x: Vec<Vec<BoolVar>> = (0..pigeons)
            .map(|p| {
                (0..holes)
                    .map(|h| model.new_bool(format!("p{p}h{h}")))
                    .collect()
            })
            .collect();
        for row in &x {
            model.add_sum(Family::Prep, row.iter().copied(), Relation::Eq, 1);
        }
        for h in 0..holes {
            model.add_sum(Family::Exclusivity, x.iter().map(|row| row[h]), Relation::Le, 1);
        }

        let budget = Duration::from_millis(300);
        let solution = PumpkinSolver::new().solve(&model, &config().with_time_budget(budget));
        assert!(!solution.status.has_solution());
        assert!(solution.elapsed < Duration::from_secs(10), "{:?}", solution.elapsed);
    }
}
