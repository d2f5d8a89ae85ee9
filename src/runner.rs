//! End-to-end timetabling run.
//!
//! # Run order
//! 1. Read configuration, rosters and pins from the store
//! 2. Adapt and validate the school
//! 3. Compile the model
//! 4. Solve under the time budget
//! 5. Check the valuation against the model, decode, audit
//! 6. Publish both grids in one atomic store write
//! 7. Record the run status
//!
//! Every run ends in one [`RunOutcome`]. Grids are written only for
//! complete runs, and a failed write leaves the previous grids in place. A failed status write is logged and never changes the
//! outcome.

use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::adapter::SchoolRecords;
use crate::audit::TimetableAudit;
use crate::compiler::{CompileError, CompiledTimetable, TimetableCpBuilder};
use crate::config::RunConfig;
use crate::cp::{CpSolution, CpSolver, SolveStatus};
use crate::diagnosis::{diagnose, Diagnosis};
use crate::models::{School, Timetable};
use crate::store::{RunState, RunStatus, TimetableStore};
use crate::validation::{ConfigErrorKind, ConfigurationError};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A timetable was found and written.
    Complete {
        /// `Optimal` or `Feasible`.
        quality: SolveStatus,
    },
    /// The backend proved that no timetable exists.
    Infeasible,
    /// No conclusion within the budget, or an unusable valuation.
    Unknown {
        /// Why the run is inconclusive.
        reason: String,
    },
    /// Input was rejected before solving.
    ConfigError(Vec<ConfigurationError>),
    /// The store failed.
    CollaboratorError(String),
}

impl RunOutcome {
    /// Persisted state.
    pub fn state(&self) -> RunState {
        match self {
            RunOutcome::Complete { .. } => RunState::Complete,
            RunOutcome::Infeasible => RunState::FailedInfeasible,
            RunOutcome::Unknown { .. } => RunState::FailedUnknown,
            RunOutcome::ConfigError(_) => RunState::FailedConfigError,
            RunOutcome::CollaboratorError(_) => RunState::FailedCollaboratorError,
        }
    }

    /// Whether the run produced a published timetable.
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete { .. })
    }

    fn message(&self) -> String {
        match self {
            RunOutcome::Complete { quality } => format!("{quality} timetable written"),
            RunOutcome::Infeasible => "no timetable satisfies every constraint".to_string(),
            RunOutcome::Unknown { reason } => reason.clone(),
            RunOutcome::ConfigError(errors) => errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
            RunOutcome::CollaboratorError(message) => message.clone(),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Terminal outcome.
    pub outcome: RunOutcome,
    /// Decoded timetable. Kept even when writing it failed.
    pub timetable: Option<Timetable>,
    /// Audit of the decoded timetable.
    pub audit: Option<TimetableAudit>,
    /// Relaxation probes after an Infeasible result, when enabled.
    pub diagnosis: Option<Diagnosis>,
    /// The status record handed to the store.
    pub status: RunStatus,
}

/// Runs the full pipeline against a store with one backend.
pub struct TimetableRunner<S: CpSolver> {
    solver: S,
    config: RunConfig,
}

/// Intermediate result of the solve stage.
struct Solved {
    outcome: RunOutcome,
    timetable: Option<Timetable>,
    audit: Option<TimetableAudit>,
    diagnosis: Option<Diagnosis>,
    elapsed: Duration,
}

impl Solved {
    fn failed(outcome: RunOutcome, elapsed: Duration) -> Self {
        Self {
            outcome,
            timetable: None,
            audit: None,
            diagnosis: None,
            elapsed,
        }
    }
}

impl<S: CpSolver> TimetableRunner<S> {
    /// Creates a runner.
    pub fn new(solver: S, config: RunConfig) -> Self {
        Self { solver, config }
    }

    /// Run settings.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Executes one run.
    pub fn run<T: TimetableStore + ?Sized>(&self, store: &T) -> RunReport {
        info!(backend = self.solver.name(), "timetable run started");
        let mut solved = self.solve_from(store);

        let write_error = match (&solved.outcome, &solved.timetable) {
            (RunOutcome::Complete { .. }, Some(timetable)) => write_grids(store, timetable).err(),
            _ => None,
        };
        if let Some(e) = write_error {
            error!(error = %e, "writing timetable failed");
            solved.outcome = RunOutcome::CollaboratorError(format!("write failed: {e}"));
        }

        let status = RunStatus {
            status: solved.outcome.state(),
            timestamp: Utc::now(),
            duration_ms: i64::try_from(solved.elapsed.as_millis()).unwrap_or(i64::MAX),
            quality: match solved.outcome {
                RunOutcome::Complete { quality } => Some(quality),
                _ => None,
            },
            message: solved.outcome.message(),
        };
        match store.update_run_status(&status) {
            Ok(()) => info!(status = %status.status, duration_ms = status.duration_ms, "run status recorded"),
            Err(e) => error!(error = %e, status = %status.status, "recording run status failed"),
        }

        RunReport {
            outcome: solved.outcome,
            timetable: solved.timetable,
            audit: solved.audit,
            diagnosis: solved.diagnosis,
            status,
        }
    }

    fn solve_from<T: TimetableStore + ?Sized>(&self, store: &T) -> Solved {
        let records = match SchoolRecords::read_from(store) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "reading inputs failed");
                return Solved::failed(
                    RunOutcome::CollaboratorError(format!("read failed: {e}")),
                    Duration::ZERO,
                );
            }
        };

        let school = match records.to_school() {
            Ok(school) => school,
            Err(errors) => {
                for e in &errors {
                    warn!(kind = ?e.kind, "{}", e.message);
                }
                return Solved::failed(RunOutcome::ConfigError(errors), Duration::ZERO);
            }
        };

        let compiled = match TimetableCpBuilder::new(&school).build() {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(error = %e, "model construction rejected the school");
                return Solved::failed(
                    RunOutcome::ConfigError(vec![compile_error(&e)]),
                    Duration::ZERO,
                );
            }
        };

        let solution = self
            .solver
            .solve(&compiled.model, &self.config.solver_config());
        info!(
            status = %solution.status,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "solve finished"
        );
        self.interpret(&school, &compiled, solution)
    }

    fn interpret(&self, school: &School, compiled: &CompiledTimetable, solution: CpSolution) -> Solved {
        let elapsed = solution.elapsed;
        match solution.status {
            SolveStatus::Infeasible => {
                log_infeasible(school);
                let diagnosis = self.config.diagnose_infeasible.then(|| {
                    diagnose(&compiled.model, &self.solver, self.config.probe_budget)
                });
                Solved {
                    diagnosis,
                    ..Solved::failed(RunOutcome::Infeasible, elapsed)
                }
            }
            SolveStatus::Unknown => {
                warn!(
                    budget_s = self.config.time_budget.as_secs(),
                    "no conclusion within the time budget; retry with a larger budget"
                );
                Solved::failed(
                    RunOutcome::Unknown {
                        reason: format!(
                            "no conclusion within {}s",
                            self.config.time_budget.as_secs()
                        ),
                    },
                    elapsed,
                )
            }
            quality @ (SolveStatus::Optimal | SolveStatus::Feasible) => {
                let Some(valuation) = &solution.valuation else {
                    return Solved::failed(
                        RunOutcome::Unknown {
                            reason: format!("backend reported {quality} without values"),
                        },
                        elapsed,
                    );
                };
                let violations = compiled.model.check(valuation);
                if let Some(first) = violations.first() {
                    error!(
                        violations = violations.len(),
                        family = first.family.name(),
                        "backend valuation violates the model"
                    );
                    return Solved::failed(
                        RunOutcome::Unknown {
                            reason: format!(
                                "backend valuation violates {} constraints",
                                violations.len()
                            ),
                        },
                        elapsed,
                    );
                }

                let timetable = match compiled.decode(school, &solution) {
                    Ok(Some(timetable)) => timetable,
                    Ok(None) => {
                        return Solved::failed(
                            RunOutcome::Unknown {
                                reason: "no valuation to decode".to_string(),
                            },
                            elapsed,
                        )
                    }
                    Err(e) => {
                        error!(error = %e, "decoding failed");
                        return Solved::failed(
                            RunOutcome::Unknown {
                                reason: format!("decode failed: {e}"),
                            },
                            elapsed,
                        );
                    }
                };

                let audit = TimetableAudit::calculate(school, &timetable);
                for v in &audit.violations {
                    warn!(family = v.family.name(), "{}", v.message);
                }
                info!(
                    teacher_rows = timetable.teacher_rows.len(),
                    class_rows = timetable.class_rows.len(),
                    avg_teaching_load = audit.avg_teaching_load,
                    "timetable decoded"
                );

                Solved {
                    outcome: RunOutcome::Complete { quality },
                    timetable: Some(timetable),
                    audit: Some(audit),
                    diagnosis: None,
                    elapsed,
                }
            }
        }
    }
}

fn write_grids<T: TimetableStore + ?Sized>(
    store: &T,
    timetable: &Timetable,
) -> crate::store::StoreResult<()> {
    store.write_timetable(timetable)?;
    info!(
        teacher_rows = timetable.teacher_rows.len(),
        class_rows = timetable.class_rows.len(),
        "timetable written"
    );
    Ok(())
}

fn log_infeasible(school: &School) {
    let periods: Vec<String> = school
        .week
        .periods_per_day()
        .iter()
        .map(|(day, count)| format!("{day}={count}"))
        .collect();
    let subjects: Vec<&str> = school.subjects.iter().map(|s| s.name.as_str()).collect();
    error!(
        teachers = school.teachers.len(),
        classes = school.classes.len(),
        periods_per_day = %periods.join(","),
        subjects = %subjects.join(","),
        "model is infeasible"
    );
}

fn compile_error(e: &CompileError) -> ConfigurationError {
    let kind = match e {
        CompileError::UnknownTeam { .. } => ConfigErrorKind::UnknownTeam,
        CompileError::UnknownSubject { .. } => ConfigErrorKind::UnknownSubject,
        CompileError::UnknownClass { .. } => ConfigErrorKind::UnknownClass,
        CompileError::UnknownTeacher { .. } => ConfigErrorKind::UnknownTeacher,
        CompileError::IneligiblePin { .. } => ConfigErrorKind::IneligiblePin,
        CompileError::EmptyWeek => ConfigErrorKind::MissingKey,
    };
    ConfigurationError::new(kind, e.to_string())
}
