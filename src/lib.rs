//! Weekly school timetabling.
//!
//! Turns a school (teams, classes, Core/PE/Literacy teachers, a weekly
//! period grid and policy quotas) into a constraint model, solves it with
//! a pluggable backend, and decodes the result into per-teacher and
//! per-class grids.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `School`, `Teacher`, `Role`, `Week`,
//!   `Activity`, `Policy`, `Timetable`
//! - **`validation`**: Input integrity checks (unknown references, lunch
//!   placement, core coverage)
//! - **`config`**, **`adapter`**: Store rows → validated `School`
//! - **`cp`**: Backend-agnostic constraint model, solver contract, and the
//!   bundled Pumpkin backend
//! - **`compiler`**: Posts every constraint family onto a `CpModel`
//! - **`decoder`**: Valuation → `Timetable`
//! - **`audit`**: Re-checks a decoded timetable and reports teacher loads
//! - **`diagnosis`**: Family-by-family relaxation after an infeasible solve
//! - **`store`**: Tabular persistence (SQLite and in-memory)
//! - **`runner`**: One end-to-end run with a terminal status
//! - **`reference`**: The four-team reference school
//!
//! # Example
//!
//! ```no_run
//! use u_timetable::config::RunConfig;
//! use u_timetable::cp::PumpkinSolver;
//! use u_timetable::reference::reference_records;
//! use u_timetable::runner::TimetableRunner;
//! use u_timetable::store::SqliteStore;
//!
//! u_timetable::logging::init();
//! let store = SqliteStore::open("timetable.db").unwrap();
//! let records = reference_records();
//! store.seed(&records.config, &records.teachers, &records.classes).unwrap();
//!
//! let runner = TimetableRunner::new(PumpkinSolver::new(), RunConfig::default());
//! let report = runner.run(&store);
//! println!("{}", report.status.status);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Pillay (2014), "A survey of school timetabling research"

pub mod adapter;
pub mod audit;
pub mod compiler;
pub mod config;
pub mod cp;
pub mod decoder;
pub mod diagnosis;
pub mod logging;
pub mod models;
pub mod reference;
pub mod runner;
pub mod store;
pub mod validation;
