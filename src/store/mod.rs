//! Tabular store for school inputs and timetable outputs.
//!
//! A run reads its configuration, teacher roster, class roster and pins
//! through [`TimetableStore`], and writes the two grids and a run status
//! record back. A run publishes both grids with one
//! [`TimetableStore::write_timetable`] call: either both are replaced or
//! neither is. [`SqliteStore`] persists to SQLite; [`MemoryStore`]
//! keeps everything in memory.

mod error;
mod memory;
mod records;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use records::{
    ClassRecord, ConfigEntry, PinRecord, RunState, RunStatus, TeacherRecord,
};
pub use sqlite::SqliteStore;

use crate::models::{ClassSlot, TeacherSlot, Timetable};

/// Repository operations of a timetabling run.
pub trait TimetableStore {
    /// School configuration rows.
    fn read_config(&self) -> StoreResult<Vec<ConfigEntry>>;

    /// Teacher roster rows, in roster order.
    fn read_teachers(&self) -> StoreResult<Vec<TeacherRecord>>;

    /// Class roster rows, in roster order.
    fn read_classes(&self) -> StoreResult<Vec<ClassRecord>>;

    /// Forced lessons. Stores without pins return none.
    fn read_pins(&self) -> StoreResult<Vec<PinRecord>> {
        Ok(Vec::new())
    }

    /// Replaces the teacher grid.
    fn write_teacher_schedule(&self, rows: &[TeacherSlot]) -> StoreResult<()>;

    /// Replaces the class grid.
    fn write_class_schedule(&self, rows: &[ClassSlot]) -> StoreResult<()>;

    /// Replaces both grids atomically. On error the previous grids stay
    /// in place.
    fn write_timetable(&self, timetable: &Timetable) -> StoreResult<()>;

    /// Records the outcome of a run.
    fn update_run_status(&self, status: &RunStatus) -> StoreResult<()>;
}
