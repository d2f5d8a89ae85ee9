//! In-memory store.

use std::sync::Mutex;

use super::{
    ClassRecord, ConfigEntry, PinRecord, RunStatus, StoreError, StoreResult, TeacherRecord,
    TimetableStore,
};
use crate::models::{ClassSlot, TeacherSlot, Timetable};

/// A [`TimetableStore`] holding everything in memory.
///
/// Inputs are fixed at construction. Reads or writes can be made to fail,
/// which lets callers exercise collaborator-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: Vec<ConfigEntry>,
    teachers: Vec<TeacherRecord>,
    classes: Vec<ClassRecord>,
    pins: Vec<PinRecord>,
    fail_reads: bool,
    fail_writes: bool,
    fail_class_writes: bool,
    teacher_rows: Mutex<Vec<TeacherSlot>>,
    class_rows: Mutex<Vec<ClassSlot>>,
    statuses: Mutex<Vec<RunStatus>>,
}

impl MemoryStore {
    /// Creates a store with the given inputs.
    pub fn new(
        config: Vec<ConfigEntry>,
        teachers: Vec<TeacherRecord>,
        classes: Vec<ClassRecord>,
    ) -> Self {
        Self {
            config,
            teachers,
            classes,
            ..Self::default()
        }
    }

    /// Adds pinned lessons.
    pub fn with_pins(mut self, pins: Vec<PinRecord>) -> Self {
        self.pins = pins;
        self
    }

    /// Makes every read fail.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Makes every schedule write fail. Status updates still succeed.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Makes class grid writes fail. Teacher grid writes still succeed.
    pub fn failing_class_writes(mut self) -> Self {
        self.fail_class_writes = true;
        self
    }

    /// Current teacher grid.
    pub fn teacher_schedule(&self) -> StoreResult<Vec<TeacherSlot>> {
        Ok(lock(&self.teacher_rows)?.clone())
    }

    /// Current class grid.
    pub fn class_schedule(&self) -> StoreResult<Vec<ClassSlot>> {
        Ok(lock(&self.class_rows)?.clone())
    }

    /// Every recorded run status, oldest first.
    pub fn run_statuses(&self) -> StoreResult<Vec<RunStatus>> {
        Ok(lock(&self.statuses)?.clone())
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }

    fn check_class_write(&self) -> StoreResult<()> {
        self.check_write()?;
        if self.fail_class_writes {
            return Err(StoreError::Unavailable("class grid writes disabled".into()));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<std::sync::MutexGuard<'_, T>> {
    mutex.lock().map_err(|e| StoreError::Lock(e.to_string()))
}

impl TimetableStore for MemoryStore {
    fn read_config(&self) -> StoreResult<Vec<ConfigEntry>> {
        self.check_read()?;
        Ok(self.config.clone())
    }

    fn read_teachers(&self) -> StoreResult<Vec<TeacherRecord>> {
        self.check_read()?;
        Ok(self.teachers.clone())
    }

    fn read_classes(&self) -> StoreResult<Vec<ClassRecord>> {
        self.check_read()?;
        Ok(self.classes.clone())
    }

    fn read_pins(&self) -> StoreResult<Vec<PinRecord>> {
        self.check_read()?;
        Ok(self.pins.clone())
    }

    fn write_teacher_schedule(&self, rows: &[TeacherSlot]) -> StoreResult<()> {
        self.check_write()?;
        *lock(&self.teacher_rows)? = rows.to_vec();
        Ok(())
    }

    fn write_class_schedule(&self, rows: &[ClassSlot]) -> StoreResult<()> {
        self.check_class_write()?;
        *lock(&self.class_rows)? = rows.to_vec();
        Ok(())
    }

    fn write_timetable(&self, timetable: &Timetable) -> StoreResult<()> {
        self.check_write()?;
        self.check_class_write()?;
        let mut teacher_rows = lock(&self.teacher_rows)?;
        let mut class_rows = lock(&self.class_rows)?;
        *teacher_rows = timetable.teacher_rows.clone();
        *class_rows = timetable.class_rows.clone();
        Ok(())
    }

    fn update_run_status(&self, status: &RunStatus) -> StoreResult<()> {
        lock(&self.statuses)?.push(status.clone());
        Ok(())
    }
}
