//! SQLite-backed store.
//!
//! # Tables
//!
//! | Table | Rows |
//! |-------|------|
//! | `school_config` | `key`, `value` |
//! | `teachers` | `name`, `subject`, `teams`, `role`, `active`, `classes` |
//! | `classes` | `name`, `team` |
//! | `pinned_lessons` | `teacher`, `class`, `day`, `period` |
//! | `teacher_schedule` | one row per (teacher, day, period) |
//! | `class_schedule` | one row per (class, day, period) |
//! | `run_status` | one row per run, newest last |
//!
//! Roster order is insertion order (`rowid`). Grid writes replace the whole
//! table inside one transaction, so readers never see a half-written grid.
//! [`TimetableStore::write_timetable`] replaces both grid tables in a single
//! transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{
    ClassRecord, ConfigEntry, PinRecord, RunState, RunStatus, StoreError, StoreResult,
    TeacherRecord, TimetableStore,
};
use crate::cp::SolveStatus;
use crate::models::{Activity, ClassActivity, ClassSlot, Day, TeacherSlot, TeamId, Timetable};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS school_config (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS teachers (
        name TEXT PRIMARY KEY,
        subject TEXT,
        teams TEXT NOT NULL DEFAULT '',
        role TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        classes TEXT
    );
    CREATE TABLE IF NOT EXISTS classes (
        name TEXT PRIMARY KEY,
        team INTEGER
    );
    CREATE TABLE IF NOT EXISTS pinned_lessons (
        teacher TEXT NOT NULL,
        class TEXT NOT NULL,
        day TEXT NOT NULL,
        period INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS teacher_schedule (
        teacher TEXT NOT NULL,
        day TEXT NOT NULL,
        period INTEGER NOT NULL,
        activity TEXT NOT NULL,
        classes TEXT NOT NULL,
        subject TEXT NOT NULL,
        note TEXT NOT NULL,
        PRIMARY KEY (teacher, day, period)
    );
    CREATE TABLE IF NOT EXISTS class_schedule (
        class TEXT NOT NULL,
        day TEXT NOT NULL,
        period INTEGER NOT NULL,
        kind TEXT NOT NULL,
        subject TEXT NOT NULL,
        teacher TEXT,
        team INTEGER NOT NULL,
        PRIMARY KEY (class, day, period)
    );
    CREATE TABLE IF NOT EXISTS run_status (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        status TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        duration_ms INTEGER NOT NULL,
        quality TEXT,
        message TEXT NOT NULL
    );
"#;

/// A [`TimetableStore`] over one SQLite database.
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database file and ensures the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> StoreResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> StoreResult<()> {
        connection.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    // ---- seeding ----

    /// Replaces the configuration table.
    pub fn replace_config(&self, entries: &[ConfigEntry]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM school_config", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO school_config (key, value) VALUES (?1, ?2)")?;
            for entry in entries {
                stmt.execute(params![entry.key, entry.value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Replaces the teacher roster.
    pub fn replace_teachers(&self, teachers: &[TeacherRecord]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM teachers", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO teachers (name, subject, teams, role, active, classes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for t in teachers {
                stmt.execute(params![t.name, t.subject, t.teams, t.role, t.active, t.classes])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Replaces the class roster.
    pub fn replace_classes(&self, classes: &[ClassRecord]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM classes", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO classes (name, team) VALUES (?1, ?2)")?;
            for c in classes {
                stmt.execute(params![c.name, c.team])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Replaces the pinned lessons.
    pub fn replace_pins(&self, pins: &[PinRecord]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM pinned_lessons", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pinned_lessons (teacher, class, day, period) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for p in pins {
                stmt.execute(params![p.teacher, p.class, p.day, p.period])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Seeds all three input tables.
    pub fn seed(
        &self,
        config: &[ConfigEntry],
        teachers: &[TeacherRecord],
        classes: &[ClassRecord],
    ) -> StoreResult<()> {
        self.replace_config(config)?;
        self.replace_teachers(teachers)?;
        self.replace_classes(classes)
    }

    // ---- output readers ----

    /// Reads the teacher grid back, ordered by (teacher, day, period) as written.
    pub fn read_teacher_schedule(&self) -> StoreResult<Vec<TeacherSlot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT teacher, day, period, activity, classes, subject, note
             FROM teacher_schedule ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (teacher, day, period, activity, classes, subject, note) = row?;
            out.push(TeacherSlot {
                teacher,
                day: parse_day("teacher_schedule", &day)?,
                period,
                activity: Activity::from_label(&activity).ok_or_else(|| {
                    StoreError::malformed("teacher_schedule", format!("activity '{activity}'"))
                })?,
                classes: split_list(&classes),
                subject,
                note,
            });
        }
        Ok(out)
    }

    /// Reads the class grid back.
    pub fn read_class_schedule(&self) -> StoreResult<Vec<ClassSlot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT class, day, period, kind, subject, teacher, team
             FROM class_schedule ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, u32>(6)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (class, day, period, kind, subject, teacher, team) = row?;
            let activity = ClassActivity::from_label(&kind).ok_or_else(|| {
                StoreError::malformed("class_schedule", format!("kind '{kind}'"))
            })?;
            out.push(ClassSlot {
                class,
                day: parse_day("class_schedule", &day)?,
                period,
                activity,
                subject: if activity == ClassActivity::Lesson {
                    subject
                } else {
                    String::new()
                },
                teacher,
                team: TeamId(team),
            });
        }
        Ok(out)
    }

    /// The most recent run status, if any run was recorded.
    pub fn last_run_status(&self) -> StoreResult<Option<RunStatus>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT status, timestamp, duration_ms, quality, message
                 FROM run_status ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((status, timestamp, duration_ms, quality, message)) = row else {
            return Ok(None);
        };
        let status = RunState::parse(&status)
            .ok_or_else(|| StoreError::malformed("run_status", format!("status '{status}'")))?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| StoreError::malformed("run_status", e.to_string()))?
            .with_timezone(&Utc);
        let quality = match quality.as_deref() {
            None => None,
            Some("Optimal") => Some(SolveStatus::Optimal),
            Some("Feasible") => Some(SolveStatus::Feasible),
            Some(other) => {
                return Err(StoreError::malformed("run_status", format!("quality '{other}'")))
            }
        };
        Ok(Some(RunStatus {
            status,
            timestamp,
            duration_ms,
            quality,
            message,
        }))
    }
}

fn parse_day(table: &str, text: &str) -> StoreResult<Day> {
    Day::parse(text).ok_or_else(|| StoreError::malformed(table, format!("day '{text}'")))
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl TimetableStore for SqliteStore {
    fn read_config(&self) -> StoreResult<Vec<ConfigEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM school_config ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(ConfigEntry {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn read_teachers(&self) -> StoreResult<Vec<TeacherRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name, subject, teams, role, active, classes FROM teachers ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TeacherRecord {
                name: row.get(0)?,
                subject: row.get::<_, Option<String>>(1)?.filter(|s| !s.trim().is_empty()),
                teams: row.get(2)?,
                role: row.get(3)?,
                active: row.get(4)?,
                classes: row.get::<_, Option<String>>(5)?.filter(|s| !s.trim().is_empty()),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn read_classes(&self) -> StoreResult<Vec<ClassRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name, team FROM classes ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(ClassRecord {
                name: row.get(0)?,
                team: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn read_pins(&self) -> StoreResult<Vec<PinRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT teacher, class, day, period FROM pinned_lessons ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PinRecord {
                teacher: row.get(0)?,
                class: row.get(1)?,
                day: row.get(2)?,
                period: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn write_teacher_schedule(&self, rows: &[TeacherSlot]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        replace_teacher_rows(&tx, rows)?;
        tx.commit()?;
        debug!(rows = rows.len(), "teacher schedule written");
        Ok(())
    }

    fn write_class_schedule(&self, rows: &[ClassSlot]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        replace_class_rows(&tx, rows)?;
        tx.commit()?;
        debug!(rows = rows.len(), "class schedule written");
        Ok(())
    }

    fn write_timetable(&self, timetable: &Timetable) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        replace_teacher_rows(&tx, &timetable.teacher_rows)?;
        replace_class_rows(&tx, &timetable.class_rows)?;
        tx.commit()?;
        debug!(
            teacher_rows = timetable.teacher_rows.len(),
            class_rows = timetable.class_rows.len(),
            "timetable written"
        );
        Ok(())
    }

    fn update_run_status(&self, status: &RunStatus) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO run_status (status, timestamp, duration_ms, quality, message)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                status.status.as_str(),
                status.timestamp.to_rfc3339(),
                status.duration_ms,
                status.quality.map(|q| q.name()),
                status.message
            ],
        )?;
        Ok(())
    }
}

fn replace_teacher_rows(conn: &Connection, rows: &[TeacherSlot]) -> StoreResult<()> {
    conn.execute("DELETE FROM teacher_schedule", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO teacher_schedule (teacher, day, period, activity, classes, subject, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for r in rows {
        stmt.execute(params![
            r.teacher,
            r.day.name(),
            r.period,
            r.activity.label(),
            r.classes.join(","),
            r.subject,
            r.note
        ])?;
    }
    Ok(())
}

fn replace_class_rows(conn: &Connection, rows: &[ClassSlot]) -> StoreResult<()> {
    conn.execute("DELETE FROM class_schedule", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO class_schedule (class, day, period, kind, subject, teacher, team)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for r in rows {
        stmt.execute(params![
            r.class,
            r.day.name(),
            r.period,
            r.activity.label(),
            r.display(),
            r.teacher,
            r.team.0
        ])?;
    }
    Ok(())
}
