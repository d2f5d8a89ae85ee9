//! Timetable (solution) model.
//!
//! A timetable is two materialized views of one solved model: a
//! per-teacher grid and a per-class grid. Rows are plain data so they can
//! be written to any tabular store.

use serde::{Deserialize, Serialize};

use super::{Activity, Day, Period, Slot, TeamId};

/// One cell of the teacher grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSlot {
    /// Teacher name.
    pub teacher: String,
    /// Day.
    pub day: Day,
    /// Period.
    pub period: Period,
    /// Displayed activity.
    pub activity: Activity,
    /// Classes taught (or the representative class of an elective).
    pub classes: Vec<String>,
    /// Subject inferred from the teacher's post.
    pub subject: String,
    /// Free-text note.
    pub note: String,
}

impl TeacherSlot {
    /// Grid position.
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.period)
    }
}

/// What a class is doing in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassActivity {
    /// Taught by a teacher; the subject is on the row.
    Lesson,
    /// Lunch break.
    Lunch,
    /// School-wide elective block.
    Elective,
    /// Team advisory.
    Advisory,
    /// No lesson and no event.
    Free,
}

impl ClassActivity {
    /// Label for non-lesson cells.
    pub fn label(self) -> &'static str {
        match self {
            ClassActivity::Lesson => "Lesson",
            ClassActivity::Lunch => "Lunch",
            ClassActivity::Elective => "Elective",
            ClassActivity::Advisory => "Advisory",
            ClassActivity::Free => "Free",
        }
    }

    /// Inverse of [`ClassActivity::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        [
            ClassActivity::Lesson,
            ClassActivity::Lunch,
            ClassActivity::Elective,
            ClassActivity::Advisory,
            ClassActivity::Free,
        ]
        .into_iter()
        .find(|a| a.label() == label)
    }
}

/// One cell of the class grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSlot {
    /// Class name.
    pub class: String,
    /// Day.
    pub day: Day,
    /// Period.
    pub period: Period,
    /// Kind of cell.
    pub activity: ClassActivity,
    /// Lesson subject (empty unless `activity` is `Lesson`).
    pub subject: String,
    /// Teacher shown for the cell, if any.
    pub teacher: Option<String>,
    /// Owning team.
    pub team: TeamId,
}

impl ClassSlot {
    /// Grid position.
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.period)
    }

    /// Subject for lessons, otherwise the activity type.
    pub fn display(&self) -> &str {
        match self.activity {
            ClassActivity::Lesson => &self.subject,
            other => other.label(),
        }
    }
}

/// A decoded weekly timetable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    /// Teacher grid, ordered by (teacher, day, period).
    pub teacher_rows: Vec<TeacherSlot>,
    /// Class grid, ordered by (class, day, period).
    pub class_rows: Vec<ClassSlot>,
}

impl Timetable {
    /// Creates an empty timetable.
    pub fn new() -> Self {
        Self::default()
    }

    /// The teacher row at a slot.
    pub fn teacher_at(&self, teacher: &str, slot: Slot) -> Option<&TeacherSlot> {
        self.teacher_rows
            .iter()
            .find(|r| r.teacher == teacher && r.slot() == slot)
    }

    /// The class row at a slot.
    pub fn class_at(&self, class: &str, slot: Slot) -> Option<&ClassSlot> {
        self.class_rows
            .iter()
            .find(|r| r.class == class && r.slot() == slot)
    }

    /// All rows of one teacher.
    pub fn rows_for_teacher<'a>(&'a self, teacher: &'a str) -> impl Iterator<Item = &'a TeacherSlot> {
        self.teacher_rows.iter().filter(move |r| r.teacher == teacher)
    }

    /// All rows of one class.
    pub fn rows_for_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ClassSlot> {
        self.class_rows.iter().filter(move |r| r.class == class)
    }

    /// Number of slots a teacher spends on `activity`.
    pub fn activity_count(&self, teacher: &str, activity: Activity) -> usize {
        self.rows_for_teacher(teacher)
            .filter(|r| r.activity == activity)
            .count()
    }
}
