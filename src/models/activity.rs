//! Activity labels.
//!
//! Every teacher holds exactly one activity in every slot of the week,
//! lunch included. `Teaching` is never chosen directly: it is equivalent
//! to instructing at least one class in that slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a teacher is doing in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activity {
    /// Instructing one or more classes.
    Teaching,
    /// Planning period; exactly one per teacher per day.
    Prep,
    /// Team meeting (Core teachers of one team, during that team's PE).
    TeamMeeting,
    /// Subject discipline meeting.
    DisciplineMeeting,
    /// Team advisory period.
    Advisory,
    /// School-wide elective block.
    Elective,
    /// Fixed lunch break.
    Lunch,
    /// Unassigned non-instructional period.
    Free,
}

impl Activity {
    /// All labels, in code order.
    pub const ALL: [Activity; 8] = [
        Activity::Teaching,
        Activity::Prep,
        Activity::TeamMeeting,
        Activity::DisciplineMeeting,
        Activity::Advisory,
        Activity::Elective,
        Activity::Lunch,
        Activity::Free,
    ];

    /// Integer code used as the value of activity variables.
    #[inline]
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Inverse of [`Activity::code`].
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.code() == code)
    }

    /// Label shown in the teacher grid.
    pub fn label(self) -> &'static str {
        match self {
            Activity::Teaching => "Teaching",
            Activity::Prep => "Prep",
            Activity::TeamMeeting => "Team Mtg",
            Activity::DisciplineMeeting => "Disc Mtg",
            Activity::Advisory => "Advisory",
            Activity::Elective => "Elective",
            Activity::Lunch => "Lunch",
            Activity::Free => "Free",
        }
    }

    /// Parses a grid label back into an activity.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.label() == label)
    }

    /// Teaching and meetings count toward the load-smoothing window.
    #[inline]
    pub fn is_intensive(self) -> bool {
        matches!(
            self,
            Activity::Teaching | Activity::TeamMeeting | Activity::DisciplineMeeting
        )
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
