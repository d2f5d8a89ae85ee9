//! Quota and policy parameters.
//!
//! Every numeric rule the compiler posts comes from [`Policy`]; nothing is
//! hardcoded in constraint code. Defaults are the reference school's
//! values. Missing configuration keys fall back to them field by field.

use serde::{Deserialize, Serialize};

/// Precedence between teaching and a synchronized discipline meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendancePolicy {
    /// Every member of the discipline group attends; nobody in the group
    /// teaches during the meeting.
    #[default]
    MeetingBlocksTeaching,
    /// Members teaching at that slot are excused; the rest attend.
    TeachingExempts,
}

/// Sliding-window cap on intensive periods (teaching or meetings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothingRule {
    /// Window length in teaching periods.
    pub window: u32,
    /// Most intensive periods allowed inside one window.
    pub max_intensive: u32,
}

impl Default for SmoothingRule {
    fn default() -> Self {
        Self {
            window: 4,
            max_intensive: 3,
        }
    }
}

/// Weekly quotas and policy switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Sessions per week of each full-frequency core subject, per class.
    pub core_sessions_per_week: u32,
    /// Sessions per week of the reduced-frequency subject, per class.
    pub reduced_sessions_per_week: u32,
    /// Literacy sessions per week for each roster class.
    pub literacy_sessions_per_week: u32,
    /// Literacy sessions per day for each roster class.
    pub literacy_max_per_day: u32,
    /// PE slots per week per team.
    pub pe_sessions_per_team: u32,
    /// Classes one PE teacher may instruct in the same slot.
    pub pe_concurrent_classes: u32,
    /// Minimum weekly class-coverings per PE teacher.
    pub pe_load_min: u32,
    /// Maximum weekly class-coverings per PE teacher.
    pub pe_load_max: u32,
    /// Team meetings per week per team.
    pub team_meetings_per_week: u32,
    /// Discipline meetings per week per subject group.
    pub discipline_meetings_per_week: u32,
    /// Discipline meetings allowed in the same slot across the school.
    pub max_concurrent_discipline_meetings: u32,
    /// Advisory periods per week per team.
    pub advisory_per_team: u32,
    /// Advisory labels per week per Core/Literacy teacher.
    pub advisory_per_teacher: u32,
    /// Advisory periods per day per team.
    pub advisory_max_per_day: u32,
    /// School-wide elective blocks per week (on distinct days).
    pub electives_per_week: u32,
    /// Elective labels a participating Core teacher holds per week.
    pub elective_participation: u32,
    /// Teaching vs discipline-meeting precedence.
    pub discipline_attendance: AttendancePolicy,
    /// Optional intensive-load window; `None` disables it.
    pub load_smoothing: Option<SmoothingRule>,
    /// Treat the Friday→Monday seam as a day boundary for anti-repetition.
    pub wrap_week_seam: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            core_sessions_per_week: 4,
            reduced_sessions_per_week: 3,
            literacy_sessions_per_week: 2,
            literacy_max_per_day: 1,
            pe_sessions_per_team: 3,
            pe_concurrent_classes: 2,
            pe_load_min: 15,
            pe_load_max: 25,
            team_meetings_per_week: 2,
            discipline_meetings_per_week: 1,
            max_concurrent_discipline_meetings: 1,
            advisory_per_team: 2,
            advisory_per_teacher: 2,
            advisory_max_per_day: 1,
            electives_per_week: 2,
            elective_participation: 2,
            discipline_attendance: AttendancePolicy::default(),
            load_smoothing: Some(SmoothingRule::default()),
            wrap_week_seam: true,
        }
    }
}

impl Policy {
    /// Weekly sessions for a core subject.
    #[inline]
    pub fn core_sessions(&self, reduced: bool) -> u32 {
        if reduced {
            self.reduced_sessions_per_week
        } else {
            self.core_sessions_per_week
        }
    }

    /// Policy with every synchronized event switched off.
    ///
    /// Leaves only staffing rules (lunch, prep, loads, PE), which keeps
    /// small test schools quick to solve.
    pub fn staffing_only() -> Self {
        Self {
            team_meetings_per_week: 0,
            discipline_meetings_per_week: 0,
            advisory_per_team: 0,
            advisory_per_teacher: 0,
            electives_per_week: 0,
            elective_participation: 0,
            load_smoothing: None,
            ..Self::default()
        }
    }
}
