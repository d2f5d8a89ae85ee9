//! Teacher model.
//!
//! A teacher's [`Role`] decides which classes they may instruct and which
//! non-teaching labels they may hold. Role is an explicit tag carried by
//! the [`Post`]; it is never inferred from the teacher's name.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Activity, ClassId, SubjectId, TeamId};

/// Index of a teacher within a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeacherId(pub usize);

/// Teacher role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Teaches one core subject to the classes of one team.
    Core,
    /// Shared across teams; teaches a whole team at once.
    #[serde(rename = "PE")]
    Pe,
    /// Serves an explicit roster of classes across teams.
    Literacy,
}

impl Role {
    /// Parses a role tag (`Core`, `PE`, `Literacy`), case-insensitively.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "core" => Some(Role::Core),
            "pe" => Some(Role::Pe),
            "literacy" => Some(Role::Literacy),
            _ => None,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Role::Core => "Core",
            Role::Pe => "PE",
            Role::Literacy => "Literacy",
        }
    }

    /// Labels this role may hold while not teaching (lunch excluded).
    pub fn non_teaching_menu(self) -> &'static [Activity] {
        match self {
            Role::Core => &[
                Activity::Prep,
                Activity::TeamMeeting,
                Activity::DisciplineMeeting,
                Activity::Advisory,
                Activity::Elective,
                Activity::Free,
            ],
            Role::Pe => &[Activity::Prep, Activity::Free],
            Role::Literacy => &[
                Activity::Prep,
                Activity::DisciplineMeeting,
                Activity::Advisory,
                Activity::Elective,
                Activity::Free,
            ],
        }
    }

    /// Whether `activity` may appear in one of this role's teaching slots.
    pub fn permits(self, activity: Activity) -> bool {
        activity == Activity::Teaching || self.non_teaching_menu().contains(&activity)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a teacher is posted to teach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Post {
    /// One core subject for one team.
    Core {
        /// Team whose classes this teacher serves.
        team: TeamId,
        /// Subject taught.
        subject: SubjectId,
    },
    /// PE for every team.
    Pe,
    /// Literacy for the listed classes.
    Literacy {
        /// Classes this teacher may serve, in roster order.
        roster: Vec<ClassId>,
    },
}

/// A teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique display name (e.g. `Math_T1`).
    pub name: String,
    /// Teaching post.
    pub post: Post,
}

impl Teacher {
    /// Creates a Core teacher.
    pub fn core(name: impl Into<String>, team: TeamId, subject: SubjectId) -> Self {
        Self {
            name: name.into(),
            post: Post::Core { team, subject },
        }
    }

    /// Creates a PE teacher.
    pub fn pe(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            post: Post::Pe,
        }
    }

    /// Creates a Literacy teacher with an explicit roster.
    pub fn literacy(name: impl Into<String>, roster: Vec<ClassId>) -> Self {
        Self {
            name: name.into(),
            post: Post::Literacy { roster },
        }
    }

    /// Role derived from the post.
    pub fn role(&self) -> Role {
        match self.post {
            Post::Core { .. } => Role::Core,
            Post::Pe => Role::Pe,
            Post::Literacy { .. } => Role::Literacy,
        }
    }

    /// Home team of a Core teacher.
    pub fn core_team(&self) -> Option<TeamId> {
        match self.post {
            Post::Core { team, .. } => Some(team),
            _ => None,
        }
    }

    /// Subject of a Core teacher.
    pub fn core_subject(&self) -> Option<SubjectId> {
        match self.post {
            Post::Core { subject, .. } => Some(subject),
            _ => None,
        }
    }

    /// Roster of a Literacy teacher (empty for other roles).
    pub fn roster(&self) -> &[ClassId] {
        match &self.post {
            Post::Literacy { roster } => roster,
            _ => &[],
        }
    }
}
