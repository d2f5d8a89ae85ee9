//! The school: everything one solve run is compiled from.
//!
//! Index sets (teams, classes, teachers, subjects) are data on the
//! [`School`]; lookups go through it rather than through naming
//! conventions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{
    ClassId, Policy, Post, Role, SchoolClass, Slot, Subject, SubjectId, Teacher, TeacherId, Team,
    TeamId, Week,
};

/// Label used for the Literacy discipline group and Literacy lessons.
pub const LITERACY: &str = "Literacy";

/// Label used for PE lessons.
pub const PE: &str = "PE";

/// A forced lesson: `teacher` instructs `class` at `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    /// Instructing teacher.
    pub teacher: TeacherId,
    /// Instructed class.
    pub class: ClassId,
    /// When.
    pub slot: Slot,
}

/// A group of teachers that holds a discipline meeting together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Discipline {
    /// Core teachers of one subject across all teams.
    Subject(SubjectId),
    /// All Literacy teachers.
    Literacy,
}

/// A complete school configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    /// Days and periods.
    pub week: Week,
    /// Core subjects, in configured order.
    pub subjects: Vec<Subject>,
    /// Teams, sorted by number.
    pub teams: Vec<Team>,
    /// Classes, in configured order.
    pub classes: Vec<SchoolClass>,
    /// Active teachers, in configured order.
    pub teachers: Vec<Teacher>,
    /// Quotas and policy switches.
    pub policy: Policy,
    /// Forced lessons.
    pub pins: Vec<Pin>,
}

impl School {
    /// Creates a school with no members and the default policy.
    pub fn new(week: Week) -> Self {
        Self {
            week,
            subjects: Vec::new(),
            teams: Vec::new(),
            classes: Vec::new(),
            teachers: Vec::new(),
            policy: Policy::default(),
            pins: Vec::new(),
        }
    }

    /// Adds a core subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a class, creating its team on first use.
    pub fn with_class(mut self, name: impl Into<String>, team: TeamId) -> Self {
        let id = ClassId(self.classes.len());
        self.classes.push(SchoolClass::new(name, team));
        match self.teams.iter_mut().find(|t| t.id == team) {
            Some(t) => t.classes.push(id),
            None => {
                self.teams.push(Team {
                    id: team,
                    classes: vec![id],
                });
                self.teams.sort_by_key(|t| t.id);
            }
        }
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Replaces the policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Adds a forced lesson.
    pub fn with_pin(mut self, pin: Pin) -> Self {
        self.pins.push(pin);
        self
    }

    // ---- lookups ----

    /// Teacher by id.
    pub fn teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.get(id.0)
    }

    /// Class by id.
    pub fn class(&self, id: ClassId) -> Option<&SchoolClass> {
        self.classes.get(id.0)
    }

    /// Subject by id.
    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(id.0)
    }

    /// Team by number.
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Teacher id by name.
    pub fn teacher_id(&self, name: &str) -> Option<TeacherId> {
        self.teachers.iter().position(|t| t.name == name).map(TeacherId)
    }

    /// Class id by name.
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.classes.iter().position(|c| c.name == name).map(ClassId)
    }

    /// Subject id by name.
    pub fn subject_id(&self, name: &str) -> Option<SubjectId> {
        self.subjects.iter().position(|s| s.name == name).map(SubjectId)
    }

    /// All teacher ids in order.
    pub fn teacher_ids(&self) -> impl Iterator<Item = TeacherId> {
        (0..self.teachers.len()).map(TeacherId)
    }

    /// All class ids in order.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId)
    }

    /// Classes of a team (empty for unknown teams).
    pub fn classes_of(&self, team: TeamId) -> &[ClassId] {
        self.team(team).map(|t| t.classes.as_slice()).unwrap_or(&[])
    }

    /// Teachers holding a role, in order.
    pub fn teachers_with_role(&self, role: Role) -> Vec<TeacherId> {
        self.teacher_ids()
            .filter(|&t| self.teachers[t.0].role() == role)
            .collect()
    }

    /// Core teachers of a team, in order.
    pub fn core_teachers_of(&self, team: TeamId) -> Vec<TeacherId> {
        self.teacher_ids()
            .filter(|&t| self.teachers[t.0].core_team() == Some(team))
            .collect()
    }

    /// The Core teacher posted to `(team, subject)`, if any.
    pub fn core_teacher(&self, team: TeamId, subject: SubjectId) -> Option<TeacherId> {
        self.teacher_ids().find(|&t| {
            let teacher = &self.teachers[t.0];
            teacher.core_team() == Some(team) && teacher.core_subject() == Some(subject)
        })
    }

    /// Classes a teacher may ever instruct.
    pub fn eligible_classes(&self, id: TeacherId) -> Vec<ClassId> {
        match self.teacher(id).map(|t| t.role()) {
            Some(Role::Core) => self
                .teacher(id)
                .and_then(|t| t.core_team())
                .map(|team| self.classes_of(team).to_vec())
                .unwrap_or_default(),
            Some(Role::Pe) => self.class_ids().collect(),
            Some(Role::Literacy) => self
                .teacher(id)
                .map(|t| t.roster().to_vec())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Teams whose synchronized events concern a teacher.
    ///
    /// Core: the home team. Literacy: every team on the roster.
    /// PE: every team.
    pub fn teams_of(&self, id: TeacherId) -> Vec<TeamId> {
        let Some(teacher) = self.teacher(id) else {
            return Vec::new();
        };
        match teacher.role() {
            Role::Core => teacher.core_team().into_iter().collect(),
            Role::Pe => self.teams.iter().map(|t| t.id).collect(),
            Role::Literacy => teacher
                .roster()
                .iter()
                .filter_map(|&c| self.class(c).map(|c| c.team))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }

    /// Discipline group of a teacher (PE teachers have none).
    pub fn discipline_of(&self, id: TeacherId) -> Option<Discipline> {
        let teacher = self.teacher(id)?;
        match teacher.role() {
            Role::Core => teacher.core_subject().map(Discipline::Subject),
            Role::Literacy => Some(Discipline::Literacy),
            Role::Pe => None,
        }
    }

    /// Discipline groups with at least one member: core subjects in
    /// order, then Literacy.
    pub fn disciplines(&self) -> Vec<Discipline> {
        (0..self.subjects.len())
            .map(|s| Discipline::Subject(SubjectId(s)))
            .chain(std::iter::once(Discipline::Literacy))
            .filter(|&d| !self.discipline_members(d).is_empty())
            .collect()
    }

    /// Members of a discipline group, in order.
    pub fn discipline_members(&self, discipline: Discipline) -> Vec<TeacherId> {
        self.teacher_ids()
            .filter(|&t| self.discipline_of(t) == Some(discipline))
            .collect()
    }

    /// Display name of a discipline group.
    pub fn discipline_name(&self, discipline: Discipline) -> &str {
        match discipline {
            Discipline::Subject(s) => self.subject(s).map(|s| s.name.as_str()).unwrap_or(""),
            Discipline::Literacy => LITERACY,
        }
    }

    /// Subject label of a teacher's lessons (`Math`, `PE`, `Literacy`).
    pub fn subject_label(&self, id: TeacherId) -> &str {
        match self.teacher(id).map(|t| &t.post) {
            Some(Post::Core { subject, .. }) => self
                .subject(*subject)
                .map(|s| s.name.as_str())
                .unwrap_or(""),
            Some(Post::Pe) => PE,
            Some(Post::Literacy { .. }) => LITERACY,
            None => "",
        }
    }

    /// Weekly sessions of a core subject under the school policy.
    pub fn weekly_sessions(&self, subject: SubjectId) -> u32 {
        let reduced = self.subject(subject).map(|s| s.reduced).unwrap_or(false);
        self.policy.core_sessions(reduced)
    }
}
