//! Timetable audit.
//!
//! Re-checks a decoded [`Timetable`] against the school's rules, working
//! from the rows alone (no model, no valuation), and reports staffing
//! loads. A timetable decoded from an accepted solution audits clean;
//! the audit exists to catch decoder and backend defects before rows are
//! published.
//!
//! # Checks
//!
//! | Family | Property |
//! |--------|----------|
//! | Prep | exactly one `Prep` per teacher per day |
//! | Lunch | `Lunch` exactly on lunch periods |
//! | Exclusivity | at most one teacher per class per slot |
//! | CoreLoad | weekly sessions per (Core teacher, class) |
//! | LiteracyLoad | roster only; weekly and daily sessions |
//! | PeScheduling | one team at a time; weekly sessions per team |
//! | TeamMeeting | weekly count, not on adjacent days, only during PE |
//! | DisciplineMeeting | weekly count per group, concurrency cap |
//! | Advisory | weekly labels per non-PE teacher |
//! | Elective | weekly blocks on distinct days; participation 0 or full |
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Teaching load | teaching periods per teacher per week |
//! | Free periods | `Free` periods per teacher per week |
//! | Avg teaching load | mean teaching load over teachers |

use std::collections::{BTreeMap, BTreeSet};

use crate::cp::Family;
use crate::models::{
    Activity, ClassActivity, Day, Role, School, Slot, TeacherSlot, TeamId, Timetable,
};

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditViolation {
    /// Rule family the check belongs to.
    pub family: Family,
    /// Human-readable description.
    pub message: String,
}

/// Audit result.
#[derive(Debug, Clone)]
pub struct TimetableAudit {
    /// Failed checks, in check order.
    pub violations: Vec<AuditViolation>,
    /// Teaching periods per teacher.
    pub teaching_load: BTreeMap<String, usize>,
    /// `Free` periods per teacher.
    pub free_periods: BTreeMap<String, usize>,
    /// Mean teaching load.
    pub avg_teaching_load: f64,
}

impl TimetableAudit {
    /// Audits a timetable against a school.
    pub fn calculate(school: &School, timetable: &Timetable) -> Self {
        let mut audit = Auditor::new(school, timetable);
        audit.check_lunch_and_prep();
        audit.check_exclusivity();
        audit.check_core_load();
        audit.check_literacy_load();
        audit.check_pe();
        audit.check_team_meetings();
        audit.check_discipline_meetings();
        audit.check_advisory();
        audit.check_electives();

        let mut teaching_load = BTreeMap::new();
        let mut free_periods = BTreeMap::new();
        for teacher in &school.teachers {
            let name = teacher.name.clone();
            teaching_load.insert(name.clone(), timetable.activity_count(&name, Activity::Teaching));
            free_periods.insert(name.clone(), timetable.activity_count(&name, Activity::Free));
        }
        let avg_teaching_load = if teaching_load.is_empty() {
            0.0
        } else {
            teaching_load.values().sum::<usize>() as f64 / teaching_load.len() as f64
        };

        Self {
            violations: audit.violations,
            teaching_load,
            free_periods,
            avg_teaching_load,
        }
    }

    /// Whether every check passed.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one family.
    pub fn violations_in(&self, family: Family) -> impl Iterator<Item = &AuditViolation> {
        self.violations.iter().filter(move |v| v.family == family)
    }
}

struct Auditor<'a> {
    school: &'a School,
    timetable: &'a Timetable,
    rows: BTreeMap<(&'a str, Slot), &'a TeacherSlot>,
    violations: Vec<AuditViolation>,
}

impl<'a> Auditor<'a> {
    fn new(school: &'a School, timetable: &'a Timetable) -> Self {
        let rows = timetable
            .teacher_rows
            .iter()
            .map(|r| ((r.teacher.as_str(), r.slot()), r))
            .collect();
        Self {
            school,
            timetable,
            rows,
            violations: Vec::new(),
        }
    }

    fn fail(&mut self, family: Family, message: String) {
        self.violations.push(AuditViolation { family, message });
    }

    fn activity(&self, teacher: &str, slot: Slot) -> Option<Activity> {
        self.rows.get(&(teacher, slot)).map(|r| r.activity)
    }

    fn taught(&self, teacher: &str, slot: Slot) -> &'a [String] {
        match self.rows.get(&(teacher, slot)) {
            Some(&row) if row.activity == Activity::Teaching => &row.classes,
            _ => &[],
        }
    }

    /// Slots where any of `teachers` shows `activity`.
    fn event_slots(&self, teachers: &[&str], activity: Activity) -> BTreeSet<Slot> {
        self.school
            .week
            .teaching_slots()
            .into_iter()
            .filter(|&s| teachers.iter().any(|t| self.activity(t, s) == Some(activity)))
            .collect()
    }

    fn names(&self, role: Role) -> Vec<&'a str> {
        let school: &'a School = self.school;
        school
            .teachers_with_role(role)
            .into_iter()
            .map(|t| school.teachers[t.0].name.as_str())
            .collect()
    }

    fn check_lunch_and_prep(&mut self) {
        let school = self.school;
        for teacher in &school.teachers {
            for plan in &school.week.days {
                let mut preps = 0;
                for &p in &plan.periods {
                    let slot = Slot::new(plan.day, p);
                    let activity = self.activity(&teacher.name, slot);
                    let is_lunch = activity == Some(Activity::Lunch);
                    if plan.is_lunch(p) != is_lunch {
                        self.fail(
                            Family::Lunch,
                            format!("{} at {slot}: {activity:?}", teacher.name),
                        );
                    }
                    if activity == Some(Activity::Prep) {
                        preps += 1;
                    }
                }
                if preps != 1 {
                    self.fail(
                        Family::Prep,
                        format!("{} has {preps} prep periods on {}", teacher.name, plan.day),
                    );
                }
            }
        }
    }

    fn check_exclusivity(&mut self) {
        let mut seen: BTreeMap<(&str, Slot), &str> = BTreeMap::new();
        let mut clashes = Vec::new();
        for row in &self.timetable.teacher_rows {
            if row.activity != Activity::Teaching {
                continue;
            }
            for class in &row.classes {
                if let Some(other) = seen.insert((class.as_str(), row.slot()), &row.teacher) {
                    clashes.push(format!(
                        "{class} at {} taught by {other} and {}",
                        row.slot(),
                        row.teacher
                    ));
                }
            }
        }
        for message in clashes {
            self.fail(Family::Exclusivity, message);
        }
    }

    fn count_sessions(&self, teacher: &str, class: &str, day: Option<Day>) -> usize {
        self.school
            .week
            .teaching_slots()
            .into_iter()
            .filter(|s| day.map_or(true, |d| s.day == d))
            .filter(|&s| self.taught(teacher, s).iter().any(|c| c == class))
            .count()
    }

    fn check_core_load(&mut self) {
        let school = self.school;
        for t in school.teachers_with_role(Role::Core) {
            let teacher = &school.teachers[t.0];
            let Some(subject) = teacher.core_subject() else {
                continue;
            };
            let expected = school.weekly_sessions(subject) as usize;
            for c in school.eligible_classes(t) {
                let class = &school.classes[c.0].name;
                let actual = self.count_sessions(&teacher.name, class, None);
                if actual != expected {
                    self.fail(
                        Family::CoreLoad,
                        format!("{} teaches {class} {actual}×, expected {expected}", teacher.name),
                    );
                }
            }
        }
    }

    fn check_literacy_load(&mut self) {
        let school = self.school;
        let policy = &school.policy;
        for t in school.teachers_with_role(Role::Literacy) {
            let teacher = &school.teachers[t.0];
            let roster: BTreeSet<&str> = teacher
                .roster()
                .iter()
                .map(|c| school.classes[c.0].name.as_str())
                .collect();

            for class in &school.classes {
                let weekly = self.count_sessions(&teacher.name, &class.name, None);
                if !roster.contains(class.name.as_str()) {
                    if weekly > 0 {
                        self.fail(
                            Family::LiteracyLoad,
                            format!("{} teaches off-roster class {}", teacher.name, class.name),
                        );
                    }
                    continue;
                }
                if weekly != policy.literacy_sessions_per_week as usize {
                    self.fail(
                        Family::LiteracyLoad,
                        format!("{} teaches {} {weekly}× per week", teacher.name, class.name),
                    );
                }
                for plan in &school.week.days {
                    let daily = self.count_sessions(&teacher.name, &class.name, Some(plan.day));
                    if daily > policy.literacy_max_per_day as usize {
                        self.fail(
                            Family::LiteracyLoad,
                            format!("{} teaches {} {daily}× on {}", teacher.name, class.name, plan.day),
                        );
                    }
                }
            }
        }
    }

    /// Teams in PE per slot, from the PE teachers' rows.
    fn pe_teams(&self) -> BTreeMap<Slot, BTreeSet<TeamId>> {
        let school = self.school;
        let mut out: BTreeMap<Slot, BTreeSet<TeamId>> = BTreeMap::new();
        for name in self.names(Role::Pe) {
            for slot in school.week.teaching_slots() {
                for class in self.taught(name, slot) {
                    if let Some(c) = school.class_id(class) {
                        out.entry(slot).or_default().insert(school.classes[c.0].team);
                    }
                }
            }
        }
        out
    }

    fn check_pe(&mut self) {
        let school = self.school;
        let pe = self.pe_teams();
        let mut weekly: BTreeMap<TeamId, usize> = BTreeMap::new();
        for (slot, teams) in &pe {
            if teams.len() > 1 {
                self.fail(Family::PeScheduling, format!("{} teams in PE at {slot}", teams.len()));
            }
            for &team in teams {
                *weekly.entry(team).or_insert(0) += 1;
            }
        }
        for team in &school.teams {
            let count = weekly.get(&team.id).copied().unwrap_or(0);
            if count != school.policy.pe_sessions_per_team as usize {
                self.fail(Family::PeScheduling, format!("{} has {count} PE slots", team.id));
            }
        }
    }

    fn check_team_meetings(&mut self) {
        let school = self.school;
        let pe = self.pe_teams();
        for team in &school.teams {
            let core: Vec<&str> = school
                .core_teachers_of(team.id)
                .into_iter()
                .map(|t| school.teachers[t.0].name.as_str())
                .collect();
            let meetings = self.event_slots(&core, Activity::TeamMeeting);

            if meetings.len() != school.policy.team_meetings_per_week as usize {
                self.fail(
                    Family::TeamMeeting,
                    format!("{} has {} meetings", team.id, meetings.len()),
                );
            }
            for &slot in &meetings {
                if !pe.get(&slot).is_some_and(|teams| teams.contains(&team.id)) {
                    self.fail(Family::TeamMeeting, format!("{} meets outside PE at {slot}", team.id));
                }
            }
            let days: BTreeSet<Day> = meetings.iter().map(|s| s.day).collect();
            for (a, b) in school.week.adjacent_days() {
                if days.contains(&a) && days.contains(&b) {
                    self.fail(Family::TeamMeeting, format!("{} meets on {a} and {b}", team.id));
                }
            }
        }
    }

    fn check_discipline_meetings(&mut self) {
        let school = self.school;
        let mut per_slot: BTreeMap<Slot, usize> = BTreeMap::new();
        for group in school.disciplines() {
            let members: Vec<&str> = school
                .discipline_members(group)
                .into_iter()
                .map(|t| school.teachers[t.0].name.as_str())
                .collect();
            let meetings = self.event_slots(&members, Activity::DisciplineMeeting);
            if meetings.len() != school.policy.discipline_meetings_per_week as usize {
                self.fail(
                    Family::DisciplineMeeting,
                    format!(
                        "{} has {} discipline meetings",
                        school.discipline_name(group),
                        meetings.len()
                    ),
                );
            }
            for slot in meetings {
                *per_slot.entry(slot).or_insert(0) += 1;
            }
        }
        let cap = school.policy.max_concurrent_discipline_meetings as usize;
        for (slot, count) in per_slot {
            if count > cap {
                self.fail(
                    Family::DisciplineMeeting,
                    format!("{count} discipline meetings at {slot}"),
                );
            }
        }
    }

    fn check_advisory(&mut self) {
        let school = self.school;
        let expected = school.policy.advisory_per_teacher as usize;
        for teacher in &school.teachers {
            let count = self.timetable.activity_count(&teacher.name, Activity::Advisory);
            let ok = match teacher.role() {
                Role::Pe => count == 0,
                Role::Core | Role::Literacy => count == expected,
            };
            if !ok {
                self.fail(
                    Family::Advisory,
                    format!("{} holds {count} advisory periods", teacher.name),
                );
            }
        }
    }

    fn check_electives(&mut self) {
        let school = self.school;
        let policy = &school.policy;
        let blocks: BTreeSet<Slot> = self
            .timetable
            .class_rows
            .iter()
            .filter(|r| r.activity == ClassActivity::Elective)
            .map(|r| r.slot())
            .collect();
        if blocks.len() != policy.electives_per_week as usize {
            self.fail(Family::Elective, format!("{} elective blocks", blocks.len()));
        }
        let days: BTreeSet<Day> = blocks.iter().map(|s| s.day).collect();
        if days.len() != blocks.len() {
            self.fail(Family::Elective, "two elective blocks share a day".into());
        }

        let full = policy.elective_participation as usize;
        for teacher in &school.teachers {
            let count = self.timetable.activity_count(&teacher.name, Activity::Elective);
            let ok = match teacher.role() {
                Role::Core => count == 0 || count == full,
                Role::Pe | Role::Literacy => count == 0,
            };
            if !ok {
                self.fail(
                    Family::Elective,
                    format!("{} holds {count} elective periods", teacher.name),
                );
            }
        }
    }
}
