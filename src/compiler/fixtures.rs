//! Test schools shared by compiler, decoder and runner tests.

use std::collections::BTreeMap;

use super::CompiledTimetable;
use crate::adapter::SchoolRecords;
use crate::config::SchoolConfig;
use crate::cp::Valuation;
use crate::models::{
    Activity, AttendancePolicy, ClassId, Day, Discipline, Policy, School, Slot, Subject, SubjectId,
    Teacher, TeamId, Week,
};
use crate::store::{ClassRecord, TeacherRecord};

/// Two days of three periods, lunch at 2; one team of two classes, one
/// subject, one PE teacher. Staffing rules only.
pub(crate) fn micro_school() -> School {
    let policy = Policy {
        core_sessions_per_week: 1,
        pe_sessions_per_team: 1,
        pe_load_min: 0,
        pe_load_max: 2,
        ..Policy::staffing_only()
    };
    School::new(Week::uniform(&[Day::Monday, Day::Tuesday], 3, 2))
        .with_subject(Subject::new("Math"))
        .with_class("A", TeamId(1))
        .with_class("B", TeamId(1))
        .with_teacher(Teacher::core("Math_T1", TeamId(1), SubjectId(0)))
        .with_teacher(Teacher::pe("PE_T1"))
        .with_policy(policy)
}

/// Store rows describing [`micro_school`].
pub(crate) fn micro_records() -> SchoolRecords {
    let config = SchoolConfig {
        periods_per_day: vec![(Day::Monday, 3), (Day::Tuesday, 3)],
        lunch_period: 2,
        core_subjects: vec!["Math".to_string()],
        reduced_subject: None,
        policy: micro_school().policy,
    };
    SchoolRecords {
        config: config.to_entries(),
        teachers: vec![
            TeacherRecord::core("Math_T1", "Math", 1),
            TeacherRecord::pe("PE_T1"),
        ],
        classes: vec![ClassRecord::new("A", 1), ClassRecord::new("B", 1)],
        pins: Vec::new(),
    }
}

/// Three days of five periods, lunch at 2; one team of two classes, a
/// full and a reduced subject, PE and a Literacy teacher serving class
/// A. Every event family is on at quota 1.
pub(crate) fn small_school() -> School {
    let policy = Policy {
        core_sessions_per_week: 2,
        reduced_sessions_per_week: 1,
        literacy_sessions_per_week: 1,
        literacy_max_per_day: 1,
        pe_sessions_per_team: 1,
        pe_concurrent_classes: 2,
        pe_load_min: 2,
        pe_load_max: 2,
        team_meetings_per_week: 1,
        discipline_meetings_per_week: 1,
        max_concurrent_discipline_meetings: 1,
        advisory_per_team: 1,
        advisory_per_teacher: 1,
        advisory_max_per_day: 1,
        electives_per_week: 1,
        elective_participation: 1,
        discipline_attendance: AttendancePolicy::MeetingBlocksTeaching,
        load_smoothing: None,
        wrap_week_seam: true,
    };
    School::new(Week::uniform(&[Day::Monday, Day::Tuesday, Day::Wednesday], 5, 2))
        .with_subject(Subject::new("Math"))
        .with_subject(Subject::reduced("Art"))
        .with_class("A", TeamId(1))
        .with_class("B", TeamId(1))
        .with_teacher(Teacher::core("Math_T1", TeamId(1), SubjectId(0)))
        .with_teacher(Teacher::core("Art_T1", TeamId(1), SubjectId(1)))
        .with_teacher(Teacher::pe("PE_T1"))
        .with_teacher(Teacher::literacy("Lit_T1", vec![ClassId(0)]))
        .with_policy(policy)
}

fn slot(day: Day, period: u32) -> Slot {
    Slot::new(day, period)
}

/// A hand-built assignment for [`small_school`].
///
/// Unlisted teaching slots are `Free`; lunch slots are `Lunch`.
#[derive(Debug, Clone)]
pub(crate) struct SmallPlan {
    labels: BTreeMap<(String, Slot), (Activity, Vec<String>)>,
    pub(crate) pe: Vec<Slot>,
    pub(crate) meetings: Vec<Slot>,
    pub(crate) advisory: Vec<Slot>,
    pub(crate) discipline: Vec<(Discipline, Slot)>,
    pub(crate) electives: Vec<Slot>,
    pub(crate) participants: Vec<String>,
}

impl SmallPlan {
    /// A plan that satisfies every family of [`small_school`].
    pub(crate) fn reference() -> Self {
        use Activity::*;
        use Day::*;

        let mut plan = Self {
            labels: BTreeMap::new(),
            pe: vec![slot(Monday, 1)],
            meetings: vec![slot(Monday, 1)],
            advisory: vec![slot(Wednesday, 5)],
            discipline: vec![
                (Discipline::Subject(SubjectId(0)), slot(Tuesday, 5)),
                (Discipline::Subject(SubjectId(1)), slot(Wednesday, 4)),
                (Discipline::Literacy, slot(Tuesday, 4)),
            ],
            electives: vec![slot(Wednesday, 3)],
            participants: Vec::new(),
        };

        plan.set("Math_T1", slot(Monday, 1), TeamMeeting, &[]);
        plan.set("Math_T1", slot(Monday, 3), Teaching, &["A"]);
        plan.set("Math_T1", slot(Monday, 4), Prep, &[]);
        plan.set("Math_T1", slot(Tuesday, 1), Teaching, &["B"]);
        plan.set("Math_T1", slot(Tuesday, 3), Teaching, &["A"]);
        plan.set("Math_T1", slot(Tuesday, 4), Prep, &[]);
        plan.set("Math_T1", slot(Tuesday, 5), DisciplineMeeting, &[]);
        plan.set("Math_T1", slot(Wednesday, 1), Teaching, &["B"]);
        plan.set("Math_T1", slot(Wednesday, 3), Prep, &[]);
        plan.set("Math_T1", slot(Wednesday, 5), Advisory, &[]);

        plan.set("Art_T1", slot(Monday, 1), TeamMeeting, &[]);
        plan.set("Art_T1", slot(Monday, 3), Prep, &[]);
        plan.set("Art_T1", slot(Monday, 4), Teaching, &["A"]);
        plan.set("Art_T1", slot(Monday, 5), Teaching, &["B"]);
        plan.set("Art_T1", slot(Tuesday, 1), Prep, &[]);
        plan.set("Art_T1", slot(Wednesday, 3), Prep, &[]);
        plan.set("Art_T1", slot(Wednesday, 4), DisciplineMeeting, &[]);
        plan.set("Art_T1", slot(Wednesday, 5), Advisory, &[]);

        plan.set("PE_T1", slot(Monday, 1), Teaching, &["A", "B"]);
        plan.set("PE_T1", slot(Monday, 3), Prep, &[]);
        plan.set("PE_T1", slot(Tuesday, 1), Prep, &[]);
        plan.set("PE_T1", slot(Wednesday, 1), Prep, &[]);

        plan.set("Lit_T1", slot(Monday, 1), Prep, &[]);
        plan.set("Lit_T1", slot(Tuesday, 1), Prep, &[]);
        plan.set("Lit_T1", slot(Tuesday, 4), DisciplineMeeting, &[]);
        plan.set("Lit_T1", slot(Tuesday, 5), Teaching, &["A"]);
        plan.set("Lit_T1", slot(Wednesday, 1), Prep, &[]);
        plan.set("Lit_T1", slot(Wednesday, 5), Advisory, &[]);

        plan
    }

    /// Overrides one teacher slot.
    pub(crate) fn set(&mut self, teacher: &str, at: Slot, activity: Activity, classes: &[&str]) {
        self.labels.insert(
            (teacher.to_string(), at),
            (activity, classes.iter().map(|c| c.to_string()).collect()),
        );
    }

    /// Writes the plan into a valuation of `compiled`.
    pub(crate) fn valuation(&self, school: &School, compiled: &CompiledTimetable) -> Valuation {
        let model = &compiled.model;
        let vars = &compiled.vars;
        let mut valuation = Valuation::zeroed(model);
        let team = TeamId(1);

        for t in school.teacher_ids() {
            let name = &school.teachers[t.0].name;
            for &at in vars.slots() {
                let (activity, classes) = if school.week.is_teaching_slot(at) {
                    self.labels
                        .get(&(name.clone(), at))
                        .cloned()
                        .unwrap_or((Activity::Free, Vec::new()))
                } else {
                    (Activity::Lunch, Vec::new())
                };
                if let Some(var) = vars.activity(t, at) {
                    valuation.set_int(model, var, activity.code());
                }
                for class in classes {
                    let c = school.class_id(&class).expect("class in plan");
                    let x = vars.teaches(t, c, at).expect("eligible lesson in plan");
                    valuation.set_bool(x, true);
                }
            }
        }

        for &at in &self.pe {
            valuation.set_bool(vars.team_has_pe(team, at).expect("pe var"), true);
        }
        for &at in &self.meetings {
            valuation.set_bool(vars.team_meeting(team, at).expect("meeting var"), true);
        }
        for &at in &self.advisory {
            valuation.set_bool(vars.team_advisory(team, at).expect("advisory var"), true);
        }
        for &(group, at) in &self.discipline {
            valuation.set_bool(vars.discipline_meeting(group, at).expect("discipline var"), true);
        }
        for &at in &self.electives {
            valuation.set_bool(vars.school_elective(at).expect("elective var"), true);
        }
        for name in &self.participants {
            let t = school.teacher_id(name).expect("participant");
            valuation.set_bool(vars.has_elective(t).expect("core participant"), true);
        }
        valuation
    }
}
