//! Solution decoder.
//!
//! Turns a valuation of a compiled timetable into the two grids of a
//! [`Timetable`]: one row per (teacher, day, period) and one row per
//! (class, day, period). Decoding is a pure function of its inputs, so
//! decoding the same valuation twice yields identical rows.
//!
//! # Class grid
//!
//! | Condition (first match) | Cell |
//! |-------------------------|------|
//! | lunch period | `Lunch` |
//! | some teacher instructs the class | `Lesson` with subject and teacher |
//! | school elective block | `Elective`, teacher = representative |
//! | team advisory | `Advisory` |
//! | otherwise | `Free` |
//!
//! # Elective representatives
//! Electives carry no `TeachesClass` evidence. For display, the Core
//! teachers of a team who hold `Elective` in a slot are ordered by subject
//! position and take the team's classes in order, wrapping around when
//! there are more teachers than classes.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::compiler::DecisionVars;
use crate::cp::{CpModel, Valuation};
use crate::models::{
    Activity, ClassActivity, ClassId, ClassSlot, School, Slot, TeacherId, TeacherSlot, TeamId,
    Timetable,
};

/// A valuation that cannot be read back into a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No activity variable exists for a teacher slot.
    #[error("no activity variable for {teacher} at {slot}")]
    MissingVariable { teacher: String, slot: Slot },
    /// The activity value is not a known label.
    #[error("{teacher} at {slot} has unknown activity code {code}")]
    UnknownActivity {
        teacher: String,
        slot: Slot,
        code: i64,
    },
}

/// Decodes a valuation into teacher and class grids.
pub fn decode(
    school: &School,
    model: &CpModel,
    vars: &DecisionVars,
    valuation: &Valuation,
) -> Result<Timetable, DecodeError> {
    let mut labels: BTreeMap<(TeacherId, Slot), Activity> = BTreeMap::new();
    for t in school.teacher_ids() {
        for &slot in vars.slots() {
            labels.insert((t, slot), read_activity(school, model, vars, valuation, t, slot)?);
        }
    }

    let representatives = elective_representatives(school, vars, &labels);

    let mut timetable = Timetable::new();
    for t in school.teacher_ids() {
        for &slot in vars.slots() {
            let activity = labels.get(&(t, slot)).copied().unwrap_or(Activity::Free);
            timetable.teacher_rows.push(teacher_row(
                school,
                vars,
                valuation,
                &representatives,
                t,
                slot,
                activity,
            ));
        }
    }

    for c in school.class_ids() {
        for &slot in vars.slots() {
            timetable
                .class_rows
                .push(class_row(school, vars, valuation, &representatives, c, slot));
        }
    }

    Ok(timetable)
}

/// Assigns each elective participant of a team a class to display.
///
/// `participants` may be in any order; the result depends only on the
/// set. Teachers outside the team or without a core subject are ignored.
pub fn assign_representatives(
    school: &School,
    team: TeamId,
    participants: &[TeacherId],
) -> Vec<(TeacherId, ClassId)> {
    let classes = school.classes_of(team);
    if classes.is_empty() {
        return Vec::new();
    }
    let mut ordered: Vec<(usize, TeacherId)> = participants
        .iter()
        .filter_map(|&t| {
            let teacher = school.teacher(t)?;
            if teacher.core_team() != Some(team) {
                return None;
            }
            teacher.core_subject().map(|s| (s.0, t))
        })
        .collect();
    ordered.sort_unstable();
    ordered.dedup();

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (_, t))| (t, classes[i % classes.len()]))
        .collect()
}

/// Representative class per (teacher, slot) for every elective label.
fn elective_representatives(
    school: &School,
    vars: &DecisionVars,
    labels: &BTreeMap<(TeacherId, Slot), Activity>,
) -> BTreeMap<(TeacherId, Slot), ClassId> {
    let mut out = BTreeMap::new();
    for &slot in vars.teaching_slots() {
        for team in &school.teams {
            let participants: Vec<TeacherId> = school
                .core_teachers_of(team.id)
                .into_iter()
                .filter(|&t| labels.get(&(t, slot)) == Some(&Activity::Elective))
                .collect();
            for (t, c) in assign_representatives(school, team.id, &participants) {
                out.insert((t, slot), c);
            }
        }
    }
    out
}

fn read_activity(
    school: &School,
    model: &CpModel,
    vars: &DecisionVars,
    valuation: &Valuation,
    teacher: TeacherId,
    slot: Slot,
) -> Result<Activity, DecodeError> {
    let name = || school.teachers[teacher.0].name.clone();
    let var = vars
        .activity(teacher, slot)
        .ok_or_else(|| DecodeError::MissingVariable {
            teacher: name(),
            slot,
        })?;

    // Value literals are authoritative; the integer column is a fallback.
    let code = model
        .int_var(var)
        .and_then(|info| {
            info.value_literals()
                .find(|&(_, lit)| valuation.bool(lit))
                .map(|(value, _)| value)
        })
        .unwrap_or_else(|| valuation.int(var));

    Activity::from_code(code).ok_or_else(|| DecodeError::UnknownActivity {
        teacher: name(),
        slot,
        code,
    })
}

fn teacher_row(
    school: &School,
    vars: &DecisionVars,
    valuation: &Valuation,
    representatives: &BTreeMap<(TeacherId, Slot), ClassId>,
    t: TeacherId,
    slot: Slot,
    activity: Activity,
) -> TeacherSlot {
    let name = school.teachers[t.0].name.clone();
    let class_name = |c: ClassId| school.classes[c.0].name.clone();

    let (classes, subject, note) = match activity {
        Activity::Teaching => {
            let taught: Vec<String> = vars
                .teaching_at(t, slot)
                .iter()
                .filter(|&&(_, x)| valuation.bool(x))
                .map(|&(c, _)| class_name(c))
                .collect();
            (taught, school.subject_label(t).to_string(), String::new())
        }
        Activity::TeamMeeting => {
            let note = school
                .teams_of(t)
                .into_iter()
                .find(|&team| vars.team_meeting(team, slot).is_some_and(|v| valuation.bool(v)))
                .map(|team| format!("{team} meeting"))
                .unwrap_or_default();
            (Vec::new(), String::new(), note)
        }
        Activity::DisciplineMeeting => {
            let note = school
                .discipline_of(t)
                .map(|group| format!("{} discipline meeting", school.discipline_name(group)))
                .unwrap_or_default();
            (Vec::new(), String::new(), note)
        }
        Activity::Advisory => {
            let note = school
                .teams_of(t)
                .into_iter()
                .find(|&team| vars.team_advisory(team, slot).is_some_and(|v| valuation.bool(v)))
                .map(|team| format!("{team} advisory"))
                .unwrap_or_default();
            (Vec::new(), String::new(), note)
        }
        Activity::Elective => match representatives.get(&(t, slot)) {
            Some(&c) => (
                vec![class_name(c)],
                school.subject_label(t).to_string(),
                "representative class".to_string(),
            ),
            None => (Vec::new(), String::new(), String::new()),
        },
        Activity::Prep | Activity::Lunch | Activity::Free => {
            (Vec::new(), String::new(), String::new())
        }
    };

    TeacherSlot {
        teacher: name,
        day: slot.day,
        period: slot.period,
        activity,
        classes,
        subject,
        note,
    }
}

fn class_row(
    school: &School,
    vars: &DecisionVars,
    valuation: &Valuation,
    representatives: &BTreeMap<(TeacherId, Slot), ClassId>,
    c: ClassId,
    slot: Slot,
) -> ClassSlot {
    let class = &school.classes[c.0];
    let row = |activity: ClassActivity, subject: String, teacher: Option<String>| ClassSlot {
        class: class.name.clone(),
        day: slot.day,
        period: slot.period,
        activity,
        subject,
        teacher,
        team: class.team,
    };

    if !school.week.is_teaching_slot(slot) {
        return row(ClassActivity::Lunch, String::new(), None);
    }

    let lesson = school
        .teacher_ids()
        .find(|&t| vars.teaches(t, c, slot).is_some_and(|x| valuation.bool(x)));
    if let Some(t) = lesson {
        return row(
            ClassActivity::Lesson,
            school.subject_label(t).to_string(),
            Some(school.teachers[t.0].name.clone()),
        );
    }

    if vars.school_elective(slot).is_some_and(|v| valuation.bool(v)) {
        let shown = representatives
            .iter()
            .find(|(&(_, s), &rep)| s == slot && rep == c)
            .map(|(&(t, _), _)| school.teachers[t.0].name.clone());
        return row(ClassActivity::Elective, String::new(), shown);
    }

    if vars
        .team_advisory(class.team, slot)
        .is_some_and(|v| valuation.bool(v))
    {
        return row(ClassActivity::Advisory, String::new(), None);
    }

    row(ClassActivity::Free, String::new(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fixtures::{small_school, SmallPlan};
    use crate::compiler::{CompiledTimetable, TimetableCpBuilder};
    use crate::models::Day;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn decode_plan(plan: &SmallPlan) -> (School, CompiledTimetable, Timetable) {
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let valuation = plan.valuation(&school, &compiled);
        let timetable = decode(&school, &compiled.model, &compiled.vars, &valuation).unwrap();
        (school, compiled, timetable)
    }

    #[test]
    fn test_grid_sizes() {
        let (_, _, timetable) = decode_plan(&SmallPlan::reference());
        // 4 teachers × 15 slots, 2 classes × 15 slots
        assert_eq!(timetable.teacher_rows.len(), 60);
        assert_eq!(timetable.class_rows.len(), 30);
    }

    #[test]
    fn test_teacher_grid() {
        let (_, _, tt) = decode_plan(&SmallPlan::reference());

        let row = tt.teacher_at("Math_T1", Slot::new(Day::Monday, 3)).unwrap();
        assert_eq!(row.activity, Activity::Teaching);
        assert_eq!(row.classes, vec!["A".to_string()]);
        assert_eq!(row.subject, "Math");

        let row = tt.teacher_at("PE_T1", Slot::new(Day::Monday, 1)).unwrap();
        assert_eq!(row.classes, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(row.subject, "PE");

        let row = tt.teacher_at("Art_T1", Slot::new(Day::Monday, 1)).unwrap();
        assert_eq!(row.activity, Activity::TeamMeeting);
        assert_eq!(row.note, "Team 1 meeting");

        let row = tt.teacher_at("Lit_T1", Slot::new(Day::Tuesday, 4)).unwrap();
        assert_eq!(row.activity, Activity::DisciplineMeeting);
        assert_eq!(row.note, "Literacy discipline meeting");

        let row = tt.teacher_at("Lit_T1", Slot::new(Day::Wednesday, 5)).unwrap();
        assert_eq!(row.note, "Team 1 advisory");

        for name in ["Math_T1", "Art_T1", "PE_T1", "Lit_T1"] {
            assert_eq!(tt.activity_count(name, Activity::Lunch), 3);
            assert_eq!(tt.activity_count(name, Activity::Prep), 3);
        }
    }

    #[test]
    fn test_class_grid() {
        let (_, _, tt) = decode_plan(&SmallPlan::reference());

        let cell = tt.class_at("A", Slot::new(Day::Monday, 1)).unwrap();
        assert_eq!(cell.activity, ClassActivity::Lesson);
        assert_eq!(cell.display(), "PE");
        assert_eq!(cell.teacher.as_deref(), Some("PE_T1"));

        let cell = tt.class_at("A", Slot::new(Day::Tuesday, 5)).unwrap();
        assert_eq!(cell.display(), "Literacy");

        let cell = tt.class_at("B", Slot::new(Day::Monday, 2)).unwrap();
        assert_eq!(cell.activity, ClassActivity::Lunch);

        let cell = tt.class_at("B", Slot::new(Day::Wednesday, 5)).unwrap();
        assert_eq!(cell.activity, ClassActivity::Advisory);

        // elective block with no participants
        let cell = tt.class_at("A", Slot::new(Day::Wednesday, 3)).unwrap();
        assert_eq!(cell.activity, ClassActivity::Elective);
        assert_eq!(cell.teacher, None);

        let cell = tt.class_at("B", Slot::new(Day::Tuesday, 3)).unwrap();
        assert_eq!(cell.activity, ClassActivity::Free);
        assert_eq!(cell.team, TeamId(1));
    }

    #[test]
    fn test_elective_representatives_displayed() {
        let mut plan = SmallPlan::reference();
        let w3 = Slot::new(Day::Wednesday, 3);
        plan.participants = vec!["Math_T1".into(), "Art_T1".into()];
        plan.set("Math_T1", w3, Activity::Elective, &[]);
        plan.set("Math_T1", Slot::new(Day::Wednesday, 4), Activity::Prep, &[]);
        plan.set("Art_T1", w3, Activity::Elective, &[]);
        plan.set("Art_T1", Slot::new(Day::Wednesday, 1), Activity::Prep, &[]);

        let (_, compiled, tt) = decode_plan(&plan);
        let school = small_school();
        let valuation = plan.valuation(&school, &compiled);
        assert!(compiled.model.check(&valuation).is_empty());

        let math = tt.teacher_at("Math_T1", w3).unwrap();
        assert_eq!(math.classes, vec!["A".to_string()]);
        assert_eq!(math.note, "representative class");
        let art = tt.teacher_at("Art_T1", w3).unwrap();
        assert_eq!(art.classes, vec!["B".to_string()]);

        assert_eq!(tt.class_at("A", w3).unwrap().teacher.as_deref(), Some("Math_T1"));
        assert_eq!(tt.class_at("B", w3).unwrap().teacher.as_deref(), Some("Art_T1"));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let valuation = SmallPlan::reference().valuation(&school, &compiled);

        let first = decode(&school, &compiled.model, &compiled.vars, &valuation).unwrap();
        let second = decode(&school, &compiled.model, &compiled.vars, &valuation).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_representatives_ignore_input_order() {
        let school = crate::reference::reference_school().unwrap();
        let team = TeamId(2);
        let core = school.core_teachers_of(team);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let mut participants: Vec<TeacherId> = core
                .iter()
                .copied()
                .filter(|_| rng.random_bool(0.6))
                .collect();
            let expected = assign_representatives(&school, team, &participants);
            participants.shuffle(&mut rng);
            assert_eq!(assign_representatives(&school, team, &participants), expected);
        }
    }

    #[test]
    fn test_representatives_wrap_around_classes() {
        let school = crate::reference::reference_school().unwrap();
        let team = TeamId(1);
        let core = school.core_teachers_of(team);
        assert_eq!(core.len(), 5);

        let reps = assign_representatives(&school, team, &core);
        let classes = school.classes_of(team);
        assert_eq!(reps.len(), 5);
        assert_eq!(reps[0].1, classes[0]);
        assert_eq!(reps[3].1, classes[3]);
        assert_eq!(reps[4].1, classes[0]);

        // other teams' teachers are ignored
        let foreign = school.core_teachers_of(TeamId(3));
        assert!(assign_representatives(&school, team, &foreign).is_empty());
    }

    #[test]
    fn test_unknown_activity_code() {
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let valuation = Valuation::new(Vec::new(), vec![99; compiled.model.int_count()]);
        let err = decode(&school, &compiled.model, &compiled.vars, &valuation).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownActivity { code: 99, .. }));
    }
}
