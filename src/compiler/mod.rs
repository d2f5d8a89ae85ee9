//! Timetable constraint compiler.
//!
//! Translates a [`School`] into a [`CpModel`]: declares the decision
//! variables, then posts each constraint family under its own
//! [`Family`] tag. The compiler is backend-agnostic; solving goes through
//! any [`CpSolver`].
//!
//! # Variables
//! - `TeacherActivity[t, slot]`: integer over [`Activity`] codes, every
//!   slot including lunch
//! - `TeachesClass[t, c, slot]`: boolean, teaching slots and eligible
//!   `(t, c)` pairs only (Core: own team, PE: all, Literacy: roster)
//! - synchronization booleans: `TeamHasPE`, `TeamMeeting`,
//!   `TeamAdvisory`, `DisciplineMeeting`, `SchoolElective`
//!
//! # Families
//! Staffing rules live in `staffing`, synchronized events in `events`.
//! Posting order is teachers, then days, then periods, then classes, so
//! identical schools compile to identical models.
//!
//! # Reference
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Post et al. (2012), "XHSTT: an XML archive for high school timetabling problems"

mod events;
mod staffing;
mod vars;

pub use vars::DecisionVars;

use thiserror::Error;
use tracing::{debug, info};

use crate::cp::{BoolVar, CpModel, CpSolution, CpSolver, SolverConfig};
use crate::decoder::{decode, DecodeError};
use crate::models::{Activity, Post, School, Slot, TeacherId, Timetable};

/// A school that cannot be turned into a model.
///
/// These are construction defects (dangling indices, impossible pins),
/// not infeasibility: construction stops before any solver is called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A teacher's post names a team with no classes.
    #[error("teacher {teacher} references unknown team {team}")]
    UnknownTeam { teacher: String, team: u32 },
    /// A Core post names a subject index outside the subject list.
    #[error("teacher {teacher} references unknown subject #{subject}")]
    UnknownSubject { teacher: String, subject: usize },
    /// A roster or pin names a class index outside the class list.
    #[error("{owner} references unknown class #{class}")]
    UnknownClass { owner: String, class: usize },
    /// A pin names a teacher index outside the teacher list.
    #[error("pin references unknown teacher #{teacher}")]
    UnknownTeacher { teacher: usize },
    /// A pin asks for a lesson that has no `TeachesClass` variable.
    #[error("pin {teacher} → {class} at {slot} is not an eligible lesson")]
    IneligiblePin {
        teacher: String,
        class: String,
        slot: Slot,
    },
    /// The week has no teaching periods.
    #[error("the week has no teaching periods")]
    EmptyWeek,
}

/// A model together with the variables that index it.
#[derive(Debug, Clone)]
pub struct CompiledTimetable {
    /// The constraint model.
    pub model: CpModel,
    /// Variable tables.
    pub vars: DecisionVars,
}

impl CompiledTimetable {
    /// Decodes a solution of this model.
    pub fn decode(&self, school: &School, solution: &CpSolution) -> Result<Option<Timetable>, DecodeError> {
        match &solution.valuation {
            Some(valuation) if solution.status.has_solution() => {
                decode(school, &self.model, &self.vars, valuation).map(Some)
            }
            _ => Ok(None),
        }
    }
}

/// Builds a timetable model from a school.
///
/// # Example
/// ```no_run
/// use u_timetable::compiler::TimetableCpBuilder;
/// use u_timetable::cp::{PumpkinSolver, SolverConfig};
/// use u_timetable::reference::reference_school;
///
/// let school = reference_school().unwrap();
/// let builder = TimetableCpBuilder::new(&school);
/// let (timetable, solution) = builder
///     .solve(&PumpkinSolver::new(), &SolverConfig::default())
///     .unwrap();
/// println!("{} {:?}", solution.status, timetable.map(|t| t.teacher_rows.len()));
/// ```
pub struct TimetableCpBuilder<'a> {
    school: &'a School,
}

impl<'a> TimetableCpBuilder<'a> {
    /// Creates a builder for a school.
    pub fn new(school: &'a School) -> Self {
        Self { school }
    }

    /// Declares all variables and posts every constraint family.
    pub fn build(&self) -> Result<CompiledTimetable, CompileError> {
        self.check_references()?;

        let mut posting = Posting::new(self.school);
        posting.declare()?;

        posting.post_lunch();
        posting.post_prep();
        posting.post_activity_consistency();
        posting.post_exclusivity();
        posting.post_anti_repetition();
        posting.post_core_load();
        posting.post_literacy_load();
        posting.post_pe();
        posting.post_team_meetings();
        posting.post_discipline_meetings();
        posting.post_advisory();
        posting.post_electives();
        posting.post_load_smoothing();
        posting.post_pins()?;

        let Posting { model, vars, .. } = posting;
        info!(
            teachers = self.school.teachers.len(),
            classes = self.school.classes.len(),
            bools = model.bool_count(),
            ints = model.int_count(),
            teaches = vars.teaches_count(),
            sync = vars.sync_count(),
            constraints = model.constraint_count(),
            "compiled timetable model"
        );
        for (family, count) in model.family_counts() {
            debug!(family = family.name(), count, "constraint family");
        }

        Ok(CompiledTimetable { model, vars })
    }

    /// Builds, solves, and decodes.
    ///
    /// The timetable is `None` unless the backend found a solution.
    pub fn solve<S: CpSolver>(
        &self,
        solver: &S,
        config: &SolverConfig,
    ) -> Result<(Option<Timetable>, CpSolution), BuildError> {
        let compiled = self.build()?;
        let solution = solver.solve(&compiled.model, config);
        let timetable = compiled.decode(self.school, &solution)?;
        Ok((timetable, solution))
    }

    /// Rejects dangling indices before any variable is declared.
    fn check_references(&self) -> Result<(), CompileError> {
        let school = self.school;
        if school.week.teaching_slots().is_empty() {
            return Err(CompileError::EmptyWeek);
        }
        for teacher in &school.teachers {
            match &teacher.post {
                Post::Core { team, subject } => {
                    if school.classes_of(*team).is_empty() {
                        return Err(CompileError::UnknownTeam {
                            teacher: teacher.name.clone(),
                            team: team.0,
                        });
                    }
                    if school.subject(*subject).is_none() {
                        return Err(CompileError::UnknownSubject {
                            teacher: teacher.name.clone(),
                            subject: subject.0,
                        });
                    }
                }
                Post::Literacy { roster } => {
                    if let Some(bad) = roster.iter().find(|c| school.class(**c).is_none()) {
                        return Err(CompileError::UnknownClass {
                            owner: teacher.name.clone(),
                            class: bad.0,
                        });
                    }
                }
                Post::Pe => {}
            }
        }
        for pin in &school.pins {
            if school.teacher(pin.teacher).is_none() {
                return Err(CompileError::UnknownTeacher {
                    teacher: pin.teacher.0,
                });
            }
            if school.class(pin.class).is_none() {
                return Err(CompileError::UnknownClass {
                    owner: "pin".into(),
                    class: pin.class.0,
                });
            }
        }
        Ok(())
    }
}

/// Failure of [`TimetableCpBuilder::solve`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Mutable state while posting families.
pub(crate) struct Posting<'a> {
    school: &'a School,
    model: CpModel,
    vars: DecisionVars,
}

impl<'a> Posting<'a> {
    fn new(school: &'a School) -> Self {
        Self {
            school,
            model: CpModel::new("timetable"),
            vars: DecisionVars::default(),
        }
    }

    /// Literal for `TeacherActivity[teacher, slot] == activity`.
    fn is(&mut self, teacher: TeacherId, slot: Slot, activity: Activity) -> BoolVar {
        match self.vars.activity(teacher, slot) {
            Some(var) => self.model.reify_eq(var, activity.code()),
            None => self.model.constant_false(),
        }
    }

    /// `TeachesClass` variables of a teacher at a slot.
    fn lessons(&self, teacher: TeacherId, slot: Slot) -> Vec<BoolVar> {
        self.vars
            .teaching_at(teacher, slot)
            .iter()
            .map(|&(_, v)| v)
            .collect()
    }

    /// Declares every decision variable.
    fn declare(&mut self) -> Result<(), CompileError> {
        let school = self.school;
        self.vars.slots = school.week.slots();
        self.vars.teaching_slots = school.week.teaching_slots();
        let slots = self.vars.slots.clone();
        let teaching = self.vars.teaching_slots.clone();

        for t in school.teacher_ids() {
            let name = &school.teachers[t.0].name;
            for &slot in &slots {
                let var = self.model.new_int(
                    format!("activity[{name}][{slot}]"),
                    Activity::ALL.iter().map(|a| a.code()),
                );
                self.vars.activity.insert((t, slot), var);
            }
        }

        for t in school.teacher_ids() {
            let name = &school.teachers[t.0].name;
            for c in school.eligible_classes(t) {
                let class = &school.classes[c.0].name;
                for &slot in &teaching {
                    let var = self.model.new_bool(format!("teaches[{name}][{class}][{slot}]"));
                    self.vars.insert_lesson(t, c, slot, var);
                }
            }
        }

        for team in &school.teams {
            for &slot in &teaching {
                let pe = self.model.new_bool(format!("team_pe[{}][{slot}]", team.id.0));
                let meeting = self.model.new_bool(format!("team_meeting[{}][{slot}]", team.id.0));
                let advisory = self.model.new_bool(format!("team_advisory[{}][{slot}]", team.id.0));
                self.vars.team_pe.insert((team.id, slot), pe);
                self.vars.team_meeting.insert((team.id, slot), meeting);
                self.vars.team_advisory.insert((team.id, slot), advisory);
            }
        }

        for group in school.disciplines() {
            let name = school.discipline_name(group).to_string();
            for &slot in &teaching {
                let var = self.model.new_bool(format!("discipline[{name}][{slot}]"));
                self.vars.discipline.insert((group, slot), var);
            }
        }

        for &slot in &teaching {
            let var = self.model.new_bool(format!("elective[{slot}]"));
            self.vars.elective.insert(slot, var);
        }

        for t in school.teacher_ids() {
            if school.teachers[t.0].core_team().is_some() {
                let name = &school.teachers[t.0].name;
                let var = self.model.new_bool(format!("has_elective[{name}]"));
                self.vars.has_elective.insert(t, var);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::{micro_school, small_school, SmallPlan};
    use super::*;
    use crate::cp::{Family, PumpkinSolver, SolveStatus};
    use crate::models::{AttendancePolicy, ClassId, Day, Pin, Role, SmoothingRule, TeamId};
    use std::time::Duration;

    #[test]
    fn test_build_variable_counts() {
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let vars = &compiled.vars;

        // 3 days × 5 periods, lunch at 2
        assert_eq!(vars.slots().len(), 15);
        assert_eq!(vars.teaching_slots().len(), 12);
        // 4 teachers × 15 slots
        assert_eq!(compiled.model.int_count(), 60);
        // Math 2 + Art 2 + PE 2 + Literacy 1 eligible classes, 12 slots each
        assert_eq!(vars.teaches_count(), 7 * 12);
        // pe/meeting/advisory for 1 team, 3 discipline groups, electives
        assert_eq!(vars.sync_count(), 12 * (3 + 3 + 1));
        assert!(vars.has_elective(TeacherId(0)).is_some());
        assert!(vars.has_elective(TeacherId(2)).is_none());
    }

    #[test]
    fn test_no_teaching_variables_at_lunch() {
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let lunch = Slot::new(Day::Monday, 2);
        for t in school.teacher_ids() {
            assert!(compiled.vars.activity(t, lunch).is_some());
            assert!(compiled.vars.teaching_at(t, lunch).is_empty());
        }
        assert!(compiled.vars.team_has_pe(TeamId(1), lunch).is_none());
    }

    #[test]
    fn test_off_roster_pairs_have_no_variable() {
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let lit = school.teacher_id("Lit_T1").unwrap();
        let b = school.class_id("B").unwrap();
        for &slot in compiled.vars.teaching_slots() {
            assert!(compiled.vars.teaches(lit, b, slot).is_none());
        }
    }

    #[test]
    fn test_every_family_posted() {
        let school = small_school().with_pin(Pin {
            teacher: TeacherId(0),
            class: ClassId(0),
            slot: Slot::new(Day::Monday, 3),
        });
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let counts = compiled.model.family_counts();
        for family in Family::ALL {
            if family == Family::LoadSmoothing {
                continue;
            }
            assert!(counts.get(&family).copied().unwrap_or(0) > 0, "{} missing", family.name());
        }
        // smoothing is switched off in the small school policy
        assert_eq!(compiled.model.count_in(Family::LoadSmoothing), 0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let school = small_school();
        let a = TimetableCpBuilder::new(&school).build().unwrap();
        let b = TimetableCpBuilder::new(&school).build().unwrap();
        assert_eq!(a.model.constraints(), b.model.constraints());
        assert_eq!(a.model.bool_count(), b.model.bool_count());
    }

    #[test]
    fn test_hand_built_plan_satisfies_model() {
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let valuation = SmallPlan::reference().valuation(&school, &compiled);
        let violations = compiled.model.check(&valuation);
        assert!(violations.is_empty(), "{violations:?}");
    }

    fn violations_in(school: &School, plan: &SmallPlan) -> Vec<Family> {
        let compiled = TimetableCpBuilder::new(school).build().unwrap();
        let valuation = plan.valuation(school, &compiled);
        compiled
            .model
            .check(&valuation)
            .into_iter()
            .map(|v| v.family)
            .collect()
    }

    fn violated_families_in(school: &School, plan: &SmallPlan) -> Vec<Family> {
        let mut families = violations_in(school, plan);
        families.dedup();
        families
    }

    fn violated_families(plan: &SmallPlan) -> Vec<Family> {
        violated_families_in(&small_school(), plan)
    }

    #[test]
    fn test_missing_prep_violates_prep_only() {
        let mut plan = SmallPlan::reference();
        plan.set("Math_T1", Slot::new(Day::Monday, 4), Activity::Free, &[]);
        assert_eq!(violated_families(&plan), vec![Family::Prep]);
    }

    #[test]
    fn test_skipped_team_meeting_violates_team_meeting() {
        let mut plan = SmallPlan::reference();
        plan.set("Art_T1", Slot::new(Day::Monday, 1), Activity::Free, &[]);
        assert_eq!(violated_families(&plan), vec![Family::TeamMeeting]);
    }

    #[test]
    fn test_partial_elective_participation_rejected() {
        let mut plan = SmallPlan::reference();
        plan.participants.push("Math_T1".into());
        assert_eq!(violated_families(&plan), vec![Family::Elective]);

        // joining the block repairs it
        plan.set("Math_T1", Slot::new(Day::Wednesday, 3), Activity::Elective, &[]);
        plan.set("Math_T1", Slot::new(Day::Wednesday, 4), Activity::Prep, &[]);
        assert!(violated_families(&plan).is_empty());
    }

    #[test]
    fn test_second_teacher_in_class_violates_exclusivity() {
        let mut plan = SmallPlan::reference();
        // Art joins Math in class A on Monday P3 instead of prepping
        plan.set("Art_T1", Slot::new(Day::Monday, 3), Activity::Teaching, &["A"]);
        plan.set("Art_T1", Slot::new(Day::Monday, 4), Activity::Prep, &[]);
        plan.set("Art_T1", Slot::new(Day::Monday, 5), Activity::Teaching, &["B"]);
        let families = violated_families(&plan);
        assert!(families.contains(&Family::Exclusivity), "{families:?}");
    }

    #[test]
    fn test_lesson_across_day_seam_violates_anti_repetition() {
        let mut plan = SmallPlan::reference();
        // Math_T1 takes B last on Monday and again first on Tuesday;
        // Art_T1 moves its B lesson into the freed Wednesday slot
        plan.set("Math_T1", Slot::new(Day::Monday, 5), Activity::Teaching, &["B"]);
        plan.set("Math_T1", Slot::new(Day::Wednesday, 1), Activity::Free, &[]);
        plan.set("Art_T1", Slot::new(Day::Monday, 5), Activity::Free, &[]);
        plan.set("Art_T1", Slot::new(Day::Wednesday, 1), Activity::Teaching, &["B"]);
        assert_eq!(violated_families(&plan), vec![Family::AntiRepetition]);

        // Monday/Tuesday is an inner seam; wrapping does not matter
        let mut school = small_school();
        school.policy.wrap_week_seam = false;
        assert_eq!(
            violated_families_in(&school, &plan),
            vec![Family::AntiRepetition]
        );
    }

    #[test]
    fn test_teaching_exempts_member_from_discipline_meeting() {
        let mut plan = SmallPlan::reference();
        // Art_T1 teaches B during the Art group meeting on Wednesday P4
        plan.set("Art_T1", Slot::new(Day::Monday, 5), Activity::Free, &[]);
        plan.set("Art_T1", Slot::new(Day::Wednesday, 4), Activity::Teaching, &["B"]);

        let mut school = small_school();
        assert_eq!(
            violated_families_in(&school, &plan),
            vec![Family::DisciplineMeeting]
        );

        school.policy.discipline_attendance = AttendancePolicy::TeachingExempts;
        assert!(violated_families_in(&school, &plan).is_empty());

        // neither teaching nor attending is still a violation
        plan.set("Art_T1", Slot::new(Day::Wednesday, 4), Activity::Free, &[]);
        plan.set("Art_T1", Slot::new(Day::Monday, 5), Activity::Teaching, &["B"]);
        assert_eq!(
            violated_families_in(&school, &plan),
            vec![Family::DisciplineMeeting]
        );
    }

    #[test]
    fn test_load_smoothing_window() {
        let plan = SmallPlan::reference();
        let mut school = small_school();

        // 4 teaching periods a day leave 2 windows of 3, per teacher and day
        school.policy.load_smoothing = Some(SmoothingRule {
            window: 3,
            max_intensive: 2,
        });
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        assert_eq!(compiled.model.count_in(Family::LoadSmoothing), 4 * 3 * 2);
        assert!(violated_families_in(&school, &plan).is_empty());

        // Math_T1 meets and then teaches inside Monday's first window
        school.policy.load_smoothing = Some(SmoothingRule {
            window: 3,
            max_intensive: 1,
        });
        assert_eq!(
            violated_families_in(&school, &plan),
            vec![Family::LoadSmoothing]
        );
    }

    #[test]
    fn test_literacy_daily_cap() {
        let plan = SmallPlan::reference();
        let mut school = small_school();
        school.policy.literacy_max_per_day = 0;

        // only Tuesday carries a Literacy lesson
        let violations = violations_in(&school, &plan);
        assert_eq!(violations, vec![Family::LiteracyLoad]);

        school.policy.literacy_max_per_day = 1;
        assert!(violations_in(&school, &plan).is_empty());
    }

    #[test]
    fn test_teaching_at_follows_slot() {
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let pe = school.teacher_id("PE_T1").unwrap();
        let slot = Slot::new(Day::Tuesday, 4);
        let lessons = compiled.vars.teaching_at(pe, slot);
        let classes: Vec<ClassId> = lessons.iter().map(|&(c, _)| c).collect();
        assert_eq!(classes, vec![ClassId(0), ClassId(1)]);
        for &(c, var) in lessons {
            assert_eq!(compiled.vars.teaches(pe, c, slot), Some(var));
        }
    }

    #[test]
    fn test_literacy_pin_outside_roster_rejected() {
        let school = small_school();
        let lit = school.teacher_id("Lit_T1").unwrap();
        let b = school.class_id("B").unwrap();
        let school = school.with_pin(Pin {
            teacher: lit,
            class: b,
            slot: Slot::new(Day::Tuesday, 3),
        });

        let err = TimetableCpBuilder::new(&school).build().unwrap_err();
        assert!(matches!(err, CompileError::IneligiblePin { .. }));
        assert_eq!(school.teachers[lit.0].role(), Role::Literacy);
    }

    #[test]
    fn test_pin_at_lunch_rejected() {
        let school = small_school().with_pin(Pin {
            teacher: TeacherId(0),
            class: ClassId(0),
            slot: Slot::new(Day::Monday, 2),
        });
        assert!(matches!(
            TimetableCpBuilder::new(&school).build(),
            Err(CompileError::IneligiblePin { .. })
        ));
    }

    #[test]
    fn test_dangling_references_rejected() {
        let school = small_school().with_pin(Pin {
            teacher: TeacherId(42),
            class: ClassId(0),
            slot: Slot::new(Day::Monday, 1),
        });
        assert_eq!(
            TimetableCpBuilder::new(&school).build().unwrap_err(),
            CompileError::UnknownTeacher { teacher: 42 }
        );

        let mut school = small_school();
        school.teachers[0] = crate::models::Teacher::core("Ghost", TeamId(7), crate::models::SubjectId(0));
        assert!(matches!(
            TimetableCpBuilder::new(&school).build(),
            Err(CompileError::UnknownTeam { team: 7, .. })
        ));
    }

    #[test]
    fn test_micro_school_solves() {
        let school = micro_school();
        let config = SolverConfig::default().with_time_budget(Duration::from_secs(120));
        let (timetable, solution) = TimetableCpBuilder::new(&school)
            .solve(&PumpkinSolver::new(), &config)
            .unwrap();

        assert!(solution.status.has_solution(), "status {}", solution.status);
        let timetable = timetable.unwrap();
        // 2 teachers × 6 slots, 2 classes × 6 slots
        assert_eq!(timetable.teacher_rows.len(), 12);
        assert_eq!(timetable.class_rows.len(), 12);
    }

    #[test]
    fn test_small_school_solves() {
        // every event family is on
        let school = small_school();
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let config = SolverConfig::default().with_time_budget(Duration::from_secs(120));
        let solution = PumpkinSolver::new().solve(&compiled.model, &config);
        assert!(solution.status.has_solution(), "status {}", solution.status);
        let valuation = solution.valuation.as_ref().unwrap();
        assert!(compiled.model.check(valuation).is_empty());

        let timetable = compiled.decode(&school, &solution).unwrap().unwrap();
        assert_eq!(timetable.activity_count("Lit_T1", Activity::Teaching), 1);
        assert_eq!(timetable.activity_count("Math_T1", Activity::TeamMeeting), 1);
        assert_eq!(timetable.activity_count("Art_T1", Activity::DisciplineMeeting), 1);
    }

    #[test]
    fn test_infeasible_quota_detected() {
        let mut school = micro_school();
        // three Math sessions per class cannot fit two teaching slots a day
        // minus one prep on two days
        school.policy.core_sessions_per_week = 3;
        let config = SolverConfig::default().with_time_budget(Duration::from_secs(120));
        let compiled = TimetableCpBuilder::new(&school).build().unwrap();
        let solution = PumpkinSolver::new().solve(&compiled.model, &config);
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }
}
