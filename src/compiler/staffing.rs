//! Staffing families: lunch, prep, activity consistency, exclusivity,
//! anti-repetition, teaching loads, PE, load smoothing, pins.

use crate::cp::{BoolVar, Family, LinearExpr, Relation};
use crate::models::{Activity, ClassId, Role, Slot, TeacherId};

use super::{CompileError, Posting};

impl Posting<'_> {
    /// `Lunch` at every lunch slot and nowhere else.
    pub(super) fn post_lunch(&mut self) {
        let school = self.school;
        let slots = self.vars.slots.clone();
        for t in school.teacher_ids() {
            for &slot in &slots {
                let at_lunch = !school.week.is_teaching_slot(slot);
                let lit = self.is(t, slot, Activity::Lunch);
                self.model.fix(Family::Lunch, lit, at_lunch);
            }
        }
    }

    /// Exactly one `Prep` per teacher per day, on a teaching period.
    pub(super) fn post_prep(&mut self) {
        let school = self.school;
        for t in school.teacher_ids() {
            for plan in &school.week.days {
                let preps: Vec<BoolVar> = plan
                    .teaching_periods()
                    .into_iter()
                    .map(|p| self.is(t, Slot::new(plan.day, p), Activity::Prep))
                    .collect();
                self.model.add_sum(Family::Prep, preps, Relation::Eq, 1);
            }
        }
    }

    /// `Teaching` label ⇔ at least one lesson; other labels limited to
    /// the role's menu.
    pub(super) fn post_activity_consistency(&mut self) {
        let school = self.school;
        let teaching = self.vars.teaching_slots.clone();
        for t in school.teacher_ids() {
            let role = school.teachers[t.0].role();
            for &slot in &teaching {
                let label = self.is(t, slot, Activity::Teaching);
                let lessons = self.lessons(t, slot);
                if lessons.is_empty() {
                    self.model.fix(Family::ActivityConsistency, label, false);
                } else {
                    self.model.add_reified(
                        Family::ActivityConsistency,
                        label,
                        LinearExpr::sum(lessons),
                        Relation::Ge,
                        1,
                    );
                }

                for activity in Activity::ALL {
                    if activity != Activity::Lunch && !role.permits(activity) {
                        let lit = self.is(t, slot, activity);
                        self.model.fix(Family::ActivityConsistency, lit, false);
                    }
                }
            }
        }
    }

    /// One teacher per class per slot; one class per teacher per slot,
    /// except PE which may split a team session.
    pub(super) fn post_exclusivity(&mut self) {
        let school = self.school;
        let teaching = self.vars.teaching_slots.clone();

        for c in school.class_ids() {
            for &slot in &teaching {
                let covering: Vec<BoolVar> = school
                    .teacher_ids()
                    .filter_map(|t| self.vars.teaches(t, c, slot))
                    .collect();
                if covering.len() > 1 {
                    self.model.add_sum(Family::Exclusivity, covering, Relation::Le, 1);
                }
            }
        }

        for t in school.teacher_ids() {
            let capacity = match school.teachers[t.0].role() {
                Role::Pe => i64::from(school.policy.pe_concurrent_classes),
                Role::Core | Role::Literacy => 1,
            };
            for &slot in &teaching {
                let lessons = self.lessons(t, slot);
                if lessons.len() as i64 > capacity {
                    self.model.add_sum(Family::Exclusivity, lessons, Relation::Le, capacity);
                }
            }
        }
    }

    /// A `(teacher, class)` pair meets at most once a day, and never on
    /// both sides of a day boundary.
    pub(super) fn post_anti_repetition(&mut self) {
        let school = self.school;
        let seams = school.week.consecutive_days(school.policy.wrap_week_seam);

        for t in school.teacher_ids() {
            for c in school.eligible_classes(t) {
                for plan in &school.week.days {
                    let daily: Vec<BoolVar> = plan
                        .teaching_periods()
                        .into_iter()
                        .filter_map(|p| self.vars.teaches(t, c, Slot::new(plan.day, p)))
                        .collect();
                    if daily.len() > 1 {
                        self.model.add_sum(Family::AntiRepetition, daily, Relation::Le, 1);
                    }
                }

                for &(before, after) in &seams {
                    let last = school.week.plan(before).and_then(|d| d.last_teaching());
                    let first = school.week.plan(after).and_then(|d| d.first_teaching());
                    let (Some(last), Some(first)) = (last, first) else {
                        continue;
                    };
                    let pair = [
                        self.vars.teaches(t, c, Slot::new(before, last)),
                        self.vars.teaches(t, c, Slot::new(after, first)),
                    ];
                    if let [Some(a), Some(b)] = pair {
                        self.model.add_sum(Family::AntiRepetition, [a, b], Relation::Le, 1);
                    }
                }
            }
        }
    }

    /// Each Core teacher teaches every class of its team the subject's
    /// weekly number of sessions.
    pub(super) fn post_core_load(&mut self) {
        let school = self.school;
        for t in school.teacher_ids() {
            let Some(subject) = school.teachers[t.0].core_subject() else {
                continue;
            };
            let sessions = i64::from(school.weekly_sessions(subject));
            for c in school.eligible_classes(t) {
                let weekly = self.week_of(t, c);
                self.model.add_sum(Family::CoreLoad, weekly, Relation::Eq, sessions);
            }
        }
    }

    /// Weekly and daily Literacy sessions for each roster class.
    pub(super) fn post_literacy_load(&mut self) {
        let school = self.school;
        let weekly = i64::from(school.policy.literacy_sessions_per_week);
        let daily_cap = i64::from(school.policy.literacy_max_per_day);

        for t in school.teachers_with_role(Role::Literacy) {
            for c in school.eligible_classes(t) {
                let sessions = self.week_of(t, c);
                self.model.add_sum(Family::LiteracyLoad, sessions, Relation::Eq, weekly);

                for plan in &school.week.days {
                    let daily: Vec<BoolVar> = plan
                        .teaching_periods()
                        .into_iter()
                        .filter_map(|p| self.vars.teaches(t, c, Slot::new(plan.day, p)))
                        .collect();
                    self.model.add_sum(Family::LiteracyLoad, daily, Relation::Le, daily_cap);
                }
            }
        }
    }

    /// Team-wide PE sessions from the shared PE staff.
    pub(super) fn post_pe(&mut self) {
        let school = self.school;
        let policy = &school.policy;
        let pe_staff = school.teachers_with_role(Role::Pe);
        let teaching = self.vars.teaching_slots.clone();

        for team in &school.teams {
            let size = team.classes.len() as i64;
            let mut weekly = Vec::with_capacity(teaching.len());
            for &slot in &teaching {
                let Some(has_pe) = self.vars.team_has_pe(team.id, slot) else {
                    continue;
                };
                weekly.push(has_pe);

                // Σ coverings = |team| · TeamHasPE
                let mut coverings = LinearExpr::new();
                for &t in &pe_staff {
                    for &c in &team.classes {
                        if let Some(x) = self.vars.teaches(t, c, slot) {
                            coverings.push_bool(x, 1);
                            self.model.add_implies(Family::PeScheduling, x, has_pe);
                        }
                    }
                }
                coverings.push_bool(has_pe, -size);
                self.model.add(Family::PeScheduling, coverings, Relation::Eq, 0);
            }
            self.model.add_sum(
                Family::PeScheduling,
                weekly,
                Relation::Eq,
                i64::from(policy.pe_sessions_per_team),
            );
        }

        for &slot in &teaching {
            let teams: Vec<BoolVar> = school
                .teams
                .iter()
                .filter_map(|team| self.vars.team_has_pe(team.id, slot))
                .collect();
            if teams.len() > 1 {
                self.model.add_sum(Family::PeScheduling, teams, Relation::Le, 1);
            }
        }

        for &t in &pe_staff {
            let load = self.vars.lessons_of(t);
            self.model.add_sum(
                Family::PeScheduling,
                load.clone(),
                Relation::Ge,
                i64::from(policy.pe_load_min),
            );
            self.model.add_sum(
                Family::PeScheduling,
                load,
                Relation::Le,
                i64::from(policy.pe_load_max),
            );
        }
    }

    /// At most `max_intensive` intensive labels in any window of
    /// consecutive teaching periods of one day.
    pub(super) fn post_load_smoothing(&mut self) {
        let Some(rule) = self.school.policy.load_smoothing else {
            return;
        };
        let window = rule.window as usize;
        if window == 0 {
            return;
        }
        let school = self.school;
        let intensive: Vec<Activity> = Activity::ALL
            .into_iter()
            .filter(|a| a.is_intensive())
            .collect();

        for t in school.teacher_ids() {
            for plan in &school.week.days {
                let periods = plan.teaching_periods();
                for run in periods.windows(window) {
                    let mut expr = LinearExpr::new();
                    for &p in run {
                        for &activity in &intensive {
                            let lit = self.is(t, Slot::new(plan.day, p), activity);
                            expr.push_bool(lit, 1);
                        }
                    }
                    self.model.add(
                        Family::LoadSmoothing,
                        expr,
                        Relation::Le,
                        i64::from(rule.max_intensive),
                    );
                }
            }
        }
    }

    /// Forces pinned lessons.
    pub(super) fn post_pins(&mut self) -> Result<(), CompileError> {
        let school = self.school;
        for pin in &school.pins {
            let Some(x) = self.vars.teaches(pin.teacher, pin.class, pin.slot) else {
                return Err(CompileError::IneligiblePin {
                    teacher: school.teachers[pin.teacher.0].name.clone(),
                    class: school.classes[pin.class.0].name.clone(),
                    slot: pin.slot,
                });
            };
            self.model.fix(Family::Pin, x, true);
        }
        Ok(())
    }

    /// Every `TeachesClass` variable of one pair across the week.
    fn week_of(&self, teacher: TeacherId, class: ClassId) -> Vec<BoolVar> {
        self.vars
            .teaching_slots
            .iter()
            .filter_map(|&slot| self.vars.teaches(teacher, class, slot))
            .collect()
    }
}
