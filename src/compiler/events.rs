//! Synchronized events: team meetings, discipline meetings, advisory,
//! electives.
//!
//! Each event is one boolean per slot (per team, per discipline group,
//! or school-wide). Teacher labels follow the event: a synchronized
//! label may only appear while the event is on for one of the teacher's
//! teams or groups.

use crate::cp::{BoolVar, Family, LinearExpr, Relation};
use crate::models::{Activity, AttendancePolicy, Day, Role, Slot, TeacherId, TeamId};

use super::{DecisionVars, Posting};

impl Posting<'_> {
    /// Team meetings ride on PE slots; every Core teacher of the team attends.
    pub(super) fn post_team_meetings(&mut self) {
        let school = self.school;
        let weekly = i64::from(school.policy.team_meetings_per_week);
        let adjacent = school.week.adjacent_days();
        let teaching = self.vars.teaching_slots.clone();

        for team in &school.teams {
            let core = school.core_teachers_of(team.id);
            let mut all = Vec::new();
            for &slot in &teaching {
                let (Some(meeting), Some(has_pe)) = (
                    self.vars.team_meeting(team.id, slot),
                    self.vars.team_has_pe(team.id, slot),
                ) else {
                    continue;
                };
                all.push(meeting);
                self.model.add_implies(Family::TeamMeeting, meeting, has_pe);
                for &t in &core {
                    let label = self.is(t, slot, Activity::TeamMeeting);
                    self.model.add_equal(Family::TeamMeeting, label, meeting);
                }
            }
            self.model.add_sum(Family::TeamMeeting, all, Relation::Eq, weekly);

            for plan in &school.week.days {
                let daily = self.team_events_on(team.id, plan.day, |v, t, s| v.team_meeting(t, s));
                if daily.len() > 1 {
                    self.model.add_sum(Family::TeamMeeting, daily, Relation::Le, 1);
                }
            }
            for &(a, b) in &adjacent {
                let mut pair = self.team_events_on(team.id, a, |v, t, s| v.team_meeting(t, s));
                pair.extend(self.team_events_on(team.id, b, |v, t, s| v.team_meeting(t, s)));
                self.model.add_sum(Family::TeamMeeting, pair, Relation::Le, 1);
            }
        }

        // Core teachers are tied to their own team above; nobody else may
        // hold the label.
        for t in school.teacher_ids() {
            if school.teachers[t.0].role() == Role::Core {
                continue;
            }
            for &slot in &teaching {
                let label = self.is(t, slot, Activity::TeamMeeting);
                self.model.fix(Family::TeamMeeting, label, false);
            }
        }
    }

    /// One meeting per discipline group per week, few at a time.
    pub(super) fn post_discipline_meetings(&mut self) {
        let school = self.school;
        let policy = &school.policy;
        let teaching = self.vars.teaching_slots.clone();
        let groups = school.disciplines();

        for &group in &groups {
            let members = school.discipline_members(group);
            let mut weekly = Vec::with_capacity(teaching.len());
            for &slot in &teaching {
                let Some(meeting) = self.vars.discipline_meeting(group, slot) else {
                    continue;
                };
                weekly.push(meeting);
                for &t in &members {
                    let label = self.is(t, slot, Activity::DisciplineMeeting);
                    match policy.discipline_attendance {
                        AttendancePolicy::MeetingBlocksTeaching => {
                            self.model.add_equal(Family::DisciplineMeeting, label, meeting);
                        }
                        AttendancePolicy::TeachingExempts => {
                            let teaching = self.is(t, slot, Activity::Teaching);
                            self.model.add_enforced(
                                Family::DisciplineMeeting,
                                meeting,
                                LinearExpr::sum([label, teaching]),
                                Relation::Ge,
                                1,
                            );
                            self.model.add_implies(Family::DisciplineMeeting, label, meeting);
                        }
                    }
                }
            }
            self.model.add_sum(
                Family::DisciplineMeeting,
                weekly,
                Relation::Eq,
                i64::from(policy.discipline_meetings_per_week),
            );
        }

        for &slot in &teaching {
            let concurrent: Vec<BoolVar> = groups
                .iter()
                .filter_map(|&g| self.vars.discipline_meeting(g, slot))
                .collect();
            let cap = i64::from(policy.max_concurrent_discipline_meetings);
            if concurrent.len() as i64 > cap {
                self.model.add_sum(Family::DisciplineMeeting, concurrent, Relation::Le, cap);
            }
        }

        // PE teachers belong to no group
        for t in school.teachers_with_role(Role::Pe) {
            for &slot in &teaching {
                let label = self.is(t, slot, Activity::DisciplineMeeting);
                self.model.fix(Family::DisciplineMeeting, label, false);
            }
        }
    }

    /// Team advisory periods; non-PE members attend unless teaching.
    pub(super) fn post_advisory(&mut self) {
        let school = self.school;
        let policy = &school.policy;
        let teaching = self.vars.teaching_slots.clone();

        for team in &school.teams {
            let members = self.advisory_members(team.id);
            let mut weekly = Vec::with_capacity(teaching.len());
            for &slot in &teaching {
                let Some(advisory) = self.vars.team_advisory(team.id, slot) else {
                    continue;
                };
                weekly.push(advisory);
                for &t in &members {
                    let label = self.is(t, slot, Activity::Advisory);
                    let busy = self.is(t, slot, Activity::Teaching);
                    self.model.add_enforced(
                        Family::Advisory,
                        advisory,
                        LinearExpr::sum([label, busy]),
                        Relation::Ge,
                        1,
                    );
                }
            }
            self.model.add_sum(
                Family::Advisory,
                weekly,
                Relation::Eq,
                i64::from(policy.advisory_per_team),
            );
            for plan in &school.week.days {
                let daily = self.team_events_on(team.id, plan.day, |v, t, s| v.team_advisory(t, s));
                self.model.add_sum(
                    Family::Advisory,
                    daily,
                    Relation::Le,
                    i64::from(policy.advisory_max_per_day),
                );
            }
        }

        for t in school.teacher_ids() {
            let teams = school.teams_of(t);
            let attends = school.teachers[t.0].role() != Role::Pe;
            let mut labels = Vec::with_capacity(teaching.len());
            for &slot in &teaching {
                let label = self.is(t, slot, Activity::Advisory);
                if !attends {
                    self.model.fix(Family::Advisory, label, false);
                    continue;
                }
                labels.push(label);
                // label ≤ Σ advisory of the teacher's teams
                let mut expr = LinearExpr::from(label);
                for &team in &teams {
                    if let Some(advisory) = self.vars.team_advisory(team, slot) {
                        expr.push_bool(advisory, -1);
                    }
                }
                self.model.add(Family::Advisory, expr, Relation::Le, 0);
            }
            if attends {
                self.model.add_sum(
                    Family::Advisory,
                    labels,
                    Relation::Eq,
                    i64::from(policy.advisory_per_teacher),
                );
            }
        }
    }

    /// School-wide elective blocks; Core teachers join all or none.
    pub(super) fn post_electives(&mut self) {
        let school = self.school;
        let policy = &school.policy;
        let teaching = self.vars.teaching_slots.clone();

        let blocks: Vec<BoolVar> = teaching
            .iter()
            .filter_map(|&slot| self.vars.school_elective(slot))
            .collect();
        self.model.add_sum(
            Family::Elective,
            blocks,
            Relation::Eq,
            i64::from(policy.electives_per_week),
        );
        for plan in &school.week.days {
            let daily: Vec<BoolVar> = plan
                .teaching_periods()
                .into_iter()
                .filter_map(|p| self.vars.school_elective(Slot::new(plan.day, p)))
                .collect();
            if daily.len() > 1 {
                self.model.add_sum(Family::Elective, daily, Relation::Le, 1);
            }
        }

        for t in school.teacher_ids() {
            let participates = self.vars.has_elective(t);
            let mut labels = Vec::with_capacity(teaching.len());
            for &slot in &teaching {
                let label = self.is(t, slot, Activity::Elective);
                match (participates, self.vars.school_elective(slot)) {
                    (Some(_), Some(block)) => {
                        self.model.add_implies(Family::Elective, label, block);
                        labels.push(label);
                    }
                    _ => {
                        self.model.fix(Family::Elective, label, false);
                    }
                }
            }
            if let Some(joined) = participates {
                let count = LinearExpr::sum(labels);
                self.model.add_enforced(
                    Family::Elective,
                    joined,
                    count.clone(),
                    Relation::Eq,
                    i64::from(policy.elective_participation),
                );
                self.model.add_enforced(Family::Elective, joined.not(), count, Relation::Eq, 0);
            }
        }
    }

    /// Core teachers of the team and Literacy teachers serving it.
    fn advisory_members(&self, team: TeamId) -> Vec<TeacherId> {
        let school = self.school;
        school
            .teacher_ids()
            .filter(|&t| school.teachers[t.0].role() != Role::Pe)
            .filter(|&t| school.teams_of(t).contains(&team))
            .collect()
    }

    /// A team's event booleans on one day.
    fn team_events_on<F>(&self, team: TeamId, day: Day, pick: F) -> Vec<BoolVar>
    where
        F: Fn(&DecisionVars, TeamId, Slot) -> Option<BoolVar>,
    {
        self.school
            .week
            .plan(day)
            .map(|plan| {
                plan.teaching_periods()
                    .into_iter()
                    .filter_map(|p| pick(&self.vars, team, Slot::new(day, p)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
