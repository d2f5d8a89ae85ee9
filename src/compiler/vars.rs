//! Decision variables of one compiled timetable.
//!
//! Owned by a [`CompiledTimetable`](super::CompiledTimetable) and scoped to
//! one solve run. All maps are ordered, so iteration (and therefore
//! posting and decoding) is reproducible.

use std::collections::BTreeMap;

use crate::cp::{BoolVar, CpModel, IntVar};
use crate::models::{Activity, ClassId, Discipline, Slot, TeacherId, TeamId};

/// Variable tables keyed by domain identifiers.
#[derive(Debug, Clone, Default)]
pub struct DecisionVars {
    pub(crate) slots: Vec<Slot>,
    pub(crate) teaching_slots: Vec<Slot>,
    pub(crate) activity: BTreeMap<(TeacherId, Slot), IntVar>,
    teaches: BTreeMap<(TeacherId, ClassId, Slot), BoolVar>,
    teaches_by_slot: BTreeMap<(TeacherId, Slot), Vec<(ClassId, BoolVar)>>,
    pub(crate) team_pe: BTreeMap<(TeamId, Slot), BoolVar>,
    pub(crate) team_meeting: BTreeMap<(TeamId, Slot), BoolVar>,
    pub(crate) team_advisory: BTreeMap<(TeamId, Slot), BoolVar>,
    pub(crate) discipline: BTreeMap<(Discipline, Slot), BoolVar>,
    pub(crate) elective: BTreeMap<Slot, BoolVar>,
    pub(crate) has_elective: BTreeMap<TeacherId, BoolVar>,
}

impl DecisionVars {
    /// Every slot of the week, lunch included.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Every non-lunch slot of the week.
    pub fn teaching_slots(&self) -> &[Slot] {
        &self.teaching_slots
    }

    /// `TeacherActivity[teacher, slot]`.
    pub fn activity(&self, teacher: TeacherId, slot: Slot) -> Option<IntVar> {
        self.activity.get(&(teacher, slot)).copied()
    }

    /// Value literal of `TeacherActivity[teacher, slot] == activity`.
    pub fn activity_literal(
        &self,
        model: &CpModel,
        teacher: TeacherId,
        slot: Slot,
        activity: Activity,
    ) -> Option<BoolVar> {
        let var = self.activity(teacher, slot)?;
        model.int_var(var)?.literal(activity.code())
    }

    /// `TeachesClass[teacher, class, slot]`; absent for ineligible pairs
    /// and lunch slots.
    pub fn teaches(&self, teacher: TeacherId, class: ClassId, slot: Slot) -> Option<BoolVar> {
        self.teaches.get(&(teacher, class, slot)).copied()
    }

    /// Registers `TeachesClass[teacher, class, slot]`.
    pub(crate) fn insert_lesson(
        &mut self,
        teacher: TeacherId,
        class: ClassId,
        slot: Slot,
        var: BoolVar,
    ) {
        self.teaches.insert((teacher, class, slot), var);
        let at = self.teaches_by_slot.entry((teacher, slot)).or_default();
        match at.binary_search_by_key(&class, |&(c, _)| c) {
            Ok(i) => at[i].1 = var,
            Err(i) => at.insert(i, (class, var)),
        }
    }

    /// All `TeachesClass` variables of a teacher at a slot, in class order.
    pub fn teaching_at(&self, teacher: TeacherId, slot: Slot) -> &[(ClassId, BoolVar)] {
        self.teaches_by_slot
            .get(&(teacher, slot))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every `TeachesClass` variable of a teacher across the week.
    pub fn lessons_of(&self, teacher: TeacherId) -> Vec<BoolVar> {
        self.teaches
            .iter()
            .filter(|(&(t, _, _), _)| t == teacher)
            .map(|(_, &v)| v)
            .collect()
    }

    /// All `TeachesClass` variables in key order.
    pub fn all_teaches(&self) -> impl Iterator<Item = ((TeacherId, ClassId, Slot), BoolVar)> + '_ {
        self.teaches.iter().map(|(&k, &v)| (k, v))
    }

    /// `TeamHasPE[team, slot]`.
    pub fn team_has_pe(&self, team: TeamId, slot: Slot) -> Option<BoolVar> {
        self.team_pe.get(&(team, slot)).copied()
    }

    /// `TeamMeeting[team, slot]`.
    pub fn team_meeting(&self, team: TeamId, slot: Slot) -> Option<BoolVar> {
        self.team_meeting.get(&(team, slot)).copied()
    }

    /// `TeamAdvisory[team, slot]`.
    pub fn team_advisory(&self, team: TeamId, slot: Slot) -> Option<BoolVar> {
        self.team_advisory.get(&(team, slot)).copied()
    }

    /// `DisciplineMeeting[group, slot]`.
    pub fn discipline_meeting(&self, group: Discipline, slot: Slot) -> Option<BoolVar> {
        self.discipline.get(&(group, slot)).copied()
    }

    /// `SchoolElective[slot]`.
    pub fn school_elective(&self, slot: Slot) -> Option<BoolVar> {
        self.elective.get(&slot).copied()
    }

    /// Elective participation switch of a Core teacher.
    pub fn has_elective(&self, teacher: TeacherId) -> Option<BoolVar> {
        self.has_elective.get(&teacher).copied()
    }

    /// Number of `TeachesClass` variables.
    pub fn teaches_count(&self) -> usize {
        self.teaches.len()
    }

    /// Number of synchronization booleans across all events.
    pub fn sync_count(&self) -> usize {
        self.team_pe.len()
            + self.team_meeting.len()
            + self.team_advisory.len()
            + self.discipline.len()
            + self.elective.len()
    }
}
