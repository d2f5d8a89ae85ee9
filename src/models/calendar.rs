//! Weekly calendar: days, periods, and slots.
//!
//! A school week is an ordered list of [`DayPlan`]s. Each day owns its
//! numbered periods, one of which may be the fixed lunch period.
//!
//! # Time Model
//! A [`Slot`] is a `(day, period)` pair. Teaching periods are all periods
//! of a day except lunch; only teaching slots can carry class instruction.
//!
//! # Adjacency
//! Two kinds of "next day" are used:
//! - *calendar adjacency* (Monday–Tuesday, …, Thursday–Friday), and
//! - *consecutive school days* in configured order, optionally closing the
//!   Friday→Monday seam of the week.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A weekday label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// All weekdays in calendar order.
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Position in the calendar week (Monday = 0).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Full English name.
    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }

    /// Parses a full or three-letter day name, case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Some(Day::Monday),
            "tuesday" | "tue" => Some(Day::Tuesday),
            "wednesday" | "wed" => Some(Day::Wednesday),
            "thursday" | "thu" => Some(Day::Thursday),
            "friday" | "fri" => Some(Day::Friday),
            _ => None,
        }
    }

    /// Whether two days are next to each other on the calendar.
    ///
    /// Friday and Monday are not adjacent.
    #[inline]
    pub fn is_adjacent(self, other: Day) -> bool {
        self.index().abs_diff(other.index()) == 1
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Period number within a day (1-based in all shipped configurations).
pub type Period = u32;

/// A `(day, period)` cell of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Day of the week.
    pub day: Day,
    /// Period number within the day.
    pub period: Period,
}

impl Slot {
    /// Creates a slot.
    pub fn new(day: Day, period: Period) -> Self {
        Self { day, period }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} P{}", self.day, self.period)
    }
}

/// The periods of one school day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Which weekday this plan describes.
    pub day: Day,
    /// Ordered period numbers.
    pub periods: Vec<Period>,
    /// The fixed lunch period, if the day has one.
    pub lunch: Option<Period>,
}

impl DayPlan {
    /// Creates a day with periods `1..=count` and no lunch.
    pub fn new(day: Day, count: u32) -> Self {
        Self {
            day,
            periods: (1..=count).collect(),
            lunch: None,
        }
    }

    /// Flags a period as the lunch break.
    pub fn with_lunch(mut self, period: Period) -> Self {
        self.lunch = Some(period);
        self
    }

    /// Whether `period` is this day's lunch.
    #[inline]
    pub fn is_lunch(&self, period: Period) -> bool {
        self.lunch == Some(period)
    }

    /// All periods except lunch, in order.
    pub fn teaching_periods(&self) -> Vec<Period> {
        self.periods
            .iter()
            .copied()
            .filter(|&p| !self.is_lunch(p))
            .collect()
    }

    /// First teaching period of the day.
    pub fn first_teaching(&self) -> Option<Period> {
        self.periods.iter().copied().find(|&p| !self.is_lunch(p))
    }

    /// Last teaching period of the day.
    pub fn last_teaching(&self) -> Option<Period> {
        self.periods.iter().rev().copied().find(|&p| !self.is_lunch(p))
    }
}

/// The school week: day plans in calendar order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    /// Day plans, sorted by weekday.
    pub days: Vec<DayPlan>,
}

impl Week {
    /// Creates an empty week.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a day plan, keeping calendar order.
    pub fn with_day(mut self, plan: DayPlan) -> Self {
        self.days.retain(|d| d.day != plan.day);
        self.days.push(plan);
        self.days.sort_by_key(|d| d.day);
        self
    }

    /// Builds a week where every listed day has `count` periods and the
    /// same lunch period.
    pub fn uniform(days: &[Day], count: u32, lunch: Period) -> Self {
        days.iter().fold(Self::new(), |week, &day| {
            week.with_day(DayPlan::new(day, count).with_lunch(lunch))
        })
    }

    /// Plan for a given day.
    pub fn plan(&self, day: Day) -> Option<&DayPlan> {
        self.days.iter().find(|d| d.day == day)
    }

    /// Every slot of the week, lunch included, in (day, period) order.
    pub fn slots(&self) -> Vec<Slot> {
        self.days
            .iter()
            .flat_map(|d| d.periods.iter().map(move |&p| Slot::new(d.day, p)))
            .collect()
    }

    /// Every non-lunch slot of the week, in (day, period) order.
    pub fn teaching_slots(&self) -> Vec<Slot> {
        self.days
            .iter()
            .flat_map(|d| {
                d.teaching_periods()
                    .into_iter()
                    .map(move |p| Slot::new(d.day, p))
            })
            .collect()
    }

    /// Whether a slot exists and is not lunch.
    pub fn is_teaching_slot(&self, slot: Slot) -> bool {
        self.plan(slot.day)
            .map(|d| d.periods.contains(&slot.period) && !d.is_lunch(slot.period))
            .unwrap_or(false)
    }

    /// Pairs of consecutive school days in configured order.
    ///
    /// With `wrap`, the last day is also paired with the first (the
    /// weekend seam), provided the week has at least two days.
    pub fn consecutive_days(&self, wrap: bool) -> Vec<(Day, Day)> {
        let mut pairs: Vec<(Day, Day)> = self
            .days
            .windows(2)
            .map(|w| (w[0].day, w[1].day))
            .collect();
        if wrap && self.days.len() >= 2 {
            if let (Some(last), Some(first)) = (self.days.last(), self.days.first()) {
                pairs.push((last.day, first.day));
            }
        }
        pairs
    }

    /// Pairs of configured days that are adjacent on the calendar.
    pub fn adjacent_days(&self) -> Vec<(Day, Day)> {
        self.days
            .windows(2)
            .filter(|w| w[0].day.is_adjacent(w[1].day))
            .map(|w| (w[0].day, w[1].day))
            .collect()
    }

    /// Period counts per day, in calendar order.
    pub fn periods_per_day(&self) -> Vec<(Day, usize)> {
        self.days.iter().map(|d| (d.day, d.periods.len())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_parse() {
        assert_eq!(Day::parse("Monday"), Some(Day::Monday));
        assert_eq!(Day::parse(" wed "), Some(Day::Wednesday));
        assert_eq!(Day::parse("FRI"), Some(Day::Friday));
        assert_eq!(Day::parse("Saturday"), None);
    }

    #[test]
    fn test_day_adjacency() {
        assert!(Day::Monday.is_adjacent(Day::Tuesday));
        assert!(Day::Thursday.is_adjacent(Day::Wednesday));
        assert!(!Day::Friday.is_adjacent(Day::Monday));
        assert!(!Day::Monday.is_adjacent(Day::Monday));
    }

    #[test]
    fn test_teaching_periods_skip_lunch() {
        let plan = DayPlan::new(Day::Wednesday, 6).with_lunch(3);
        assert_eq!(plan.teaching_periods(), vec![1, 2, 4, 5, 6]);
        assert_eq!(plan.first_teaching(), Some(1));
        assert_eq!(plan.last_teaching(), Some(6));
        assert!(plan.is_lunch(3));
    }

    #[test]
    fn test_last_teaching_when_lunch_is_last() {
        let plan = DayPlan::new(Day::Monday, 4).with_lunch(4);
        assert_eq!(plan.last_teaching(), Some(3));
    }

    #[test]
    fn test_week_slots() {
        let week = Week::new()
            .with_day(DayPlan::new(Day::Tuesday, 7).with_lunch(3))
            .with_day(DayPlan::new(Day::Monday, 6).with_lunch(3));

        assert_eq!(week.days[0].day, Day::Monday);
        assert_eq!(week.slots().len(), 13);
        assert_eq!(week.teaching_slots().len(), 11);
        assert!(week.is_teaching_slot(Slot::new(Day::Tuesday, 7)));
        assert!(!week.is_teaching_slot(Slot::new(Day::Monday, 3)));
        assert!(!week.is_teaching_slot(Slot::new(Day::Monday, 7)));
        assert!(!week.is_teaching_slot(Slot::new(Day::Friday, 1)));
    }

    #[test]
    fn test_with_day_replaces() {
        let week = Week::uniform(&[Day::Monday], 5, 2).with_day(DayPlan::new(Day::Monday, 7));
        assert_eq!(week.days.len(), 1);
        assert_eq!(week.days[0].periods.len(), 7);
    }

    #[test]
    fn test_consecutive_days_with_seam() {
        let week = Week::uniform(&[Day::Monday, Day::Wednesday, Day::Friday], 5, 3);

        assert_eq!(
            week.consecutive_days(false),
            vec![(Day::Monday, Day::Wednesday), (Day::Wednesday, Day::Friday)]
        );
        assert_eq!(week.consecutive_days(true).len(), 3);
        assert_eq!(week.consecutive_days(true)[2], (Day::Friday, Day::Monday));
        // Monday/Wednesday are consecutive school days but not calendar-adjacent
        assert!(week.adjacent_days().is_empty());
    }

    #[test]
    fn test_single_day_has_no_seam() {
        let week = Week::uniform(&[Day::Tuesday], 5, 3);
        assert!(week.consecutive_days(true).is_empty());
    }
}
