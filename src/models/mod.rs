//! School timetabling domain models.
//!
//! Provides the data types a timetabling run is compiled from and
//! decoded into.
//!
//! # Domain Mappings
//!
//! | u-timetable | Meaning |
//! |-------------|---------|
//! | Week / DayPlan / Slot | Days, periods, lunch |
//! | Teacher / Role / Post | Who teaches what |
//! | SchoolClass / Team | Student groups sharing PE and events |
//! | Policy | Weekly quotas and switches |
//! | Timetable | Teacher grid and class grid |

mod activity;
mod calendar;
mod class;
mod policy;
mod school;
mod teacher;
mod timetable;

pub use activity::Activity;
pub use calendar::{Day, DayPlan, Period, Slot, Week};
pub use class::{ClassId, SchoolClass, Subject, SubjectId, Team, TeamId};
pub use policy::{AttendancePolicy, Policy, SmoothingRule};
pub use school::{Discipline, Pin, School, LITERACY, PE};
pub use teacher::{Post, Role, Teacher, TeacherId};
pub use timetable::{ClassActivity, ClassSlot, TeacherSlot, Timetable};
