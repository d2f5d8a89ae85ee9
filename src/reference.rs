//! Reference school configuration.
//!
//! Four teams of four classes (`A`–`P`), five core subjects with Arts at
//! reduced frequency, one Core teacher per (team, subject) named
//! `{Subject}_T{team}`, two PE teachers and two Literacy teachers
//! (`Literacy_T1` for teams 1–2, `Literacy_T2` for teams 3–4).
//!
//! | Day | Periods | Lunch |
//! |-----|---------|-------|
//! | Monday | 7 | 3 |
//! | Tuesday | 7 | 3 |
//! | Wednesday | 6 | 3 |
//! | Thursday | 7 | 3 |
//! | Friday | 7 | 3 |
//!
//! Quotas are the [`Policy`](crate::models::Policy) defaults.

use crate::adapter::SchoolRecords;
use crate::models::{Day, School};
use crate::store::{ClassRecord, ConfigEntry, TeacherRecord};
use crate::validation::ConfigurationError;

/// Core subjects in configured order.
pub const SUBJECTS: [&str; 5] = ["ELA", "SS", "Science", "Math", "Arts"];

/// The reduced-frequency subject.
pub const REDUCED_SUBJECT: &str = "Arts";

/// Period counts per day.
pub const PERIODS: [(Day, u32); 5] = [
    (Day::Monday, 7),
    (Day::Tuesday, 7),
    (Day::Wednesday, 6),
    (Day::Thursday, 7),
    (Day::Friday, 7),
];

/// Lunch period shared by every day.
pub const LUNCH: u32 = 3;

const TEAMS: u32 = 4;
const CLASSES_PER_TEAM: u32 = 4;

/// Input rows of the reference school.
pub fn reference_records() -> SchoolRecords {
    let periods = PERIODS
        .iter()
        .map(|(day, count)| format!("\"{}\":{count}", day.name()))
        .collect::<Vec<_>>()
        .join(",");
    let config = vec![
        ConfigEntry::new("periods_per_day", format!("{{{periods}}}")),
        ConfigEntry::new("lunch_period", LUNCH.to_string()),
        ConfigEntry::new("core_subjects", SUBJECTS.join(",")),
        ConfigEntry::new("reduced_subject", REDUCED_SUBJECT),
    ];

    let classes = (0..TEAMS * CLASSES_PER_TEAM)
        .map(|i| {
            let name = char::from(b'A' + i as u8).to_string();
            ClassRecord::new(&name, i / CLASSES_PER_TEAM + 1)
        })
        .collect();

    let mut teachers = Vec::new();
    for team in 1..=TEAMS {
        for subject in SUBJECTS {
            teachers.push(TeacherRecord::core(
                &format!("{subject}_T{team}"),
                subject,
                team,
            ));
        }
    }
    teachers.push(TeacherRecord::pe("PE_T1"));
    teachers.push(TeacherRecord::pe("PE_T2"));
    teachers.push(TeacherRecord::literacy("Literacy_T1", "1,2"));
    teachers.push(TeacherRecord::literacy("Literacy_T2", "3,4"));

    SchoolRecords {
        config,
        teachers,
        classes,
        pins: Vec::new(),
    }
}

/// The reference school, adapted and validated.
pub fn reference_school() -> Result<School, Vec<ConfigurationError>> {
    reference_records().to_school()
}
