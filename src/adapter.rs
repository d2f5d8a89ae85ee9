//! Raw store records → validated [`School`].
//!
//! The adapter resolves names (teams, subjects, classes, days) into
//! indices, skips inactive teachers, and then runs
//! [`validate_school`](crate::validation::validate_school) on the result.
//! Every problem found along the way is collected; the run is rejected
//! before any model is compiled.

use tracing::{debug, info};

use crate::config::SchoolConfig;
use crate::models::{ClassId, Day, Pin, Role, School, Slot, Teacher, TeamId};
use crate::store::{ClassRecord, ConfigEntry, PinRecord, StoreResult, TeacherRecord, TimetableStore};
use crate::validation::{validate_school, ConfigErrorKind, ConfigurationError};

/// Every input row of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolRecords {
    /// Configuration table.
    pub config: Vec<ConfigEntry>,
    /// Teacher roster.
    pub teachers: Vec<TeacherRecord>,
    /// Class roster.
    pub classes: Vec<ClassRecord>,
    /// Forced lessons.
    pub pins: Vec<PinRecord>,
}

impl SchoolRecords {
    /// Reads all inputs from a store.
    pub fn read_from<S: TimetableStore + ?Sized>(store: &S) -> StoreResult<Self> {
        Ok(Self {
            config: store.read_config()?,
            teachers: store.read_teachers()?,
            classes: store.read_classes()?,
            pins: store.read_pins()?,
        })
    }

    /// Builds and validates the school.
    pub fn to_school(&self) -> Result<School, Vec<ConfigurationError>> {
        let config = SchoolConfig::from_entries(&self.config)?;
        build_school(&config, &self.teachers, &self.classes, &self.pins)
    }
}

/// Builds a school from parsed configuration and roster rows.
pub fn build_school(
    config: &SchoolConfig,
    teachers: &[TeacherRecord],
    classes: &[ClassRecord],
    pins: &[PinRecord],
) -> Result<School, Vec<ConfigurationError>> {
    let mut errors = Vec::new();
    let mut school = School::new(config.week()).with_policy(config.policy.clone());
    for subject in config.subjects() {
        school = school.with_subject(subject);
    }

    for record in classes {
        match record.team {
            Some(team) => school = school.with_class(record.name.trim(), TeamId(team)),
            None => errors.push(ConfigurationError::new(
                ConfigErrorKind::ClassWithoutTeam,
                format!("Class '{}' has no team", record.name),
            )),
        }
    }

    let mut skipped = 0usize;
    for record in teachers {
        if !record.active {
            skipped += 1;
            debug!(teacher = %record.name, "inactive teacher skipped");
            continue;
        }
        if let Some(teacher) = adapt_teacher(&school, record, &mut errors) {
            school = school.with_teacher(teacher);
        }
    }

    for record in pins {
        if let Some(pin) = adapt_pin(&school, record, &mut errors) {
            school = school.with_pin(pin);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    validate_school(&school)?;

    info!(
        teachers = school.teachers.len(),
        inactive = skipped,
        classes = school.classes.len(),
        teams = school.teams.len(),
        subjects = school.subjects.len(),
        pins = school.pins.len(),
        "school configuration loaded"
    );
    Ok(school)
}

fn adapt_teacher(
    school: &School,
    record: &TeacherRecord,
    errors: &mut Vec<ConfigurationError>,
) -> Option<Teacher> {
    let name = record.name.trim();
    let Some(role) = Role::parse(&record.role) else {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::UnknownRole,
            format!("Teacher '{name}' has unknown role '{}'", record.role),
        ));
        return None;
    };

    match role {
        Role::Pe => Some(Teacher::pe(name)),
        Role::Core => {
            let subject_name = record.subject.as_deref().unwrap_or("").trim();
            let subject = school.subject_id(subject_name);
            if subject.is_none() {
                errors.push(ConfigurationError::new(
                    ConfigErrorKind::UnknownSubject,
                    format!("Teacher '{name}' teaches unknown subject '{subject_name}'"),
                ));
            }
            let team = match parse_teams(&record.teams).as_deref() {
                Some([team]) => known_team(school, name, *team, errors),
                _ => {
                    errors.push(ConfigurationError::new(
                        ConfigErrorKind::MalformedValue,
                        format!("Core teacher '{name}' needs exactly one team, got '{}'", record.teams),
                    ));
                    None
                }
            };
            Some(Teacher::core(name, team?, subject?))
        }
        Role::Literacy => {
            let Some(numbers) = parse_teams(&record.teams) else {
                errors.push(ConfigurationError::new(
                    ConfigErrorKind::MalformedValue,
                    format!("Teacher '{name}' has malformed team list '{}'", record.teams),
                ));
                return None;
            };
            let teams: Vec<TeamId> = numbers
                .into_iter()
                .filter_map(|n| known_team(school, name, n, errors))
                .collect();

            let roster = match record.classes.as_deref() {
                Some(list) => explicit_roster(school, name, list, &teams, errors),
                None => teams
                    .iter()
                    .flat_map(|&team| school.classes_of(team).iter().copied())
                    .collect(),
            };
            Some(Teacher::literacy(name, roster))
        }
    }
}

/// Team numbers from `"2"` or `"1, 2"`. `None` if any entry is not a number.
fn parse_teams(text: &str) -> Option<Vec<u32>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

fn known_team(
    school: &School,
    teacher: &str,
    number: u32,
    errors: &mut Vec<ConfigurationError>,
) -> Option<TeamId> {
    let team = TeamId(number);
    if school.team(team).is_some() {
        Some(team)
    } else {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::UnknownTeam,
            format!("Teacher '{teacher}' references unknown team {number}"),
        ));
        None
    }
}

fn explicit_roster(
    school: &School,
    teacher: &str,
    list: &str,
    teams: &[TeamId],
    errors: &mut Vec<ConfigurationError>,
) -> Vec<ClassId> {
    let mut roster = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some(class) = school.class_id(name) else {
            errors.push(ConfigurationError::new(
                ConfigErrorKind::UnknownClass,
                format!("Teacher '{teacher}' lists unknown class '{name}'"),
            ));
            continue;
        };
        let in_teams = school
            .class(class)
            .is_some_and(|c| teams.contains(&c.team));
        if !in_teams {
            errors.push(ConfigurationError::new(
                ConfigErrorKind::RosterOutsideTeams,
                format!("Teacher '{teacher}' lists class '{name}' outside their teams"),
            ));
            continue;
        }
        if !roster.contains(&class) {
            roster.push(class);
        }
    }
    roster
}

fn adapt_pin(
    school: &School,
    record: &PinRecord,
    errors: &mut Vec<ConfigurationError>,
) -> Option<Pin> {
    let teacher = school.teacher_id(record.teacher.trim());
    if teacher.is_none() {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::UnknownTeacher,
            format!("Pin references unknown teacher '{}'", record.teacher),
        ));
    }
    let class = school.class_id(record.class.trim());
    if class.is_none() {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::UnknownClass,
            format!("Pin references unknown class '{}'", record.class),
        ));
    }
    let day = Day::parse(&record.day);
    if day.is_none() {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::UnknownDay,
            format!("Pin references unknown day '{}'", record.day),
        ));
    }
    Some(Pin {
        teacher: teacher?,
        class: class?,
        slot: Slot::new(day?, record.period),
    })
}
