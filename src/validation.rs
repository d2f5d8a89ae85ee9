//! Input validation for timetabling runs.
//!
//! Checks structural integrity of a [`School`] before any model is
//! compiled. Detects:
//! - Days whose lunch period is missing from the period list
//! - Duplicate class, teacher and subject names
//! - Teachers referencing unknown teams, subjects or classes
//! - Literacy teachers with an empty roster
//! - (team, core subject) pairs without exactly one Core teacher
//! - Contradictory policy values
//!
//! All problems are collected; validation never stops at the first one.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::models::{Post, Role, School, SubjectId, TeamId};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ConfigurationError>>;

/// Malformed or inconsistent input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct ConfigurationError {
    /// Error category.
    pub kind: ConfigErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A teacher or class references a team with no classes.
    UnknownTeam,
    /// A Core teacher references a subject outside the core list.
    UnknownSubject,
    /// A roster or pin references an unknown class.
    UnknownClass,
    /// A pin references an unknown teacher.
    UnknownTeacher,
    /// A role tag is not `Core`, `PE` or `Literacy`.
    UnknownRole,
    /// A day name is not a weekday.
    UnknownDay,
    /// The lunch period does not occur in a day's period list.
    MissingLunch,
    /// A class record has no team.
    ClassWithoutTeam,
    /// Two entities share a name.
    DuplicateName,
    /// A Literacy teacher serves no class.
    EmptyRoster,
    /// A Literacy roster names a class outside the teacher's teams.
    RosterOutsideTeams,
    /// A (team, subject) pair has no Core teacher, or several.
    CoreCoverage,
    /// A required configuration key is absent.
    MissingKey,
    /// A configuration key is not recognised.
    UnknownKey,
    /// A value cannot be parsed.
    MalformedValue,
    /// Policy values contradict each other.
    InvalidPolicy,
    /// A pin asks for a lesson the teacher can never give.
    IneligiblePin,
}

impl ConfigurationError {
    /// Creates an error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a school.
///
/// Checks:
/// 1. Every day has its lunch period in its period list
/// 2. No duplicate class, teacher or subject names
/// 3. At most one reduced-frequency subject
/// 4. Teacher posts reference existing teams, subjects and classes
/// 5. Literacy rosters are non-empty
/// 6. Every (team, subject) pair has exactly one Core teacher
/// 7. Pins reference existing teachers and classes
/// 8. Policy ranges are consistent and PE quotas have PE staff
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_school(school: &School) -> ValidationResult {
    let mut errors = Vec::new();

    // Lunch
    if school.week.days.is_empty() {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::MissingKey,
            "No school days configured",
        ));
    }
    for plan in &school.week.days {
        match plan.lunch {
            Some(lunch) if plan.periods.contains(&lunch) => {}
            Some(lunch) => errors.push(ConfigurationError::new(
                ConfigErrorKind::MissingLunch,
                format!("Lunch period {lunch} not in {}'s periods", plan.day),
            )),
            None => errors.push(ConfigurationError::new(
                ConfigErrorKind::MissingLunch,
                format!("{} has no lunch period", plan.day),
            )),
        }
    }

    // Names
    check_unique(&mut errors, "class", school.classes.iter().map(|c| c.name.as_str()));
    check_unique(&mut errors, "teacher", school.teachers.iter().map(|t| t.name.as_str()));
    check_unique(&mut errors, "subject", school.subjects.iter().map(|s| s.name.as_str()));

    let reduced: Vec<&str> = school
        .subjects
        .iter()
        .filter(|s| s.reduced)
        .map(|s| s.name.as_str())
        .collect();
    if reduced.len() > 1 {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::InvalidPolicy,
            format!("More than one reduced subject: {}", reduced.join(", ")),
        ));
    }

    // Teacher posts
    let mut coverage: BTreeMap<(TeamId, SubjectId), Vec<&str>> = BTreeMap::new();
    for teacher in &school.teachers {
        match &teacher.post {
            Post::Core { team, subject } => {
                if school.team(*team).is_none() {
                    errors.push(ConfigurationError::new(
                        ConfigErrorKind::UnknownTeam,
                        format!("Teacher '{}' references unknown team {}", teacher.name, team.0),
                    ));
                }
                if school.subject(*subject).is_none() {
                    errors.push(ConfigurationError::new(
                        ConfigErrorKind::UnknownSubject,
                        format!(
                            "Teacher '{}' references unknown subject #{}",
                            teacher.name, subject.0
                        ),
                    ));
                }
                coverage
                    .entry((*team, *subject))
                    .or_default()
                    .push(&teacher.name);
            }
            Post::Literacy { roster } => {
                if roster.is_empty() {
                    errors.push(ConfigurationError::new(
                        ConfigErrorKind::EmptyRoster,
                        format!("Literacy teacher '{}' serves no class", teacher.name),
                    ));
                }
                for class in roster {
                    if school.class(*class).is_none() {
                        errors.push(ConfigurationError::new(
                            ConfigErrorKind::UnknownClass,
                            format!(
                                "Teacher '{}' references unknown class #{}",
                                teacher.name, class.0
                            ),
                        ));
                    }
                }
            }
            Post::Pe => {}
        }
    }

    // Core coverage
    for team in &school.teams {
        for (s, subject) in school.subjects.iter().enumerate() {
            let holders = coverage
                .get(&(team.id, SubjectId(s)))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if holders.len() != 1 {
                errors.push(ConfigurationError::new(
                    ConfigErrorKind::CoreCoverage,
                    format!(
                        "{} has {} {} teachers{}",
                        team.id,
                        holders.len(),
                        subject.name,
                        if holders.is_empty() {
                            String::new()
                        } else {
                            format!(" ({})", holders.join(", "))
                        }
                    ),
                ));
            }
        }
    }

    // Pins
    for pin in &school.pins {
        if school.teacher(pin.teacher).is_none() {
            errors.push(ConfigurationError::new(
                ConfigErrorKind::UnknownTeacher,
                format!("Pin references unknown teacher #{}", pin.teacher.0),
            ));
        }
        if school.class(pin.class).is_none() {
            errors.push(ConfigurationError::new(
                ConfigErrorKind::UnknownClass,
                format!("Pin references unknown class #{}", pin.class.0),
            ));
        }
    }

    // Policy
    let policy = &school.policy;
    if policy.pe_load_min > policy.pe_load_max {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::InvalidPolicy,
            format!(
                "PE load range is empty: [{}, {}]",
                policy.pe_load_min, policy.pe_load_max
            ),
        ));
    }
    if policy.load_smoothing.is_some_and(|rule| rule.window == 0) {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::InvalidPolicy,
            "Load smoothing window must be positive",
        ));
    }
    if policy.pe_sessions_per_team > 0
        && !school.teams.is_empty()
        && school.teachers_with_role(Role::Pe).is_empty()
    {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::InvalidPolicy,
            "PE sessions are required but no PE teacher is active",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_unique<'a>(
    errors: &mut Vec<ConfigurationError>,
    what: &str,
    names: impl Iterator<Item = &'a str>,
) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(ConfigurationError::new(
                ConfigErrorKind::DuplicateName,
                format!("Duplicate {what} name: {name}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fixtures::small_school;
    use crate::models::{ClassId, Day, DayPlan, Pin, Slot, Teacher, TeacherId};

    fn kinds(result: ValidationResult) -> Vec<ConfigErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_school() {
        assert!(validate_school(&small_school()).is_ok());
    }

    #[test]
    fn test_reference_school_valid() {
        let school = crate::reference::reference_school().unwrap();
        assert!(validate_school(&school).is_ok());
    }

    #[test]
    fn test_missing_lunch() {
        let mut school = small_school();
        school.week = school.week.with_day(DayPlan::new(Day::Thursday, 5));
        assert_eq!(kinds(validate_school(&school)), vec![ConfigErrorKind::MissingLunch]);

        let mut school = small_school();
        school.week = school.week.with_day(DayPlan::new(Day::Friday, 5).with_lunch(9));
        assert_eq!(kinds(validate_school(&school)), vec![ConfigErrorKind::MissingLunch]);
    }

    #[test]
    fn test_duplicate_names() {
        let school = small_school().with_class("A", TeamId(1));
        let kinds = kinds(validate_school(&school));
        assert!(kinds.contains(&ConfigErrorKind::DuplicateName));
    }

    #[test]
    fn test_unknown_team() {
        let school = small_school().with_teacher(Teacher::core("Math_T9", TeamId(9), SubjectId(0)));
        let kinds = kinds(validate_school(&school));
        assert!(kinds.contains(&ConfigErrorKind::UnknownTeam));
    }

    #[test]
    fn test_core_coverage() {
        let mut school = small_school();
        school.teachers.remove(1); // Art_T1
        assert_eq!(kinds(validate_school(&school)), vec![ConfigErrorKind::CoreCoverage]);

        let school = small_school().with_teacher(Teacher::core("Math_T2", TeamId(1), SubjectId(0)));
        assert_eq!(kinds(validate_school(&school)), vec![ConfigErrorKind::CoreCoverage]);
    }

    #[test]
    fn test_literacy_roster() {
        let school = small_school()
            .with_teacher(Teacher::literacy("Lit_T2", Vec::new()))
            .with_teacher(Teacher::literacy("Lit_T3", vec![ClassId(7)]));
        let kinds = kinds(validate_school(&school));
        assert_eq!(
            kinds,
            vec![ConfigErrorKind::EmptyRoster, ConfigErrorKind::UnknownClass]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut school = small_school().with_pin(Pin {
            teacher: TeacherId(30),
            class: ClassId(0),
            slot: Slot::new(Day::Monday, 1),
        });
        school.policy.pe_load_min = 10;
        school.policy.pe_load_max = 5;
        let kinds = kinds(validate_school(&school));
        assert_eq!(
            kinds,
            vec![ConfigErrorKind::UnknownTeacher, ConfigErrorKind::InvalidPolicy]
        );
    }

    #[test]
    fn test_pe_quota_without_staff() {
        let mut school = small_school();
        school.teachers.retain(|t| t.role() != Role::Pe);
        assert_eq!(kinds(validate_school(&school)), vec![ConfigErrorKind::InvalidPolicy]);
    }

    #[test]
    fn test_error_display() {
        let err = ConfigurationError::new(ConfigErrorKind::MissingLunch, "Monday has no lunch period");
        assert_eq!(err.to_string(), "MissingLunch: Monday has no lunch period");
    }
}
