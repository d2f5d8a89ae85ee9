//! Run configuration.
//!
//! [`SchoolConfig`] is parsed from the key/value rows of the store's
//! configuration table:
//!
//! | key | value |
//! |-----|-------|
//! | `periods_per_day` | JSON object, day name → period count |
//! | `lunch_period` | integer |
//! | `core_subjects` | JSON array or comma list |
//! | `reduced_subject` | optional subject name |
//! | any [`Policy`] field | JSON value (bare words are read as strings) |
//!
//! Missing policy keys keep their defaults. Unknown keys are errors.
//!
//! [`RunConfig`] holds the settings of one run rather than of the school.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::cp::SolverConfig;
use crate::models::{Day, DayPlan, Period, Policy, Subject, Week};
use crate::store::ConfigEntry;
use crate::validation::{ConfigErrorKind, ConfigurationError};

const PERIODS_PER_DAY: &str = "periods_per_day";
const LUNCH_PERIOD: &str = "lunch_period";
const CORE_SUBJECTS: &str = "core_subjects";
const REDUCED_SUBJECT: &str = "reduced_subject";

/// School parameters from the configuration table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolConfig {
    /// Period count per configured day, in calendar order.
    pub periods_per_day: Vec<(Day, u32)>,
    /// Lunch period index, shared by every day.
    pub lunch_period: Period,
    /// Core subject names, in configured order.
    pub core_subjects: Vec<String>,
    /// The reduced-frequency subject, if any.
    pub reduced_subject: Option<String>,
    /// Quotas and switches.
    pub policy: Policy,
}

impl SchoolConfig {
    /// Parses configuration rows, collecting every problem.
    pub fn from_entries(entries: &[ConfigEntry]) -> Result<Self, Vec<ConfigurationError>> {
        let mut errors = Vec::new();
        let mut raw: BTreeMap<&str, &str> = BTreeMap::new();
        for entry in entries {
            let key = entry.key.trim();
            if raw.insert(key, entry.value.trim()).is_some() {
                errors.push(ConfigurationError::new(
                    ConfigErrorKind::DuplicateName,
                    format!("Configuration key '{key}' appears twice"),
                ));
            }
        }

        let periods_per_day = match take(&mut raw, PERIODS_PER_DAY, &mut errors) {
            Some(text) => parse_periods(text, &mut errors),
            None => Vec::new(),
        };
        let lunch_period = match take(&mut raw, LUNCH_PERIOD, &mut errors) {
            Some(text) => text.parse::<Period>().unwrap_or_else(|_| {
                errors.push(malformed(LUNCH_PERIOD, text));
                0
            }),
            None => 0,
        };
        let core_subjects = match take(&mut raw, CORE_SUBJECTS, &mut errors) {
            Some(text) => parse_subjects(text, &mut errors),
            None => Vec::new(),
        };
        let reduced_subject = raw
            .remove(REDUCED_SUBJECT)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if let Some(reduced) = &reduced_subject {
            if !core_subjects.is_empty() && !core_subjects.contains(reduced) {
                errors.push(ConfigurationError::new(
                    ConfigErrorKind::UnknownSubject,
                    format!("Reduced subject '{reduced}' is not a core subject"),
                ));
            }
        }

        let policy = parse_policy(raw, &mut errors);

        if errors.is_empty() {
            Ok(Self {
                periods_per_day,
                lunch_period,
                core_subjects,
                reduced_subject,
                policy,
            })
        } else {
            Err(errors)
        }
    }

    /// The school week. Every day shares the configured lunch period.
    pub fn week(&self) -> Week {
        self.periods_per_day
            .iter()
            .fold(Week::new(), |week, &(day, count)| {
                week.with_day(DayPlan::new(day, count).with_lunch(self.lunch_period))
            })
    }

    /// Core subjects with the reduced flag applied.
    pub fn subjects(&self) -> Vec<Subject> {
        self.core_subjects
            .iter()
            .map(|name| {
                if self.reduced_subject.as_deref() == Some(name.as_str()) {
                    Subject::reduced(name.clone())
                } else {
                    Subject::new(name.clone())
                }
            })
            .collect()
    }

    /// Configuration rows equivalent to this config.
    ///
    /// Policy fields are written only when they differ from the default.
    pub fn to_entries(&self) -> Vec<ConfigEntry> {
        let periods: Map<String, Value> = self
            .periods_per_day
            .iter()
            .map(|&(day, count)| (day.name().to_string(), Value::from(count)))
            .collect();
        let mut entries = vec![
            ConfigEntry::new(PERIODS_PER_DAY, Value::Object(periods).to_string()),
            ConfigEntry::new(LUNCH_PERIOD, self.lunch_period.to_string()),
            ConfigEntry::new(CORE_SUBJECTS, self.core_subjects.join(",")),
        ];
        if let Some(reduced) = &self.reduced_subject {
            entries.push(ConfigEntry::new(REDUCED_SUBJECT, reduced.clone()));
        }

        let defaults = policy_fields(&Policy::default());
        for (key, value) in policy_fields(&self.policy) {
            if defaults.get(&key) != Some(&value) {
                entries.push(ConfigEntry::new(key, value.to_string()));
            }
        }
        entries
    }
}

fn take<'a>(
    raw: &mut BTreeMap<&str, &'a str>,
    key: &str,
    errors: &mut Vec<ConfigurationError>,
) -> Option<&'a str> {
    let value = raw.remove(key);
    if value.is_none() {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::MissingKey,
            format!("Missing configuration key '{key}'"),
        ));
    }
    value
}

fn malformed(key: &str, value: &str) -> ConfigurationError {
    ConfigurationError::new(
        ConfigErrorKind::MalformedValue,
        format!("Cannot parse '{key}' value '{value}'"),
    )
}

fn parse_periods(text: &str, errors: &mut Vec<ConfigurationError>) -> Vec<(Day, u32)> {
    let map: BTreeMap<String, u32> = match serde_json::from_str(text) {
        Ok(map) => map,
        Err(_) => {
            errors.push(malformed(PERIODS_PER_DAY, text));
            return Vec::new();
        }
    };

    let mut days = Vec::new();
    for (name, count) in map {
        let Some(day) = Day::parse(&name) else {
            errors.push(ConfigurationError::new(
                ConfigErrorKind::UnknownDay,
                format!("'{name}' is not a weekday"),
            ));
            continue;
        };
        if count == 0 {
            errors.push(ConfigurationError::new(
                ConfigErrorKind::MalformedValue,
                format!("{day} has no periods"),
            ));
            continue;
        }
        days.push((day, count));
    }
    days.sort_by_key(|&(day, _)| day);
    days
}

fn parse_subjects(text: &str, errors: &mut Vec<ConfigurationError>) -> Vec<String> {
    let subjects: Vec<String> = if text.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(text) {
            Ok(list) => list.into_iter().map(|s| s.trim().to_string()).collect(),
            Err(_) => {
                errors.push(malformed(CORE_SUBJECTS, text));
                return Vec::new();
            }
        }
    } else {
        text.split(',').map(|s| s.trim().to_string()).collect()
    };

    let subjects: Vec<String> = subjects.into_iter().filter(|s| !s.is_empty()).collect();
    if subjects.is_empty() {
        errors.push(ConfigurationError::new(
            ConfigErrorKind::MalformedValue,
            "No core subjects configured",
        ));
    }
    subjects
}

/// Field name → JSON value of a policy.
fn policy_fields(policy: &Policy) -> Map<String, Value> {
    match serde_json::to_value(policy) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn parse_policy(raw: BTreeMap<&str, &str>, errors: &mut Vec<ConfigurationError>) -> Policy {
    let known = policy_fields(&Policy::default());
    let mut overrides = Map::new();
    for (key, text) in raw {
        if !known.contains_key(key) {
            errors.push(ConfigurationError::new(
                ConfigErrorKind::UnknownKey,
                format!("Unknown configuration key '{key}'"),
            ));
            continue;
        }
        let value = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        overrides.insert(key.to_string(), value);
    }

    // One field at a time so that each bad value is reported by name.
    let mut merged = known;
    for (key, value) in overrides {
        let mut probe = Map::new();
        probe.insert(key.clone(), value.clone());
        match serde_json::from_value::<Policy>(Value::Object(probe)) {
            Ok(_) => {
                merged.insert(key, value);
            }
            Err(e) => errors.push(ConfigurationError::new(
                ConfigErrorKind::MalformedValue,
                format!("Invalid value for '{key}': {e}"),
            )),
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}

/// Settings of one timetabling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Budget for the main solve.
    pub time_budget: Duration,
    /// Probe relaxed models after an Infeasible result.
    pub diagnose_infeasible: bool,
    /// Budget for each diagnostic probe.
    pub probe_budget: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(300),
            diagnose_infeasible: false,
            probe_budget: Duration::from_secs(60),
        }
    }
}

impl RunConfig {
    /// Sets the main solve budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Enables infeasibility diagnosis with the given per-probe budget.
    pub fn with_diagnosis(mut self, probe_budget: Duration) -> Self {
        self.diagnose_infeasible = true;
        self.probe_budget = probe_budget;
        self
    }

    /// Solver settings for the main solve.
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::default().with_time_budget(self.time_budget)
    }
}
