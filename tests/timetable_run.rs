//! End-to-end runs against an on-disk SQLite store.

use std::time::Duration;

use tempfile::TempDir;
use u_timetable::adapter::SchoolRecords;
use u_timetable::config::{RunConfig, SchoolConfig};
use u_timetable::cp::PumpkinSolver;
use u_timetable::models::{Activity, AttendancePolicy, Day, Policy};
use u_timetable::reference::reference_records;
use u_timetable::runner::{RunOutcome, TimetableRunner};
use u_timetable::store::{
    ClassRecord, PinRecord, RunState, SqliteStore, TeacherRecord, TimetableStore,
};
use u_timetable::validation::ConfigErrorKind;

/// One team of two classes, one subject, one PE teacher; events off
/// unless `policy` turns them on.
fn make_records(days: &[Day], policy: Policy) -> SchoolRecords {
    let config = SchoolConfig {
        periods_per_day: days.iter().map(|&d| (d, 3)).collect(),
        lunch_period: 2,
        core_subjects: vec!["Math".to_string()],
        reduced_subject: None,
        policy,
    };
    SchoolRecords {
        config: config.to_entries(),
        teachers: vec![
            TeacherRecord::core("Math_T1", "Math", 1),
            TeacherRecord::pe("PE_T1"),
        ],
        classes: vec![ClassRecord::new("A", 1), ClassRecord::new("B", 1)],
        pins: Vec::new(),
    }
}

fn small_policy() -> Policy {
    Policy {
        core_sessions_per_week: 1,
        pe_sessions_per_team: 1,
        pe_load_min: 0,
        pe_load_max: 2,
        ..Policy::staffing_only()
    }
}

/// Two classes taught Math and a reduced Art, shared PE and one
/// Literacy teacher for class A, with every event family on.
fn small_school_records(policy: Policy) -> SchoolRecords {
    let config = SchoolConfig {
        periods_per_day: [Day::Monday, Day::Tuesday, Day::Wednesday]
            .into_iter()
            .map(|d| (d, 5))
            .collect(),
        lunch_period: 2,
        core_subjects: vec!["Math".to_string(), "Art".to_string()],
        reduced_subject: Some("Art".to_string()),
        policy,
    };
    let mut literacy = TeacherRecord::literacy("Lit_T1", "1");
    literacy.classes = Some("A".into());
    SchoolRecords {
        config: config.to_entries(),
        teachers: vec![
            TeacherRecord::core("Math_T1", "Math", 1),
            TeacherRecord::core("Art_T1", "Art", 1),
            TeacherRecord::pe("PE_T1"),
            literacy,
        ],
        classes: vec![ClassRecord::new("A", 1), ClassRecord::new("B", 1)],
        pins: Vec::new(),
    }
}

fn small_school_policy() -> Policy {
    Policy {
        core_sessions_per_week: 2,
        reduced_sessions_per_week: 1,
        literacy_sessions_per_week: 1,
        literacy_max_per_day: 1,
        pe_sessions_per_team: 1,
        pe_concurrent_classes: 2,
        pe_load_min: 2,
        pe_load_max: 2,
        team_meetings_per_week: 1,
        discipline_meetings_per_week: 1,
        max_concurrent_discipline_meetings: 1,
        advisory_per_team: 1,
        advisory_per_teacher: 1,
        advisory_max_per_day: 1,
        electives_per_week: 1,
        elective_participation: 1,
        discipline_attendance: AttendancePolicy::MeetingBlocksTeaching,
        load_smoothing: None,
        wrap_week_seam: true,
    }
}

fn open_store(dir: &TempDir, records: &SchoolRecords) -> SqliteStore {
    let store = SqliteStore::open(dir.path().join("timetable.db")).unwrap();
    store
        .seed(&records.config, &records.teachers, &records.classes)
        .unwrap();
    store.replace_pins(&records.pins).unwrap();
    store
}

fn runner() -> TimetableRunner<PumpkinSolver> {
    TimetableRunner::new(
        PumpkinSolver::new(),
        RunConfig::default().with_time_budget(Duration::from_secs(120)),
    )
}

#[test]
fn test_run_persists_both_grids() {
    u_timetable::logging::init_test();
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, &make_records(&[Day::Monday, Day::Tuesday], small_policy()));

    let report = runner().run(&store);
    assert!(report.outcome.is_complete(), "{:?}", report.outcome);

    let timetable = report.timetable.unwrap();
    assert_eq!(store.read_teacher_schedule().unwrap(), timetable.teacher_rows);
    assert_eq!(store.read_class_schedule().unwrap(), timetable.class_rows);
    assert_eq!(timetable.teacher_rows.len(), 12);

    let status = store.last_run_status().unwrap().unwrap();
    assert_eq!(status.status, RunState::Complete);
    assert!(status.quality.is_some());
}

#[test]
fn test_rerun_replaces_grids() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, &make_records(&[Day::Monday, Day::Tuesday], small_policy()));

    runner().run(&store);
    let report = runner().run(&store);
    assert!(report.outcome.is_complete());
    assert_eq!(store.read_teacher_schedule().unwrap().len(), 12);
    assert_eq!(store.read_class_schedule().unwrap().len(), 12);
}

#[test]
fn test_config_error_publishes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut records = make_records(&[Day::Monday, Day::Tuesday], small_policy());
    records.classes.push(ClassRecord {
        name: "C".into(),
        team: None,
    });
    let store = open_store(&dir, &records);

    let report = runner().run(&store);
    assert_eq!(report.outcome.state(), RunState::FailedConfigError);
    assert!(store.read_teacher_schedule().unwrap().is_empty());
    assert_eq!(
        store.last_run_status().unwrap().unwrap().status,
        RunState::FailedConfigError
    );
}

#[test]
fn test_off_roster_pin_rejected_before_solving() {
    let dir = TempDir::new().unwrap();
    let mut records = make_records(&[Day::Monday, Day::Tuesday], small_policy());
    let mut literacy = TeacherRecord::literacy("Lit_T1", "1");
    literacy.classes = Some("A".into());
    records.teachers.push(literacy);
    records.pins.push(PinRecord {
        teacher: "Lit_T1".into(),
        class: "B".into(),
        day: "Monday".into(),
        period: 1,
    });
    let store = open_store(&dir, &records);

    let report = runner().run(&store);
    match &report.outcome {
        RunOutcome::ConfigError(errors) => {
            assert_eq!(errors[0].kind, ConfigErrorKind::IneligiblePin)
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(report.timetable.is_none());
}

#[test]
fn test_dropping_discipline_meetings_keeps_school_feasible() {
    let with_meetings = small_school_policy();
    let without = Policy {
        discipline_meetings_per_week: 0,
        ..with_meetings.clone()
    };

    let mut runs = Vec::new();
    for (policy, expected_meetings) in [(with_meetings, 1), (without, 0)] {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, &small_school_records(policy));
        let report = runner().run(&store);
        assert!(report.outcome.is_complete(), "{:?}", report.outcome);
        assert!(report.audit.unwrap().is_clean());

        let timetable = report.timetable.unwrap();
        for teacher in ["Math_T1", "Art_T1", "Lit_T1"] {
            assert_eq!(
                timetable.activity_count(teacher, Activity::DisciplineMeeting),
                expected_meetings,
                "{teacher}"
            );
        }
        runs.push(timetable);
    }

    // the team meeting stays in both runs
    for timetable in &runs {
        for teacher in ["Math_T1", "Art_T1"] {
            assert_eq!(timetable.activity_count(teacher, Activity::TeamMeeting), 1);
        }
    }
}

#[test]
fn test_reference_school_run() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, &reference_records());
    let runner = TimetableRunner::new(PumpkinSolver::new(), RunConfig::default());

    let report = runner.run(&store);
    assert!(report.outcome.is_complete(), "{:?}", report.outcome);
    assert!(report.audit.unwrap().is_clean());
    assert_eq!(store.read_class_schedule().unwrap().len(), 16 * 34);
}

#[test]
fn test_store_trait_object() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, &make_records(&[Day::Monday], small_policy()));
    let dynamic: &dyn TimetableStore = &store;
    let records = SchoolRecords::read_from(dynamic).unwrap();
    assert_eq!(records.teachers.len(), 2);
    assert_eq!(records.config, make_records(&[Day::Monday], small_policy()).config);
}
