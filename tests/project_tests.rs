use chrono::NaiveDate;
use schedule_engine::dependency::Dependency;
use schedule_engine::edit::Edit;
use schedule_engine::error::{CalendarOwner, DependencyDefect, ScheduleError};
use schedule_engine::metadata::ScheduleMetadata;
use schedule_engine::project::{EditBatch, Project};
use schedule_engine::snapshot::ProjectSnapshot;
use schedule_engine::task::Task;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn two_task_project() -> Project {
    let mut project = Project::new(ScheduleMetadata::starting(d(2024, 1, 1)));
    project
        .apply(
            EditBatch::labeled("seed")
                .with(Edit::AddTask {
                    task: Task::new(1, "A", 3),
                })
                .with(Edit::AddTask {
                    task: Task::new(2, "B", 2),
                })
                .with(Edit::AddDependency {
                    dependency: Dependency::finish_to_start(1, 2),
                }),
        )
        .unwrap();
    project
}

#[test]
fn batch_is_all_or_nothing() {
    let mut project = two_task_project();
    let before = project.snapshot().clone();

    let err = project
        .apply(
            EditBatch::new()
                .with(Edit::AddTask {
                    task: Task::new(3, "C", 1),
                })
                .with(Edit::AddDependency {
                    dependency: Dependency::finish_to_start(3, 99),
                }),
        )
        .unwrap_err();
    assert_eq!(
        err,
        ScheduleError::MalformedDependency {
            predecessor: 3,
            successor: 99,
            defect: DependencyDefect::UnknownSuccessor,
        }
    );
    assert_eq!(project.snapshot(), &before);
    assert_eq!(project.history().undo_label(), Some("seed"));
}

#[test]
fn edits_wait_for_explicit_recompute() {
    let mut project = two_task_project();
    assert!(project.schedule().is_none());

    let finish = project.recompute().unwrap().get(2).unwrap().early_finish;
    assert_eq!(finish, d(2024, 1, 5));

    project
        .apply_edit(Edit::SetDuration {
            task_id: 1,
            duration_days: 5,
        })
        .unwrap();
    assert_eq!(project.schedule().unwrap().get(2).unwrap().early_finish, d(2024, 1, 5));

    project.recompute().unwrap();
    assert_eq!(project.schedule().unwrap().get(2).unwrap().early_finish, d(2024, 1, 9));
    assert_eq!(project.task(2).unwrap().early_finish, Some(d(2024, 1, 9)));
}

#[test]
fn failed_recompute_keeps_previous_schedule() {
    let mut project = two_task_project();
    let published = project.recompute().unwrap().clone();

    project
        .apply_edit(Edit::AddDependency {
            dependency: Dependency::finish_to_start(2, 1),
        })
        .unwrap();
    let err = project.recompute().unwrap_err();
    assert_eq!(
        err,
        ScheduleError::CircularDependency {
            task_ids: vec![1, 2]
        }
    );
    assert_eq!(project.schedule(), Some(&published));
    assert_eq!(project.last_error(), Some(&err));

    assert!(project.undo());
    project.recompute().unwrap();
    assert!(project.last_error().is_none());
}

#[test]
fn undo_and_redo_swap_structure() {
    let mut project = two_task_project();
    project.recompute().unwrap();
    project
        .apply_edit(Edit::AddTask {
            task: Task::new(3, "C", 1),
        })
        .unwrap();
    assert_eq!(project.tasks().len(), 3);

    assert!(project.undo());
    assert_eq!(project.tasks().len(), 2);
    // Computed fields of the published schedule are shown again.
    assert_eq!(project.task(1).unwrap().early_start, Some(d(2024, 1, 1)));

    assert!(project.redo());
    assert_eq!(project.tasks().len(), 3);
    assert_eq!(project.task(3).unwrap().early_start, None);
    assert!(!project.redo());

    assert!(project.undo());
    assert!(project.undo());
    assert!(project.tasks().is_empty());
    assert!(!project.undo());
}

#[test]
fn baseline_variance_counts_slipped_tasks() {
    let mut project = two_task_project();
    project.recompute().unwrap();
    project.apply_edit(Edit::CaptureBaseline).unwrap();
    assert_eq!(project.task(2).unwrap().baseline_finish, Some(d(2024, 1, 5)));
    assert_eq!(project.task(2).unwrap().baseline_duration_days, Some(2));

    project
        .apply_edit(Edit::SetDuration {
            task_id: 1,
            duration_days: 5,
        })
        .unwrap();
    let schedule = project.recompute().unwrap();
    assert_eq!(schedule.get(1).unwrap().schedule_variance_days, Some(2));
    assert_eq!(schedule.get(2).unwrap().schedule_variance_days, Some(2));

    let summary = schedule.summary();
    assert_eq!(summary.positive_variance_count, 2);
    assert!(summary.to_summary_line().contains("variance+=2"));
}

#[test]
fn indent_turns_previous_sibling_into_summary() {
    let mut project = two_task_project();
    project
        .apply_edit(Edit::AddTask {
            task: Task::new(3, "C", 1),
        })
        .unwrap();
    project.apply_edit(Edit::Indent { task_id: 3 }).unwrap();
    assert!(project.task(2).unwrap().is_summary);

    let schedule = project.recompute().unwrap();
    // The link into the new summary no longer takes part in precedence.
    assert!(schedule.get(2).unwrap().is_summary);
    assert_eq!(schedule.wbs_code(3), Some("2.1"));
    assert_eq!(schedule.get(3).unwrap().early_start, d(2024, 1, 1));

    project.apply_edit(Edit::Outdent { task_id: 3 }).unwrap();
    assert!(!project.task(2).unwrap().is_summary);
}

#[test]
fn dangling_calendar_in_loaded_snapshot_fails_whole_recompute() {
    let json = r#"{
        "metadata": {
            "project_name": "Bridge",
            "project_start_date": "2024-01-01"
        },
        "tasks": [
            {"id": 1, "name": "Survey", "duration_days": 2},
            {"id": 2, "name": "Night pour", "duration_days": 1, "calendar_id": "night"}
        ],
        "dependencies": [
            {"predecessor_id": 1, "successor_id": 2, "type": "FS"}
        ]
    }"#;
    let snapshot = ProjectSnapshot::from_json(json).unwrap();
    assert_eq!(snapshot.calendars.default_id(), "standard");

    let mut project = Project::from_snapshot(snapshot);
    let err = project.recompute().unwrap_err();
    assert_eq!(
        err,
        ScheduleError::UnresolvedCalendarReference {
            owner: CalendarOwner::Task(2),
            calendar_id: "night".into(),
        }
    );
    assert!(project.schedule().is_none());
}

#[test]
fn rejected_edits_name_the_problem() {
    let mut project = two_task_project();
    assert_eq!(
        project.apply_edit(Edit::AddTask {
            task: Task::new(1, "Again", 1),
        }),
        Err(ScheduleError::DuplicateTask(1))
    );
    assert_eq!(
        project.apply_edit(Edit::SetTaskCalendar {
            task_id: 1,
            calendar_id: Some("night".into()),
        }),
        Err(ScheduleError::UnresolvedCalendarReference {
            owner: CalendarOwner::Task(1),
            calendar_id: "night".into(),
        })
    );
    assert_eq!(
        project.apply_edit(Edit::RemoveTask { task_id: 42 }),
        Err(ScheduleError::UnknownTask(42))
    );
    assert!(matches!(
        project.apply_edit(Edit::SetProjectEnd {
            date: Some(d(2023, 12, 1)),
        }),
        Err(ScheduleError::ProjectEndBeforeStart { .. })
    ));
    assert!(matches!(
        project.apply_edit(Edit::SetPercentComplete {
            task_id: 1,
            percent_complete: 1.5,
        }),
        Err(ScheduleError::InvalidTask(_))
    ));
}

#[test]
fn milestone_promoted_to_summary_recomputes_repeatedly() {
    let mut project = Project::new(ScheduleMetadata::starting(d(2024, 1, 1)));
    project
        .apply(
            EditBatch::new()
                .with(Edit::AddTask {
                    task: Task::milestone(1, "Gate"),
                })
                .with(Edit::AddTask {
                    task: Task::new(2, "Work", 3),
                })
                .with(Edit::Indent { task_id: 2 }),
        )
        .unwrap();
    assert!(!project.task(1).unwrap().is_milestone);

    let first = project.recompute().unwrap().get(1).unwrap().duration_days;
    assert_eq!(first, 3);
    let second = project.recompute().unwrap().get(1).unwrap().duration_days;
    assert_eq!(second, 3);
    assert!(project.last_error().is_none());
}

#[test]
fn child_added_under_milestone_makes_it_a_summary() {
    let mut project = Project::new(ScheduleMetadata::starting(d(2024, 1, 1)));
    project
        .apply_edit(Edit::AddTask {
            task: Task::milestone(1, "Gate"),
        })
        .unwrap();
    project
        .apply_edit(Edit::AddTask {
            task: Task::new(2, "Work", 2).with_parent(1),
        })
        .unwrap();
    let gate = project.task(1).unwrap();
    assert!(gate.is_summary && !gate.is_milestone);
    project.recompute().unwrap();
    project.recompute().unwrap();
}

#[test]
fn oversized_duration_and_lag_are_rejected() {
    let mut project = two_task_project();
    assert!(matches!(
        project.apply_edit(Edit::SetDuration {
            task_id: 1,
            duration_days: 200_000_000,
        }),
        Err(ScheduleError::InvalidTask(_))
    ));
    assert_eq!(
        project.apply_edit(Edit::AddDependency {
            dependency: Dependency::finish_to_start(2, 1).with_lag(i64::MAX),
        }),
        Err(ScheduleError::MalformedDependency {
            predecessor: 2,
            successor: 1,
            defect: DependencyDefect::LagOutOfRange,
        })
    );

    // A loaded snapshot goes through the same checks before any date math.
    let mut snapshot = project.snapshot().clone();
    snapshot.dependencies[0].lag_days = i64::MIN;
    assert!(matches!(
        Project::from_snapshot(snapshot).recompute(),
        Err(ScheduleError::MalformedDependency {
            defect: DependencyDefect::LagOutOfRange,
            ..
        })
    ));
}
