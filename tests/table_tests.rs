use chrono::NaiveDate;
use polars::prelude::*;
use schedule_engine::dependency::Dependency;
use schedule_engine::engine::recompute;
use schedule_engine::metadata::ScheduleMetadata;
use schedule_engine::snapshot::ProjectSnapshot;
use schedule_engine::table::schedule_frame;
use schedule_engine::task::Task;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn epoch_days(date: NaiveDate) -> i32 {
    (date - d(1970, 1, 1)).num_days() as i32
}

fn phased_snapshot() -> ProjectSnapshot {
    ProjectSnapshot {
        metadata: ScheduleMetadata::starting(d(2024, 1, 1)),
        tasks: vec![
            Task::summary(1, "Phase"),
            Task::new(2, "A", 3).with_parent(1),
            Task::new(3, "B", 2).with_parent(1),
            Task::new(4, "C", 1),
        ],
        dependencies: vec![Dependency::finish_to_start(2, 3)],
        ..ProjectSnapshot::default()
    }
}

#[test]
fn frame_rows_follow_wbs_order() -> PolarsResult<()> {
    let mut snapshot = phased_snapshot();
    let schedule = recompute(&snapshot).unwrap();
    // Added after the recompute: listed last with no computed values.
    snapshot.tasks.push(Task::new(5, "Late addition", 2));

    let df = schedule_frame(&snapshot.tasks, &schedule)?;
    assert_eq!(df.height(), 5);

    let ids: Vec<Option<i32>> = df.column("id")?.i32()?.into_iter().collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);

    let codes: Vec<Option<&str>> = df.column("wbs_code")?.str()?.into_iter().collect();
    assert_eq!(codes, vec![Some("1"), Some("1.1"), Some("1.2"), Some("2"), None]);

    let parents = df.column("parent_id")?.i32()?;
    assert_eq!(parents.get(1), Some(1));
    assert_eq!(parents.get(3), None);

    let summaries = df.column("is_summary")?.bool()?;
    assert_eq!(summaries.get(0), Some(true));
    assert_eq!(summaries.get(1), Some(false));

    let durations = df.column("duration_days")?.i64()?;
    assert_eq!(durations.get(0), Some(5));
    assert_eq!(durations.get(4), Some(2));
    Ok(())
}

#[test]
fn frame_dates_are_polars_dates() -> PolarsResult<()> {
    let snapshot = phased_snapshot();
    let schedule = recompute(&snapshot).unwrap();
    let df = schedule_frame(&snapshot.tasks, &schedule)?;

    for name in ["early_start", "early_finish", "late_start", "late_finish", "baseline_finish"] {
        assert_eq!(df.column(name)?.dtype(), &DataType::Date, "{name}");
    }

    let early_finish = df.column("early_finish")?.cast(&DataType::Int32)?;
    let early_finish = early_finish.i32()?;
    assert_eq!(early_finish.get(0), Some(epoch_days(d(2024, 1, 5))));
    assert_eq!(early_finish.get(2), Some(epoch_days(d(2024, 1, 5))));

    let late_start = df.column("late_start")?.cast(&DataType::Int32)?;
    assert_eq!(late_start.i32()?.get(3), Some(epoch_days(d(2024, 1, 5))));

    let float = df.column("total_float")?.i64()?;
    assert_eq!(float.get(3), Some(4));
    let critical = df.column("is_critical")?.bool()?;
    assert_eq!(critical.get(2), Some(true));
    assert_eq!(critical.get(3), Some(false));

    // No baseline captured yet.
    assert_eq!(df.column("baseline_finish")?.null_count(), 4);
    assert_eq!(df.column("schedule_variance_days")?.null_count(), 4);
    Ok(())
}
