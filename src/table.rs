//! Columnar export of a computed schedule for Gantt and table renderers.

use crate::schedule::{Schedule, TaskSchedule};
use crate::task::{Task, TaskId};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::HashMap;

/// `num_days_from_ce` of 1970-01-01; polars dates count days from there.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_to_i32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn series_from_dates(name: &'static str, dates: Vec<Option<NaiveDate>>) -> PolarsResult<Series> {
    let data: Vec<Option<i32>> = dates.into_iter().map(|d| d.map(date_to_i32)).collect();
    Series::new(PlSmallStr::from_static(name), data).cast(&DataType::Date)
}

/// One row per task in WBS display order. Tasks the schedule does not know
/// about (added since the recompute) follow at the end with empty dates.
pub fn schedule_frame(tasks: &[Task], schedule: &Schedule) -> PolarsResult<DataFrame> {
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    let mut rows: Vec<&Task> = schedule
        .display_order
        .iter()
        .filter_map(|id| by_id.get(id).copied())
        .collect();
    rows.extend(
        tasks
            .iter()
            .filter(|t| !schedule.wbs_codes.contains_key(&t.id)),
    );
    let entries: Vec<Option<&TaskSchedule>> = rows.iter().map(|t| schedule.get(t.id)).collect();

    let mut columns: Vec<Column> = Vec::with_capacity(17);

    let ids: Vec<i32> = rows.iter().map(|t| t.id).collect();
    columns.push(Series::new(PlSmallStr::from_static("id"), ids).into_column());

    let names: Vec<&str> = rows.iter().map(|t| t.name.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("name"), names).into_column());

    let wbs: Vec<Option<&str>> = rows.iter().map(|t| schedule.wbs_code(t.id)).collect();
    columns.push(Series::new(PlSmallStr::from_static("wbs_code"), wbs).into_column());

    let parents: Vec<Option<i32>> = rows.iter().map(|t| t.parent_id).collect();
    columns.push(Series::new(PlSmallStr::from_static("parent_id"), parents).into_column());

    let durations: Vec<i64> = rows
        .iter()
        .zip(&entries)
        .map(|(t, e)| e.map_or(t.duration_days, |e| e.duration_days))
        .collect();
    columns.push(Series::new(PlSmallStr::from_static("duration_days"), durations).into_column());

    let milestones: Vec<bool> = rows.iter().map(|t| t.is_milestone).collect();
    columns.push(Series::new(PlSmallStr::from_static("is_milestone"), milestones).into_column());

    let summaries: Vec<bool> = rows
        .iter()
        .zip(&entries)
        .map(|(t, e)| t.is_summary || e.is_some_and(|e| e.is_summary))
        .collect();
    columns.push(Series::new(PlSmallStr::from_static("is_summary"), summaries).into_column());

    let field = |pick: fn(&TaskSchedule) -> NaiveDate| -> Vec<Option<NaiveDate>> {
        entries.iter().map(|e| e.map(pick)).collect()
    };
    columns.push(series_from_dates("early_start", field(|e| e.early_start))?.into_column());
    columns.push(series_from_dates("early_finish", field(|e| e.early_finish))?.into_column());
    columns.push(series_from_dates("late_start", field(|e| e.late_start))?.into_column());
    columns.push(series_from_dates("late_finish", field(|e| e.late_finish))?.into_column());

    let total_float: Vec<Option<i64>> = entries.iter().map(|e| e.map(|e| e.total_float)).collect();
    columns.push(Series::new(PlSmallStr::from_static("total_float"), total_float).into_column());

    let critical: Vec<Option<bool>> = entries.iter().map(|e| e.map(|e| e.is_critical)).collect();
    columns.push(Series::new(PlSmallStr::from_static("is_critical"), critical).into_column());

    let percent: Vec<f64> = rows
        .iter()
        .zip(&entries)
        .map(|(t, e)| e.map_or(t.percent_complete, |e| e.percent_complete))
        .collect();
    columns.push(Series::new(PlSmallStr::from_static("percent_complete"), percent).into_column());

    let baseline_start: Vec<Option<NaiveDate>> = rows.iter().map(|t| t.baseline_start).collect();
    columns.push(series_from_dates("baseline_start", baseline_start)?.into_column());
    let baseline_finish: Vec<Option<NaiveDate>> = rows.iter().map(|t| t.baseline_finish).collect();
    columns.push(series_from_dates("baseline_finish", baseline_finish)?.into_column());

    let variance: Vec<Option<i64>> = entries
        .iter()
        .map(|e| e.and_then(|e| e.schedule_variance_days))
        .collect();
    columns.push(
        Series::new(PlSmallStr::from_static("schedule_variance_days"), variance).into_column(),
    );

    DataFrame::new(columns)
}
