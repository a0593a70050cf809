use crate::error::{CalendarOwner, ScheduleError};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Id under which the Mon-Fri calendar is registered when nothing else is configured.
pub const DEFAULT_CALENDAR_ID: &str = "standard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a work calendar requires at least one working weekday")]
pub struct EmptyWorkWeek;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    /// Non-working, even if the weekday normally works.
    Holiday,
    /// Working, even if the weekday is normally off.
    WorkingDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarException {
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CalendarException {
    pub fn holiday(date: NaiveDate) -> Self {
        Self {
            date,
            kind: ExceptionKind::Holiday,
            name: None,
        }
    }

    pub fn working_day(date: NaiveDate) -> Self {
        Self {
            date,
            kind: ExceptionKind::WorkingDay,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Weekly working pattern plus dated exceptions.
///
/// Exceptions always win over the weekly pattern. At least one weekday must
/// be a working day, which keeps every working-day search finite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorkCalendarConfig", into = "WorkCalendarConfig")]
pub struct WorkCalendar {
    name: String,
    non_working_days: HashSet<Weekday>,
    exceptions: BTreeMap<NaiveDate, CalendarException>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    #[serde(default = "WorkCalendarConfig::default_name")]
    name: String,
    working_days: Vec<Weekday>,
    #[serde(default)]
    exceptions: Vec<CalendarException>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::standard()
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Monday to Friday, no exceptions.
    pub fn standard() -> Self {
        Self {
            name: "Standard".to_string(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
            exceptions: BTreeMap::new(),
        }
    }

    pub fn custom<I, J>(working_days: I, holidays: J) -> Result<Self, EmptyWorkWeek>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = WorkCalendarConfig::new(
            "Custom",
            working_days,
            holidays.into_iter().map(CalendarException::holiday),
        );
        Self::from_config(&config)
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, EmptyWorkWeek> {
        let non_working_days = Self::non_working_from(&config.working_days)?;
        let exceptions = config
            .exceptions
            .iter()
            .map(|ex| (ex.date, ex.clone()))
            .collect();
        Ok(Self {
            name: config.name.clone(),
            non_working_days,
            exceptions,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    fn non_working_from(working_days: &[Weekday]) -> Result<HashSet<Weekday>, EmptyWorkWeek> {
        if working_days.is_empty() {
            return Err(EmptyWorkWeek);
        }
        Ok(Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_days.contains(day))
            .collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Working weekdays, Monday first.
    pub fn working_weekdays(&self) -> Vec<Weekday> {
        Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !self.non_working_days.contains(day))
            .collect()
    }

    /// Replace the working week. Fails, leaving the calendar unchanged, when
    /// `days` names no weekday.
    pub fn set_working_days(&mut self, days: &[Weekday]) -> Result<(), EmptyWorkWeek> {
        self.non_working_days = Self::non_working_from(days)?;
        Ok(())
    }

    pub fn exceptions(&self) -> impl Iterator<Item = &CalendarException> {
        self.exceptions.values()
    }

    /// Add or replace the exception for its date.
    pub fn add_exception(&mut self, exception: CalendarException) {
        self.exceptions.insert(exception.date, exception);
    }

    pub fn remove_exception(&mut self, date: NaiveDate) -> Option<CalendarException> {
        self.exceptions.remove(&date)
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.add_exception(CalendarException::holiday(date));
    }

    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        for date in dates {
            self.add_holiday(*date);
        }
    }

    pub fn add_working_day(&mut self, date: NaiveDate) {
        self.add_exception(CalendarException::working_day(date));
    }

    /// Add the same holiday (e.g. Dec 24) for every year in the range.
    pub fn add_recurring_holiday(&mut self, month: u32, day: u32, start_year: i32, end_year: i32) {
        for year in start_year..=end_year {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.add_holiday(date);
            }
        }
    }

    /// Add a holiday on the nth weekday of a month (e.g. 4th Thursday of November).
    /// Years whose month has no nth such weekday are skipped.
    pub fn add_recurring_weekday_holiday(
        &mut self,
        month: u32,
        weekday: Weekday,
        n: u8,
        start_year: i32,
        end_year: i32,
    ) {
        for year in start_year..=end_year {
            if let Some(date) = NaiveDate::from_weekday_of_month_opt(year, month, weekday, n) {
                self.add_holiday(date);
            }
        }
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        match self.exceptions.get(&date) {
            Some(exception) => exception.kind == ExceptionKind::WorkingDay,
            None => !self.non_working_days.contains(&date.weekday()),
        }
    }

    /// First working day strictly after `from`. Saturates at the last date
    /// chrono can represent.
    pub fn next_working_day(&self, from: NaiveDate) -> NaiveDate {
        let mut current = from;
        while let Some(next) = current.succ_opt() {
            current = next;
            if self.is_working_day(current) {
                break;
            }
        }
        current
    }

    /// Last working day strictly before `from`. Saturates at the first date
    /// chrono can represent.
    pub fn previous_working_day(&self, from: NaiveDate) -> NaiveDate {
        let mut current = from;
        while let Some(previous) = current.pred_opt() {
            current = previous;
            if self.is_working_day(current) {
                break;
            }
        }
        current
    }

    /// `date` itself when it is a working day, otherwise the next one.
    pub fn align_forward(&self, date: NaiveDate) -> NaiveDate {
        if self.is_working_day(date) {
            date
        } else {
            self.next_working_day(date)
        }
    }

    /// `date` itself when it is a working day, otherwise the previous one.
    pub fn align_backward(&self, date: NaiveDate) -> NaiveDate {
        if self.is_working_day(date) {
            date
        } else {
            self.previous_working_day(date)
        }
    }

    /// Move `n` working days away from `date` (backwards when `n` is negative).
    ///
    /// Non-working days are skipped, so any non-zero offset lands on a working
    /// day. A zero offset returns `date` unchanged even if it is non-working.
    pub fn add_working_days(&self, date: NaiveDate, n: i64) -> NaiveDate {
        let mut current = date;
        if n > 0 {
            for _ in 0..n {
                current = self.next_working_day(current);
            }
        } else {
            for _ in 0..n.unsigned_abs() {
                current = self.previous_working_day(current);
            }
        }
        current
    }

    /// Signed number of working days from `start` to `end`.
    ///
    /// Counts the working days in `(start, end]`, negated when `end` precedes
    /// `start`. Between two working days this is the inverse of
    /// [`add_working_days`](Self::add_working_days).
    pub fn working_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if start == end {
            return 0;
        }
        if start < end {
            start.succ_opt().map_or(0, |from| self.count_working_days(from, end))
        } else {
            -end.succ_opt().map_or(0, |from| self.count_working_days(from, start))
        }
    }

    /// Working days in `[start, end]`, inclusive on both ends.
    pub fn count_working_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_working_day(*day))
            .count() as i64
    }

    pub fn working_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_working_day(*day))
            .collect()
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(name: impl Into<String>, working_days: I, exceptions: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = CalendarException>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        // Later exceptions replace earlier ones for the same date.
        let by_date: BTreeMap<NaiveDate, CalendarException> =
            exceptions.into_iter().map(|ex| (ex.date, ex)).collect();

        Self {
            name: name.into(),
            working_days: working,
            exceptions: by_date.into_values().collect(),
        }
    }

    fn default_name() -> String {
        "Standard".to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn exceptions(&self) -> &[CalendarException] {
        &self.exceptions
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::standard())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        Self {
            name: calendar.name.clone(),
            working_days: calendar.working_weekdays(),
            exceptions: calendar.exceptions.values().cloned().collect(),
        }
    }
}

impl From<WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: WorkCalendar) -> Self {
        WorkCalendarConfig::from(&calendar)
    }
}

impl TryFrom<WorkCalendarConfig> for WorkCalendar {
    type Error = EmptyWorkWeek;

    fn try_from(config: WorkCalendarConfig) -> Result<Self, Self::Error> {
        WorkCalendar::from_config(&config)
    }
}

/// Calendars of one project, keyed by id, with one designated default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSet {
    default_id: String,
    calendars: BTreeMap<String, WorkCalendar>,
}

impl Default for CalendarSet {
    fn default() -> Self {
        Self::new(DEFAULT_CALENDAR_ID, WorkCalendar::standard())
    }
}

impl CalendarSet {
    pub fn new(default_id: impl Into<String>, default_calendar: WorkCalendar) -> Self {
        let default_id = default_id.into();
        let mut calendars = BTreeMap::new();
        calendars.insert(default_id.clone(), default_calendar);
        Self {
            default_id,
            calendars,
        }
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Fails when the project default calendar is missing, which can only
    /// happen for a set that was deserialized by hand.
    pub fn default_calendar(&self) -> Result<&WorkCalendar, ScheduleError> {
        self.calendars
            .get(&self.default_id)
            .ok_or_else(|| ScheduleError::UnresolvedCalendarReference {
                owner: CalendarOwner::Project,
                calendar_id: self.default_id.clone(),
            })
    }

    pub fn set_default(&mut self, calendar_id: &str) -> Result<(), ScheduleError> {
        if !self.calendars.contains_key(calendar_id) {
            return Err(ScheduleError::UnknownCalendar(calendar_id.to_string()));
        }
        self.default_id = calendar_id.to_string();
        Ok(())
    }

    pub fn get(&self, calendar_id: &str) -> Option<&WorkCalendar> {
        self.calendars.get(calendar_id)
    }

    pub fn get_mut(&mut self, calendar_id: &str) -> Option<&mut WorkCalendar> {
        self.calendars.get_mut(calendar_id)
    }

    pub fn contains(&self, calendar_id: &str) -> bool {
        self.calendars.contains_key(calendar_id)
    }

    /// Insert or replace a calendar, returning the previous one.
    pub fn insert(
        &mut self,
        calendar_id: impl Into<String>,
        calendar: WorkCalendar,
    ) -> Option<WorkCalendar> {
        self.calendars.insert(calendar_id.into(), calendar)
    }

    /// The default calendar cannot be removed.
    pub fn remove(&mut self, calendar_id: &str) -> Result<WorkCalendar, ScheduleError> {
        if calendar_id == self.default_id {
            return Err(ScheduleError::CalendarInUse {
                calendar_id: calendar_id.to_string(),
                owner: CalendarOwner::Project,
            });
        }
        self.calendars
            .remove(calendar_id)
            .ok_or_else(|| ScheduleError::UnknownCalendar(calendar_id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.calendars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}
