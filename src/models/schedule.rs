//! Persisted schedule rows and the calendar ranges they are queried over.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::plan::{DayDetails, Exercise, Meal};

/// ---------------------------------------------------------------------------
/// Row Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanType {
  Workout,
  Meal,
}

impl PlanType {
  pub fn as_str(&self) -> &'static str {
    match self {
      PlanType::Workout => "workout",
      PlanType::Meal => "meal",
    }
  }
}

/// Lifecycle position of a stored plan row. Drafts are produced by
/// generation and reviewed; approved rows are the canonical schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanStatus {
  Draft,
  Approved,
}

impl PlanStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PlanStatus::Draft => "draft",
      PlanStatus::Approved => "approved",
    }
  }
}

/// One persisted plan day. `(client_id, type, for_date, status)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleRow {
  pub id: i64,
  pub client_id: i64,
  #[sqlx(rename = "type")]
  #[serde(rename = "type")]
  pub plan_type: PlanType,
  pub task: String,
  pub for_date: NaiveDate,
  pub for_time: Option<NaiveTime>,
  pub summary: String,
  pub details_json: String,
  pub icon: Option<String>,
  pub status: PlanStatus,
  pub created_at: Option<DateTime<Utc>>,
}

impl ScheduleRow {
  /// Decode the day payload. Rows written by older tooling may hold payloads
  /// this crate cannot read; callers treat a decode failure as "no plan".
  pub fn details(&self) -> Result<DayDetails, serde_json::Error> {
    serde_json::from_str(&self.details_json)
  }
}

/// For inserting new rows (without id, status, created_at).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScheduleRow {
  pub for_date: NaiveDate,
  pub for_time: Option<NaiveTime>,
  pub task: String,
  pub summary: String,
  pub details_json: String,
  pub icon: Option<String>,
}

impl NewScheduleRow {
  pub fn workout_day(for_date: NaiveDate, focus: &str, exercises: Vec<Exercise>) -> Self {
    Self {
      for_date,
      for_time: None,
      task: "workout".to_string(),
      summary: focus.to_string(),
      details_json: serde_json::to_string(&DayDetails::Workout { exercises })
        .unwrap_or_else(|_| String::from(r#"{"exercises":[]}"#)),
      icon: None,
    }
  }

  pub fn meal_day(for_date: NaiveDate, summary: &str, meals: Vec<Meal>) -> Self {
    Self {
      for_date,
      for_time: None,
      task: "meal".to_string(),
      summary: summary.to_string(),
      details_json: serde_json::to_string(&DayDetails::Nutrition { meals })
        .unwrap_or_else(|_| String::from(r#"{"meals":[]}"#)),
      icon: None,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Date Ranges
/// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
  #[error("range end {end} precedes start {start}")]
  EndBeforeStart { start: NaiveDate, end: NaiveDate },

  #[error("range of {days} days is not a whole number of weeks")]
  NotWholeWeeks { days: i64 },
}

/// An inclusive calendar range, always a whole number of 7-day weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  start: NaiveDate,
  end: NaiveDate,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
    if end < start {
      return Err(RangeError::EndBeforeStart { start, end });
    }
    let days = (end - start).num_days() + 1;
    if days % 7 != 0 {
      return Err(RangeError::NotWholeWeeks { days });
    }
    Ok(Self { start, end })
  }

  /// Range of `weeks` whole weeks starting at `start`. Zero weeks is
  /// meaningless; treated as one.
  pub fn weeks(start: NaiveDate, weeks: u32) -> Self {
    let weeks = weeks.max(1);
    let end = start + Duration::days(i64::from(weeks) * 7 - 1);
    Self { start, end }
  }

  pub fn start(&self) -> NaiveDate {
    self.start
  }

  pub fn end(&self) -> NaiveDate {
    self.end
  }

  pub fn len_days(&self) -> i64 {
    (self.end - self.start).num_days() + 1
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    date >= self.start && date <= self.end
  }

  /// Every date in the range, ascending.
  pub fn iter(&self) -> impl Iterator<Item = NaiveDate> {
    let start = self.start;
    (0..self.len_days()).map(move |offset| start + Duration::days(offset))
  }

  /// The range split into consecutive one-week subranges.
  pub fn split_weeks(&self) -> impl Iterator<Item = DateRange> {
    let start = self.start;
    (0..self.len_days() / 7).map(move |week| DateRange::weeks(start + Duration::days(week * 7), 1))
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
