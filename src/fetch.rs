//! Weekly and monthly calendar fetches.
//!
//! Views are composed from week-sized reads so a failure in one week never
//! takes down the rest of a monthly view: the failed week degrades to seven
//! sentinel days and composition continues. `fetch_view` itself cannot fail;
//! the calendar must always be renderable.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::expand::{expand_rows, sentinel_days, DayView};
use crate::models::schedule::{DateRange, PlanType, ScheduleRow};
use crate::store::{PlanStore, StoreError};

/// Read seam between view composition and the schedule store.
#[async_trait]
pub trait ScheduleSource {
  /// Rows backing a calendar view for one range: drafts preferred, approved
  /// schedule as fallback.
  async fn fetch_for_view(
    &self,
    client_id: i64,
    plan_type: PlanType,
    range: &DateRange,
  ) -> Result<Vec<ScheduleRow>, StoreError>;
}

#[async_trait]
impl ScheduleSource for PlanStore {
  async fn fetch_for_view(
    &self,
    client_id: i64,
    plan_type: PlanType,
    range: &DateRange,
  ) -> Result<Vec<ScheduleRow>, StoreError> {
    PlanStore::fetch_for_view(self, client_id, plan_type, range).await
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  Weekly,
  Monthly,
}

impl ViewMode {
  pub fn weeks(&self) -> u32 {
    match self {
      ViewMode::Weekly => 1,
      ViewMode::Monthly => 4,
    }
  }

  pub fn total_days(&self) -> usize {
    self.weeks() as usize * 7
  }
}

/// A fully expanded calendar view: one entry per date in the range, no gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanView {
  pub days: Vec<DayView>,
  pub view_mode: ViewMode,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub total_days: usize,
  pub has_any_plans: bool,
}

/// Fetch and expand a calendar view.
///
/// Weekly mode is a single fetch + expansion; monthly mode issues four
/// independent weekly fetches and concatenates them in date order.
pub async fn fetch_view<S>(
  source: &S,
  client_id: i64,
  plan_type: PlanType,
  start: NaiveDate,
  mode: ViewMode,
) -> PlanView
where
  S: ScheduleSource + Sync,
{
  let range = DateRange::weeks(start, mode.weeks());
  let mut days = Vec::with_capacity(mode.total_days());

  for (index, week) in range.split_weeks().enumerate() {
    match source.fetch_for_view(client_id, plan_type, &week).await {
      Ok(rows) => days.extend(expand_rows(&rows, plan_type, &week)),
      Err(error) => {
        tracing::warn!(
          week = index + 1,
          %error,
          "week fetch failed, filling with sentinel days"
        );
        days.extend(sentinel_days(&week, plan_type));
      }
    }
  }

  PlanView {
    has_any_plans: days.iter().any(|d| d.has_plan),
    total_days: days.len(),
    days,
    view_mode: mode,
    start_date: range.start(),
    end_date: range.end(),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::StoreConfig;
  use crate::expand::NO_PLAN_FOCUS;
  use crate::models::schedule::PlanStatus;
  use crate::test_utils::{mock_week_rows, sample_monday, setup_test_db};
  use chrono::Duration;

  const CLIENT: i64 = 34;

  /// Serves canned rows per week offset; listed weeks fail instead.
  struct ScriptedSource {
    start: NaiveDate,
    rows: Vec<ScheduleRow>,
    failing_weeks: Vec<usize>,
  }

  #[async_trait]
  impl ScheduleSource for ScriptedSource {
    async fn fetch_for_view(
      &self,
      _client_id: i64,
      _plan_type: PlanType,
      range: &DateRange,
    ) -> Result<Vec<ScheduleRow>, StoreError> {
      let week = ((range.start() - self.start).num_days() / 7) as usize;
      if self.failing_weeks.contains(&week) {
        return Err(StoreError::Database(sqlx::Error::PoolClosed));
      }
      Ok(
        self
          .rows
          .iter()
          .filter(|r| range.contains(r.for_date))
          .cloned()
          .collect(),
      )
    }
  }

  fn stored_row(id: i64, for_date: NaiveDate) -> ScheduleRow {
    let template = mock_week_rows(for_date, 1).remove(0);
    ScheduleRow {
      id,
      client_id: CLIENT,
      plan_type: PlanType::Workout,
      task: template.task,
      for_date,
      for_time: None,
      summary: template.summary,
      details_json: template.details_json,
      icon: None,
      status: PlanStatus::Draft,
      created_at: None,
    }
  }

  #[tokio::test]
  async fn test_monthly_view_isolates_a_failing_week() {
    let start = sample_monday();
    let rows: Vec<ScheduleRow> = (0..28)
      .map(|i| stored_row(i + 1, start + Duration::days(i)))
      .collect();
    let source = ScriptedSource {
      start,
      rows,
      failing_weeks: vec![1],
    };

    let view = fetch_view(&source, CLIENT, PlanType::Workout, start, ViewMode::Monthly).await;

    assert_eq!(view.days.len(), 28);
    assert_eq!(view.total_days, 28);
    assert!(view.has_any_plans);

    // Week 2 (days 7..14) degraded to sentinels; the other weeks populated.
    for (i, day) in view.days.iter().enumerate() {
      assert_eq!(day.date, start + Duration::days(i as i64));
      if (7..14).contains(&i) {
        assert!(!day.has_plan, "day {i} should be a sentinel");
        assert_eq!(day.focus, NO_PLAN_FOCUS);
      } else {
        assert!(day.has_plan, "day {i} should be populated");
      }
    }
  }

  #[tokio::test]
  async fn test_monthly_view_survives_every_week_failing() {
    let start = sample_monday();
    let source = ScriptedSource {
      start,
      rows: Vec::new(),
      failing_weeks: vec![0, 1, 2, 3],
    };

    let view = fetch_view(&source, CLIENT, PlanType::Workout, start, ViewMode::Monthly).await;

    assert_eq!(view.days.len(), 28);
    assert!(!view.has_any_plans);
    assert!(view.days.iter().all(|d| !d.has_plan));
  }

  #[tokio::test]
  async fn test_weekly_view_reads_store_end_to_end() {
    let pool = setup_test_db().await;
    let store = PlanStore::new(pool, StoreConfig::default());
    let start = sample_monday();
    let range = DateRange::weeks(start, 1);

    store
      .save_draft(CLIENT, PlanType::Workout, &range, &mock_week_rows(start, 3))
      .await
      .unwrap();

    let view = fetch_view(&store, CLIENT, PlanType::Workout, start, ViewMode::Weekly).await;

    assert_eq!(view.days.len(), 7);
    assert_eq!(view.view_mode, ViewMode::Weekly);
    assert_eq!(view.start_date, start);
    assert_eq!(view.end_date, start + Duration::days(6));
    assert_eq!(view.days.iter().filter(|d| d.has_plan).count(), 3);
  }

  #[tokio::test]
  async fn test_view_dates_are_gapless_and_ascending() {
    let start = sample_monday();
    let source = ScriptedSource {
      start,
      rows: Vec::new(),
      failing_weeks: Vec::new(),
    };

    let view = fetch_view(&source, CLIENT, PlanType::Workout, start, ViewMode::Monthly).await;

    let dates: Vec<_> = view.days.iter().map(|d| d.date).collect();
    for (i, date) in dates.iter().enumerate() {
      assert_eq!(*date, start + Duration::days(i as i64));
    }
  }
}
