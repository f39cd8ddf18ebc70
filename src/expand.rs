//! Expansion of plan data onto a contiguous calendar range.
//!
//! Calendar views consume exactly one `DayView` per requested date, gaps
//! included, so rendering never has to reason about missing days.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::plan::{DayDetails, ParsedPlan};
use crate::models::schedule::{DateRange, NewScheduleRow, PlanType, ScheduleRow};

/// Focus label of a synthesized day with no underlying plan data.
pub const NO_PLAN_FOCUS: &str = "No Plan Exists";

const DEFAULT_WORKOUT_FOCUS: &str = "Workout";
const DEFAULT_MEAL_FOCUS: &str = "Meals";

/// One calendar day as consumed by views: always present for every date in
/// the requested range, whether or not plan data exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayView {
  pub date: NaiveDate,
  pub focus: String,
  pub details: DayDetails,
  pub has_plan: bool,
}

impl DayView {
  pub fn sentinel(date: NaiveDate, plan_type: PlanType) -> Self {
    Self {
      date,
      focus: NO_PLAN_FOCUS.to_string(),
      details: DayDetails::empty(plan_type),
      has_plan: false,
    }
  }
}

/// A full week (or more) of sentinel days, used when a fetch fails outright.
pub fn sentinel_days(range: &DateRange, plan_type: PlanType) -> Vec<DayView> {
  range
    .iter()
    .map(|date| DayView::sentinel(date, plan_type))
    .collect()
}

/// Expand a freshly parsed plan onto a date range.
///
/// Source days carrying an explicit date are matched by date; days without
/// one are matched by ordinal position, which is how freshly generated plans
/// arrive. Output length always equals the range length, dates ascending.
pub fn expand_plan(plan: Option<&ParsedPlan>, range: &DateRange) -> Vec<DayView> {
  match plan {
    Some(ParsedPlan::Workout(workout)) => {
      let by_date: HashMap<NaiveDate, usize> = workout
        .days
        .iter()
        .enumerate()
        .filter_map(|(i, day)| day.date.map(|d| (d, i)))
        .collect();

      range
        .iter()
        .enumerate()
        .map(|(ordinal, date)| {
          let day = by_date
            .get(&date)
            .copied()
            .or_else(|| {
              workout
                .days
                .get(ordinal)
                .filter(|d| d.date.is_none())
                .map(|_| ordinal)
            })
            .and_then(|i| workout.days.get(i));

          match day {
            Some(day) if !day.exercises.is_empty() => DayView {
              date,
              focus: day
                .focus
                .clone()
                .unwrap_or_else(|| DEFAULT_WORKOUT_FOCUS.to_string()),
              details: DayDetails::Workout {
                exercises: day.exercises.clone(),
              },
              has_plan: true,
            },
            _ => DayView::sentinel(date, PlanType::Workout),
          }
        })
        .collect()
    }
    Some(ParsedPlan::Nutrition(nutrition)) => {
      let by_date: HashMap<NaiveDate, usize> = nutrition
        .days
        .iter()
        .enumerate()
        .filter_map(|(i, day)| day.date.map(|d| (d, i)))
        .collect();

      range
        .iter()
        .enumerate()
        .map(|(ordinal, date)| {
          let day = by_date
            .get(&date)
            .copied()
            .or_else(|| {
              nutrition
                .days
                .get(ordinal)
                .filter(|d| d.date.is_none())
                .map(|_| ordinal)
            })
            .and_then(|i| nutrition.days.get(i));

          match day {
            Some(day) if day.has_meals() => DayView {
              date,
              focus: DEFAULT_MEAL_FOCUS.to_string(),
              details: DayDetails::Nutrition {
                meals: day.meals().cloned().collect(),
              },
              has_plan: true,
            },
            _ => DayView::sentinel(date, PlanType::Meal),
          }
        })
        .collect()
    }
    None => sentinel_days(range, PlanType::Workout),
  }
}

/// Expand persisted rows onto a date range, matching by `for_date`.
///
/// A row whose payload is empty or unreadable becomes a sentinel day rather
/// than failing the view.
pub fn expand_rows(rows: &[ScheduleRow], plan_type: PlanType, range: &DateRange) -> Vec<DayView> {
  range
    .iter()
    .map(|date| {
      let row = rows.iter().find(|r| r.for_date == date);
      match row {
        Some(row) => match row.details() {
          Ok(details) if !details.is_empty() => DayView {
            date,
            focus: if row.summary.is_empty() {
              default_focus(plan_type).to_string()
            } else {
              row.summary.clone()
            },
            details,
            has_plan: true,
          },
          Ok(_) => DayView::sentinel(date, plan_type),
          Err(error) => {
            tracing::warn!(%date, %error, "unreadable details_json, treating day as empty");
            DayView::sentinel(date, plan_type)
          }
        },
        None => DayView::sentinel(date, plan_type),
      }
    })
    .collect()
}

fn default_focus(plan_type: PlanType) -> &'static str {
  match plan_type {
    PlanType::Workout => DEFAULT_WORKOUT_FOCUS,
    PlanType::Meal => DEFAULT_MEAL_FOCUS,
  }
}

/// Convert a parsed plan into draft rows for the requested range, one row
/// per day that actually has content. This is the save-side twin of
/// `expand_rows`.
pub fn draft_rows_from_plan(plan: &ParsedPlan, range: &DateRange) -> Vec<NewScheduleRow> {
  expand_plan(Some(plan), range)
    .into_iter()
    .filter(|day| day.has_plan)
    .map(|day| match day.details {
      DayDetails::Workout { exercises } => {
        NewScheduleRow::workout_day(day.date, &day.focus, exercises)
      }
      DayDetails::Nutrition { meals } => NewScheduleRow::meal_day(day.date, &day.focus, meals),
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
