//! Test utilities and helpers for integration and unit testing
//!
//! Provides common test infrastructure:
//! - In-memory database setup
//! - Row and plan fixtures

use chrono::{Duration, NaiveDate};

use crate::db::DbPool;
use crate::models::plan::{DayDetails, Exercise};
use crate::models::schedule::NewScheduleRow;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> DbPool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// ---------------------------------------------------------------------------
/// Fixtures
/// ---------------------------------------------------------------------------

/// A fixed Monday so range fixtures line up on week boundaries.
pub fn sample_monday() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 6, 16).expect("valid date")
}

pub fn mock_exercise(name: &str) -> Exercise {
  serde_json::from_value(serde_json::json!({
    "exercise_name": name,
    "category": "Strength",
    "body_part": "Full Body",
    "sets": 3,
    "reps": 10,
    "duration": "30 min",
    "weights": "bodyweight",
    "equipment": "yoga_mat",
    "coach_tip": "steady tempo",
    "rest": 60
  }))
  .expect("valid exercise fixture")
}

/// `count` consecutive draft-day rows starting at `start`, one per date.
pub fn mock_week_rows(start: NaiveDate, count: usize) -> Vec<NewScheduleRow> {
  (0..count)
    .map(|i| {
      let for_date = start + Duration::days(i as i64);
      let details = DayDetails::Workout {
        exercises: vec![mock_exercise(&format!("Exercise {}", i + 1))],
      };
      NewScheduleRow {
        for_date,
        for_time: None,
        task: "workout".to_string(),
        summary: format!("Day {} Focus", i + 1),
        details_json: serde_json::to_string(&details).expect("serializable fixture"),
        icon: None,
      }
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------
