//! The draft/approval schedule store.
//!
//! One `schedule` table holds both lifecycles, discriminated by `status`.
//! Generation writes draft rows wholesale (delete-then-insert over the
//! range); approval is a bulk status flip. Reads prefer drafts and fall back
//! to the approved schedule.
//!
//! Consistency model: batched inserts are sequential with no rollback of
//! earlier batches on failure, and status flips are two sequential
//! statements with no transaction. Concurrent regeneration of the same
//! (client, type, range) is last-write-wins. Callers recover from any write
//! failure by re-issuing the whole save.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::config::StoreConfig;
use crate::db::DbPool;
use crate::models::schedule::{DateRange, NewScheduleRow, PlanStatus, PlanType, ScheduleRow};

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("write timed out after {0:?}")]
  WriteTimeout(Duration),
}

/// Outcome of a draft save, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
  pub rows_written: usize,
  pub batches: usize,
}

/// ---------------------------------------------------------------------------
/// Plan Store
/// ---------------------------------------------------------------------------

pub struct PlanStore {
  pool: DbPool,
  config: StoreConfig,
}

impl PlanStore {
  pub fn new(pool: DbPool, config: StoreConfig) -> Self {
    Self { pool, config }
  }

  /// Replace the draft rows for a range wholesale and insert the new rows in
  /// fixed-size batches, sequentially.
  ///
  /// A failing batch aborts the save; batches already written stay in place,
  /// so callers must treat a failed save as "re-issue the whole thing", not
  /// as partially applied.
  pub async fn save_draft(
    &self,
    client_id: i64,
    plan_type: PlanType,
    range: &DateRange,
    rows: &[NewScheduleRow],
  ) -> Result<SaveOutcome, StoreError> {
    self
      .with_write_deadline(
        sqlx::query(
          r#"
          DELETE FROM schedule
          WHERE client_id = ?1 AND type = ?2 AND status = ?3
            AND for_date BETWEEN ?4 AND ?5
          "#,
        )
        .bind(client_id)
        .bind(plan_type)
        .bind(PlanStatus::Draft)
        .bind(range.start())
        .bind(range.end())
        .execute(&self.pool),
      )
      .await?;

    let batch_size = self.config.batch_size.max(1);
    let mut batches = 0;
    for chunk in rows.chunks(batch_size) {
      self.insert_batch(client_id, plan_type, chunk).await?;
      batches += 1;
    }

    tracing::debug!(
      client_id,
      plan_type = plan_type.as_str(),
      rows = rows.len(),
      batches,
      "draft saved"
    );

    Ok(SaveOutcome {
      rows_written: rows.len(),
      batches,
    })
  }

  async fn insert_batch(
    &self,
    client_id: i64,
    plan_type: PlanType,
    rows: &[NewScheduleRow],
  ) -> Result<(), StoreError> {
    if rows.is_empty() {
      return Ok(());
    }

    let mut sql = String::from(
      "INSERT INTO schedule \
       (client_id, type, task, for_date, for_time, summary, details_json, icon, status) VALUES ",
    );
    for i in 0..rows.len() {
      if i > 0 {
        sql.push_str(", ");
      }
      sql.push_str("(?, ?, ?, ?, ?, ?, ?, ?, ?)");
    }

    let mut query = sqlx::query(&sql);
    for row in rows {
      query = query
        .bind(client_id)
        .bind(plan_type)
        .bind(row.task.as_str())
        .bind(row.for_date)
        .bind(row.for_time)
        .bind(row.summary.as_str())
        .bind(row.details_json.as_str())
        .bind(row.icon.as_deref())
        .bind(PlanStatus::Draft);
    }

    self.with_write_deadline(query.execute(&self.pool)).await?;
    Ok(())
  }

  /// Range read with a status predicate, ordered by date.
  ///
  /// Wrapped in the read deadline: a timeout degrades to the empty-list
  /// fallback so calendar views stay renderable.
  pub async fn fetch_range(
    &self,
    client_id: i64,
    plan_type: PlanType,
    range: &DateRange,
    status: PlanStatus,
  ) -> Result<Vec<ScheduleRow>, StoreError> {
    let rows = sqlx::query_as::<_, ScheduleRow>(
      r#"
      SELECT id, client_id, type, task, for_date, for_time,
             summary, details_json, icon, status, created_at
      FROM schedule
      WHERE client_id = ?1 AND type = ?2 AND status = ?3
        AND for_date BETWEEN ?4 AND ?5
      ORDER BY for_date ASC
      "#,
    )
    .bind(client_id)
    .bind(plan_type)
    .bind(status)
    .bind(range.start())
    .bind(range.end())
    .fetch_all(&self.pool);

    read_or_fallback(self.config.read_timeout, "fetch_range", rows).await
  }

  /// Rows backing a calendar view: drafts when any exist in the range,
  /// otherwise the approved schedule.
  pub async fn fetch_for_view(
    &self,
    client_id: i64,
    plan_type: PlanType,
    range: &DateRange,
  ) -> Result<Vec<ScheduleRow>, StoreError> {
    let drafts = self
      .fetch_range(client_id, plan_type, range, PlanStatus::Draft)
      .await?;
    if !drafts.is_empty() {
      return Ok(drafts);
    }
    self
      .fetch_range(client_id, plan_type, range, PlanStatus::Approved)
      .await
  }

  /// Bulk approval flip over a range, not a row-by-row operation.
  ///
  /// Rows already holding the target status are cleared first so the flip
  /// cannot collide with the identity constraint. Returns the number of rows
  /// flipped.
  pub async fn set_approval(
    &self,
    client_id: i64,
    plan_type: PlanType,
    range: &DateRange,
    approved: bool,
  ) -> Result<u64, StoreError> {
    let (from, to) = if approved {
      (PlanStatus::Draft, PlanStatus::Approved)
    } else {
      (PlanStatus::Approved, PlanStatus::Draft)
    };

    self
      .with_write_deadline(
        sqlx::query(
          r#"
          DELETE FROM schedule
          WHERE client_id = ?1 AND type = ?2 AND status = ?3
            AND for_date BETWEEN ?4 AND ?5
          "#,
        )
        .bind(client_id)
        .bind(plan_type)
        .bind(to)
        .bind(range.start())
        .bind(range.end())
        .execute(&self.pool),
      )
      .await?;

    let result = self
      .with_write_deadline(
        sqlx::query(
          r#"
          UPDATE schedule SET status = ?1
          WHERE client_id = ?2 AND type = ?3 AND status = ?4
            AND for_date BETWEEN ?5 AND ?6
          "#,
        )
        .bind(to)
        .bind(client_id)
        .bind(plan_type)
        .bind(from)
        .bind(range.start())
        .bind(range.end())
        .execute(&self.pool),
      )
      .await?;

    tracing::debug!(
      client_id,
      plan_type = plan_type.as_str(),
      approved,
      rows = result.rows_affected(),
      "approval flipped"
    );

    Ok(result.rows_affected())
  }

  async fn with_write_deadline<T, F>(&self, fut: F) -> Result<T, StoreError>
  where
    F: Future<Output = Result<T, sqlx::Error>>,
  {
    match timeout(self.config.write_timeout, fut).await {
      Ok(result) => Ok(result?),
      Err(_) => Err(StoreError::WriteTimeout(self.config.write_timeout)),
    }
  }
}

/// Race a read against its deadline. Timeouts degrade to the type's default
/// (an empty list) instead of an error; actual query failures still surface.
async fn read_or_fallback<T, F>(
  deadline: Duration,
  operation: &str,
  fut: F,
) -> Result<T, StoreError>
where
  T: Default,
  F: Future<Output = Result<T, sqlx::Error>>,
{
  match timeout(deadline, fut).await {
    Ok(result) => Ok(result?),
    Err(_) => {
      tracing::warn!(
        operation,
        timeout_secs = deadline.as_secs(),
        "read timed out, returning empty fallback"
      );
      Ok(T::default())
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
