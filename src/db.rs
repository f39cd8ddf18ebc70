use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub type DbPool = SqlitePool;

/// Initialize the database connection pool and run migrations.
///
/// `database_url` is a SQLite URL, e.g. `sqlite://plans.db?mode=rwc` or
/// `sqlite::memory:` for tests.
pub async fn initialize_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!(url = database_url, "database initialized");

  Ok(pool)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_initialize_db_runs_migrations() {
    let path = std::env::temp_dir().join(format!("coach-plan-test-{}.db", std::process::id()));
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let pool = initialize_db(&url).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedule")
      .fetch_one(&pool)
      .await
      .unwrap();
    assert_eq!(count, 0);

    pool.close().await;
    let _ = std::fs::remove_file(&path);
  }
}

