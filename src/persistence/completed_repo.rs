//! Completed-task log repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use sqlx::SqlitePool;

use crate::models::completed::{CompletedTask, CompletionStats};
use crate::{AppError, Result};

/// Repository wrapper around `SQLite` for the append-only completion log.
#[derive(Clone)]
pub struct CompletedRepo {
    pool: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct CompletedRow {
    id: i64,
    task: String,
    context: Option<String>,
    completed_at: String,
    time_taken_minutes: Option<i64>,
    notes: Option<String>,
    project: Option<String>,
}

impl CompletedRow {
    /// Convert a database row into the domain model.
    fn into_completed(self) -> Result<CompletedTask> {
        let completed_at = DateTime::parse_from_rfc3339(&self.completed_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::Db(format!("invalid completed_at: {e}")))?;

        Ok(CompletedTask {
            id: self.id,
            task: self.task,
            context: self.context,
            completed_at,
            time_taken_minutes: self.time_taken_minutes,
            notes: self.notes,
            project: self.project,
        })
    }
}

/// Append one completion record through any executor (pool or transaction
/// connection).
///
/// # Errors
///
/// Returns `AppError::Db` if the insert fails.
pub async fn insert<'e, E>(
    executor: E,
    task: &str,
    context: Option<&str>,
    time_taken_minutes: Option<i64>,
    notes: Option<&str>,
    project: Option<&str>,
) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO completed_tasks (task, context, completed_at, time_taken_minutes, notes, project)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(task)
    .bind(context)
    .bind(&now)
    .bind(time_taken_minutes)
    .bind(notes)
    .bind(project)
    .execute(executor)
    .await?;
    Ok(())
}

impl CompletedRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Append one completion record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn log(
        &self,
        task: &str,
        context: Option<&str>,
        time_taken_minutes: Option<i64>,
        notes: Option<&str>,
        project: Option<&str>,
    ) -> Result<()> {
        insert(
            self.pool.as_ref(),
            task,
            context,
            time_taken_minutes,
            notes,
            project,
        )
        .await
    }

    /// List completions newest-first, optionally bounded to a start time.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self, since: Option<DateTime<Utc>>) -> Result<Vec<CompletedTask>> {
        let rows: Vec<CompletedRow> = if let Some(since) = since {
            sqlx::query_as(
                "SELECT * FROM completed_tasks WHERE completed_at >= ?1 ORDER BY completed_at DESC",
            )
            .bind(since.to_rfc3339())
            .fetch_all(self.pool.as_ref())
            .await?
        } else {
            sqlx::query_as("SELECT * FROM completed_tasks ORDER BY completed_at DESC")
                .fetch_all(self.pool.as_ref())
                .await?
        };

        rows.into_iter().map(CompletedRow::into_completed).collect()
    }

    /// Aggregate completion counters for all time, this week, and today.
    ///
    /// Weeks start on Sunday at midnight UTC.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any count query fails.
    pub async fn stats(&self) -> Result<CompletionStats> {
        let now = Utc::now();
        let start_of_day = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| AppError::Db("failed to compute start of day".into()))?;
        let start_of_week =
            start_of_day - Duration::days(i64::from(now.weekday().num_days_from_sunday()));

        let total = self.count_since(None).await?;
        let week = self.count_since(Some(start_of_week)).await?;
        let today = self.count_since(Some(start_of_day)).await?;

        Ok(CompletionStats {
            total_completed: total,
            completed_this_week: week,
            completed_today: today,
        })
    }

    async fn count_since(&self, since: Option<DateTime<Utc>>) -> Result<i64> {
        let row: (i64,) = if let Some(since) = since {
            sqlx::query_as("SELECT COUNT(*) FROM completed_tasks WHERE completed_at >= ?1")
                .bind(since.to_rfc3339())
                .fetch_one(self.pool.as_ref())
                .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM completed_tasks")
                .fetch_one(self.pool.as_ref())
                .await?
        };
        Ok(row.0)
    }
}
