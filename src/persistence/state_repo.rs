//! Work-state repository for `SQLite` persistence.
//!
//! The work state is a singleton row (id = 1) seeded on startup; every
//! read and write addresses that row explicitly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::work_state::{WorkState, WorkStatus};
use crate::{AppError, Result};

/// Repository wrapper around `SQLite` for the singleton work-state row.
#[derive(Clone)]
pub struct StateRepo {
    pool: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct StateRow {
    goal: String,
    goal_metric: String,
    current_task: Option<String>,
    current_task_context: Option<String>,
    current_task_id: Option<i64>,
    current_task_assigned_at: Option<String>,
    streak_days: i64,
    last_checkin: Option<String>,
    last_completion: Option<String>,
    last_progress_update: Option<String>,
    status: String,
}

impl StateRow {
    /// Convert a database row into the domain model.
    fn into_state(self) -> Result<WorkState> {
        let status = WorkStatus::parse(&self.status)
            .ok_or_else(|| AppError::Db(format!("invalid work status: {}", self.status)))?;

        Ok(WorkState {
            goal: self.goal,
            goal_metric: self.goal_metric,
            current_task: self.current_task,
            current_task_context: self.current_task_context,
            current_task_id: self.current_task_id,
            current_task_assigned_at: parse_opt_ts(
                self.current_task_assigned_at.as_deref(),
                "current_task_assigned_at",
            )?,
            streak_days: self.streak_days,
            last_checkin: parse_opt_ts(self.last_checkin.as_deref(), "last_checkin")?,
            last_completion: parse_opt_ts(self.last_completion.as_deref(), "last_completion")?,
            last_progress_update: parse_opt_ts(
                self.last_progress_update.as_deref(),
                "last_progress_update",
            )?,
            status,
        })
    }
}

fn parse_opt_ts(s: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>> {
    s.map(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
    })
    .transpose()
}

/// Fetch the singleton work state through any executor.
///
/// # Errors
///
/// Returns `AppError::Db` if the row is missing (not yet seeded) or the
/// query fails.
pub async fn fetch<'e, E>(executor: E) -> Result<WorkState>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let row: Option<StateRow> = sqlx::query_as("SELECT * FROM work_state WHERE id = 1")
        .fetch_optional(executor)
        .await?;
    row.ok_or_else(|| AppError::Db("work state row not seeded".into()))?
        .into_state()
}

/// Set the current-task field group through any executor.
///
/// # Errors
///
/// Returns `AppError::Db` if the statement fails.
pub async fn write_current<'e, E>(
    executor: E,
    task: &str,
    context: Option<&str>,
    task_id: i64,
) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "UPDATE work_state SET current_task = ?1, current_task_context = ?2,
         current_task_id = ?3, current_task_assigned_at = ?4, status = 'active'
         WHERE id = 1",
    )
    .bind(task)
    .bind(context)
    .bind(task_id)
    .bind(&now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Clear the current-task field group through any executor.
///
/// # Errors
///
/// Returns `AppError::Db` if the statement fails.
pub async fn clear_current<'e, E>(executor: E) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "UPDATE work_state SET current_task = NULL, current_task_context = NULL,
         current_task_id = NULL, current_task_assigned_at = NULL, status = 'active'
         WHERE id = 1",
    )
    .execute(executor)
    .await?;
    Ok(())
}

/// Increment the streak counter and stamp the completion time through any
/// executor.
///
/// # Errors
///
/// Returns `AppError::Db` if the statement fails.
pub async fn bump_streak<'e, E>(executor: E) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "UPDATE work_state SET streak_days = streak_days + 1, last_completion = ?1 WHERE id = 1",
    )
    .bind(&now)
    .execute(executor)
    .await?;
    Ok(())
}

impl StateRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Insert the singleton row if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn ensure_seeded(&self, goal: &str, goal_metric: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO work_state (id, goal, goal_metric, streak_days, status)
             VALUES (1, ?1, ?2, 0, 'active')",
        )
        .bind(goal)
        .bind(goal_metric)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    /// Read the singleton work state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the row is missing or the query fails.
    pub async fn get(&self) -> Result<WorkState> {
        fetch(self.pool.as_ref()).await
    }

    /// Assign the current-task field group.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn assign_current(
        &self,
        task: &str,
        context: Option<&str>,
        task_id: i64,
    ) -> Result<()> {
        write_current(self.pool.as_ref(), task, context, task_id).await
    }

    /// Clear the current-task field group.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn clear_current(&self) -> Result<()> {
        clear_current(self.pool.as_ref()).await
    }

    /// Set the operator status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn set_status(&self, status: WorkStatus) -> Result<()> {
        sqlx::query("UPDATE work_state SET status = ?1 WHERE id = 1")
            .bind(status.as_str())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Reset the streak counter to zero.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn reset_streak(&self) -> Result<()> {
        sqlx::query("UPDATE work_state SET streak_days = 0 WHERE id = 1")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Stamp the last check-in time.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn record_checkin(&self) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE work_state SET last_checkin = ?1 WHERE id = 1")
            .bind(&now)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
