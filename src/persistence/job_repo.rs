//! Dispatch job repository for `SQLite` persistence.
//!
//! Status transitions are guarded in SQL (`WHERE status = ...`) so that
//! terminal states are immutable even under concurrent reporters.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::dispatch::{Agent, DispatchJob, DispatchRequest, JobStatus, Target};
use crate::{AppError, Result};

/// Repository wrapper around `SQLite` for dispatch job records.
#[derive(Clone)]
pub struct JobRepo {
    pool: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    slack_message_ts: Option<String>,
    slack_channel_id: Option<String>,
    slack_thread_ts: Option<String>,
    agent: String,
    target: String,
    repo_path: Option<String>,
    task: String,
    track_as_task: i64,
    linked_task_id: Option<i64>,
    status: String,
    result: Option<String>,
    error_message: Option<String>,
    dispatched_by: Option<String>,
    parent_dispatch_id: Option<i64>,
    depth: i64,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
}

impl JobRow {
    /// Convert a database row into the domain model.
    fn into_job(self) -> Result<DispatchJob> {
        let agent = Agent::parse(&self.agent)
            .ok_or_else(|| AppError::Db(format!("invalid agent: {}", self.agent)))?;
        let target = Target::parse(&self.target)
            .ok_or_else(|| AppError::Db(format!("invalid target: {}", self.target)))?;
        let status = JobStatus::parse(&self.status)
            .ok_or_else(|| AppError::Db(format!("invalid job status: {}", self.status)))?;

        Ok(DispatchJob {
            id: self.id,
            slack_message_ts: self.slack_message_ts,
            slack_channel_id: self.slack_channel_id,
            slack_thread_ts: self.slack_thread_ts,
            agent,
            target,
            repo_path: self.repo_path,
            task: self.task,
            track_as_task: self.track_as_task != 0,
            linked_task_id: self.linked_task_id,
            status,
            result: self.result,
            error_message: self.error_message,
            dispatched_by: self.dispatched_by,
            parent_dispatch_id: self.parent_dispatch_id,
            depth: self.depth,
            created_at: parse_ts(&self.created_at, "created_at")?,
            started_at: parse_opt_ts(self.started_at.as_deref(), "started_at")?,
            completed_at: parse_opt_ts(self.completed_at.as_deref(), "completed_at")?,
        })
    }
}

fn parse_ts(s: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

fn parse_opt_ts(s: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>> {
    s.map(|raw| parse_ts(raw, field)).transpose()
}

impl JobRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Insert a new job in `pending` status and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn create(&self, request: &DispatchRequest) -> Result<DispatchJob> {
        let now = Utc::now().to_rfc3339();
        let res = sqlx::query(
            "INSERT INTO dispatch_jobs (slack_message_ts, slack_channel_id, slack_thread_ts,
             agent, target, repo_path, task, track_as_task, linked_task_id, dispatched_by,
             parent_dispatch_id, depth, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, ?10, ?11, 'pending', ?12)",
        )
        .bind(&request.slack_message_ts)
        .bind(&request.slack_channel_id)
        .bind(&request.slack_thread_ts)
        .bind(request.agent.as_str())
        .bind(request.target.as_str())
        .bind(&request.repo_path)
        .bind(&request.task)
        .bind(i64::from(request.track_as_task))
        .bind(&request.dispatched_by)
        .bind(request.parent_dispatch_id)
        .bind(request.depth)
        .bind(&now)
        .execute(self.pool.as_ref())
        .await?;

        let id = res.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| AppError::Db(format!("job {id} missing after insert")))
    }

    /// Retrieve a job by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get(&self, id: i64) -> Result<Option<DispatchJob>> {
        let row: Option<JobRow> = sqlx::query_as("SELECT * FROM dispatch_jobs WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.map(JobRow::into_job).transpose()
    }

    /// List the most recent jobs, newest-first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<DispatchJob>> {
        let rows: Vec<JobRow> =
            sqlx::query_as("SELECT * FROM dispatch_jobs ORDER BY created_at DESC, id DESC LIMIT ?1")
                .bind(limit)
                .fetch_all(self.pool.as_ref())
                .await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    /// List pending jobs awaiting pickup for a target.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn pending_for_target(&self, target: Target) -> Result<Vec<DispatchJob>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            "SELECT * FROM dispatch_jobs WHERE target = ?1 AND status = 'pending'
             ORDER BY created_at ASC, id ASC",
        )
        .bind(target.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    /// Transition a pending job to `running` and stamp the start time.
    ///
    /// Returns `false` if the job was not in `pending` (already picked up
    /// or terminal), leaving it untouched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn mark_running(&self, id: i64) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let res = sqlx::query(
            "UPDATE dispatch_jobs SET status = 'running', started_at = ?1
             WHERE id = ?2 AND status = 'pending'",
        )
        .bind(&now)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Transition a non-terminal job to `completed` or `failed`, storing
    /// the result or error text and stamping the completion time.
    ///
    /// Returns `false` if the job was already terminal, leaving it untouched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn finish(&self, id: i64, success: bool, text: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let res = if success {
            sqlx::query(
                "UPDATE dispatch_jobs SET status = 'completed', result = ?1, completed_at = ?2
                 WHERE id = ?3 AND status IN ('pending', 'running')",
            )
            .bind(text)
            .bind(&now)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?
        } else {
            sqlx::query(
                "UPDATE dispatch_jobs SET status = 'failed', error_message = ?1, completed_at = ?2
                 WHERE id = ?3 AND status IN ('pending', 'running')",
            )
            .bind(text)
            .bind(&now)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?
        };
        Ok(res.rows_affected() > 0)
    }

    /// Fail a job only if it is still `pending` (cancellation path).
    ///
    /// Returns `false` if the job had already started or finished.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn fail_if_pending(&self, id: i64, error: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let res = sqlx::query(
            "UPDATE dispatch_jobs SET status = 'failed', error_message = ?1, completed_at = ?2
             WHERE id = ?3 AND status = 'pending'",
        )
        .bind(error)
        .bind(&now)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Record the queue task that tracks a dispatch job.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn set_linked_task(&self, id: i64, task_id: i64) -> Result<()> {
        sqlx::query("UPDATE dispatch_jobs SET linked_task_id = ?1 WHERE id = ?2")
            .bind(task_id)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
