//! Task queue repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::task::{NewTask, QueuedTask, TaskUpdate};
use crate::{AppError, Result};

/// Canonical queue ordering: priority descending, insertion order ascending.
const QUEUE_ORDER: &str = "ORDER BY priority DESC, added_at ASC, id ASC";

/// Repository wrapper around `SQLite` for queued-task records.
#[derive(Clone)]
pub struct TaskRepo {
    pool: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    task: String,
    context: Option<String>,
    priority: i64,
    estimated_minutes: Option<i64>,
    project: Option<String>,
    added_at: String,
    added_by: Option<String>,
    blocked_by: String,
    due_date: Option<String>,
    tags: String,
    notion_page_id: Option<String>,
}

impl TaskRow {
    /// Convert a database row into the domain model.
    fn into_task(self) -> Result<QueuedTask> {
        let added_at = parse_ts(&self.added_at, "added_at")?;
        let due_date = self
            .due_date
            .as_deref()
            .map(|s| parse_ts(s, "due_date"))
            .transpose()?;
        let blocked_by: Vec<i64> = serde_json::from_str(&self.blocked_by)
            .map_err(|e| AppError::Db(format!("invalid blocked_by: {e}")))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| AppError::Db(format!("invalid tags: {e}")))?;

        Ok(QueuedTask {
            id: self.id,
            task: self.task,
            context: self.context,
            priority: self.priority,
            estimated_minutes: self.estimated_minutes,
            project: self.project,
            added_at,
            added_by: self.added_by,
            blocked_by,
            due_date,
            tags,
            notion_page_id: self.notion_page_id,
        })
    }
}

fn parse_ts(s: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

fn encode_ids(ids: &[i64]) -> Result<String> {
    serde_json::to_string(ids).map_err(|e| AppError::Db(format!("encode blocked_by: {e}")))
}

/// Fetch a queued task by identifier through any executor (pool or
/// transaction connection).
///
/// # Errors
///
/// Returns `AppError::Db` if the query fails.
pub async fn fetch_by_id<'e, E>(executor: E, id: i64) -> Result<Option<QueuedTask>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM task_queue WHERE id = ?1")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    row.map(TaskRow::into_task).transpose()
}

/// Fetch the head of the queue in canonical order through any executor.
///
/// # Errors
///
/// Returns `AppError::Db` if the query fails.
pub async fn fetch_first<'e, E>(executor: E) -> Result<Option<QueuedTask>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = format!("SELECT * FROM task_queue {QUEUE_ORDER} LIMIT 1");
    let row: Option<TaskRow> = sqlx::query_as(&sql).fetch_optional(executor).await?;
    row.map(TaskRow::into_task).transpose()
}

/// Fetch the whole queue in canonical order through any executor.
///
/// # Errors
///
/// Returns `AppError::Db` if the query fails.
pub async fn fetch_all<'e, E>(executor: E) -> Result<Vec<QueuedTask>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = format!("SELECT * FROM task_queue {QUEUE_ORDER}");
    let rows: Vec<TaskRow> = sqlx::query_as(&sql).fetch_all(executor).await?;
    rows.into_iter().map(TaskRow::into_task).collect()
}

/// Delete a queued task by identifier through any executor. Returns
/// whether a row was removed.
///
/// # Errors
///
/// Returns `AppError::Db` if the statement fails.
pub async fn delete_by_id<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let res = sqlx::query("DELETE FROM task_queue WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Rewrite the `blocked_by` set of a queued task through any executor.
///
/// # Errors
///
/// Returns `AppError::Db` if the statement fails.
pub async fn write_blocked_by<'e, E>(executor: E, id: i64, blocked_by: &[i64]) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let encoded = encode_ids(blocked_by)?;
    sqlx::query("UPDATE task_queue SET blocked_by = ?1 WHERE id = ?2")
        .bind(&encoded)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

impl TaskRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Insert a new queued task and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the priority is outside `0..=10`,
    /// or `AppError::Db` if the insert fails.
    pub async fn create(&self, new: &NewTask) -> Result<QueuedTask> {
        if !(0..=crate::models::task::MAX_PRIORITY).contains(&new.priority) {
            return Err(AppError::Validation(format!(
                "priority must be 0..=10, got {}",
                new.priority
            )));
        }

        let added_at = Utc::now().to_rfc3339();
        let blocked_by = encode_ids(&new.blocked_by)?;
        let tags = serde_json::to_string(&new.tags)
            .map_err(|e| AppError::Db(format!("encode tags: {e}")))?;
        let due_date = new.due_date.map(|dt| dt.to_rfc3339());

        let res = sqlx::query(
            "INSERT INTO task_queue (task, context, priority, estimated_minutes, project,
             added_at, added_by, blocked_by, due_date, tags, notion_page_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&new.task)
        .bind(&new.context)
        .bind(new.priority)
        .bind(new.estimated_minutes)
        .bind(&new.project)
        .bind(&added_at)
        .bind(&new.added_by)
        .bind(&blocked_by)
        .bind(&due_date)
        .bind(&tags)
        .bind(&new.notion_page_id)
        .execute(self.pool.as_ref())
        .await?;

        let id = res.last_insert_rowid();
        fetch_by_id(self.pool.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::Db(format!("task {id} missing after insert")))
    }

    /// Retrieve a queued task by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get(&self, id: i64) -> Result<Option<QueuedTask>> {
        fetch_by_id(self.pool.as_ref(), id).await
    }

    /// List the whole queue in canonical order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<QueuedTask>> {
        fetch_all(self.pool.as_ref()).await
    }

    /// Count queued tasks.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM task_queue")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(row.0)
    }

    /// Apply a field-level update to a queued task.
    ///
    /// Returns `Ok(None)` if the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the update is empty, or
    /// `AppError::Db` if persistence fails.
    pub async fn update(&self, id: i64, update: &TaskUpdate) -> Result<Option<QueuedTask>> {
        if update.is_empty() {
            return Err(AppError::Validation("no update fields supplied".into()));
        }

        let Some(mut current) = self.get(id).await? else {
            return Ok(None);
        };

        if let Some(ref task) = update.task {
            current.task.clone_from(task);
        }
        if let Some(ref context) = update.context {
            current.context.clone_from(context);
        }
        if let Some(estimated) = update.estimated_minutes {
            current.estimated_minutes = estimated;
        }
        if let Some(ref project) = update.project {
            current.project.clone_from(project);
        }
        if let Some(due_date) = update.due_date {
            current.due_date = due_date;
        }
        if let Some(ref tags) = update.tags {
            current.tags.clone_from(tags);
        }

        let tags = serde_json::to_string(&current.tags)
            .map_err(|e| AppError::Db(format!("encode tags: {e}")))?;
        let due_date = current.due_date.map(|dt| dt.to_rfc3339());

        sqlx::query(
            "UPDATE task_queue SET task = ?1, context = ?2, estimated_minutes = ?3,
             project = ?4, due_date = ?5, tags = ?6 WHERE id = ?7",
        )
        .bind(&current.task)
        .bind(&current.context)
        .bind(current.estimated_minutes)
        .bind(&current.project)
        .bind(&due_date)
        .bind(&tags)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(Some(current))
    }

    /// Change the priority of a queued task.
    ///
    /// Returns `Ok(None)` if the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the priority is outside `0..=10`,
    /// or `AppError::Db` if persistence fails.
    pub async fn reprioritize(&self, id: i64, priority: i64) -> Result<Option<QueuedTask>> {
        if !(0..=crate::models::task::MAX_PRIORITY).contains(&priority) {
            return Err(AppError::Validation(format!(
                "priority must be 0..=10, got {priority}"
            )));
        }

        let res = sqlx::query("UPDATE task_queue SET priority = ?1 WHERE id = ?2")
            .bind(priority)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Delete a queued task, returning the removed record.
    ///
    /// Returns `Ok(None)` if the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if persistence fails.
    pub async fn delete(&self, id: i64) -> Result<Option<QueuedTask>> {
        let Some(task) = self.get(id).await? else {
            return Ok(None);
        };
        delete_by_id(self.pool.as_ref(), id).await?;
        Ok(Some(task))
    }

    /// Rewrite the `blocked_by` set of a queued task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if persistence fails.
    pub async fn set_blocked_by(&self, id: i64, blocked_by: &[i64]) -> Result<()> {
        write_blocked_by(self.pool.as_ref(), id, blocked_by).await
    }
}
