//! Blocker log repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::blocker::BlockerLog;
use crate::{AppError, Result};

/// Repository wrapper around `SQLite` for blocker records.
#[derive(Clone)]
pub struct BlockerRepo {
    pool: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct BlockerRow {
    id: i64,
    blocker: String,
    context: Option<String>,
    identified_at: String,
    resolved_at: Option<String>,
    resolution: Option<String>,
}

impl BlockerRow {
    /// Convert a database row into the domain model.
    fn into_blocker(self) -> Result<BlockerLog> {
        let identified_at = parse_ts(&self.identified_at, "identified_at")?;
        let resolved_at = self
            .resolved_at
            .as_deref()
            .map(|s| parse_ts(s, "resolved_at"))
            .transpose()?;

        Ok(BlockerLog {
            id: self.id,
            blocker: self.blocker,
            context: self.context,
            identified_at,
            resolved_at,
            resolution: self.resolution,
        })
    }
}

fn parse_ts(s: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

impl BlockerRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Record a new blocker.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn log(&self, blocker: &str, context: Option<&str>) -> Result<BlockerLog> {
        let now = Utc::now().to_rfc3339();
        let res = sqlx::query(
            "INSERT INTO blockers (blocker, context, identified_at) VALUES (?1, ?2, ?3)",
        )
        .bind(blocker)
        .bind(context)
        .bind(&now)
        .execute(self.pool.as_ref())
        .await?;

        let id = res.last_insert_rowid();
        let row: BlockerRow = sqlx::query_as("SELECT * FROM blockers WHERE id = ?1")
            .bind(id)
            .fetch_one(self.pool.as_ref())
            .await?;
        row.into_blocker()
    }

    /// List blockers that have not been resolved, newest-first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_open(&self) -> Result<Vec<BlockerLog>> {
        let rows: Vec<BlockerRow> = sqlx::query_as(
            "SELECT * FROM blockers WHERE resolved_at IS NULL ORDER BY identified_at DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(BlockerRow::into_blocker).collect()
    }

    /// Mark a blocker as resolved.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the blocker does not exist, or
    /// `AppError::Db` if the update fails.
    pub async fn resolve(&self, id: i64, resolution: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let res = sqlx::query(
            "UPDATE blockers SET resolved_at = ?1, resolution = ?2 WHERE id = ?3",
        )
        .bind(&now)
        .bind(resolution)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("blocker {id} not found")));
        }
        Ok(())
    }
}
