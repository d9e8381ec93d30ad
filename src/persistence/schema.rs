//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` — safe to
//! re-run on every server startup. Produces a convergent result.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// Creates all five tables idempotently. Safe to call on every startup.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS task_queue (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    task              TEXT NOT NULL,
    context           TEXT,
    priority          INTEGER NOT NULL DEFAULT 0,
    estimated_minutes INTEGER,
    project           TEXT,
    added_at          TEXT NOT NULL,
    added_by          TEXT,
    blocked_by        TEXT NOT NULL DEFAULT '[]',
    due_date          TEXT,
    tags              TEXT NOT NULL DEFAULT '[]',
    notion_page_id    TEXT
);

CREATE TABLE IF NOT EXISTS work_state (
    id                       INTEGER PRIMARY KEY CHECK(id = 1),
    goal                     TEXT NOT NULL,
    goal_metric              TEXT NOT NULL,
    current_task             TEXT,
    current_task_context     TEXT,
    current_task_id          INTEGER,
    current_task_assigned_at TEXT,
    streak_days              INTEGER NOT NULL DEFAULT 0,
    last_checkin             TEXT,
    last_completion          TEXT,
    last_progress_update     TEXT,
    status                   TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','blocked','paused'))
);

CREATE TABLE IF NOT EXISTS completed_tasks (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    task               TEXT NOT NULL,
    context            TEXT,
    completed_at       TEXT NOT NULL,
    time_taken_minutes INTEGER,
    notes              TEXT,
    project            TEXT
);

CREATE TABLE IF NOT EXISTS blockers (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    blocker       TEXT NOT NULL,
    context       TEXT,
    identified_at TEXT NOT NULL,
    resolved_at   TEXT,
    resolution    TEXT
);

CREATE TABLE IF NOT EXISTS dispatch_jobs (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    slack_message_ts   TEXT,
    slack_channel_id   TEXT,
    slack_thread_ts    TEXT,
    agent              TEXT NOT NULL CHECK(agent IN ('claude','gemini','qwen','cline')),
    target             TEXT NOT NULL DEFAULT 'hetzner' CHECK(target IN ('hetzner','mac','cold_storage')),
    repo_path          TEXT,
    task               TEXT NOT NULL,
    track_as_task      INTEGER NOT NULL DEFAULT 0,
    linked_task_id     INTEGER,
    status             TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending','running','completed','failed')),
    result             TEXT,
    error_message      TEXT,
    dispatched_by      TEXT,
    parent_dispatch_id INTEGER,
    depth              INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL,
    started_at         TEXT,
    completed_at       TEXT
);

CREATE INDEX IF NOT EXISTS idx_task_queue_priority ON task_queue(priority);
CREATE INDEX IF NOT EXISTS idx_task_queue_due_date ON task_queue(due_date);
CREATE INDEX IF NOT EXISTS idx_completed_tasks_date ON completed_tasks(completed_at);
CREATE INDEX IF NOT EXISTS idx_blockers_resolved ON blockers(resolved_at);
CREATE INDEX IF NOT EXISTS idx_dispatch_jobs_status ON dispatch_jobs(status);
CREATE INDEX IF NOT EXISTS idx_dispatch_jobs_target ON dispatch_jobs(target);
CREATE INDEX IF NOT EXISTS idx_dispatch_jobs_thread ON dispatch_jobs(slack_thread_ts);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
