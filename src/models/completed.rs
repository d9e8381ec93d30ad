//! Append-only completed-task log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Historical record of one completion event. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CompletedTask {
    /// Unique identifier.
    pub id: i64,
    /// Original task description.
    pub task: String,
    /// Original task context.
    pub context: Option<String>,
    /// When the completion was recorded.
    pub completed_at: DateTime<Utc>,
    /// Minutes taken, when reported.
    pub time_taken_minutes: Option<i64>,
    /// Free-text completion notes.
    pub notes: Option<String>,
    /// Project tag carried over from the task.
    pub project: Option<String>,
}

/// Aggregate completion counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CompletionStats {
    /// All-time completion count.
    pub total_completed: i64,
    /// Completions since the start of the current week.
    pub completed_this_week: i64,
    /// Completions since the start of the current day.
    pub completed_today: i64,
}
