//! Queued task model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest permitted task priority. Priorities are `0..=MAX_PRIORITY`,
/// higher meaning more urgent.
pub const MAX_PRIORITY: i64 = 10;

/// A unit of work sitting in the queue, not yet claimed.
///
/// The queue only ever holds tasks that are still actionable candidates:
/// claiming a task removes it from the queue, and completion or deletion
/// removes it permanently. There is no soft-delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct QueuedTask {
    /// Unique identifier, monotonically assigned by the store.
    pub id: i64,
    /// Task description.
    pub task: String,
    /// Free-text context for whoever picks the task up.
    pub context: Option<String>,
    /// Priority `0..=10`, higher is more urgent.
    pub priority: i64,
    /// Optional time estimate in minutes.
    pub estimated_minutes: Option<i64>,
    /// Optional project tag.
    pub project: Option<String>,
    /// Insertion timestamp; the tie-breaker for equal priorities.
    pub added_at: DateTime<Utc>,
    /// Who queued the task.
    pub added_by: Option<String>,
    /// Identifiers of tasks that must complete before this one is actionable.
    pub blocked_by: Vec<i64>,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Unordered free-form labels.
    pub tags: Vec<String>,
    /// Opaque external-sync reference.
    pub notion_page_id: Option<String>,
}

/// Insert payload for a new queued task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    /// Task description.
    pub task: String,
    /// Free-text context.
    pub context: Option<String>,
    /// Priority `0..=10`.
    pub priority: i64,
    /// Optional time estimate in minutes.
    pub estimated_minutes: Option<i64>,
    /// Optional project tag.
    pub project: Option<String>,
    /// Who queued the task.
    pub added_by: Option<String>,
    /// Blocking task identifiers.
    pub blocked_by: Vec<i64>,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Unordered labels.
    pub tags: Vec<String>,
    /// Opaque external-sync reference.
    pub notion_page_id: Option<String>,
}

/// Field-level update payload for an existing queued task.
///
/// `None` fields are left untouched; `Some` fields are written as given.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// Replacement description.
    pub task: Option<String>,
    /// Replacement context (`Some(None)` clears it).
    pub context: Option<Option<String>>,
    /// Replacement time estimate.
    pub estimated_minutes: Option<Option<i64>>,
    /// Replacement project tag.
    pub project: Option<Option<String>>,
    /// Replacement due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// Replacement tag set.
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    /// Whether the update carries at least one field to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.task.is_none()
            && self.context.is_none()
            && self.estimated_minutes.is_none()
            && self.project.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
    }
}
