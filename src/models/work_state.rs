//! Singleton work-state model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator status recorded on the work-state row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Normal operation.
    Active,
    /// Blocked on the current task and not skipping to another.
    Blocked,
    /// Deliberately paused.
    Paused,
}

impl WorkStatus {
    /// Stable string form used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Paused => "paused",
        }
    }

    /// Parse the persisted string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "blocked" => Some(Self::Blocked),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// The singleton row (id = 1) tracking the operator's current focus.
///
/// The `current_task*` fields are nullable as a group: either all set
/// (a task is claimed) or all null (idle). A claimed task is guaranteed
/// to have been removed from the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WorkState {
    /// Goal description.
    pub goal: String,
    /// Metric the goal is measured against.
    pub goal_metric: String,
    /// Currently claimed task description.
    pub current_task: Option<String>,
    /// Currently claimed task context.
    pub current_task_context: Option<String>,
    /// Currently claimed task identifier.
    pub current_task_id: Option<i64>,
    /// When the current task was claimed.
    pub current_task_assigned_at: Option<DateTime<Utc>>,
    /// Consecutive completion streak.
    pub streak_days: i64,
    /// Last check-in timestamp.
    pub last_checkin: Option<DateTime<Utc>>,
    /// Last completion timestamp.
    pub last_completion: Option<DateTime<Utc>>,
    /// Last progress-update timestamp.
    pub last_progress_update: Option<DateTime<Utc>>,
    /// Operator status.
    pub status: WorkStatus,
}

impl WorkState {
    /// Whether a task is currently claimed.
    #[must_use]
    pub fn has_current_task(&self) -> bool {
        self.current_task_id.is_some()
    }
}
