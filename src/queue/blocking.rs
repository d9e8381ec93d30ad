//! Blocking resolver: actionability of queued tasks and unblock
//! propagation when a task leaves the system.
//!
//! The decision logic is pure over an already-fetched queue snapshot;
//! the [`BlockingResolver`] wrapper fetches that snapshot and writes
//! back rewritten `blocked_by` sets. Keeping the logic pure guarantees
//! the queue view and the "what's actionable" view can never diverge.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::task::QueuedTask;
use crate::persistence::state_repo::StateRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::Result;

/// Decide whether a task is blocked given the set of queued identifiers
/// and the in-progress identifier.
///
/// A `blocked_by` entry blocks iff it resolves to a queued task or to
/// the in-progress task. Self-references and dangling identifiers fail
/// open: an invalid reference can never permanently lock a task.
#[must_use]
pub fn is_blocked(
    task: &QueuedTask,
    queued_ids: &HashSet<i64>,
    in_progress: Option<i64>,
) -> bool {
    task.blocked_by
        .iter()
        .filter(|&&id| id != task.id)
        .any(|id| queued_ids.contains(id) || in_progress == Some(*id))
}

/// Compute the tasks that become fully unblocked when `finished` leaves
/// the system.
///
/// Must be called while `in_progress` still names the finishing task:
/// the finishing identifier and the in-progress identifier are both
/// excluded from "remaining blockers", and a task qualifies only when no
/// remaining blocker still resolves to a queued task.
#[must_use]
pub fn unblocked_by(
    queue: &[QueuedTask],
    finished: i64,
    in_progress: Option<i64>,
) -> Vec<QueuedTask> {
    let queued_ids: HashSet<i64> = queue.iter().map(|t| t.id).collect();

    queue
        .iter()
        .filter(|t| t.blocked_by.contains(&finished))
        .filter(|t| {
            t.blocked_by
                .iter()
                .filter(|&&id| id != finished && id != t.id && in_progress != Some(id))
                .all(|id| !queued_ids.contains(id))
        })
        .cloned()
        .collect()
}

/// First task in queue order that is not blocked, skipping `exclude`.
#[must_use]
pub fn first_unblocked(
    queue: &[QueuedTask],
    in_progress: Option<i64>,
    exclude: Option<i64>,
) -> Option<QueuedTask> {
    let queued_ids: HashSet<i64> = queue.iter().map(|t| t.id).collect();
    queue
        .iter()
        .filter(|t| exclude != Some(t.id))
        .find(|t| !is_blocked(t, &queued_ids, in_progress))
        .cloned()
}

/// Per-blocker detail attached to a blocked task in queue reports.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BlockerDetail {
    /// Referenced blocking identifier.
    pub id: i64,
    /// Description of the blocking task, or a placeholder when resolved.
    pub task: String,
    /// Whether the reference still resolves to live work.
    pub exists: bool,
}

/// A blocked task with the detail of every `blocked_by` reference.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BlockedTask {
    /// The blocked queue entry.
    pub task: QueuedTask,
    /// Detail per referenced blocker.
    pub blockers: Vec<BlockerDetail>,
}

/// Store-backed blocking resolver.
#[derive(Clone)]
pub struct BlockingResolver {
    tasks: TaskRepo,
    state: StateRepo,
}

impl BlockingResolver {
    /// Create a resolver over the shared pool.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            tasks: TaskRepo::new(Arc::clone(&pool)),
            state: StateRepo::new(pool),
        }
    }

    /// Whether the given task is blocked right now.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store read failure.
    pub async fn is_task_blocked(&self, task: &QueuedTask) -> Result<bool> {
        if task.blocked_by.is_empty() {
            return Ok(false);
        }
        let queue = self.tasks.list().await?;
        let queued_ids: HashSet<i64> = queue.iter().map(|t| t.id).collect();
        let in_progress = self.state.get().await?.current_task_id;
        Ok(is_blocked(task, &queued_ids, in_progress))
    }

    /// Tasks that completing `finished_id` would fully unblock.
    ///
    /// Call before the finishing task's claim is cleared so the
    /// in-progress identifier still excludes it from remaining blockers.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store read failure.
    pub async fn tasks_unblocked_by(&self, finished_id: i64) -> Result<Vec<QueuedTask>> {
        let queue = self.tasks.list().await?;
        let in_progress = self.state.get().await?.current_task_id;
        Ok(unblocked_by(&queue, finished_id, in_progress))
    }

    /// Remove `finished_id` from every queued task's `blocked_by` set.
    ///
    /// Unconditional cleanup, distinct from the fully-unblocked
    /// computation: partially-blocked tasks must not retain stale
    /// references. Returns the number of tasks rewritten.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store failure.
    pub async fn remove_blocker_everywhere(&self, finished_id: i64) -> Result<usize> {
        let queue = self.tasks.list().await?;
        let mut updated = 0;
        for task in queue.iter().filter(|t| t.blocked_by.contains(&finished_id)) {
            let remaining: Vec<i64> = task
                .blocked_by
                .iter()
                .copied()
                .filter(|&id| id != finished_id)
                .collect();
            self.tasks.set_blocked_by(task.id, &remaining).await?;
            updated += 1;
        }
        Ok(updated)
    }

    /// All currently blocked tasks with per-blocker detail.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store read failure.
    pub async fn blocked_tasks(&self) -> Result<Vec<BlockedTask>> {
        let queue = self.tasks.list().await?;
        let queued_ids: HashSet<i64> = queue.iter().map(|t| t.id).collect();
        let state = self.state.get().await?;
        let in_progress = state.current_task_id;

        let mut blocked = Vec::new();
        for task in &queue {
            if task.blocked_by.is_empty() || !is_blocked(task, &queued_ids, in_progress) {
                continue;
            }

            let blockers = task
                .blocked_by
                .iter()
                .map(|&id| {
                    let queued_text = queue
                        .iter()
                        .find(|t| t.id == id && t.id != task.id)
                        .map(|t| t.task.clone());
                    if let Some(text) = queued_text {
                        BlockerDetail {
                            id,
                            task: text,
                            exists: true,
                        }
                    } else if in_progress == Some(id) {
                        BlockerDetail {
                            id,
                            task: state
                                .current_task
                                .clone()
                                .unwrap_or_else(|| "In progress".into()),
                            exists: true,
                        }
                    } else {
                        BlockerDetail {
                            id,
                            task: "Completed/Removed".into(),
                            exists: false,
                        }
                    }
                })
                .collect();

            blocked.push(BlockedTask {
                task: task.clone(),
                blockers,
            });
        }

        Ok(blocked)
    }
}
