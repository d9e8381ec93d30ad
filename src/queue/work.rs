//! Work state machine: claim, complete, blocked-skip, and mark-done
//! transitions over the singleton work state.
//!
//! Every multi-step transition runs inside one `SQLite` transaction so a
//! failed operation leaves no partial mutation observable.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use crate::models::blocker::BlockerLog;
use crate::models::task::QueuedTask;
use crate::models::work_state::{WorkState, WorkStatus};
use crate::persistence::blocker_repo::BlockerRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::persistence::{completed_repo, state_repo, task_repo};
use crate::queue::blocking;
use crate::{AppError, Result};

/// Result of a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// A task was claimed and removed from the queue.
    Claimed(QueuedTask),
    /// Nothing to claim; the queue is empty.
    QueueEmpty,
}

/// Result of completing the current task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteOutcome {
    /// Description of the task just completed.
    pub completed: String,
    /// Tasks fully unblocked by this completion.
    pub unblocked: Vec<QueuedTask>,
    /// Task auto-claimed next, if any work remains actionable.
    pub next: Option<QueuedTask>,
    /// Streak counter after the increment.
    pub streak_days: i64,
}

/// Result of reporting a blocker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedOutcome {
    /// The logged blocker record.
    pub blocker: BlockerLog,
    /// Alternative task soft-assigned as current, when skipping.
    pub reassigned: Option<QueuedTask>,
    /// Whether the current task was cleared (no alternative available).
    pub cleared: bool,
}

/// Result of marking a queued task done out-of-band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkDoneOutcome {
    /// The task removed from the queue.
    pub task: QueuedTask,
    /// Tasks fully unblocked by this completion.
    pub unblocked: Vec<QueuedTask>,
    /// Whether the marked task was the currently claimed one.
    pub was_current: bool,
    /// Replacement task claimed when the marked task was current.
    pub reassigned: Option<QueuedTask>,
}

/// Strip `finished` from every `blocked_by` set and drop the finished
/// row itself, yielding the post-completion queue snapshot.
fn queue_after_finish(queue: &[QueuedTask], finished: i64) -> Vec<QueuedTask> {
    queue
        .iter()
        .filter(|t| t.id != finished)
        .map(|t| {
            let mut t = t.clone();
            t.blocked_by.retain(|&id| id != finished);
            t
        })
        .collect()
}

/// Singleton state machine driving the claim/complete/blocked lifecycle.
#[derive(Clone)]
pub struct WorkStateMachine {
    pool: Arc<SqlitePool>,
    tasks: TaskRepo,
    state: state_repo::StateRepo,
    blockers: BlockerRepo,
}

impl WorkStateMachine {
    /// Create a state machine over the shared pool.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            tasks: TaskRepo::new(Arc::clone(&pool)),
            state: state_repo::StateRepo::new(Arc::clone(&pool)),
            blockers: BlockerRepo::new(Arc::clone(&pool)),
            pool,
        }
    }

    /// Read the singleton work state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store read failure.
    pub async fn state(&self) -> Result<WorkState> {
        self.state.get().await
    }

    /// Claim a task: remove it from the queue and set it as current.
    ///
    /// With no identifier, claims the head of the queue; an empty queue
    /// is a non-error [`ClaimOutcome::QueueEmpty`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if a task is already claimed (checked
    /// before any mutation), `AppError::NotFound` if an explicit
    /// identifier is absent from the queue, or `AppError::Db` on store
    /// failure.
    pub async fn claim(&self, task_id: Option<i64>) -> Result<ClaimOutcome> {
        let mut tx = self.pool.begin().await?;

        let state = state_repo::fetch(&mut *tx).await?;
        if let Some(current) = state.current_task {
            return Err(AppError::Conflict(format!(
                "already working on \"{current}\"; complete it first"
            )));
        }

        let task = match task_id {
            Some(id) => task_repo::fetch_by_id(&mut *tx, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("task {id} not found in queue")))?,
            None => match task_repo::fetch_first(&mut *tx).await? {
                Some(task) => task,
                None => return Ok(ClaimOutcome::QueueEmpty),
            },
        };

        task_repo::delete_by_id(&mut *tx, task.id).await?;
        state_repo::write_current(&mut *tx, &task.task, task.context.as_deref(), task.id).await?;
        tx.commit().await?;

        info!(task_id = task.id, "task claimed");
        Ok(ClaimOutcome::Claimed(task))
    }

    /// Complete the current task, cascade unblocking, and auto-claim the
    /// next actionable task.
    ///
    /// `task_id`, when supplied, must match the claimed task — this
    /// defends against completing the wrong task after a stale read.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if nothing is claimed,
    /// `AppError::Validation` on identifier mismatch, or `AppError::Db`
    /// on store failure.
    pub async fn complete(
        &self,
        task_id: Option<i64>,
        time_taken_minutes: Option<i64>,
        notes: Option<&str>,
    ) -> Result<CompleteOutcome> {
        let state = self.state.get().await?;
        let (Some(current_id), Some(current_task)) =
            (state.current_task_id, state.current_task.clone())
        else {
            return Err(AppError::Conflict("no current task to complete".into()));
        };

        if let Some(id) = task_id {
            if id != current_id {
                return Err(AppError::Validation(format!(
                    "task {id} is not the current task (current is {current_id})"
                )));
            }
        }

        // The cascade must be computed while the work state still names
        // the finishing task, so its identifier is excluded from the
        // remaining-blockers check.
        let queue = self.tasks.list().await?;
        let unblocked = blocking::unblocked_by(&queue, current_id, Some(current_id));
        let after = queue_after_finish(&queue, current_id);
        let next = blocking::first_unblocked(&after, None, None);

        let mut tx = self.pool.begin().await?;
        completed_repo::insert(
            &mut *tx,
            &current_task,
            state.current_task_context.as_deref(),
            time_taken_minutes,
            notes,
            None,
        )
        .await?;
        // A soft-skipped current task may still sit in the queue.
        task_repo::delete_by_id(&mut *tx, current_id).await?;
        state_repo::bump_streak(&mut *tx).await?;
        for task in queue.iter().filter(|t| t.blocked_by.contains(&current_id)) {
            let remaining: Vec<i64> = task
                .blocked_by
                .iter()
                .copied()
                .filter(|&id| id != current_id)
                .collect();
            task_repo::write_blocked_by(&mut *tx, task.id, &remaining).await?;
        }
        if let Some(ref next_task) = next {
            task_repo::delete_by_id(&mut *tx, next_task.id).await?;
            state_repo::write_current(
                &mut *tx,
                &next_task.task,
                next_task.context.as_deref(),
                next_task.id,
            )
            .await?;
        } else {
            state_repo::clear_current(&mut *tx).await?;
        }
        tx.commit().await?;

        info!(
            task_id = current_id,
            unblocked = unblocked.len(),
            "task completed"
        );
        Ok(CompleteOutcome {
            completed: current_task,
            unblocked,
            next,
            streak_days: state.streak_days + 1,
        })
    }

    /// Report a blocker on the current task.
    ///
    /// Always logs the blocker. With `skip_to_next`, soft-reassigns the
    /// current task to another actionable queued task (the original stays
    /// claimed-but-superseded until completed or re-claimed; the
    /// alternative is not removed from the queue), or clears to idle when
    /// no alternative exists. Without the skip, the work state moves to
    /// the explicit `blocked` status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store failure.
    pub async fn report_blocked(
        &self,
        blocker: &str,
        context: Option<&str>,
        skip_to_next: bool,
    ) -> Result<BlockedOutcome> {
        let logged = self.blockers.log(blocker, context).await?;
        let state = self.state.get().await?;

        if !skip_to_next {
            self.state.set_status(WorkStatus::Blocked).await?;
            return Ok(BlockedOutcome {
                blocker: logged,
                reassigned: None,
                cleared: false,
            });
        }

        let queue = self.tasks.list().await?;
        let alternative =
            blocking::first_unblocked(&queue, state.current_task_id, state.current_task_id);

        match alternative {
            Some(task) => {
                self.state
                    .assign_current(&task.task, task.context.as_deref(), task.id)
                    .await?;
                info!(from = ?state.current_task_id, to = task.id, "blocked; skipped to next task");
                Ok(BlockedOutcome {
                    blocker: logged,
                    reassigned: Some(task),
                    cleared: false,
                })
            }
            None => {
                self.state.clear_current().await?;
                info!("blocked; no alternative task, now idle");
                Ok(BlockedOutcome {
                    blocker: logged,
                    reassigned: None,
                    cleared: true,
                })
            }
        }
    }

    /// Mark a queued task done out-of-band (work completed outside the
    /// system). Logs completion and cascades unblocking regardless of
    /// whether the task was current; only touches the work state when it
    /// was.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the task is absent from the queue,
    /// or `AppError::Db` on store failure.
    pub async fn mark_done(
        &self,
        task_id: i64,
        notes: &str,
        completed_by: Option<&str>,
    ) -> Result<MarkDoneOutcome> {
        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task {task_id} not found in queue")))?;

        let state = self.state.get().await?;
        let was_current = state.current_task_id == Some(task_id);

        let queue = self.tasks.list().await?;
        let unblocked = blocking::unblocked_by(&queue, task_id, state.current_task_id);
        let after = queue_after_finish(&queue, task_id);
        let reassigned = if was_current {
            blocking::first_unblocked(&after, None, None)
        } else {
            None
        };

        let annotated = format!(
            "[Marked done by {}] {notes}",
            completed_by.unwrap_or("unknown")
        );

        let mut tx = self.pool.begin().await?;
        completed_repo::insert(
            &mut *tx,
            &task.task,
            task.context.as_deref(),
            None,
            Some(&annotated),
            task.project.as_deref(),
        )
        .await?;
        task_repo::delete_by_id(&mut *tx, task_id).await?;
        for queued in queue.iter().filter(|t| t.blocked_by.contains(&task_id)) {
            let remaining: Vec<i64> = queued
                .blocked_by
                .iter()
                .copied()
                .filter(|&id| id != task_id)
                .collect();
            task_repo::write_blocked_by(&mut *tx, queued.id, &remaining).await?;
        }
        if was_current {
            if let Some(ref next_task) = reassigned {
                task_repo::delete_by_id(&mut *tx, next_task.id).await?;
                state_repo::write_current(
                    &mut *tx,
                    &next_task.task,
                    next_task.context.as_deref(),
                    next_task.id,
                )
                .await?;
            } else {
                state_repo::clear_current(&mut *tx).await?;
            }
        }
        tx.commit().await?;

        info!(task_id, was_current, "task marked done");
        Ok(MarkDoneOutcome {
            task,
            unblocked,
            was_current,
            reassigned,
        })
    }
}
