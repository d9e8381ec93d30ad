//! Queue selector: canonical ordering and next-actionable-task lookup.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::models::task::QueuedTask;
use crate::persistence::state_repo::StateRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::queue::blocking;
use crate::Result;

/// Presents the queue in priority order and picks actionable next work.
#[derive(Clone)]
pub struct QueueSelector {
    tasks: TaskRepo,
    state: StateRepo,
}

impl QueueSelector {
    /// Create a selector over the shared pool.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            tasks: TaskRepo::new(Arc::clone(&pool)),
            state: StateRepo::new(pool),
        }
    }

    /// The canonical queue view: priority descending, insertion order
    /// ascending for ties.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store read failure.
    pub async fn list(&self) -> Result<Vec<QueuedTask>> {
        self.tasks.list().await
    }

    /// Head of the queue regardless of blocking.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store read failure.
    pub async fn next(&self) -> Result<Option<QueuedTask>> {
        Ok(self.list().await?.into_iter().next())
    }

    /// First queued task whose prerequisites are all resolved.
    ///
    /// Shares its blocking logic with [`blocking::is_blocked`], so this
    /// can never return a task the resolver would report as blocked.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store read failure.
    pub async fn next_unblocked(&self) -> Result<Option<QueuedTask>> {
        self.next_unblocked_excluding(None).await
    }

    /// Like [`Self::next_unblocked`], skipping one identifier (used by
    /// the blocked-skip flow to avoid re-picking the task the operator
    /// just walked away from).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on store read failure.
    pub async fn next_unblocked_excluding(
        &self,
        exclude: Option<i64>,
    ) -> Result<Option<QueuedTask>> {
        let queue = self.list().await?;
        let in_progress = self.state.get().await?.current_task_id;
        Ok(blocking::first_unblocked(&queue, in_progress, exclude))
    }
}
