//! Dispatch job orchestration.
//!
//! The orchestrator owns the job lifecycle: chain-depth admission,
//! persistence, handing local jobs to the background worker, relaying
//! remote jobs over Slack, and posting results back to their thread.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::GlobalConfig;
use crate::dispatch::parser::{format_dispatch_message, DispatchCommand};
use crate::dispatch::{runner, worker};
use crate::errors::{AppError, Result};
use crate::models::dispatch::{DispatchJob, DispatchRequest, JobStatus};
use crate::models::task::NewTask;
use crate::persistence::job_repo::JobRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::persistence::SqlitePool;
use crate::slack::SlackService;

/// Result text longer than this is truncated before posting to Slack.
const MAX_RESULT_CHARS: usize = 3000;

/// Capacity of the local-execution channel.
const WORKER_QUEUE: usize = 64;

/// Priority given to queue tasks auto-created for tracked dispatches.
const TRACKED_TASK_PRIORITY: i64 = 5;

/// Background handles owned by the dispatch subsystem.
pub struct DispatchRuntime {
    /// Local-execution worker task.
    pub worker_task: JoinHandle<()>,
}

/// Coordinates dispatch jobs from admission through notification.
pub struct Orchestrator {
    config: GlobalConfig,
    jobs: JobRepo,
    tasks: TaskRepo,
    slack: Option<Arc<SlackService>>,
    local_tx: mpsc::Sender<i64>,
}

impl Orchestrator {
    /// Start the orchestrator and its local-execution worker.
    #[must_use]
    pub fn start(
        pool: Arc<SqlitePool>,
        config: GlobalConfig,
        slack: Option<Arc<SlackService>>,
        cancel: CancellationToken,
    ) -> (Arc<Self>, DispatchRuntime) {
        let (local_tx, local_rx) = mpsc::channel(WORKER_QUEUE);
        let orchestrator = Arc::new(Self {
            config,
            jobs: JobRepo::new(Arc::clone(&pool)),
            tasks: TaskRepo::new(pool),
            slack,
            local_tx,
        });
        let worker_task = worker::spawn(Arc::clone(&orchestrator), local_rx, cancel);
        (orchestrator, DispatchRuntime { worker_task })
    }

    /// Job store accessor for read-side callers.
    #[must_use]
    pub fn jobs(&self) -> &JobRepo {
        &self.jobs
    }

    /// Admit and persist a dispatch request.
    ///
    /// Local jobs are handed to the worker immediately; remote jobs stay
    /// `pending` and are relayed to the Slack channel for their target's
    /// listener to pick up. A `--track` request also creates a queue task
    /// linked to the job.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when the chain depth limit is
    /// exhausted, or `AppError::Db` on persistence failures.
    pub async fn queue_dispatch(&self, request: DispatchRequest) -> Result<DispatchJob> {
        let max_depth = i64::from(self.config.dispatch.max_chain_depth);
        if request.depth >= max_depth {
            return Err(AppError::Validation(format!(
                "dispatch chain depth {} reached the limit of {max_depth}; \
                 refusing to queue further delegation",
                request.depth
            )));
        }

        let mut job = self.jobs.create(&request).await?;
        info!(
            job_id = job.id,
            agent = job.agent.as_str(),
            target = job.target.as_str(),
            depth = job.depth,
            "dispatch job queued"
        );

        if job.track_as_task {
            let tracked = self
                .tasks
                .create(&NewTask {
                    task: format!("[Dispatched to {}:{}] {}", job.target.as_str(), job.agent.as_str(), job.task),
                    priority: TRACKED_TASK_PRIORITY,
                    added_by: job.dispatched_by.clone().or_else(|| Some("dispatch".into())),
                    tags: vec!["dispatch".into()],
                    ..NewTask::default()
                })
                .await?;
            self.jobs.set_linked_task(job.id, tracked.id).await?;
            job.linked_task_id = Some(tracked.id);
        }

        if job.target.is_local() {
            // A full worker queue leaves the job pending rather than
            // failing the request; it can be re-dispatched or cancelled.
            if let Err(err) = self.local_tx.try_send(job.id) {
                warn!(job_id = job.id, %err, "local worker queue full; job left pending");
            }
        } else {
            self.relay_remote(&job).await;
        }

        Ok(job)
    }

    /// Execute one local job end to end. Called by the worker task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a persistence step fails; execution
    /// failures are recorded on the job rather than propagated.
    pub async fn process_job(&self, job_id: i64) -> Result<()> {
        let Some(job) = self.jobs.get(job_id).await? else {
            warn!(job_id, "job vanished before execution");
            return Ok(());
        };

        if !self.jobs.mark_running(job_id).await? {
            info!(job_id, "job no longer pending; skipping execution");
            return Ok(());
        }

        let outcome = runner::run_local(
            job.agent,
            &job.task,
            job.repo_path.as_deref(),
            &self.config.dispatch,
        )
        .await;

        let (success, text) = match outcome {
            Ok(run) => (true, run.output),
            Err(err) => (false, err.to_string()),
        };
        self.jobs.finish(job_id, success, &text).await?;

        if let Some(finished) = self.jobs.get(job_id).await? {
            self.notify(&finished).await;
        }
        Ok(())
    }

    /// Transition a pending remote job to `running`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the job does not exist, or
    /// `AppError::Conflict` if it was not pending.
    pub async fn mark_running(&self, job_id: i64) -> Result<DispatchJob> {
        let job = self.require(job_id).await?;
        if !self.jobs.mark_running(job_id).await? {
            return Err(AppError::Conflict(format!(
                "job {job_id} is {}; only pending jobs can start",
                job.status.as_str()
            )));
        }
        self.require(job_id).await
    }

    /// Record a remote listener's result for a job and notify its thread.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the job does not exist, or
    /// `AppError::Conflict` if it already reached a terminal state.
    pub async fn complete_from_remote(
        &self,
        job_id: i64,
        success: bool,
        text: &str,
    ) -> Result<DispatchJob> {
        let job = self.require(job_id).await?;
        if !self.jobs.finish(job_id, success, text).await? {
            return Err(AppError::Conflict(format!(
                "job {job_id} already finished as {}",
                job.status.as_str()
            )));
        }
        let finished = self.require(job_id).await?;
        self.notify(&finished).await;
        Ok(finished)
    }

    /// Cancel a job that has not started yet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the job does not exist, or
    /// `AppError::Conflict` if it is running or terminal.
    pub async fn cancel(&self, job_id: i64) -> Result<DispatchJob> {
        let job = self.require(job_id).await?;
        if !self.jobs.fail_if_pending(job_id, "Cancelled by user").await? {
            return Err(AppError::Conflict(format!(
                "job {job_id} is {}; only pending jobs can be cancelled",
                job.status.as_str()
            )));
        }
        let cancelled = self.require(job_id).await?;
        self.notify(&cancelled).await;
        Ok(cancelled)
    }

    async fn require(&self, job_id: i64) -> Result<DispatchJob> {
        self.jobs
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("dispatch job {job_id} not found")))
    }

    /// Relay a remote-target job into the dispatch channel so the
    /// target's own listener picks it up. Best-effort.
    async fn relay_remote(&self, job: &DispatchJob) {
        let Some(ref slack) = self.slack else {
            warn!(job_id = job.id, "remote dispatch with no slack connection; job stays pending");
            return;
        };
        let command = DispatchCommand {
            agent: job.agent,
            target: job.target,
            task: job.task.clone(),
            repo_path: job.repo_path.clone(),
            track_as_task: false,
        };
        let text = format_dispatch_message(&command, job.id);
        let channel = job
            .slack_channel_id
            .clone()
            .unwrap_or_else(|| self.config.slack.channel_id.clone());
        if let Err(err) = slack.post_message(&channel, text).await {
            warn!(job_id = job.id, %err, "failed to relay remote dispatch");
        }
    }

    /// Post a job outcome back to its originating thread. Best-effort;
    /// notification failures never affect the stored job state. Jobs
    /// without a recorded origin (queued via the tool, not chat) are
    /// not announced anywhere.
    async fn notify(&self, job: &DispatchJob) {
        let Some(ref slack) = self.slack else { return };
        let Some((channel, thread)) = notify_destination(job) else {
            return;
        };

        let (emoji, verdict, body) = match job.status {
            JobStatus::Completed => (
                "\u{2705}",
                "completed",
                job.result.clone().unwrap_or_else(|| "No output".into()),
            ),
            JobStatus::Failed => (
                "\u{274c}",
                "failed",
                job.error_message.clone().unwrap_or_else(|| "Unknown error".into()),
            ),
            JobStatus::Pending | JobStatus::Running => return,
        };

        let text = format!(
            "{emoji} *{}:{}* {verdict} (job {})\n```{}```",
            job.target.as_str(),
            job.agent.as_str(),
            job.id,
            truncate_result(&body)
        );

        let send = match thread.as_deref() {
            Some(thread) => slack.post_thread_reply(&channel, thread, text).await,
            None => slack.post_message(&channel, text).await,
        };
        if let Err(err) = send {
            warn!(job_id = job.id, %err, "failed to post dispatch result");
        }
    }
}

/// Where a job's outcome gets announced: the channel it came from and,
/// when present, the thread to reply under. `None` when the job carries
/// no chat origin.
fn notify_destination(job: &DispatchJob) -> Option<(String, Option<String>)> {
    let channel = job.slack_channel_id.clone()?;
    let thread = job
        .slack_thread_ts
        .clone()
        .or_else(|| job.slack_message_ts.clone());
    Some((channel, thread))
}

/// Clamp result text to the Slack posting limit on a char boundary.
fn truncate_result(text: &str) -> String {
    if text.chars().count() <= MAX_RESULT_CHARS {
        return text.to_owned();
    }
    let clipped: String = text.chars().take(MAX_RESULT_CHARS).collect();
    format!("{clipped}\n... (truncated)")
}
