//! Dispatch job model and agent/target enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// AI coding agent a dispatch job is addressed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    /// Claude Code CLI.
    Claude,
    /// Gemini CLI.
    Gemini,
    /// Qwen CLI.
    Qwen,
    /// Cline CLI.
    Cline,
}

impl Agent {
    /// Stable string form used in persistence and command syntax.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Qwen => "qwen",
            Self::Cline => "cline",
        }
    }

    /// Parse an agent identifier, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "claude" => Some(Self::Claude),
            "gemini" => Some(Self::Gemini),
            "qwen" => Some(Self::Qwen),
            "cline" => Some(Self::Cline),
            _ => None,
        }
    }
}

/// Machine a dispatch job executes on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The server's own machine; jobs run in-process via the local runner.
    Hetzner,
    /// Remote Mac picked up by its own listener.
    Mac,
    /// Remote archive box picked up by its own listener.
    ColdStorage,
}

impl Target {
    /// Stable string form used in persistence and command syntax.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hetzner => "hetzner",
            Self::Mac => "mac",
            Self::ColdStorage => "cold_storage",
        }
    }

    /// Parse a target identifier, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hetzner" => Some(Self::Hetzner),
            "mac" => Some(Self::Mac),
            "cold_storage" => Some(Self::ColdStorage),
            _ => None,
        }
    }

    /// Whether jobs for this target execute inside this process.
    #[must_use]
    pub fn is_local(self) -> bool {
        matches!(self, Self::Hetzner)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::Hetzner
    }
}

/// Dispatch job lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, awaiting execution or remote pickup.
    Pending,
    /// Execution in progress.
    Running,
    /// Terminal success.
    Completed,
    /// Terminal failure; a new dispatch must be issued to retry.
    Failed,
}

impl JobStatus {
    /// Stable string form used in persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse the persisted string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether this status permits no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A unit of delegated work to an AI agent, tracked through a
/// pending → running → terminal lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DispatchJob {
    /// Unique identifier.
    pub id: i64,
    /// Slack timestamp of the triggering message.
    pub slack_message_ts: Option<String>,
    /// Slack channel the job originated from.
    pub slack_channel_id: Option<String>,
    /// Slack thread results are posted back to.
    pub slack_thread_ts: Option<String>,
    /// Agent to invoke.
    pub agent: Agent,
    /// Machine to execute on.
    pub target: Target,
    /// Optional repository path handed to the agent.
    pub repo_path: Option<String>,
    /// Task text for the agent.
    pub task: String,
    /// Whether a queue task tracks this dispatch.
    pub track_as_task: bool,
    /// Linked queue-task identifier when tracked.
    pub linked_task_id: Option<i64>,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Captured output on success.
    pub result: Option<String>,
    /// Error text on failure.
    pub error_message: Option<String>,
    /// User or agent identity that issued the dispatch.
    pub dispatched_by: Option<String>,
    /// Parent job when this dispatch was chained from another.
    pub parent_dispatch_id: Option<i64>,
    /// Chain depth; bounds AI-to-AI delegation loops.
    pub depth: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Execution start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal-transition timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Parameters for queueing a new dispatch job.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Agent to invoke.
    pub agent: Agent,
    /// Machine to execute on.
    pub target: Target,
    /// Task text for the agent.
    pub task: String,
    /// Optional repository path.
    pub repo_path: Option<String>,
    /// Whether to create a tracking queue task.
    pub track_as_task: bool,
    /// Slack timestamp of the triggering message.
    pub slack_message_ts: Option<String>,
    /// Slack channel the request originated from.
    pub slack_channel_id: Option<String>,
    /// Slack thread to post results back to.
    pub slack_thread_ts: Option<String>,
    /// Identity issuing the dispatch.
    pub dispatched_by: Option<String>,
    /// Parent dispatch for chained jobs.
    pub parent_dispatch_id: Option<i64>,
    /// Chain depth of the new job.
    pub depth: i64,
}

impl DispatchRequest {
    /// Construct a request with no Slack context and zero chain depth.
    #[must_use]
    pub fn new(agent: Agent, target: Target, task: impl Into<String>) -> Self {
        Self {
            agent,
            target,
            task: task.into(),
            repo_path: None,
            track_as_task: false,
            slack_message_ts: None,
            slack_channel_id: None,
            slack_thread_ts: None,
            dispatched_by: None,
            parent_dispatch_id: None,
            depth: 0,
        }
    }
}
