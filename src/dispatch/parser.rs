//! Inline dispatch command parser.
//!
//! Recognizes one structured command grammar inside arbitrary free text:
//!
//! ```text
//! @dispatch [--track] [--repo=/path] [target:]agent: task
//! ```
//!
//! Parsing never fails loudly — anything that does not match the grammar
//! yields `None` and the caller decides how to respond (usually by
//! posting a usage hint).

use std::sync::OnceLock;

use regex::Regex;

use crate::models::dispatch::{Agent, Target};

/// Trigger token that marks a message as a dispatch command.
const TRIGGER: &str = "@dispatch";

/// A validated dispatch request parsed out of free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCommand {
    /// Agent to invoke.
    pub agent: Agent,
    /// Machine to execute on; defaults to the local target when omitted.
    pub target: Target,
    /// Task text for the agent.
    pub task: String,
    /// Optional repository path from `--repo=`.
    pub repo_path: Option<String>,
    /// Whether `--track` was present.
    pub track_as_task: bool,
}

fn repo_flag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        Regex::new(r"^--repo=(\S+)").unwrap()
    })
}

fn clause_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        Regex::new(r"(?i)^(?:([a-z_]+):)?([a-z]+):\s*(.+)$").unwrap()
    })
}

/// Whether the text contains the dispatch trigger token.
#[must_use]
pub fn is_dispatch_command(text: &str) -> bool {
    text.to_lowercase().contains(TRIGGER)
}

/// Parse a dispatch command from message text.
///
/// Returns `None` for anything that does not match the grammar,
/// including an unknown agent or an explicitly named unknown target
/// (an explicit bad target is a parse failure, never silently
/// defaulted).
#[must_use]
pub fn parse_dispatch_command(text: &str) -> Option<DispatchCommand> {
    let trigger_at = text.to_lowercase().find(TRIGGER)?;
    let mut remaining = text[trigger_at + TRIGGER.len()..].trim();

    let mut track_as_task = false;
    let mut repo_path = None;

    if let Some(rest) = remaining.strip_prefix("--track") {
        track_as_task = true;
        remaining = rest.trim();
    }

    if let Some(caps) = repo_flag_re().captures(remaining) {
        repo_path = caps.get(1).map(|m| m.as_str().to_owned());
        remaining = remaining[caps[0].len()..].trim();
    }

    // The flags tolerate either order.
    if let Some(rest) = remaining.strip_prefix("--track") {
        track_as_task = true;
        remaining = rest.trim();
    }

    let caps = clause_re().captures(remaining)?;
    let agent = Agent::parse(caps.get(2)?.as_str())?;
    let target = match caps.get(1) {
        Some(m) => Target::parse(m.as_str())?,
        None => Target::default(),
    };
    let task = caps.get(3)?.as_str().trim().to_owned();

    Some(DispatchCommand {
        agent,
        target,
        task,
        repo_path,
        track_as_task,
    })
}

/// Render a command plus its job identifier for posting to a remote
/// target's channel.
#[must_use]
pub fn format_dispatch_message(command: &DispatchCommand, job_id: i64) -> String {
    let mut flags = String::new();
    if command.track_as_task {
        flags.push_str("--track ");
    }
    if let Some(ref repo) = command.repo_path {
        flags.push_str(&format!("--repo={repo} "));
    }

    format!(
        "@dispatch {flags}{}:{}: {}\n[Job ID: {job_id}]",
        command.target.as_str(),
        command.agent.as_str(),
        command.task
    )
}
