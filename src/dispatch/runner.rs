//! Local agent execution.
//!
//! Only the local target can run agent CLIs in-process; every other
//! target/agent pairing is either relayed over Slack or rejected with a
//! routing hint. The capability table below is the single source of
//! truth for who runs where.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::DispatchConfig;
use crate::errors::{AppError, Result};
use crate::models::dispatch::{Agent, Target};

/// Whether a target/agent pairing can execute on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Runs locally in-process.
    Supported,
    /// Cannot run here; the message explains where to route it.
    Unsupported(&'static str),
}

/// Routing table for local execution.
#[must_use]
pub fn local_capability(target: Target, agent: Agent) -> Capability {
    match (target, agent) {
        (Target::Hetzner, Agent::Claude) => Capability::Supported,
        (Target::Hetzner, Agent::Gemini) => {
            Capability::Unsupported("Gemini CLI not installed here. Use mac:gemini: instead.")
        }
        (Target::Hetzner, Agent::Qwen) => {
            Capability::Unsupported("Qwen CLI not installed here. Use mac:qwen: instead.")
        }
        (Target::Hetzner, Agent::Cline) => {
            Capability::Unsupported("Cline is not available here. Use mac:cline: instead.")
        }
        (Target::Mac | Target::ColdStorage, _) => {
            Capability::Unsupported("This target is remote; the job must be relayed.")
        }
    }
}

/// Output of a finished local agent run.
#[derive(Debug)]
pub struct RunOutput {
    /// Combined output, preferring stdout over stderr.
    pub output: String,
}

/// Execute an agent CLI locally with a hard timeout.
///
/// The child carries `kill_on_drop`, so timing out (or the caller being
/// cancelled) reaps the process rather than leaking it.
pub async fn run_local(
    agent: Agent,
    task: &str,
    repo_path: Option<&str>,
    config: &DispatchConfig,
) -> Result<RunOutput> {
    match local_capability(Target::Hetzner, agent) {
        Capability::Supported => {}
        Capability::Unsupported(msg) => return Err(AppError::Dispatch(msg.to_owned())),
    }

    if let Some(path) = repo_path {
        if !Path::new(path).is_dir() {
            return Err(AppError::Validation(format!(
                "repo path does not exist: {path}"
            )));
        }
    }

    let mut cmd = Command::new(&config.agent_cli);
    cmd.args(&config.agent_cli_args)
        .arg(task)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(path) = repo_path {
        cmd.current_dir(path);
    }

    info!(agent = agent.as_str(), timeout_ms = config.timeout_ms, "spawning local agent");

    let mut child = cmd
        .spawn()
        .map_err(|e| AppError::Dispatch(format!("failed to spawn {}: {e}", config.agent_cli)))?;

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    let wait = async {
        let mut stdout = String::new();
        let mut stderr = String::new();
        // Both pipes are drained concurrently; a child that fills one
        // buffer while the other is still open must not wedge the run.
        let stdout_read = async {
            if let Some(ref mut pipe) = stdout_pipe {
                pipe.read_to_string(&mut stdout).await?;
            }
            Ok::<_, std::io::Error>(())
        };
        let stderr_read = async {
            if let Some(ref mut pipe) = stderr_pipe {
                pipe.read_to_string(&mut stderr).await?;
            }
            Ok::<_, std::io::Error>(())
        };
        tokio::try_join!(stdout_read, stderr_read)?;
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, stdout, stderr))
    };

    let timeout = Duration::from_millis(config.timeout_ms);
    let (status, stdout, stderr) = match tokio::time::timeout(timeout, wait).await {
        Ok(res) => res.map_err(|e| AppError::Dispatch(format!("agent io error: {e}")))?,
        Err(_) => {
            // Dropping the child kills it via kill_on_drop.
            warn!(timeout_ms = config.timeout_ms, "local agent timed out");
            return Err(AppError::Timeout(format!(
                "agent run exceeded {} ms",
                config.timeout_ms
            )));
        }
    };

    let output = if stdout.trim().is_empty() {
        if stderr.trim().is_empty() {
            "No output".to_owned()
        } else {
            stderr.trim().to_owned()
        }
    } else {
        stdout.trim().to_owned()
    };

    if status.success() {
        Ok(RunOutput { output })
    } else {
        Err(AppError::Dispatch(format!(
            "agent exited with {}: {output}",
            status.code().map_or_else(|| "signal".to_owned(), |c| c.to_string())
        )))
    }
}
