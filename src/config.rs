//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Nested Slack configuration for Socket Mode connectivity.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// not from the TOML config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Default channel where dispatch notifications are posted.
    #[serde(default)]
    pub channel_id: String,
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for posting messages (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

/// Dispatch orchestration tunables.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DispatchConfig {
    /// Maximum dispatch chain depth before a queue request is rejected.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: u32,
    /// Local agent execution timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Binary invoked for local claude execution.
    #[serde(default = "default_agent_cli")]
    pub agent_cli: String,
    /// Extra arguments prepended to every local agent invocation.
    #[serde(default)]
    pub agent_cli_args: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: default_max_chain_depth(),
            timeout_ms: default_timeout_ms(),
            agent_cli: default_agent_cli(),
            agent_cli_args: Vec::new(),
        }
    }
}

fn default_max_chain_depth() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    300_000
}

fn default_agent_cli() -> String {
    "claude".into()
}

/// Seed values for the singleton work-state row, applied on first boot.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GoalConfig {
    /// Current goal description.
    #[serde(default = "default_goal")]
    pub goal: String,
    /// Metric the goal is measured against.
    #[serde(default = "default_goal_metric")]
    pub goal_metric: String,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            goal_metric: default_goal_metric(),
        }
    }
}

fn default_goal() -> String {
    "Ship".into()
}

fn default_goal_metric() -> String {
    "tasks completed per week".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("taskdesk.db")
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Path of the `SQLite` database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Slack connectivity settings.
    #[serde(default)]
    pub slack: SlackConfig,
    /// Dispatch orchestration tunables.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Work-state seed values.
    #[serde(default)]
    pub goal: GoalConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack credentials from OS keychain with env-var fallback.
    ///
    /// Tries the `taskdesk` keyring service first, then falls back to
    /// `SLACK_APP_TOKEN` / `SLACK_BOT_TOKEN` environment variables. Both
    /// lookups failing leaves the tokens empty, which the caller treats
    /// as local-only mode.
    pub async fn load_credentials(&mut self) {
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN")
            .await
            .unwrap_or_default();
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN")
            .await
            .unwrap_or_default();
    }

    /// Whether Slack connectivity is configured for this process.
    #[must_use]
    pub fn slack_enabled(&self) -> bool {
        !self.slack.bot_token.is_empty() && !self.slack.channel_id.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.dispatch.max_chain_depth == 0 {
            return Err(AppError::Config(
                "dispatch.max_chain_depth must be greater than zero".into(),
            ));
        }
        if self.dispatch.timeout_ms == 0 {
            return Err(AppError::Config(
                "dispatch.timeout_ms must be greater than zero".into(),
            ));
        }
        if self.dispatch.agent_cli.is_empty() {
            return Err(AppError::Config("dispatch.agent_cli must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            slack: SlackConfig::default(),
            dispatch: DispatchConfig::default(),
            goal: GoalConfig::default(),
        }
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Option<String> {
    let key = keyring_key.to_owned();

    // Keyring is synchronous I/O; keep it off the async runtime.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new("taskdesk", &key).and_then(|entry| entry.get_password())
    })
    .await;

    match keychain_result {
        Ok(Ok(value)) if !value.is_empty() => return Some(value),
        Ok(Ok(_)) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Ok(Err(err)) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
        Err(err) => {
            warn!(key = keyring_key, ?err, "keychain task panicked");
        }
    }

    env::var(env_key).ok().filter(|value| !value.is_empty())
}
