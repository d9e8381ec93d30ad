//! Blocker log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reported impediment, logged whenever the operator declares themselves
/// blocked. Resolution fields stay null until the blocker is cleared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BlockerLog {
    /// Unique identifier.
    pub id: i64,
    /// What is blocking progress.
    pub blocker: String,
    /// Additional context.
    pub context: Option<String>,
    /// When the blocker was reported.
    pub identified_at: DateTime<Utc>,
    /// When the blocker was resolved, if ever.
    pub resolved_at: Option<DateTime<Utc>>,
    /// How it was resolved.
    pub resolution: Option<String>,
}
