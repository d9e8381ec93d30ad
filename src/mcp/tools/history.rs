//! Completion-history tool handlers: `list_completed`, `stats`, `checkin`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::info;

use crate::mcp::handler::TaskdeskServer;
use crate::mcp::tools::util::{json_result, map_err, parse_args};
use crate::persistence::completed_repo::CompletedRepo;
use crate::persistence::state_repo::StateRepo;
use crate::persistence::task_repo::TaskRepo;

#[derive(Debug, serde::Deserialize)]
struct ListCompletedInput {
    days: Option<i64>,
}

/// Handle the `list_completed` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on persistence failures.
pub async fn list_completed(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: ListCompletedInput = parse_args(context.arguments)?;

    if let Some(days) = input.days {
        if days < 1 {
            return Err(rmcp::ErrorData::invalid_params(
                "days must be at least 1",
                None,
            ));
        }
    }

    let since = input.days.map(|days| Utc::now() - Duration::days(days));
    let repo = CompletedRepo::new(Arc::clone(&state.db));
    let completed = repo.list(since).await.map_err(map_err)?;

    json_result(serde_json::json!({
        "count": completed.len(),
        "completed": completed,
    }))
}

/// Handle the `stats` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on persistence failures.
pub async fn stats(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());

    let repo = CompletedRepo::new(Arc::clone(&state.db));
    let stats = repo.stats().await.map_err(map_err)?;

    json_result(serde_json::json!({ "stats": stats }))
}

/// Handle the `checkin` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on persistence failures.
pub async fn checkin(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());

    let state_repo = StateRepo::new(Arc::clone(&state.db));
    state_repo.record_checkin().await.map_err(map_err)?;

    let work = state_repo.get().await.map_err(map_err)?;
    let queue_size = TaskRepo::new(Arc::clone(&state.db))
        .count()
        .await
        .map_err(map_err)?;
    let stats = CompletedRepo::new(Arc::clone(&state.db))
        .stats()
        .await
        .map_err(map_err)?;

    info!(queue_size, streak_days = work.streak_days, "checkin recorded");
    json_result(serde_json::json!({
        "goal": work.goal,
        "goal_metric": work.goal_metric,
        "status": work.status,
        "streak_days": work.streak_days,
        "current_task": work.current_task,
        "current_task_id": work.current_task_id,
        "queue_size": queue_size,
        "stats": stats,
    }))
}
