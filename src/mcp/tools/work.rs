//! Work-state tool handlers: `claim_task`, `complete`, `blocked`,
//! `blocked_tasks`, `mark_done`.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::{info, info_span, Instrument};

use crate::mcp::handler::TaskdeskServer;
use crate::mcp::tools::util::{json_result, map_err, parse_args};
use crate::queue::blocking::BlockingResolver;
use crate::queue::work::{ClaimOutcome, WorkStateMachine};

#[derive(Debug, serde::Deserialize)]
struct ClaimInput {
    task_id: Option<i64>,
}

/// Handle the `claim_task` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` if a task is already claimed, the requested
/// task is missing, or the store fails.
pub async fn claim_task(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: ClaimInput = parse_args(context.arguments)?;

    let machine = WorkStateMachine::new(Arc::clone(&state.db));
    let span = info_span!("claim_task", task_id = input.task_id);
    let outcome = machine
        .claim(input.task_id)
        .instrument(span)
        .await
        .map_err(map_err)?;

    match outcome {
        ClaimOutcome::Claimed(task) => {
            info!(task_id = task.id, "task claimed");
            json_result(serde_json::json!({ "claimed": task }))
        }
        ClaimOutcome::QueueEmpty => json_result(serde_json::json!({
            "claimed": null,
            "message": "queue is empty",
        })),
    }
}

#[derive(Debug, serde::Deserialize)]
struct CompleteInput {
    task_id: Option<i64>,
    time_taken_minutes: Option<i64>,
    notes: Option<String>,
}

/// Handle the `complete` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` if no task is claimed, the id does not match
/// the current task, or the store fails.
pub async fn complete(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: CompleteInput = parse_args(context.arguments)?;

    let machine = WorkStateMachine::new(Arc::clone(&state.db));
    let span = info_span!("complete", task_id = input.task_id);
    let outcome = machine
        .complete(
            input.task_id,
            input.time_taken_minutes,
            input.notes.as_deref(),
        )
        .instrument(span)
        .await
        .map_err(map_err)?;

    info!(
        unblocked = outcome.unblocked.len(),
        streak_days = outcome.streak_days,
        auto_claimed = outcome.next.is_some(),
        "task completed"
    );
    json_result(serde_json::json!({
        "completed": outcome.completed,
        "unblocked": outcome.unblocked,
        "next": outcome.next,
        "streak_days": outcome.streak_days,
    }))
}

#[derive(Debug, serde::Deserialize)]
struct BlockedInput {
    blocker: String,
    context: Option<String>,
    /// Omitted means skip: the operator reporting a blocker usually
    /// wants the next actionable task, not a stalled claim.
    #[serde(default = "default_skip_to_next")]
    skip_to_next: bool,
}

fn default_skip_to_next() -> bool {
    true
}

/// Handle the `blocked` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on persistence failures.
pub async fn blocked(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: BlockedInput = parse_args(context.arguments)?;

    let machine = WorkStateMachine::new(Arc::clone(&state.db));
    let outcome = machine
        .report_blocked(&input.blocker, input.context.as_deref(), input.skip_to_next)
        .await
        .map_err(map_err)?;

    info!(
        blocker_id = outcome.blocker.id,
        skipped = input.skip_to_next,
        reassigned = outcome.reassigned.is_some(),
        "blocker reported"
    );
    json_result(serde_json::json!({
        "blocker": outcome.blocker,
        "reassigned": outcome.reassigned,
        "cleared": outcome.cleared,
    }))
}

/// Handle the `blocked_tasks` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on persistence failures.
pub async fn blocked_tasks(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());

    let resolver = BlockingResolver::new(Arc::clone(&state.db));
    let blocked = resolver.blocked_tasks().await.map_err(map_err)?;

    let items: Vec<serde_json::Value> = blocked
        .iter()
        .map(|entry| {
            serde_json::json!({
                "task": entry.task,
                "blockers": entry.blockers.iter().map(|b| serde_json::json!({
                    "id": b.id,
                    "task": b.task,
                    "exists": b.exists,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    json_result(serde_json::json!({
        "count": items.len(),
        "blocked_tasks": items,
    }))
}

#[derive(Debug, serde::Deserialize)]
struct MarkDoneInput {
    task_id: i64,
    #[serde(default)]
    notes: String,
    completed_by: Option<String>,
}

/// Handle the `mark_done` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` if the task is missing or the store fails.
pub async fn mark_done(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: MarkDoneInput = parse_args(context.arguments)?;

    let machine = WorkStateMachine::new(Arc::clone(&state.db));
    let span = info_span!("mark_done", task_id = input.task_id);
    let outcome = machine
        .mark_done(input.task_id, &input.notes, input.completed_by.as_deref())
        .instrument(span)
        .await
        .map_err(map_err)?;

    info!(
        task_id = outcome.task.id,
        was_current = outcome.was_current,
        unblocked = outcome.unblocked.len(),
        "task marked done"
    );
    json_result(serde_json::json!({
        "task": outcome.task,
        "unblocked": outcome.unblocked,
        "was_current": outcome.was_current,
        "reassigned": outcome.reassigned,
    }))
}
