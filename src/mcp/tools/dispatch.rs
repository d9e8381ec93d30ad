//! Dispatch tool handlers: `dispatch_task`, `dispatch_status`,
//! `dispatch_list`, `dispatch_cancel`.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::info;

use crate::dispatch::runner::{local_capability, Capability};
use crate::mcp::handler::TaskdeskServer;
use crate::mcp::tools::util::{json_result, map_err, parse_args};
use crate::models::dispatch::{Agent, DispatchRequest, Target};

#[derive(Debug, serde::Deserialize)]
struct DispatchTaskInput {
    agent: String,
    target: Option<String>,
    task: String,
    repo_path: Option<String>,
    #[serde(default)]
    track_as_task: bool,
    dispatched_by: Option<String>,
    parent_dispatch_id: Option<i64>,
    #[serde(default)]
    depth: i64,
}

/// Handle the `dispatch_task` tool call.
///
/// Rejects local pairings the runner cannot execute before anything is
/// persisted, so an unroutable job never enters the store.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on unknown agent/target, an unsupported
/// local pairing, chain-depth exhaustion, or persistence failures.
pub async fn dispatch_task(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: DispatchTaskInput = parse_args(context.arguments)?;

    let agent = Agent::parse(&input.agent).ok_or_else(|| {
        rmcp::ErrorData::invalid_params(format!("unknown agent: {}", input.agent), None)
    })?;
    let target = match input.target.as_deref() {
        Some(raw) => Target::parse(raw).ok_or_else(|| {
            rmcp::ErrorData::invalid_params(format!("unknown target: {raw}"), None)
        })?,
        None => Target::default(),
    };

    if target.is_local() {
        if let Capability::Unsupported(reason) = local_capability(target, agent) {
            return Err(rmcp::ErrorData::invalid_params(reason, None));
        }
    }

    let mut request = DispatchRequest::new(agent, target, input.task);
    request.repo_path = input.repo_path;
    request.track_as_task = input.track_as_task;
    request.dispatched_by = input.dispatched_by;
    request.parent_dispatch_id = input.parent_dispatch_id;
    request.depth = input.depth;

    let job = state
        .orchestrator
        .queue_dispatch(request)
        .await
        .map_err(map_err)?;

    info!(job_id = job.id, "dispatch queued via tool");
    json_result(serde_json::json!({ "job": job }))
}

#[derive(Debug, serde::Deserialize)]
struct JobIdInput {
    job_id: i64,
}

/// Handle the `dispatch_status` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` if the job does not exist or the store fails.
pub async fn dispatch_status(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: JobIdInput = parse_args(context.arguments)?;

    let job = state
        .orchestrator
        .jobs()
        .get(input.job_id)
        .await
        .map_err(map_err)?
        .ok_or_else(|| {
            rmcp::ErrorData::invalid_params(
                format!("dispatch job {} not found", input.job_id),
                None,
            )
        })?;

    json_result(serde_json::json!({ "job": job }))
}

#[derive(Debug, serde::Deserialize)]
struct DispatchListInput {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// Handle the `dispatch_list` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on persistence failures.
pub async fn dispatch_list(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: DispatchListInput = parse_args(context.arguments)?;

    let limit = input.limit.clamp(1, 100);
    let jobs = state
        .orchestrator
        .jobs()
        .list_recent(limit)
        .await
        .map_err(map_err)?;

    json_result(serde_json::json!({
        "count": jobs.len(),
        "jobs": jobs,
    }))
}

/// Handle the `dispatch_cancel` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` if the job is missing, already started, or
/// terminal.
pub async fn dispatch_cancel(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: JobIdInput = parse_args(context.arguments)?;

    let job = state
        .orchestrator
        .cancel(input.job_id)
        .await
        .map_err(map_err)?;

    info!(job_id = job.id, "dispatch cancelled");
    json_result(serde_json::json!({ "job": job }))
}
