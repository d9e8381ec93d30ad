//! Queue CRUD tool handlers: `add_task`, `queue`, `get_task`,
//! `update_task`, `delete_task`, `reprioritize`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::CallToolResult;
use tracing::info;

use crate::mcp::handler::TaskdeskServer;
use crate::mcp::tools::util::{json_result, map_err, parse_args};
use crate::models::task::{NewTask, TaskUpdate};
use crate::persistence::state_repo::StateRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::queue::blocking;

#[derive(Debug, serde::Deserialize)]
struct AddTaskInput {
    task: String,
    context: Option<String>,
    #[serde(default = "default_priority")]
    priority: i64,
    estimated_minutes: Option<i64>,
    project: Option<String>,
    added_by: Option<String>,
    #[serde(default)]
    blocked_by: Vec<i64>,
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<String>,
    notion_page_id: Option<String>,
}

fn default_priority() -> i64 {
    5
}

/// Handle the `add_task` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on validation or persistence failures.
pub async fn add_task(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: AddTaskInput = parse_args(context.arguments)?;

    let repo = TaskRepo::new(Arc::clone(&state.db));
    let task = repo
        .create(&NewTask {
            task: input.task,
            context: input.context,
            priority: input.priority,
            estimated_minutes: input.estimated_minutes,
            project: input.project,
            added_by: input.added_by,
            blocked_by: input.blocked_by,
            due_date: input.due_date,
            tags: input.tags,
            notion_page_id: input.notion_page_id,
        })
        .await
        .map_err(map_err)?;

    info!(task_id = task.id, priority = task.priority, "task added");
    json_result(serde_json::json!({ "task": task }))
}

/// Handle the `queue` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on persistence failures.
pub async fn queue(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());

    let repo = TaskRepo::new(Arc::clone(&state.db));
    let tasks = repo.list().await.map_err(map_err)?;
    let work = StateRepo::new(Arc::clone(&state.db))
        .get()
        .await
        .map_err(map_err)?;

    let queued_ids: HashSet<i64> = tasks.iter().map(|t| t.id).collect();
    let items: Vec<serde_json::Value> = tasks
        .iter()
        .map(|task| {
            serde_json::json!({
                "task": task,
                "blocked": blocking::is_blocked(task, &queued_ids, work.current_task_id),
            })
        })
        .collect();

    json_result(serde_json::json!({
        "count": items.len(),
        "queue": items,
    }))
}

#[derive(Debug, serde::Deserialize)]
struct TaskIdInput {
    task_id: i64,
}

/// Handle the `get_task` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` if the task does not exist or the store fails.
pub async fn get_task(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: TaskIdInput = parse_args(context.arguments)?;

    let repo = TaskRepo::new(Arc::clone(&state.db));
    let task = repo
        .get(input.task_id)
        .await
        .map_err(map_err)?
        .ok_or_else(|| {
            rmcp::ErrorData::invalid_params(format!("task {} not found", input.task_id), None)
        })?;

    json_result(serde_json::json!({ "task": task }))
}

fn opt_string(value: &serde_json::Value) -> Result<Option<String>, rmcp::ErrorData> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s.clone())),
        other => Err(rmcp::ErrorData::invalid_params(
            format!("expected string or null, got {other}"),
            None,
        )),
    }
}

fn opt_i64(value: &serde_json::Value) -> Result<Option<i64>, rmcp::ErrorData> {
    match value {
        serde_json::Value::Null => Ok(None),
        other => other.as_i64().map(Some).ok_or_else(|| {
            rmcp::ErrorData::invalid_params(format!("expected integer or null, got {other}"), None)
        }),
    }
}

/// Handle the `update_task` tool call.
///
/// Works from the raw argument map: an omitted key leaves the field
/// alone, an explicit `null` clears it.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on validation or persistence failures.
pub async fn update_task(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let args = context.arguments.unwrap_or_default();

    let task_id = args
        .get("task_id")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| rmcp::ErrorData::invalid_params("task_id is required", None))?;

    let mut update = TaskUpdate::default();
    if let Some(value) = args.get("task") {
        update.task = Some(opt_string(value)?.ok_or_else(|| {
            rmcp::ErrorData::invalid_params("task description cannot be cleared", None)
        })?);
    }
    if let Some(value) = args.get("context") {
        update.context = Some(opt_string(value)?);
    }
    if let Some(value) = args.get("estimated_minutes") {
        update.estimated_minutes = Some(opt_i64(value)?);
    }
    if let Some(value) = args.get("project") {
        update.project = Some(opt_string(value)?);
    }
    if let Some(value) = args.get("due_date") {
        update.due_date = Some(match opt_string(value)? {
            None => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|err| {
                        rmcp::ErrorData::invalid_params(format!("invalid due_date: {err}"), None)
                    })?,
            ),
        });
    }
    if let Some(value) = args.get("tags") {
        let tags: Vec<String> = serde_json::from_value(value.clone()).map_err(|err| {
            rmcp::ErrorData::invalid_params(format!("invalid tags: {err}"), None)
        })?;
        update.tags = Some(tags);
    }

    let repo = TaskRepo::new(Arc::clone(&state.db));
    let task = repo
        .update(task_id, &update)
        .await
        .map_err(map_err)?
        .ok_or_else(|| {
            rmcp::ErrorData::invalid_params(format!("task {task_id} not found"), None)
        })?;

    info!(task_id, "task updated");
    json_result(serde_json::json!({ "task": task }))
}

/// Handle the `delete_task` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` if the task does not exist or the store fails.
pub async fn delete_task(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: TaskIdInput = parse_args(context.arguments)?;

    let repo = TaskRepo::new(Arc::clone(&state.db));
    let removed = repo
        .delete(input.task_id)
        .await
        .map_err(map_err)?
        .ok_or_else(|| {
            rmcp::ErrorData::invalid_params(format!("task {} not found", input.task_id), None)
        })?;

    info!(task_id = removed.id, "task deleted");
    json_result(serde_json::json!({ "deleted": removed }))
}

#[derive(Debug, serde::Deserialize)]
struct ReprioritizeInput {
    task_id: i64,
    priority: i64,
}

/// Handle the `reprioritize` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` on validation or persistence failures.
pub async fn reprioritize(
    context: ToolCallContext<'_, TaskdeskServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    let input: ReprioritizeInput = parse_args(context.arguments)?;

    let repo = TaskRepo::new(Arc::clone(&state.db));
    let task = repo
        .reprioritize(input.task_id, input.priority)
        .await
        .map_err(map_err)?
        .ok_or_else(|| {
            rmcp::ErrorData::invalid_params(format!("task {} not found", input.task_id), None)
        })?;

    info!(task_id = task.id, priority = task.priority, "task reprioritized");
    json_result(serde_json::json!({ "task": task }))
}
