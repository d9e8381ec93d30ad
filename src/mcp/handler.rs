//! MCP server handler, shared application state, and tool router.

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::{
    tool::{ToolCallContext, ToolRoute, ToolRouter},
    ServerHandler,
};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use tracing::info_span;

use crate::config::GlobalConfig;
use crate::dispatch::orchestrator::Orchestrator;
use crate::persistence::SqlitePool;
use crate::slack::SlackService;

/// Shared application state accessible by all MCP tool handlers.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// `SQLite` connection pool.
    pub db: Arc<SqlitePool>,
    /// Slack client service (absent in local-only mode).
    pub slack: Option<Arc<SlackService>>,
    /// Dispatch orchestrator.
    pub orchestrator: Arc<Orchestrator>,
}

/// MCP server implementation exposing the taskdesk tool surface.
pub struct TaskdeskServer {
    state: Arc<AppState>,
}

impl TaskdeskServer {
    /// Create a new MCP server bound to shared application state.
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Access the shared application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    #[allow(clippy::too_many_lines)] // One route per exposed tool.
    fn tool_router() -> ToolRouter<Self> {
        use crate::mcp::tools::{dispatch, history, queue, work};

        let mut router = ToolRouter::new();

        for tool in Self::all_tools() {
            let name = tool.name.to_string();
            match name.as_str() {
                "add_task" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(queue::add_task(c))));
                }
                "queue" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(queue::queue(c))));
                }
                "get_task" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(queue::get_task(c))));
                }
                "update_task" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(queue::update_task(c))));
                }
                "delete_task" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(queue::delete_task(c))));
                }
                "reprioritize" => {
                    router
                        .add_route(ToolRoute::new_dyn(tool, |c| Box::pin(queue::reprioritize(c))));
                }
                "claim_task" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(work::claim_task(c))));
                }
                "complete" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(work::complete(c))));
                }
                "blocked" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(work::blocked(c))));
                }
                "blocked_tasks" => {
                    router
                        .add_route(ToolRoute::new_dyn(tool, |c| Box::pin(work::blocked_tasks(c))));
                }
                "mark_done" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(work::mark_done(c))));
                }
                "list_completed" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| {
                        Box::pin(history::list_completed(c))
                    }));
                }
                "stats" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(history::stats(c))));
                }
                "checkin" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| Box::pin(history::checkin(c))));
                }
                "dispatch_task" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| {
                        Box::pin(dispatch::dispatch_task(c))
                    }));
                }
                "dispatch_status" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| {
                        Box::pin(dispatch::dispatch_status(c))
                    }));
                }
                "dispatch_list" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| {
                        Box::pin(dispatch::dispatch_list(c))
                    }));
                }
                "dispatch_cancel" => {
                    router.add_route(ToolRoute::new_dyn(tool, |c| {
                        Box::pin(dispatch::dispatch_cancel(c))
                    }));
                }
                _ => {
                    router.add_route(ToolRoute::new_dyn(tool, |_context| {
                        Box::pin(async {
                            Err(rmcp::ErrorData::internal_error("tool not implemented", None))
                        })
                    }));
                }
            }
        }

        router
    }

    /// Convert a `serde_json::Value::Object` into the `Arc<Map>` expected by `Tool`.
    fn schema(value: serde_json::Value) -> Arc<serde_json::Map<String, serde_json::Value>> {
        match value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::default()),
        }
    }

    /// The full tool surface advertised to MCP clients.
    #[must_use]
    #[allow(clippy::too_many_lines)] // Tool definitions are intentionally verbose for clarity.
    pub fn all_tools() -> Vec<Tool> {
        vec![
            Tool {
                name: "add_task".into(),
                description: Some(
                    "Add a task to the priority queue. Priority runs 0-10, higher first; \
                     blocked_by lists task ids that must finish before this one is actionable."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task": { "type": "string" },
                        "context": { "type": "string" },
                        "priority": { "type": "integer", "minimum": 0, "maximum": 10, "default": 5 },
                        "estimated_minutes": { "type": "integer" },
                        "project": { "type": "string" },
                        "added_by": { "type": "string" },
                        "blocked_by": { "type": "array", "items": { "type": "integer" } },
                        "due_date": { "type": "string", "format": "date-time" },
                        "tags": { "type": "array", "items": { "type": "string" } },
                        "notion_page_id": { "type": "string" }
                    },
                    "required": ["task"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "queue".into(),
                description: Some(
                    "List the task queue in priority order, flagging entries that are \
                     currently blocked."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {}
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "get_task".into(),
                description: Some("Fetch one queued task by id.".into()),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task_id": { "type": "integer" }
                    },
                    "required": ["task_id"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "update_task".into(),
                description: Some(
                    "Update fields on a queued task. Omitted fields are left unchanged; \
                     passing null clears a nullable field."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task_id": { "type": "integer" },
                        "task": { "type": "string" },
                        "context": { "type": ["string", "null"] },
                        "estimated_minutes": { "type": ["integer", "null"] },
                        "project": { "type": ["string", "null"] },
                        "due_date": { "type": ["string", "null"], "format": "date-time" },
                        "tags": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["task_id"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "delete_task".into(),
                description: Some("Remove a task from the queue without completing it.".into()),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task_id": { "type": "integer" }
                    },
                    "required": ["task_id"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "reprioritize".into(),
                description: Some("Change a queued task's priority (0-10).".into()),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task_id": { "type": "integer" },
                        "priority": { "type": "integer", "minimum": 0, "maximum": 10 }
                    },
                    "required": ["task_id", "priority"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "claim_task".into(),
                description: Some(
                    "Claim a task as the current focus, removing it from the queue. \
                     Without task_id, claims the head of the queue. Fails if a task \
                     is already claimed."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task_id": { "type": "integer" }
                    }
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "complete".into(),
                description: Some(
                    "Complete the current task: log it, bump the streak, unblock \
                     dependents, and auto-claim the next unblocked task."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task_id": { "type": "integer" },
                        "time_taken_minutes": { "type": "integer" },
                        "notes": { "type": "string" }
                    }
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "blocked".into(),
                description: Some(
                    "Report a blocker on the current task. By default moves on to the \
                     next unblocked task; pass skip_to_next=false to hold the claim \
                     and mark the work state blocked."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "blocker": { "type": "string" },
                        "context": { "type": "string" },
                        "skip_to_next": { "type": "boolean", "default": true }
                    },
                    "required": ["blocker"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "blocked_tasks".into(),
                description: Some(
                    "List queued tasks whose prerequisites have not finished, with \
                     detail per blocking reference."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {}
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "mark_done".into(),
                description: Some(
                    "Mark any queued task done without claiming it. Unblocks dependents; \
                     if it was the current task, a replacement is claimed."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task_id": { "type": "integer" },
                        "notes": { "type": "string" },
                        "completed_by": { "type": "string" }
                    },
                    "required": ["task_id"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "list_completed".into(),
                description: Some("List completion history, optionally limited to recent days.".into()),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "days": { "type": "integer", "minimum": 1 }
                    }
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "stats".into(),
                description: Some("Completion counters: total, this week, today.".into()),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {}
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "checkin".into(),
                description: Some(
                    "Record a check-in and return a snapshot: goal, streak, current \
                     task, queue depth, and completion stats."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {}
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "dispatch_task".into(),
                description: Some(
                    "Queue a dispatch job for an AI agent. Local jobs run in the \
                     background worker; remote targets are relayed for pickup."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "agent": { "type": "string", "enum": ["claude", "gemini", "qwen", "cline"] },
                        "target": { "type": "string", "enum": ["hetzner", "mac", "cold_storage"], "default": "hetzner" },
                        "task": { "type": "string" },
                        "repo_path": { "type": "string" },
                        "track_as_task": { "type": "boolean", "default": false },
                        "dispatched_by": { "type": "string" },
                        "parent_dispatch_id": { "type": "integer" },
                        "depth": { "type": "integer", "minimum": 0, "default": 0 }
                    },
                    "required": ["agent", "task"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "dispatch_status".into(),
                description: Some("Fetch one dispatch job by id.".into()),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "job_id": { "type": "integer" }
                    },
                    "required": ["job_id"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "dispatch_list".into(),
                description: Some("List recent dispatch jobs, newest first.".into()),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "minimum": 1, "maximum": 100, "default": 20 }
                    }
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "dispatch_cancel".into(),
                description: Some(
                    "Cancel a dispatch job that has not started. Running or finished \
                     jobs cannot be cancelled."
                        .into(),
                ),
                input_schema: Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "job_id": { "type": "integer" }
                    },
                    "required": ["job_id"]
                })),
                output_schema: None,
                annotations: None,
                title: None,
                icons: None,
                meta: None,
            },
        ]
    }
}

impl ServerHandler for TaskdeskServer {
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send + '_ {
        let router = Self::tool_router();
        let _span = info_span!("call_tool", tool = %request.name).entered();

        async move {
            router
                .call(ToolCallContext::new(self, request, context))
                .await
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, rmcp::ErrorData>> + Send + '_ {
        let tools = Self::all_tools();

        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }
}
