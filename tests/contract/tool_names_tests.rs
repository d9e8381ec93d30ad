//! Contract tests for the advertised MCP tool list.
//!
//! Constructing the list exercises every `Tool` literal, so a field
//! added by an rmcp upgrade breaks here rather than at serve time.

use taskdesk::mcp::handler::TaskdeskServer;

const EXPECTED_TOOLS: [&str; 18] = [
    "add_task",
    "queue",
    "get_task",
    "update_task",
    "delete_task",
    "reprioritize",
    "claim_task",
    "complete",
    "blocked",
    "blocked_tasks",
    "mark_done",
    "list_completed",
    "stats",
    "checkin",
    "dispatch_task",
    "dispatch_status",
    "dispatch_list",
    "dispatch_cancel",
];

#[test]
fn tool_list_is_complete_and_ordered() {
    let names: Vec<String> = TaskdeskServer::all_tools()
        .iter()
        .map(|t| t.name.to_string())
        .collect();
    assert_eq!(names, EXPECTED_TOOLS);
}

#[test]
fn every_tool_has_a_description_and_object_schema() {
    for tool in TaskdeskServer::all_tools() {
        let description = tool.description.as_ref().unwrap_or_else(|| {
            panic!("tool {} missing description", tool.name);
        });
        assert!(!description.is_empty());
        assert_eq!(
            tool.input_schema.get("type").and_then(|v| v.as_str()),
            Some("object"),
            "tool {} schema must be an object",
            tool.name
        );
    }
}

#[test]
fn blocked_tool_advertises_skip_by_default() {
    let tools = TaskdeskServer::all_tools();
    let blocked = tools
        .iter()
        .find(|t| t.name == "blocked")
        .expect("blocked tool present");
    let default = blocked
        .input_schema
        .get("properties")
        .and_then(|p| p.get("skip_to_next"))
        .and_then(|s| s.get("default"))
        .and_then(serde_json::Value::as_bool);
    assert_eq!(default, Some(true));
}
