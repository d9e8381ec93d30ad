//! Contract tests pinning the input contracts of the MCP tool surface.
//!
//! Each block encodes the documented shape for a tool and checks the
//! required/optional field structure, so schema drift shows up here
//! before a client hits it.

use serde_json::json;

// ── add_task ─────────────────────────────────────────────────

/// Required: `task`. Optional: `context`, `priority` (0..=10, default 5),
/// `estimated_minutes`, `project`, `added_by`, `blocked_by`, `due_date`,
/// `tags`, `notion_page_id`.
#[test]
fn add_task_accepts_task_only() {
    let input = json!({ "task": "ship the release" });
    assert!(input.get("task").is_some());
    assert!(input.get("priority").is_none());
}

#[test]
fn add_task_full_input_shape() {
    let input = json!({
        "task": "ship the release",
        "context": "v2.0 is overdue",
        "priority": 8,
        "estimated_minutes": 120,
        "project": "launch",
        "added_by": "me",
        "blocked_by": [3, 7],
        "due_date": "2026-09-15T00:00:00Z",
        "tags": ["release"],
        "notion_page_id": "abc123"
    });
    assert_eq!(input["priority"].as_i64(), Some(8));
    let blockers = input["blocked_by"].as_array().expect("array");
    assert!(blockers.iter().all(serde_json::Value::is_i64));
}

// ── claim_task / complete ────────────────────────────────────

/// `claim_task` takes an optional `task_id`; omitted means "head of
/// queue".
#[test]
fn claim_task_id_is_optional() {
    let head = json!({});
    assert!(head.get("task_id").is_none());

    let explicit = json!({ "task_id": 12 });
    assert_eq!(explicit["task_id"].as_i64(), Some(12));
}

/// `complete` takes optional `task_id` (guard against stale clients),
/// `time_taken_minutes`, and `notes`.
#[test]
fn complete_input_shape() {
    let input = json!({
        "task_id": 12,
        "time_taken_minutes": 45,
        "notes": "merged and deployed"
    });
    assert!(input["time_taken_minutes"].is_i64());
    assert!(input["notes"].is_string());
}

// ── blocked ──────────────────────────────────────────────────

/// Required: `blocker`. Optional: `context`, `skip_to_next`
/// (default true — reporting a blocker moves on unless told otherwise).
#[test]
fn blocked_requires_only_the_blocker_text() {
    let input = json!({ "blocker": "waiting on DNS" });
    assert!(input.get("blocker").is_some());
    assert!(input.get("skip_to_next").is_none());
}

#[test]
fn blocked_skip_flag_is_boolean() {
    let input = json!({ "blocker": "waiting on DNS", "skip_to_next": false });
    assert_eq!(input["skip_to_next"].as_bool(), Some(false));
}

// ── dispatch_task ────────────────────────────────────────────

/// Required: `agent` (claude|gemini|qwen|cline), `task`. Optional:
/// `target` (hetzner|mac|cold_storage, default hetzner), `repo_path`,
/// `track_as_task`, `dispatched_by`, `parent_dispatch_id`, `depth`.
#[test]
fn dispatch_task_minimal_input() {
    let input = json!({ "agent": "claude", "task": "fix the flaky test" });
    assert!(input.get("agent").is_some());
    assert!(input.get("task").is_some());
    assert!(input.get("target").is_none());
}

#[test]
fn dispatch_task_agent_enum_values() {
    for agent in ["claude", "gemini", "qwen", "cline"] {
        let input = json!({ "agent": agent, "task": "t" });
        assert_eq!(input["agent"].as_str(), Some(agent));
    }
}

#[test]
fn dispatch_task_chain_fields() {
    let input = json!({
        "agent": "claude",
        "task": "delegate further",
        "parent_dispatch_id": 41,
        "depth": 2
    });
    assert_eq!(input["parent_dispatch_id"].as_i64(), Some(41));
    assert_eq!(input["depth"].as_i64(), Some(2));
}

// ── dispatch_list ────────────────────────────────────────────

/// Optional `limit`, clamped to 1..=100, default 20.
#[test]
fn dispatch_list_limit_shape() {
    let input = json!({ "limit": 50 });
    let limit = input["limit"].as_i64().expect("integer");
    assert!((1..=100).contains(&limit));
}

// ── update_task null semantics ───────────────────────────────

/// `update_task` distinguishes an omitted key (leave the field alone)
/// from an explicit null (clear it). Both shapes must stay expressible.
#[test]
fn update_task_null_clears_but_omission_preserves() {
    let clearing = json!({ "task_id": 3, "context": null });
    assert!(clearing.get("context").is_some());
    assert!(clearing["context"].is_null());

    let untouched = json!({ "task_id": 3, "priority": 9 });
    assert!(untouched.get("context").is_none());
}
