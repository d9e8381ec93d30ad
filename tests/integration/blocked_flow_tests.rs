use std::sync::Arc;

use taskdesk::models::work_state::WorkStatus;
use taskdesk::persistence::task_repo::TaskRepo;

use super::test_helpers::{add_task, machine};

#[tokio::test]
async fn reporting_blocked_without_skip_holds_the_task() {
    let (pool, wsm) = machine().await;
    add_task(&pool, "refactor billing", 6, &[]).await;
    add_task(&pool, "other work", 4, &[]).await;
    wsm.claim(None).await.expect("claim");

    let outcome = wsm
        .report_blocked("waiting on API keys", Some("ops ticket #42"), false)
        .await
        .expect("report");

    assert_eq!(outcome.blocker.blocker, "waiting on API keys");
    assert_eq!(outcome.blocker.context.as_deref(), Some("ops ticket #42"));
    assert!(outcome.reassigned.is_none());
    assert!(!outcome.cleared);

    // Current task stays in place; only the status changes.
    let state = wsm.state().await.expect("state");
    assert_eq!(state.status, WorkStatus::Blocked);
    assert_eq!(state.current_task.as_deref(), Some("refactor billing"));
}

#[tokio::test]
async fn skipping_soft_assigns_the_next_actionable_task() {
    let (pool, wsm) = machine().await;
    let stuck = add_task(&pool, "stuck task", 8, &[]).await;
    let alt = add_task(&pool, "alternative", 5, &[]).await;
    add_task(&pool, "gated", 4, &[stuck]).await;
    wsm.claim(None).await.expect("claim");

    let outcome = wsm
        .report_blocked("dependency down", None, true)
        .await
        .expect("report");

    let reassigned = outcome.reassigned.expect("reassigned");
    assert_eq!(reassigned.id, alt);
    assert!(!outcome.cleared);

    let state = wsm.state().await.expect("state");
    assert_eq!(state.current_task_id, Some(alt));
    assert_eq!(state.status, WorkStatus::Active);

    // Soft assignment: the alternative is still queued, so finishing the
    // original work later does not lose it.
    let queue = TaskRepo::new(Arc::clone(&pool)).list().await.expect("queue");
    assert!(queue.iter().any(|t| t.id == alt));
}

#[tokio::test]
async fn skipping_with_no_alternative_clears_the_current_task() {
    let (pool, wsm) = machine().await;
    let stuck = add_task(&pool, "stuck task", 8, &[]).await;
    add_task(&pool, "gated", 4, &[stuck]).await;
    wsm.claim(None).await.expect("claim");

    let outcome = wsm
        .report_blocked("vendor outage", None, true)
        .await
        .expect("report");

    assert!(outcome.reassigned.is_none());
    assert!(outcome.cleared);

    let state = wsm.state().await.expect("state");
    assert!(state.current_task_id.is_none());
    assert_eq!(state.status, WorkStatus::Active);
}

#[tokio::test]
async fn blocked_reports_are_logged_even_when_idle() {
    let (_pool, wsm) = machine().await;

    let outcome = wsm
        .report_blocked("can't decide what to do", None, false)
        .await
        .expect("report");
    assert!(outcome.blocker.resolved_at.is_none());
}
