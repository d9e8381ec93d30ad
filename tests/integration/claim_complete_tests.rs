use std::sync::Arc;

use taskdesk::models::work_state::WorkStatus;
use taskdesk::persistence::task_repo::TaskRepo;
use taskdesk::queue::work::ClaimOutcome;
use taskdesk::AppError;

use super::test_helpers::{add_task, machine};

#[tokio::test]
async fn claim_takes_highest_priority_unblocked_task() {
    let (pool, wsm) = machine().await;
    let urgent = add_task(&pool, "fix prod outage", 8, &[]).await;
    let followup = add_task(&pool, "write postmortem", 5, &[urgent]).await;
    add_task(&pool, "tidy backlog", 3, &[]).await;

    let outcome = wsm.claim(None).await.expect("claim");
    let ClaimOutcome::Claimed(task) = outcome else {
        panic!("queue was not empty");
    };
    assert_eq!(task.id, urgent);

    // Claimed tasks leave the queue; the blocked follow-up stays put.
    let state = wsm.state().await.expect("state");
    assert_eq!(state.current_task_id, Some(urgent));
    assert_eq!(state.current_task.as_deref(), Some("fix prod outage"));
    assert!(state.current_task_assigned_at.is_some());
    assert_eq!(state.status, WorkStatus::Active);

    let queue = TaskRepo::new(Arc::clone(&pool)).list().await.expect("queue");
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().any(|t| t.id == followup));
}

#[tokio::test]
async fn claim_while_holding_a_task_conflicts() {
    let (pool, wsm) = machine().await;
    add_task(&pool, "a", 5, &[]).await;
    add_task(&pool, "b", 4, &[]).await;

    wsm.claim(None).await.expect("first claim");
    let err = wsm.claim(None).await.expect_err("second claim");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn claim_of_missing_id_is_not_found() {
    let (_pool, wsm) = machine().await;
    let err = wsm.claim(Some(404)).await.expect_err("claim missing");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn claim_on_empty_queue_reports_empty() {
    let (_pool, wsm) = machine().await;
    assert_eq!(wsm.claim(None).await.expect("claim"), ClaimOutcome::QueueEmpty);
}

#[tokio::test]
async fn complete_unblocks_dependents_and_auto_claims_next() {
    let (pool, wsm) = machine().await;
    let a = add_task(&pool, "design schema", 8, &[]).await;
    let b = add_task(&pool, "write migrations", 5, &[a]).await;
    let c = add_task(&pool, "update readme", 3, &[]).await;

    wsm.claim(None).await.expect("claim a");
    let outcome = wsm
        .complete(None, Some(30), Some("went smoothly"))
        .await
        .expect("complete a");

    assert_eq!(outcome.completed, "design schema");
    assert_eq!(outcome.unblocked.len(), 1);
    assert_eq!(outcome.unblocked[0].id, b);
    assert_eq!(outcome.streak_days, 1);

    // The freed dependent outranks the low-priority task and is claimed.
    let next = outcome.next.expect("next task");
    assert_eq!(next.id, b);
    let state = wsm.state().await.expect("state");
    assert_eq!(state.current_task_id, Some(b));
    assert!(state.last_completion.is_some());

    // Completing the chain walks down to the remaining task.
    let outcome = wsm.complete(None, None, None).await.expect("complete b");
    assert_eq!(outcome.next.as_ref().map(|t| t.id), Some(c));
    assert_eq!(outcome.streak_days, 2);

    let outcome = wsm.complete(None, None, None).await.expect("complete c");
    assert!(outcome.next.is_none());
    assert!(outcome.unblocked.is_empty());
    let state = wsm.state().await.expect("state");
    assert!(state.current_task_id.is_none());
    assert!(state.current_task.is_none());
}

#[tokio::test]
async fn complete_with_mismatched_id_is_rejected() {
    let (pool, wsm) = machine().await;
    add_task(&pool, "a", 5, &[]).await;
    wsm.claim(None).await.expect("claim");

    let err = wsm.complete(Some(999), None, None).await.expect_err("mismatch");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn complete_without_a_current_task_conflicts() {
    let (_pool, wsm) = machine().await;
    let err = wsm.complete(None, None, None).await.expect_err("nothing claimed");
    assert!(matches!(err, AppError::Conflict(_)));
}
