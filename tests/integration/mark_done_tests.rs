use taskdesk::AppError;

use super::test_helpers::{add_task, machine};

#[tokio::test]
async fn marking_a_queued_task_done_cascades_unblocking() {
    let (pool, wsm) = machine().await;
    let a = add_task(&pool, "upstream fix", 6, &[]).await;
    let b = add_task(&pool, "downstream work", 5, &[a]).await;

    let outcome = wsm
        .mark_done(a, "landed in the other repo", Some("teammate"))
        .await
        .expect("mark done");

    assert_eq!(outcome.task.id, a);
    assert!(!outcome.was_current);
    assert!(outcome.reassigned.is_none());
    assert_eq!(outcome.unblocked.len(), 1);
    assert_eq!(outcome.unblocked[0].id, b);

    // The dependent's blocker list no longer mentions the finished task.
    let dependent = taskdesk::persistence::task_repo::TaskRepo::new(std::sync::Arc::clone(&pool))
        .get(b)
        .await
        .expect("get")
        .expect("still queued");
    assert!(dependent.blocked_by.is_empty());

    let state = wsm.state().await.expect("state");
    assert!(state.current_task_id.is_none());
}

#[tokio::test]
async fn marking_the_soft_assigned_current_task_reassigns() {
    let (pool, wsm) = machine().await;
    add_task(&pool, "stuck task", 8, &[]).await;
    let alt = add_task(&pool, "alternative", 5, &[]).await;
    let other = add_task(&pool, "leftover", 3, &[]).await;

    wsm.claim(None).await.expect("claim");
    // Skipping soft-assigns the alternative without dequeueing it.
    wsm.report_blocked("blocked upstream", None, true)
        .await
        .expect("skip");

    let outcome = wsm
        .mark_done(alt, "done over lunch", None)
        .await
        .expect("mark done");

    assert!(outcome.was_current);
    let reassigned = outcome.reassigned.expect("replacement");
    assert_eq!(reassigned.id, other);

    let state = wsm.state().await.expect("state");
    assert_eq!(state.current_task_id, Some(other));
}

#[tokio::test]
async fn marking_a_claimed_task_done_is_not_found() {
    // A hard claim removes the task from the queue, so it can only be
    // finished through complete().
    let (pool, wsm) = machine().await;
    let a = add_task(&pool, "claimed", 5, &[]).await;
    wsm.claim(None).await.expect("claim");

    let err = wsm.mark_done(a, "", None).await.expect_err("not queued");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn mark_done_of_unknown_id_is_not_found() {
    let (_pool, wsm) = machine().await;
    let err = wsm.mark_done(777, "", None).await.expect_err("missing");
    assert!(matches!(err, AppError::NotFound(_)));
}
