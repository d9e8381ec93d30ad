use std::sync::Arc;

use taskdesk::models::task::NewTask;
use taskdesk::persistence::{db, state_repo::StateRepo, task_repo::TaskRepo};
use taskdesk::queue::selector::QueueSelector;

async fn fixture() -> (Arc<sqlx::SqlitePool>, QueueSelector) {
    let pool = Arc::new(db::connect_memory().await.expect("db connect"));
    StateRepo::new(Arc::clone(&pool))
        .ensure_seeded("goal", "metric")
        .await
        .expect("seed");
    let selector = QueueSelector::new(Arc::clone(&pool));
    (pool, selector)
}

async fn add(pool: &Arc<sqlx::SqlitePool>, task: &str, priority: i64, blocked_by: &[i64]) -> i64 {
    TaskRepo::new(Arc::clone(pool))
        .create(&NewTask {
            task: task.into(),
            priority,
            blocked_by: blocked_by.to_vec(),
            ..NewTask::default()
        })
        .await
        .expect("create")
        .id
}

#[tokio::test]
async fn list_orders_by_priority_then_insertion() {
    let (pool, selector) = fixture().await;
    let low = add(&pool, "low", 2, &[]).await;
    let high = add(&pool, "high", 9, &[]).await;
    let mid_a = add(&pool, "mid first", 5, &[]).await;
    let mid_b = add(&pool, "mid second", 5, &[]).await;

    let ids: Vec<i64> = selector
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![high, mid_a, mid_b, low]);
}

#[tokio::test]
async fn next_ignores_blocking_but_next_unblocked_does_not() {
    let (pool, selector) = fixture().await;
    let base = add(&pool, "base", 3, &[]).await;
    let gated = add(&pool, "gated", 9, &[base]).await;

    // Raw head of the queue is the blocked high-priority task.
    assert_eq!(selector.next().await.expect("next").map(|t| t.id), Some(gated));
    // The actionable head skips it.
    assert_eq!(
        selector.next_unblocked().await.expect("next").map(|t| t.id),
        Some(base)
    );
}

#[tokio::test]
async fn next_unblocked_can_exclude_the_task_being_skipped() {
    let (pool, selector) = fixture().await;
    let first = add(&pool, "first", 7, &[]).await;
    let second = add(&pool, "second", 4, &[]).await;

    assert_eq!(
        selector
            .next_unblocked_excluding(Some(first))
            .await
            .expect("next")
            .map(|t| t.id),
        Some(second)
    );
}

#[tokio::test]
async fn empty_queue_has_no_next() {
    let (_pool, selector) = fixture().await;
    assert!(selector.next().await.expect("next").is_none());
    assert!(selector.next_unblocked().await.expect("next").is_none());
}
