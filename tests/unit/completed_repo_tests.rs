use std::sync::Arc;

use chrono::{Duration, Utc};
use taskdesk::persistence::{completed_repo::CompletedRepo, db};

async fn repo() -> CompletedRepo {
    let pool = db::connect_memory().await.expect("db connect");
    CompletedRepo::new(Arc::new(pool))
}

#[tokio::test]
async fn log_and_list_newest_first() {
    let repo = repo().await;
    repo.log("first done", Some("ctx"), Some(30), Some("smooth"), Some("proj"))
        .await
        .expect("log");
    repo.log("second done", None, None, None, None)
        .await
        .expect("log");

    let completed = repo.list(None).await.expect("list");
    assert_eq!(completed.len(), 2);
    assert_eq!(completed[0].task, "second done");
    assert_eq!(completed[1].task, "first done");
    assert_eq!(completed[1].time_taken_minutes, Some(30));
    assert_eq!(completed[1].notes.as_deref(), Some("smooth"));
    assert_eq!(completed[1].project.as_deref(), Some("proj"));
}

#[tokio::test]
async fn list_since_filters_old_entries() {
    let repo = repo().await;
    repo.log("recent", None, None, None, None).await.expect("log");

    let future_cutoff = Utc::now() + Duration::hours(1);
    assert!(repo.list(Some(future_cutoff)).await.expect("list").is_empty());

    let past_cutoff = Utc::now() - Duration::hours(1);
    assert_eq!(repo.list(Some(past_cutoff)).await.expect("list").len(), 1);
}

#[tokio::test]
async fn stats_count_today_week_and_total() {
    let repo = repo().await;
    let stats = repo.stats().await.expect("stats");
    assert_eq!(stats.total_completed, 0);
    assert_eq!(stats.completed_this_week, 0);
    assert_eq!(stats.completed_today, 0);

    repo.log("done now", None, None, None, None).await.expect("log");
    let stats = repo.stats().await.expect("stats");
    // A just-logged completion lands in every bucket.
    assert_eq!(stats.total_completed, 1);
    assert_eq!(stats.completed_this_week, 1);
    assert_eq!(stats.completed_today, 1);
}
