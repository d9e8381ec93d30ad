use std::sync::Arc;

use taskdesk::models::work_state::WorkStatus;
use taskdesk::persistence::{db, state_repo::StateRepo};
use taskdesk::AppError;

async fn seeded_repo() -> StateRepo {
    let pool = db::connect_memory().await.expect("db connect");
    let repo = StateRepo::new(Arc::new(pool));
    repo.ensure_seeded("Ship", "tasks per week")
        .await
        .expect("seed");
    repo
}

#[tokio::test]
async fn get_before_seed_errors() {
    let pool = db::connect_memory().await.expect("db connect");
    let repo = StateRepo::new(Arc::new(pool));
    let result = repo.get().await;
    assert!(matches!(result, Err(AppError::Db(_))));
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let repo = seeded_repo().await;
    // Second seed must not overwrite the existing row.
    repo.ensure_seeded("Other goal", "other metric")
        .await
        .expect("reseed");

    let state = repo.get().await.expect("get");
    assert_eq!(state.goal, "Ship");
    assert_eq!(state.goal_metric, "tasks per week");
    assert_eq!(state.streak_days, 0);
    assert_eq!(state.status, WorkStatus::Active);
    assert!(!state.has_current_task());
}

#[tokio::test]
async fn assign_and_clear_current_task() {
    let repo = seeded_repo().await;

    repo.assign_current("fix the deploy", Some("urgent"), 7)
        .await
        .expect("assign");
    let state = repo.get().await.expect("get");
    assert_eq!(state.current_task.as_deref(), Some("fix the deploy"));
    assert_eq!(state.current_task_context.as_deref(), Some("urgent"));
    assert_eq!(state.current_task_id, Some(7));
    assert!(state.current_task_assigned_at.is_some());
    assert!(state.has_current_task());

    repo.clear_current().await.expect("clear");
    let state = repo.get().await.expect("get");
    assert_eq!(state.current_task, None);
    assert_eq!(state.current_task_id, None);
    assert_eq!(state.status, WorkStatus::Active);
}

#[tokio::test]
async fn assigning_resets_blocked_status() {
    let repo = seeded_repo().await;
    repo.set_status(WorkStatus::Blocked).await.expect("block");
    assert_eq!(repo.get().await.expect("get").status, WorkStatus::Blocked);

    repo.assign_current("next thing", None, 9).await.expect("assign");
    assert_eq!(repo.get().await.expect("get").status, WorkStatus::Active);
}

#[tokio::test]
async fn status_transitions_persist() {
    let repo = seeded_repo().await;
    for status in [WorkStatus::Paused, WorkStatus::Blocked, WorkStatus::Active] {
        repo.set_status(status).await.expect("set status");
        assert_eq!(repo.get().await.expect("get").status, status);
    }
}

#[tokio::test]
async fn streak_reset_and_checkin() {
    let repo = seeded_repo().await;

    repo.reset_streak().await.expect("reset");
    let state = repo.get().await.expect("get");
    assert_eq!(state.streak_days, 0);
    assert!(state.last_checkin.is_none());

    repo.record_checkin().await.expect("checkin");
    let state = repo.get().await.expect("get");
    assert!(state.last_checkin.is_some());
}
