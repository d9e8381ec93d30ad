//! Shared fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use taskdesk::config::GlobalConfig;
use taskdesk::models::dispatch::{DispatchJob, JobStatus};
use taskdesk::models::task::NewTask;
use taskdesk::persistence::{db, state_repo::StateRepo, task_repo::TaskRepo, SqlitePool};
use taskdesk::queue::work::WorkStateMachine;

/// Fresh in-memory database with the work state seeded.
pub async fn memory_pool() -> Arc<SqlitePool> {
    let pool = Arc::new(db::connect_memory().await.expect("db connect"));
    StateRepo::new(Arc::clone(&pool))
        .ensure_seeded("Ship the project", "features shipped")
        .await
        .expect("seed state");
    pool
}

/// Work state machine over a fresh seeded pool.
pub async fn machine() -> (Arc<SqlitePool>, WorkStateMachine) {
    let pool = memory_pool().await;
    let machine = WorkStateMachine::new(Arc::clone(&pool));
    (pool, machine)
}

/// Queue a task with the given priority and blockers, returning its id.
pub async fn add_task(pool: &Arc<SqlitePool>, task: &str, priority: i64, blocked_by: &[i64]) -> i64 {
    TaskRepo::new(Arc::clone(pool))
        .create(&NewTask {
            task: task.into(),
            priority,
            blocked_by: blocked_by.to_vec(),
            ..NewTask::default()
        })
        .await
        .expect("create task")
        .id
}

/// Config whose local dispatch runs the given command instead of a real
/// agent CLI.
pub fn dispatch_config(agent_cli: &str, timeout_ms: u64) -> GlobalConfig {
    let mut config = GlobalConfig::default();
    config.dispatch.agent_cli = agent_cli.to_owned();
    config.dispatch.agent_cli_args = Vec::new();
    config.dispatch.timeout_ms = timeout_ms;
    config
}

/// Poll the job until it reaches a terminal status or the deadline passes.
pub async fn wait_for_terminal(
    jobs: &taskdesk::persistence::job_repo::JobRepo,
    job_id: i64,
) -> DispatchJob {
    for _ in 0..100 {
        let job = jobs.get(job_id).await.expect("get job").expect("job exists");
        if matches!(job.status, JobStatus::Completed | JobStatus::Failed) {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {job_id} never reached a terminal status");
}
