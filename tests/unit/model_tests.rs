use taskdesk::models::dispatch::{Agent, JobStatus, Target};
use taskdesk::models::task::{TaskUpdate, MAX_PRIORITY};
use taskdesk::models::work_state::WorkStatus;

#[test]
fn agent_string_round_trip() {
    for agent in [Agent::Claude, Agent::Gemini, Agent::Qwen, Agent::Cline] {
        assert_eq!(Agent::parse(agent.as_str()), Some(agent));
    }
    assert_eq!(Agent::parse("CLAUDE"), Some(Agent::Claude));
    assert_eq!(Agent::parse("copilot"), None);
}

#[test]
fn target_string_round_trip() {
    for target in [Target::Hetzner, Target::Mac, Target::ColdStorage] {
        assert_eq!(Target::parse(target.as_str()), Some(target));
    }
    assert_eq!(Target::parse("Cold_Storage"), Some(Target::ColdStorage));
    assert_eq!(Target::parse("laptop"), None);
}

#[test]
fn default_target_is_local() {
    assert_eq!(Target::default(), Target::Hetzner);
    assert!(Target::Hetzner.is_local());
    assert!(!Target::Mac.is_local());
    assert!(!Target::ColdStorage.is_local());
}

#[test]
fn job_status_terminality() {
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
}

#[test]
fn job_status_string_round_trip() {
    for status in [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
    ] {
        assert_eq!(JobStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(JobStatus::parse("cancelled"), None);
}

#[test]
fn work_status_string_round_trip() {
    for status in [WorkStatus::Active, WorkStatus::Blocked, WorkStatus::Paused] {
        assert_eq!(WorkStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(WorkStatus::parse("idle"), None);
}

#[test]
fn priority_ceiling() {
    assert_eq!(MAX_PRIORITY, 10);
}

#[test]
fn empty_task_update_detected() {
    assert!(TaskUpdate::default().is_empty());

    let update = TaskUpdate {
        context: Some(None),
        ..TaskUpdate::default()
    };
    assert!(!update.is_empty());
}
