use std::collections::HashSet;

use chrono::Utc;
use taskdesk::models::task::QueuedTask;
use taskdesk::queue::blocking::{first_unblocked, is_blocked, unblocked_by};

fn task(id: i64, priority: i64, blocked_by: Vec<i64>) -> QueuedTask {
    QueuedTask {
        id,
        task: format!("task {id}"),
        context: None,
        priority,
        estimated_minutes: None,
        project: None,
        added_at: Utc::now(),
        added_by: None,
        blocked_by,
        due_date: None,
        tags: Vec::new(),
        notion_page_id: None,
    }
}

fn ids(queue: &[QueuedTask]) -> HashSet<i64> {
    queue.iter().map(|t| t.id).collect()
}

#[test]
fn task_without_blockers_is_unblocked() {
    let queue = vec![task(1, 5, vec![])];
    assert!(!is_blocked(&queue[0], &ids(&queue), None));
}

#[test]
fn queued_blocker_blocks() {
    let queue = vec![task(1, 5, vec![]), task(2, 5, vec![1])];
    assert!(is_blocked(&queue[1], &ids(&queue), None));
}

#[test]
fn in_progress_blocker_blocks() {
    // Blocker 1 was claimed, so it is out of the queue but unfinished.
    let queue = vec![task(2, 5, vec![1])];
    assert!(is_blocked(&queue[0], &ids(&queue), Some(1)));
}

#[test]
fn dangling_blocker_fails_open() {
    // Blocker 9 is neither queued nor in progress: treated as finished.
    let queue = vec![task(2, 5, vec![9])];
    assert!(!is_blocked(&queue[0], &ids(&queue), None));
}

#[test]
fn self_reference_fails_open() {
    let queue = vec![task(3, 5, vec![3])];
    assert!(!is_blocked(&queue[0], &ids(&queue), None));
}

#[test]
fn unblocked_by_returns_fully_freed_tasks_only() {
    let queue = vec![
        task(1, 8, vec![]),
        task(2, 5, vec![1]),
        task(3, 5, vec![1, 4]),
        task(4, 3, vec![]),
    ];
    // Finishing 1 frees 2 outright; 3 still waits on queued 4.
    let freed = unblocked_by(&queue, 1, None);
    let freed_ids: Vec<i64> = freed.iter().map(|t| t.id).collect();
    assert_eq!(freed_ids, vec![2]);
}

#[test]
fn unblocked_by_ignores_tasks_that_were_already_free() {
    let queue = vec![task(1, 8, vec![]), task(2, 5, vec![])];
    assert!(unblocked_by(&queue, 1, None).is_empty());
}

#[test]
fn unblocked_by_respects_in_progress_blocker() {
    // Task 2 waits on both the finishing task and the claimed task 7.
    let queue = vec![task(2, 5, vec![1, 7])];
    assert!(unblocked_by(&queue, 1, Some(7)).is_empty());
}

#[test]
fn first_unblocked_honors_queue_order() {
    let queue = vec![
        task(2, 9, vec![5]),
        task(3, 7, vec![]),
        task(4, 1, vec![]),
        task(5, 0, vec![]),
    ];
    // Highest priority is blocked by queued 5, so 3 wins.
    let next = first_unblocked(&queue, None, None).expect("has unblocked");
    assert_eq!(next.id, 3);
}

#[test]
fn first_unblocked_can_exclude_one_task() {
    let queue = vec![task(3, 7, vec![]), task(4, 1, vec![])];
    let next = first_unblocked(&queue, None, Some(3)).expect("has unblocked");
    assert_eq!(next.id, 4);
}

#[test]
fn first_unblocked_empty_when_everything_blocked() {
    let queue = vec![task(2, 9, vec![3]), task(3, 7, vec![2])];
    assert!(first_unblocked(&queue, None, None).is_none());
}
