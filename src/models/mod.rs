//! Domain model types.

pub mod blocker;
pub mod completed;
pub mod dispatch;
pub mod task;
pub mod work_state;
