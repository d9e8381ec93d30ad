//! Slack integration: Socket Mode client with a buffered send queue,
//! plus the dispatch-command listener.

pub mod client;
pub mod listener;

pub use client::{SlackMessage, SlackService};
pub use listener::ListenerState;
