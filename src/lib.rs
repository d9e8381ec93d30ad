#![forbid(unsafe_code)]

//! `taskdesk` — MCP task-queue and AI-dispatch server library.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod mcp;
pub mod models;
pub mod persistence;
pub mod queue;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
