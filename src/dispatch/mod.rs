//! Dispatch subsystem: inline command parsing, local agent execution,
//! and job lifecycle orchestration.

pub mod orchestrator;
pub mod parser;
pub mod runner;
pub mod worker;
