//! MCP server: tool router, shared state, and stdio transport.

pub mod handler;
pub mod tools;
pub mod transport;

pub use handler::{AppState, TaskdeskServer};
