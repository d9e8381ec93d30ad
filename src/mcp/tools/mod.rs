//! MCP tool handlers, grouped by domain.

pub mod dispatch;
pub mod history;
pub mod queue;
pub mod util;
pub mod work;
