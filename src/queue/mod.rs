//! Task queue core: blocking resolution, selection, and the work state
//! machine.

pub mod blocking;
pub mod selector;
pub mod work;
