//! Store adapters that keep everything in process memory.
//! Used by the `memory` store backend and by the service tests.

mod friendship_repo_memory;
mod user_repo_memory;

pub use friendship_repo_memory::*;
pub use user_repo_memory::*;
