mod friendship_repo;
mod user_repo;

pub use friendship_repo::*;
pub use user_repo::*;
