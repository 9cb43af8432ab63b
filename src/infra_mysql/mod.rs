mod friendship_repo_mysql;
mod user_repo_mysql;

pub use friendship_repo_mysql::*;
pub use user_repo_mysql::*;

mod util;
pub use util::is_dup_key;

/// Schema for the `user` and `friendship` tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
