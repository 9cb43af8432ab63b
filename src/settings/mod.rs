//! Settings are read from a TOML file (`--settings <path>`), then overridden
//! from `PEOPLEGRID__*` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
