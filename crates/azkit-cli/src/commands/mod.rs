//! One module per subcommand; each exposes `execute`.

pub mod add;
pub mod completions;
pub mod config;
pub mod list;
pub mod package;
