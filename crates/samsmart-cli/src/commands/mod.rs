//! Command implementations for the CLI.

mod check;
mod fetch;
mod merge;

pub use check::cmd_check;
pub use fetch::{FetchArgs, cmd_fetch};
pub use merge::{MergeArgs, cmd_merge};
