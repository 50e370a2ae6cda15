//! Git command-line integration.

pub mod command;
pub mod query;

pub use command::GitCli;

/// Number of hex characters shown for abbreviated commit hashes in details.
pub const SHORT_HASH_LEN: usize = 8;
