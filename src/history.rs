//! Paginated commit-history browser.
//!
//! The browser keeps only a window of the history in memory. Pages are
//! loaded through a [`CommitSource`], parsed into [`CommitRow`]s, annotated by
//! a [`CommitIndex`] and navigated through a [`Viewport`]. Keystrokes flow
//! through a [`Dispatcher`] into a [`Session`], which also owns the popups.

pub mod error;
pub mod filter;
pub mod graph;
pub mod index;
pub mod input;
pub mod render;
pub mod session;
pub mod source;
pub mod terminal;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::HistoryError;
pub use filter::{HistoryFilter, Since, SinceUnit};
pub use graph::{CommitNode, CommitRow};
pub use index::{CommitIndex, IndexStrategy, SearchKind};
pub use input::{Action, Dispatcher, Key, KeyDecoder, KeySource};
pub use session::Session;
pub use source::{BranchCheckout, BranchScope, CommitSource, PageRequest};
pub use viewport::{
    BranchSwitch, Direction, Viewport, ViewportOptions, DEFAULT_WINDOW_SIZE, MAX_WINDOW_SIZE,
};
