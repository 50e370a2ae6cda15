//! # histview
//!
//! An interactive, paginated git history browser.
//!
//! ## Features
//!
//! - Loads history one window at a time, so large repositories open instantly
//! - Draws the branch graph with refs, merges and conflict resolutions marked
//! - Vim-style navigation with `gg`/`GG` chords
//! - Windowed or whole-history merge/conflict search
//!
//! ## Quick Start
//!
//! ```rust
//! use histview::history::graph::parse_line;
//!
//! let row = parse_line("* abc1234 - (HEAD -> main) Initial commit (2024-01-04T12:00:00Z) <Jane>");
//! assert_eq!(row.hash(), Some("abc1234"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod git;
pub mod history;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of histview.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
