//! Browse command: the interactive history browser.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use crate::cli::FilterArgs;
use crate::git::GitCli;
use crate::history::terminal::{TerminalGuard, TerminalKeys};
use crate::history::{Session, Viewport, ViewportOptions};
use crate::utils::{BrowseOverrides, Settings};

/// Browse command options.
#[derive(Parser)]
pub struct BrowseCommand {
    /// History filters.
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Index merges and conflict resolutions over the whole history once,
    /// instead of per loaded page.
    #[arg(long)]
    pub global: bool,

    /// Number of visible rows (defaults to settings, then 30).
    #[arg(long, value_name = "N")]
    pub window_size: Option<usize>,
}

impl BrowseCommand {
    /// Executes the browse command.
    pub fn execute(self) -> Result<()> {
        // Preflight check: validate git repository before any processing
        let workdir = crate::utils::check_history_prerequisites()?;

        let settings = Settings::load()?;
        let resolved = settings.resolve_browse(BrowseOverrides {
            window_size: self.window_size,
            global: self.global,
        })?;
        let filter = self.filter.into_filter()?;
        debug!(?resolved, ?filter, "Opening history browser");

        let viewport = Viewport::open(
            GitCli::at(&workdir),
            ViewportOptions {
                filter,
                window_size: resolved.window_size,
                strategy: resolved.strategy,
            },
        )
        .context("Failed to load the first page of history")?;

        let _guard = TerminalGuard::enter().context("Failed to prepare the terminal")?;
        let mut session = Session::new(viewport, TerminalKeys, io::stdout());
        session.run().context("Terminal output failed")?;

        Ok(())
    }
}
