//! CLI interface for histview.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::history::{HistoryFilter, Since};

pub mod browse;
pub mod config;
pub mod page;

/// histview: an interactive, paginated git history browser.
#[derive(Parser)]
#[command(name = "histview")]
#[command(about = "Browse git history one window at a time", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories.
#[derive(Subcommand)]
pub enum Commands {
    /// Opens the interactive history browser.
    Browse(browse::BrowseCommand),
    /// Prints one parsed and indexed page of history as YAML.
    Page(page::PageCommand),
    /// Configuration operations.
    Config(config::ConfigCommand),
}

/// History filter options shared by every history command.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Glob restricting which branches the branch list shows.
    #[arg(long, value_name = "GLOB")]
    pub branch: Option<String>,

    /// Only show commits by this author.
    #[arg(long)]
    pub author: Option<String>,

    /// Only show commits newer than this, e.g. 2.weeks or day.
    #[arg(long, value_name = "N.UNIT")]
    pub since: Option<Since>,
}

impl FilterArgs {
    /// Builds the session filter, validating the branch glob.
    pub fn into_filter(self) -> Result<HistoryFilter> {
        let filter = HistoryFilter {
            branch_pattern: self.branch.filter(|b| !b.is_empty()),
            author: self.author.filter(|a| !a.is_empty()),
            since: self.since,
        };
        filter.branch_matcher()?;
        Ok(filter)
    }
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Browse(browse_cmd) => browse_cmd.execute(),
            Commands::Page(page_cmd) => page_cmd.execute(),
            Commands::Config(config_cmd) => config_cmd.execute(),
        }
    }
}
