//! Page command: prints one parsed history page as YAML.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::cli::FilterArgs;
use crate::git::GitCli;
use crate::history::graph::parse_lines;
use crate::history::{
    CommitIndex, CommitRow, CommitSource, HistoryFilter, IndexStrategy, PageRequest,
};
use crate::utils::{BrowseOverrides, Settings};

/// Page command options.
#[derive(Parser)]
pub struct PageCommand {
    /// History filters.
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Number of commits to skip from the newest.
    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    /// Number of commits to load (defaults to twice the window size).
    #[arg(long, value_name = "N")]
    pub max_count: Option<usize>,

    /// Use the whole-history merge/conflict index.
    #[arg(long)]
    pub global: bool,
}

/// One page as printed by `histview page`.
#[derive(Debug, Serialize)]
pub struct PageView {
    /// Commits skipped before the page.
    pub skip: usize,
    /// Commits requested.
    pub max_count: usize,
    /// Commits reachable under the filter.
    pub total_commits: usize,
    /// Index strategy used to mark merges and conflicts.
    pub strategy: IndexStrategy,
    /// Parsed rows.
    pub rows: Vec<CommitRow>,
}

impl PageView {
    /// Loads exactly `max_count` commits after `skip`, indexed with `strategy`.
    ///
    /// An offset past the end is pulled back to the last full page.
    pub fn load<S: CommitSource>(
        source: &S,
        filter: HistoryFilter,
        strategy: IndexStrategy,
        skip: usize,
        max_count: usize,
    ) -> Result<Self> {
        let total_commits = source
            .total_count(&filter)
            .context("Failed to count history")?;
        let skip = skip.min(total_commits.saturating_sub(max_count));

        let lines = source
            .load_page(&PageRequest {
                skip,
                max_count,
                filter,
            })
            .with_context(|| format!("Failed to load history at offset {skip}"))?;
        let mut rows = parse_lines(lines.iter().map(String::as_str));

        let mut index = CommitIndex::new(strategy);
        index.refresh(source, &rows);
        index.apply(&mut rows);

        Ok(Self {
            skip,
            max_count,
            total_commits,
            strategy,
            rows,
        })
    }
}

impl PageCommand {
    /// Executes the page command.
    pub fn execute(self) -> Result<()> {
        // Preflight check: validate git repository before any processing
        let workdir = crate::utils::check_history_prerequisites()?;

        let settings = Settings::load()?;
        let resolved = settings.resolve_browse(BrowseOverrides {
            window_size: None,
            global: self.global,
        })?;
        // Without an explicit count a page is what the browser loads: twice
        // the window.
        let max_count = self
            .max_count
            .unwrap_or_else(|| resolved.window_size.saturating_mul(2))
            .max(1);

        let view = PageView::load(
            &GitCli::at(&workdir),
            self.filter.into_filter()?,
            resolved.strategy,
            self.skip,
            max_count,
        )?;

        let yaml_output =
            serde_yaml::to_string(&view).context("Failed to serialize page to YAML")?;
        print!("{yaml_output}");

        Ok(())
    }
}
