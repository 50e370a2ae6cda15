//! Scrolling window and cursor over the paginated commit sequence.
//!
//! The loaded page always starts at `window_start` (the number of commits
//! skipped) and holds up to twice the window size for lookahead. The cursor
//! indexes into the loaded rows; whenever it crosses a window boundary the
//! window moves and the page is reloaded, re-anchoring the cursor on the same
//! commit.

use std::ops::Range;

use tracing::{debug, info};

use crate::history::graph::parse_lines;
use crate::history::{
    BranchCheckout, BranchScope, CommitIndex, CommitRow, CommitSource, HistoryError,
    HistoryFilter, IndexStrategy, PageRequest, SearchKind,
};

/// Number of visible rows when none is configured.
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Largest window a viewport accepts; larger requests are clamped.
pub const MAX_WINDOW_SIZE: usize = 10_000;

/// Direction of a search or branch switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards older commits, or the next branch in the list.
    Next,
    /// Towards newer commits, or the previous branch in the list.
    Previous,
}

/// Options fixed when a viewport is opened.
#[derive(Debug, Clone)]
pub struct ViewportOptions {
    /// Initial history filter.
    pub filter: HistoryFilter,
    /// Number of visible rows.
    pub window_size: usize,
    /// Merge/conflict indexing strategy for the session.
    pub strategy: IndexStrategy,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            filter: HistoryFilter::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            strategy: IndexStrategy::Windowed,
        }
    }
}

/// Outcome of a successful branch switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSwitch {
    /// Branch checked out before the switch.
    pub from: String,
    /// Branch checked out now.
    pub to: String,
    /// Output reported by the checkout.
    pub output: String,
}

/// Window/cursor state over a [`CommitSource`].
#[derive(Debug)]
pub struct Viewport<S> {
    source: S,
    filter: HistoryFilter,
    window_start: usize,
    window_size: usize,
    cursor: usize,
    scroll: usize,
    rows: Vec<CommitRow>,
    total_commits: usize,
    index: CommitIndex,
    loads: usize,
}

impl<S: CommitSource> Viewport<S> {
    /// Counts the history and loads the first page.
    ///
    /// Unlike later reloads, a failure here is returned to the caller: there
    /// is nothing to show yet.
    pub fn open(source: S, options: ViewportOptions) -> Result<Self, HistoryError> {
        let mut viewport = Self {
            source,
            filter: options.filter,
            window_start: 0,
            window_size: options.window_size.clamp(1, MAX_WINDOW_SIZE),
            cursor: 0,
            scroll: 0,
            rows: Vec::new(),
            total_commits: 0,
            index: CommitIndex::new(options.strategy),
            loads: 0,
        };
        viewport.total_commits = viewport.source.total_count(&viewport.filter)?;
        viewport.load_at(0)?;
        Ok(viewport)
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the active filter.
    pub fn filter(&self) -> &HistoryFilter {
        &self.filter
    }

    /// Index of the first loaded commit in the logical sequence.
    pub fn window_start(&self) -> usize {
        self.window_start
    }

    /// Number of visible rows.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Cursor position within the loaded rows.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rows of the loaded page.
    pub fn rows(&self) -> &[CommitRow] {
        &self.rows
    }

    /// Number of commits reachable under the current filter.
    pub fn total_commits(&self) -> usize {
        self.total_commits
    }

    /// Merge/conflict index for this session.
    pub fn index(&self) -> &CommitIndex {
        &self.index
    }

    /// Number of page loads performed so far.
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Row under the cursor.
    pub fn current_row(&self) -> Option<&CommitRow> {
        self.rows.get(self.cursor)
    }

    /// Range of loaded rows currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let end = self.scroll.saturating_add(self.window_size).min(self.rows.len());
        self.scroll.min(end)..end
    }

    /// Rows currently on screen.
    pub fn visible_rows(&self) -> &[CommitRow] {
        &self.rows[self.visible_range()]
    }

    /// Largest valid `window_start`.
    pub fn max_window_start(&self) -> usize {
        self.total_commits.saturating_sub(self.window_size)
    }

    /// Loads the page starting at `start` and swaps it in.
    ///
    /// The new rows replace the old ones only once the whole page has been
    /// parsed and indexed; on failure nothing changes.
    fn load_at(&mut self, start: usize) -> Result<(), HistoryError> {
        let request = PageRequest {
            skip: start,
            max_count: self.window_size.saturating_mul(2),
            filter: self.filter.clone(),
        };
        let lines = self.source.load_page(&request)?;
        let mut rows = parse_lines(lines.iter().map(String::as_str));
        self.index.refresh(&self.source, &rows);
        self.index.apply(&mut rows);

        debug!(
            window_start = start,
            rows = rows.len(),
            "Loaded history page"
        );
        self.window_start = start;
        self.rows = rows;
        self.scroll = 0;
        self.loads += 1;
        self.clamp_cursor();
        Ok(())
    }

    /// Moves the window to `new_start`, clamped to the valid range.
    ///
    /// Returns whether a reload happened.
    pub fn move_window(&mut self, new_start: usize) -> Result<bool, HistoryError> {
        let clamped = new_start.min(self.max_window_start());
        if clamped == self.window_start {
            return Ok(false);
        }
        self.load_at(clamped)?;
        Ok(true)
    }

    /// Logical index of the commit at, or just after, `row`.
    fn ordinal(&self, row: usize) -> usize {
        let commits_before = self.rows[..row.min(self.rows.len())]
            .iter()
            .filter(|r| !r.is_graph_only())
            .count();
        self.window_start + commits_before
    }

    /// Nearest commit hash at or above `row`, with its distance in rows.
    fn anchor_at(&self, row: usize) -> Option<(String, usize)> {
        (0..=row.min(self.rows.len().saturating_sub(1)))
            .rev()
            .find_map(|i| {
                self.rows[i]
                    .hash()
                    .filter(|h| !h.is_empty())
                    .map(|h| (h.to_string(), row - i))
            })
    }

    fn position_of(&self, hash: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.hash() == Some(hash))
    }

    fn restore_anchor(&mut self, anchor: Option<(String, usize)>, fallback: usize) {
        self.cursor = anchor
            .and_then(|(hash, offset)| self.position_of(&hash).map(|i| i + offset))
            .unwrap_or(fallback);
        self.clamp_cursor();
        self.ensure_visible();
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    fn ensure_visible(&mut self) {
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + self.window_size {
            self.scroll = self.cursor + 1 - self.window_size;
        }
    }

    /// Moves the cursor one row towards older commits.
    pub fn cursor_down(&mut self) -> Result<(), HistoryError> {
        if self.cursor + 1 >= self.rows.len() {
            return Ok(());
        }
        self.cursor += 1;

        let result = if self.cursor >= self.window_size {
            // Graph-only rows can put the cursor past the window without
            // enough commits to justify moving it back.
            let target = (self.ordinal(self.cursor) + 1)
                .saturating_sub(self.window_size)
                .max(self.window_start);
            let shift = target.saturating_sub(self.window_start);
            let anchor = self.anchor_at(self.cursor);
            let fallback = self.cursor.saturating_sub(shift);
            self.move_window(target).map(|moved| {
                if moved {
                    self.restore_anchor(anchor, fallback);
                }
            })
        } else {
            Ok(())
        };
        self.ensure_visible();
        result
    }

    /// Moves the cursor one row towards newer commits.
    pub fn cursor_up(&mut self) -> Result<(), HistoryError> {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.ensure_visible();
            return Ok(());
        }
        if self.window_start == 0 {
            return Ok(());
        }

        let anchor = self.anchor_at(0);
        if self.move_window(self.window_start - 1)? {
            self.cursor = anchor
                .and_then(|(hash, _)| self.position_of(&hash))
                .map_or(0, |i| i.saturating_sub(1));
            self.clamp_cursor();
            self.ensure_visible();
        }
        Ok(())
    }

    /// Moves the cursor to the top of the visible window.
    pub fn window_top(&mut self) {
        self.cursor = self.visible_range().start;
    }

    /// Moves the cursor to the bottom of the visible window.
    pub fn window_bottom(&mut self) {
        self.cursor = self.visible_range().end.saturating_sub(1);
    }

    /// Reloads from the newest commit and puts the cursor on it.
    pub fn jump_to_newest(&mut self) -> Result<(), HistoryError> {
        self.load_at(0)?;
        self.cursor = 0;
        self.scroll = 0;
        Ok(())
    }

    /// Reloads the last window and puts the cursor on the oldest commit.
    pub fn jump_to_oldest(&mut self) -> Result<(), HistoryError> {
        self.load_at(self.max_window_start())?;
        self.cursor = self
            .rows
            .iter()
            .rposition(|r| !r.is_graph_only())
            .unwrap_or(self.rows.len().saturating_sub(1));
        self.ensure_visible();
        Ok(())
    }

    /// Moves the cursor to the next matching commit on the loaded page.
    ///
    /// With the global strategy a match beyond the current window recentres
    /// the window on it; with the windowed strategy the search never reloads.
    /// Returns whether a match was found.
    pub fn search(&mut self, kind: SearchKind, direction: Direction) -> Result<bool, HistoryError> {
        let matches = |row: &CommitRow| row.hash().is_some_and(|h| self.index.matches(kind, h));
        let found = match direction {
            Direction::Next => (self.cursor + 1..self.rows.len()).find(|&i| matches(&self.rows[i])),
            Direction::Previous => (0..self.cursor).rev().find(|&i| matches(&self.rows[i])),
        };
        let Some(found) = found else {
            return Ok(false);
        };

        self.cursor = found;
        let ordinal = self.ordinal(found);
        let in_window = ordinal < self.window_start + self.window_size;

        let result = if self.index.strategy() == IndexStrategy::Global && !in_window {
            let target = ordinal.saturating_sub(self.window_size / 2);
            let shift = target.saturating_sub(self.window_start);
            let anchor = self.anchor_at(found);
            self.move_window(target).map(|moved| {
                if moved {
                    self.restore_anchor(anchor, found.saturating_sub(shift));
                }
            })
        } else {
            Ok(())
        };
        self.ensure_visible();
        result.map(|()| true)
    }

    /// Replaces the filter and reloads from the newest commit.
    ///
    /// On failure the previous filter and page are kept.
    pub fn set_filter(&mut self, filter: HistoryFilter) -> Result<(), HistoryError> {
        let previous = std::mem::replace(&mut self.filter, filter);
        if let Err(e) = self.reset() {
            self.filter = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Recounts the history and reloads the first page.
    fn reset(&mut self) -> Result<(), HistoryError> {
        let total = self.source.total_count(&self.filter)?;
        let previous_total = std::mem::replace(&mut self.total_commits, total);
        if let Err(e) = self.load_at(0) {
            self.total_commits = previous_total;
            return Err(e);
        }
        self.cursor = 0;
        self.scroll = 0;
        Ok(())
    }
}

impl<S: CommitSource + BranchCheckout> Viewport<S> {
    /// Checks out the neighbouring local branch, then reloads from the newest
    /// commit.
    ///
    /// This mutates the working tree. Returns `None` when the current branch
    /// has no neighbour in `direction` or is not a local branch.
    pub fn switch_branch(
        &mut self,
        direction: Direction,
    ) -> Result<Option<BranchSwitch>, HistoryError> {
        let branches = self.source.branches(BranchScope::Local)?;
        let current = self.source.current_branch()?;
        let Some(position) = branches.iter().position(|b| *b == current) else {
            return Ok(None);
        };
        let target = match direction {
            Direction::Next => branches.get(position + 1),
            Direction::Previous => position.checked_sub(1).and_then(|i| branches.get(i)),
        };
        let Some(target) = target.cloned() else {
            return Ok(None);
        };

        let output = self.source.checkout(&target)?;
        info!("Checked out {target} (was {current})");
        self.reset()?;

        Ok(Some(BranchSwitch {
            from: current,
            to: target,
            output,
        }))
    }
}
