//! Interactive browsing session: the draw/read/dispatch loop and its popups.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::git::SHORT_HASH_LEN;
use crate::history::render::{self, Chrome};
use crate::history::terminal::Geometry;
use crate::history::{
    Action, BranchCheckout, BranchScope, CommitSource, Direction, Dispatcher, HistoryError,
    HistoryFilter, Key, KeySource, SearchKind, Since, Viewport,
};

const HELP: &str = "\
Navigation
  j / Down      next commit (older)
  k / Up        previous commit (newer)
  g / G         top / bottom of the window
  gg / GG       newest / oldest commit

Search (loaded commits)
  m / M         next / previous merge commit
  c / C         next / previous conflict resolution

Branches
  h / Left      check out the previous local branch
  l / Right     check out the next local branch
  b             list all branches

Other
  Enter         commit details
  f             edit filters
  ?             this help
  q / Ctrl-C    quit";

/// Result of reading a line of text from the operator.
enum Prompt {
    Entered(String),
    Cancelled,
    Closed,
}

/// One interactive browsing session.
pub struct Session<S, K, W> {
    viewport: Viewport<S>,
    keys: K,
    out: W,
    dispatcher: Dispatcher,
    branch: String,
    local_branches: Vec<String>,
    status: Option<String>,
    geometry: Option<Geometry>,
}

impl<S, K, W> Session<S, K, W>
where
    S: CommitSource + BranchCheckout,
    K: KeySource,
    W: Write,
{
    /// Creates a session over an opened viewport.
    pub fn new(viewport: Viewport<S>, keys: K, out: W) -> Self {
        Self {
            viewport,
            keys,
            out,
            dispatcher: Dispatcher::new(),
            branch: String::new(),
            local_branches: Vec::new(),
            status: None,
            geometry: None,
        }
    }

    /// Uses a fixed terminal size instead of querying the terminal.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Returns the viewport.
    pub fn viewport(&self) -> &Viewport<S> {
        &self.viewport
    }

    /// Returns the current status line, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Returns the output sink.
    pub fn output(&self) -> &W {
        &self.out
    }

    fn geometry(&self) -> Geometry {
        self.geometry.unwrap_or_else(Geometry::detect)
    }

    /// Runs until the operator quits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.refresh_branch();
            self.draw()?;

            let Some(key) = self.read_key() else {
                return Ok(());
            };
            let action = self.dispatcher.dispatch(key);
            if action == Action::Quit {
                return Ok(());
            }
            if action != Action::Ignore {
                self.status = None;
            }
            if !self.execute(action)? {
                return Ok(());
            }
        }
    }

    fn refresh_branch(&mut self) {
        self.branch = match self.viewport.source().current_branch() {
            Ok(branch) => branch,
            Err(e) => {
                debug!("Could not read the current branch: {e}");
                "unknown".to_string()
            }
        };
        self.local_branches = match self.viewport.source().branches(BranchScope::Local) {
            Ok(branches) => branches,
            Err(e) => {
                debug!("Could not list local branches: {e}");
                Vec::new()
            }
        };
    }

    fn draw(&mut self) -> io::Result<()> {
        let chrome = Chrome {
            branch: &self.branch,
            local_branches: &self.local_branches,
            status: self.status.as_deref(),
            geometry: self.geometry(),
        };
        render::draw_viewport(&mut self.out, &self.viewport, &chrome)
    }

    /// Reads the next decodable key; `None` once input has ended.
    fn read_key(&mut self) -> Option<Key> {
        loop {
            match self.keys.next_key() {
                Ok(Some(key)) => return Some(key),
                Ok(None) => continue,
                Err(e) => {
                    debug!("Keyboard input ended: {e}");
                    return None;
                }
            }
        }
    }

    fn report(&mut self, error: &HistoryError) {
        warn!("{error}");
        self.status = Some(format!("Error: {error}"));
    }

    /// Executes one action. Returns `false` when the session should end.
    fn execute(&mut self, action: Action) -> io::Result<bool> {
        let result = match action {
            Action::CursorUp => self.viewport.cursor_up(),
            Action::CursorDown => self.viewport.cursor_down(),
            Action::WindowTop => {
                self.viewport.window_top();
                Ok(())
            }
            Action::WindowBottom => {
                self.viewport.window_bottom();
                Ok(())
            }
            Action::HistoryTop => self.viewport.jump_to_newest(),
            Action::HistoryBottom => self.viewport.jump_to_oldest(),
            Action::Search(kind, direction) => self.search(kind, direction),
            Action::SwitchBranch(direction) => self.switch_branch(direction),
            Action::ShowDetails => return self.show_details(),
            Action::BranchList => return self.show_branches(),
            Action::EditFilter => return self.edit_filter(),
            Action::Help => return self.show_help(),
            Action::Quit => return Ok(false),
            Action::Ignore => Ok(()),
        };
        if let Err(e) = result {
            self.report(&e);
        }
        Ok(true)
    }

    fn search(&mut self, kind: SearchKind, direction: Direction) -> Result<(), HistoryError> {
        if !self.viewport.search(kind, direction)? {
            let what = match kind {
                SearchKind::Merge => "merge commits",
                SearchKind::Conflict => "conflict resolutions",
            };
            let side = match direction {
                Direction::Next => "below",
                Direction::Previous => "above",
            };
            self.status = Some(format!("No {what} {side} the cursor on this page"));
        }
        Ok(())
    }

    fn switch_branch(&mut self, direction: Direction) -> Result<(), HistoryError> {
        self.status = Some(match self.viewport.switch_branch(direction)? {
            Some(switch) => {
                let detail = switch.output.lines().next().unwrap_or_default();
                format!("Switched from {} to {}: {detail}", switch.from, switch.to)
            }
            None => "No local branch in that direction".to_string(),
        });
        Ok(())
    }

    /// Commit details for the row under the cursor; `j`/`k` step through the
    /// loaded commits.
    fn show_details(&mut self) -> io::Result<bool> {
        let commit_rows: Vec<usize> = (0..self.viewport.rows().len())
            .filter(|&i| !self.viewport.rows()[i].is_graph_only())
            .collect();
        let Some(mut position) = commit_rows
            .iter()
            .position(|&i| i >= self.viewport.cursor())
        else {
            self.status = Some("No commit under the cursor".to_string());
            return Ok(true);
        };

        loop {
            let Some(hash) = self.viewport.rows()[commit_rows[position]]
                .hash()
                .map(str::to_string)
            else {
                return Ok(true);
            };
            let body = match self.viewport.source().commit_details(&hash) {
                Ok(body) => body,
                Err(e) => {
                    self.report(&e);
                    return Ok(true);
                }
            };
            let short = &hash[..hash.len().min(SHORT_HASH_LEN)];
            let title = format!("Commit {short}");
            let mut scroll = 0;

            loop {
                let geometry = self.geometry();
                render::draw_text(
                    &mut self.out,
                    &title,
                    &body,
                    scroll,
                    "j/k next/previous commit  space/backspace scroll  q back",
                    geometry,
                )?;
                match self.read_key() {
                    None | Some(Key::Interrupt) => return Ok(false),
                    Some(Key::Char('q') | Key::Enter) => return Ok(true),
                    Some(Key::Char('j') | Key::Down) if position + 1 < commit_rows.len() => {
                        position += 1;
                        break;
                    }
                    Some(Key::Char('k') | Key::Up) if position > 0 => {
                        position -= 1;
                        break;
                    }
                    Some(Key::Char(' ')) => {
                        let page = usize::from(geometry.height).saturating_sub(3).max(1);
                        if scroll + page < body.lines().count() {
                            scroll += page;
                        }
                    }
                    Some(Key::Backspace) => {
                        let page = usize::from(geometry.height).saturating_sub(3).max(1);
                        scroll = scroll.saturating_sub(page);
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn show_branches(&mut self) -> io::Result<bool> {
        let branches = match self.viewport.source().branches(BranchScope::All) {
            Ok(branches) => branches,
            Err(e) => {
                self.report(&e);
                return Ok(true);
            }
        };
        let matcher = match self.viewport.filter().branch_matcher() {
            Ok(matcher) => matcher,
            Err(e) => {
                self.status = Some(format!("Invalid branch pattern: {e}"));
                return Ok(true);
            }
        };

        let mut body = String::new();
        for branch in branches
            .iter()
            .filter(|b| matcher.as_ref().map_or(true, |m| m.is_match(b.as_str())))
        {
            let marker = if *branch == self.branch { "* " } else { "  " };
            body.push_str(marker);
            body.push_str(branch);
            body.push('\n');
        }
        if body.is_empty() {
            body.push_str("(no matching branches)");
        }

        let title = match &self.viewport.filter().branch_pattern {
            Some(pattern) => format!("Branches matching {pattern}"),
            None => "Branches".to_string(),
        };
        let geometry = self.geometry();
        render::draw_text(&mut self.out, &title, &body, 0, "Press Enter to return", geometry)?;
        loop {
            match self.read_key() {
                None | Some(Key::Interrupt) => return Ok(false),
                Some(Key::Enter) => return Ok(true),
                Some(_) => {}
            }
        }
    }

    fn show_help(&mut self) -> io::Result<bool> {
        let geometry = self.geometry();
        render::draw_text(&mut self.out, "Keys", HELP, 0, "Press any key to return", geometry)?;
        Ok(!matches!(self.read_key(), None | Some(Key::Interrupt)))
    }

    fn filter_menu(filter: &HistoryFilter) -> String {
        let show = |value: Option<String>| value.unwrap_or_else(|| "(none)".to_string());
        format!(
            "1. Branch pattern: {}\n2. Author: {}\n3. Since: {}\n4. Reset filters\nq. Back\n",
            show(filter.branch_pattern.clone()),
            show(filter.author.clone()),
            show(filter.since.map(|s| s.to_string())),
        )
    }

    fn edit_filter(&mut self) -> io::Result<bool> {
        loop {
            let mut filter = self.viewport.filter().clone();
            let geometry = self.geometry();
            let mut body = Self::filter_menu(&filter);
            if let Some(status) = &self.status {
                body.push('\n');
                body.push_str(status);
            }
            render::draw_text(&mut self.out, "Filters", &body, 0, "Choose 1-4, q to return", geometry)?;

            let field = match self.read_key() {
                None | Some(Key::Interrupt) => return Ok(false),
                Some(Key::Char('q') | Key::Enter) => return Ok(true),
                Some(Key::Char(c @ '1'..='3')) => c,
                Some(Key::Char('4')) => {
                    filter = HistoryFilter::default();
                    '4'
                }
                Some(_) => continue,
            };

            if field != '4' {
                let (label, current) = match field {
                    '1' => ("Branch pattern", filter.branch_pattern.clone()),
                    '2' => ("Author", filter.author.clone()),
                    _ => ("Since (N.hours, N.days or N.weeks)", filter.since.map(|s| s.to_string())),
                };
                let value = match self.prompt_line(label, current.unwrap_or_default())? {
                    Prompt::Entered(value) => value.trim().to_string(),
                    Prompt::Cancelled => continue,
                    Prompt::Closed => return Ok(false),
                };
                let value = (!value.is_empty()).then_some(value);
                match field {
                    '1' => filter.branch_pattern = value,
                    '2' => filter.author = value,
                    _ => match value.as_deref().map(str::parse::<Since>).transpose() {
                        Ok(since) => filter.since = since,
                        Err(e) => {
                            self.status = Some(e.to_string());
                            continue;
                        }
                    },
                }
            }

            if let Err(e) = filter.branch_matcher() {
                self.status = Some(format!("Invalid branch pattern: {e}"));
                continue;
            }
            if filter == *self.viewport.filter() {
                continue;
            }
            self.status = None;
            if let Err(e) = self.viewport.set_filter(filter) {
                self.report(&e);
            }
        }
    }

    fn prompt_line(&mut self, label: &str, initial: String) -> io::Result<Prompt> {
        let mut buffer = initial;
        loop {
            let geometry = self.geometry();
            render::draw_text(
                &mut self.out,
                "Filters",
                &format!("{label}: {buffer}"),
                0,
                "Enter to apply, Ctrl-C to cancel",
                geometry,
            )?;
            match self.read_key() {
                None => return Ok(Prompt::Closed),
                Some(Key::Interrupt) => return Ok(Prompt::Cancelled),
                Some(Key::Enter) => return Ok(Prompt::Entered(buffer)),
                Some(Key::Backspace) => {
                    buffer.pop();
                }
                Some(Key::Char(c)) => buffer.push(c),
                Some(_) => {}
            }
        }
    }
}
