//! Frame rendering for the history browser.
//!
//! Everything is written through crossterm commands to any [`Write`], so a
//! frame can be captured in a buffer as easily as drawn on a terminal. The
//! terminal is in raw mode, hence every line ends in `\r\n`.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, PrintStyledContent, Stylize},
    terminal::{Clear, ClearType},
};

use crate::history::{CommitNode, CommitRow, CommitSource, HistoryFilter, Viewport};
use crate::history::terminal::Geometry;

const CURSOR_MARKER: &str = "→ ";
const NO_MARKER: &str = "  ";
const LEGEND: &str =
    "j/k move  g/G window  gg/GG ends  m/M merge  c/C conflict  h/l branch  Enter details  b branches  f filter  ? help  q quit";

/// Text of one screen line, as coloured segments.
#[derive(Debug, Default)]
struct Line {
    segments: Vec<(String, Option<Color>)>,
}

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        let mut line = Self::default();
        line.push(text, None);
        line
    }

    fn push(&mut self, text: impl Into<String>, color: Option<Color>) {
        self.segments.push((text.into(), color));
    }

    fn colored(&mut self, text: impl Into<String>, color: Color) {
        self.push(text, Some(color));
    }

    /// Writes the line clipped to `width` columns.
    fn write<W: Write>(&self, out: &mut W, width: usize) -> io::Result<()> {
        let mut remaining = width;
        for (text, color) in &self.segments {
            if remaining == 0 {
                break;
            }
            let clipped: String = text.chars().take(remaining).collect();
            remaining -= clipped.chars().count();
            match color {
                Some(color) => queue!(out, PrintStyledContent(clipped.with(*color)))?,
                None => queue!(out, Print(clipped))?,
            }
        }
        queue!(out, Clear(ClearType::UntilNewLine), Print("\r\n"))
    }
}

/// Session-level text drawn around the viewport.
#[derive(Debug, Clone, Copy)]
pub struct Chrome<'a> {
    /// Checked-out branch.
    pub branch: &'a str,
    /// Local branches in `h`/`l` order.
    pub local_branches: &'a [String],
    /// Inline status or error message.
    pub status: Option<&'a str>,
    /// Terminal size.
    pub geometry: Geometry,
}

fn graph_segments(line: &mut Line, graph: &str) {
    for c in graph.chars() {
        match c {
            '*' => line.colored(c.to_string(), Color::Yellow),
            '|' | '/' | '\\' => line.colored(c.to_string(), Color::Blue),
            _ => line.push(c.to_string(), None),
        }
    }
}

fn ref_segments(line: &mut Line, node: &CommitNode) {
    if !node.is_head && node.branches.is_empty() && node.tags.is_empty() {
        return;
    }

    line.push(" (", None);
    let mut first = true;
    let mut head_target = node.head_branch.as_deref();
    if node.is_head {
        line.colored("HEAD", Color::Green);
        if let Some(branch) = head_target {
            line.colored(" -> ", Color::Green);
            line.colored(branch, Color::Blue);
        }
        first = false;
    }
    for branch in &node.branches {
        // The attached branch was already drawn after the arrow.
        if head_target == Some(branch.as_str()) {
            head_target = None;
            continue;
        }
        if !first {
            line.push(", ", None);
        }
        line.colored(branch.clone(), Color::Blue);
        first = false;
    }
    for tag in &node.tags {
        if !first {
            line.push(", ", None);
        }
        line.colored(format!("tag: {tag}"), Color::Yellow);
        first = false;
    }
    line.push(")", None);
}

/// Builds the screen line for one row.
fn row_line(row: &CommitRow, selected: bool) -> Line {
    let mut line = Line::default();
    if selected {
        line.colored(CURSOR_MARKER, Color::Cyan);
    } else {
        line.push(NO_MARKER, None);
    }
    graph_segments(&mut line, row.graph());

    let Some(node) = row.commit() else {
        return line;
    };
    line.push(" ", None);
    line.colored(node.hash.clone(), Color::DarkYellow);
    ref_segments(&mut line, node);
    line.push(format!(" {}", node.message), None);
    if node.is_merge {
        line.colored(" [merge]", Color::Magenta);
    }
    if node.is_conflict_resolved {
        line.colored(" [resolved]", Color::Red);
    }

    let mut meta = String::new();
    if !node.committer.is_empty() {
        meta.push_str(&format!(" <{}>", node.committer));
    }
    if let Some(date) = node.date {
        meta.push_str(&format!(" {}", date.format("%Y-%m-%d %H:%M")));
    }
    if !meta.is_empty() {
        line.colored(meta, Color::DarkGrey);
    }
    line
}

/// One-line summary of an active filter.
pub fn describe_filter(filter: &HistoryFilter) -> String {
    if filter.is_empty() {
        return "none".to_string();
    }
    let mut parts = Vec::new();
    if let Some(pattern) = filter.branch_pattern.as_deref().filter(|p| !p.is_empty()) {
        parts.push(format!("branches={pattern}"));
    }
    if let Some(author) = filter.author.as_deref().filter(|a| !a.is_empty()) {
        parts.push(format!("author={author}"));
    }
    if let Some(since) = &filter.since {
        parts.push(format!("since={since}"));
    }
    parts.join(" ")
}

/// Draws a full browser frame.
pub fn draw_viewport<S: CommitSource, W: Write>(
    out: &mut W,
    viewport: &Viewport<S>,
    chrome: &Chrome<'_>,
) -> io::Result<()> {
    let width = usize::from(chrome.geometry.width);
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;

    let mut header = Line::default();
    header.colored(format!("=== Git History ({}) ===", chrome.branch), Color::Cyan);
    header.write(out, width)?;

    let visible = viewport.visible_range();
    let shown = viewport.rows()[..visible.end]
        .iter()
        .filter(|row| !row.is_graph_only())
        .count();
    let range = if viewport.total_commits() == 0 || shown == 0 {
        format!("commits 0 / {}", viewport.total_commits())
    } else {
        let first_visible = viewport.rows()[..visible.start]
            .iter()
            .filter(|row| !row.is_graph_only())
            .count();
        format!(
            "commits {}-{} / {}  filter: {}",
            viewport.window_start() + first_visible + 1,
            viewport.window_start() + shown,
            viewport.total_commits(),
            describe_filter(viewport.filter())
        )
    };
    Line::plain(range).write(out, width)?;

    let mut legend = Line::default();
    legend.colored(LEGEND, Color::DarkGrey);
    legend.write(out, width)?;
    Line::default().write(out, width)?;

    for (offset, row) in viewport.visible_rows().iter().enumerate() {
        let selected = visible.start + offset == viewport.cursor();
        row_line(row, selected).write(out, width)?;
    }
    for _ in viewport.visible_rows().len()..viewport.window_size() {
        Line::default().write(out, width)?;
    }

    if !chrome.local_branches.is_empty() {
        Line::default().write(out, width)?;
        let mut title = Line::default();
        title.colored("=== Branches ===", Color::Cyan);
        title.write(out, width)?;
        for branch in chrome.local_branches {
            let mut line = Line::default();
            if branch == chrome.branch {
                line.colored(format!("{CURSOR_MARKER}{branch}"), Color::Blue);
            } else {
                line.push(format!("{NO_MARKER}{branch}"), None);
            }
            line.write(out, width)?;
        }
    }

    let mut status = Line::default();
    if let Some(message) = chrome.status {
        status.colored(message, Color::Yellow);
    }
    status.write(out, width)?;

    let position = if viewport.rows().is_empty() {
        "(0/0)".to_string()
    } else {
        format!("({}/{})", viewport.cursor() + 1, viewport.rows().len())
    };
    Line::plain(position).write(out, width)?;

    out.flush()
}

/// Draws a titled block of text, starting at `scroll`, for popups.
pub fn draw_text<W: Write>(
    out: &mut W,
    title: &str,
    body: &str,
    scroll: usize,
    footer: &str,
    geometry: Geometry,
) -> io::Result<()> {
    let width = usize::from(geometry.width);
    // Title, blank separator, footer.
    let room = usize::from(geometry.height).saturating_sub(3).max(1);
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;

    let mut header = Line::default();
    header.colored(title, Color::Cyan);
    header.write(out, width)?;
    Line::default().write(out, width)?;

    for text in body.lines().skip(scroll).take(room) {
        let mut line = Line::default();
        let color = if text.starts_with('+') && !text.starts_with("+++") {
            Some(Color::Green)
        } else if text.starts_with('-') && !text.starts_with("---") {
            Some(Color::Red)
        } else if text.starts_with("@@") {
            Some(Color::Cyan)
        } else {
            None
        };
        line.push(text.replace('\t', "    "), color);
        line.write(out, width)?;
    }

    let mut footer_line = Line::default();
    footer_line.colored(footer, Color::DarkGrey);
    footer_line.write(out, width)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::graph::parse_line;
    use crate::history::test_utils::{FakeCommit, FakeRepository};
    use crate::history::{IndexStrategy, ViewportOptions};

    fn text_of(line: &Line) -> String {
        line.segments.iter().map(|(t, _)| t.as_str()).collect()
    }

    fn render(line: &Line, width: usize) -> String {
        let mut out = Vec::new();
        line.write(&mut out, width).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn row_line_shows_refs_and_markers() {
        let mut row = parse_line("* abc1234 - (HEAD -> main, origin/main, tag: v1.0) Merge it (2024-01-04T12:00:00Z) <Jane>");
        if let Some(node) = row.commit_mut() {
            node.is_merge = true;
            node.is_conflict_resolved = true;
        }

        let text = text_of(&row_line(&row, true));

        assert_eq!(
            text,
            "→ * abc1234 (HEAD -> main, origin/main, tag: v1.0) Merge it [merge] [resolved] <Jane> 2024-01-04 12:00"
        );
    }

    #[test]
    fn detached_head_has_no_arrow() {
        let row = parse_line("* abc1234 - (HEAD, origin/main) Detached");
        assert_eq!(
            text_of(&row_line(&row, false)),
            "  * abc1234 (HEAD, origin/main) Detached"
        );
    }

    #[test]
    fn graph_only_row_has_no_commit_text() {
        let row = parse_line("|\\");
        assert_eq!(text_of(&row_line(&row, false)), "  |\\");
    }

    #[test]
    fn lines_are_clipped_and_end_with_crlf() {
        let line = Line::plain("abcdefghij");
        let rendered = render(&line, 4);
        assert!(rendered.contains("abcd"));
        assert!(!rendered.contains("abcde"));
        assert!(rendered.ends_with("\r\n"));
    }

    #[test]
    fn clipping_counts_characters_not_bytes() {
        let line = Line::plain("→→→→");
        assert!(render(&line, 2).contains("→→"));
        assert!(!render(&line, 2).contains("→→→"));
    }

    #[test]
    fn filter_summary() {
        assert_eq!(describe_filter(&HistoryFilter::default()), "none");
        let blank = HistoryFilter {
            author: Some(String::new()),
            branch_pattern: Some(String::new()),
            ..HistoryFilter::default()
        };
        assert_eq!(describe_filter(&blank), "none");
        let filter = HistoryFilter {
            author: Some("Jane".to_string()),
            since: Some("2.days".parse().unwrap()),
            ..HistoryFilter::default()
        };
        assert_eq!(describe_filter(&filter), "author=Jane since=2.days");
    }

    #[test]
    fn frame_has_header_range_and_position() {
        let repo = FakeRepository::linear(vec![
            FakeCommit::new("aaaa1111", "first").with_refs("HEAD -> main"),
            FakeCommit::new("bbbb2222", "second"),
            FakeCommit::new("cccc3333", "third"),
        ]);
        let viewport = Viewport::open(
            repo,
            ViewportOptions {
                window_size: 2,
                strategy: IndexStrategy::Global,
                ..ViewportOptions::default()
            },
        )
        .unwrap();
        let branches = vec!["feature".to_string(), "main".to_string()];
        let chrome = Chrome {
            branch: "main",
            local_branches: &branches,
            status: Some("Checked out main"),
            geometry: Geometry::default(),
        };

        let mut out = Vec::new();
        draw_viewport(&mut out, &viewport, &chrome).unwrap();
        let frame = String::from_utf8(out).unwrap();

        assert!(frame.contains("=== Git History (main) ==="));
        assert!(frame.contains("commits 1-2 / 3"));
        assert!(frame.contains("aaaa111"));
        assert!(frame.contains("bbbb222"));
        assert!(!frame.contains("cccc333"));
        assert!(frame.contains("Checked out main"));
        assert!(frame.contains("(1/3)"));

        assert!(frame.contains("=== Branches ==="));
        assert!(frame.contains("→ main"));
        assert!(frame.contains("  feature"));
        assert!(!frame.contains("→ feature"));
        let branch_list = frame.find("=== Branches ===").unwrap();
        assert!(branch_list > frame.find("bbbb222").unwrap());
        assert!(branch_list < frame.find("(1/3)").unwrap());
    }

    #[test]
    fn popup_text_scrolls() {
        let body = "line 1\nline 2\n+added\n-removed\n";
        let mut out = Vec::new();
        draw_text(&mut out, "Details", body, 1, "q to close", Geometry::default()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Details"));
        assert!(!text.contains("line 1"));
        assert!(text.contains("line 2"));
        assert!(text.contains("added"));
        assert!(text.contains("q to close"));
    }
}
