//! Parsing of `git log --graph` output lines into structured rows.
//!
//! Each line of the paginated log query looks like
//! `<graph> <hash> -<refs> <subject> (<author date>) <<committer>>`, or is pure
//! graph scaffolding (`|\`, `| |`, ...) with no commit attached. Extraction is
//! order-dependent: refs, then committer, then date, then message, each step
//! removing the text it consumed.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Ligature-collapsing substitutions applied to the raw graph prefix, in order.
///
/// Later entries assume earlier ones already collapsed overlapping patterns.
pub const GRAPH_LIGATURES: &[(&str, &str)] = &[
    ("|\\ ", "|\\"),
    ("|/ ", "|/"),
    ("/\\ ", "/\\"),
    ("\\| ", "\\|"),
    ("/| ", "/|"),
    ("|\\| ", "|\\"),
    ("|/| ", "|/"),
    ("\\| ", "\\|"),
    (" | ", "|"),
    ("\\/|", "\\|"),
    ("/\\|", "/|"),
    ("|/\\", "|/"),
    ("\\|/", "\\|"),
    ("/|\\", "/|"),
];

/// Delimiter between the graph/hash part and the rest of a commit line.
const COMMIT_DELIMITER: &str = " - ";

/// Ref prefix marking a tag.
const TAG_PREFIX: &str = "tag: ";

/// One commit in the rendered graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitNode {
    /// Abbreviated commit hash.
    pub hash: String,
    /// Commit subject.
    pub message: String,
    /// Committer name.
    pub committer: String,
    /// Author date, if it parsed as RFC 3339.
    pub date: Option<DateTime<FixedOffset>>,
    /// Branch names pointing at this commit, in ref order.
    pub branches: Vec<String>,
    /// Tag names pointing at this commit.
    pub tags: Vec<String>,
    /// Whether HEAD points at this commit.
    pub is_head: bool,
    /// Branch HEAD is attached to, when it is not detached.
    pub head_branch: Option<String>,
    /// Back-filled by the commit index.
    pub is_merge: bool,
    /// Back-filled by the commit index.
    pub is_conflict_resolved: bool,
    /// Normalized graph glyphs drawn before the commit.
    pub graph: String,
}

/// One row of the rendered graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommitRow {
    /// Branch-graph scaffolding with no commit.
    GraphOnly {
        /// Normalized graph glyphs.
        graph: String,
    },
    /// A commit line.
    Commit(CommitNode),
}

impl CommitRow {
    /// Returns the normalized graph glyphs of this row.
    pub fn graph(&self) -> &str {
        match self {
            Self::GraphOnly { graph } => graph,
            Self::Commit(node) => &node.graph,
        }
    }

    /// Returns the commit hash, or `None` for graph-only rows.
    pub fn hash(&self) -> Option<&str> {
        self.commit().map(|node| node.hash.as_str())
    }

    /// Returns the commit carried by this row.
    pub fn commit(&self) -> Option<&CommitNode> {
        match self {
            Self::GraphOnly { .. } => None,
            Self::Commit(node) => Some(node),
        }
    }

    /// Mutable access to the commit carried by this row.
    pub fn commit_mut(&mut self) -> Option<&mut CommitNode> {
        match self {
            Self::GraphOnly { .. } => None,
            Self::Commit(node) => Some(node),
        }
    }

    /// Whether this row carries no commit.
    pub fn is_graph_only(&self) -> bool {
        matches!(self, Self::GraphOnly { .. })
    }
}

/// Applies the ligature table to a raw graph prefix and trims trailing spaces.
pub fn normalize_graph(raw: &str) -> String {
    let mut graph = raw.to_string();
    for (pattern, replacement) in GRAPH_LIGATURES {
        graph = graph.replace(pattern, replacement);
    }
    graph.trim_end_matches(' ').to_string()
}

/// Parses every non-empty line of a log query's output.
pub fn parse_lines<'a, I>(lines: I) -> Vec<CommitRow>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

/// Parses one line of `git log --graph` output.
pub fn parse_line(line: &str) -> CommitRow {
    let Some(graph_end) = line.find(' ') else {
        return CommitRow::GraphOnly {
            graph: normalize_graph(line),
        };
    };

    let remainder = &line[graph_end..];
    if !remainder.contains(COMMIT_DELIMITER) {
        return CommitRow::GraphOnly {
            graph: normalize_graph(&line[..graph_end]),
        };
    }

    // `remainder` contains " - ", so " -" is always found.
    let delimiter = remainder.find(" -").unwrap_or(0);
    let head = &remainder[..delimiter];
    let rest = &remainder[delimiter + 2..];

    // Multi-column graphs put more glyphs before the hash: only the last
    // token is the hash, everything before it is graph.
    let head_trimmed = head.trim_end();
    let hash_start = head_trimmed
        .char_indices()
        .rfind(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let hash = head_trimmed[hash_start..].to_string();
    let raw_graph = &line[..graph_end + hash_start];

    let mut node = CommitNode {
        hash,
        graph: normalize_graph(raw_graph),
        ..CommitNode::default()
    };

    let rest = extract_refs(rest, &mut node);
    let rest = extract_committer(rest, &mut node);
    let rest = extract_date(rest, &mut node);
    node.message = rest.trim().to_string();

    CommitRow::Commit(node)
}

/// Consumes a leading `(ref, ref, ...)` list.
fn extract_refs<'a>(rest: &'a str, node: &mut CommitNode) -> &'a str {
    let trimmed = rest.trim_start();
    if !trimmed.starts_with('(') {
        return rest;
    }

    let mut depth = 0usize;
    let mut close = None;
    for (i, c) in trimmed.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(close) = close else {
        return rest;
    };

    for reference in trimmed[1..close].split(", ") {
        let reference = reference.trim();
        if reference.is_empty() {
            continue;
        }
        if let Some(head) = reference.strip_prefix("HEAD") {
            node.is_head = true;
            if let Some(branch) = head.trim_start().strip_prefix("->") {
                let branch = branch.trim();
                if !branch.is_empty() {
                    node.head_branch = Some(branch.to_string());
                    node.branches.push(branch.to_string());
                }
            }
        } else if let Some(tag) = reference.strip_prefix(TAG_PREFIX) {
            node.tags.push(tag.to_string());
        } else {
            node.branches.push(reference.to_string());
        }
    }

    &trimmed[close + 1..]
}

/// Consumes the trailing `<committer>`.
fn extract_committer<'a>(rest: &'a str, node: &mut CommitNode) -> &'a str {
    match (rest.rfind('<'), rest.rfind('>')) {
        (Some(start), Some(end)) if end > start => {
            node.committer = rest[start + 1..end].to_string();
            rest[..start].trim_end()
        }
        _ => rest,
    }
}

/// Consumes the trailing `(date)`.
fn extract_date<'a>(rest: &'a str, node: &mut CommitNode) -> &'a str {
    match (rest.rfind('('), rest.rfind(')')) {
        (Some(start), Some(end)) if end > start => {
            node.date = DateTime::parse_from_rfc3339(rest[start + 1..end].trim()).ok();
            rest[..start].trim_end()
        }
        _ => rest,
    }
}
