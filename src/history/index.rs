//! Merge and conflict-resolution membership for loaded commits.

use std::collections::BTreeSet;
use std::ops::Bound;

use serde::Serialize;
use tracing::{debug, warn};

use crate::git::query::CONFLICT_KEYWORDS;
use crate::history::{CommitRow, CommitSource};

/// How merge/conflict membership is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStrategy {
    /// Two queries per loaded commit, repeated on every page load.
    #[default]
    Windowed,
    /// Two whole-history queries, issued once per session.
    Global,
}

/// Which index set a search consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Commits with two or more parents.
    Merge,
    /// Commits whose message mentions a conflict keyword.
    Conflict,
}

/// Merge and conflict hash sets.
#[derive(Debug, Clone, Default)]
pub struct CommitIndex {
    strategy: IndexStrategy,
    merges: BTreeSet<String>,
    conflicts: BTreeSet<String>,
    global_built: bool,
}

/// Whether `set` holds `hash` or a full hash it abbreviates.
fn contains_prefix(set: &BTreeSet<String>, hash: &str) -> bool {
    if hash.is_empty() {
        return false;
    }
    set.range::<str, _>((Bound::Included(hash), Bound::Unbounded))
        .next()
        .is_some_and(|candidate| candidate.starts_with(hash))
}

/// Whether a commit message marks a conflict resolution.
pub fn mentions_conflict(message: &str) -> bool {
    let lower = message.to_lowercase();
    CONFLICT_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

impl CommitIndex {
    /// Creates an empty index using `strategy`.
    pub fn new(strategy: IndexStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Returns the strategy chosen for this session.
    pub fn strategy(&self) -> IndexStrategy {
        self.strategy
    }

    /// Recomputes membership for a freshly loaded page.
    ///
    /// The windowed strategy rescans `rows`; the global strategy only queries
    /// on its first call and reuses the sets afterwards.
    pub fn refresh<S: CommitSource + ?Sized>(&mut self, source: &S, rows: &[CommitRow]) {
        match self.strategy {
            IndexStrategy::Windowed => self.scan_window(source, rows),
            IndexStrategy::Global => {
                if !self.global_built {
                    self.scan_history(source);
                }
            }
        }
    }

    fn scan_window<S: CommitSource + ?Sized>(&mut self, source: &S, rows: &[CommitRow]) {
        self.merges.clear();
        self.conflicts.clear();

        for hash in rows.iter().filter_map(CommitRow::hash) {
            if hash.is_empty() {
                continue;
            }

            match source.parents(hash) {
                // The first entry is the commit itself.
                Ok(parents) if parents.len() > 2 => {
                    self.merges.insert(hash.to_string());
                }
                Ok(_) => {}
                Err(e) => debug!("Skipping merge check for {hash}: {e}"),
            }

            match source.message_body(hash) {
                Ok(body) if mentions_conflict(&body) => {
                    self.conflicts.insert(hash.to_string());
                }
                Ok(_) => {}
                Err(e) => debug!("Skipping conflict check for {hash}: {e}"),
            }
        }
    }

    fn scan_history<S: CommitSource + ?Sized>(&mut self, source: &S) {
        self.merges = match source.merge_hashes() {
            Ok(hashes) => hashes.into_iter().collect(),
            Err(e) => {
                warn!("Failed to list merge commits: {e}");
                BTreeSet::new()
            }
        };
        self.conflicts = match source.conflict_hashes() {
            Ok(hashes) => hashes.into_iter().collect(),
            Err(e) => {
                warn!("Failed to list conflict-resolution commits: {e}");
                BTreeSet::new()
            }
        };
        self.global_built = true;
        debug!(
            merges = self.merges.len(),
            conflicts = self.conflicts.len(),
            "Built global commit index"
        );
    }

    /// Back-fills `is_merge`/`is_conflict_resolved` on every commit row.
    pub fn apply(&self, rows: &mut [CommitRow]) {
        for node in rows.iter_mut().filter_map(CommitRow::commit_mut) {
            node.is_merge = self.is_merge(&node.hash);
            node.is_conflict_resolved = self.is_conflict_resolved(&node.hash);
        }
    }

    /// Whether `hash` is a known merge commit.
    pub fn is_merge(&self, hash: &str) -> bool {
        contains_prefix(&self.merges, hash)
    }

    /// Whether `hash` is a known conflict-resolution commit.
    pub fn is_conflict_resolved(&self, hash: &str) -> bool {
        contains_prefix(&self.conflicts, hash)
    }

    /// Whether `hash` belongs to the set `kind` selects.
    pub fn matches(&self, kind: SearchKind, hash: &str) -> bool {
        match kind {
            SearchKind::Merge => self.is_merge(hash),
            SearchKind::Conflict => self.is_conflict_resolved(hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::graph::parse_lines;
    use crate::history::test_utils::{FakeCommit, FakeRepository};

    fn repo() -> FakeRepository {
        FakeRepository::linear(vec![
            FakeCommit::new("aaaa1111", "Add feature"),
            FakeCommit::new("bbbb2222", "Merge branch 'x'").with_parents(2),
            FakeCommit::new("cccc3333", "Resolve CONFLICT in parser"),
            FakeCommit::new("dddd4444", "Initial commit"),
        ])
    }

    #[test]
    fn conflict_keywords_are_case_insensitive() {
        assert!(mentions_conflict("Fix typo"));
        assert!(mentions_conflict("RESOLVED merge"));
        assert!(mentions_conflict("conflict markers"));
        assert!(!mentions_conflict("Add feature"));
    }

    #[test]
    fn prefix_lookup_matches_abbreviated_hashes() {
        let set: BTreeSet<String> = ["abcdef0123".to_string(), "abd0000000".to_string()]
            .into_iter()
            .collect();
        assert!(contains_prefix(&set, "abcdef"));
        assert!(contains_prefix(&set, "abd"));
        assert!(!contains_prefix(&set, "abce"));
        assert!(!contains_prefix(&set, ""));
    }

    #[test]
    fn windowed_scan_queries_each_commit() {
        let repo = repo();
        let rows = parse_lines(repo.page_lines(0, 4).iter().map(String::as_str));
        let mut index = CommitIndex::new(IndexStrategy::Windowed);

        index.refresh(&repo, &rows);

        assert!(index.is_merge("bbbb222"));
        assert!(!index.is_merge("aaaa111"));
        assert!(index.is_conflict_resolved("cccc333"));
        assert!(!index.is_conflict_resolved("dddd444"));
        let calls = repo.calls();
        assert_eq!(calls.count("parents"), 4);
        assert_eq!(calls.count("message_body"), 4);
        assert_eq!(calls.count("merge_hashes"), 0);
    }

    #[test]
    fn windowed_scan_is_scoped_to_the_page() {
        let repo = repo();
        let rows = parse_lines(repo.page_lines(2, 2).iter().map(String::as_str));
        let mut index = CommitIndex::new(IndexStrategy::Windowed);

        index.refresh(&repo, &rows);

        assert!(!index.is_merge("bbbb222"));
        assert!(index.is_conflict_resolved("cccc333"));
    }

    #[test]
    fn global_scan_runs_once() {
        let repo = repo();
        let first = parse_lines(repo.page_lines(0, 2).iter().map(String::as_str));
        let second = parse_lines(repo.page_lines(2, 2).iter().map(String::as_str));
        let mut index = CommitIndex::new(IndexStrategy::Global);

        index.refresh(&repo, &first);
        index.refresh(&repo, &second);

        assert!(index.is_merge("bbbb222"));
        assert!(index.is_conflict_resolved("cccc333"));
        let calls = repo.calls();
        assert_eq!(calls.count("merge_hashes"), 1);
        assert_eq!(calls.count("conflict_hashes"), 1);
        assert_eq!(calls.count("parents"), 0);
    }

    #[test]
    fn strategies_agree_on_shared_commits() {
        let repo = repo();
        let rows = parse_lines(repo.page_lines(0, 4).iter().map(String::as_str));
        let mut windowed = CommitIndex::new(IndexStrategy::Windowed);
        let mut global = CommitIndex::new(IndexStrategy::Global);

        windowed.refresh(&repo, &rows);
        global.refresh(&repo, &rows);

        for hash in rows.iter().filter_map(CommitRow::hash) {
            assert_eq!(windowed.is_merge(hash), global.is_merge(hash), "{hash}");
            assert_eq!(
                windowed.is_conflict_resolved(hash),
                global.is_conflict_resolved(hash),
                "{hash}"
            );
        }
    }

    #[test]
    fn failed_queries_leave_commits_unmarked() {
        let repo = repo();
        repo.fail_queries(true);
        let rows = parse_lines(["* bbbb222 - Merge branch 'x'"]);
        let mut index = CommitIndex::new(IndexStrategy::Global);

        index.refresh(&repo, &rows);
        repo.fail_queries(false);
        index.refresh(&repo, &rows);

        assert!(!index.is_merge("bbbb222"));
        assert_eq!(repo.calls().count("merge_hashes"), 1);
    }

    #[test]
    fn apply_back_fills_flags() {
        let repo = repo();
        let mut rows = parse_lines(repo.page_lines(0, 3).iter().map(String::as_str));
        let mut index = CommitIndex::new(IndexStrategy::Global);

        index.refresh(&repo, &rows);
        index.apply(&mut rows);

        let flags: Vec<(bool, bool)> = rows
            .iter()
            .filter_map(CommitRow::commit)
            .map(|c| (c.is_merge, c.is_conflict_resolved))
            .collect();
        assert_eq!(flags, vec![(false, false), (true, false), (false, true)]);
    }
}
