//! Shared test utilities for the `history` module.

use std::sync::{Arc, Mutex};

use crate::history::index::mentions_conflict;
use crate::history::{
    BranchCheckout, BranchScope, CommitSource, HistoryError, HistoryFilter, PageRequest,
};

/// Length of the abbreviated hashes the fake prints on graph lines.
const SHORT_LEN: usize = 7;

/// One commit of a [`FakeRepository`].
#[derive(Debug, Clone)]
pub(crate) struct FakeCommit {
    hash: String,
    message: String,
    parents: usize,
    refs: Option<String>,
}

impl FakeCommit {
    /// Creates a single-parent commit.
    pub(crate) fn new(hash: &str, message: &str) -> Self {
        Self {
            hash: hash.to_string(),
            message: message.to_string(),
            parents: 1,
            refs: None,
        }
    }

    /// Sets the number of parents (two or more makes a merge).
    pub(crate) fn with_parents(mut self, parents: usize) -> Self {
        self.parents = parents;
        self
    }

    /// Decorates the commit with a `%d` ref list such as `HEAD -> main`.
    pub(crate) fn with_refs(mut self, refs: &str) -> Self {
        self.refs = Some(refs.to_string());
        self
    }

    fn short(&self) -> &str {
        &self.hash[..SHORT_LEN.min(self.hash.len())]
    }
}

/// Recorded query names, in call order.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog {
    calls: Vec<String>,
}

impl CallLog {
    /// Number of calls to the query `name`.
    pub(crate) fn count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == name).count()
    }
}

#[derive(Debug)]
struct State {
    branches: Vec<String>,
    current: String,
    checkouts: Vec<String>,
    calls: Vec<String>,
    fail_all: bool,
    fail_pages: bool,
}

/// In-memory repository implementing every history query.
///
/// Pages are rendered in the same `%h -%d %s (%aI) <%cn>` shape git uses, so
/// tests exercise the real line parser. Clones share state, which lets a test
/// keep a handle after moving the repository into a viewport.
#[derive(Debug, Clone)]
pub(crate) struct FakeRepository {
    commits: Arc<Vec<FakeCommit>>,
    graph_rows: bool,
    state: Arc<Mutex<State>>,
}

impl FakeRepository {
    /// Creates a repository whose history is `commits`, newest first.
    pub(crate) fn linear(commits: Vec<FakeCommit>) -> Self {
        Self {
            commits: Arc::new(commits),
            graph_rows: false,
            state: Arc::new(Mutex::new(State {
                branches: vec!["main".to_string()],
                current: "main".to_string(),
                checkouts: Vec::new(),
                calls: Vec::new(),
                fail_all: false,
                fail_pages: false,
            })),
        }
    }

    /// Creates `n` plain commits named `c01`, `c02`, ... newest first.
    pub(crate) fn numbered(n: usize) -> Self {
        Self::linear(
            (1..=n)
                .map(|i| FakeCommit::new(&format!("c{i:02}{}", "0".repeat(8)), &format!("commit {i}")))
                .collect(),
        )
    }

    /// Emits a graph-only `|\` row after every merge commit.
    pub(crate) fn with_graph_rows(mut self) -> Self {
        self.graph_rows = true;
        self
    }

    /// Sets the local branch list and the checked-out branch.
    pub(crate) fn with_branches(self, branches: &[&str], current: &str) -> Self {
        {
            let mut state = self.lock();
            state.branches = branches.iter().map(|b| (*b).to_string()).collect();
            state.current = current.to_string();
        }
        self
    }

    /// Makes every subsequent query fail.
    pub(crate) fn fail_queries(&self, fail: bool) {
        self.lock().fail_all = fail;
    }

    /// Makes subsequent page loads fail while other queries succeed.
    pub(crate) fn fail_pages(&self, fail: bool) {
        self.lock().fail_pages = fail;
    }

    /// Returns a snapshot of the recorded queries.
    pub(crate) fn calls(&self) -> CallLog {
        CallLog {
            calls: self.lock().calls.clone(),
        }
    }

    /// Returns the branches checked out so far.
    pub(crate) fn checkouts(&self) -> Vec<String> {
        self.lock().checkouts.clone()
    }

    /// Returns the abbreviated hash of the commit at `ordinal`.
    pub(crate) fn short_hash(&self, ordinal: usize) -> String {
        self.commits[ordinal].short().to_string()
    }

    /// Renders the graph lines for `max_count` commits starting at `skip`.
    pub(crate) fn page_lines(&self, skip: usize, max_count: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for (offset, commit) in self.commits.iter().skip(skip).take(max_count).enumerate() {
            let refs = commit
                .refs
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            lines.push(format!(
                "* {} -{} {} (2024-01-{:02}T12:00:00Z) <Tester>",
                commit.short(),
                refs,
                commit.message,
                28 - (skip + offset).min(27)
            ));
            if self.graph_rows && commit.parents > 1 {
                lines.push("|\\".to_string());
            }
        }
        lines
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, name: &str) -> Result<(), HistoryError> {
        let mut state = self.lock();
        state.calls.push(name.to_string());
        if state.fail_all || (name == "load_page" && state.fail_pages) {
            return Err(HistoryError::QueryFailed {
                command: format!("git {name}"),
                stderr: "fatal: simulated failure".to_string(),
            });
        }
        Ok(())
    }

    fn find(&self, hash: &str) -> Option<&FakeCommit> {
        self.commits.iter().find(|c| c.hash.starts_with(hash))
    }
}

impl CommitSource for FakeRepository {
    fn load_page(&self, request: &PageRequest) -> Result<Vec<String>, HistoryError> {
        self.record("load_page")?;
        Ok(self.page_lines(request.skip, request.max_count))
    }

    fn total_count(&self, _filter: &HistoryFilter) -> Result<usize, HistoryError> {
        self.record("total_count")?;
        Ok(self.commits.len())
    }

    fn parents(&self, hash: &str) -> Result<Vec<String>, HistoryError> {
        self.record("parents")?;
        let commit = self.find(hash).ok_or_else(|| HistoryError::QueryFailed {
            command: format!("git rev-list --parents -n 1 {hash}"),
            stderr: "fatal: bad revision".to_string(),
        })?;
        let mut out = vec![commit.hash.clone()];
        out.extend((0..commit.parents).map(|i| format!("{}p{i}", commit.hash)));
        Ok(out)
    }

    fn message_body(&self, hash: &str) -> Result<String, HistoryError> {
        self.record("message_body")?;
        Ok(self
            .find(hash)
            .map(|c| format!("{}\n", c.message))
            .unwrap_or_default())
    }

    fn merge_hashes(&self) -> Result<Vec<String>, HistoryError> {
        self.record("merge_hashes")?;
        Ok(self
            .commits
            .iter()
            .filter(|c| c.parents > 1)
            .map(|c| c.hash.clone())
            .collect())
    }

    fn conflict_hashes(&self) -> Result<Vec<String>, HistoryError> {
        self.record("conflict_hashes")?;
        Ok(self
            .commits
            .iter()
            .filter(|c| mentions_conflict(&c.message))
            .map(|c| c.hash.clone())
            .collect())
    }

    fn branches(&self, scope: BranchScope) -> Result<Vec<String>, HistoryError> {
        self.record("branches")?;
        let state = self.lock();
        let mut branches = state.branches.clone();
        if scope == BranchScope::All {
            branches.extend(state.branches.iter().map(|b| format!("remotes/origin/{b}")));
        }
        Ok(branches)
    }

    fn current_branch(&self) -> Result<String, HistoryError> {
        self.record("current_branch")?;
        Ok(self.lock().current.clone())
    }

    fn commit_details(&self, hash: &str) -> Result<String, HistoryError> {
        self.record("commit_details")?;
        let message = self.find(hash).map(|c| c.message.as_str()).unwrap_or("");
        Ok(format!("commit {hash}\n\n{message}\n"))
    }
}

impl BranchCheckout for FakeRepository {
    fn checkout(&self, branch: &str) -> Result<String, HistoryError> {
        self.record("checkout")?;
        let mut state = self.lock();
        if !state.branches.iter().any(|b| b == branch) {
            return Err(HistoryError::QueryFailed {
                command: format!("git checkout {branch}"),
                stderr: format!("error: pathspec '{branch}' did not match"),
            });
        }
        state.current = branch.to_string();
        state.checkouts.push(branch.to_string());
        Ok(format!("Switched to branch '{branch}'"))
    }
}
