//! Seams between the browser and the external version-control tool.

use crate::history::{HistoryError, HistoryFilter};

/// One paginated history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of commits to skip from the newest.
    pub skip: usize,
    /// Maximum number of commits to return.
    pub max_count: usize,
    /// Author/date restrictions.
    pub filter: HistoryFilter,
}

/// Which branches to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchScope {
    /// Local branches only (`git branch`).
    Local,
    /// Local and remote-tracking branches (`git branch --all`).
    All,
}

/// Read-only history queries.
///
/// Every method maps to exactly one invocation of the external tool and is
/// attempted once; failures are returned, never retried.
pub trait CommitSource {
    /// Returns the raw graph lines for one page.
    fn load_page(&self, request: &PageRequest) -> Result<Vec<String>, HistoryError>;

    /// Returns the number of commits reachable from HEAD under `filter`.
    fn total_count(&self, filter: &HistoryFilter) -> Result<usize, HistoryError>;

    /// Returns the commit followed by its parents.
    fn parents(&self, hash: &str) -> Result<Vec<String>, HistoryError>;

    /// Returns the full commit message.
    fn message_body(&self, hash: &str) -> Result<String, HistoryError>;

    /// Returns the full hashes of every merge commit in the history.
    fn merge_hashes(&self) -> Result<Vec<String>, HistoryError>;

    /// Returns the full hashes of every commit whose message mentions a
    /// conflict keyword.
    fn conflict_hashes(&self) -> Result<Vec<String>, HistoryError>;

    /// Returns branch names in the order git lists them.
    fn branches(&self, scope: BranchScope) -> Result<Vec<String>, HistoryError>;

    /// Returns the checked-out branch name.
    fn current_branch(&self) -> Result<String, HistoryError>;

    /// Returns a human-readable description of one commit.
    fn commit_details(&self, hash: &str) -> Result<String, HistoryError>;
}

/// Working-tree mutation used by branch switching.
pub trait BranchCheckout {
    /// Checks out `branch`, returning the tool's combined output.
    fn checkout(&self, branch: &str) -> Result<String, HistoryError>;
}

impl<T: CommitSource + ?Sized> CommitSource for &T {
    fn load_page(&self, request: &PageRequest) -> Result<Vec<String>, HistoryError> {
        (**self).load_page(request)
    }

    fn total_count(&self, filter: &HistoryFilter) -> Result<usize, HistoryError> {
        (**self).total_count(filter)
    }

    fn parents(&self, hash: &str) -> Result<Vec<String>, HistoryError> {
        (**self).parents(hash)
    }

    fn message_body(&self, hash: &str) -> Result<String, HistoryError> {
        (**self).message_body(hash)
    }

    fn merge_hashes(&self) -> Result<Vec<String>, HistoryError> {
        (**self).merge_hashes()
    }

    fn conflict_hashes(&self) -> Result<Vec<String>, HistoryError> {
        (**self).conflict_hashes()
    }

    fn branches(&self, scope: BranchScope) -> Result<Vec<String>, HistoryError> {
        (**self).branches(scope)
    }

    fn current_branch(&self) -> Result<String, HistoryError> {
        (**self).current_branch()
    }

    fn commit_details(&self, hash: &str) -> Result<String, HistoryError> {
        (**self).commit_details(hash)
    }
}

impl<T: BranchCheckout + ?Sized> BranchCheckout for &T {
    fn checkout(&self, branch: &str) -> Result<String, HistoryError> {
        (**self).checkout(branch)
    }
}
