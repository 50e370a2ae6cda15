//! Argument vectors for every git query the browser issues.
//!
//! These shapes are the compatibility surface with git and must not drift.

use crate::history::{BranchScope, HistoryFilter, PageRequest};

/// Pretty format of the paginated graph query.
pub const LOG_FORMAT: &str = "%h -%d %s (%aI) <%cn>";

/// Keywords that mark a commit message as a conflict resolution.
pub const CONFLICT_KEYWORDS: [&str; 3] = ["conflict", "resolve", "fix"];

/// Header format of the commit details view.
const DETAILS_FORMAT: &str =
    "%B%n%nAuthor:      %an <%ae>%nAuthorDate:  %ai%n%nCommitter:   %cn <%ce>%nCommitDate:  %ci";

/// `log --graph --all --skip=N --max-count=M --pretty=format:...` plus filters.
pub fn log_page(request: &PageRequest) -> Vec<String> {
    let mut args = vec![
        "log".to_string(),
        "--graph".to_string(),
        "--all".to_string(),
        format!("--skip={}", request.skip),
        format!("--max-count={}", request.max_count),
        format!("--pretty=format:{LOG_FORMAT}"),
    ];
    args.extend(request.filter.git_args());
    args
}

/// `rev-list --count HEAD` plus filters.
pub fn count(filter: &HistoryFilter) -> Vec<String> {
    let mut args = vec![
        "rev-list".to_string(),
        "--count".to_string(),
        "HEAD".to_string(),
    ];
    args.extend(filter.git_args());
    args
}

/// `rev-list --parents -n 1 <hash>`.
pub fn parents(hash: &str) -> Vec<String> {
    to_args(&["rev-list", "--parents", "-n", "1", hash])
}

/// `show -s --format=%B <hash>`.
pub fn message_body(hash: &str) -> Vec<String> {
    to_args(&["show", "-s", "--format=%B", hash])
}

/// `log --merges --format=%H`.
pub fn merge_hashes() -> Vec<String> {
    to_args(&["log", "--merges", "--format=%H"])
}

/// `log --grep=conflict --grep=resolve --grep=fix -i --format=%H`.
pub fn conflict_hashes() -> Vec<String> {
    let mut args = vec!["log".to_string()];
    args.extend(CONFLICT_KEYWORDS.iter().map(|k| format!("--grep={k}")));
    args.push("-i".to_string());
    args.push("--format=%H".to_string());
    args
}

/// `branch` or `branch --all`.
pub fn branches(scope: BranchScope) -> Vec<String> {
    match scope {
        BranchScope::Local => to_args(&["branch"]),
        BranchScope::All => to_args(&["branch", "--all"]),
    }
}

/// `checkout <branch>`.
pub fn checkout(branch: &str) -> Vec<String> {
    to_args(&["checkout", branch])
}

/// `rev-parse --abbrev-ref HEAD`.
pub fn current_branch() -> Vec<String> {
    to_args(&["rev-parse", "--abbrev-ref", "HEAD"])
}

/// `show -s --format=<details> <hash>`.
pub fn details_header(hash: &str) -> Vec<String> {
    vec![
        "show".to_string(),
        "-s".to_string(),
        format!("--format={DETAILS_FORMAT}"),
        hash.to_string(),
    ]
}

/// `show --stat --patch --format= <hash>`.
pub fn details_changes(hash: &str) -> Vec<String> {
    to_args(&["show", "--stat", "--patch", "--format=", hash])
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_page_shape() {
        let request = PageRequest {
            skip: 60,
            max_count: 60,
            filter: HistoryFilter::default(),
        };
        assert_eq!(
            log_page(&request),
            vec![
                "log",
                "--graph",
                "--all",
                "--skip=60",
                "--max-count=60",
                "--pretty=format:%h -%d %s (%aI) <%cn>",
            ]
        );
    }

    #[test]
    fn filters_are_appended_to_log_and_count() {
        let filter = HistoryFilter {
            branch_pattern: Some("release/*".to_string()),
            author: Some("Jane".to_string()),
            since: Some("3.days".parse().unwrap()),
        };
        let request = PageRequest {
            skip: 0,
            max_count: 10,
            filter: filter.clone(),
        };

        let log = log_page(&request);
        assert_eq!(&log[6..], ["--author=Jane", "--since=3.days.ago"]);

        assert_eq!(
            count(&filter),
            vec!["rev-list", "--count", "HEAD", "--author=Jane", "--since=3.days.ago"]
        );
    }

    #[test]
    fn index_query_shapes() {
        assert_eq!(parents("abc"), vec!["rev-list", "--parents", "-n", "1", "abc"]);
        assert_eq!(message_body("abc"), vec!["show", "-s", "--format=%B", "abc"]);
        assert_eq!(merge_hashes(), vec!["log", "--merges", "--format=%H"]);
        assert_eq!(
            conflict_hashes(),
            vec![
                "log",
                "--grep=conflict",
                "--grep=resolve",
                "--grep=fix",
                "-i",
                "--format=%H",
            ]
        );
    }

    #[test]
    fn branch_query_shapes() {
        assert_eq!(branches(BranchScope::Local), vec!["branch"]);
        assert_eq!(branches(BranchScope::All), vec!["branch", "--all"]);
        assert_eq!(checkout("dev"), vec!["checkout", "dev"]);
        assert_eq!(current_branch(), vec!["rev-parse", "--abbrev-ref", "HEAD"]);
    }
}
