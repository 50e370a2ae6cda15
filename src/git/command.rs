//! Git command-line backed history source.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::git::query;
use crate::history::{
    BranchCheckout, BranchScope, CommitSource, HistoryError, HistoryFilter, PageRequest,
};

/// Runs history queries through the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    workdir: Option<PathBuf>,
}

impl GitCli {
    /// Creates a source running `git` inside `path`.
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            program: "git".to_string(),
            workdir: Some(path.as_ref().to_path_buf()),
        }
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    fn output(&self, args: &[String]) -> Result<Output, HistoryError> {
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }

        debug!(command = %self.describe(args), "Running git query");
        command.output().map_err(|source| HistoryError::Spawn {
            command: self.describe(args),
            source,
        })
    }

    /// Runs a query and returns its standard output.
    fn run(&self, args: &[String]) -> Result<String, HistoryError> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(HistoryError::QueryFailed {
                command: self.describe(args),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parses `git branch` output, dropping the current-branch marker.
pub fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("* ").unwrap_or(line).to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parses one hash per line.
pub fn parse_hash_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `rev-list --count` output.
pub fn parse_count(output: &str) -> Result<usize, HistoryError> {
    let trimmed = output.trim();
    trimmed
        .parse::<usize>()
        .map_err(|_| HistoryError::InvalidCount(trimmed.to_string()))
}

impl CommitSource for GitCli {
    fn load_page(&self, request: &PageRequest) -> Result<Vec<String>, HistoryError> {
        let output = self.run(&query::log_page(request))?;
        Ok(output.lines().map(str::to_string).collect())
    }

    fn total_count(&self, filter: &HistoryFilter) -> Result<usize, HistoryError> {
        parse_count(&self.run(&query::count(filter))?)
    }

    fn parents(&self, hash: &str) -> Result<Vec<String>, HistoryError> {
        let output = self.run(&query::parents(hash))?;
        Ok(output.split_whitespace().map(str::to_string).collect())
    }

    fn message_body(&self, hash: &str) -> Result<String, HistoryError> {
        self.run(&query::message_body(hash))
    }

    fn merge_hashes(&self) -> Result<Vec<String>, HistoryError> {
        Ok(parse_hash_list(&self.run(&query::merge_hashes())?))
    }

    fn conflict_hashes(&self) -> Result<Vec<String>, HistoryError> {
        Ok(parse_hash_list(&self.run(&query::conflict_hashes())?))
    }

    fn branches(&self, scope: BranchScope) -> Result<Vec<String>, HistoryError> {
        Ok(parse_branch_list(&self.run(&query::branches(scope))?))
    }

    fn current_branch(&self) -> Result<String, HistoryError> {
        Ok(self.run(&query::current_branch())?.trim().to_string())
    }

    fn commit_details(&self, hash: &str) -> Result<String, HistoryError> {
        let header = self.run(&query::details_header(hash))?;
        let changes = self.run(&query::details_changes(hash))?;
        Ok(format!(
            "commit {hash}\n\n{}\n\n{}",
            header.trim_end(),
            changes.trim_end()
        ))
    }
}

impl BranchCheckout for GitCli {
    fn checkout(&self, branch: &str) -> Result<String, HistoryError> {
        let args = query::checkout(branch);
        let output = self.output(&args)?;

        // git reports checkout progress on stderr even on success.
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim().to_string();

        if !output.status.success() {
            return Err(HistoryError::QueryFailed {
                command: self.describe(&args),
                stderr: combined,
            });
        }
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_list_strips_current_marker() {
        let output = "  develop\n* main\n  feature/x\n";
        assert_eq!(parse_branch_list(output), vec!["develop", "main", "feature/x"]);
    }

    #[test]
    fn branch_list_keeps_remote_entries() {
        let output = "* main\n  remotes/origin/HEAD -> origin/main\n  remotes/origin/main\n";
        assert_eq!(
            parse_branch_list(output),
            vec!["main", "remotes/origin/HEAD -> origin/main", "remotes/origin/main"]
        );
    }

    #[test]
    fn hash_list_ignores_blank_lines() {
        assert_eq!(parse_hash_list("aaa\n\n bbb \n"), vec!["aaa", "bbb"]);
        assert!(parse_hash_list("").is_empty());
    }

    #[test]
    fn count_parsing() {
        assert_eq!(parse_count("42\n").unwrap(), 42);
        assert!(matches!(
            parse_count("fatal: bad revision"),
            Err(HistoryError::InvalidCount(_))
        ));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cli = GitCli {
            program: "histview-no-such-git".to_string(),
            workdir: None,
        };
        let err = cli.current_branch().unwrap_err();
        assert!(matches!(err, HistoryError::Spawn { .. }));
        assert!(err.to_string().contains("histview-no-such-git rev-parse"));
    }
}
