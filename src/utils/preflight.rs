//! Preflight validation checks for early failure detection
//!
//! Commands call these before opening the browser so a missing `git` or a
//! directory outside any repository fails with a clear message instead of a
//! query error on the first page load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Validate the `git` executable is available
pub fn check_git_cli() -> Result<()> {
    let git_check = std::process::Command::new("git")
        .args(["--version"])
        .output();

    match git_check {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => bail!(
            "git is installed but `git --version` failed.\n\
             Error: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(_) => bail!(
            "git is not installed or not in PATH.\n\
             Please install it from https://git-scm.com/"
        ),
    }
}

/// Validate `path` is inside a git repository
///
/// Returns the repository's working directory. This only opens the
/// repository; no history is read.
pub fn check_git_repository_at(path: &Path) -> Result<PathBuf> {
    let repo = git2::Repository::discover(path).context(
        "Not in a git repository. Please run this command from within a git repository.",
    )?;
    match repo.workdir() {
        Some(workdir) => Ok(workdir.to_path_buf()),
        None => bail!(
            "Repository at {} is bare; run this command from a working tree",
            repo.path().display()
        ),
    }
}

/// Validate the current directory is inside a git repository
pub fn check_git_repository() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    check_git_repository_at(&cwd)
}

/// Combined preflight check for history commands
///
/// Validates:
/// - Git repository access
/// - `git` executable availability
///
/// Returns the repository's working directory.
pub fn check_history_prerequisites() -> Result<PathBuf> {
    let workdir = check_git_repository()?;
    check_git_cli()?;
    Ok(workdir)
}
