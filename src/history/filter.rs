//! History filters applied to the paginated log and count queries.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use globset::{Glob, GlobMatcher};
use regex::Regex;
use serde::Serialize;

/// Unit of a relative `--since` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinceUnit {
    /// Hours.
    Hour,
    /// Days.
    Day,
    /// Weeks.
    Week,
}

impl SinceUnit {
    fn git_name(self) -> &'static str {
        match self {
            Self::Hour => "hours",
            Self::Day => "days",
            Self::Week => "weeks",
        }
    }
}

/// Relative time window such as `2.weeks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Since {
    /// Number of units.
    pub amount: u32,
    /// Unit of time.
    pub unit: SinceUnit,
}

impl Since {
    /// Returns the approxidate form git understands, e.g. `2.weeks.ago`.
    pub fn git_arg(&self) -> String {
        format!("{}.{}.ago", self.amount, self.unit.git_name())
    }
}

impl fmt::Display for Since {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.amount, self.unit.git_name())
    }
}

// Relative period such as `2.weeks` or a bare `day`
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static SINCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)\.)?(hours?|days?|weeks?)$").unwrap());

impl FromStr for Since {
    type Err = anyhow::Error;

    /// Parses `N.unit` or a bare `unit` (meaning one).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = SINCE_PATTERN.captures(trimmed).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid period '{}'. Expected N.unit with unit hour(s), day(s) or week(s)",
                trimmed
            )
        })?;

        let amount = match caps.get(1) {
            Some(m) => m.as_str().parse::<u32>()?,
            None => 1,
        };
        let unit = match caps.get(2).map(|m| m.as_str().trim_end_matches('s')) {
            Some("hour") => SinceUnit::Hour,
            Some("day") => SinceUnit::Day,
            _ => SinceUnit::Week,
        };

        Ok(Self { amount, unit })
    }
}

/// Filter for one browsing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryFilter {
    /// Glob restricting which branches the branch list shows.
    pub branch_pattern: Option<String>,
    /// Author passed to `--author`.
    pub author: Option<String>,
    /// Relative window passed to `--since`.
    pub since: Option<Since>,
}

impl HistoryFilter {
    /// Returns the `--author`/`--since` arguments shared by log and count queries.
    pub fn git_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(author) = self.author.as_deref().filter(|a| !a.is_empty()) {
            args.push(format!("--author={author}"));
        }
        if let Some(since) = &self.since {
            args.push(format!("--since={}", since.git_arg()));
        }
        args
    }

    /// Compiles the branch pattern, if any.
    pub fn branch_matcher(&self) -> anyhow::Result<Option<GlobMatcher>> {
        match self.branch_pattern.as_deref().filter(|p| !p.is_empty()) {
            Some(pattern) => Ok(Some(Glob::new(pattern)?.compile_matcher())),
            None => Ok(None),
        }
    }

    /// Whether no filter is active.
    pub fn is_empty(&self) -> bool {
        self.branch_pattern.as_deref().map_or(true, str::is_empty)
            && self.author.as_deref().map_or(true, str::is_empty)
            && self.since.is_none()
    }
}
