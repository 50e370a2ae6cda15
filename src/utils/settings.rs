//! Settings and configuration utilities.
//!
//! Settings are read from `$HOME/.histview/settings.json`. The `env` map acts
//! as a fallback for environment variables and the `history` section holds
//! browser defaults.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::history::{IndexStrategy, DEFAULT_WINDOW_SIZE, MAX_WINDOW_SIZE};

/// Environment variable overriding the window size.
pub const WINDOW_SIZE_VAR: &str = "HISTVIEW_WINDOW_SIZE";

/// Environment variable enabling the global merge/conflict index.
pub const GLOBAL_SEARCH_VAR: &str = "HISTVIEW_GLOBAL_SEARCH";

/// Browser defaults from the `history` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct HistorySettings {
    /// Number of visible rows.
    #[serde(default)]
    pub window_size: Option<usize>,
    /// Whether to index merges and conflicts over the whole history.
    #[serde(default)]
    pub global_search: Option<bool>,
}

/// Settings loaded from `$HOME/.histview/settings.json`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable overrides.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Browser defaults.
    #[serde(default)]
    pub history: HistorySettings,
}

/// Effective browser configuration after applying every source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowseSettings {
    /// Number of visible rows.
    pub window_size: usize,
    /// Merge/conflict indexing strategy.
    pub strategy: IndexStrategy,
}

/// Command-line overrides, which win over every other source.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowseOverrides {
    /// `--window-size`.
    pub window_size: Option<usize>,
    /// `--global`.
    pub global: bool,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // A missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".histview").join("settings.json"))
    }

    /// Looks `key` up in the environment, falling back to the `env` map.
    fn lookup<F>(&self, key: &str, env_lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        env_lookup(key).or_else(|| self.env.get(key).cloned())
    }

    /// Resolves the browser configuration from the process environment.
    pub fn resolve_browse(&self, overrides: BrowseOverrides) -> Result<BrowseSettings> {
        self.resolve_browse_with(overrides, |k| env::var(k).ok())
    }

    /// Resolves the browser configuration with an explicit environment.
    ///
    /// Precedence: overrides, then the environment, then the settings `env`
    /// map, then the `history` section, then built-in defaults.
    pub fn resolve_browse_with<F>(
        &self,
        overrides: BrowseOverrides,
        env_lookup: F,
    ) -> Result<BrowseSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let window_size = match overrides.window_size {
            Some(size) => size,
            None => match self.lookup(WINDOW_SIZE_VAR, &env_lookup) {
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid {WINDOW_SIZE_VAR}: {raw:?}"))?,
                None => self.history.window_size.unwrap_or(DEFAULT_WINDOW_SIZE),
            },
        };
        if !(1..=MAX_WINDOW_SIZE).contains(&window_size) {
            anyhow::bail!(
                "Window size must be between 1 and {MAX_WINDOW_SIZE}, got {window_size}"
            );
        }

        let global = overrides.global
            || match self.lookup(GLOBAL_SEARCH_VAR, &env_lookup) {
                Some(raw) => parse_flag(&raw)
                    .with_context(|| format!("Invalid {GLOBAL_SEARCH_VAR}: {raw:?}"))?,
                None => self.history.global_search.unwrap_or(false),
            };

        Ok(BrowseSettings {
            window_size,
            strategy: if global {
                IndexStrategy::Global
            } else {
                IndexStrategy::Windowed
            },
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected true or false, got {other:?}"),
    }
}
