//! Configuration-related CLI commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::utils::{BrowseOverrides, BrowseSettings, Settings};

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Shows the effective browser settings.
    Show(ShowCommand),
}

/// Show command options.
#[derive(Parser)]
pub struct ShowCommand {}

/// Effective configuration as printed by `config show`.
#[derive(Debug, Serialize)]
struct ConfigView {
    settings_file: String,
    settings_file_exists: bool,
    #[serde(flatten)]
    browse: BrowseSettings,
}

impl ConfigCommand {
    /// Executes the config command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            ConfigSubcommands::Show(show_cmd) => show_cmd.execute(),
        }
    }
}

impl ShowCommand {
    /// Executes the show command.
    pub fn execute(self) -> Result<()> {
        // Preflight check: validate git repository before any processing
        crate::utils::check_git_repository()?;

        let path = Settings::get_settings_path()?;
        let settings = Settings::load_from_path(&path)?;
        let view = ConfigView {
            settings_file: path.display().to_string(),
            settings_file_exists: path.exists(),
            browse: settings.resolve_browse(BrowseOverrides::default())?,
        };

        let yaml_output =
            serde_yaml::to_string(&view).context("Failed to serialize settings to YAML")?;
        print!("{yaml_output}");
        Ok(())
    }
}
