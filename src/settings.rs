//! Settings file handling.
//!
//! An optional `config.toml` supplies defaults for the store and compare mode.
//! Command-line flags take precedence over anything read here.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use docmirror_core::CompareMode;

/// Which store the locators on the command line address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Android documents through the termux-saf tools.
    #[default]
    Termux,
    /// Plain paths on the local filesystem.
    Local,
}

/// Values read from the settings file. Unset keys fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub provider: Option<ProviderKind>,
    pub compare: Option<CompareMode>,
    pub termux_bin_dir: Option<PathBuf>,
}

impl Settings {
    /// Default location of the settings file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docmirror")
            .join("config.toml")
    }

    /// Load settings from `path`, or from [`Settings::default_path`].
    ///
    /// A missing file at the default location yields empty settings; an
    /// explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read settings from {}", path.display()))?;
        Self::parse(&raw).wrap_err_with(|| format!("Invalid settings in {}", path.display()))
    }

    /// Parse settings from TOML text.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Store kind after applying the command-line override.
    pub fn provider_or(&self, flag: Option<ProviderKind>) -> ProviderKind {
        flag.or(self.provider).unwrap_or_default()
    }

    /// Compare mode after applying the command-line override.
    pub fn compare_or(&self, flag: Option<CompareMode>) -> CompareMode {
        flag.or(self.compare).unwrap_or_default()
    }

    /// Termux tool directory after applying the command-line override.
    pub fn termux_bin_dir_or(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.termux_bin_dir.clone())
    }
}
