//! Global context for Podforge operations.
//!
//! Provides centralized access to the working directory, the user-wide
//! Podforge home and output preferences.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::errors::ConfigError;
use crate::core::manifest::find_manifest;

/// Global context containing paths and output preferences.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Podforge data (~/.podforge/)
    home: PathBuf,

    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_dirs(cwd, default_home()))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        Ok(Self::with_dirs(cwd, default_home()))
    }

    fn with_dirs(cwd: PathBuf, home: PathBuf) -> Self {
        GlobalContext {
            cwd,
            home,
            verbose: false,
            color: true,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the Podforge home directory (~/.podforge/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn global_config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Find Podforge.toml starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ConfigError> {
        find_manifest(&self.cwd)
    }
}

fn default_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().join(".podforge"))
        .unwrap_or_else(|| PathBuf::from(".podforge"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
        assert!(ctx.home().ends_with(".podforge"));
        assert!(ctx.color());
        assert!(!ctx.is_verbose());
    }

    #[test]
    fn test_find_manifest_from_nested_dir() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Podforge.toml"), "").unwrap();
        let nested = tmp.path().join("src/commonMain");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested).unwrap();
        assert_eq!(ctx.find_manifest().unwrap(), tmp.path().join("Podforge.toml"));
    }
}
