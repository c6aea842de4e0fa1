//! Vault configuration (`hallmark.toml`).

use crate::error::{ProofError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no config is given.
pub const CONFIG_FILE_NAME: &str = "hallmark.toml";

/// Directories never descended into by batch protection.
pub const DEFAULT_SKIP_DIRS: &[&str] = &["node_modules", ".git", "__pycache__"];

/// Where proofs live and how files are found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Directory holding `registry.json`, `proofs/` and `proofs/packages/`.
    pub base_dir: PathBuf,
    /// Registry keys are made relative to this directory.
    pub root: PathBuf,
    /// Glob used by batch protection, relative to the protected directory.
    pub pattern: String,
    /// Extra directory names skipped by batch protection.
    pub skip_dirs: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(".hallmark"),
            root: PathBuf::from("."),
            pattern: "**/*.html".to_string(),
            skip_dirs: Vec::new(),
        }
    }
}

impl VaultConfig {
    /// Read a config file. Relative paths inside it are taken relative to
    /// the file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| ProofError::input(path, err))?;
        let config: Self = toml::from_str(&contents).map_err(|err| ProofError::Config {
            path: path.to_path_buf(),
            reason: err.message().to_string(),
        })?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(dir))
    }

    /// Like [`VaultConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(ProofError::NotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    fn relative_to(mut self, dir: &Path) -> Self {
        if dir.as_os_str().is_empty() {
            return self;
        }
        if self.base_dir.is_relative() {
            self.base_dir = dir.join(&self.base_dir);
        }
        if self.root.is_relative() {
            self.root = dir.join(&self.root);
        }
        self
    }

    /// Whether batch protection skips a directory with this name.
    pub fn skips(&self, dir_name: &str) -> bool {
        DEFAULT_SKIP_DIRS.contains(&dir_name) || self.skip_dirs.iter().any(|d| d == dir_name)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.base_dir.join("registry.json")
    }

    pub fn proofs_dir(&self) -> PathBuf {
        self.base_dir.join("proofs")
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.proofs_dir().join("packages")
    }
}
