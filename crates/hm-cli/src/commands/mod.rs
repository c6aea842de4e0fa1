//! Command handlers and the arguments they share.

pub mod proof;
pub mod verify;

use anyhow::{Context, Result};
use clap::Args;
use hm_prov::{ProofLabels, VaultConfig, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the vault lives. Flags override `hallmark.toml`, which overrides
/// the defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct VaultArgs {
    /// Path to a config file (default: ./hallmark.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding the registry and proof documents
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,
    /// Content root that registry keys are relative to
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

impl VaultArgs {
    pub fn resolve(&self) -> Result<VaultConfig> {
        let mut config = match &self.config {
            Some(path) => VaultConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => VaultConfig::load_or_default(Path::new(CONFIG_FILE_NAME))
                .context("failed to load hallmark.toml")?,
        };
        if let Some(base_dir) = &self.base_dir {
            config.base_dir = base_dir.clone();
        }
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        debug!(?config, "vault configuration");
        Ok(config)
    }
}

/// Annotations recorded with a new proof.
#[derive(Debug, Clone, Default, Args)]
pub struct LabelArgs {
    /// Project the work belongs to
    #[arg(long)]
    pub project: Option<String>,
    /// Client the work was made for
    #[arg(long)]
    pub client: Option<String>,
    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,
}

impl From<LabelArgs> for ProofLabels {
    fn from(args: LabelArgs) -> Self {
        ProofLabels {
            project: args.project,
            client: args.client,
            description: args.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "base_dir = \"system\"\nroot = \"site\"\n").unwrap();

        let args = VaultArgs {
            config: Some(path),
            base_dir: Some(PathBuf::from("/tmp/override")),
            root: None,
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/tmp/override"));
        assert_eq!(config.root, dir.path().join("site"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let args = VaultArgs {
            config: Some(PathBuf::from("/nonexistent/hallmark.toml")),
            ..VaultArgs::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn labels_convert() {
        let labels: ProofLabels = LabelArgs {
            project: Some("Alfa Clinic".to_string()),
            client: None,
            description: Some("Bold variant".to_string()),
        }
        .into();
        assert_eq!(labels.project.as_deref(), Some("Alfa Clinic"));
        assert_eq!(labels.description.as_deref(), Some("Bold variant"));
    }
}
