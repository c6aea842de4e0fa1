//! Proof packages: a self-contained directory of evidence for one file.

use crate::error::{ProofError, Result};
use crate::registry::write_json;
use crate::types::ProofRecord;
use crate::vault::{sanitized_stem, Vault};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the summary written into every package.
pub const SUMMARY_FILE_NAME: &str = "SUMMARY.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageSummary<'a> {
    title: &'static str,
    document_type: &'static str,
    generated_at: DateTime<Utc>,
    latest: &'a ProofRecord,
    history: &'a [ProofRecord],
    documents: Vec<String>,
    missing_documents: Vec<String>,
    instructions: Vec<String>,
    notice: String,
}

impl Vault {
    /// Export the proof package for a file on disk.
    pub fn export(&self, path: &Path, out_dir: Option<&Path>) -> Result<PathBuf> {
        let key = self.key_for(path)?;
        self.export_key(&key, out_dir)
    }

    /// Export the proof package for a registry key. The protected file itself
    /// does not need to exist any more.
    ///
    /// The package lands in `<out_dir>/<stem>_<hash prefix>/` (default
    /// `out_dir` is the vault's packages directory) and holds copies of every
    /// proof document for the file plus a `SUMMARY.json`.
    pub fn export_key(&self, key: &Utf8Path, out_dir: Option<&Path>) -> Result<PathBuf> {
        let registry = self.store().load()?;
        let history = registry.history(key);
        let latest = history.last().ok_or_else(|| ProofError::NoProof {
            key: key.to_string(),
        })?;

        let out_dir = out_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config().packages_dir());
        let package = out_dir.join(format!(
            "{}_{}",
            sanitized_stem(key.as_std_path()),
            &latest.content_hash[..8]
        ));
        fs::create_dir_all(&package).map_err(|err| ProofError::io(&package, err))?;

        let proofs_dir = self.config().proofs_dir();
        let mut documents = Vec::new();
        let mut missing_documents = Vec::new();
        for name in history.iter().filter_map(|r| r.proof_document.as_deref()) {
            let source = proofs_dir.join(name);
            if !source.is_file() {
                warn!(document = %source.display(), "proof document missing, not packaged");
                missing_documents.push(name.to_string());
                continue;
            }
            let target = package.join(name);
            fs::copy(&source, &target).map_err(|err| ProofError::io(&source, err))?;
            documents.push(name.to_string());
        }

        let summary = PackageSummary {
            title: "Certificate of copyright protection",
            document_type: "copyright_proof_package",
            generated_at: Utc::now(),
            latest,
            history,
            documents,
            missing_documents,
            instructions: vec![
                format!("1. Compute the {} digest of the original file.", latest.algorithm),
                "2. Compare it with contentHash in this summary.".to_string(),
                "3. Each proof document records the digest and the time it was taken.".to_string(),
            ],
            notice: format!(
                "This package attests that '{}' existed with {} digest {} on {}.",
                latest.file_path,
                latest.algorithm,
                latest.content_hash,
                latest.created_at.to_rfc3339()
            ),
        };

        let summary_path = package.join(SUMMARY_FILE_NAME);
        let file = File::create(&summary_path).map_err(|err| ProofError::io(&summary_path, err))?;
        write_json(&file, &summary).map_err(|err| ProofError::io(&summary_path, err))?;

        info!(file = %key, package = %package.display(), "proof package exported");
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;
    use crate::types::ProofLabels;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Vault, PathBuf) {
        let dir = TempDir::new().unwrap();
        let vault = Vault::open(VaultConfig {
            base_dir: dir.path().join("system"),
            root: dir.path().to_path_buf(),
            ..VaultConfig::default()
        });
        let path = dir.path().join("alfa-clinic-bold.html");
        fs::write(&path, "<html>alfa</html>").unwrap();
        (dir, vault, path)
    }

    #[test]
    fn export_copies_documents_and_writes_summary() {
        let (_dir, vault, path) = setup();
        let first = vault
            .protect(&path, &ProofLabels::project("Alfa Clinic"))
            .unwrap();
        let second = vault.protect(&path, &ProofLabels::default()).unwrap();

        let package = vault.export(&path, None).unwrap();
        assert!(package.starts_with(vault.config().packages_dir()));
        let name = package.file_name().unwrap().to_str().unwrap();
        assert_eq!(
            name,
            format!("alfa-clinic-bold_{}", &first.record.content_hash[..8])
        );
        assert!(package.join(first.document.file_name().unwrap()).is_file());
        assert!(package.join(second.document.file_name().unwrap()).is_file());

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(package.join(SUMMARY_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(summary["documentType"], "copyright_proof_package");
        assert_eq!(summary["latest"]["contentHash"], second.record.content_hash);
        assert_eq!(summary["history"].as_array().unwrap().len(), 2);
        assert_eq!(summary["documents"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn export_to_custom_dir_reports_missing_documents() {
        let (dir, vault, path) = setup();
        let outcome = vault.protect(&path, &ProofLabels::default()).unwrap();
        fs::remove_file(&outcome.document).unwrap();

        let out = dir.path().join("court");
        let package = vault.export(&path, Some(&out)).unwrap();
        assert!(package.starts_with(&out));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(package.join(SUMMARY_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(summary["documents"].as_array().unwrap().len(), 0);
        assert_eq!(summary["missingDocuments"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn export_unprotected_file_fails() {
        let (_dir, vault, path) = setup();
        assert!(matches!(
            vault.export(&path, None),
            Err(ProofError::NoProof { .. })
        ));
    }

    #[test]
    fn export_by_key_after_file_removed() {
        let (_dir, vault, path) = setup();
        let outcome = vault.protect(&path, &ProofLabels::default()).unwrap();
        fs::remove_file(&path).unwrap();

        let package = vault.export_key(&outcome.record.file_path, None).unwrap();
        assert!(package.join(SUMMARY_FILE_NAME).is_file());
    }
}
