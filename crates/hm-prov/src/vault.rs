//! Proof generation: hashing files, writing proof documents and
//! recording them in the registry.

use crate::config::VaultConfig;
use crate::error::{ProofError, Result};
use crate::registry::{write_json, Registry, RegistryStore};
use crate::types::{ProofDocument, ProofLabels, ProofRecord};
use camino::Utf8PathBuf;
use chrono::{DateTime, SubsecRound, Utc};
use hm_hash::HashAlgorithm;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Attempts at finding a free proof document name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// The result of protecting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOutcome {
    pub record: ProofRecord,
    /// Full path of the standalone proof document
    pub document: PathBuf,
}

/// A file a batch run could not protect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Summary of a directory run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub protected: Vec<ProofOutcome>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A proof store on disk: one registry plus a directory of proof documents.
#[derive(Debug, Clone)]
pub struct Vault {
    config: VaultConfig,
    store: RegistryStore,
}

impl Vault {
    /// Open a vault. Nothing is touched on disk until the first write.
    pub fn open(config: VaultConfig) -> Self {
        let store = RegistryStore::new(config.registry_path());
        Self { config, store }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    pub fn registry(&self) -> Result<Registry> {
        self.store.load()
    }

    /// Registry key for a file: its path relative to the content root with
    /// `/` separators, or the canonical absolute path for files outside it.
    pub fn key_for(&self, path: &Path) -> Result<Utf8PathBuf> {
        let canonical = fs::canonicalize(path).map_err(|err| ProofError::input(path, err))?;
        let root = fs::canonicalize(&self.config.root).ok();

        let key = match root.as_deref().and_then(|r| canonical.strip_prefix(r).ok()) {
            Some(relative) if relative.as_os_str().is_empty() => None,
            Some(relative) => Some(slash_key(relative).ok_or_else(|| {
                ProofError::NonUtf8Path(canonical.clone())
            })?),
            None => None,
        };
        let key = match key {
            Some(key) => key,
            None => Utf8PathBuf::try_from(canonical.clone())
                .map_err(|_| ProofError::NonUtf8Path(canonical.clone()))?,
        };

        debug!(path = %path.display(), %key, "resolved registry key");
        Ok(key)
    }

    /// Hash a file, write its proof document and append the record to the
    /// registry.
    ///
    /// Every call is a new attestation: protecting an unchanged file again
    /// adds a second record with the same hash and a later timestamp.
    pub fn protect(&self, path: &Path, labels: &ProofLabels) -> Result<ProofOutcome> {
        let metadata = fs::metadata(path).map_err(|err| ProofError::input(path, err))?;
        if !metadata.is_file() {
            return Err(ProofError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let key = self.key_for(path)?;
        let algorithm = HashAlgorithm::default();
        let mut content = File::open(path).map_err(|err| ProofError::input(path, err))?;
        let (content_hash, fingerprint) = algorithm
            .digest_with_fingerprint(&mut content)
            .map_err(|err| ProofError::io(path, err))?;

        // Fail on a corrupt registry before anything is written.
        let mut registry = self.store.load()?;

        let created_at = Utc::now().trunc_subsecs(3);
        let mut record = ProofRecord {
            file_path: key,
            content_hash,
            algorithm,
            created_at,
            project_label: labels.project.clone(),
            client: labels.client.clone(),
            description: labels.description.clone(),
            size_bytes: Some(fingerprint.total_bytes),
            proof_document: None,
        };

        let (document, file) = self.create_document_file(path, created_at)?;
        record.proof_document = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let proof = ProofDocument::new(record.clone(), fingerprint);
        write_document(&document, file, &proof)?;

        registry.record(record.clone());
        self.store.save(&registry)?;

        info!(
            file = %record.file_path,
            hash = %record.content_hash,
            document = %document.display(),
            "file protected"
        );
        Ok(ProofOutcome { record, document })
    }

    /// Protect every file under `dir` matching the configured pattern.
    ///
    /// Files inside skipped directories or inside the vault itself are
    /// listed as skipped. A failure on one file is recorded and the run
    /// continues.
    pub fn protect_dir(&self, dir: &Path, labels: &ProofLabels) -> Result<BatchReport> {
        if !dir.is_dir() {
            return Err(ProofError::NotFound {
                path: dir.to_path_buf(),
            });
        }
        let dir_str = dir
            .to_str()
            .ok_or_else(|| ProofError::NonUtf8Path(dir.to_path_buf()))?;
        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(dir_str.trim_end_matches('/')),
            self.config.pattern
        );
        let entries = glob::glob(&pattern).map_err(|err| ProofError::Pattern {
            pattern: self.config.pattern.clone(),
            reason: err.to_string(),
        })?;

        let vault_dir = fs::canonicalize(&self.config.base_dir).ok();
        let mut report = BatchReport::default();
        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => paths.push(path),
                Err(err) => report.failed.push(BatchFailure {
                    path: err.path().to_path_buf(),
                    error: err.error().to_string(),
                }),
            }
        }
        paths.sort();

        for path in paths {
            if !path.is_file() {
                continue;
            }
            let in_vault = vault_dir.as_deref().is_some_and(|v| {
                fs::canonicalize(&path)
                    .map(|p| p.starts_with(v))
                    .unwrap_or(false)
            });
            if in_vault || self.in_skipped_dir(dir, &path) {
                debug!(path = %path.display(), "skipped");
                report.skipped.push(path);
                continue;
            }
            match self.protect(&path, labels) {
                Ok(outcome) => report.protected.push(outcome),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to protect file");
                    report.failed.push(BatchFailure {
                        path,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            dir = %dir.display(),
            protected = report.protected.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// All recorded proofs for a file, in the order they were recorded.
    pub fn history(&self, path: &Path) -> Result<Vec<ProofRecord>> {
        let key = self.key_for(path)?;
        Ok(self.store.load()?.history(&key).to_vec())
    }

    fn in_skipped_dir(&self, dir: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(dir).unwrap_or(path);
        let parent = relative.parent().unwrap_or_else(|| Path::new(""));
        parent.components().any(|c| match c {
            Component::Normal(name) => name.to_str().is_some_and(|n| self.config.skips(n)),
            _ => false,
        })
    }

    /// Create a new, uniquely named proof document file. Existing documents
    /// are never opened for writing.
    fn create_document_file(
        &self,
        source: &Path,
        created_at: DateTime<Utc>,
    ) -> Result<(PathBuf, File)> {
        let proofs_dir = self.config.proofs_dir();
        fs::create_dir_all(&proofs_dir).map_err(|err| ProofError::io(&proofs_dir, err))?;

        let stem = sanitized_stem(source);
        let stamp = created_at.format("%Y%m%dT%H%M%S%3fZ");
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}_{stamp}_proof.json")
            } else {
                format!("{stem}_{stamp}-{attempt}_proof.json")
            };
            let candidate = proofs_dir.join(name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(file) => return Ok((candidate, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(ProofError::io(&candidate, err)),
            }
        }
        Err(ProofError::io(
            &proofs_dir,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free proof document name for {stem}_{stamp}"),
            ),
        ))
    }
}

/// Fill a freshly created proof document. On failure the partial file is
/// removed so `proofs/` only holds complete documents.
fn write_document(path: &Path, file: File, proof: &ProofDocument) -> Result<()> {
    let written = write_json(&file, proof).and_then(|()| file.sync_all());
    drop(file);
    if let Err(err) = written {
        if let Err(remove_err) = fs::remove_file(path) {
            warn!(
                document = %path.display(),
                error = %remove_err,
                "failed to remove partial proof document"
            );
        }
        return Err(ProofError::io(path, err));
    }
    Ok(())
}

/// Join relative path components with `/`.
fn slash_key(relative: &Path) -> Option<Utf8PathBuf> {
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(Utf8PathBuf::from(parts.join("/")))
}

/// File stem reduced to characters that are safe in a file name.
pub(crate) fn sanitized_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
