//! The proof registry and its on-disk persistence.

use crate::error::{ProofError, Result};
use crate::types::ProofRecord;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Format version written into new registry documents.
pub const REGISTRY_VERSION: u32 = 1;

/// Every proof ever recorded, keyed by file path.
///
/// Each key holds its records in the order they were written; the last one
/// is the current proof for that file. Nothing is ever removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registry {
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<Utf8PathBuf, Vec<ProofRecord>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            version: REGISTRY_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Append a record to its file's history. It becomes the current proof
    /// whatever its timestamp.
    pub fn record(&mut self, record: ProofRecord) {
        self.entries
            .entry(record.file_path.clone())
            .or_default()
            .push(record);
    }

    /// Most recently written record for a file.
    pub fn latest(&self, key: &Utf8Path) -> Option<&ProofRecord> {
        self.entries.get(key).and_then(|history| history.last())
    }

    /// All records for a file, in the order they were written.
    pub fn history(&self, key: &Utf8Path) -> &[ProofRecord] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of protected files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records across all files.
    pub fn total_proofs(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utf8PathBuf, &[ProofRecord])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Structural checks serde cannot express.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.version != REGISTRY_VERSION {
            return Err(format!("unsupported registry version {}", self.version));
        }
        for (key, history) in &self.entries {
            if history.is_empty() {
                return Err(format!("entry {key} has no proofs"));
            }
            for record in history {
                if record.file_path != *key {
                    return Err(format!(
                        "entry {key} contains a proof for {}",
                        record.file_path
                    ));
                }
                if !record.algorithm.is_valid_digest(&record.content_hash) {
                    return Err(format!(
                        "entry {key} has malformed {} hash {:?}",
                        record.algorithm, record.content_hash
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads and saves a [`Registry`] at a fixed path.
///
/// Saves replace the document atomically, but there is no locking: two
/// processes saving at once race and the last writer wins.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the registry. A missing document is an empty registry; an
    /// unreadable one is an error and is left untouched.
    pub fn load(&self) -> Result<Registry> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no registry yet, starting empty");
                return Ok(Registry::new());
            }
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                return Err(self.corrupt(format!("not UTF-8: {err}")));
            }
            Err(err) => return Err(ProofError::io(&self.path, err)),
        };

        let registry: Registry =
            serde_json::from_str(&contents).map_err(|err| self.corrupt(err.to_string()))?;
        registry.validate().map_err(|reason| self.corrupt(reason))?;

        debug!(
            path = %self.path.display(),
            files = registry.len(),
            proofs = registry.total_proofs(),
            "registry loaded"
        );
        Ok(registry)
    }

    /// Write the registry through a temporary file in the same directory,
    /// then rename it over the old document.
    pub fn save(&self, registry: &Registry) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| ProofError::io(&dir, err))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|err| ProofError::io(&dir, err))?;
        write_json(tmp.as_file_mut(), registry).map_err(|err| ProofError::io(tmp.path(), err))?;
        tmp.as_file()
            .sync_all()
            .map_err(|err| ProofError::io(tmp.path(), err))?;
        self.carry_permissions(tmp.as_file())
            .map_err(|err| ProofError::io(tmp.path(), err))?;
        tmp.persist(&self.path)
            .map_err(|err| ProofError::io(&self.path, err.error))?;

        debug!(
            path = %self.path.display(),
            files = registry.len(),
            "registry saved"
        );
        Ok(())
    }

    /// Give the replacement the current document's mode, or 0644 for a new
    /// registry. Temp files start out private to the owner.
    fn carry_permissions(&self, file: &File) -> io::Result<()> {
        match fs::metadata(&self.path) {
            Ok(meta) => file.set_permissions(meta.permissions()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let mut perms = file.metadata()?.permissions();
                    perms.set_mode(0o644);
                    file.set_permissions(perms)?;
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn corrupt(&self, reason: String) -> ProofError {
        ProofError::CorruptRegistry {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Pretty JSON with a trailing newline.
pub(crate) fn write_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
