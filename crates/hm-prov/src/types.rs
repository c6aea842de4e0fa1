//! Proof data structures.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use hm_hash::{ContentFingerprint, HashAlgorithm};
use serde::{Deserialize, Serialize};

/// Tag written into every standalone proof document.
pub const PROOF_DOCUMENT_KIND: &str = "copyright_proof";

/// Format version of standalone proof documents.
pub const PROOF_DOCUMENT_VERSION: u32 = 1;

/// Free-text annotations attached to a proof at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofLabels {
    pub project: Option<String>,
    pub client: Option<String>,
    pub description: Option<String>,
}

impl ProofLabels {
    /// Labels carrying only a project name.
    pub fn project(label: impl Into<String>) -> Self {
        Self {
            project: Some(label.into()),
            ..Self::default()
        }
    }
}

/// A timestamped attestation binding a file to its digest.
///
/// Records are never edited once written. A changed file gets a new record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    /// Registry key of the protected file (relative to the content root when possible)
    pub file_path: Utf8PathBuf,

    /// Hex digest of the file's bytes at proof time
    pub content_hash: String,

    /// Algorithm that produced `content_hash`; documents without it predate
    /// the field and are SHA-256
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// UTC creation time, millisecond precision
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// File size at proof time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// File name of the standalone proof document written with this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_document: Option<String>,
}

impl ProofRecord {
    /// Short digest prefix for display and package names.
    pub fn short_hash(&self) -> &str {
        let end = self.content_hash.len().min(16);
        &self.content_hash[..end]
    }
}

/// Standalone proof written once per protect run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProofDocument {
    pub kind: String,
    pub version: u32,
    #[serde(flatten)]
    pub record: ProofRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<ContentFingerprint>,
}

impl ProofDocument {
    pub fn new(record: ProofRecord, fingerprint: ContentFingerprint) -> Self {
        Self {
            kind: PROOF_DOCUMENT_KIND.to_string(),
            version: PROOF_DOCUMENT_VERSION,
            record,
            fingerprint: Some(fingerprint),
        }
    }
}
