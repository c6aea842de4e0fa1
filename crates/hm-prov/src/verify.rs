//! Checking files against their recorded proofs.

use crate::error::{ProofError, Result};
use crate::types::{ProofDocument, ProofRecord, PROOF_DOCUMENT_KIND};
use crate::vault::Vault;
use camino::Utf8PathBuf;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of comparing a file with its proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VerifyStatus {
    /// Current content hashes to the recorded digest.
    Match,
    /// Content changed since the proof was recorded.
    Mismatch,
    /// No proof exists for this file.
    NoProofFound,
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VerifyStatus::Match => "MATCH",
            VerifyStatus::Mismatch => "MISMATCH",
            VerifyStatus::NoProofFound => "NO PROOF FOUND",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub file_path: Utf8PathBuf,
    pub status: VerifyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    pub actual_hash: String,
    /// The proof that was checked against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofRecord>,
}

impl Verification {
    pub fn is_match(&self) -> bool {
        self.status == VerifyStatus::Match
    }
}

/// Hash `path` and compare it with `proof`, if any.
///
/// The file is hashed with the proof's algorithm so that proofs keep
/// verifying if the default algorithm ever changes.
pub fn compare(path: &Path, key: Utf8PathBuf, proof: Option<ProofRecord>) -> Result<Verification> {
    let algorithm = proof
        .as_ref()
        .map(|p| p.algorithm)
        .unwrap_or_default();
    let actual_hash = algorithm
        .digest_file(path)
        .map_err(|err| ProofError::input(path, err))?;

    let (status, expected_hash) = match &proof {
        None => (VerifyStatus::NoProofFound, None),
        Some(p) if p.content_hash == actual_hash => {
            (VerifyStatus::Match, Some(p.content_hash.clone()))
        }
        Some(p) => (VerifyStatus::Mismatch, Some(p.content_hash.clone())),
    };

    Ok(Verification {
        file_path: key,
        status,
        expected_hash,
        actual_hash,
        proof,
    })
}

/// Parse a standalone proof document.
pub fn load_document(path: &Path) -> Result<ProofDocument> {
    let contents = fs::read_to_string(path).map_err(|err| ProofError::input(path, err))?;
    let document: ProofDocument =
        serde_json::from_str(&contents).map_err(|err| ProofError::CorruptProof {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    if document.kind != PROOF_DOCUMENT_KIND {
        return Err(ProofError::CorruptProof {
            path: path.to_path_buf(),
            reason: format!(
                "document kind is {:?}, expected {PROOF_DOCUMENT_KIND:?}",
                document.kind
            ),
        });
    }
    let record = &document.record;
    if !record.algorithm.is_valid_digest(&record.content_hash) {
        return Err(ProofError::CorruptProof {
            path: path.to_path_buf(),
            reason: format!("malformed {} hash {:?}", record.algorithm, record.content_hash),
        });
    }
    Ok(document)
}

impl Vault {
    /// Compare a file with its most recent registry proof. Never writes.
    pub fn verify(&self, path: &Path) -> Result<Verification> {
        let key = self.key_for(path)?;
        let proof = self.store().load()?.latest(&key).cloned();
        let verification = compare(path, key, proof)?;
        log_outcome(&verification);
        Ok(verification)
    }

    /// Compare a file with an explicit proof document, bypassing the registry.
    ///
    /// A document recorded for another path is still compared, with a
    /// warning.
    pub fn verify_with_document(&self, path: &Path, document: &Path) -> Result<Verification> {
        let key = self.key_for(path)?;
        let proof = load_document(document)?.record;
        if proof.file_path != key {
            warn!(
                file = %key,
                proved = %proof.file_path,
                document = %document.display(),
                "proof document was recorded for a different path"
            );
        }
        let verification = compare(path, key, Some(proof))?;
        log_outcome(&verification);
        Ok(verification)
    }
}

fn log_outcome(v: &Verification) {
    info!(
        file = %v.file_path,
        status = %v.status,
        actual = %v.actual_hash,
        expected = v.expected_hash.as_deref().unwrap_or("-"),
        "verified"
    );
}
