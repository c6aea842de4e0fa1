//! Copyright proofs for static content.
//!
//! A proof binds a file's SHA-256 digest to the moment it was taken. Proofs
//! are appended to a JSON registry and also written as standalone documents,
//! so a file can later be checked against either.
//!
//! The registry is replaced atomically on every save but is not locked.
//! Two invocations writing at the same time race and the last writer wins;
//! the loser's proof documents remain on disk but its registry entries are
//! lost.
//!
//! # Example
//!
//! ```
//! use hm_prov::{ProofLabels, Vault, VaultConfig, VerifyStatus};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let page = dir.path().join("alfa-clinic-bold.html");
//! std::fs::write(&page, "<html>Alfa Clinic</html>").unwrap();
//!
//! let vault = Vault::open(VaultConfig {
//!     base_dir: dir.path().join("system"),
//!     root: dir.path().to_path_buf(),
//!     ..VaultConfig::default()
//! });
//!
//! let outcome = vault.protect(&page, &ProofLabels::project("Alfa Clinic")).unwrap();
//! assert_eq!(outcome.record.content_hash.len(), 64);
//!
//! let check = vault.verify(&page).unwrap();
//! assert_eq!(check.status, VerifyStatus::Match);
//! ```

mod config;
mod error;
mod export;
mod registry;
mod report;
mod types;
mod vault;
mod verify;

pub use config::{VaultConfig, CONFIG_FILE_NAME, DEFAULT_SKIP_DIRS};
pub use error::{ProofError, Result};
pub use export::SUMMARY_FILE_NAME;
pub use registry::{Registry, RegistryStore, REGISTRY_VERSION};
pub use report::{Report, ReportLine};
pub use types::{
    ProofDocument, ProofLabels, ProofRecord, PROOF_DOCUMENT_KIND, PROOF_DOCUMENT_VERSION,
};
pub use vault::{BatchFailure, BatchReport, ProofOutcome, Vault};
pub use verify::{compare, load_document, Verification, VerifyStatus};

pub use hm_hash::{ContentFingerprint, HashAlgorithm};
