//! Error taxonomy for proof generation and verification.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the proofing workflow.
///
/// None of these are retried: each aborts the current command.
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("registry {} is corrupt: {reason}", .path.display())]
    CorruptRegistry { path: PathBuf, reason: String },

    #[error("proof document {} is unreadable: {reason}", .path.display())]
    CorruptProof { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no proof recorded for {key}")]
    NoProof { key: String },

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("invalid file pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("invalid configuration {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },
}

impl ProofError {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        ProofError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Like [`ProofError::io`], but a missing file becomes [`ProofError::NotFound`].
    pub(crate) fn input(path: impl AsRef<Path>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ProofError::NotFound {
                path: path.as_ref().to_path_buf(),
            }
        } else {
            ProofError::io(path, source)
        }
    }
}

pub type Result<T, E = ProofError> = std::result::Result<T, E>;
