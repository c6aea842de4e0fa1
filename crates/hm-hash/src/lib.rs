//! Content digests for protected files.
//!
//! Every proof records the algorithm that produced its digest, so a
//! verifier always rehashes with the algorithm the proof was made with.
//! SHA-256 is the only algorithm today.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

type HashState = Sha256;

/// Number of leading and trailing bytes covered by [`ContentFingerprint`].
pub const FINGERPRINT_WINDOW: usize = 100;

/// Digest algorithm identifier stored alongside every hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "sha-256")]
    Sha256,
}

impl HashAlgorithm {
    /// Length of a hex-encoded digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
        }
    }

    /// Digest an in-memory buffer.
    pub fn digest_bytes(self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => {
                let mut hasher = HashState::new();
                hasher.update(bytes);
                hex::encode(hasher.finalize())
            }
        }
    }

    /// Digest everything a reader yields without buffering it whole.
    pub fn digest_reader<R: Read>(self, reader: &mut R) -> io::Result<String> {
        match self {
            HashAlgorithm::Sha256 => {
                let mut hasher = HashState::new();
                io::copy(reader, &mut hasher)?;
                Ok(hex::encode(hasher.finalize()))
            }
        }
    }

    /// Digest a reader and fingerprint its content in the same pass. Only
    /// the fingerprint windows are held in memory.
    pub fn digest_with_fingerprint<R: Read>(
        self,
        reader: &mut R,
    ) -> io::Result<(String, ContentFingerprint)> {
        let mut fingerprinter = Fingerprinter::new();
        let mut buf = [0u8; 8 * 1024];
        match self {
            HashAlgorithm::Sha256 => {
                let mut hasher = HashState::new();
                loop {
                    let n = match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => n,
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                        Err(err) => return Err(err),
                    };
                    hasher.update(&buf[..n]);
                    fingerprinter.update(&buf[..n]);
                }
                Ok((hex::encode(hasher.finalize()), fingerprinter.finish()))
            }
        }
    }

    /// Digest the bytes of a file on disk.
    pub fn digest_file<P: AsRef<Path>>(self, path: P) -> io::Result<String> {
        let mut reader = BufReader::new(File::open(path)?);
        self.digest_reader(&mut reader)
    }

    /// Check that `value` looks like a digest from this algorithm:
    /// lowercase hex of the right length.
    pub fn is_valid_digest(self, value: &str) -> bool {
        value.len() == self.hex_len()
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => f.write_str("SHA-256"),
        }
    }
}

/// SHA-256 of a byte buffer, hex encoded.
pub fn sha256_hex(bytes: &[u8]) -> String {
    HashAlgorithm::Sha256.digest_bytes(bytes)
}

/// Partial digests and counts that help identify a work even when only a
/// fragment of it is at hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFingerprint {
    pub head_sha256: String,
    pub tail_sha256: String,
    pub total_bytes: u64,
    pub total_lines: u64,
}

/// Fingerprint a buffer.
///
/// A trailing line without a newline still counts as a line; an empty
/// buffer has zero lines.
pub fn fingerprint(bytes: &[u8]) -> ContentFingerprint {
    let mut fingerprinter = Fingerprinter::new();
    fingerprinter.update(bytes);
    fingerprinter.finish()
}

/// Incremental [`ContentFingerprint`] over content fed in chunks.
#[derive(Debug, Clone, Default)]
pub struct Fingerprinter {
    head: Vec<u8>,
    tail: Vec<u8>,
    total_bytes: u64,
    newlines: u64,
    last: Option<u8>,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        let Some(&last) = chunk.last() else {
            return;
        };
        let room = FINGERPRINT_WINDOW - self.head.len();
        self.head.extend_from_slice(&chunk[..chunk.len().min(room)]);

        let keep = chunk.len().min(FINGERPRINT_WINDOW);
        self.tail.extend_from_slice(&chunk[chunk.len() - keep..]);
        let excess = self.tail.len().saturating_sub(FINGERPRINT_WINDOW);
        self.tail.drain(..excess);

        self.total_bytes += chunk.len() as u64;
        self.newlines += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
        self.last = Some(last);
    }

    pub fn finish(self) -> ContentFingerprint {
        let unterminated = u64::from(self.last.is_some_and(|b| b != b'\n'));
        ContentFingerprint {
            head_sha256: sha256_hex(&self.head),
            tail_sha256: sha256_hex(&self.tail),
            total_bytes: self.total_bytes,
            total_lines: self.newlines + unterminated,
        }
    }
}
