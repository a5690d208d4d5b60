//! Integrity verification of fetched artifacts.
//!
//! The artifact is trusted only when its SHA-256 matches the digest
//! published alongside it. Nothing is installed before
//! [`verify_artifact`] succeeds.

pub mod digest_file;
pub mod sha256_digest;

pub use digest_file::parse_digest_file;
pub use sha256_digest::{DigestError, Sha256Digest};

use crate::error::{InstallerError, Result};
use crate::release::DownloadTarget;
use std::fs::File;
use std::path::Path;

/// Compute the SHA-256 digest of a file.
///
/// # Errors
///
/// Returns [`InstallerError::Workspace`] if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<Sha256Digest> {
    File::open(path)
        .and_then(Sha256Digest::of_reader)
        .map_err(|e| InstallerError::Workspace {
            reason: format!("failed to read {}: {e}", path.display()),
        })
}

/// Check the fetched artifact against the fetched digest file.
///
/// Returns the verified digest on success.
///
/// # Errors
///
/// - [`InstallerError::InvalidDigestFile`] when the digest file is not
///   UTF-8 or holds no usable digest.
/// - [`InstallerError::IntegrityFailure`] when the hashes differ.
pub fn verify_artifact(
    artifact: &Path,
    digest_file: &Path,
    target: &DownloadTarget,
) -> Result<Sha256Digest> {
    let contents =
        std::fs::read_to_string(digest_file).map_err(|e| InstallerError::InvalidDigestFile {
            digest_url: target.digest_url.clone(),
            reason: e.to_string(),
        })?;
    let expected = parse_digest_file(&contents).map_err(|e| InstallerError::InvalidDigestFile {
        digest_url: target.digest_url.clone(),
        reason: e.reason().to_owned(),
    })?;
    let actual = compute_sha256(artifact)?;
    log::debug!("expected sha256 {expected}, computed {actual}");
    if actual != expected {
        return Err(InstallerError::IntegrityFailure {
            artifact_url: target.artifact_url.clone(),
            digest_url: target.digest_url.clone(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(actual)
}
