//! Error types for the science installer.
//!
//! Every fatal condition a run can hit is a variant of [`InstallerError`].
//! Each message names the URL or path involved so the user can act on it
//! without re-running in verbose mode.

use crate::fetch::FetchError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort an installation run.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The detected operating system or architecture is not recognised.
    #[error("unsupported platform: operating system \"{os}\", architecture \"{arch}\"")]
    UnsupportedPlatform {
        /// The raw operating system string as detected.
        os: String,
        /// The raw machine architecture string as detected.
        arch: String,
    },

    /// The platform was recognised but no release is published for it.
    #[error("no science release is published for {platform}")]
    UnsupportedCombination {
        /// Human-readable description of the platform.
        platform: String,
    },

    /// A fetch failed with a transport error or an unsuccessful status.
    #[error("failed to fetch {url}: {source}")]
    Network {
        /// The URL that could not be fetched.
        url: String,
        /// The underlying fetch failure.
        #[source]
        source: FetchError,
    },

    /// The digest file did not contain a usable SHA-256 value.
    #[error("invalid digest file at {digest_url}: {reason}")]
    InvalidDigestFile {
        /// The URL the digest file was fetched from.
        digest_url: String,
        /// Why the contents were rejected.
        reason: String,
    },

    /// The artifact did not hash to the published digest.
    #[error(
        "integrity check failed for {artifact_url} against {digest_url}: \
         expected sha256 {expected}, got {actual}"
    )]
    IntegrityFailure {
        /// The URL the artifact was fetched from.
        artifact_url: String,
        /// The URL the expected digest was fetched from.
        digest_url: String,
        /// The digest published in the digest file.
        expected: String,
        /// The digest computed over the fetched bytes.
        actual: String,
    },

    /// A filesystem operation on the destination failed.
    #[error("filesystem error at {path}: {reason}")]
    Filesystem {
        /// The path being created, written, or renamed.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The temporary workspace could not be created or used.
    #[error("temporary workspace error: {reason}")]
    Workspace {
        /// Description of the underlying failure.
        reason: String,
    },

    /// A command-line value was rejected during configuration.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the rejected value.
        reason: String,
    },
}

impl InstallerError {
    /// Build a [`InstallerError::Filesystem`] from a path and an I/O error.
    pub(crate) fn filesystem(path: impl Into<Utf8PathBuf>, err: &std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
