//! Retrieval of release assets into the workspace.
//!
//! [`Fetcher`] is the seam between the install pipeline and the transport;
//! [`HttpFetcher`] is the production implementation and
//! [`RetryingFetcher`] wraps any fetcher with the bounded retry policy.

pub mod auth;
pub mod http;
pub mod retry;

pub use auth::AuthConfig;
pub use http::HttpFetcher;
pub use retry::{RetryPolicy, RetryingFetcher};

use std::path::Path;

/// HTTP statuses worth retrying.
const TRANSIENT_STATUSES: &[u16] = &[408, 500, 502, 503, 504];

/// Trait for fetching a URL into a local file.
///
/// Implementations must be shareable across threads because the digest
/// and the artifact are fetched concurrently.
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher: Sync {
    /// Fetch `url` and write the complete body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails, the server answers with a
    /// non-success status, or `dest` cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Errors arising from a single fetch.
///
/// Messages omit the URL; callers wrap these in
/// [`crate::error::InstallerError::Network`], which names it.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The asset does not exist (HTTP 404 or a missing `file://` path).
    #[error("not found")]
    NotFound {
        /// The URL that was requested.
        url: String,
    },

    /// The server answered with an unsuccessful status other than 404.
    #[error("server responded with HTTP {code}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        code: u16,
    },

    /// The request did not complete.
    #[error("{reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
        /// Whether the failure was a timeout.
        timed_out: bool,
    },

    /// The credentials configured for the host cannot be used.
    #[error("invalid credentials: {source}")]
    Auth {
        /// The URL that was requested.
        url: String,
        /// Why the credentials were rejected.
        source: auth::AuthError,
    },

    /// The body could not be written to disk.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Whether another attempt might succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::fetch::FetchError;
    ///
    /// let busy = FetchError::Status { url: "https://example.test".into(), code: 503 };
    /// assert!(busy.is_transient());
    /// let gone = FetchError::NotFound { url: "https://example.test".into() };
    /// assert!(!gone.is_transient());
    /// ```
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { code, .. } => TRANSIENT_STATUSES.contains(code),
            Self::Transport { timed_out, .. } => *timed_out,
            Self::NotFound { .. } | Self::Auth { .. } | Self::Io(_) => false,
        }
    }
}
