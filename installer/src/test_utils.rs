//! Shared test utilities for the installer crate.
//!
//! Available to unit tests and, through the `test-support` feature, to
//! integration tests.

use crate::fetch::{FetchError, Fetcher};
use crate::path_env::{PathPersister, PathUpdateError};
use crate::platform::{PlatformProbe, RawPlatform};
use crate::release::{ArtifactName, DownloadTarget, ReleaseRef};
use crate::verify::Sha256Digest;
use camino::Utf8Path;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256Digest::of_reader(bytes)
        .map(|digest| digest.to_string())
        .unwrap_or_default()
}

/// Contents of a `sha256sum`-style digest file for `bytes`.
#[must_use]
pub fn digest_file_body(bytes: &[u8], filename: &str) -> String {
    format!("{} *{filename}\n", sha256_hex(bytes))
}

/// What a [`StubFetcher`] serves for one URL.
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Write these bytes to the destination.
    Body(Vec<u8>),
    /// Fail with an HTTP status.
    Status(u16),
}

/// A [`Fetcher`] serving canned responses and recording requests.
///
/// Unknown URLs answer with [`FetchError::NotFound`].
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, StubResponse>,
    requested: Mutex<Vec<String>>,
    destinations: Mutex<Vec<PathBuf>>,
}

impl StubFetcher {
    /// Create a fetcher with no responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`.
    #[must_use]
    pub fn with(mut self, url: &str, response: StubResponse) -> Self {
        self.responses.insert(url.to_owned(), response);
        self
    }

    /// Serve `artifact` and a matching digest file for `target`.
    #[must_use]
    pub fn serving(self, target: &DownloadTarget, artifact: &[u8]) -> Self {
        let digest = digest_file_body(artifact, &target.filename);
        self.with(&target.artifact_url, StubResponse::Body(artifact.to_vec()))
            .with(&target.digest_url, StubResponse::Body(digest.into_bytes()))
    }

    /// Return every URL requested so far, sorted.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        let mut urls = self
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        urls.sort();
        urls
    }

    /// Return every destination path written to or attempted so far.
    #[must_use]
    pub fn destinations(&self) -> Vec<PathBuf> {
        self.destinations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Fetcher for StubFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_owned());
        self.destinations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dest.to_path_buf());
        match self.responses.get(url) {
            Some(StubResponse::Body(bytes)) => Ok(std::fs::write(dest, bytes)?),
            Some(StubResponse::Status(code)) => Err(FetchError::Status {
                url: url.to_owned(),
                code: *code,
            }),
            None => Err(FetchError::NotFound {
                url: url.to_owned(),
            }),
        }
    }
}

/// A [`PlatformProbe`] returning fixed raw values.
#[derive(Debug, Clone)]
pub struct FixedProbe(pub RawPlatform);

impl FixedProbe {
    /// Probe reporting `kernel` and `machine` with glibc.
    #[must_use]
    pub fn new(kernel: &str, machine: &str) -> Self {
        Self(RawPlatform {
            kernel: kernel.to_owned(),
            machine: machine.to_owned(),
            musl: false,
        })
    }
}

impl PlatformProbe for FixedProbe {
    fn probe(&self) -> RawPlatform {
        self.0.clone()
    }
}

/// A [`PathPersister`] that records calls instead of touching the system.
#[derive(Debug, Default)]
pub struct RecordingPersister {
    fail_with: Option<String>,
    persisted: Mutex<Vec<String>>,
    applied: Mutex<Vec<OsString>>,
}

impl RecordingPersister {
    /// Create a persister whose writes succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a persister whose writes fail with `reason`.
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_owned()),
            ..Self::default()
        }
    }

    /// Directories passed to [`PathPersister::persist`].
    #[must_use]
    pub fn persisted(&self) -> Vec<String> {
        self.persisted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Values passed to [`PathPersister::apply`].
    #[must_use]
    pub fn applied(&self) -> Vec<OsString> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PathPersister for RecordingPersister {
    fn persist(&self, dir: &Utf8Path) -> Result<String, PathUpdateError> {
        self.persisted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dir.to_string());
        match &self.fail_with {
            Some(reason) => Err(PathUpdateError::Registry {
                reason: reason.clone(),
            }),
            None => Ok("test profile".to_owned()),
        }
    }

    fn apply(&self, value: &OsStr) {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value.to_os_string());
    }
}

/// A release mirror laid out on the local filesystem.
///
/// Files are placed so that `file://<root>` works as a base URL.
#[derive(Debug)]
pub struct Mirror {
    root: PathBuf,
}

impl Mirror {
    /// Use `root` as the mirror directory.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Return the percent-encoded `file://` base URL of this mirror.
    #[must_use]
    pub fn base_url(&self) -> String {
        url::Url::from_directory_path(&self.root).map_or_else(
            |()| format!("file://{}", self.root.display()),
            |url| url.as_str().trim_end_matches('/').to_owned(),
        )
    }

    /// Publish `bytes` and a digest file for `name` under `release`.
    ///
    /// When `digest_of` is given, the digest file describes those bytes
    /// instead, producing a mismatch.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing the mirror.
    pub fn publish(
        &self,
        release: &ReleaseRef,
        name: &ArtifactName,
        bytes: &[u8],
        digest_of: Option<&[u8]>,
    ) -> std::io::Result<()> {
        let dir = self.root.join(release.url_path());
        std::fs::create_dir_all(&dir)?;
        let filename = name.filename();
        std::fs::write(dir.join(&filename), bytes)?;
        let digest = digest_file_body(digest_of.unwrap_or(bytes), &filename);
        std::fs::write(dir.join(format!("{filename}.sha256")), digest)
    }
}
