//! Download URL resolution for science releases.
//!
//! - [`version`]: which release ([`ReleaseRef`]).
//! - [`naming`]: asset filenames ([`ArtifactName`], [`Variant`]).
//!
//! [`DownloadTarget::resolve`] combines them with a base URL. The digest
//! always lives next to the artifact with a `.sha256` suffix.

pub mod naming;
pub mod version;

pub use naming::{ARTIFACT, ArtifactName, Variant};
pub use version::ReleaseRef;

/// Where releases are published unless a mirror is configured.
pub const DEFAULT_BASE_URL: &str = "https://github.com/a-scie/lift/releases";

/// Suffix of the detached digest file.
pub const DIGEST_SUFFIX: &str = ".sha256";

/// The pair of URLs fetched for one install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// URL of the artifact itself.
    pub artifact_url: String,
    /// URL of the detached SHA-256 digest file.
    pub digest_url: String,
    /// The asset filename, also used for the workspace copy.
    pub filename: String,
}

impl DownloadTarget {
    /// Compute the artifact and digest URLs for `name` under `release`.
    ///
    /// Trailing slashes on `base_url` are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::platform::Platform;
    /// use science_installer::release::{
    ///     ArtifactName, DEFAULT_BASE_URL, DownloadTarget, ReleaseRef, Variant,
    /// };
    ///
    /// let name = ArtifactName::new(Variant::Fat, Platform::LinuxX86_64);
    /// let target = DownloadTarget::resolve(DEFAULT_BASE_URL, &ReleaseRef::Latest, &name);
    /// assert_eq!(
    ///     target.artifact_url,
    ///     "https://github.com/a-scie/lift/releases/latest/download/science-fat-linux-x86_64"
    /// );
    /// assert_eq!(target.digest_url, format!("{}.sha256", target.artifact_url));
    /// ```
    #[must_use]
    pub fn resolve(base_url: &str, release: &ReleaseRef, name: &ArtifactName) -> Self {
        let filename = name.filename();
        let artifact_url = format!(
            "{}/{}/{filename}",
            base_url.trim_end_matches('/'),
            release.url_path()
        );
        let digest_url = format!("{artifact_url}{DIGEST_SUFFIX}");
        Self {
            artifact_url,
            digest_url,
            filename,
        }
    }

    /// Return the filename of the digest file.
    #[must_use]
    pub fn digest_filename(&self) -> String {
        format!("{}{DIGEST_SUFFIX}", self.filename)
    }
}
