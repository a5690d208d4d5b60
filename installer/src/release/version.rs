//! Release selection: the latest release or an explicit version.

use crate::error::InstallerError;
use semver::Version;
use std::fmt;
use std::str::FromStr;

/// Which release to install.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReleaseRef {
    /// Whatever the release host currently marks as latest.
    #[default]
    Latest,
    /// A specific semantic version.
    Version(Version),
}

impl ReleaseRef {
    /// Return the URL path segment that selects this release.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::release::ReleaseRef;
    ///
    /// assert_eq!(ReleaseRef::Latest.url_path(), "latest/download");
    /// let pinned: ReleaseRef = "v0.7.0".parse().expect("valid version");
    /// assert_eq!(pinned.url_path(), "download/v0.7.0");
    /// ```
    #[must_use]
    pub fn url_path(&self) -> String {
        match self {
            Self::Latest => "latest/download".to_owned(),
            Self::Version(version) => format!("download/v{version}"),
        }
    }
}

impl FromStr for ReleaseRef {
    type Err = InstallerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        Version::parse(bare)
            .map(Self::Version)
            .map_err(|e| InstallerError::InvalidArgument {
                reason: format!("invalid release version \"{value}\": {e}"),
            })
    }
}

impl fmt::Display for ReleaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Version(version) => write!(f, "{version}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("latest")]
    #[case("LATEST")]
    #[case(" latest ")]
    fn latest_is_case_insensitive(#[case] input: &str) {
        assert_eq!(input.parse::<ReleaseRef>().expect("valid"), ReleaseRef::Latest);
    }

    #[rstest]
    #[case("0.7.0", "0.7.0")]
    #[case("v0.12.3", "0.12.3")]
    #[case("1.0.0-rc.1", "1.0.0-rc.1")]
    fn explicit_versions_parse(#[case] input: &str, #[case] expected: &str) {
        let parsed: ReleaseRef = input.parse().expect("valid version");
        assert_eq!(parsed.to_string(), expected);
    }

    #[rstest]
    #[case("0.7")]
    #[case("seven")]
    #[case("")]
    fn malformed_versions_are_rejected(#[case] input: &str) {
        let err = input.parse::<ReleaseRef>().expect_err("invalid version");
        assert!(matches!(err, InstallerError::InvalidArgument { .. }));
    }
}
