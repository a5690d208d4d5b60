//! SHA-256 digest newtype.
//!
//! Holds a 64-character lowercase hexadecimal string. Published digests
//! may use either case, so [`Sha256Digest::parse_published`] normalises
//! before validating; values built any other way must already be lowercase.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;

/// Expected length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Why a digest string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct DigestError {
    reason: String,
}

impl DigestError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Return the human-readable rejection reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use science_installer::verify::Sha256Digest;
///
/// let digest = Sha256Digest::of_reader(&b"abc"[..]).expect("in-memory read");
/// assert_eq!(
///     digest.as_str(),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Hash everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Returns any error raised while reading.
    pub fn of_reader(mut reader: impl Read) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        std::io::copy(&mut reader, &mut hasher)?;
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Accept a digest in either case and normalise it to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] unless `value` is exactly 64 hex digits.
    pub fn parse_published(value: &str) -> Result<Self, DigestError> {
        Self::try_from(value.to_ascii_lowercase())
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_sha256(value: &str) -> Result<(), DigestError> {
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DigestError::new(format!("non-hex character '{bad}'")));
    }
    if value.len() != DIGEST_HEX_LEN {
        return Err(DigestError::new(format!(
            "expected {DIGEST_HEX_LEN} hex characters, got {}",
            value.len()
        )));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(DigestError::new("digest must be lowercase"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn hashes_known_fixture() {
        let digest = Sha256Digest::of_reader(&b"abc"[..]).expect("in-memory read");
        assert_eq!(
            digest.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hashes_empty_input() {
        let digest = Sha256Digest::of_reader(std::io::empty()).expect("empty read");
        assert_eq!(
            digest.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[rstest]
    #[case::too_short("abcdef", "expected 64")]
    #[case::non_hex("zz", "non-hex")]
    #[case::uppercase(&"A".repeat(64), "lowercase")]
    fn strict_parse_rejects(#[case] value: &str, #[case] fragment: &str) {
        let err = Sha256Digest::try_from(value).expect_err("invalid digest");
        assert!(err.reason().contains(fragment), "{err}");
    }

    #[test]
    fn published_digests_are_case_insensitive() {
        let digest = Sha256Digest::parse_published(&"AB".repeat(32)).expect("valid hex");
        assert_eq!(digest.as_str(), "ab".repeat(32));
    }

    #[test]
    fn published_digest_still_checks_length() {
        assert!(Sha256Digest::parse_published(&"a".repeat(65)).is_err());
    }
}
