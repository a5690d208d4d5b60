//! Parsing of detached `.sha256` files.
//!
//! Release digest files use the `sha256sum` layout, `<hex> *<filename>`.
//! Only the leading token of the first line matters.

use super::sha256_digest::{DigestError, Sha256Digest};

const BOM: char = '\u{feff}';

/// Extract the published digest from the text of a digest file.
///
/// # Errors
///
/// Returns [`DigestError`] when the file is empty or its first token is
/// not a 64-digit hex string.
///
/// # Examples
///
/// ```
/// use science_installer::verify::parse_digest_file;
///
/// let hex = "ab".repeat(32);
/// let body = format!("{hex} *science-fat-linux-x86_64\r\n");
/// assert_eq!(parse_digest_file(&body).expect("valid").as_str(), hex);
/// ```
pub fn parse_digest_file(contents: &str) -> Result<Sha256Digest, DigestError> {
    let body = contents.strip_prefix(BOM).unwrap_or(contents);
    let first_line = body.lines().next().unwrap_or_default();
    let first_line = first_line.strip_suffix('\r').unwrap_or(first_line);
    let token = first_line
        .split_whitespace()
        .next()
        .ok_or_else(|| DigestError::new("first line holds no digest"))?;
    Sha256Digest::parse_published(token)
}
