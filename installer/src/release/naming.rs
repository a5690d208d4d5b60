//! Release asset naming.
//!
//! Asset names follow `<artifact>[-fat]-<platform>[.exe]`, for example
//! `science-fat-linux-x86_64` or `science-windows-aarch64.exe`. The name
//! is part of the release contract with the artifact host, so it is built
//! in exactly one place.

use crate::platform::Platform;
use std::fmt;

/// The artifact published by every release.
pub const ARTIFACT: &str = "science";

/// Which build of the artifact to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Variant {
    /// Self-contained build embedding its interpreter.
    #[default]
    Fat,
    /// Smaller build that fetches its interpreter on first run.
    Thin,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fat => f.write_str("fat"),
            Self::Thin => f.write_str("thin"),
        }
    }
}

/// A fully-qualified release asset name.
///
/// # Examples
///
/// ```
/// use science_installer::platform::Platform;
/// use science_installer::release::{ArtifactName, Variant};
///
/// let name = ArtifactName::new(Variant::Fat, Platform::MacosAarch64);
/// assert_eq!(name.to_string(), "science-fat-macos-aarch64");
///
/// let thin = ArtifactName::new(Variant::Thin, Platform::WindowsX86_64);
/// assert_eq!(thin.to_string(), "science-windows-x86_64.exe");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactName {
    variant: Variant,
    platform: Platform,
}

impl ArtifactName {
    /// Create a name for the given variant and platform.
    #[must_use]
    pub const fn new(variant: Variant, platform: Platform) -> Self {
        Self { variant, platform }
    }

    /// Return the platform component.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Return the variant component.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    /// Return the asset filename.
    #[must_use]
    pub fn filename(&self) -> String {
        let variant = match self.variant {
            Variant::Fat => "-fat",
            Variant::Thin => "",
        };
        format!(
            "{ARTIFACT}{variant}-{}{}",
            self.platform.release_token(),
            self.platform.exe_extension()
        )
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename())
    }
}
