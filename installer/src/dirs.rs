//! Directory resolution abstraction for platform-specific paths.
//!
//! [`BaseDirs`] lets configuration and PATH persistence ask for the home
//! and default binary directories without touching the real user
//! environment in tests.

use std::path::PathBuf;

/// Source of platform-specific base directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Return the user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Return the default directory for installed executables.
    ///
    /// - Linux: `$XDG_BIN_HOME` or `~/.local/bin`
    /// - macOS: `~/.local/bin`
    /// - Windows: `%LOCALAPPDATA%\science\bin`
    fn bin_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
///
/// Every lookup yields `None` when the platform reports no home directory.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    inner: Option<directories_next::BaseDirs>,
}

impl SystemBaseDirs {
    /// Resolve the current user's directories.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: directories_next::BaseDirs::new(),
        }
    }
}

impl Default for SystemBaseDirs {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        self.inner.as_ref().map(|dirs| dirs.home_dir().to_path_buf())
    }

    fn bin_dir(&self) -> Option<PathBuf> {
        let dirs = self.inner.as_ref()?;
        if cfg!(windows) {
            return Some(dirs.data_local_dir().join("science").join("bin"));
        }
        Some(
            dirs.executable_dir()
                .map_or_else(|| dirs.home_dir().join(".local").join("bin"), PathBuf::from),
        )
    }
}
