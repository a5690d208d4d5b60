//! Search-path inspection and update.
//!
//! The inherited `PATH` is captured once as a [`PathSnapshot`]. Membership
//! checks and the updated value are computed from that snapshot; the only
//! write-back goes through [`PathPersister::apply`].

pub mod persist;

pub use persist::{PathPersister, PathUpdateError, SystemPathPersister};

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Immutable capture of the search path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSnapshot {
    entries: Vec<PathBuf>,
}

impl PathSnapshot {
    /// Capture the current process's `PATH`.
    #[must_use]
    pub fn capture() -> Self {
        std::env::var_os("PATH").map_or_else(Self::default, |value| Self::from_value(&value))
    }

    /// Build a snapshot from a raw `PATH` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::path_env::PathSnapshot;
    /// use std::path::Path;
    ///
    /// let value = std::env::join_paths(["/usr/bin", "/opt/bin/"]).expect("joinable");
    /// let snapshot = PathSnapshot::from_value(&value);
    /// assert!(snapshot.contains(Path::new("/opt/bin")));
    /// assert!(!snapshot.contains(Path::new("/opt")));
    /// ```
    #[must_use]
    pub fn from_value(value: &OsStr) -> Self {
        Self {
            entries: std::env::split_paths(value)
                .filter(|entry| !entry.as_os_str().is_empty())
                .collect(),
        }
    }

    /// Return the captured entries in order.
    #[must_use]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Whether `dir` is one of the entries.
    ///
    /// Entries are compared component by component, so trailing
    /// separators do not matter. Windows comparisons ignore ASCII case.
    #[must_use]
    pub fn contains(&self, dir: &Path) -> bool {
        self.entries.iter().any(|entry| same_dir(entry, dir))
    }

    /// Compute the value of `PATH` with `dir` in front.
    ///
    /// # Errors
    ///
    /// Returns [`PathUpdateError::Join`] if `dir` contains the platform's
    /// path-list separator.
    pub fn prepended(&self, dir: &Path) -> Result<OsString, PathUpdateError> {
        std::env::join_paths(std::iter::once(dir).chain(self.entries.iter().map(PathBuf::as_path)))
            .map_err(|e| PathUpdateError::Join {
                reason: e.to_string(),
            })
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if cfg!(windows) {
        let a: Vec<String> = lowered_components(a);
        let b: Vec<String> = lowered_components(b);
        a == b
    } else {
        a.components().eq(b.components())
    }
}

fn lowered_components(path: &Path) -> Vec<String> {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_ascii_lowercase())
        .collect()
}

/// Manual instructions for putting `bin_dir` on the search path.
#[must_use]
pub fn manual_instructions(bin_dir: &Path) -> String {
    if cfg!(windows) {
        format!(
            concat!(
                "Add the following directory to your PATH:\n",
                "  {dir}\n\n",
                "Or run in PowerShell:\n",
                "  [Environment]::SetEnvironmentVariable(",
                "\"PATH\", \"{dir};$env:PATH\", \"User\")"
            ),
            dir = bin_dir.display()
        )
    } else {
        format!(
            concat!(
                "Add the following to your shell profile (~/.bashrc or ~/.zshrc):\n",
                "  export PATH=\"{}:$PATH\""
            ),
            bin_dir.display()
        )
    }
}

#[cfg(test)]
mod tests;
