//! Scoped temporary workspace for one installation run.
//!
//! A [`Workspace`] owns a fresh directory under the system temp location.
//! It is removed when the guard is closed or dropped, including during
//! panic unwinding. While alive, its path is listed in a
//! [`WorkspaceRegistry`] so the interrupt handler can remove it before
//! the process exits. Intermediate files created outside the workspace
//! are listed the same way through a [`TrackedPath`].

use crate::error::{InstallerError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::TempDir;

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "science-install.";

static GLOBAL_REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();

/// Mutex-guarded list of live temporary directories and files.
#[derive(Debug)]
pub struct WorkspaceRegistry {
    live: Mutex<Vec<PathBuf>>,
}

impl WorkspaceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            live: Mutex::new(Vec::new()),
        }
    }

    /// Return the process-wide registry used by the interrupt handler.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_REGISTRY
    }

    fn register(&self, path: &Path) {
        self.lock().push(path.to_path_buf());
    }

    fn unregister(&self, path: &Path) {
        self.lock().retain(|live| live != path);
    }

    /// Return the currently registered paths.
    #[must_use]
    pub fn live(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// List `path` for removal on interrupt until the guard is dropped.
    #[must_use]
    pub fn track(&'static self, path: &Path) -> TrackedPath {
        self.register(path);
        log::trace!("tracking {}", path.display());
        TrackedPath {
            path: path.to_path_buf(),
            registry: self,
        }
    }

    /// Remove every registered path and empty the registry.
    ///
    /// Returns the paths that were removed. Failures are logged and
    /// otherwise ignored; this runs on the way out of the process.
    #[must_use]
    pub fn remove_all(&self) -> Vec<PathBuf> {
        let drained: Vec<PathBuf> = self.lock().drain(..).collect();
        drained
            .into_iter()
            .filter(|path| match remove_path(path) {
                Ok(()) => true,
                Err(e) => {
                    log::debug!("could not remove {}: {e}", path.display());
                    false
                }
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PathBuf>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Registration of a single path, removed from the registry on drop.
///
/// Dropping the guard does not delete the path; its owner does that.
#[derive(Debug)]
pub struct TrackedPath {
    path: PathBuf,
    registry: &'static WorkspaceRegistry,
}

impl TrackedPath {
    /// Return the tracked path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TrackedPath {
    fn drop(&mut self) {
        self.registry.unregister(&self.path);
    }
}

impl Default for WorkspaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard over the run's temporary directory.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    registry: &'static WorkspaceRegistry,
}

impl Workspace {
    /// Create a workspace registered with `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Workspace`] if the directory cannot be
    /// created.
    pub fn acquire_with(registry: &'static WorkspaceRegistry) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| InstallerError::Workspace {
                reason: format!("failed to create temporary directory: {e}"),
            })?;
        let path = dir.path().to_path_buf();
        registry.register(&path);
        log::trace!("acquired workspace {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
            registry,
        })
    }

    /// Return the workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the path of `name` inside the workspace.
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the workspace now, reporting failures.
    ///
    /// Returns the removed directory's path.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Workspace`] if removal fails.
    pub fn close(mut self) -> Result<PathBuf> {
        if let Some(dir) = self.dir.take() {
            self.registry.unregister(&self.path);
            dir.close().map_err(|e| InstallerError::Workspace {
                reason: format!("failed to remove {}: {e}", self.path.display()),
            })?;
            log::trace!("removed workspace {}", self.path.display());
        }
        Ok(self.path.clone())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            self.registry.unregister(&self.path);
            drop(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_is_created_and_registered() {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        let workspace = Workspace::acquire_with(&REGISTRY).expect("acquire");

        assert!(workspace.path().is_dir());
        assert_eq!(REGISTRY.live(), vec![workspace.path().to_path_buf()]);
        let name = workspace
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .expect("utf-8 name");
        assert!(name.starts_with(WORKSPACE_PREFIX));
    }

    #[test]
    fn close_removes_directory_and_unregisters() {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        let workspace = Workspace::acquire_with(&REGISTRY).expect("acquire");
        std::fs::write(workspace.file("artifact"), b"bytes").expect("write");

        let path = workspace.close().expect("close");

        assert!(!path.exists());
        assert!(REGISTRY.live().is_empty());
    }

    #[test]
    fn drop_removes_directory() {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        let path = {
            let workspace = Workspace::acquire_with(&REGISTRY).expect("acquire");
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
        assert!(REGISTRY.live().is_empty());
    }

    #[test]
    fn panic_unwinding_removes_directory() {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        let seen = std::sync::Mutex::new(None);
        let result = std::panic::catch_unwind(|| {
            let workspace = Workspace::acquire_with(&REGISTRY).expect("acquire");
            *seen.lock().expect("lock") = Some(workspace.path().to_path_buf());
            panic!("simulated failure");
        });
        assert!(result.is_err());
        let path = seen.lock().expect("lock").clone().expect("path recorded");
        assert!(!path.exists());
    }

    #[test]
    fn remove_all_drains_registry() {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        let workspace = Workspace::acquire_with(&REGISTRY).expect("acquire");
        let path = workspace.path().to_path_buf();

        let removed = REGISTRY.remove_all();

        assert_eq!(removed, vec![path.clone()]);
        assert!(!path.exists());
        assert!(REGISTRY.live().is_empty());
        drop(workspace);
    }

    #[test]
    fn tracked_files_are_removed_by_remove_all() {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        let dir = tempfile::tempdir().expect("temp dir");
        let staged = dir.path().join(".tmp-staged");
        std::fs::write(&staged, b"partial").expect("write");
        let tracked = REGISTRY.track(&staged);

        let removed = REGISTRY.remove_all();

        assert_eq!(removed, vec![staged.clone()]);
        assert!(!staged.exists());
        drop(tracked);
    }

    #[test]
    fn dropping_tracked_path_unregisters_without_deleting() {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        let dir = tempfile::tempdir().expect("temp dir");
        let kept = dir.path().join("science");
        std::fs::write(&kept, b"installed").expect("write");

        drop(REGISTRY.track(&kept));

        assert!(REGISTRY.live().is_empty());
        assert!(kept.exists());
    }
}
