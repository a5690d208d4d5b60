//! Atomic placement of the verified artifact.
//!
//! The verified file is made executable and renamed into place. When the
//! rename cannot work (the workspace sits on another filesystem), the
//! bytes are copied into a temporary file beside the destination,
//! flushed, and that file is renamed over the final path. Readers of the
//! destination never observe a partial file.

use crate::error::{InstallerError, Result};
use crate::platform::Platform;
use crate::workspace::{TrackedPath, WorkspaceRegistry};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

/// Default installed filename.
pub const DEFAULT_BASE_NAME: &str = "science";

/// Where the artifact ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallDestination {
    dir: Utf8PathBuf,
    file_name: String,
}

impl InstallDestination {
    /// Validate `base_name` and combine it with `dir`.
    ///
    /// Windows targets gain an `.exe` extension when the name lacks one.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidArgument`] when `base_name` is
    /// empty or contains a path separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use science_installer::install::InstallDestination;
    /// use science_installer::platform::Platform;
    ///
    /// let dest = InstallDestination::new(
    ///     Utf8PathBuf::from("C:/tools"),
    ///     "science",
    ///     Platform::WindowsX86_64,
    /// )?;
    /// assert_eq!(dest.file_name(), "science.exe");
    /// # Ok::<(), science_installer::error::InstallerError>(())
    /// ```
    pub fn new(dir: Utf8PathBuf, base_name: &str, platform: Platform) -> Result<Self> {
        validate_base_name(base_name)?;
        let extension = platform.exe_extension();
        let has_extension = !extension.is_empty()
            && base_name
                .to_ascii_lowercase()
                .ends_with(&extension.to_ascii_lowercase());
        let file_name = if has_extension {
            base_name.to_owned()
        } else {
            format!("{base_name}{extension}")
        };
        Ok(Self { dir, file_name })
    }

    /// Return the destination directory.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Return the installed filename.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Return the full destination path.
    #[must_use]
    pub fn path(&self) -> Utf8PathBuf {
        self.dir.join(&self.file_name)
    }
}

pub(crate) fn validate_base_name(base_name: &str) -> Result<()> {
    let invalid = |reason: &str| InstallerError::InvalidArgument {
        reason: format!("invalid base name \"{base_name}\": {reason}"),
    };
    if base_name.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if base_name.contains(['/', '\\']) {
        return Err(invalid("must not contain path separators"));
    }
    if base_name == "." || base_name == ".." {
        return Err(invalid("must name a file"));
    }
    Ok(())
}

/// Move the verified artifact at `source` to `dest`.
///
/// Creates the destination directory, marks the file executable and
/// replaces any previous install atomically. A staging file created
/// beside the destination is listed in `registry` while it exists.
/// Returns the installed path.
///
/// # Errors
///
/// Returns [`InstallerError::Filesystem`] naming the path that could not
/// be created or written.
pub fn install_artifact(
    source: &Path,
    dest: &InstallDestination,
    registry: &'static WorkspaceRegistry,
) -> Result<Utf8PathBuf> {
    std::fs::create_dir_all(dest.dir()).map_err(|e| InstallerError::filesystem(dest.dir(), &e))?;
    let target = dest.path();
    set_executable(source).map_err(|e| InstallerError::filesystem(target.clone(), &e))?;

    match std::fs::rename(source, &target) {
        Ok(()) => {
            log::trace!("renamed {} to {target}", source.display());
            Ok(target)
        }
        Err(e) => {
            log::debug!("rename into {target} failed ({e}); copying instead");
            copy_into_place(source, dest, registry)?;
            Ok(target)
        }
    }
}

/// Copy `source` beside the destination, then rename it into place.
fn copy_into_place(
    source: &Path,
    dest: &InstallDestination,
    registry: &'static WorkspaceRegistry,
) -> Result<()> {
    let target = dest.path();
    let (staged, tracked) = stage_copy(source, dest, registry)?;
    staged
        .persist(&target)
        .map_err(|e| InstallerError::filesystem(target.clone(), &e.error))?;
    drop(tracked);
    log::trace!("copied {} into {target}", source.display());
    Ok(())
}

/// Write an executable, flushed copy of `source` into the destination
/// directory under a temporary name.
fn stage_copy(
    source: &Path,
    dest: &InstallDestination,
    registry: &'static WorkspaceRegistry,
) -> Result<(NamedTempFile, TrackedPath)> {
    let target = dest.path();
    let mut staged =
        NamedTempFile::new_in(dest.dir()).map_err(|e| InstallerError::filesystem(dest.dir(), &e))?;
    let tracked = registry.track(staged.path());
    let mut input = File::open(source).map_err(|e| InstallerError::Workspace {
        reason: format!("failed to read {}: {e}", source.display()),
    })?;
    std::io::copy(&mut input, staged.as_file_mut())
        .map_err(|e| InstallerError::filesystem(target.clone(), &e))?;
    set_executable(staged.path()).map_err(|e| InstallerError::filesystem(target.clone(), &e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| InstallerError::filesystem(target.clone(), &e))?;
    Ok((staged, tracked))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::handle_interrupt;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    static SHARED: WorkspaceRegistry = WorkspaceRegistry::new();

    struct Dirs {
        _root: TempDir,
        workspace: Utf8PathBuf,
        bin: Utf8PathBuf,
    }

    impl Dirs {
        fn artifact(&self, bytes: &[u8]) -> Utf8PathBuf {
            let path = self.workspace.join("science-fat-linux-x86_64");
            std::fs::write(&path, bytes).expect("write artifact");
            path
        }

        fn destination(&self) -> InstallDestination {
            InstallDestination::new(self.bin.clone(), "science", Platform::LinuxX86_64)
                .expect("valid destination")
        }
    }

    #[fixture]
    fn dirs() -> Dirs {
        let root = TempDir::new().expect("temp dir");
        let base = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).expect("utf-8 temp dir");
        let workspace = base.join("workspace");
        std::fs::create_dir(&workspace).expect("workspace dir");
        Dirs {
            _root: root,
            workspace,
            bin: base.join("nested").join("bin"),
        }
    }

    #[rstest]
    fn installs_into_new_directory(dirs: Dirs) {
        let source = dirs.artifact(b"v1");
        let installed =
            install_artifact(source.as_std_path(), &dirs.destination(), &SHARED).expect("install");

        assert_eq!(installed, dirs.bin.join("science"));
        assert_eq!(std::fs::read(&installed).expect("read"), b"v1");
        assert!(!source.exists());
    }

    #[rstest]
    fn replaces_previous_install(dirs: Dirs) {
        std::fs::create_dir_all(&dirs.bin).expect("bin dir");
        std::fs::write(dirs.bin.join("science"), b"old").expect("old install");
        let source = dirs.artifact(b"new");

        let installed =
            install_artifact(source.as_std_path(), &dirs.destination(), &SHARED).expect("install");

        assert_eq!(std::fs::read(installed).expect("read"), b"new");
    }

    #[cfg(unix)]
    #[rstest]
    fn installed_file_is_executable(dirs: Dirs) {
        use std::os::unix::fs::PermissionsExt;

        let source = dirs.artifact(b"bin");
        let installed =
            install_artifact(source.as_std_path(), &dirs.destination(), &SHARED).expect("install");
        let mode = std::fs::metadata(installed).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[rstest]
    fn copy_fallback_replaces_atomically(dirs: Dirs) {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        std::fs::create_dir_all(&dirs.bin).expect("bin dir");
        std::fs::write(dirs.bin.join("science"), b"old").expect("old install");
        let source = dirs.artifact(b"copied");

        copy_into_place(source.as_std_path(), &dirs.destination(), &REGISTRY).expect("copy");

        assert_eq!(std::fs::read(dirs.bin.join("science")).expect("read"), b"copied");
        let leftovers = std::fs::read_dir(&dirs.bin).expect("list bin").count();
        assert_eq!(leftovers, 1, "no staging files remain");
        assert!(REGISTRY.live().is_empty());
    }

    #[rstest]
    fn interrupt_during_copy_removes_staged_file(dirs: Dirs) {
        static REGISTRY: WorkspaceRegistry = WorkspaceRegistry::new();
        std::fs::create_dir_all(&dirs.bin).expect("bin dir");
        let source = dirs.artifact(b"half copied");

        let (staged, tracked) =
            stage_copy(source.as_std_path(), &dirs.destination(), &REGISTRY).expect("stage");
        let staged_path = staged.path().to_path_buf();
        assert_eq!(REGISTRY.live(), vec![staged_path.clone()]);

        let mut stderr = Vec::new();
        assert_eq!(handle_interrupt(&REGISTRY, &mut stderr), 1);

        assert!(!staged_path.exists());
        assert_eq!(std::fs::read_dir(&dirs.bin).expect("list bin").count(), 0);
        drop(tracked);
        drop(staged);
    }

    #[cfg(unix)]
    #[rstest]
    fn missing_source_is_a_filesystem_error_naming_destination(dirs: Dirs) {
        let missing = dirs.workspace.join("never-fetched");

        let err = install_artifact(missing.as_std_path(), &dirs.destination(), &SHARED)
            .expect_err("missing source");

        match err {
            InstallerError::Filesystem { path, .. } => assert_eq!(path, dirs.bin.join("science")),
            other => panic!("expected Filesystem, got {other:?}"),
        }
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("  ")]
    #[case::slash("bin/science")]
    #[case::backslash("bin\\science")]
    #[case::parent("..")]
    fn rejects_unusable_base_names(#[case] base_name: &str) {
        let err = InstallDestination::new(Utf8PathBuf::from("/opt"), base_name, Platform::LinuxX86_64)
            .expect_err("invalid base name");
        assert!(matches!(err, InstallerError::InvalidArgument { .. }));
    }

    #[rstest]
    #[case(Platform::WindowsX86_64, "science", "science.exe")]
    #[case(Platform::WindowsAarch64, "science.EXE", "science.EXE")]
    #[case(Platform::LinuxX86_64, "science", "science")]
    #[case(Platform::MacosAarch64, "sci", "sci")]
    fn windows_names_gain_exe(
        #[case] platform: Platform,
        #[case] base_name: &str,
        #[case] expected: &str,
    ) {
        let dest = InstallDestination::new(Utf8PathBuf::from("/opt"), base_name, platform)
            .expect("valid");
        assert_eq!(dest.file_name(), expected);
    }
}
