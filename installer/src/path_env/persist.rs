//! Persisting the install directory on the user's search path.
//!
//! On Unix a marked block is appended to the profile of the user's shell.
//! On Windows the directory is appended to the per-user `Path` value under
//! `HKCU\Environment`.

use crate::dirs::BaseDirs;
use camino::Utf8Path;
use std::ffi::OsStr;
use std::path::PathBuf;

/// Comment line preceding the block appended to shell profiles.
pub const PROFILE_MARKER: &str = "# Added by science-installer";

/// Reasons a PATH update could not be completed. Always non-fatal.
#[derive(Debug, thiserror::Error)]
pub enum PathUpdateError {
    /// No home directory is known, so no profile can be located.
    #[error("could not determine the home directory")]
    NoHomeDirectory,

    /// The shell profile could not be read or written.
    #[error("could not update {path}: {reason}")]
    Profile {
        /// The profile file.
        path: PathBuf,
        /// Description of the I/O failure.
        reason: String,
    },

    /// The Windows registry could not be read or written.
    #[error("could not update the user Path in the registry: {reason}")]
    Registry {
        /// Description of the registry failure.
        reason: String,
    },

    /// The new search path could not be assembled.
    #[error("could not build the new PATH value: {reason}")]
    Join {
        /// Description of the failure.
        reason: String,
    },
}

/// Persists and applies search-path changes.
#[cfg_attr(test, mockall::automock)]
pub trait PathPersister {
    /// Record `dir` in the user's persistent environment.
    ///
    /// Returns a description of where the change was written.
    ///
    /// # Errors
    ///
    /// Returns [`PathUpdateError`] when the change cannot be recorded.
    fn persist(&self, dir: &Utf8Path) -> Result<String, PathUpdateError>;

    /// Replace the current process's `PATH` with `value`.
    fn apply(&self, value: &OsStr);
}

/// Shell families with distinct profile syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// `bash`.
    Bash,
    /// `zsh`.
    Zsh,
    /// `fish`.
    Fish,
    /// Any other POSIX shell.
    Posix,
}

impl Shell {
    /// Classify a `$SHELL` value by its final path component.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::path_env::persist::Shell;
    ///
    /// assert_eq!(Shell::from_env_value(Some("/usr/bin/zsh")), Shell::Zsh);
    /// assert_eq!(Shell::from_env_value(None), Shell::Posix);
    /// ```
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Self {
        let name = value
            .and_then(|v| v.rsplit('/').next())
            .unwrap_or_default();
        match name {
            "bash" => Self::Bash,
            "zsh" => Self::Zsh,
            "fish" => Self::Fish,
            _ => Self::Posix,
        }
    }

    /// Return the profile path relative to the home directory.
    #[must_use]
    pub fn profile(self) -> PathBuf {
        match self {
            Self::Bash if cfg!(target_os = "macos") => PathBuf::from(".bash_profile"),
            Self::Bash => PathBuf::from(".bashrc"),
            Self::Zsh => PathBuf::from(".zshrc"),
            Self::Fish => [".config", "fish", "config.fish"].iter().collect(),
            Self::Posix => PathBuf::from(".profile"),
        }
    }

    /// Return the line that puts `dir` on the search path.
    #[must_use]
    pub fn path_line(self, dir: &Utf8Path) -> String {
        match self {
            Self::Fish => format!("fish_add_path \"{dir}\""),
            Self::Bash | Self::Zsh | Self::Posix => format!("export PATH=\"{dir}:$PATH\""),
        }
    }
}

/// [`PathPersister`] acting on the real user environment.
#[derive(Debug, Clone)]
pub struct SystemPathPersister {
    home: Option<PathBuf>,
    shell: Shell,
}

impl SystemPathPersister {
    /// Build a persister for the current user.
    #[must_use]
    pub fn from_env(dirs: &dyn BaseDirs) -> Self {
        let shell = std::env::var("SHELL").ok();
        Self::new(dirs.home_dir(), Shell::from_env_value(shell.as_deref()))
    }

    /// Build a persister for an explicit home directory and shell.
    #[must_use]
    pub fn new(home: Option<PathBuf>, shell: Shell) -> Self {
        Self { home, shell }
    }

    /// Append the PATH block to the shell profile unless already present.
    fn persist_profile(&self, dir: &Utf8Path) -> Result<String, PathUpdateError> {
        let home = self.home.as_ref().ok_or(PathUpdateError::NoHomeDirectory)?;
        let profile = home.join(self.shell.profile());
        let line = self.shell.path_line(dir);
        let profile_error = |e: std::io::Error| PathUpdateError::Profile {
            path: profile.clone(),
            reason: e.to_string(),
        };

        let existing = match std::fs::read_to_string(&profile) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(profile_error(e)),
        };
        if existing.lines().any(|l| l.trim() == line) {
            log::debug!("{} already adds {dir} to PATH", profile.display());
            return Ok(profile.display().to_string());
        }

        if let Some(parent) = profile.parent() {
            std::fs::create_dir_all(parent).map_err(profile_error)?;
        }
        let separator = if existing.is_empty() || existing.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        let block = format!("{separator}\n{PROFILE_MARKER}\n{line}\n");
        append(&profile, &block).map_err(profile_error)?;
        Ok(profile.display().to_string())
    }

    #[cfg(windows)]
    fn persist_registry(dir: &Utf8Path) -> Result<String, PathUpdateError> {
        use winreg::RegKey;
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::types::ToRegValue;

        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (env, _) = hkcu
            .create_subkey("Environment")
            .map_err(|e| registry_error(&e))?;
        let (current, vtype) = read_user_path(env.get_raw_value("Path"))?;
        if let Some(updated) = appended_path_value(&current, dir.as_str()) {
            let mut value = updated.to_reg_value();
            value.vtype = vtype;
            env.set_raw_value("Path", &value)
                .map_err(|e| registry_error(&e))?;
        }
        Ok(r"HKCU\Environment\Path".to_owned())
    }
}

#[cfg(windows)]
fn registry_error(e: &std::io::Error) -> PathUpdateError {
    PathUpdateError::Registry {
        reason: e.to_string(),
    }
}

/// Decode the user `Path` value, keeping its registry type.
///
/// A missing value reads as empty and is created as `REG_EXPAND_SZ`.
#[cfg(windows)]
fn read_user_path(
    value: std::io::Result<winreg::RegValue>,
) -> Result<(String, winreg::enums::RegType), PathUpdateError> {
    use winreg::enums::RegType;
    use winreg::types::FromRegValue;

    match value {
        Ok(raw) => match raw.vtype {
            RegType::REG_SZ | RegType::REG_EXPAND_SZ => {
                let text = String::from_reg_value(&raw).map_err(|e| registry_error(&e))?;
                Ok((text, raw.vtype))
            }
            other => Err(PathUpdateError::Registry {
                reason: format!("Path has unsupported type {other:?}"),
            }),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok((String::new(), RegType::REG_EXPAND_SZ))
        }
        Err(e) => Err(registry_error(&e)),
    }
}

/// Append `dir` to a `;`-separated Windows path value.
///
/// Returns `None` when an entry already names `dir`, ignoring case and
/// trailing backslashes.
#[cfg(any(windows, test))]
fn appended_path_value(current: &str, dir: &str) -> Option<String> {
    let wanted = dir.trim_end_matches('\\');
    if current
        .split(';')
        .any(|entry| entry.trim_end_matches('\\').eq_ignore_ascii_case(wanted))
    {
        return None;
    }
    Some(if current.trim_end_matches(';').is_empty() {
        dir.to_owned()
    } else {
        format!("{};{dir}", current.trim_end_matches(';'))
    })
}

fn append(path: &std::path::Path, text: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

impl PathPersister for SystemPathPersister {
    fn persist(&self, dir: &Utf8Path) -> Result<String, PathUpdateError> {
        #[cfg(windows)]
        {
            Self::persist_registry(dir)
        }
        #[cfg(not(windows))]
        {
            self.persist_profile(dir)
        }
    }

    fn apply(&self, value: &OsStr) {
        // SAFETY: called once from the main thread after every worker
        // thread spawned by the installer has been joined.
        unsafe { std::env::set_var("PATH", value) };
    }
}
