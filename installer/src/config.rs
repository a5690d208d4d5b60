//! Resolution of parsed CLI flags into a validated run configuration.

use crate::cli::Cli;
use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::fetch::RetryPolicy;
use crate::fetch::retry::DEFAULT_INITIAL_BACKOFF;
use crate::install::validate_base_name;
use crate::platform::Platform;
use crate::release::{ReleaseRef, Variant};
use camino::Utf8PathBuf;

/// URL schemes accepted for `--base-url`.
const ALLOWED_SCHEMES: &[&str] = &["https://", "file://"];

/// Everything one installation run needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Absolute directory the artifact is installed into.
    pub bin_dir: Utf8PathBuf,
    /// Installed filename before any platform extension.
    pub base_name: String,
    /// Release to install.
    pub release: ReleaseRef,
    /// Artifact variant.
    pub variant: Variant,
    /// Platform to use instead of detecting the host.
    pub platform_override: Option<Platform>,
    /// Release host or mirror base URL.
    pub base_url: String,
    /// Retry policy for each fetch.
    pub retry: RetryPolicy,
    /// Whether a missing PATH entry is persisted or only reported.
    pub modify_path: bool,
    /// Whether progress output is suppressed.
    pub quiet: bool,
}

impl InstallConfig {
    /// Build the configuration from parsed flags.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidArgument`] when the base name or base
    /// URL is unusable, or when no install directory can be determined.
    pub fn from_cli(cli: &Cli, dirs: &dyn BaseDirs) -> Result<Self> {
        validate_base_name(&cli.base_name)?;
        validate_base_url(&cli.base_url)?;
        Ok(Self {
            bin_dir: resolve_bin_dir(cli.bin_dir.as_ref(), dirs)?,
            base_name: cli.base_name.clone(),
            release: cli.release.clone(),
            variant: cli.variant,
            platform_override: cli.platform,
            base_url: cli.base_url.clone(),
            retry: RetryPolicy::new(cli.max_attempts, DEFAULT_INITIAL_BACKOFF),
            modify_path: !cli.no_modify_path,
            quiet: cli.quiet,
        })
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let lower = base_url.to_ascii_lowercase();
    if ALLOWED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return Ok(());
    }
    Err(InstallerError::InvalidArgument {
        reason: format!("base URL \"{base_url}\" must use https:// or file://"),
    })
}

fn resolve_bin_dir(explicit: Option<&Utf8PathBuf>, dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    let chosen = match explicit {
        Some(dir) => dir.as_std_path().to_path_buf(),
        None => dirs
            .bin_dir()
            .ok_or_else(|| InstallerError::InvalidArgument {
                reason: "could not determine a default install directory; pass --bin-dir"
                    .to_owned(),
            })?,
    };
    let absolute = std::path::absolute(&chosen).map_err(|e| InstallerError::InvalidArgument {
        reason: format!("cannot resolve install directory {}: {e}", chosen.display()),
    })?;
    Utf8PathBuf::from_path_buf(absolute).map_err(|path| InstallerError::InvalidArgument {
        reason: format!("install directory is not valid UTF-8: {}", path.display()),
    })
}
