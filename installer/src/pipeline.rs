//! Installation pipeline orchestration.
//!
//! One run moves through `DetectPlatform → ResolveUrl → Fetch → Verify →
//! Install → UpdatePath → Cleanup`. Any stage may fail; the workspace
//! guard still removes the temporary directory. The collaborators that
//! touch the outside world arrive through [`PipelineContext`] so tests can
//! substitute mocks.

use crate::config::InstallConfig;
use crate::error::{InstallerError, Result};
use crate::fetch::{Fetcher, RetryingFetcher};
use crate::install::{InstallDestination, install_artifact};
use crate::output::{Reporter, path_missing_message, success_message};
use crate::path_env::{PathPersister, PathSnapshot, manual_instructions};
use crate::platform::{Platform, PlatformProbe};
use crate::release::{ArtifactName, DownloadTarget};
use crate::verify::{Sha256Digest, verify_artifact};
use crate::workspace::{Workspace, WorkspaceRegistry};
use camino::{Utf8Path, Utf8PathBuf};
use std::path::{Path, PathBuf};

/// External collaborators for a pipeline run.
pub struct PipelineContext<'a> {
    /// Host platform source, consulted unless the platform is overridden.
    pub probe: &'a dyn PlatformProbe,
    /// Transport for the digest and artifact.
    pub fetcher: &'a dyn Fetcher,
    /// Writer of persistent and in-process PATH changes.
    pub persister: &'a dyn PathPersister,
    /// The search path captured at startup.
    pub snapshot: &'a PathSnapshot,
    /// Where temporary paths are listed for interrupt cleanup.
    pub registry: &'static WorkspaceRegistry,
}

/// Outcome of the PATH consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStatus {
    /// The install directory was already on PATH.
    AlreadyPresent,
    /// The directory was recorded at `location` and applied in-process.
    Persisted {
        /// Where the change was written.
        location: String,
    },
    /// The directory is missing and `--no-modify-path` was given.
    NotModified,
    /// Persisting failed; the user was warned.
    Failed {
        /// Why the update failed.
        reason: String,
    },
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// The release platform installed for.
    pub platform: Platform,
    /// Where the artifact came from.
    pub artifact_url: String,
    /// The verified SHA-256 of the installed file.
    pub digest: Sha256Digest,
    /// The installed file.
    pub destination: Utf8PathBuf,
    /// The temporary directory used and since removed.
    pub workspace: PathBuf,
    /// What happened to PATH.
    pub path_status: PathStatus,
}

/// Run the full installation.
///
/// # Errors
///
/// Returns the first fatal [`InstallerError`]. PATH problems are reported
/// as warnings and never fail the run.
pub fn run_install(
    config: &InstallConfig,
    context: &PipelineContext<'_>,
    reporter: &mut Reporter<'_>,
) -> Result<InstallReport> {
    log::debug!("state: DetectPlatform");
    let platform = resolve_platform(config, context.probe)?;
    reporter.progress(format_args!("Platform: {platform}"));

    log::debug!("state: ResolveUrl");
    let name = ArtifactName::new(config.variant, platform);
    let target = DownloadTarget::resolve(&config.base_url, &config.release, &name);
    let destination = InstallDestination::new(config.bin_dir.clone(), &config.base_name, platform)?;
    log::trace!("artifact {} digest {}", target.artifact_url, target.digest_url);

    let workspace = Workspace::acquire_with(context.registry)?;
    log::debug!("state: Fetch");
    reporter.progress(format_args!("Downloading {}", target.artifact_url));
    let retrying = RetryingFetcher::new(context.fetcher, config.retry);
    let (artifact_path, digest_path) = fetch_both(&retrying, &target, &workspace)?;

    log::debug!("state: Verify");
    let digest = verify_artifact(&artifact_path, &digest_path, &target)?;
    reporter.progress(format_args!("Verified sha256 {digest}"));

    log::debug!("state: Install");
    let installed = install_artifact(&artifact_path, &destination, context.registry)?;

    log::debug!("state: UpdatePath");
    let path_status = update_path(config, context, destination.dir(), reporter);

    log::debug!("state: Cleanup");
    let workspace_path = workspace.path().to_path_buf();
    if let Err(e) = workspace.close() {
        reporter.warn(e);
    }

    reporter.progress(success_message(&installed, &config.release));
    log::debug!("state: Done");
    Ok(InstallReport {
        platform,
        artifact_url: target.artifact_url,
        digest,
        destination: installed,
        workspace: workspace_path,
        path_status,
    })
}

fn resolve_platform(config: &InstallConfig, probe: &dyn PlatformProbe) -> Result<Platform> {
    match config.platform_override {
        Some(platform) => {
            log::debug!("platform overridden to {platform}");
            Ok(platform)
        }
        None => Platform::detect(probe),
    }
}

/// Fetch the digest and the artifact on two scoped threads.
fn fetch_both(
    fetcher: &dyn Fetcher,
    target: &DownloadTarget,
    workspace: &Workspace,
) -> Result<(PathBuf, PathBuf)> {
    let artifact_path = workspace.file(&target.filename);
    let digest_path = workspace.file(&target.digest_filename());

    let (digest_result, artifact_result) = std::thread::scope(|scope| {
        let digest = scope.spawn(|| fetch_one(fetcher, &target.digest_url, &digest_path));
        let artifact = scope.spawn(|| fetch_one(fetcher, &target.artifact_url, &artifact_path));
        (
            digest
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
            artifact
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
        )
    });
    digest_result?;
    artifact_result?;
    Ok((artifact_path, digest_path))
}

fn fetch_one(fetcher: &dyn Fetcher, url: &str, dest: &Path) -> Result<()> {
    log::trace!("fetching {url} into {}", dest.display());
    fetcher
        .fetch(url, dest)
        .map_err(|source| InstallerError::Network {
            url: url.to_owned(),
            source,
        })
}

fn update_path(
    config: &InstallConfig,
    context: &PipelineContext<'_>,
    bin_dir: &Utf8Path,
    reporter: &mut Reporter<'_>,
) -> PathStatus {
    if context.snapshot.contains(bin_dir.as_std_path()) {
        log::debug!("{bin_dir} already on PATH");
        return PathStatus::AlreadyPresent;
    }
    if !config.modify_path {
        reporter.warn(format_args!(
            "{}\n{}",
            path_missing_message(bin_dir),
            manual_instructions(bin_dir.as_std_path())
        ));
        return PathStatus::NotModified;
    }

    let persisted = context.persister.persist(bin_dir).and_then(|location| {
        let value = context.snapshot.prepended(bin_dir.as_std_path())?;
        context.persister.apply(&value);
        Ok(location)
    });
    match persisted {
        Ok(location) => {
            reporter.progress(format_args!(
                "Added {bin_dir} to PATH in {location}; restart your shell to pick it up"
            ));
            PathStatus::Persisted { location }
        }
        Err(e) => {
            reporter.warn(format_args!(
                "{}: {e}\n{}",
                path_missing_message(bin_dir),
                manual_instructions(bin_dir.as_std_path())
            ));
            PathStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
