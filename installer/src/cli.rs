//! CLI argument definitions for the science installer.
//!
//! Parsing lives here; [`crate::config`] turns the parsed [`Cli`] into a
//! validated [`crate::config::InstallConfig`].

use crate::fetch::retry::DEFAULT_MAX_ATTEMPTS;
use crate::install::DEFAULT_BASE_NAME;
use crate::platform::Platform;
use crate::release::{DEFAULT_BASE_URL, ReleaseRef, Variant};
use camino::Utf8PathBuf;
use clap::Parser;

/// Download, verify and install the `science` executable.
#[derive(Parser, Debug, Clone)]
#[command(name = "science-installer")]
#[command(about, disable_version_flag = true)]
#[command(long_about = concat!(
    "Download, verify and install the science executable.\n\n",
    "The installer detects the host platform, fetches the matching release ",
    "artifact together with its published SHA-256 digest, verifies the ",
    "artifact and atomically places it in the chosen directory. If that ",
    "directory is not on PATH, it is added to your shell profile unless ",
    "--no-modify-path is given.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the latest release into the default directory:\n",
    "    $ science-installer\n\n",
    "  Install a pinned release into a custom directory:\n",
    "    $ science-installer -V 0.12.3 -d ~/bin\n\n",
    "  Install from a local mirror without touching PATH:\n",
    "    $ science-installer --base-url file:///srv/mirror --no-modify-path",
))]
pub struct Cli {
    /// Directory to install into [default: ~/.local/bin, or
    /// %LOCALAPPDATA%\science\bin on Windows].
    #[arg(short = 'd', long, value_name = "DIR")]
    pub bin_dir: Option<Utf8PathBuf>,

    /// Installed filename (".exe" is appended on Windows).
    #[arg(short = 'b', long, value_name = "NAME", default_value = DEFAULT_BASE_NAME)]
    pub base_name: String,

    /// Release to install: a version such as 0.12.3, or "latest".
    #[arg(short = 'V', long = "version", value_name = "VERSION", default_value = "latest")]
    pub release: ReleaseRef,

    /// Artifact variant.
    #[arg(long, value_enum, default_value_t = Variant::Fat)]
    pub variant: Variant,

    /// Skip detection and install for this release platform.
    #[arg(long, value_name = "TOKEN")]
    pub platform: Option<Platform>,

    /// Base URL of the release host or a mirror.
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Fetch attempts per URL; transient failures are retried.
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    /// Do not add the install directory to PATH; print instructions instead.
    #[arg(long)]
    pub no_modify_path: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (warnings and errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
