//! Science installer library.
//!
//! This crate downloads a release of the `science` tool, verifies it
//! against its published SHA-256 digest and installs it atomically into a
//! bin directory, optionally adding that directory to `PATH`. It is used by
//! the `science-installer` CLI binary and can be driven programmatically
//! for testing.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Validated run configuration derived from the CLI
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types for the installer
//! - [`fetch`] - HTTPS retrieval with bounded retries
//! - [`install`] - Atomic placement of the verified binary
//! - [`interrupt`] - Ctrl-C handling and workspace cleanup
//! - [`output`] - User-facing progress and warning messages
//! - [`path_env`] - PATH inspection and persistence
//! - [`pipeline`] - Installation pipeline orchestration
//! - [`platform`] - Host platform detection and release naming tokens
//! - [`release`] - Release references and download URL resolution
//! - [`verify`] - SHA-256 digest parsing and artifact verification
//! - [`workspace`] - Scoped temporary directory for one run

pub mod cli;
pub mod config;
pub mod dirs;
pub mod error;
pub mod fetch;
pub mod install;
pub mod interrupt;
pub mod output;
pub mod path_env;
pub mod pipeline;
pub mod platform;
pub mod release;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod verify;
pub mod workspace;
