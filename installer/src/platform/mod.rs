//! Platform detection and the closed set of release platforms.
//!
//! Raw kernel and machine strings are normalised into a
//! [`PlatformDescriptor`], which is then mapped onto the [`Platform`]
//! enumeration of combinations that actually have published releases.
//! Anything outside that enumeration is rejected before the network is
//! touched.

pub mod probe;

use crate::error::{InstallerError, Result};
use std::fmt;
use std::str::FromStr;

pub use probe::{PlatformProbe, RawPlatform, SystemProbe};

/// Canonical operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Linux kernels, glibc or musl userland.
    Linux,
    /// macOS (Darwin kernel).
    Macos,
    /// Windows, including MSYS2, Git Bash and Cygwin environments.
    Windows,
}

impl Os {
    /// Normalise a raw kernel name such as the output of `uname -s`.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::platform::Os;
    ///
    /// assert_eq!(Os::from_raw("Darwin"), Some(Os::Macos));
    /// assert_eq!(Os::from_raw("MINGW64_NT-10.0-19045"), Some(Os::Windows));
    /// assert_eq!(Os::from_raw("SunOS"), None);
    /// ```
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_ascii_lowercase();
        match lower.as_str() {
            "linux" => Some(Self::Linux),
            "darwin" | "macos" => Some(Self::Macos),
            "windows" | "windows_nt" => Some(Self::Windows),
            other
                if other.starts_with("mingw")
                    || other.starts_with("msys")
                    || other.starts_with("cygwin") =>
            {
                Some(Self::Windows)
            }
            _ => None,
        }
    }

    /// Return the release name of this operating system.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical machine architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Aarch64,
    /// 32-bit ARM with hardware floating point.
    Armv7l,
    /// IBM Z.
    S390x,
    /// Little-endian 64-bit POWER.
    Ppc64le,
}

impl Arch {
    /// Normalise a raw machine name such as the output of `uname -m` or
    /// Windows' `PROCESSOR_ARCHITECTURE`.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::platform::Arch;
    ///
    /// assert_eq!(Arch::from_raw("amd64"), Some(Arch::X86_64));
    /// assert_eq!(Arch::from_raw("ARM64"), Some(Arch::Aarch64));
    /// assert_eq!(Arch::from_raw("mips"), None);
    /// ```
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            "aarch64" | "arm64" => Some(Self::Aarch64),
            "armv7l" | "armv8l" => Some(Self::Armv7l),
            "s390x" => Some(Self::S390x),
            "ppc64le" | "powerpc64le" => Some(Self::Ppc64le),
            _ => None,
        }
    }

    /// Return the canonical name of this architecture.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Armv7l => "armv7l",
            Self::S390x => "s390x",
            Self::Ppc64le => "ppc64le",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// C library flavour of the host userland.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Libc {
    /// GNU libc.
    Glibc,
    /// musl libc, as on Alpine.
    Musl,
    /// Not applicable (macOS, Windows).
    None,
}

/// The normalised description of the host, derived once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformDescriptor {
    /// Operating system.
    pub os: Os,
    /// C library flavour; always [`Libc::None`] off Linux.
    pub libc: Libc,
    /// Machine architecture.
    pub arch: Arch,
}

impl PlatformDescriptor {
    /// Normalise raw probe output into a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] carrying both raw
    /// strings when either is unrecognised.
    pub fn from_raw(raw: &RawPlatform) -> Result<Self> {
        let unsupported = || InstallerError::UnsupportedPlatform {
            os: raw.kernel.clone(),
            arch: raw.machine.clone(),
        };
        let os = Os::from_raw(&raw.kernel).ok_or_else(unsupported)?;
        let arch = Arch::from_raw(&raw.machine).ok_or_else(unsupported)?;
        let libc = match os {
            Os::Linux if raw.musl => Libc::Musl,
            Os::Linux => Libc::Glibc,
            Os::Macos | Os::Windows => Libc::None,
        };
        Ok(Self { os, libc, arch })
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.libc {
            Libc::Musl => write!(f, "{}-musl-{}", self.os, self.arch),
            Libc::Glibc | Libc::None => write!(f, "{}-{}", self.os, self.arch),
        }
    }
}

/// Platforms for which science releases are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux x86-64, glibc.
    LinuxX86_64,
    /// Linux ARM64, glibc.
    LinuxAarch64,
    /// Linux ARMv7, glibc.
    LinuxArmv7l,
    /// Linux IBM Z, glibc.
    LinuxS390x,
    /// Linux POWER little-endian, glibc.
    LinuxPpc64le,
    /// Linux x86-64, musl.
    MuslLinuxX86_64,
    /// Linux ARM64, musl.
    MuslLinuxAarch64,
    /// macOS Intel.
    MacosX86_64,
    /// macOS Apple silicon.
    MacosAarch64,
    /// Windows x86-64.
    WindowsX86_64,
    /// Windows ARM64.
    WindowsAarch64,
}

/// Every supported platform, in release-listing order.
const ALL_PLATFORMS: &[Platform] = &[
    Platform::LinuxX86_64,
    Platform::LinuxAarch64,
    Platform::LinuxArmv7l,
    Platform::LinuxS390x,
    Platform::LinuxPpc64le,
    Platform::MuslLinuxX86_64,
    Platform::MuslLinuxAarch64,
    Platform::MacosX86_64,
    Platform::MacosAarch64,
    Platform::WindowsX86_64,
    Platform::WindowsAarch64,
];

impl Platform {
    /// Return every supported platform.
    #[must_use]
    pub fn all() -> &'static [Self] {
        ALL_PLATFORMS
    }

    /// Return the token used in release asset names.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::platform::Platform;
    ///
    /// assert_eq!(Platform::LinuxPpc64le.release_token(), "linux-powerpc64");
    /// assert_eq!(Platform::MuslLinuxAarch64.release_token(), "musl-linux-aarch64");
    /// ```
    #[must_use]
    pub const fn release_token(self) -> &'static str {
        match self {
            Self::LinuxX86_64 => "linux-x86_64",
            Self::LinuxAarch64 => "linux-aarch64",
            Self::LinuxArmv7l => "linux-armv7l",
            Self::LinuxS390x => "linux-s390x",
            Self::LinuxPpc64le => "linux-powerpc64",
            Self::MuslLinuxX86_64 => "musl-linux-x86_64",
            Self::MuslLinuxAarch64 => "musl-linux-aarch64",
            Self::MacosX86_64 => "macos-x86_64",
            Self::MacosAarch64 => "macos-aarch64",
            Self::WindowsX86_64 => "windows-x86_64",
            Self::WindowsAarch64 => "windows-aarch64",
        }
    }

    /// Whether binaries for this platform carry the `.exe` extension.
    #[must_use]
    pub const fn is_windows(self) -> bool {
        matches!(self, Self::WindowsX86_64 | Self::WindowsAarch64)
    }

    /// Return the executable file extension, including the dot.
    #[must_use]
    pub const fn exe_extension(self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// Detect the host platform through `probe`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] for unrecognised
    /// raw strings and [`InstallerError::UnsupportedCombination`] for
    /// recognised hosts without a published release.
    pub fn detect(probe: &dyn PlatformProbe) -> Result<Self> {
        let raw = probe.probe();
        log::trace!(
            "probed kernel={:?} machine={:?} musl={}",
            raw.kernel,
            raw.machine,
            raw.musl
        );
        let descriptor = PlatformDescriptor::from_raw(&raw)?;
        Self::try_from(descriptor)
    }
}

impl TryFrom<PlatformDescriptor> for Platform {
    type Error = InstallerError;

    fn try_from(descriptor: PlatformDescriptor) -> Result<Self> {
        let platform = match (descriptor.os, descriptor.libc, descriptor.arch) {
            (Os::Linux, Libc::Glibc, Arch::X86_64) => Self::LinuxX86_64,
            (Os::Linux, Libc::Glibc, Arch::Aarch64) => Self::LinuxAarch64,
            (Os::Linux, Libc::Glibc, Arch::Armv7l) => Self::LinuxArmv7l,
            (Os::Linux, Libc::Glibc, Arch::S390x) => Self::LinuxS390x,
            (Os::Linux, Libc::Glibc, Arch::Ppc64le) => Self::LinuxPpc64le,
            (Os::Linux, Libc::Musl, Arch::X86_64) => Self::MuslLinuxX86_64,
            (Os::Linux, Libc::Musl, Arch::Aarch64) => Self::MuslLinuxAarch64,
            (Os::Macos, Libc::None, Arch::X86_64) => Self::MacosX86_64,
            (Os::Macos, Libc::None, Arch::Aarch64) => Self::MacosAarch64,
            (Os::Windows, Libc::None, Arch::X86_64) => Self::WindowsX86_64,
            (Os::Windows, Libc::None, Arch::Aarch64) => Self::WindowsAarch64,
            _ => {
                return Err(InstallerError::UnsupportedCombination {
                    platform: descriptor.to_string(),
                });
            }
        };
        Ok(platform)
    }
}

impl FromStr for Platform {
    type Err = InstallerError;

    fn from_str(value: &str) -> Result<Self> {
        ALL_PLATFORMS
            .iter()
            .copied()
            .find(|platform| platform.release_token() == value)
            .ok_or_else(|| InstallerError::InvalidArgument {
                reason: format!(
                    "unknown platform \"{value}\"; expected one of: {}",
                    ALL_PLATFORMS
                        .iter()
                        .map(|p| p.release_token())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.release_token())
    }
}
