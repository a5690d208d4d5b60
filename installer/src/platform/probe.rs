//! Host inspection behind a mockable seam.
//!
//! [`SystemProbe`] asks the kernel (`uname`) rather than trusting the
//! compile-time target, so an x86-64 installer running under emulation on
//! an ARM64 host still reports the real machine.

use std::io::Read;
#[cfg(not(windows))]
use std::process::Command;

/// System binaries whose ELF interpreter reveals the libc flavour.
const LINKER_PROBE_BINARIES: &[&str] = &["/bin/sh", "/bin/ls"];

/// Bytes read from a probe binary; `PT_INTERP` sits well inside this.
const ELF_PREFIX_LEN: u64 = 4096;

/// Unnormalised host facts as reported by the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawPlatform {
    /// Kernel name, e.g. `Linux`, `Darwin`, `Windows_NT`.
    pub kernel: String,
    /// Machine name, e.g. `x86_64`, `arm64`, `AMD64`.
    pub machine: String,
    /// Whether a musl dynamic linker was found (Linux only).
    pub musl: bool,
}

/// Source of raw platform facts.
#[cfg_attr(test, mockall::automock)]
pub trait PlatformProbe {
    /// Inspect the host and return its raw kernel and machine strings.
    fn probe(&self) -> RawPlatform;
}

/// Probes the real host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl PlatformProbe for SystemProbe {
    fn probe(&self) -> RawPlatform {
        let kernel = kernel_name();
        let machine = machine_name();
        let musl = kernel.eq_ignore_ascii_case("linux") && probe_musl();
        RawPlatform {
            kernel,
            machine,
            musl,
        }
    }
}

#[cfg(windows)]
fn kernel_name() -> String {
    "Windows".to_owned()
}

#[cfg(not(windows))]
fn kernel_name() -> String {
    uname("-s").unwrap_or_else(|| std::env::consts::OS.to_owned())
}

#[cfg(windows)]
fn machine_name() -> String {
    // A 32-bit process on a 64-bit host sees the emulated value in
    // PROCESSOR_ARCHITECTURE and the real one in PROCESSOR_ARCHITEW6432.
    std::env::var("PROCESSOR_ARCHITEW6432")
        .or_else(|_| std::env::var("PROCESSOR_ARCHITECTURE"))
        .unwrap_or_else(|_| std::env::consts::ARCH.to_owned())
}

#[cfg(not(windows))]
fn machine_name() -> String {
    uname("-m").unwrap_or_else(|| std::env::consts::ARCH.to_owned())
}

#[cfg(not(windows))]
fn uname(flag: &str) -> Option<String> {
    let output = Command::new("uname").arg(flag).output().ok()?;
    if !output.status.success() {
        log::debug!("uname {flag} exited with {}", output.status);
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if value.is_empty() { None } else { Some(value) }
}

/// Inspect the dynamic linker of a known system binary.
fn probe_musl() -> bool {
    LINKER_PROBE_BINARIES
        .iter()
        .find_map(|path| read_prefix(path))
        .is_some_and(|bytes| interpreter_is_musl(&bytes))
}

fn read_prefix(path: &str) -> Option<Vec<u8>> {
    let file = std::fs::File::open(path).ok()?;
    let mut bytes = Vec::new();
    file.take(ELF_PREFIX_LEN).read_to_end(&mut bytes).ok()?;
    Some(bytes)
}

/// Whether the head of an ELF image names a musl interpreter.
///
/// musl installs its loader as `/lib/ld-musl-<arch>.so.1`; glibc uses
/// `ld-linux*`. Static binaries carry no interpreter and count as glibc.
#[must_use]
pub fn interpreter_is_musl(elf_prefix: &[u8]) -> bool {
    const NEEDLE: &[u8] = b"ld-musl-";
    elf_prefix.starts_with(b"\x7fELF")
        && elf_prefix
            .windows(NEEDLE.len())
            .any(|window| window == NEEDLE)
}
