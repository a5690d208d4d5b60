//! End-to-end tests for the `science-installer` binary.
//!
//! The binary installs from a `file://` mirror built in a temporary
//! directory, so no network access is needed.

use rstest::{fixture, rstest};
use science_installer::platform::Platform;
use science_installer::release::{ArtifactName, ReleaseRef, Variant};
use science_installer::test_utils::Mirror;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const ARTIFACT: &[u8] = b"science binary bytes";

struct Sandbox {
    root: TempDir,
    mirror: Mirror,
}

impl Sandbox {
    fn bin_dir(&self) -> PathBuf {
        self.root.path().join("bin")
    }

    fn installed(&self) -> PathBuf {
        self.bin_dir().join("science")
    }

    fn publish(&self, digest_of: Option<&[u8]>) {
        let name = ArtifactName::new(Variant::Fat, Platform::LinuxX86_64);
        self.mirror
            .publish(&ReleaseRef::Latest, &name, ARTIFACT, digest_of)
            .expect("publish to mirror");
    }

    fn install(&self, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_science-installer"))
            .arg("--platform")
            .arg("linux-x86_64")
            .arg("--base-url")
            .arg(self.mirror.base_url())
            .arg("--bin-dir")
            .arg(self.bin_dir())
            .arg("--max-attempts")
            .arg("1")
            .arg("--no-modify-path")
            .args(extra)
            .env_remove("RUST_LOG")
            .output()
            .expect("run science-installer")
    }
}

#[fixture]
fn sandbox() -> Sandbox {
    let root = tempfile::tempdir().expect("create temp dir");
    let mirror_dir = root.path().join("mirror");
    std::fs::create_dir_all(&mirror_dir).expect("create mirror dir");
    Sandbox {
        mirror: Mirror::new(&mirror_dir),
        root,
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[rstest]
fn repeated_installs_are_idempotent(sandbox: Sandbox) {
    sandbox.publish(None);

    let first = sandbox.install(&[]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    let first_bytes = std::fs::read(sandbox.installed()).expect("first install");

    let second = sandbox.install(&[]);
    assert!(second.status.success(), "stderr: {}", stderr(&second));
    let second_bytes = std::fs::read(sandbox.installed()).expect("second install");

    assert_eq!(first_bytes, ARTIFACT);
    assert_eq!(first_bytes, second_bytes);
    assert!(stdout(&second).contains("Successfully installed science (latest)"));
}

#[cfg(unix)]
#[rstest]
fn installed_binary_is_executable(sandbox: Sandbox) {
    use std::os::unix::fs::PermissionsExt;

    sandbox.publish(None);
    let output = sandbox.install(&[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let mode = std::fs::metadata(sandbox.installed())
        .expect("installed metadata")
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[rstest]
fn digest_mismatch_exits_one_without_installing(sandbox: Sandbox) {
    sandbox.publish(Some(b"something else"));

    let output = sandbox.install(&[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: "));
    assert!(!sandbox.installed().exists());
}

#[rstest]
fn quiet_suppresses_progress(sandbox: Sandbox) {
    sandbox.publish(None);

    let output = sandbox.install(&["--quiet"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[rstest]
#[case::unknown_platform(&["--platform", "solaris-sparc"])]
#[case::malformed_version(&["--version", "seven"])]
#[case::zero_attempts(&["--max-attempts", "0"])]
fn usage_errors_exit_one(sandbox: Sandbox, #[case] args: &[&str]) {
    let output = Command::new(env!("CARGO_BIN_EXE_science-installer"))
        .args(args)
        .arg("--bin-dir")
        .arg(sandbox.bin_dir())
        .output()
        .expect("run science-installer");

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("error:"));
    assert!(!sandbox.installed().exists());
}

#[test]
fn help_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_science-installer"))
        .arg("--help")
        .output()
        .expect("run science-installer");

    assert!(output.status.success());
    assert!(stdout(&output).contains("--bin-dir"));
}
