//! User-facing output for the installer CLI.
//!
//! Progress goes to stdout and is silenced by `--quiet`; warnings and
//! errors go to stderr and are always shown. Write failures are ignored.

use camino::Utf8Path;
use std::fmt::Display;
use std::io::Write;

/// Write `message` and a newline to `writer`, ignoring failures.
pub fn write_line(writer: &mut dyn Write, message: impl Display) {
    if writeln!(writer, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Routes progress and warnings to the right stream.
pub struct Reporter<'a> {
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
    quiet: bool,
}

impl<'a> Reporter<'a> {
    /// Create a reporter over the given streams.
    #[must_use]
    pub fn new(stdout: &'a mut dyn Write, stderr: &'a mut dyn Write, quiet: bool) -> Self {
        Self {
            stdout,
            stderr,
            quiet,
        }
    }

    /// Report progress unless quiet.
    pub fn progress(&mut self, message: impl Display) {
        if !self.quiet {
            write_line(self.stdout, message);
        }
    }

    /// Report a non-fatal problem.
    pub fn warn(&mut self, message: impl Display) {
        write_line(self.stderr, format_args!("warning: {message}"));
    }
}

/// Format the final success line.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use science_installer::output::success_message;
///
/// let msg = success_message(Utf8Path::new("/home/u/.local/bin/science"), "latest");
/// assert_eq!(msg, "Successfully installed science (latest) to /home/u/.local/bin/science");
/// ```
#[must_use]
pub fn success_message(installed: &Utf8Path, release: impl Display) -> String {
    let name = installed.file_name().unwrap_or("science");
    format!("Successfully installed {name} ({release}) to {installed}")
}

/// Format the warning shown when the install directory is not on PATH.
#[must_use]
pub fn path_missing_message(bin_dir: &Utf8Path) -> String {
    format!("{bin_dir} is not detected on $PATH")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_goes_to_stdout() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        Reporter::new(&mut out, &mut err, false).progress("Fetching");
        assert_eq!(out, b"Fetching\n");
        assert!(err.is_empty());
    }

    #[test]
    fn quiet_suppresses_progress_but_not_warnings() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let mut reporter = Reporter::new(&mut out, &mut err, true);
        reporter.progress("Fetching");
        reporter.warn("careful");
        assert!(out.is_empty());
        assert_eq!(err, b"warning: careful\n");
    }

    #[test]
    fn path_missing_message_names_directory() {
        let msg = path_missing_message(Utf8Path::new("/opt/bin"));
        assert!(msg.contains("/opt/bin"));
        assert!(msg.contains("$PATH"));
    }

    #[test]
    fn write_failures_are_ignored() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        write_line(&mut Broken, "lost");
    }
}
