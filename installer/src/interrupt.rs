//! Ctrl-C and termination handling.
//!
//! The handler removes every live workspace, reports the interruption on
//! stderr and exits with status 1.

use crate::output::write_line;
use crate::workspace::WorkspaceRegistry;
use std::io::Write;

/// Exit status used when the run is interrupted.
pub const INTERRUPTED_EXIT_CODE: i32 = 1;

/// Install the process-wide interrupt handler.
///
/// # Errors
///
/// Returns the underlying [`ctrlc::Error`] if a handler is already
/// installed or the signal cannot be hooked.
pub fn install_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        let code = handle_interrupt(WorkspaceRegistry::global(), &mut std::io::stderr());
        std::process::exit(code);
    })
}

/// Clean up after an interrupt and return the exit status to use.
pub fn handle_interrupt(registry: &WorkspaceRegistry, stderr: &mut dyn Write) -> i32 {
    let removed = registry.remove_all();
    for path in &removed {
        log::debug!("removed workspace {} after interrupt", path.display());
    }
    write_line(stderr, "installation interrupted; temporary files removed");
    INTERRUPTED_EXIT_CODE
}
