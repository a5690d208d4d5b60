//! Science installer CLI entrypoint.
//!
//! This binary downloads the requested `science` release for the host
//! platform, verifies its SHA-256 digest and installs it into a bin
//! directory. Progress goes to stdout; warnings and errors go to stderr.

use clap::Parser;
use clap::error::ErrorKind;
use log::LevelFilter;
use science_installer::cli::Cli;
use science_installer::config::InstallConfig;
use science_installer::dirs::SystemBaseDirs;
use science_installer::error::Result;
use science_installer::fetch::{AuthConfig, HttpFetcher};
use science_installer::interrupt;
use science_installer::output::{Reporter, write_line};
use science_installer::path_env::{PathSnapshot, SystemPathPersister};
use science_installer::pipeline::{InstallReport, PipelineContext, run_install};
use science_installer::platform::SystemProbe;
use science_installer::workspace::WorkspaceRegistry;
use std::io::Write;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = parse_error_exit_code(err.kind());
            if let Err(e) = err.print() {
                log::error!("failed to print usage error: {e}");
            }
            std::process::exit(code);
        }
    };
    init_logging(cli.verbosity);
    let mut stderr = std::io::stderr();
    if let Err(e) = interrupt::install_handler() {
        log::warn!("interrupt handler not installed: {e}");
    }

    let run_result = run(&cli);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Help and version requests succeed; every other parse failure exits 1.
fn parse_error_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(level_for_verbosity(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn run(cli: &Cli) -> Result<InstallReport> {
    let dirs = SystemBaseDirs::new();
    let config = InstallConfig::from_cli(cli, &dirs)?;
    log::info!("installing {} into {}", config.release, config.bin_dir);

    let probe = SystemProbe;
    let fetcher = HttpFetcher::new()
        .with_auth(AuthConfig::from_env(&dirs))
        .with_progress(!config.quiet);
    let persister = SystemPathPersister::from_env(&dirs);
    let snapshot = PathSnapshot::capture();
    let context = PipelineContext {
        probe: &probe,
        fetcher: &fetcher,
        persister: &persister,
        snapshot: &snapshot,
        registry: WorkspaceRegistry::global(),
    };

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let mut reporter = Reporter::new(&mut stdout, &mut stderr, config.quiet);
    run_install(&config, &context, &mut reporter)
}

fn exit_code_for_run_result<T>(result: Result<T>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            write_line(stderr, format_args!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use science_installer::error::InstallerError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = InstallerError::UnsupportedPlatform {
            os: "Linux".to_owned(),
            arch: "mips".to_owned(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result::<()>(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: "));
        assert!(stderr_text.contains("mips"));
    }

    #[rstest]
    #[case::help(&["science-installer", "--help"], 0)]
    #[case::unknown_platform(&["science-installer", "--platform", "solaris-sparc"], 1)]
    #[case::zero_attempts(&["science-installer", "--max-attempts", "0"], 1)]
    #[case::malformed_version(&["science-installer", "--version", "seven"], 1)]
    #[case::unknown_flag(&["science-installer", "--frobnicate"], 1)]
    fn parse_failures_map_to_exit_codes(#[case] args: &[&str], #[case] expected: i32) {
        let err = Cli::try_parse_from(args).expect_err("arguments should not parse");
        assert_eq!(parse_error_exit_code(err.kind()), expected);
    }

    #[rstest]
    #[case(0, LevelFilter::Warn)]
    #[case(1, LevelFilter::Info)]
    #[case(2, LevelFilter::Debug)]
    #[case(3, LevelFilter::Trace)]
    #[case(9, LevelFilter::Trace)]
    fn verbosity_maps_to_log_level(#[case] verbosity: u8, #[case] expected: LevelFilter) {
        assert_eq!(level_for_verbosity(verbosity), expected);
    }
}
