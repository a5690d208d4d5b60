//! Unit tests for search-path snapshots.

use super::*;
use rstest::rstest;

fn snapshot(entries: &[&str]) -> PathSnapshot {
    PathSnapshot::from_value(&std::env::join_paths(entries).expect("joinable"))
}

#[rstest]
#[case::exact(&["/usr/bin", "/home/u/.local/bin"], "/home/u/.local/bin", true)]
#[case::trailing_slash(&["/home/u/.local/bin/"], "/home/u/.local/bin", true)]
#[case::prefix_only(&["/home/u/.local/bin-old"], "/home/u/.local/bin", false)]
#[case::parent(&["/home/u/.local"], "/home/u/.local/bin", false)]
#[case::empty(&[], "/usr/bin", false)]
fn contains_matches_whole_segments(
    #[case] entries: &[&str],
    #[case] dir: &str,
    #[case] expected: bool,
) {
    assert_eq!(snapshot(entries).contains(Path::new(dir)), expected);
}

#[cfg(windows)]
#[test]
fn windows_comparison_ignores_case() {
    let snap = snapshot(&[r"C:\Users\U\AppData\Local\science\bin"]);
    assert!(snap.contains(Path::new(r"c:\users\u\appdata\local\science\bin")));
}

#[cfg(unix)]
#[test]
fn unix_comparison_is_case_sensitive() {
    assert!(!snapshot(&["/opt/Bin"]).contains(Path::new("/opt/bin")));
}

#[test]
fn empty_segments_are_dropped() {
    let value = std::env::join_paths(["/usr/bin", "", "/bin"]).expect("joinable");
    assert_eq!(PathSnapshot::from_value(&value).entries().len(), 2);
}

#[test]
fn prepended_puts_directory_first_and_keeps_order() {
    let snap = snapshot(&["/usr/bin", "/bin"]);
    let value = snap.prepended(Path::new("/opt/science")).expect("joinable");
    let entries: Vec<PathBuf> = std::env::split_paths(&value).collect();
    assert_eq!(
        entries,
        vec![
            PathBuf::from("/opt/science"),
            PathBuf::from("/usr/bin"),
            PathBuf::from("/bin"),
        ]
    );
}

#[test]
fn prepended_leaves_snapshot_untouched() {
    let snap = snapshot(&["/usr/bin"]);
    let before = snap.clone();
    let _ = snap.prepended(Path::new("/opt/science")).expect("joinable");
    assert_eq!(snap, before);
}

#[cfg(unix)]
#[test]
fn prepending_a_separator_fails() {
    let err = snapshot(&["/usr/bin"])
        .prepended(Path::new("/opt:evil"))
        .expect_err("separator in entry");
    assert!(matches!(err, PathUpdateError::Join { .. }));
}

#[test]
fn capture_reads_process_path() {
    temp_env::with_var("PATH", Some("/snap/one"), || {
        let snap = PathSnapshot::capture();
        assert!(snap.contains(Path::new("/snap/one")));
    });
}

#[test]
fn capture_without_path_is_empty() {
    temp_env::with_var_unset("PATH", || {
        assert!(PathSnapshot::capture().entries().is_empty());
    });
}

#[test]
fn manual_instructions_name_directory() {
    let text = manual_instructions(Path::new("/test/bin"));
    assert!(text.contains("/test/bin"));
}
