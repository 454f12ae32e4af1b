use clap::Parser;
use dupfind::cli::Cli;
use dupfind::error::ExitCode;
use dupfind::run_with_io;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::{tempdir, TempDir};

use crate::ENV_MUTEX;

/// Empty config file so the user's own config never leaks into a test.
fn empty_config() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "").unwrap();
    dir
}

fn run(root: &Path, extra: &[&str], input: &str) -> (anyhow::Result<ExitCode>, String) {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let config = empty_config();
    let config_path = config.path().join("config.toml");

    let mut args = vec![
        "dupfind".to_string(),
        root.display().to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
        "-q".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    let cli = Cli::try_parse_from(args).unwrap();

    let mut out = Vec::new();
    let result = run_with_io(cli, &mut out, Cursor::new(input.as_bytes()));
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_print_action_end_to_end() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "world").unwrap();

    let (result, out) = run(dir.path(), &[], "");

    assert_eq!(result.unwrap(), ExitCode::Success);
    let b = dir.path().join("b.txt");
    assert!(out.starts_with(&format!("5 B\t{}\n", b.display())));
    assert!(!out.contains("c.txt"));
    assert!(!out.contains("a.txt"));
    assert!(out.contains("Found 1 duplicate(s), totaling 5 B."));
}

#[test]
fn test_no_duplicates_still_reports() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one").unwrap();
    fs::write(dir.path().join("b.txt"), "two!").unwrap();

    let (result, out) = run(dir.path(), &[], "");

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(out.contains("Found 0 duplicate(s), totaling 0 B."));
}

#[test]
fn test_verbose_action_prints_paths() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();

    let (result, out) = run(dir.path(), &["-a", "verbose"], "");

    assert_eq!(result.unwrap(), ExitCode::Success);
    let first_line = out.lines().next().unwrap();
    assert_eq!(first_line, dir.path().join("b.txt").display().to_string());
}

#[test]
fn test_delete_action_with_prompt() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "hello").unwrap();

    // Keep b, delete c
    let (result, out) = run(dir.path(), &["-a", "delete", "--permanent"], "n\ny\n");

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
    assert!(!dir.path().join("c.txt").exists());
    assert!(out.contains("Found 2 duplicate(s), totaling 10 B."));
    assert!(out.contains("Deleted 1 file(s)"));
}

#[test]
fn test_unknown_action_is_config_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();

    let (result, out) = run(dir.path(), &["-a", "delte"], "");

    let err = result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
    assert!(err.to_string().contains("did you mean 'delete'"));
    // Nothing scanned, nothing reported
    assert!(out.is_empty());
}

#[test]
fn test_missing_root_is_config_error() {
    let dir = tempdir().unwrap();
    let (result, _) = run(&dir.path().join("missing"), &[], "");

    let err = result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_zero_channel_capacity_is_config_error() {
    let dir = tempdir().unwrap();
    let (result, _) = run(dir.path(), &["--channel-capacity", "0"], "");

    let err = result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_min_size_flag_with_suffix() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), vec![7u8; 2000]).unwrap();
    fs::write(dir.path().join("b.bin"), vec![7u8; 2000]).unwrap();

    let (_, out) = run(dir.path(), &["-s", "2K"], "");
    assert!(out.contains("Found 1 duplicate(s)"));

    let (_, out) = run(dir.path(), &["-s", "2KiB"], "");
    assert!(out.contains("Found 0 duplicate(s)"));
}

#[test]
fn test_extension_flag() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.jpg"), "pixels").unwrap();
    fs::write(dir.path().join("a.jpeg"), "pixels").unwrap();

    let (_, out) = run(dir.path(), &[], "");
    assert!(out.contains("Found 0 duplicate(s)"));

    let (_, out) = run(dir.path(), &["-e", "false"], "");
    assert!(out.contains("Found 1 duplicate(s)"));
}

#[test]
fn test_relative_root_reports_absolute_paths() {
    // Created under the package root so it can be named relative to the working directory
    let dir = tempfile::tempdir_in(".").unwrap();
    let cwd = std::env::current_dir().unwrap();
    let relative = dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
    assert!(relative.is_relative());
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("c.txt"), "hello").unwrap();

    let (result, out) = run(&relative, &[], "");
    assert_eq!(result.unwrap(), ExitCode::Success);

    let printed: Vec<_> = out
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(_, path)| Path::new(path).to_path_buf())
        .collect();
    assert_eq!(printed.len(), 2);
    for path in &printed {
        assert!(path.is_absolute(), "{} is not absolute", path.display());
        assert!(path.starts_with(&cwd));
    }

    let (_, out) = run(&relative, &["-a", "verbose"], "");
    for line in out.lines().take(2) {
        assert!(Path::new(line).is_absolute(), "{line} is not absolute");
    }
}
