//! End-to-end checks of the command-line binary.

use std::process::Command;

fn binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_xhs-media-fetcher"));
    cmd.env_remove("OUTPUT_DIR")
        .env_remove("FILE_PREFIX")
        .env_remove("RESOLVE_ONLY")
        .env_remove("LOG_FORMAT")
        .env("RUST_LOG", "error");
    cmd
}

#[test]
fn test_invalid_config_is_reported_on_stderr() {
    let output = binary()
        .env("DOWNLOAD_CONCURRENCY", "0")
        .arg("no links here")
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid configuration"), "stderr: {stderr}");
    assert!(stderr.contains("DOWNLOAD_CONCURRENCY"), "stderr: {stderr}");
}

#[test]
fn test_resolve_only_without_links_prints_empty_list() {
    let output = binary()
        .env("DOWNLOAD_CONCURRENCY", "2")
        .env("RESOLVE_ONLY", "true")
        .arg("just some text")
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
}
