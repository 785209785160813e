//! End-to-end tests for the fdata binary
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const LBR_PROFILE: &str = "1 main 10 1 foo 0 0 100\n\
                           1 main 20 1 main 30 0 7\n\
                           1 bar 4 1 foo.lto_priv.3 0 0 40\n\
                           4 main 1c 4 g_table 8 12\n";

fn profile_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_summary_text() {
    let file = profile_file(LBR_PROFILE);
    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile mode: lbr"))
        .stdout(predicate::str::contains("Records: 3 branch, 1 memory, 0 sample"))
        .stdout(predicate::str::contains("main"));
}

#[test]
fn test_summary_json() {
    let file = profile_file("no_lbr cycles:u\n1 BZ2_compressBlock 466c 3\n");
    let mut cmd = Command::cargo_bin("fdata").unwrap();
    let output = cmd
        .arg("--format")
        .arg("json")
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["mode"], "no_lbr");
    assert_eq!(value["events"][0], "cycles:u");
    assert_eq!(value["top_functions"][0]["name"], "BZ2_compressBlock");
    assert_eq!(value["top_functions"][0]["weight"], 3);
}

#[test]
fn test_dump() {
    let file = profile_file(LBR_PROFILE);
    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg("--dump")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("main branches:"))
        .stdout(predicate::str::contains("foo entry points:"))
        .stdout(predicate::str::contains("Memory events for main"));
}

#[test]
fn test_lookup_exact_and_fuzzy() {
    let file = profile_file(LBR_PROFILE);

    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg(file.path())
        .arg("--lookup")
        .arg("foo.lto_priv.8")
        .assert()
        .success()
        .stdout(predicate::str::contains("foo.lto_priv.8: no profile"));

    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg(file.path())
        .arg("--lookup")
        .arg("foo.lto_priv.8")
        .arg("--lookup")
        .arg("main")
        .arg("--fuzzy")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "foo.lto_priv.3 (via foo.lto_priv.8): 0 branches, 1 entry points, executed 40 times",
        ))
        .stdout(predicate::str::contains("main: 2 branches"));
}

#[test]
fn test_malformed_profile_fails() {
    let file = profile_file("1 main 3fb 0 /lib/ld-2.21.so 12 4\n");
    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error reading profile: line 1, column 34: unexpected end of line",
        ))
        .stderr(predicate::str::contains("Failed to parse profile"))
        .stderr(predicate::function(|err: &str| {
            err.matches("unexpected end of line").count() == 1
        }));
}

#[test]
fn test_trailing_blank_lines_accepted() {
    let file = profile_file("1 main 10 1 main 20 0 5\n\n");
    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Records: 1 branch"));
}

#[test]
fn test_missing_profile_fails() {
    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg("/nonexistent/perf.fdata")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open profile"));
}

#[test]
fn test_config_separator() {
    let file = profile_file("1\tmain\t10\t1\tmain\t20\t0\t5\n");
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "field_separator = \"\\t\"").unwrap();
    config.flush().unwrap();

    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg("--config")
        .arg(config.path())
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Records: 1 branch"));
}

#[test]
fn test_invalid_config_rejected() {
    let file = profile_file(LBR_PROFILE);
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "field_separator = \"x\"").unwrap();
    config.flush().unwrap();

    let mut cmd = Command::cargo_bin("fdata").unwrap();
    cmd.arg("--config")
        .arg(config.path())
        .arg(file.path())
        .assert()
        .failure();
}
