// tracegrep - tests/cli.rs
//
// Black-box end-to-end tests: drive the real compiled binary against real
// fixture files on disk, no mocks.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn full_match_reports_only_the_matching_record() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("billid=42")
        .arg(fixture("full_match.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Sniffed x"))
        .stdout(predicate::str::contains("Sniffed z"))
        .stdout(predicate::str::contains("Sniffed w"))
        .stdout(predicate::str::contains("Sniffed y").not());
}

#[test]
fn no_match_produces_only_a_skip_separator() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("billid=999")
        .arg(fixture("no_match.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Sniffed").not());
}

#[test]
fn network_entries_correlate_via_shared_address() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("billid=42")
        .arg(fixture("network.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.1:5060").count(3))
        .stdout(predicate::str::contains("192.0.2.1:5060").not());
}

#[test]
fn startup_banner_flushes_correlation_across_session_boundary() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("billid=42")
        .arg(fixture("session_boundary.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Sniffed a"))
        .stdout(predicate::str::contains("Yate"))
        .stdout(predicate::str::contains("Sniffed b").not());
}

#[test]
fn context_window_shows_surrounding_entries_and_a_leading_separator() {
    let input = (1..=10)
        .map(|i| {
            if i == 5 {
                "Sniffed hit\n  param['billid'] = '42'\n".to_string()
            } else {
                format!("unrelated line {i}\n")
            }
        })
        .collect::<String>();

    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("trace.log");
    std::fs::write(&input_path, input).unwrap();

    let assert = Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("-C")
        .arg("2")
        .arg("billid=42")
        .arg(&input_path)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Sniffed hit"));
    assert!(stdout.contains("unrelated line 3"));
    assert!(stdout.contains("unrelated line 4"));
    assert!(stdout.contains("unrelated line 6"));
    assert!(stdout.contains("unrelated line 7"));
    assert!(!stdout.contains("unrelated line 1\n"));
    assert!(!stdout.contains("unrelated line 9\n"));
    assert!(stdout.contains("skipped 3 log entries"));
}

#[test]
fn output_flag_writes_to_file_instead_of_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.txt");

    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("-o")
        .arg(&out_path)
        .arg("billid=42")
        .arg(fixture("full_match.log"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.contains("Sniffed x"));
}

#[test]
fn xhtml_mode_wraps_entries_in_pre_tags_with_kind_class() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("-x")
        .arg("billid=42")
        .arg(fixture("full_match.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("<pre class=\"message"));
}

#[test]
fn xhtml_document_mode_adds_prelude_and_postlude() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("-X")
        .arg("billid=42")
        .arg(fixture("full_match.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("</body></html>"));
}

#[test]
fn malformed_query_is_an_argument_error() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("not-a-query")
        .arg(fixture("full_match.log"))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn nonexistent_input_file_is_an_error() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("billid=42")
        .arg("/no/such/path/trace.log")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot open input"));
}

#[test]
fn help_flag_exits_successfully() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("-h")
        .assert()
        .success();
}

#[test]
fn no_network_flag_suppresses_address_correlation() {
    Command::cargo_bin("tracegrep")
        .unwrap()
        .arg("-N")
        .arg("billid=42")
        .arg(fixture("network.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.1:5060").count(1));
}
