//! Command-line tests against the built binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(dialect: &str, name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(dialect)
        .join(name)
}

#[test]
fn test_formats_lists_registry() {
    let mut cmd = cargo_bin_cmd!("legaljson");
    cmd.arg("formats");

    cmd.assert().success().stdout(
        predicate::str::contains("formex")
            .and(predicate::str::contains("cellar-standard"))
            .and(predicate::str::contains("Luxembourg Akoma Ntoso CSD13")),
    );
}

#[test]
fn test_detect_prints_key() {
    let mut cmd = cargo_bin_cmd!("legaljson");
    cmd.arg("detect").arg(fixture("akn", "luxembourg.xml"));

    cmd.assert().success().stdout("luxembourg\n");
}

#[test]
fn test_detect_unknown_format_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("feed.xml");
    fs::write(&input, "<rss version=\"2.0\"/>").unwrap();

    let mut cmd = cargo_bin_cmd!("legaljson");
    cmd.arg("detect").arg(&input);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn test_parse_to_stdout() {
    let mut cmd = cargo_bin_cmd!("legaljson");
    cmd.arg("parse").arg(fixture("boe", "ley.xml"));

    cmd.assert().success().stdout(
        predicate::str::contains(r#""eId": "art_1""#)
            .and(predicate::str::contains(r#""preamble_final": null"#)),
    );
}

#[test]
fn test_parse_to_file_and_validate() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("directive.json");

    let mut cmd = cargo_bin_cmd!("legaljson");
    cmd.arg("parse")
        .arg(fixture("formex", "directive.xml"))
        .arg("--output")
        .arg(&output)
        .arg("--validate");

    cmd.assert().success().stderr(
        predicate::str::contains("Saved to:").and(predicate::str::contains("LegalJSON is valid")),
    );

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["citations"][0]["eId"], "cit_1");
    assert_eq!(json["conclusions"]["signature"]["place"], "Done at Strasbourg,");
}

#[test]
fn test_parse_reports_skipped_sections() {
    let mut cmd = cargo_bin_cmd!("legaljson");
    cmd.arg("parse").arg(fixture("regional", "legge.html"));

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Skipped").and(predicate::str::contains("conclusions")));
}

#[test]
fn test_validate_rejects_invalid_json() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.json");
    fs::write(&input, r#"{"articles": [{"eId": 1, "children": []}]}"#).unwrap();

    let mut cmd = cargo_bin_cmd!("legaljson");
    cmd.arg("validate").arg(&input);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Schema validation failed"));
}

#[test]
fn test_batch_writes_one_file_per_input() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let broken = dir.path().join("broken.xml");
    fs::write(&broken, "<ACT>").unwrap();

    let mut cmd = cargo_bin_cmd!("legaljson");
    cmd.arg("batch")
        .arg(fixture("formex", "directive.xml"))
        .arg(fixture("cellar", "regulation.html"))
        .arg(&broken)
        .arg("--output-dir")
        .arg(&out);

    cmd.assert().success().stdout(
        predicate::str::contains("2")
            .and(predicate::str::contains("of 3 document(s)"))
            .and(predicate::str::contains("broken.xml")),
    );

    assert!(out.join("directive.json").exists());
    assert!(out.join("regulation.json").exists());
    assert!(!out.join("broken.json").exists());
}
