//! Integration tests for the `fill` subcommand.

mod common;

use common::{cmd, form_pdf, plain_pdf, write_file};
use predicates::prelude::*;

fn field_value(bytes: &[u8], name: &str) -> Option<lopdf::Object> {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    doc.objects.values().find_map(|obj| {
        let dict = obj.as_dict().ok()?;
        let title = dict.get(b"T").ok()?.as_str().ok()?;
        if title == name.as_bytes() {
            dict.get(b"V").ok().cloned()
        } else {
            None
        }
    })
}

#[test]
fn fills_fields_from_flags() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "ID995A.pdf", &form_pdf());

    cmd()
        .args(["fill", "--decryptor", "builtin", "--source"])
        .arg(&source)
        .args(["--text", "engSurname=DOE", "--check", "preReside"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok\tengSurname\tDOE"))
        .stdout(predicate::str::contains("ok\tpreReside\tchecked"))
        .stdout(predicate::str::contains("filled 2/2 fields"))
        .stdout(predicate::str::contains("filled_ID995A.pdf"));

    assert!(dir.path().join("decrypted_ID995A.pdf").is_file());
    let filled = std::fs::read(dir.path().join("filled_ID995A.pdf")).unwrap();
    assert_eq!(
        field_value(&filled, "preReside"),
        Some(lopdf::Object::Name(b"Yes".to_vec()))
    );
    assert!(field_value(&filled, "engSurname").is_some());
}

#[test]
fn unknown_field_is_reported_but_output_written() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "ID995A.pdf", &form_pdf());
    let output = dir.path().join("out/filled.pdf");

    cmd()
        .args(["fill", "--decryptor", "builtin", "--source"])
        .arg(&source)
        .arg("--output")
        .arg(&output)
        .args(["--text", "nonExistentField=X", "--text", "engName=JANE"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "failed\tnonExistentField\tfield not found",
        ))
        .stdout(predicate::str::contains("filled 1/2 fields"));

    assert!(output.is_file());
}

#[test]
fn values_file_with_flag_override() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "ID995A.pdf", &form_pdf());
    let values = write_file(
        dir.path(),
        "values.json",
        br#"{"text": {"engSurname": "SMITH"}, "check": ["preReside"]}"#,
    );

    let output = cmd()
        .args(["fill", "--decryptor", "builtin", "--format", "json", "--source"])
        .arg(&source)
        .arg("--values")
        .arg(&values)
        .args(["--text", "engSurname=DOE"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["outcome"], "completed");
    assert_eq!(json["report"]["succeeded"], 2);
    let results = json["report"]["results"].as_array().unwrap();
    let surname = results
        .iter()
        .find(|r| r["name"] == "engSurname")
        .unwrap();
    assert_eq!(surname["outcome"]["Ok"]["value"], "DOE");
    let reside = results.iter().find(|r| r["name"] == "preReside").unwrap();
    assert_eq!(reside["outcome"]["Ok"]["value"], true);
}

#[test]
fn malformed_values_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "ID995A.pdf", &form_pdf());
    let values = write_file(dir.path(), "values.json", b"{\"text\": [");

    cmd()
        .args(["fill", "--decryptor", "builtin", "--source"])
        .arg(&source)
        .arg("--values")
        .arg(&values)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: invalid value map"));
    assert!(!dir.path().join("filled_ID995A.pdf").exists());
}

#[test]
fn conflicting_checkbox_flags_fail() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "ID995A.pdf", &form_pdf());

    cmd()
        .args(["fill", "--decryptor", "builtin", "--source"])
        .arg(&source)
        .args(["--check", "preReside", "--uncheck", "preReside"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: invalid value map"));
}

#[test]
fn missing_source_fails() {
    let dir = tempfile::tempdir().unwrap();

    cmd()
        .args(["fill", "--decryptor", "builtin", "--source"])
        .arg(dir.path().join("ID995A.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: source PDF not found"));
}

#[test]
fn source_without_form_fails() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "ID995A.pdf", &plain_pdf());

    cmd()
        .args(["fill", "--decryptor", "builtin", "--source"])
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: parse error"));
}

#[test]
fn flatten_removes_the_form() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "ID995A.pdf", &form_pdf());

    cmd()
        .args(["fill", "--decryptor", "builtin", "--flatten", "--source"])
        .arg(&source)
        .args(["--text", "engSurname=DOE"])
        .assert()
        .success();

    cmd()
        .arg("fields")
        .arg(dir.path().join("filled_ID995A.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no interactive form"));
}
