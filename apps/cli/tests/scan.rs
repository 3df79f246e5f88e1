use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("fcstamp-cli")?)
}

#[test]
fn scan_lists_distinct_codes_sorted() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let doc = dir.path().join("notes.txt");
    fs::write(&doc, "fc-300-400 then fc-101-202\nagain fc-101-202, not fc-12-345")?;

    cli()?
        .args(["--workspace", dir.path().to_str().unwrap(), "scan"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "{} (2 codes)\n  fc-101-202\n  fc-300-400\n",
            doc.display()
        )));

    Ok(())
}

#[test]
fn scan_locations_reports_every_occurrence() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let doc = dir.path().join("notes.txt");
    fs::write(&doc, "fc-101-202 x fc-101-202\nfc-300-400")?;

    cli()?
        .args(["--workspace", dir.path().to_str().unwrap(), "scan", "--locations"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("(3 occurrences)")
                .and(predicate::str::contains("  Line 1 (Col 1): fc-101-202"))
                .and(predicate::str::contains("  Line 1 (Col 14): fc-101-202"))
                .and(predicate::str::contains("  Line 2 (Col 1): fc-300-400")),
        );

    Ok(())
}

#[test]
fn scan_handles_several_documents() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let empty = dir.path().join("empty.txt");
    let styled = dir.path().join("styled.json");
    fs::write(&empty, "nothing here")?;
    fs::write(&styled, r#"{ "version": 1, "text": "id fc-555-666" }"#)?;

    cli()?
        .args(["--workspace", dir.path().to_str().unwrap(), "scan"])
        .arg(&empty)
        .arg(&styled)
        .assert()
        .success()
        .stdout(
            predicate::str::contains(format!("{} (0 codes)", empty.display()))
                .and(predicate::str::contains(format!("{} (1 codes)", styled.display())))
                .and(predicate::str::contains("  fc-555-666")),
        );

    Ok(())
}

#[test]
fn scan_missing_document_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing.txt");

    cli()?
        .args(["--workspace", dir.path().to_str().unwrap(), "scan"])
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: failed to open"));

    Ok(())
}
