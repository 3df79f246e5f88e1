use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Result<Command, Box<dyn Error>> {
    let mut command = Command::cargo_bin("fcstamp-cli")?;
    command.env_remove("RUST_LOG");
    Ok(command)
}

#[test]
fn preferences_show_prints_defaults() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli()?
        .args(["--workspace", workspace.path().to_str().unwrap(), "preferences", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"version\": 1")
                .and(predicate::str::contains("\"filter\": \"warn\""))
                .and(predicate::str::contains("font_name").not()),
        );

    Ok(())
}

#[test]
fn preferences_import_and_export_round_trip() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let source = workspace.path().join("incoming.json");
    fs::write(&source, r#"{ "version": 1, "logging": { "filter": "error" } }"#)?;

    cli()?
        .args(["--workspace", workspace.path().to_str().unwrap(), "preferences", "import"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported preferences from"));

    let stored = workspace.path().join(".fcstamp").join("preferences.json");
    assert!(stored.exists());

    let exported = workspace.path().join("out").join("prefs.json");
    cli()?
        .args(["--workspace", workspace.path().to_str().unwrap(), "preferences", "export"])
        .arg("--output")
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported preferences to"));

    let contents = fs::read_to_string(exported)?;
    assert!(contents.contains("\"filter\": \"error\""));

    Ok(())
}

#[test]
fn stored_style_keys_do_not_change_the_inserted_style() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let prefs_dir = workspace.path().join(".fcstamp");
    fs::create_dir_all(&prefs_dir)?;
    fs::write(
        prefs_dir.join("preferences.json"),
        r##"{
            "version": 1,
            "style": { "font_name": "Comic Sans MS", "font_size": 72, "color": "#FF0000" },
            "generator": { "max_attempts": 1000000, "warn_margin": 0 }
        }"##,
    )?;
    let doc = workspace.path().join("doc.json");
    fs::write(&doc, r#"{ "version": 1, "text": "x" }"#)?;

    cli()?
        .args(["--workspace", workspace.path().to_str().unwrap(), "stamp"])
        .arg(&doc)
        .assert()
        .success();

    let styled: serde_json::Value = serde_json::from_str(&fs::read_to_string(&doc)?)?;
    let code_run = styled["runs"]
        .as_array()
        .and_then(|runs| runs.iter().find(|run| run["start"] == 1))
        .expect("run for the inserted code");
    assert_eq!(code_run["style"]["font_name"], "Arial");
    assert_eq!(code_run["style"]["size"], 8.0);
    assert_eq!(code_run["style"]["color"], "#BFBFBF");

    Ok(())
}

#[test]
fn invalid_stored_log_filter_still_allows_repair() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let prefs_dir = workspace.path().join(".fcstamp");
    fs::create_dir_all(&prefs_dir)?;
    fs::write(
        prefs_dir.join("preferences.json"),
        r#"{ "version": 1, "logging": { "filter": "fcstamp=loud" } }"#,
    )?;
    let repaired = workspace.path().join("repaired.json");
    fs::write(&repaired, r#"{ "version": 1, "logging": { "filter": "info" } }"#)?;

    cli()?
        .args(["--workspace", workspace.path().to_str().unwrap(), "preferences", "import"])
        .arg(&repaired)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported preferences from"))
        .stderr(predicate::str::contains("ignoring invalid log filter in preferences"));

    cli()?
        .args(["--workspace", workspace.path().to_str().unwrap(), "preferences", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"filter\": \"info\""))
        .stderr(predicate::str::contains("ignoring invalid log filter").not());

    Ok(())
}

#[test]
fn preferences_import_missing_file_fails() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli()?
        .args(["--workspace", workspace.path().to_str().unwrap(), "preferences", "import"])
        .arg(workspace.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    Ok(())
}

#[test]
fn invalid_log_level_flag_is_reported() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli()?
        .args([
            "--workspace",
            workspace.path().to_str().unwrap(),
            "--log-level",
            "fcstamp=loud",
            "preferences",
            "show",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: invalid log filter"));

    Ok(())
}
