//! End-to-end: `klickwahl train` writes the state, `klickwahl select` reads it.
//!
//! Erwartung: nach dem Training empfiehlt `select` mit epsilon 0 das Item mit
//! den meisten Klicks im jeweiligen Kontext; ohne State-Datei bricht `select`
//! mit Exit-Code != 0 ab.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const ROWS: &str = r#"{"user_id":"anna","item_id":"ItemA","impression_time":"2023-10-27T08:15:00Z","was_clicked":false,"device":"mobile"}
{"user_id":"anna","item_id":"ItemB","impression_time":"2023-10-27T09:40:00","was_clicked":true,"device":"mobile"}
{"user_id":"anna","item_id":"ItemB","impression_time":"2023-10-27 10:05:00.250","was_clicked":true,"device":"mobile"}

{"user_id":"ben","item_id":"ItemA","impression_time":null,"was_clicked":true,"device":"desktop"}
{"user_id":"ben","item_id":"ItemC","was_clicked":false,"device":"desktop"}
"#;

fn klickwahl() -> Command {
    let mut cmd = Command::cargo_bin("klickwahl")
        .unwrap_or_else(|e| panic!("Binary klickwahl nicht gefunden: {e}"));
    cmd.env_remove("KLICKWAHL_STATE_FILE").env_remove("RUST_LOG");
    cmd
}

fn train(input: &Path, state: &Path) {
    klickwahl()
        .args(["train", "--trials", "2000", "--seed", "7", "--input"])
        .arg(input)
        .arg("--state-file")
        .arg(state)
        .assert()
        .success()
        .stdout(predicate::str::contains("Trained 2 contexts over 3 arms from 5 records"));
}

#[test]
fn train_then_select_recommends_clicked_item() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("rows.jsonl");
    let state = dir.path().join("state.json");
    fs::write(&input, ROWS).unwrap();

    train(&input, &state);
    assert!(state.exists());

    klickwahl()
        .args([
            "select", "--user", "anna", "--time", "morning", "--weekday", "friday", "--device",
            "mobile", "--epsilon", "0", "--seed", "1",
        ])
        .arg("--state-file")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::eq("ItemB\n"));

    klickwahl()
        .args(["select", "--user", "ben", "--device", "desktop", "--epsilon", "0"])
        .arg("--state-file")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::eq("ItemA\n"));
}

#[test]
fn train_reads_stdin_and_honours_env_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("from-env/state.json");

    klickwahl()
        .env("KLICKWAHL_STATE_FILE", &state)
        .args(["--quiet", "train", "--trials", "100", "--seed", "3"])
        .write_stdin(ROWS)
        .assert()
        .success();

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&state).unwrap()).unwrap();
    assert_eq!(saved["arms"], serde_json::json!(["ItemA", "ItemB", "ItemC"]));
    assert_eq!(saved["contexts"].as_array().map(Vec::len), Some(2));
}

#[test]
fn unseen_context_still_returns_a_catalog_item() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("rows.jsonl");
    let state = dir.path().join("state.json");
    fs::write(&input, ROWS).unwrap();
    train(&input, &state);

    let out = klickwahl()
        .args(["select", "--user", "nobody", "--epsilon", "0"])
        .arg("--state-file")
        .arg(&state)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let item = String::from_utf8_lossy(&out).trim().to_string();
    assert!(["ItemA", "ItemB", "ItemC"].contains(&item.as_str()), "unexpected item {item}");
}

#[test]
fn select_without_state_fails() {
    let dir = tempfile::tempdir().unwrap();
    klickwahl()
        .args(["select", "--user", "anna"])
        .arg("--state-file")
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to select an item"));
}

#[test]
fn malformed_input_aborts_training() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("rows.jsonl");
    let state = dir.path().join("state.json");
    fs::write(&input, "{\"user_id\":\"x\"}\n").unwrap();

    klickwahl()
        .args(["train", "--input"])
        .arg(&input)
        .arg("--state-file")
        .arg(&state)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
    assert!(!state.exists());
}
