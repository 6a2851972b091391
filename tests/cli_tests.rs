//! End-to-end tests for the `dbfacade` binary

use assert_cmd::Command;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup(dir: &TempDir) -> std::path::PathBuf {
    let db_path = dir.path().join("cli.db");
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "
        CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER);
        INSERT INTO users (name, age) VALUES ('Ann', 30);
        INSERT INTO users (name, age) VALUES ('Bob', 41);
        ",
    )
    .unwrap();

    write_config(dir, &db_path)
}

fn write_config(dir: &TempDir, db_path: &Path) -> std::path::PathBuf {
    let config_path = dir.path().join("dbfacade.toml");
    let config = format!(
        r#"
[database]
driver = "sqlite"
host = "localhost"
name = "{}"
username = ""
password = ""

[database.options]
foreign_keys = "on"
"#,
        db_path.display()
    );
    fs::write(&config_path, config).unwrap();
    config_path
}

#[test]
fn test_fetch_with_params_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(&dir);

    let output = Command::cargo_bin("dbfacade")
        .unwrap()
        .arg(&config)
        .arg("SELECT name, age FROM users WHERE id = ?")
        .arg("2")
        .output()
        .unwrap();

    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows, serde_json::json!([{ "name": "Bob", "age": 41 }]));
}

#[test]
fn test_no_match_prints_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(&dir);

    let output = Command::cargo_bin("dbfacade")
        .unwrap()
        .arg(&config)
        .arg("SELECT * FROM users WHERE name = ?")
        .arg("nobody")
        .output()
        .unwrap();

    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows, serde_json::json!([]));
}

#[test]
fn test_missing_arguments_fail() {
    Command::cargo_bin("dbfacade").unwrap().assert().failure();
}

#[test]
fn test_unreachable_database_reports_not_connected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, Path::new("/nonexistent/path/database.db"));

    let output = Command::cargo_bin("dbfacade")
        .unwrap()
        .arg(&config)
        .arg("SELECT 1")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Database connection error"));
    assert!(stderr.contains("Not connected"));
}
