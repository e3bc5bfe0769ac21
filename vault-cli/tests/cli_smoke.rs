//! End-to-end checks of vaultctl against a temporary database

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn vaultctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vaultctl").unwrap();
    cmd.arg("--db")
        .arg(dir.path().join("vault.db"))
        .env_remove("VAULT_DB_PATH")
        .env_remove("VAULT_BUSY_TIMEOUT_MS")
        .env_remove("RUST_LOG");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// === Help ===

#[test]
fn test_packets_create_help() {
    let mut cmd = Command::cargo_bin("vaultctl").unwrap();
    cmd.args(["packets", "create", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Idempotency token"));
}

#[test]
fn test_list_help_mentions_and_semantics() {
    let mut cmd = Command::cargo_bin("vaultctl").unwrap();
    cmd.args(["api-keys", "list", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("records must carry all of them"));
}

// === Packets ===

#[test]
fn test_create_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let create = |tags: &[&str]| {
        let mut cmd = vaultctl(&dir);
        cmd.args([
            "packets", "create", "--request-id", "r1", "--id", "p1", "--user", "u1",
            "--profile", "default", "--body", r#"{"data": {"n": 1}}"#,
        ]);
        for tag in tags {
            cmd.args(["--tag", tag]);
        }
        json_stdout(&mut cmd)
    };

    let first = create(&["work", "urgent"]);
    let second = create(&["home"]);
    assert_eq!(first, second);
    assert_eq!(second["tags"], serde_json::json!(["work", "urgent"]));
    assert_eq!(second["data"]["n"], 1);

    let listed = json_stdout(vaultctl(&dir).args(["packets", "list", "--user", "u1"]));
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn test_update_and_list_by_tag() {
    let dir = TempDir::new().unwrap();
    for id in ["p1", "p2"] {
        vaultctl(&dir)
            .args(["packets", "create", "--id", id, "--user", "u1", "--profile", "default"])
            .assert()
            .success();
    }

    let updated = json_stdout(vaultctl(&dir).args([
        "packets", "update", "p2", "--request-id", "e1", "--tag", "done", "--set",
        r#"{"data": {"status": "closed"}}"#,
    ]));
    assert_eq!(updated["data"]["status"], "closed");

    let done = json_stdout(vaultctl(&dir).args(["packets", "list", "--user", "u1", "--tag", "done"]));
    assert_eq!(done[0]["id"], "p2");
    assert_eq!(done.as_array().unwrap().len(), 1);

    let count = json_stdout(vaultctl(&dir).args([
        "packets", "list", "--user", "u1", "--field", "data.status=closed", "--count",
    ]));
    assert_eq!(count["count"], 1);
}

#[test]
fn test_delete_then_get_fails() {
    let dir = TempDir::new().unwrap();
    vaultctl(&dir)
        .args(["packets", "create", "--id", "p1", "--user", "u1", "--profile", "default"])
        .assert()
        .success();

    vaultctl(&dir)
        .args(["packets", "delete", "p1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deleted\": \"p1\""));

    vaultctl(&dir)
        .args(["packets", "get", "p1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cross_owner_token_reuse_fails() {
    let dir = TempDir::new().unwrap();
    vaultctl(&dir)
        .args(["profiles", "create", "--request-id", "r1", "--user", "alice", "--body", r#"{"name": "Work"}"#])
        .assert()
        .success();

    vaultctl(&dir)
        .args(["profiles", "create", "--request-id", "r1", "--user", "bob", "--body", r#"{"name": "Work"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ledger integrity"));
}

// === Users and API keys ===

#[test]
fn test_user_id_defaults_to_owner_and_find_by_email() {
    let dir = TempDir::new().unwrap();
    let user = json_stdout(vaultctl(&dir).args([
        "users", "create", "--user", "u1", "--body",
        r#"{"email": "Ada@Example.com", "password_hash": "h"}"#,
    ]));
    assert_eq!(user["id"], "u1");

    let found = json_stdout(vaultctl(&dir).args(["users", "find", "ada@example.com"]));
    assert_eq!(found["id"], "u1");
}

#[test]
fn test_api_key_rotation_keeps_provider() {
    let dir = TempDir::new().unwrap();
    vaultctl(&dir)
        .args([
            "api-keys", "create", "--id", "k1", "--user", "u1", "--body",
            r#"{"provider": "openai", "api_key": "sk-old"}"#,
        ])
        .assert()
        .success();

    vaultctl(&dir)
        .args(["api-keys", "update", "k1", "--set", r#"{"provider": "other"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid API key fields"));

    let rotated = json_stdout(vaultctl(&dir).args([
        "api-keys", "update", "k1", "--set", r#"{"api_key": "sk-new"}"#,
    ]));
    assert_eq!(rotated["provider"], "openai");
    assert_eq!(rotated["api_key"], "sk-new");
}

#[test]
fn test_invalid_limit_rejected() {
    let dir = TempDir::new().unwrap();
    vaultctl(&dir)
        .args(["packets", "list", "--user", "u1", "--limit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("limit must be between 1 and 100"));
}

// === Config ===

#[test]
fn test_config_show_reflects_db_flag() {
    let dir = TempDir::new().unwrap();
    vaultctl(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vault.db"))
        .stdout(predicate::str::contains("busy_timeout_ms = 5000"));
}

#[test]
fn test_config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "journal_mode = \"delete\"\nbusy_timeout_ms = 250\n").unwrap();

    let mut cmd = Command::cargo_bin("vaultctl").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .env_remove("VAULT_DB_PATH")
        .env_remove("VAULT_BUSY_TIMEOUT_MS")
        .assert()
        .success()
        .stdout(predicate::str::contains("journal_mode = \"delete\""))
        .stdout(predicate::str::contains("busy_timeout_ms = 250"));
}
