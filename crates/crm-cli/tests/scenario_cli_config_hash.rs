use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
    let p = dir.path().join(name);
    fs::write(&p, body).expect("write yaml");
    p.to_string_lossy().to_string()
}

#[test]
fn config_hash_prints_hash_then_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(&dir, "base.yaml", "server:\n  heartbeat_secs: 15\n");
    let prod = write(&dir, "prod.yaml", "dashboard:\n  timezone: America/Denver\n");

    Command::cargo_bin("crm")
        .unwrap()
        .args(["config-hash", &base, &prod])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("config_hash="))
        .stdout(predicate::str::contains("\"timezone\":\"America/Denver\""));
}

#[test]
fn config_hash_refuses_literal_secret() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(
        &dir,
        "bad.yaml",
        "storage:\n  database_url_env: \"postgres://crm:hunter2@db/crm\"\n",
    );

    Command::cargo_bin("crm")
        .unwrap()
        .args(["config-hash", &bad])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("hunter2").not());
}

#[test]
fn config_hash_rejects_unknown_timezone() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(&dir, "tz.yaml", "dashboard:\n  timezone: Mars/Olympus\n");

    Command::cargo_bin("crm")
        .unwrap()
        .args(["config-hash", &bad])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dashboard.timezone"));
}

#[test]
fn quote_promote_requires_id() {
    Command::cargo_bin("crm")
        .unwrap()
        .args(["quote", "promote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--id"));
}
