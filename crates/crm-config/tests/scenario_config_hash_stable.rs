//! Config hash stability.
//!
//! GREEN when:
//! - the same inputs hash identically,
//! - reordering keys within YAML doesn't change the hash,
//! - different values produce different hashes,
//! - overlays override the base and change the hash.

use crm_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
server:
  bind_addr: "0.0.0.0:8787"
  heartbeat_secs: 15
storage:
  backend: "postgres"
  database_url_env: "CRM_DATABASE_URL"
dashboard:
  low_stock_threshold: 10
"#;

/// Same content as BASE_YAML but with keys in different order.
const BASE_YAML_REORDERED: &str = r#"
dashboard:
  low_stock_threshold: 10
storage:
  database_url_env: "CRM_DATABASE_URL"
  backend: "postgres"
server:
  heartbeat_secs: 15
  bind_addr: "0.0.0.0:8787"
"#;

const OVERLAY_YAML: &str = r#"
storage:
  backend: "memory"
dashboard:
  timezone: "America/Denver"
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();

    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();

    assert_eq!(
        original.config_hash, reordered.config_hash,
        "key order in the source YAML must not change the hash"
    );
}

#[test]
fn different_values_produce_different_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let edited = BASE_YAML.replace("heartbeat_secs: 15", "heartbeat_secs: 30");
    let changed = load_layered_yaml_from_strings(&[edited.as_str()]).unwrap();

    assert_ne!(base.config_hash, changed.config_hash);
}

#[test]
fn overlay_overrides_base_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let layered = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_ne!(base.config_hash, layered.config_hash);

    let cfg = layered.settings().unwrap();
    assert_eq!(cfg.storage.backend, crm_config::StorageBackend::Memory);
    // untouched base keys survive the merge
    assert_eq!(cfg.storage.database_url_env, "CRM_DATABASE_URL");
    assert_eq!(cfg.server.bind_addr, "0.0.0.0:8787");
    assert_eq!(cfg.dashboard.timezone, "America/Denver");
    assert_eq!(cfg.dashboard.low_stock_threshold, 10);
}
