//! Hash determinism for layered rebalance configs.

use rbl_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
rebalance:
  max_search_depth: 2
  iteration_limit: 256
report:
  currency: "USD"
"#;

const BASE_YAML_REORDERED: &str = r#"
report:
  currency: "USD"
rebalance:
  iteration_limit: 256
  max_search_depth: 2
"#;

const OVERLAY_YAML: &str = r#"
rebalance:
  max_search_depth: 3
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn key_order_does_not_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash, "canonical form must sort keys");
}

#[test]
fn overlay_changes_value_and_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_ne!(base.config_hash, merged.config_hash);
    assert_eq!(
        merged.config_json.pointer("/rebalance/max_search_depth"),
        Some(&serde_json::json!(3))
    );
    assert_eq!(
        merged.config_json.pointer("/rebalance/iteration_limit"),
        Some(&serde_json::json!(256)),
        "sibling keys survive the overlay"
    );
}

#[test]
fn layer_order_matters() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[OVERLAY_YAML, BASE_YAML]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn invalid_yaml_is_an_error() {
    let err = load_layered_yaml_from_strings(&["{}", "rebalance: [unclosed"]).unwrap_err();
    assert!(format!("{err:#}").contains("layer 1"));
}
